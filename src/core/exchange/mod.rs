//! External-provider request transformation pipeline.
//!
//! A registry of interchangeable decorators converts an internal workflow
//! document/event into the wire payload required by a specific integration
//! provider. The caller performs the actual network I/O; everything here is
//! payload assembly.

pub mod collaborators;
pub mod decorator;
pub mod decorators;
pub mod envelope;
pub mod evaluator;
pub mod expression;
pub mod outcome;
pub mod request;

pub use decorator::{Decorator, DecoratorRegistry, Operation};
pub use outcome::TransformOutcome;
pub use request::TransformRequest;

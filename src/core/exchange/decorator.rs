use crate::core::config::{GatewayConfig, ProviderFamily};
use crate::core::error::AppError;
use crate::core::exchange::collaborators::Collaborators;
use crate::core::exchange::decorators;
use crate::core::exchange::outcome::TransformOutcome;
use crate::core::exchange::request::TransformRequest;
use crate::core::types::ErrorCategory;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

/// Named sub-operation of a provider family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Operation {
    #[default]
    Default,
    ListMethods,
}

impl Operation {
    /// Unknown operation names resolve to nothing; the caller treats that as
    /// "provider has no such operation".
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "default" => Some(Self::Default),
            "listMethods" => Some(Self::ListMethods),
            _ => None,
        }
    }
}

/// Provider-specific transformer converting an internal request into an
/// outbound wire payload.
#[async_trait]
pub trait Decorator: Send + Sync + 'static {
    /// Decorator name used in diagnostics.
    fn name(&self) -> &'static str;

    /// Build the outbound payload. All I/O coordination happens here; the
    /// caller performs the network call with the outcome.
    async fn transform(&self, request: TransformRequest) -> Result<TransformOutcome, AppError>;
}

/// Builder used to register decorators before the registry is sealed.
#[derive(Default)]
pub struct DecoratorRegistryBuilder {
    entries: HashMap<(String, Operation), Arc<dyn Decorator>>,
}

impl DecoratorRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        key: &str,
        operation: Operation,
        decorator: Arc<dyn Decorator>,
    ) -> &mut Self {
        let entry = (key.to_string(), operation);
        if self.entries.contains_key(&entry) {
            panic!("duplicate decorator registered: {} {:?}", key, operation);
        }
        self.entries.insert(entry, decorator);
        self
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries
            .keys()
            .any(|(registered, _)| registered == key)
    }

    pub fn build(self) -> DecoratorRegistry {
        DecoratorRegistry {
            inner: Arc::new(self.entries),
        }
    }
}

/// Immutable decorator registry. Built once at process start from static
/// families plus configuration, then read-only; safe for concurrent
/// resolution without locking.
#[derive(Clone)]
pub struct DecoratorRegistry {
    inner: Arc<HashMap<(String, Operation), Arc<dyn Decorator>>>,
}

impl std::fmt::Debug for DecoratorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecoratorRegistry")
            .field("entries", &self.inner.len())
            .finish()
    }
}

impl DecoratorRegistry {
    pub fn builder() -> DecoratorRegistryBuilder {
        DecoratorRegistryBuilder::new()
    }

    /// Build the registry from the static provider families plus every
    /// dynamically configured provider. An unrecognized `provider` value is
    /// a fatal configuration error raised here, not at request time.
    pub fn from_config(
        config: &GatewayConfig,
        collaborators: Collaborators,
    ) -> Result<Self, AppError> {
        let mut builder = DecoratorRegistryBuilder::new();
        decorators::register_builtins(&mut builder, config, &collaborators);
        for (key, entry) in &config.providers {
            if builder.contains_key(key) {
                continue;
            }
            let family = ProviderFamily::parse(&entry.provider).ok_or_else(|| {
                AppError::new(
                    ErrorCategory::ConfigurationError,
                    format!(
                        "provider '{}' names unknown family '{}'",
                        key, entry.provider
                    ),
                )
                .with_code("PGW-REG-001")
            })?;
            decorators::register_family(&mut builder, key, family, config, &collaborators);
        }
        Ok(builder.build())
    }

    pub fn resolve(&self, key: &str, operation: Operation) -> Option<Arc<dyn Decorator>> {
        self.inner.get(&(key.to_string(), operation)).cloned()
    }

    pub fn resolve_default(&self, key: &str) -> Option<Arc<dyn Decorator>> {
        self.resolve(key, Operation::Default)
    }
}

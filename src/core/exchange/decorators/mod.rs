pub mod list_methods;
pub mod signer;
pub mod standard;
pub mod standard_trembita;
pub mod trembita;

use crate::core::config::{GatewayConfig, ProviderFamily};
use crate::core::exchange::collaborators::Collaborators;
use crate::core::exchange::decorator::{DecoratorRegistryBuilder, Operation};
use std::sync::Arc;

pub const STANDARD: &str = "standard";
pub const STANDARD_TREMBITA: &str = "standardTrembita";
pub const TREMBITA: &str = "trembita";
pub const SIGNER: &str = "signer";

/// Register the statically known provider families into the supplied builder.
pub fn register_builtins(
    builder: &mut DecoratorRegistryBuilder,
    config: &GatewayConfig,
    collaborators: &Collaborators,
) {
    register_family(builder, STANDARD, ProviderFamily::Standard, config, collaborators);
    register_family(
        builder,
        STANDARD_TREMBITA,
        ProviderFamily::StandardTrembita,
        config,
        collaborators,
    );
    register_family(builder, TREMBITA, ProviderFamily::Trembita, config, collaborators);
    register_family(builder, SIGNER, ProviderFamily::Signer, config, collaborators);
}

/// Register one family implementation under the given provider key.
pub fn register_family(
    builder: &mut DecoratorRegistryBuilder,
    key: &str,
    family: ProviderFamily,
    config: &GatewayConfig,
    collaborators: &Collaborators,
) {
    match family {
        ProviderFamily::Standard => {
            builder.register(
                key,
                Operation::Default,
                Arc::new(standard::StandardDecorator::new(collaborators.clone())),
            );
        }
        ProviderFamily::StandardTrembita => {
            builder.register(
                key,
                Operation::Default,
                Arc::new(standard_trembita::StandardTrembitaDecorator::new(
                    collaborators.clone(),
                )),
            );
        }
        ProviderFamily::Trembita => {
            builder.register(
                key,
                Operation::Default,
                Arc::new(trembita::TrembitaDecorator::new(
                    config.trembita.clone(),
                    collaborators.clone(),
                )),
            );
            builder.register(
                key,
                Operation::ListMethods,
                Arc::new(list_methods::TrembitaListMethodsDecorator::new(
                    config.trembita.clone(),
                )),
            );
        }
        ProviderFamily::Signer => {
            builder.register(
                key,
                Operation::Default,
                Arc::new(signer::SignerDecorator::new()),
            );
        }
    }
}

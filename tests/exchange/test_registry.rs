mod support;

use provider_gateway::core::config::DynamicProviderConfig;
use provider_gateway::core::exchange::decorator::{Decorator, DecoratorRegistry, Operation};
use provider_gateway::core::types::ErrorCategory;
use serde_json::json;
use support::*;

#[tokio::test]
async fn static_families_resolve_with_their_operations() {
    let env = TestEnv::default();
    let registry =
        DecoratorRegistry::from_config(&gateway_config(), env.collaborators()).expect("build");

    assert!(registry.resolve_default("standard").is_some());
    assert!(registry.resolve_default("standardTrembita").is_some());
    assert!(registry.resolve_default("trembita").is_some());
    assert!(registry.resolve("trembita", Operation::ListMethods).is_some());
    assert!(registry.resolve_default("signer").is_some());
}

#[tokio::test]
async fn unknown_operations_resolve_to_nothing() {
    let env = TestEnv::default();
    let registry =
        DecoratorRegistry::from_config(&gateway_config(), env.collaborators()).expect("build");

    assert!(registry.resolve("standard", Operation::ListMethods).is_none());
    assert!(registry.resolve("signer", Operation::ListMethods).is_none());
    assert!(registry.resolve_default("unknown-provider").is_none());
    assert!(Operation::parse("rollback").is_none());
    assert_eq!(Operation::parse("listMethods"), Some(Operation::ListMethods));
}

#[tokio::test]
async fn dynamic_providers_are_registered_from_configuration() {
    let env = TestEnv::default();
    let mut config = gateway_config();
    config.providers.insert(
        "partner-registry".to_string(),
        DynamicProviderConfig {
            provider: "trembita".to_string(),
        },
    );
    let registry = DecoratorRegistry::from_config(&config, env.collaborators()).expect("build");

    let decorator = registry
        .resolve_default("partner-registry")
        .expect("configured provider");
    assert_eq!(decorator.name(), "TrembitaDecorator");
    assert!(registry
        .resolve("partner-registry", Operation::ListMethods)
        .is_some());
}

#[tokio::test]
async fn unknown_family_fails_at_build_time() {
    let env = TestEnv::default();
    let mut config = gateway_config();
    config.providers.insert(
        "broken".to_string(),
        DynamicProviderConfig {
            provider: "grpc".to_string(),
        },
    );

    let err = DecoratorRegistry::from_config(&config, env.collaborators())
        .expect_err("unknown family");
    assert_eq!(err.code, "PGW-REG-001");
    assert_eq!(err.category, ErrorCategory::ConfigurationError);
}

#[tokio::test]
async fn configured_key_matching_a_static_family_is_ignored() {
    let env = TestEnv::default();
    let mut config = gateway_config();
    config.providers.insert(
        "standard".to_string(),
        DynamicProviderConfig {
            provider: "signer".to_string(),
        },
    );
    let registry = DecoratorRegistry::from_config(&config, env.collaborators()).expect("build");

    let decorator = registry.resolve_default("standard").expect("static entry");
    assert_eq!(decorator.name(), "StandardDecorator");
}

#[tokio::test]
async fn resolution_is_idempotent() {
    let env = TestEnv::default();
    let registry =
        DecoratorRegistry::from_config(&gateway_config(), env.collaborators()).expect("build");

    let first = registry.resolve_default("standard").expect("resolve");
    let second = registry.resolve_default("standard").expect("resolve");

    let request = request_with_document(document("doc-1", "tpl-1", None, json!({"n": 1})));
    let outcome_first = first.transform(request.clone()).await.expect("transform");
    let outcome_second = second.transform(request).await.expect("transform");
    assert_eq!(
        serde_json::to_value(outcome_first.as_standard().unwrap().body.clone()).unwrap(),
        serde_json::to_value(outcome_second.as_standard().unwrap().body.clone()).unwrap()
    );
}

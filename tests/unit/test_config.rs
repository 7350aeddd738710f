use provider_gateway::core::config::GatewayConfig;
use std::fs;
use std::io::Write;
use tempfile::NamedTempFile;

fn write_config(yaml: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp file");
    file.write_all(yaml.as_bytes()).expect("write config");
    file
}

const FULL_CONFIG: &str = r#"
providers:
  partner-registry:
    provider: trembita
  fallback-api:
    provider: standard
trembita:
  trembitaHeader:
    client:
      xRoadInstance: UA
      memberClass: GOV
      memberCode: "10000001"
      subsystemCode: CLIENT_SUB
    service:
      xRoadInstance: UA
      memberClass: GOV
      memberCode: "20000002"
      subsystemCode: SERVICE_SUB
    userId: operator
    protocolVersion: "4.0"
  serviceList:
    registry:
      client:
        xRoadInstance: UA
        memberClass: GOV
        memberCode: "10000001"
        subsystemCode: CLIENT_SUB
      service:
        xRoadInstance: UA
        memberClass: GOV
        memberCode: "30000003"
        subsystemCode: REGISTRY_SUB
      userId: registry-operator
      protocolVersion: "4.0"
      bodyNamespace: "http://registry.example/xsd"
"#;

#[test]
fn full_configuration_parses() {
    let file = write_config(FULL_CONFIG);
    let config = GatewayConfig::load_from_file(file.path()).expect("load");
    assert_eq!(config.providers.len(), 2);
    assert_eq!(config.providers["partner-registry"].provider, "trembita");
    let header = config.trembita.header.as_ref().expect("default header");
    assert_eq!(header.user_id, "operator");
    assert_eq!(header.client.subsystem_code, "CLIENT_SUB");
}

#[test]
fn service_header_falls_back_to_default() {
    let file = write_config(FULL_CONFIG);
    let config = GatewayConfig::load_from_file(file.path()).expect("load");

    let specific = config.trembita.header_for("registry").expect("specific");
    assert_eq!(specific.user_id, "registry-operator");
    assert_eq!(
        specific.body_namespace.as_deref(),
        Some("http://registry.example/xsd")
    );

    let fallback = config.trembita.header_for("unlisted").expect("fallback");
    assert_eq!(fallback.user_id, "operator");
}

#[test]
fn missing_header_and_service_entry_is_a_configuration_error() {
    let file = write_config("providers: {}\n");
    let config = GatewayConfig::load_from_file(file.path()).expect("load");
    let err = config.trembita.header_for("anything").expect_err("no header");
    assert_eq!(err.code, "PGW-CFG-002");
}

#[test]
fn unknown_provider_family_is_rejected_at_load() {
    let file = write_config(
        "providers:\n  broken:\n    provider: carrier-pigeon\n",
    );
    let err = GatewayConfig::load_from_file(file.path()).expect_err("unknown family");
    assert_eq!(err.code, "PGW-REG-001");
}

#[test]
fn unreadable_file_is_a_configuration_error() {
    let dir = tempfile::tempdir().expect("temp dir");
    let missing = dir.path().join("nope.yaml");
    fs::remove_file(&missing).ok();
    let err = GatewayConfig::load_from_file(&missing).expect_err("missing file");
    assert_eq!(err.code, "PGW-CFG-001");
}

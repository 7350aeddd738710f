mod support;

use provider_gateway::core::exchange::decorator::Decorator;
use provider_gateway::core::exchange::decorators::signer::SignerDecorator;
use provider_gateway::core::exchange::request::{TransformOptions, TransformRequest};
use provider_gateway::core::types::ErrorCategory;
use serde_json::json;
use support::*;

fn signer_request(expr: &str) -> TransformRequest {
    TransformRequest {
        provider_name: "signer".to_string(),
        method: Some("sign-file".to_string()),
        documents: vec![
            document("doc-1", "tpl-1", Some("f-1"), json!({})),
            document("doc-2", "tpl-2", None, json!({})),
            document("doc-3", "tpl-3", Some("f-3"), json!({})),
        ],
        options: Some(TransformOptions {
            signer_file_ids_expr: Some(expr.to_string()),
            ..TransformOptions::default()
        }),
        ..TransformRequest::default()
    }
}

#[tokio::test]
async fn falsy_entries_are_removed_from_the_result() {
    let decorator = SignerDecorator::new();
    let request = signer_request(r#"|ctx| ["a", (), "b"]"#);

    let outcome = decorator.transform(request).await.expect("transform");
    let outcome = outcome.as_signer().expect("signer outcome");
    assert_eq!(outcome.method, "sign-file");
    assert_eq!(outcome.file_ids, ["a", "b"]);
}

#[tokio::test]
async fn callable_receives_documents_and_events() {
    let decorator = SignerDecorator::new();
    let request = signer_request("|ctx| ctx.documents.map(|doc| doc.fileId)");

    let outcome = decorator.transform(request).await.expect("transform");
    let outcome = outcome.as_signer().expect("signer outcome");
    assert_eq!(outcome.file_ids, ["f-1", "f-3"]);
}

#[tokio::test]
async fn non_callable_expression_is_a_contract_error() {
    let decorator = SignerDecorator::new();
    let request = signer_request(r#"["a", "b"]"#);

    let err = decorator.transform(request).await.expect_err("not callable");
    assert_eq!(err.code, "PGW-EXPR-002");
    assert_eq!(err.category, ErrorCategory::ContractError);
}

#[tokio::test]
async fn empty_result_is_a_contract_error() {
    let decorator = SignerDecorator::new();
    let request = signer_request("|ctx| []");

    let err = decorator.transform(request).await.expect_err("no ids");
    assert_eq!(err.code, "PGW-SGN-004");
}

#[tokio::test]
async fn missing_expression_is_a_contract_error() {
    let decorator = SignerDecorator::new();
    let mut request = signer_request("ignored");
    request.options = None;

    let err = decorator.transform(request).await.expect_err("no expression");
    assert_eq!(err.code, "PGW-SGN-003");
}

#[tokio::test]
async fn unknown_method_is_rejected() {
    let decorator = SignerDecorator::new();
    let mut request = signer_request(r#"|ctx| ["a"]"#);
    request.method = Some("encrypt-file".to_string());

    let err = decorator.transform(request).await.expect_err("unknown method");
    assert_eq!(err.code, "PGW-SGN-002");
}

#[tokio::test]
async fn missing_method_is_rejected() {
    let decorator = SignerDecorator::new();
    let mut request = signer_request(r#"|ctx| ["a"]"#);
    request.method = None;

    let err = decorator.transform(request).await.expect_err("no method");
    assert_eq!(err.code, "PGW-SGN-001");
}

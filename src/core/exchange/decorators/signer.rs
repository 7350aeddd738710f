use crate::core::error::AppError;
use crate::core::exchange::decorator::Decorator;
use crate::core::exchange::expression::{ExpressionBindings, ExpressionEngine};
use crate::core::exchange::outcome::{SignerOutcome, TransformOutcome};
use crate::core::exchange::request::TransformRequest;
use crate::core::types::ErrorCategory;
use async_trait::async_trait;
use serde_json::Value;

const SIGN_FILE: &str = "sign-file";

/// Signing provider: resolves which stored files should be signed. The
/// configured expression must yield a callable which, invoked with the
/// workflow's documents and events, returns a file id or a sequence of ids.
pub struct SignerDecorator {
    engine: ExpressionEngine,
}

impl Default for SignerDecorator {
    fn default() -> Self {
        Self::new()
    }
}

impl SignerDecorator {
    pub fn new() -> Self {
        Self {
            engine: ExpressionEngine::default(),
        }
    }

    fn sign_file(&self, request: &TransformRequest) -> Result<TransformOutcome, AppError> {
        let expr = request
            .options
            .as_ref()
            .and_then(|options| options.signer_file_ids_expr.as_deref())
            .filter(|expr| !expr.trim().is_empty())
            .ok_or_else(|| {
                AppError::new(
                    ErrorCategory::ContractError,
                    "signer file id expression is not configured",
                )
                .with_code("PGW-SGN-003")
            })?;

        let args = ExpressionBindings::new()
            .bind("documents", serde_json::to_value(&request.documents)?)
            .bind("events", serde_json::to_value(&request.events)?);
        let result = self.engine.evaluate_callable("signerFileIds", expr, &args)?;

        let mut file_ids = Vec::new();
        collect_file_ids(&result, &mut file_ids);
        if file_ids.is_empty() {
            return Err(AppError::new(
                ErrorCategory::ContractError,
                "signer file id expression produced no file ids",
            )
            .with_code("PGW-SGN-004"));
        }

        Ok(TransformOutcome::Signer(SignerOutcome {
            method: SIGN_FILE.to_string(),
            file_ids,
        }))
    }
}

#[async_trait]
impl Decorator for SignerDecorator {
    fn name(&self) -> &'static str {
        "SignerDecorator"
    }

    async fn transform(&self, request: TransformRequest) -> Result<TransformOutcome, AppError> {
        let method = request.method.as_deref().ok_or_else(|| {
            AppError::new(
                ErrorCategory::ValidationError,
                "signer request carries no method",
            )
            .with_code("PGW-SGN-001")
        })?;
        match method {
            SIGN_FILE => self.sign_file(&request),
            other => Err(AppError::new(
                ErrorCategory::ValidationError,
                format!("unknown signer method '{}'", other),
            )
            .with_code("PGW-SGN-002")),
        }
    }
}

/// Flatten the callable's result, dropping falsy entries.
fn collect_file_ids(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::String(id) if !id.is_empty() => out.push(id.clone()),
        Value::Array(items) => {
            for item in items {
                collect_file_ids(item, out);
            }
        }
        _ => {}
    }
}

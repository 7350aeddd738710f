use crate::core::config::TrembitaConfig;
use crate::core::error::AppError;
use crate::core::exchange::decorator::Decorator;
use crate::core::exchange::envelope;
use crate::core::exchange::outcome::{ListMethodsOutcome, TransformOutcome};
use crate::core::exchange::request::TransformRequest;
use async_trait::async_trait;
use chrono::Utc;

/// Service-discovery call: ignores the request's document context entirely
/// and returns the fixed introspection envelope.
pub struct TrembitaListMethodsDecorator {
    config: TrembitaConfig,
}

impl TrembitaListMethodsDecorator {
    pub fn new(config: TrembitaConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Decorator for TrembitaListMethodsDecorator {
    fn name(&self) -> &'static str {
        "TrembitaListMethodsDecorator"
    }

    async fn transform(&self, request: TransformRequest) -> Result<TransformOutcome, AppError> {
        let header = self.config.header_for(&request.service)?;
        let request_id = Utc::now().timestamp_millis().to_string();
        Ok(TransformOutcome::ListMethods(ListMethodsOutcome {
            soap_message: envelope::build_list_methods_envelope(header, &request_id),
        }))
    }
}

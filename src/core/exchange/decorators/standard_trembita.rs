use crate::core::error::AppError;
use crate::core::exchange::collaborators::Collaborators;
use crate::core::exchange::decorator::Decorator;
use crate::core::exchange::outcome::{Destination, StandardOutcome, TransformOutcome};
use crate::core::exchange::request::TransformRequest;
use async_trait::async_trait;
use serde_json::json;

/// Reduced standard-family variant for Trembita-style partners that receive
/// the plain body shape instead of a SOAP envelope. No options evaluation,
/// no attachments, no additional signatures.
pub struct StandardTrembitaDecorator {
    collaborators: Collaborators,
}

impl StandardTrembitaDecorator {
    pub fn new(collaborators: Collaborators) -> Self {
        Self { collaborators }
    }
}

#[async_trait]
impl Decorator for StandardTrembitaDecorator {
    fn name(&self) -> &'static str {
        "StandardTrembitaDecorator"
    }

    async fn transform(&self, request: TransformRequest) -> Result<TransformOutcome, AppError> {
        let document = request.document()?;

        let file_p7s = if request.send_file.is_enabled() {
            match &document.file_id {
                Some(file_id) => self
                    .collaborators
                    .files
                    .get_p7s_signature(file_id)
                    .await?
                    .unwrap_or_default(),
                None => String::new(),
            }
        } else {
            String::new()
        };

        let body = json!({
            "workflowId": request.workflow_id,
            "documentId": document.id,
            "data": document.data,
            "fileP7s": file_p7s,
        });

        Ok(TransformOutcome::Standard(StandardOutcome {
            body,
            destination: Destination {
                service: request.service.clone(),
            },
            response_file: false,
            workflow_id: request.workflow_id.clone(),
            document_id: document.id.clone(),
            event_id: None,
            save_base64_logs: false,
        }))
    }
}

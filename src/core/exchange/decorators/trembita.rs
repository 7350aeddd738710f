use crate::core::config::TrembitaConfig;
use crate::core::error::AppError;
use crate::core::exchange::collaborators::Collaborators;
use crate::core::exchange::decorator::Decorator;
use crate::core::exchange::envelope;
use crate::core::exchange::expression::{is_truthy, ExpressionBindings, ExpressionEngine};
use crate::core::exchange::outcome::{TransformOutcome, TrembitaOutcome};
use crate::core::exchange::request::{SendFile, TransformRequest};
use crate::core::types::ErrorCategory;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::Utc;
use futures::future::try_join_all;
use serde_json::{json, Map as JsonMap, Value};

const SIGN_FIELD: &str = "sign";
const ATTACHMENTS_FIELD: &str = "attachments";
/// Fixed path inside an event's data where the produced file id is stored.
const EVENT_FILE_ID_PATH: &[&str] = &["result", "fileId"];

/// X-Road provider: builds a signed XML envelope plus an independently
/// assembled log envelope with large payloads replaced by identifiers.
pub struct TrembitaDecorator {
    config: TrembitaConfig,
    collaborators: Collaborators,
    engine: ExpressionEngine,
}

impl TrembitaDecorator {
    pub fn new(config: TrembitaConfig, collaborators: Collaborators) -> Self {
        Self {
            config,
            collaborators,
            engine: ExpressionEngine::default(),
        }
    }

    /// File whose detached signature is embedded: normally the primary
    /// document's, but a template-id `sendFile` selects the sibling document
    /// carrying that template instead.
    fn sign_file_id(&self, request: &TransformRequest) -> Result<Option<String>, AppError> {
        let document = request.document()?;
        if let SendFile::Template(template_id) = &request.send_file {
            if let Some(sibling) = request
                .documents
                .iter()
                .find(|doc| &doc.template_id == template_id)
            {
                return Ok(sibling.file_id.clone());
            }
        }
        Ok(document.file_id.clone())
    }

    async fn bundle_attachments(
        &self,
        request: &TransformRequest,
    ) -> Result<Option<Vec<Value>>, AppError> {
        let config = match &request.attachments {
            Some(config) => config,
            None => return Ok(None),
        };
        let target = match request
            .documents
            .iter()
            .find(|doc| doc.template_id == config.document_template_id)
        {
            Some(target) => target,
            None => return Ok(None),
        };
        let records = self
            .collaborators
            .attachments
            .get_by_document_id(&target.id)
            .await?;
        let to_send: Vec<_> = records.into_iter().filter(|record| record.send).collect();
        if to_send.is_empty() {
            return Ok(None);
        }

        // All downloads run in parallel; one failure aborts the transform so
        // a partial attachment set is never sent.
        let downloads = to_send
            .iter()
            .map(|record| self.collaborators.files.download_file(&record.file_id));
        let contents = try_join_all(downloads).await.map_err(|err| {
            AppError::new(
                ErrorCategory::StorageError,
                format!("cannot download all attachments: {}", err),
            )
            .with_code("PGW-TRM-002")
        })?;

        let list = to_send
            .iter()
            .zip(contents)
            .map(|(record, bytes)| {
                json!({
                    "description": record.attachment_type,
                    "name": record.description,
                    "content": BASE64.encode(bytes),
                })
            })
            .collect();
        Ok(Some(list))
    }

    async fn file_from_event(
        &self,
        request: &TransformRequest,
    ) -> Result<Option<EventFile>, AppError> {
        let config = match request
            .options
            .as_ref()
            .and_then(|options| options.send_file_from_event.as_ref())
        {
            Some(config) => config,
            None => return Ok(None),
        };
        let document = request.document()?;
        let bindings =
            ExpressionBindings::new().bind("document", serde_json::to_value(document)?);
        let need = self
            .engine
            .evaluate("needSendFileFromEvent", &config.condition_expr, &bindings)?;
        if !is_truthy(&need) {
            return Ok(None);
        }

        let event = self
            .collaborators
            .events
            .get_last_by_workflow_and_template(&request.workflow_id, &config.event_template_id)
            .await?
            .ok_or_else(|| {
                AppError::new(
                    ErrorCategory::ContractError,
                    format!(
                        "no event of template '{}' found for workflow '{}'",
                        config.event_template_id, request.workflow_id
                    ),
                )
                .with_code("PGW-TRM-003")
            })?;
        let file_id = EVENT_FILE_ID_PATH
            .iter()
            .try_fold(&event.data, |value, key| value.get(*key))
            .and_then(Value::as_str)
            .ok_or_else(|| {
                AppError::new(
                    ErrorCategory::ContractError,
                    format!(
                        "event '{}' carries no file id at {}",
                        event.id,
                        EVENT_FILE_ID_PATH.join(".")
                    ),
                )
                .with_code("PGW-TRM-003")
            })?
            .to_string();
        let bytes = self.collaborators.files.download_file(&file_id).await?;
        Ok(Some(EventFile {
            file_id,
            key_path: config.key_path.clone(),
            content_base64: BASE64.encode(bytes),
        }))
    }
}

struct EventFile {
    file_id: String,
    key_path: String,
    content_base64: String,
}

#[async_trait]
impl Decorator for TrembitaDecorator {
    fn name(&self) -> &'static str {
        "TrembitaDecorator"
    }

    async fn transform(&self, request: TransformRequest) -> Result<TransformOutcome, AppError> {
        let document = request.document()?.clone();

        let file_p7s = match self.sign_file_id(&request)? {
            Some(file_id) => self
                .collaborators
                .files
                .get_p7s_signature(&file_id)
                .await?
                .unwrap_or_default(),
            None => String::new(),
        };

        let mut outbound = match document.nested_data() {
            Value::Object(map) => map.clone(),
            _ => JsonMap::new(),
        };
        outbound.insert(SIGN_FIELD.to_string(), json!(file_p7s));
        // The log payload is assembled independently from this point: large
        // file contents added below go only into the real payload.
        let mut log_payload = outbound.clone();

        if let Some(attachments) = self.bundle_attachments(&request).await? {
            tracing::debug!(
                document_id = %document.id,
                count = attachments.len(),
                "bundling document attachments"
            );
            outbound.insert(ATTACHMENTS_FIELD.to_string(), Value::Array(attachments));
        }

        let mut file_id_from_event = None;
        let mut send_file_from_event_key_name = None;
        if let Some(event_file) = self.file_from_event(&request).await? {
            set_at_path(
                &mut outbound,
                &event_file.key_path,
                Value::String(event_file.content_base64.clone()),
            );
            set_at_path(
                &mut log_payload,
                &event_file.key_path,
                Value::String(event_file.file_id.clone()),
            );
            send_file_from_event_key_name = Some(event_file.key_path);
            file_id_from_event = Some(event_file.file_id);
        }

        let header = self.config.header_for(&request.service)?;
        // One timestamp for both envelopes keeps them diff-able.
        let timestamp = Utc::now().timestamp_millis();
        let request_id = format!("{}|{}", request.workflow_id, timestamp);
        let payload = BASE64.encode(serde_json::to_vec(&Value::Object(outbound))?);
        let log_payload = BASE64.encode(serde_json::to_vec(&Value::Object(log_payload))?);

        Ok(TransformOutcome::Trembita(TrembitaOutcome {
            soap_message: envelope::build_data_envelope(header, &request_id, &payload),
            soap_message_for_log: envelope::build_data_envelope(header, &request_id, &log_payload),
            document_id: document.id,
            workflow_id: request.workflow_id.clone(),
            document_template_id: document.template_id,
            file_id_from_event,
            send_file_from_event_key_name,
            service: request.service.clone(),
        }))
    }
}

/// Set a value at a dot-separated key path, creating intermediate objects.
fn set_at_path(map: &mut JsonMap<String, Value>, path: &str, value: Value) {
    let mut keys = path.split('.').peekable();
    let mut current = map;
    while let Some(key) = keys.next() {
        if keys.peek().is_none() {
            current.insert(key.to_string(), value);
            return;
        }
        let entry = current
            .entry(key.to_string())
            .or_insert_with(|| Value::Object(JsonMap::new()));
        if !entry.is_object() {
            *entry = Value::Object(JsonMap::new());
        }
        current = match entry {
            Value::Object(next) => next,
            _ => return,
        };
    }
}

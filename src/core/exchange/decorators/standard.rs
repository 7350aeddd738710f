use crate::core::error::AppError;
use crate::core::exchange::collaborators::Collaborators;
use crate::core::exchange::decorator::Decorator;
use crate::core::exchange::evaluator::{self, HostCallables};
use crate::core::exchange::expression::{ExpressionBindings, ExpressionEngine};
use crate::core::exchange::outcome::{Destination, StandardOutcome, TransformOutcome};
use crate::core::exchange::request::{SignatureSelection, TransformRequest};
use crate::core::types::ErrorCategory;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use futures::future::try_join_all;
use serde_json::{json, Map as JsonMap, Value};
use std::sync::Arc;

/// Generic REST-style provider: builds a structured body sent as-is to a
/// named destination service.
pub struct StandardDecorator {
    collaborators: Collaborators,
    engine: ExpressionEngine,
}

impl StandardDecorator {
    pub fn new(collaborators: Collaborators) -> Self {
        Self {
            collaborators,
            engine: ExpressionEngine::default(),
        }
    }

    fn eval_id_list(
        &self,
        name: &str,
        expr: Option<&str>,
        bindings: &ExpressionBindings,
    ) -> Result<Vec<String>, AppError> {
        let expr = match expr {
            Some(expr) if !expr.trim().is_empty() => expr,
            _ => return Ok(Vec::new()),
        };
        let value = self.engine.evaluate(name, expr, bindings)?;
        id_list_from_value(name, &value)
    }

    async fn collect_additional_signatures(
        &self,
        request: &TransformRequest,
        documents_json: &Value,
    ) -> Result<Vec<String>, AppError> {
        let document = request.document()?;
        let history = self
            .collaborators
            .signatures
            .get_by_document_id(&document.id)
            .await?;
        match request.signatures.selection()? {
            SignatureSelection::Index(expr) => {
                let bindings =
                    ExpressionBindings::new().bind("documents", documents_json.clone());
                let index_value = self
                    .engine
                    .evaluate("additionalDataSignatureIndex", expr, &bindings)
                    .map_err(|err| {
                        err.with_context(format!(
                            "selecting additional signature for document '{}'",
                            document.id
                        ))
                    })?;
                let index = index_value.as_u64().ok_or_else(|| {
                    AppError::new(
                        ErrorCategory::ContractError,
                        "additionalDataSignatureIndex must evaluate to a numeric position",
                    )
                    .with_code("PGW-STD-003")
                })? as usize;
                let record = history.get(index).ok_or_else(|| {
                    AppError::new(
                        ErrorCategory::ContractError,
                        format!(
                            "additionalDataSignatureIndex {} is out of range ({} signatures)",
                            index,
                            history.len()
                        ),
                    )
                    .with_code("PGW-STD-004")
                })?;
                Ok(vec![record.signature.clone()])
            }
            SignatureSelection::Filter(expr) => {
                let bindings = ExpressionBindings::new()
                    .bind("documents", documents_json.clone())
                    .bind("signatureHistory", serde_json::to_value(&history)?);
                let selected = self
                    .engine
                    .evaluate("additionalDataSignatureFilter", expr, &bindings)?;
                let items = selected.as_array().ok_or_else(|| {
                    AppError::new(
                        ErrorCategory::ContractError,
                        "additionalDataSignatureFilter must evaluate to an array",
                    )
                    .with_code("PGW-STD-005")
                })?;
                Ok(items
                    .iter()
                    .filter_map(|item| item.get("signature").and_then(Value::as_str))
                    .map(str::to_string)
                    .collect())
            }
            SignatureSelection::All => {
                Ok(history.into_iter().map(|record| record.signature).collect())
            }
        }
    }
}

#[async_trait]
impl Decorator for StandardDecorator {
    fn name(&self) -> &'static str {
        "StandardDecorator"
    }

    async fn transform(&self, request: TransformRequest) -> Result<TransformOutcome, AppError> {
        // Contradictory signature selectors fail before any I/O.
        request.signatures.selection()?;
        let document = request.document()?.clone();

        let documents_json = serde_json::to_value(&request.documents)?;
        let bindings = ExpressionBindings::new()
            .bind("document", serde_json::to_value(&document)?)
            .bind("event", serde_json::to_value(&request.event)?)
            .bind("documents", documents_json.clone())
            .bind("events", serde_json::to_value(&request.events)?);

        let options = request.options.clone().unwrap_or_default();
        let file_ids =
            self.eval_id_list("fileIds", options.file_ids_expr.as_deref(), &bindings)?;
        let p7s_file_ids =
            self.eval_id_list("p7sFileIds", options.p7s_file_ids_expr.as_deref(), &bindings)?;

        let options_result = if options.fields.is_empty() {
            None
        } else {
            let host: Arc<dyn HostCallables> = Arc::new(StandardHelpers {
                collaborators: self.collaborators.clone(),
                document_id: document.id.clone(),
            });
            Some(evaluator::evaluate_fields(&options.fields, &bindings, &host).await?)
        };

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

        // Independent fetches, joined all-or-nothing: a single failure fails
        // the whole transform so no partial attachment list is ever returned.
        let fetches = p7s_file_ids
            .iter()
            .chain(file_ids.iter())
            .map(|file_id| self.collaborators.files.get_file(file_id));
        let files: Vec<Value> = try_join_all(fetches)
            .await?
            .into_iter()
            .map(|file| {
                json!({
                    "name": file.name,
                    "contentType": file.content_type,
                    "content": BASE64.encode(&file.content),
                })
            })
            .collect();

        let additional_signatures = if request.signatures.send {
            self.collect_additional_signatures(&request, &documents_json)
                .await?
        } else {
            Vec::new()
        };

        tracing::debug!(
            document_id = %document.id,
            files = files.len(),
            additional_signatures = additional_signatures.len(),
            prepared = document.prepared_data().is_some(),
            "assembling standard body"
        );

        let base = match document.prepared_data() {
            Some(prepared) => prepared
                .as_object()
                .cloned()
                .ok_or_else(|| {
                    AppError::new(
                        ErrorCategory::ContractError,
                        "preparedData must be an object",
                    )
                    .with_code("PGW-STD-006")
                })?,
            None => {
                let data = options_result.unwrap_or_else(|| {
                    if !document.data.is_null() {
                        document.data.clone()
                    } else {
                        request
                            .event
                            .as_ref()
                            .map(|event| event.data.clone())
                            .unwrap_or(Value::Null)
                    }
                });
                let mut map = JsonMap::new();
                map.insert("workflowId".to_string(), json!(request.workflow_id));
                map.insert("documentId".to_string(), json!(document.id));
                map.insert("eventId".to_string(), json!(request.event_id()));
                map.insert("data".to_string(), data);
                map
            }
        };
        let body = finalize_body(base, file_p7s, files, additional_signatures);

        Ok(TransformOutcome::Standard(StandardOutcome {
            body,
            destination: Destination {
                service: request.service.clone(),
            },
            response_file: options.response_file,
            workflow_id: request.workflow_id.clone(),
            document_id: document.id,
            event_id: request.event_id(),
            save_base64_logs: options.save_base64_logs,
        }))
    }
}

fn finalize_body(
    mut base: JsonMap<String, Value>,
    file_p7s: String,
    files: Vec<Value>,
    additional_signatures: Vec<String>,
) -> Value {
    base.insert("fileP7s".to_string(), json!(file_p7s));
    if !files.is_empty() {
        base.insert("files".to_string(), Value::Array(files));
    }
    base.insert(
        "additionalSignatures".to_string(),
        json!(additional_signatures),
    );
    Value::Object(base)
}

fn id_list_from_value(name: &str, value: &Value) -> Result<Vec<String>, AppError> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::String(id) if !id.is_empty() => Ok(vec![id.clone()]),
        Value::String(_) => Ok(Vec::new()),
        Value::Array(items) => items
            .iter()
            .map(|item| {
                item.as_str().map(str::to_string).ok_or_else(|| {
                    AppError::new(
                        ErrorCategory::ContractError,
                        format!("expression '{}' must yield file id strings", name),
                    )
                    .with_code("PGW-STD-001")
                })
            })
            .collect(),
        _ => Err(AppError::new(
            ErrorCategory::ContractError,
            format!("expression '{}' must yield a sequence of file ids", name),
        )
        .with_code("PGW-STD-001")),
    }
}

/// Host helpers bound to one request for options expressions.
struct StandardHelpers {
    collaborators: Collaborators,
    document_id: String,
}

const HELPER_NAMES: &[&str] = &[
    "get_additional_signatures",
    "sign",
    "to_base64",
    "get_file_base64",
];

#[async_trait]
impl HostCallables for StandardHelpers {
    fn names(&self) -> &'static [&'static str] {
        HELPER_NAMES
    }

    async fn call(&self, name: &str, arg: Value) -> Result<Value, AppError> {
        match name {
            "get_additional_signatures" => {
                let document_id = arg
                    .as_str()
                    .map(str::to_string)
                    .unwrap_or_else(|| self.document_id.clone());
                let records = self
                    .collaborators
                    .signatures
                    .get_by_document_id(&document_id)
                    .await?;
                Ok(serde_json::to_value(records)?)
            }
            "sign" => Ok(self.collaborators.signer.sign(arg).await?),
            "to_base64" => {
                let bytes = match &arg {
                    Value::String(s) => s.clone().into_bytes(),
                    other => serde_json::to_vec(other)?,
                };
                Ok(Value::String(BASE64.encode(bytes)))
            }
            "get_file_base64" => {
                let file_id = arg.as_str().ok_or_else(|| {
                    AppError::new(
                        ErrorCategory::ContractError,
                        "get_file_base64 requires a file id",
                    )
                    .with_code("PGW-STD-007")
                })?;
                let bytes = self.collaborators.files.download_file(file_id).await?;
                Ok(Value::String(BASE64.encode(bytes)))
            }
            other => Err(AppError::new(
                ErrorCategory::InternalError,
                format!("unknown host callable '{}'", other),
            )),
        }
    }
}

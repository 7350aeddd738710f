use crate::core::error::AppError;
use crate::core::types::ErrorCategory;
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Primary or sibling document attached to a workflow instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    #[serde(rename = "documentTemplateId")]
    pub template_id: String,
    #[serde(rename = "fileId", default)]
    pub file_id: Option<String>,
    #[serde(default)]
    pub data: Value,
}

impl Document {
    /// Pre-serialized body that replaces default body construction entirely
    /// when present.
    pub fn prepared_data(&self) -> Option<&Value> {
        self.data.get("preparedData")
    }

    /// Nested `data` field used as the outbound payload, or the whole data
    /// object when not nested.
    pub fn nested_data(&self) -> &Value {
        self.data.get("data").unwrap_or(&self.data)
    }
}

/// Triggering or sibling event of a workflow instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    #[serde(rename = "eventTemplateId")]
    pub template_id: String,
    #[serde(default)]
    pub data: Value,
}

/// Whose file's detached signature should be embedded, if any. Configured as
/// either a boolean or a document-template id selecting a sibling document.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SendFile {
    #[default]
    No,
    Primary,
    Template(String),
}

impl SendFile {
    pub fn is_enabled(&self) -> bool {
        !matches!(self, SendFile::No)
    }

    pub fn template(&self) -> Option<&str> {
        match self {
            SendFile::Template(id) => Some(id),
            _ => None,
        }
    }
}

impl<'de> Deserialize<'de> for SendFile {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Bool(true) => Ok(SendFile::Primary),
            Value::Bool(false) | Value::Null => Ok(SendFile::No),
            Value::String(id) if !id.is_empty() => Ok(SendFile::Template(id)),
            Value::String(_) => Ok(SendFile::No),
            other => Err(serde::de::Error::custom(format!(
                "sendFile must be a boolean or a document template id, got {}",
                other
            ))),
        }
    }
}

/// Per-template configuration for sending a file produced by an earlier
/// event.
#[derive(Debug, Clone, Deserialize)]
pub struct SendFileFromEvent {
    /// Condition expression evaluated against the primary document.
    #[serde(rename = "needSendFileFromEvent")]
    pub condition_expr: String,
    /// Template of the event that produced the file.
    #[serde(rename = "eventTemplateId")]
    pub event_template_id: String,
    /// Dot-separated key path where the file content is placed.
    #[serde(rename = "keyName")]
    pub key_path: String,
}

/// Operator-authored computation rules scoped to one document template.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransformOptions {
    /// Output-field-name to expression, evaluated sequentially in mapping
    /// order.
    #[serde(default)]
    pub fields: IndexMap<String, String>,
    #[serde(rename = "fileIds", default)]
    pub file_ids_expr: Option<String>,
    #[serde(rename = "p7sFileIds", default)]
    pub p7s_file_ids_expr: Option<String>,
    #[serde(rename = "sendFileFromEvent", default)]
    pub send_file_from_event: Option<SendFileFromEvent>,
    #[serde(rename = "signerFileIds", default)]
    pub signer_file_ids_expr: Option<String>,
    #[serde(rename = "responseFile", default)]
    pub response_file: bool,
    #[serde(rename = "saveBase64Logs", default)]
    pub save_base64_logs: bool,
}

/// Which document template's stored attachments to bundle.
#[derive(Debug, Clone, Deserialize)]
pub struct AttachmentsConfig {
    #[serde(rename = "documentTemplateId")]
    pub document_template_id: String,
}

/// Additional-data-signature flags. At most one of `index_expr` and
/// `filter_expr` may be configured; both checks are identical.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdditionalSignatures {
    #[serde(rename = "sendAdditionalDataSignatures", default)]
    pub send: bool,
    #[serde(rename = "additionalDataSignatureIndex", default)]
    pub index_expr: Option<String>,
    #[serde(rename = "additionalDataSignatureFilter", default)]
    pub filter_expr: Option<String>,
}

/// How the signature history is narrowed down to the signatures to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureSelection<'a> {
    Index(&'a str),
    Filter(&'a str),
    All,
}

impl AdditionalSignatures {
    fn configured(expr: &Option<String>) -> bool {
        matches!(expr.as_deref(), Some(s) if !s.trim().is_empty())
    }

    /// Resolve the selection mode. Configuring both selectors is a fatal
    /// configuration error, raised before any I/O.
    pub fn selection(&self) -> Result<SignatureSelection<'_>, AppError> {
        let index = Self::configured(&self.index_expr);
        let filter = Self::configured(&self.filter_expr);
        match (index, filter) {
            (true, true) => Err(AppError::new(
                ErrorCategory::ConfigurationError,
                "additionalDataSignatureIndex and additionalDataSignatureFilter are both configured; at most one is allowed",
            )
            .with_code("PGW-STD-002")),
            (true, false) => Ok(SignatureSelection::Index(
                self.index_expr.as_deref().unwrap_or_default(),
            )),
            (false, true) => Ok(SignatureSelection::Filter(
                self.filter_expr.as_deref().unwrap_or_default(),
            )),
            (false, false) => Ok(SignatureSelection::All),
        }
    }
}

/// The single input bag passed to every decorator.
#[derive(Debug, Clone, Default)]
pub struct TransformRequest {
    pub provider_name: String,
    /// Destination identifier used for routing and header lookup.
    pub service: String,
    pub send_file: SendFile,
    pub workflow_id: String,
    /// Always present for every decorator except the list-methods variant.
    pub document: Option<Document>,
    /// All documents attached to the workflow instance.
    pub documents: Vec<Document>,
    /// Triggering event.
    pub event: Option<Event>,
    /// Sibling events.
    pub events: Vec<Event>,
    pub options: Option<TransformOptions>,
    pub attachments: Option<AttachmentsConfig>,
    pub signatures: AdditionalSignatures,
    /// Signer family sub-operation name.
    pub method: Option<String>,
}

impl TransformRequest {
    /// The primary document; its absence is a contract violation for every
    /// decorator except the list-methods variant.
    pub fn document(&self) -> Result<&Document, AppError> {
        self.document.as_ref().ok_or_else(|| {
            AppError::new(
                ErrorCategory::ValidationError,
                "transform request carries no primary document",
            )
            .with_code("PGW-REQ-001")
        })
    }

    pub fn event_id(&self) -> Option<String> {
        self.event.as_ref().map(|event| event.id.clone())
    }
}

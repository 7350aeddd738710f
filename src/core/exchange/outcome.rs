use serde::Serialize;
use serde_json::Value;

/// Routing target of a standard-family payload.
#[derive(Debug, Clone, Serialize)]
pub struct Destination {
    pub service: String,
}

/// Standard-family outcome: a structured body sent as-is to a named service.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StandardOutcome {
    pub body: Value,
    pub destination: Destination,
    pub response_file: bool,
    pub workflow_id: String,
    pub document_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    pub save_base64_logs: bool,
}

/// Trembita-family outcome: a signed envelope plus an independently built
/// log envelope with large payloads elided.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrembitaOutcome {
    pub soap_message: String,
    pub soap_message_for_log: String,
    pub document_id: String,
    pub workflow_id: String,
    pub document_template_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_id_from_event: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub send_file_from_event_key_name: Option<String>,
    /// Service key used for header routing.
    pub service: String,
}

/// Introspection call outcome; no document context.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListMethodsOutcome {
    pub soap_message: String,
}

/// Signer-family outcome.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignerOutcome {
    pub method: String,
    pub file_ids: Vec<String>,
}

/// Outcome of one transform, discriminated by provider family.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum TransformOutcome {
    Standard(StandardOutcome),
    Trembita(TrembitaOutcome),
    ListMethods(ListMethodsOutcome),
    Signer(SignerOutcome),
}

impl TransformOutcome {
    pub fn as_standard(&self) -> Option<&StandardOutcome> {
        match self {
            TransformOutcome::Standard(outcome) => Some(outcome),
            _ => None,
        }
    }

    pub fn as_trembita(&self) -> Option<&TrembitaOutcome> {
        match self {
            TransformOutcome::Trembita(outcome) => Some(outcome),
            _ => None,
        }
    }

    pub fn as_list_methods(&self) -> Option<&ListMethodsOutcome> {
        match self {
            TransformOutcome::ListMethods(outcome) => Some(outcome),
            _ => None,
        }
    }

    pub fn as_signer(&self) -> Option<&SignerOutcome> {
        match self {
            TransformOutcome::Signer(outcome) => Some(outcome),
            _ => None,
        }
    }
}

//! Collaborator interfaces consumed by decorators: object storage, stored
//! document attachments, event lookup, signature history, and the signing
//! service. Handles are injected at decorator construction; decorators never
//! retry a failed collaborator call.

use crate::core::error::AppError;
use crate::core::exchange::request::Event;
use crate::core::types::ErrorCategory;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CollaboratorError {
    #[error("'{0}' not found")]
    NotFound(String),
    #[error("backend failure: {0}")]
    Backend(String),
}

impl From<CollaboratorError> for AppError {
    fn from(err: CollaboratorError) -> Self {
        AppError::new(ErrorCategory::StorageError, err.to_string()).with_code("PGW-IO-001")
    }
}

/// File retrieved from object storage.
#[derive(Debug, Clone)]
pub struct StoredFile {
    pub name: String,
    pub content_type: String,
    pub content: Vec<u8>,
}

/// Metadata of an attachment stored against a document.
#[derive(Debug, Clone)]
pub struct AttachmentRecord {
    pub file_id: String,
    pub attachment_type: String,
    pub description: String,
    /// Only attachments marked for sending are ever bundled.
    pub send: bool,
}

/// One entry of a document's signature history.
#[derive(Debug, Clone, Serialize)]
pub struct SignatureRecord {
    pub signature: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

#[async_trait]
pub trait FileStorage: Send + Sync + 'static {
    async fn get_file(&self, file_id: &str) -> Result<StoredFile, CollaboratorError>;

    /// Detached P7S signature for a stored file. Absence is not an error.
    async fn get_p7s_signature(&self, file_id: &str)
        -> Result<Option<String>, CollaboratorError>;

    async fn download_file(&self, file_id: &str) -> Result<Vec<u8>, CollaboratorError>;
}

#[async_trait]
pub trait DocumentAttachmentStore: Send + Sync + 'static {
    async fn get_by_document_id(
        &self,
        document_id: &str,
    ) -> Result<Vec<AttachmentRecord>, CollaboratorError>;
}

#[async_trait]
pub trait EventStore: Send + Sync + 'static {
    /// Most recent event produced for the workflow by the given template.
    async fn get_last_by_workflow_and_template(
        &self,
        workflow_id: &str,
        event_template_id: &str,
    ) -> Result<Option<Event>, CollaboratorError>;
}

#[async_trait]
pub trait AdditionalSignatureStore: Send + Sync + 'static {
    /// Signature history for a document, ascending by creation time.
    async fn get_by_document_id(
        &self,
        document_id: &str,
    ) -> Result<Vec<SignatureRecord>, CollaboratorError>;
}

#[async_trait]
pub trait SigningService: Send + Sync + 'static {
    async fn sign(&self, data: Value) -> Result<Value, CollaboratorError>;
}

/// Bundle of collaborator handles shared by decorator instances.
#[derive(Clone)]
pub struct Collaborators {
    pub files: Arc<dyn FileStorage>,
    pub attachments: Arc<dyn DocumentAttachmentStore>,
    pub events: Arc<dyn EventStore>,
    pub signatures: Arc<dyn AdditionalSignatureStore>,
    pub signer: Arc<dyn SigningService>,
}

#![allow(dead_code)]

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::{Duration, Utc};
use provider_gateway::core::config::{
    GatewayConfig, TrembitaConfig, TrembitaHeaderConfig, XroadIdentity,
};
use provider_gateway::core::exchange::collaborators::{
    AdditionalSignatureStore, AttachmentRecord, CollaboratorError, Collaborators,
    DocumentAttachmentStore, EventStore, FileStorage, SignatureRecord, SigningService,
    StoredFile,
};
use provider_gateway::core::exchange::request::{Document, Event, TransformRequest};
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Default)]
pub struct MockFileStorage {
    pub files: HashMap<String, StoredFile>,
    pub p7s: HashMap<String, String>,
    pub downloads: HashMap<String, Vec<u8>>,
    pub failing_downloads: HashSet<String>,
    pub get_file_calls: AtomicUsize,
    pub download_calls: AtomicUsize,
}

#[async_trait]
impl FileStorage for MockFileStorage {
    async fn get_file(&self, file_id: &str) -> Result<StoredFile, CollaboratorError> {
        self.get_file_calls.fetch_add(1, Ordering::SeqCst);
        self.files
            .get(file_id)
            .cloned()
            .ok_or_else(|| CollaboratorError::NotFound(file_id.to_string()))
    }

    async fn get_p7s_signature(
        &self,
        file_id: &str,
    ) -> Result<Option<String>, CollaboratorError> {
        Ok(self.p7s.get(file_id).cloned())
    }

    async fn download_file(&self, file_id: &str) -> Result<Vec<u8>, CollaboratorError> {
        self.download_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_downloads.contains(file_id) {
            return Err(CollaboratorError::Backend(format!(
                "download of '{}' failed",
                file_id
            )));
        }
        self.downloads
            .get(file_id)
            .cloned()
            .ok_or_else(|| CollaboratorError::NotFound(file_id.to_string()))
    }
}

#[derive(Default)]
pub struct MockAttachmentStore {
    pub by_document: HashMap<String, Vec<AttachmentRecord>>,
}

#[async_trait]
impl DocumentAttachmentStore for MockAttachmentStore {
    async fn get_by_document_id(
        &self,
        document_id: &str,
    ) -> Result<Vec<AttachmentRecord>, CollaboratorError> {
        Ok(self.by_document.get(document_id).cloned().unwrap_or_default())
    }
}

#[derive(Default)]
pub struct MockEventStore {
    pub events: HashMap<(String, String), Event>,
}

#[async_trait]
impl EventStore for MockEventStore {
    async fn get_last_by_workflow_and_template(
        &self,
        workflow_id: &str,
        event_template_id: &str,
    ) -> Result<Option<Event>, CollaboratorError> {
        Ok(self
            .events
            .get(&(workflow_id.to_string(), event_template_id.to_string()))
            .cloned())
    }
}

#[derive(Default)]
pub struct MockSignatureStore {
    pub by_document: HashMap<String, Vec<SignatureRecord>>,
    pub calls: AtomicUsize,
}

#[async_trait]
impl AdditionalSignatureStore for MockSignatureStore {
    async fn get_by_document_id(
        &self,
        document_id: &str,
    ) -> Result<Vec<SignatureRecord>, CollaboratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.by_document.get(document_id).cloned().unwrap_or_default())
    }
}

#[derive(Default)]
pub struct MockSigner;

#[async_trait]
impl SigningService for MockSigner {
    async fn sign(&self, data: Value) -> Result<Value, CollaboratorError> {
        Ok(json!({ "signed": data }))
    }
}

/// Mock collaborator bundle kept alive so tests can inspect call counters.
pub struct TestEnv {
    pub files: Arc<MockFileStorage>,
    pub attachments: Arc<MockAttachmentStore>,
    pub events: Arc<MockEventStore>,
    pub signatures: Arc<MockSignatureStore>,
    pub signer: Arc<MockSigner>,
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new(
            MockFileStorage::default(),
            MockAttachmentStore::default(),
            MockEventStore::default(),
            MockSignatureStore::default(),
        )
    }
}

impl TestEnv {
    pub fn new(
        files: MockFileStorage,
        attachments: MockAttachmentStore,
        events: MockEventStore,
        signatures: MockSignatureStore,
    ) -> Self {
        Self {
            files: Arc::new(files),
            attachments: Arc::new(attachments),
            events: Arc::new(events),
            signatures: Arc::new(signatures),
            signer: Arc::new(MockSigner),
        }
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            files: self.files.clone(),
            attachments: self.attachments.clone(),
            events: self.events.clone(),
            signatures: self.signatures.clone(),
            signer: self.signer.clone(),
        }
    }
}

pub fn document(id: &str, template_id: &str, file_id: Option<&str>, data: Value) -> Document {
    Document {
        id: id.to_string(),
        template_id: template_id.to_string(),
        file_id: file_id.map(str::to_string),
        data,
    }
}

pub fn request_with_document(doc: Document) -> TransformRequest {
    TransformRequest {
        provider_name: "standard".to_string(),
        service: "partner".to_string(),
        workflow_id: "wf-1".to_string(),
        documents: vec![doc.clone()],
        document: Some(doc),
        ..TransformRequest::default()
    }
}

pub fn stored_file(name: &str, content_type: &str, content: &[u8]) -> StoredFile {
    StoredFile {
        name: name.to_string(),
        content_type: content_type.to_string(),
        content: content.to_vec(),
    }
}

pub fn signature_record(signature: &str, offset_seconds: i64) -> SignatureRecord {
    SignatureRecord {
        signature: signature.to_string(),
        created_at: Utc::now() + Duration::seconds(offset_seconds),
    }
}

pub fn attachment_record(
    file_id: &str,
    attachment_type: &str,
    description: &str,
    send: bool,
) -> AttachmentRecord {
    AttachmentRecord {
        file_id: file_id.to_string(),
        attachment_type: attachment_type.to_string(),
        description: description.to_string(),
        send,
    }
}

pub fn trembita_header() -> TrembitaHeaderConfig {
    TrembitaHeaderConfig {
        client: XroadIdentity {
            instance: "UA".to_string(),
            member_class: "GOV".to_string(),
            member_code: "10000001".to_string(),
            subsystem_code: "CLIENT_SUB".to_string(),
        },
        service: XroadIdentity {
            instance: "UA".to_string(),
            member_class: "GOV".to_string(),
            member_code: "20000002".to_string(),
            subsystem_code: "SERVICE_SUB".to_string(),
        },
        user_id: "operator".to_string(),
        protocol_version: "4.0".to_string(),
        body_namespace: None,
    }
}

pub fn trembita_config() -> TrembitaConfig {
    TrembitaConfig {
        header: Some(trembita_header()),
        service_list: HashMap::new(),
    }
}

pub fn gateway_config() -> GatewayConfig {
    GatewayConfig {
        providers: HashMap::new(),
        trembita: trembita_config(),
    }
}

fn between<'a>(text: &'a str, start: &str, end: &str) -> &'a str {
    let from = text.find(start).map(|i| i + start.len()).expect("start tag");
    let to = text[from..].find(end).expect("end tag") + from;
    &text[from..to]
}

pub fn envelope_request_id(envelope: &str) -> String {
    between(envelope, "<xro:id>", "</xro:id>").to_string()
}

pub fn envelope_payload(envelope: &str) -> String {
    between(envelope, "<prov:data>", "</prov:data>").to_string()
}

/// Decode the base64 payload of a data envelope back into JSON.
pub fn decode_payload(envelope: &str) -> Value {
    let bytes = BASE64
        .decode(envelope_payload(envelope))
        .expect("payload is base64");
    serde_json::from_slice(&bytes).expect("payload is json")
}

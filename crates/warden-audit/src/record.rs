//! Audit record type.
//!
//! One record per observed operation. Records are append-only: once written
//! they are never updated or deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use warden_core::{Actor, AuditSubject, Operation};

/// A single audit record as stored in the audit collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRecord {
    /// When the operation was observed.
    pub timestamp: DateTime<Utc>,

    pub operation: Operation,

    /// Slug of the collection or global the operation targeted.
    pub resource_type: String,

    /// Affected document; the global's own slug for globals.
    pub document_id: String,

    /// Version-history entry immediately preceding this operation's result.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_version_id: Option<String>,

    /// Identity of the acting user. Anonymous operations are never recorded.
    pub actor_id: String,

    /// Admin-relative path of the subject, e.g. `collections/posts/42`.
    pub resource_url: String,
}

impl AuditRecord {
    /// Create a record stamped with the current time.
    pub fn new(operation: Operation, subject: &AuditSubject, actor: &Actor) -> Self {
        Self {
            timestamp: Utc::now(),
            operation,
            resource_type: subject.resource_id().to_string(),
            document_id: subject.document_id().to_string(),
            previous_version_id: None,
            actor_id: actor.id.clone(),
            resource_url: subject.resource_url(),
        }
    }

    pub fn builder(
        operation: Operation,
        subject: &AuditSubject,
        actor: &Actor,
    ) -> AuditRecordBuilder {
        AuditRecordBuilder {
            record: Self::new(operation, subject, actor),
        }
    }

    /// Field map handed to the document writer.
    pub fn to_fields(&self) -> Result<Map<String, Value>, serde_json::Error> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            _ => Err(serde::ser::Error::custom("audit record is not a JSON object")),
        }
    }

    /// Parse a record back from a stored document, ignoring host-added fields.
    pub fn from_document(doc: &Value) -> Result<Self, serde_json::Error> {
        Self::deserialize(doc)
    }
}

/// Builder for audit records.
#[derive(Debug)]
pub struct AuditRecordBuilder {
    record: AuditRecord,
}

impl AuditRecordBuilder {
    /// Set the preceding version, if any.
    pub fn previous_version(mut self, id: Option<String>) -> Self {
        self.record.previous_version_id = id;
        self
    }

    pub fn build(self) -> AuditRecord {
        self.record
    }
}

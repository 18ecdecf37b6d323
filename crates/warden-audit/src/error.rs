//! Error types for the audit crate.

use thiserror::Error;
use warden_core::HostError;

use crate::store::StoreError;

/// Errors that can occur in the audit pipeline.
#[derive(Debug, Error)]
pub enum AuditError {
    /// The version-history query itself failed. Distinct from "no prior version".
    #[error("system error: unable to retrieve versions of '{resource}': {source}")]
    VersionLookup {
        resource: String,
        #[source]
        source: StoreError,
    },

    /// The audit record could not be persisted.
    #[error("unable to write audit record to '{collection}': {source}")]
    WriteFailed {
        collection: String,
        #[source]
        source: StoreError,
    },

    /// The triggering document carried no usable identity.
    #[error("document in '{resource}' is missing a valid id")]
    MissingDocumentId { resource: String },

    /// The audit collection slug is already declared by the application.
    #[error("collection '{0}' is already declared")]
    DuplicateCollection(String),

    /// Hook registration failed.
    #[error("hook registration failed: {0}")]
    Host(#[from] HostError),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

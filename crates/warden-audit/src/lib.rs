//! # warden-audit
//!
//! Audit logging for Warden document applications.
//!
//! This crate provides functionality for:
//! - Declaring a read-only audit collection on the host
//! - Injecting after-event hooks into every non-excluded collection and global
//! - Recording who did what to which document, linked to the version it replaced
//! - Rendering audit rows for the admin views
//!
//! ## Record Format
//!
//! Each record is stored as a document in the audit collection:
//!
//! | Field | Description |
//! |-------|-------------|
//! | `timestamp` | When the operation was observed |
//! | `operation` | `create`, `read`, `update` or `delete` |
//! | `resourceType` | Collection or global slug |
//! | `resourceUrl` | Admin path of the audited document |
//! | `documentId` | Document id; the slug for globals |
//! | `previousVersionId` | Version superseded by the operation, if any |
//! | `actorId` | Id of the authenticated actor |
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use warden_audit::{MemoryStore, setup};
//! use warden_core::{AppConfig, AuditOptions, CollectionConfig, Operation};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(MemoryStore::new());
//! let app = AppConfig::new().with_collection(CollectionConfig::new("posts").versioned());
//!
//! let options = AuditOptions::default().operation(Operation::Read, true);
//! let app = setup(app, options, store.clone(), store)?;
//! assert!(app.collection("audit-log").is_some());
//! # Ok(())
//! # }
//! ```

pub mod collection;
pub mod display;
pub mod error;
pub mod hooks;
pub mod inject;
pub mod logger;
pub mod plugin;
pub mod record;
pub mod store;
pub mod versions;

pub use collection::audit_collection;
pub use error::AuditError;
pub use hooks::{AUDIT_HOOK_OWNER, AuditHook, HookOperation};
pub use inject::{InjectionSummary, inject_audit_hooks};
pub use logger::{EventLogger, LogOutcome, LogRequest, SkipReason};
pub use plugin::{AuditPlugin, setup};
pub use record::{AuditRecord, AuditRecordBuilder};
pub use store::{
    DocumentWriter, MemoryStore, StoreError, VersionEntry, VersionPage, VersionQuery, VersionSort,
    VersionStore,
};
pub use versions::VersionResolver;

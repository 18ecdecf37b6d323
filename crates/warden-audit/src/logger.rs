//! Event logger.
//!
//! Decides whether an observed operation is recorded, assembles the record
//! and writes it to the audit collection. Every call is independent; the
//! only shared state is the immutable configuration.

use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use warden_core::{Actor, AuditConfig, AuditSubject, Operation, ResourceDescriptor, ResourceKind};

use crate::error::AuditError;
use crate::record::AuditRecord;
use crate::store::{DocumentWriter, VersionStore, doc_id};
use crate::versions::VersionResolver;

/// One observed operation.
#[derive(Debug, Clone, Copy)]
pub struct LogRequest<'a> {
    pub operation: Operation,
    pub actor: Option<&'a Actor>,
    pub resource: &'a ResourceDescriptor,
    pub doc: &'a Value,
    /// Whether the operation is a read that belongs to a multi-document query.
    pub find_many: bool,
}

impl<'a> LogRequest<'a> {
    pub fn new(
        operation: Operation,
        resource: &'a ResourceDescriptor,
        doc: &'a Value,
        actor: Option<&'a Actor>,
    ) -> Self {
        Self {
            operation,
            actor,
            resource,
            doc,
            find_many: false,
        }
    }

    pub fn find_many(mut self, find_many: bool) -> Self {
        self.find_many = find_many;
        self
    }
}

/// Why an operation produced no record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Audit logging is switched off.
    Disabled,
    /// This operation kind is not logged.
    OperationDisabled(Operation),
    /// No authenticated actor.
    Anonymous,
    /// A read from a list query while list reads are off.
    ListRead,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disabled => write!(f, "audit logging disabled"),
            Self::OperationDisabled(op) => write!(f, "{} logging disabled", op),
            Self::Anonymous => write!(f, "no actor"),
            Self::ListRead => write!(f, "list read"),
        }
    }
}

/// Result of a [`EventLogger::log`] call that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogOutcome {
    Written { id: String, record: AuditRecord },
    Skipped(SkipReason),
}

impl LogOutcome {
    pub fn is_written(&self) -> bool {
        matches!(self, Self::Written { .. })
    }

    pub fn record(&self) -> Option<&AuditRecord> {
        match self {
            Self::Written { record, .. } => Some(record),
            Self::Skipped(_) => None,
        }
    }
}

/// The audit event logger.
pub struct EventLogger {
    config: Arc<AuditConfig>,
    versions: VersionResolver,
    writer: Arc<dyn DocumentWriter>,
}

impl EventLogger {
    pub fn new(
        config: Arc<AuditConfig>,
        versions: Arc<dyn VersionStore>,
        writer: Arc<dyn DocumentWriter>,
    ) -> Self {
        Self {
            config,
            versions: VersionResolver::new(versions),
            writer,
        }
    }

    pub fn config(&self) -> &AuditConfig {
        &self.config
    }

    /// Check whether a request should be recorded at all.
    ///
    /// Admitted requests yield the acting identity. An actor with an empty id
    /// counts as anonymous.
    pub fn gate<'a>(&self, request: &LogRequest<'a>) -> Result<&'a Actor, SkipReason> {
        if self.config.disabled {
            return Err(SkipReason::Disabled);
        }
        if !self.config.operations.is_enabled(request.operation) {
            return Err(SkipReason::OperationDisabled(request.operation));
        }
        let actor = request
            .actor
            .filter(|actor| !actor.id.is_empty())
            .ok_or(SkipReason::Anonymous)?;
        if request.operation == Operation::Read && request.find_many && !self.config.log_list_reads
        {
            return Err(SkipReason::ListRead);
        }
        Ok(actor)
    }

    /// Record one observed operation.
    ///
    /// Skips are not errors. Version-lookup faults, write faults and documents
    /// without an id are.
    pub async fn log(&self, request: LogRequest<'_>) -> Result<LogOutcome, AuditError> {
        let actor = match self.gate(&request) {
            Ok(actor) => actor,
            Err(reason) => {
                tracing::trace!(
                    resource = %request.resource.slug,
                    operation = %request.operation,
                    reason = %reason,
                    "Audit skipped"
                );
                return Ok(LogOutcome::Skipped(reason));
            }
        };

        let subject = subject_for(request.resource, request.doc)?;
        let previous = self
            .versions
            .previous_version(&subject, request.resource.versioned)
            .await?;

        let record = AuditRecord::builder(request.operation, &subject, actor)
            .previous_version(previous)
            .build();

        let collection = &self.config.audit_collection;
        let id = self
            .writer
            .create(collection, record.to_fields()?)
            .await
            .map_err(|source| AuditError::WriteFailed {
                collection: collection.clone(),
                source,
            })?;

        tracing::debug!(
            record_id = %id,
            resource = %record.resource_type,
            document_id = %record.document_id,
            operation = %record.operation,
            actor = %record.actor_id,
            previous_version = ?record.previous_version_id,
            "Audit record written"
        );

        Ok(LogOutcome::Written { id, record })
    }
}

/// Identify the audited subject of a document.
fn subject_for(resource: &ResourceDescriptor, doc: &Value) -> Result<AuditSubject, AuditError> {
    match resource.kind {
        ResourceKind::Collection => {
            let document_id = doc_id(doc).ok_or_else(|| AuditError::MissingDocumentId {
                resource: resource.slug.clone(),
            })?;
            Ok(AuditSubject::Collection {
                resource_id: resource.slug.clone(),
                document_id,
            })
        }
        ResourceKind::Global => Ok(AuditSubject::Global {
            resource_id: resource.slug.clone(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, StoreError};
    use serde_json::json;
    use warden_core::AuditOptions;

    fn logger(options: AuditOptions) -> (EventLogger, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let logger = EventLogger::new(Arc::new(options.resolve()), store.clone(), store.clone());
        (logger, store)
    }

    fn posts() -> ResourceDescriptor {
        ResourceDescriptor::collection("posts", true)
    }

    #[tokio::test]
    async fn writes_one_record_for_an_enabled_operation() {
        let (logger, store) = logger(AuditOptions::default());
        let actor = Actor::new("u1");
        let resource = posts();
        let doc = json!({ "id": "p1", "title": "Hello" });

        let outcome = logger
            .log(LogRequest::new(Operation::Create, &resource, &doc, Some(&actor)))
            .await
            .unwrap();

        let record = outcome.record().unwrap();
        assert_eq!(record.operation, Operation::Create);
        assert_eq!(record.resource_type, "posts");
        assert_eq!(record.document_id, "p1");
        assert_eq!(record.actor_id, "u1");
        assert_eq!(record.previous_version_id, None);
        assert_eq!(store.count("audit-log"), 1);
    }

    #[tokio::test]
    async fn gate_order_and_reasons() {
        let actor = Actor::new("u1");
        let resource = posts();
        let doc = json!({ "id": "p1" });

        let (disabled, _) = logger(AuditOptions::default().disabled(true));
        let request = LogRequest::new(Operation::Create, &resource, &doc, Some(&actor));
        assert_eq!(disabled.gate(&request).err(), Some(SkipReason::Disabled));

        let (default, store) = logger(AuditOptions::default());
        let read = LogRequest::new(Operation::Read, &resource, &doc, Some(&actor));
        assert_eq!(
            default.gate(&read).err(),
            Some(SkipReason::OperationDisabled(Operation::Read))
        );

        let anonymous = LogRequest::new(Operation::Update, &resource, &doc, None);
        assert_eq!(
            default.log(anonymous).await.unwrap(),
            LogOutcome::Skipped(SkipReason::Anonymous)
        );
        assert_eq!(store.count("audit-log"), 0);
    }

    #[tokio::test]
    async fn empty_actor_id_counts_as_anonymous() {
        let (logger, store) = logger(AuditOptions::default());
        let nobody = Actor::new("");
        let resource = posts();
        let doc = json!({ "id": "p1" });

        let outcome = logger
            .log(LogRequest::new(Operation::Create, &resource, &doc, Some(&nobody)))
            .await
            .unwrap();
        assert_eq!(outcome, LogOutcome::Skipped(SkipReason::Anonymous));
        assert_eq!(store.count("audit-log"), 0);
    }

    #[tokio::test]
    async fn list_reads_follow_their_toggle() {
        let actor = Actor::new("u1");
        let resource = posts();
        let doc = json!({ "id": "p1" });
        let request =
            LogRequest::new(Operation::Read, &resource, &doc, Some(&actor)).find_many(true);

        let (quiet, _) = logger(AuditOptions::default().operation(Operation::Read, true));
        assert_eq!(quiet.gate(&request).err(), Some(SkipReason::ListRead));

        let options = AuditOptions {
            log_list_reads: Some(true),
            ..AuditOptions::default().operation(Operation::Read, true)
        };
        let (verbose, _) = logger(options);
        assert_eq!(verbose.gate(&request).map(|a| a.id.as_str()), Ok("u1"));
    }

    #[tokio::test]
    async fn missing_document_id_is_a_fault() {
        let (logger, store) = logger(AuditOptions::default());
        let actor = Actor::new("u1");
        let resource = posts();
        let doc = json!({ "title": "no id" });

        let err = logger
            .log(LogRequest::new(Operation::Update, &resource, &doc, Some(&actor)))
            .await
            .unwrap_err();
        assert!(matches!(err, AuditError::MissingDocumentId { ref resource } if resource == "posts"));
        assert_eq!(store.count("audit-log"), 0);
    }

    #[tokio::test]
    async fn update_links_previous_version() {
        let (logger, store) = logger(AuditOptions::default());
        let actor = Actor::new("u1");
        let resource = posts();
        let before = store.save_version("posts", Some("p1"), json!({ "v": 1 })).unwrap();
        store.save_version("posts", Some("p1"), json!({ "v": 2 })).unwrap();

        let doc = json!({ "id": "p1", "v": 2 });
        let outcome = logger
            .log(LogRequest::new(Operation::Update, &resource, &doc, Some(&actor)))
            .await
            .unwrap();

        assert_eq!(
            outcome.record().unwrap().previous_version_id.as_deref(),
            Some(before.as_str())
        );
    }

    #[tokio::test]
    async fn global_record_uses_slug_as_document_id() {
        let (logger, _) = logger(AuditOptions::default());
        let actor = Actor::new("u1");
        let resource = ResourceDescriptor::global("settings", false);
        let doc = json!({ "siteName": "Example" });

        let outcome = logger
            .log(LogRequest::new(Operation::Update, &resource, &doc, Some(&actor)))
            .await
            .unwrap();
        let record = outcome.record().unwrap();
        assert_eq!(record.resource_type, "settings");
        assert_eq!(record.document_id, "settings");
    }

    #[tokio::test]
    async fn version_and_write_faults_are_distinct() {
        let (logger, store) = logger(AuditOptions::default());
        let actor = Actor::new("u1");
        let resource = posts();
        let doc = json!({ "id": "p1" });

        store.fail_version_queries(true);
        let err = logger
            .log(LogRequest::new(Operation::Update, &resource, &doc, Some(&actor)))
            .await
            .unwrap_err();
        assert!(matches!(err, AuditError::VersionLookup { .. }));

        store.fail_version_queries(false);
        store.fail_writes(true);
        let err = logger
            .log(LogRequest::new(Operation::Update, &resource, &doc, Some(&actor)))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AuditError::WriteFailed {
                source: StoreError::Unavailable(_),
                ..
            }
        ));
        assert!(err.to_string().starts_with("unable to write audit record"));
    }
}

//! Previous-version lookup.
//!
//! Lookups are keyed by the parent document, not by version id, so an audit
//! record can link from a live document to the exact state it superseded no
//! matter how many versions have accumulated.

use std::sync::Arc;
use warden_core::AuditSubject;

use crate::error::AuditError;
use crate::store::{StoreError, VersionQuery, VersionStore};

/// Finds the most recent stored version of a subject that is not the current one.
#[derive(Clone)]
pub struct VersionResolver {
    store: Arc<dyn VersionStore>,
}

impl VersionResolver {
    pub fn new(store: Arc<dyn VersionStore>) -> Self {
        Self { store }
    }

    /// Resolve the id of the version preceding the subject's current state.
    ///
    /// Returns `Ok(None)` when the resource is not versioned or has no prior
    /// version yet. A failing query is an [`AuditError::VersionLookup`].
    pub async fn previous_version(
        &self,
        subject: &AuditSubject,
        versioned: bool,
    ) -> Result<Option<String>, AuditError> {
        if !versioned {
            return Ok(None);
        }

        let query = VersionQuery::previous(
            subject.resource_id(),
            subject.version_parent().map(str::to_string),
        );

        match self.store.find_versions(query).await {
            Ok(page) => Ok(page.docs.into_iter().next().map(|v| v.id)),
            Err(StoreError::NotVersioned(resource)) => {
                tracing::trace!(resource = %resource, "Version history not enabled");
                Ok(None)
            }
            Err(source) => Err(AuditError::VersionLookup {
                resource: subject.resource_id().to_string(),
                source,
            }),
        }
    }
}

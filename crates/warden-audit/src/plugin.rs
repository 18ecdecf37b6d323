//! Plugin entry point.
//!
//! Resolves configuration once, declares the audit collection and injects the
//! audit hooks into a host application.

use std::sync::Arc;
use warden_core::{AppConfig, AuditConfig, AuditOptions};

use crate::collection::audit_collection;
use crate::error::AuditError;
use crate::inject::inject_audit_hooks;
use crate::logger::EventLogger;
use crate::store::{DocumentWriter, VersionStore};

/// The audit logging plugin.
pub struct AuditPlugin {
    config: Arc<AuditConfig>,
    logger: Arc<EventLogger>,
}

impl AuditPlugin {
    pub fn new(
        options: AuditOptions,
        versions: Arc<dyn VersionStore>,
        writer: Arc<dyn DocumentWriter>,
    ) -> Self {
        let config = Arc::new(options.resolve());
        let logger = Arc::new(EventLogger::new(config.clone(), versions, writer));
        Self { config, logger }
    }

    pub fn config(&self) -> &AuditConfig {
        &self.config
    }

    pub fn logger(&self) -> Arc<EventLogger> {
        self.logger.clone()
    }

    /// Augment a host configuration with the audit collection and hooks.
    pub fn apply(&self, mut app: AppConfig) -> Result<AppConfig, AuditError> {
        app.ensure_resources();

        let slug = &self.config.audit_collection;
        if app.collection(slug).is_some() {
            return Err(AuditError::DuplicateCollection(slug.clone()));
        }
        if let Some(collections) = app.collections.as_mut() {
            collections.push(audit_collection(&self.config));
        }

        let summary = inject_audit_hooks(&mut app, self.logger.clone())?;
        tracing::info!(
            audit_collection = %slug,
            disabled = self.config.disabled,
            instrumented = summary.collections.len() + summary.globals.len(),
            "Audit plugin applied"
        );

        Ok(app)
    }
}

/// Build an [`AuditPlugin`] and apply it in one call.
pub fn setup(
    app: AppConfig,
    options: AuditOptions,
    versions: Arc<dyn VersionStore>,
    writer: Arc<dyn DocumentWriter>,
) -> Result<AppConfig, AuditError> {
    AuditPlugin::new(options, versions, writer).apply(app)
}

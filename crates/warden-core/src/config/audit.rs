//! Audit logging configuration.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use super::ConfigError;
use super::operations::{OperationOverrides, OperationToggles};
use crate::Operation;
use crate::host::Access;

/// Fully resolved audit configuration.
///
/// Built once at setup by [`resolve_config`] and shared read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Whether audit logging is switched off entirely.
    #[serde(default)]
    pub disabled: bool,

    /// Which operation kinds are logged.
    #[serde(default)]
    pub operations: OperationToggles,

    /// Collections that never get audit hooks.
    #[serde(default)]
    pub excluded_collections: Vec<String>,

    /// Globals that never get audit hooks.
    #[serde(default)]
    pub excluded_globals: Vec<String>,

    /// Slug of the audit store collection.
    #[serde(default = "default_audit_collection")]
    pub audit_collection: String,

    /// Admin navigation group for the audit store.
    #[serde(default = "default_audit_collection_group")]
    pub audit_collection_group: String,

    /// Collection that actor identities belong to.
    #[serde(default = "default_auth_collection")]
    pub auth_collection: String,

    /// chrono format string used to display audit timestamps.
    #[serde(default = "default_date_format")]
    pub date_format: String,

    /// Who may read audit records. Create, update and delete are always denied.
    #[serde(default = "default_read_access")]
    pub read_access: Access,

    /// What an audit hook does when the pipeline fails.
    #[serde(default)]
    pub failure_mode: FailureMode,

    /// Whether reads issued as part of a list query are logged.
    #[serde(default)]
    pub log_list_reads: bool,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            disabled: false,
            operations: OperationToggles::default(),
            excluded_collections: Vec::new(),
            excluded_globals: Vec::new(),
            audit_collection: default_audit_collection(),
            audit_collection_group: default_audit_collection_group(),
            auth_collection: default_auth_collection(),
            date_format: default_date_format(),
            read_access: default_read_access(),
            failure_mode: FailureMode::default(),
            log_list_reads: false,
        }
    }
}

impl AuditConfig {
    /// Check whether an operation kind should be logged at all.
    pub fn is_enabled(&self, operation: Operation) -> bool {
        !self.disabled && self.operations.is_enabled(operation)
    }

    /// Check if a collection is excluded from auditing.
    ///
    /// The audit store itself always counts as excluded.
    pub fn is_collection_excluded(&self, slug: &str) -> bool {
        slug == self.audit_collection || self.excluded_collections.iter().any(|c| c == slug)
    }

    /// Check if a global is excluded from auditing.
    pub fn is_global_excluded(&self, slug: &str) -> bool {
        self.excluded_globals.iter().any(|g| g == slug)
    }
}

/// Failure handling for the audit hooks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureMode {
    /// Report failures through `tracing` and let the primary operation succeed.
    #[default]
    Report,
    /// Return the failure from the hook so the host can fail the operation.
    Propagate,
}

/// Caller-supplied configuration. Every unset field falls back to its default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disabled: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operations: Option<OperationOverrides>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excluded_collections: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excluded_globals: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audit_collection: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audit_collection_group: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_collection: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_format: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_access: Option<Access>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_mode: Option<FailureMode>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_list_reads: Option<bool>,
}

impl AuditOptions {
    /// Load options from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Parse options from YAML content.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(content).map_err(ConfigError::from)
    }

    /// Resolve these options against the built-in defaults.
    pub fn resolve(self) -> AuditConfig {
        resolve_config(&AuditConfig::default(), self)
    }

    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = Some(disabled);
        self
    }

    pub fn operation(mut self, operation: Operation, enabled: bool) -> Self {
        self.operations = Some(self.operations.unwrap_or_default().set(operation, enabled));
        self
    }

    pub fn exclude_collection(mut self, slug: impl Into<String>) -> Self {
        self.excluded_collections
            .get_or_insert_with(Vec::new)
            .push(slug.into());
        self
    }

    pub fn exclude_global(mut self, slug: impl Into<String>) -> Self {
        self.excluded_globals
            .get_or_insert_with(Vec::new)
            .push(slug.into());
        self
    }

    pub fn audit_collection(mut self, slug: impl Into<String>) -> Self {
        self.audit_collection = Some(slug.into());
        self
    }

    pub fn failure_mode(mut self, mode: FailureMode) -> Self {
        self.failure_mode = Some(mode);
        self
    }
}

/// Merge caller overrides onto defaults.
///
/// Top-level fields are replaced wholesale; the operation toggles are merged
/// key by key so that overriding one operation keeps the others.
pub fn resolve_config(defaults: &AuditConfig, overrides: AuditOptions) -> AuditConfig {
    let operations = match &overrides.operations {
        Some(ops) => defaults.operations.merge(ops),
        None => defaults.operations,
    };

    AuditConfig {
        disabled: overrides.disabled.unwrap_or(defaults.disabled),
        operations,
        excluded_collections: overrides
            .excluded_collections
            .unwrap_or_else(|| defaults.excluded_collections.clone()),
        excluded_globals: overrides
            .excluded_globals
            .unwrap_or_else(|| defaults.excluded_globals.clone()),
        audit_collection: overrides
            .audit_collection
            .unwrap_or_else(|| defaults.audit_collection.clone()),
        audit_collection_group: overrides
            .audit_collection_group
            .unwrap_or_else(|| defaults.audit_collection_group.clone()),
        auth_collection: overrides
            .auth_collection
            .unwrap_or_else(|| defaults.auth_collection.clone()),
        date_format: overrides
            .date_format
            .unwrap_or_else(|| defaults.date_format.clone()),
        read_access: overrides.read_access.unwrap_or(defaults.read_access),
        failure_mode: overrides.failure_mode.unwrap_or(defaults.failure_mode),
        log_list_reads: overrides.log_list_reads.unwrap_or(defaults.log_list_reads),
    }
}

fn default_audit_collection() -> String {
    "audit-log".to_string()
}

fn default_audit_collection_group() -> String {
    "Audit".to_string()
}

fn default_auth_collection() -> String {
    "users".to_string()
}

fn default_date_format() -> String {
    "%a, %d %b %Y %H:%M:%S".to_string()
}

fn default_read_access() -> Access {
    Access::Authenticated
}

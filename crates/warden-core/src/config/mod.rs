//! Configuration types for Warden.
//!
//! Options are supplied by the embedding application, either in code via the
//! [`AuditOptions`] builder methods or from a YAML file, and resolved once at
//! setup into an immutable [`AuditConfig`]:
//!
//! ```yaml
//! disabled: false
//! operations:
//!   read: true            # create/update/delete keep their defaults
//! excluded_collections: [media]
//! excluded_globals: [settings]
//! audit_collection: audit-log
//! failure_mode: report    # or: propagate
//! ```

pub mod audit;
pub mod operations;

pub use audit::{AuditConfig, AuditOptions, FailureMode, resolve_config};
pub use operations::{OperationOverrides, OperationToggles};

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

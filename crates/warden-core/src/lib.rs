use serde::{Deserialize, Serialize};
use std::fmt;

// Configuration types shared across all Warden crates
pub mod config;

// Host application model: collections, globals, access rules and hook chains
pub mod host;

// Re-export commonly used types for convenience
pub use config::{
    AuditConfig, AuditOptions, ConfigError, FailureMode, OperationOverrides, OperationToggles,
    resolve_config,
};
pub use host::{
    Access, AccessConfig, AdminConfig, AppConfig, CollectionConfig, FieldConfig, FieldType,
    GlobalConfig, HookArgs, HookChain, HookPhase, HookRegistry, Hooks, HostError, Labels,
    LifecycleHook, hook_fn,
};

/// Document operation observed by a lifecycle hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
}

impl Operation {
    /// All operations, in display order.
    pub const ALL: [Operation; 4] = [
        Operation::Create,
        Operation::Read,
        Operation::Update,
        Operation::Delete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Read => "read",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }

    /// Parse the lowercase wire name of an operation.
    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.as_str() == raw)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The authenticated identity attributed to a triggering request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,
}

impl Actor {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// Whether a resource is a multi-document collection or a singleton global.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Collection,
    Global,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Collection => f.write_str("collection"),
            Self::Global => f.write_str("global"),
        }
    }
}

/// What the audit hooks know about the resource they are attached to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceDescriptor {
    pub kind: ResourceKind,
    pub slug: String,
    /// Whether the host keeps version history for this resource.
    #[serde(default)]
    pub versioned: bool,
}

impl ResourceDescriptor {
    pub fn collection(slug: impl Into<String>, versioned: bool) -> Self {
        Self {
            kind: ResourceKind::Collection,
            slug: slug.into(),
            versioned,
        }
    }

    pub fn global(slug: impl Into<String>, versioned: bool) -> Self {
        Self {
            kind: ResourceKind::Global,
            slug: slug.into(),
            versioned,
        }
    }
}

/// The audited subject of a single operation.
///
/// Globals are singletons and have no separate id space, so their document
/// identity is the global's own slug.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum AuditSubject {
    Collection {
        resource_id: String,
        document_id: String,
    },
    Global {
        resource_id: String,
    },
}

impl AuditSubject {
    pub fn resource_id(&self) -> &str {
        match self {
            Self::Collection { resource_id, .. } | Self::Global { resource_id } => resource_id,
        }
    }

    pub fn document_id(&self) -> &str {
        match self {
            Self::Collection { document_id, .. } => document_id,
            Self::Global { resource_id } => resource_id,
        }
    }

    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::Collection { .. } => ResourceKind::Collection,
            Self::Global { .. } => ResourceKind::Global,
        }
    }

    /// Version-history parent key: the document id for collections, none for globals.
    pub fn version_parent(&self) -> Option<&str> {
        match self {
            Self::Collection { document_id, .. } => Some(document_id),
            Self::Global { .. } => None,
        }
    }

    /// Admin-relative path of the subject, e.g. `collections/posts/42`.
    pub fn resource_url(&self) -> String {
        match self {
            Self::Collection {
                resource_id,
                document_id,
            } => format!("collections/{}/{}", resource_id, document_id),
            Self::Global { resource_id } => format!("globals/{}", resource_id),
        }
    }
}

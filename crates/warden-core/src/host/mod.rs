//! Host application model.
//!
//! The host framework owns storage, authentication and request handling.
//! Warden only needs the declared resources of an application and a way to
//! append callbacks to their lifecycle hook chains; this module models exactly
//! that surface.

pub mod hooks;
pub mod schema;

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{ResourceDescriptor, ResourceKind};

pub use hooks::{FnHook, HookArgs, HookChain, HookPhase, Hooks, LifecycleHook, hook_fn};
pub use schema::{Access, AccessConfig, AdminConfig, FieldConfig, FieldType, Labels};

/// Errors raised by the host application model.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("unknown {kind} '{slug}'")]
    UnknownResource { kind: ResourceKind, slug: String },

    #[error("{kind} '{slug}' does not support {phase} hooks")]
    UnsupportedPhase {
        kind: ResourceKind,
        slug: String,
        phase: HookPhase,
    },
}

/// A multi-document collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionConfig {
    pub slug: String,

    /// Whether the host keeps version history for documents of this collection.
    #[serde(default)]
    pub versions: bool,

    #[serde(default)]
    pub fields: Vec<FieldConfig>,

    #[serde(default)]
    pub access: AccessConfig,

    #[serde(default)]
    pub admin: AdminConfig,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<Labels>,

    #[serde(skip)]
    pub hooks: Hooks,
}

impl CollectionConfig {
    pub fn new(slug: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            versions: false,
            fields: Vec::new(),
            access: AccessConfig::default(),
            admin: AdminConfig::default(),
            labels: None,
            hooks: Hooks::default(),
        }
    }

    pub fn versioned(mut self) -> Self {
        self.versions = true;
        self
    }

    pub fn field(mut self, field: FieldConfig) -> Self {
        self.fields.push(field);
        self
    }

    pub fn hook(mut self, phase: HookPhase, hook: Arc<dyn LifecycleHook>) -> Self {
        self.hooks.append(phase, hook);
        self
    }

    pub fn descriptor(&self) -> ResourceDescriptor {
        ResourceDescriptor::collection(&self.slug, self.versions)
    }
}

/// A singleton global record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalConfig {
    pub slug: String,

    #[serde(default)]
    pub versions: bool,

    #[serde(default)]
    pub fields: Vec<FieldConfig>,

    #[serde(skip)]
    pub hooks: Hooks,
}

impl GlobalConfig {
    pub fn new(slug: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            versions: false,
            fields: Vec::new(),
            hooks: Hooks::default(),
        }
    }

    pub fn versioned(mut self) -> Self {
        self.versions = true;
        self
    }

    pub fn field(mut self, field: FieldConfig) -> Self {
        self.fields.push(field);
        self
    }

    pub fn hook(mut self, phase: HookPhase, hook: Arc<dyn LifecycleHook>) -> Self {
        self.hooks.append(phase, hook);
        self
    }

    pub fn descriptor(&self) -> ResourceDescriptor {
        ResourceDescriptor::global(&self.slug, self.versions)
    }
}

/// The application configuration plugins receive and return.
///
/// `collections` and `globals` are optional because an application may not
/// declare either yet.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collections: Option<Vec<CollectionConfig>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub globals: Option<Vec<GlobalConfig>>,
}

impl AppConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_collection(mut self, collection: CollectionConfig) -> Self {
        self.collections
            .get_or_insert_with(Vec::new)
            .push(collection);
        self
    }

    pub fn with_global(mut self, global: GlobalConfig) -> Self {
        self.globals.get_or_insert_with(Vec::new).push(global);
        self
    }

    /// Initialise missing resource lists to empty ones.
    pub fn ensure_resources(&mut self) {
        self.collections.get_or_insert_with(Vec::new);
        self.globals.get_or_insert_with(Vec::new);
    }

    pub fn collection(&self, slug: &str) -> Option<&CollectionConfig> {
        self.collections
            .as_deref()
            .unwrap_or_default()
            .iter()
            .find(|c| c.slug == slug)
    }

    pub fn global(&self, slug: &str) -> Option<&GlobalConfig> {
        self.globals
            .as_deref()
            .unwrap_or_default()
            .iter()
            .find(|g| g.slug == slug)
    }

    pub fn collection_mut(&mut self, slug: &str) -> Option<&mut CollectionConfig> {
        self.collections
            .as_mut()?
            .iter_mut()
            .find(|c| c.slug == slug)
    }

    pub fn global_mut(&mut self, slug: &str) -> Option<&mut GlobalConfig> {
        self.globals.as_mut()?.iter_mut().find(|g| g.slug == slug)
    }

    /// Every declared resource, collections first, in declaration order.
    pub fn resources(&self) -> Vec<ResourceDescriptor> {
        let collections = self.collections.as_deref().unwrap_or_default();
        let globals = self.globals.as_deref().unwrap_or_default();
        collections
            .iter()
            .map(CollectionConfig::descriptor)
            .chain(globals.iter().map(GlobalConfig::descriptor))
            .collect()
    }
}

/// Composition boundary for attaching callbacks to resource lifecycles.
pub trait HookRegistry {
    /// Append `handler` to the `phase` chain of `resource`.
    ///
    /// Handlers already in the chain keep running first, in their original order.
    fn register_after_event(
        &mut self,
        resource: &ResourceDescriptor,
        phase: HookPhase,
        handler: Arc<dyn LifecycleHook>,
    ) -> Result<(), HostError>;
}

impl HookRegistry for AppConfig {
    fn register_after_event(
        &mut self,
        resource: &ResourceDescriptor,
        phase: HookPhase,
        handler: Arc<dyn LifecycleHook>,
    ) -> Result<(), HostError> {
        let unsupported = || HostError::UnsupportedPhase {
            kind: resource.kind,
            slug: resource.slug.clone(),
            phase,
        };
        let unknown = || HostError::UnknownResource {
            kind: resource.kind,
            slug: resource.slug.clone(),
        };

        if !phase.is_after() {
            return Err(unsupported());
        }

        let hooks = match resource.kind {
            ResourceKind::Collection => {
                &mut self.collection_mut(&resource.slug).ok_or_else(unknown)?.hooks
            }
            ResourceKind::Global => {
                // Globals have no delete lifecycle.
                if phase == HookPhase::AfterDelete {
                    return Err(unsupported());
                }
                &mut self.global_mut(&resource.slug).ok_or_else(unknown)?.hooks
            }
        };

        hooks.append(phase, handler);
        Ok(())
    }
}

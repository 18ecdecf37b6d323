//! Shared test infrastructure for the audit pipeline tests.
//!
//! `TestHost` plays the document framework: it enforces access rules, keeps
//! documents and versions in a [`MemoryStore`] and runs the configured hook
//! chains after each operation.

#![allow(dead_code)]

use anyhow::{Context, bail};
use serde_json::{Map, Value, json};
use std::sync::Arc;
use warden_audit::{AuditRecord, MemoryStore, setup};
use warden_core::{
    Actor, AppConfig, AuditOptions, CollectionConfig, GlobalConfig, HookArgs, HookPhase,
    Operation,
};

// =============================================================================
// FIXTURES
// =============================================================================

pub const AUDIT: &str = "audit-log";

pub fn editor() -> Actor {
    Actor::new("editor-1")
}

/// Application with a versioned and an unversioned collection plus two globals.
pub fn sample_app() -> AppConfig {
    AppConfig::new()
        .with_collection(CollectionConfig::new("posts").versioned())
        .with_collection(CollectionConfig::new("tags"))
        .with_collection(CollectionConfig::new("drafts"))
        .with_global(GlobalConfig::new("settings").versioned())
        .with_global(GlobalConfig::new("footer"))
}

// =============================================================================
// HOST DRIVER
// =============================================================================

pub struct TestHost {
    pub app: AppConfig,
    pub store: Arc<MemoryStore>,
}

impl TestHost {
    pub fn new(options: AuditOptions) -> Self {
        Self::with_app(sample_app(), options)
    }

    pub fn with_app(app: AppConfig, options: AuditOptions) -> Self {
        let store = Arc::new(MemoryStore::new());
        let app = setup(app, options, store.clone(), store.clone())
            .expect("audit plugin should apply");
        Self { app, store }
    }

    fn collection(&self, slug: &str) -> anyhow::Result<&CollectionConfig> {
        self.app
            .collection(slug)
            .with_context(|| format!("unknown collection '{}'", slug))
    }

    fn global(&self, slug: &str) -> anyhow::Result<&GlobalConfig> {
        self.app
            .global(slug)
            .with_context(|| format!("unknown global '{}'", slug))
    }

    fn authorize(
        &self,
        collection: &CollectionConfig,
        operation: Operation,
        actor: Option<&Actor>,
    ) -> anyhow::Result<()> {
        if !collection.access.permits(operation, actor) {
            bail!("{} on '{}' is not allowed", operation, collection.slug);
        }
        Ok(())
    }

    pub async fn create(
        &self,
        actor: Option<&Actor>,
        slug: &str,
        data: Value,
    ) -> anyhow::Result<Value> {
        let collection = self.collection(slug)?;
        self.authorize(collection, Operation::Create, actor)?;

        let fields = into_fields(data)?;
        let id = self.store.insert(slug, fields)?;
        let doc = self.store.get(slug, &id).context("created document vanished")?;
        if collection.versions {
            self.store.save_version(slug, Some(&id), doc.clone())?;
        }

        let args = HookArgs::new(Operation::Create, doc).actor(actor.cloned());
        collection.hooks.run(HookPhase::AfterChange, args).await
    }

    pub async fn update(
        &self,
        actor: Option<&Actor>,
        slug: &str,
        id: &str,
        patch: Value,
    ) -> anyhow::Result<Value> {
        let collection = self.collection(slug)?;
        self.authorize(collection, Operation::Update, actor)?;

        let mut doc = self.store.get(slug, id).context("document not found")?;
        merge(&mut doc, patch);
        let doc = self
            .store
            .replace(slug, id, doc)?
            .context("document not found")?;
        if collection.versions {
            self.store.save_version(slug, Some(id), doc.clone())?;
        }

        let args = HookArgs::new(Operation::Update, doc).actor(actor.cloned());
        collection.hooks.run(HookPhase::AfterChange, args).await
    }

    pub async fn read(&self, actor: Option<&Actor>, slug: &str, id: &str) -> anyhow::Result<Value> {
        let collection = self.collection(slug)?;
        self.authorize(collection, Operation::Read, actor)?;

        let doc = self.store.get(slug, id).context("document not found")?;
        let args = HookArgs::new(Operation::Read, doc).actor(actor.cloned());
        collection.hooks.run(HookPhase::AfterRead, args).await
    }

    /// List every document of a collection, running `afterRead` for each.
    pub async fn find(&self, actor: Option<&Actor>, slug: &str) -> anyhow::Result<Vec<Value>> {
        let collection = self.collection(slug)?;
        self.authorize(collection, Operation::Read, actor)?;

        let mut out = Vec::new();
        for doc in self.store.documents(slug) {
            let args = HookArgs::new(Operation::Read, doc)
                .actor(actor.cloned())
                .find_many(true);
            out.push(collection.hooks.run(HookPhase::AfterRead, args).await?);
        }
        Ok(out)
    }

    pub async fn delete(&self, actor: Option<&Actor>, slug: &str, id: &str) -> anyhow::Result<Value> {
        let collection = self.collection(slug)?;
        self.authorize(collection, Operation::Delete, actor)?;

        let doc = self.store.remove(slug, id)?.context("document not found")?;
        let args = HookArgs::new(Operation::Delete, doc).actor(actor.cloned());
        collection.hooks.run(HookPhase::AfterDelete, args).await
    }

    pub async fn update_global(
        &self,
        actor: Option<&Actor>,
        slug: &str,
        data: Value,
    ) -> anyhow::Result<Value> {
        let global = self.global(slug)?;
        let storage = global_storage(slug);

        let doc = match self.store.get(&storage, slug) {
            Some(mut current) => {
                merge(&mut current, data);
                self.store
                    .replace(&storage, slug, current)?
                    .context("global vanished")?
            }
            None => {
                let mut fields = into_fields(data)?;
                fields.insert("id".to_string(), json!(slug));
                self.store.insert(&storage, fields)?;
                self.store.get(&storage, slug).context("global vanished")?
            }
        };
        if global.versions {
            self.store.save_version(slug, None, doc.clone())?;
        }

        let args = HookArgs::new(Operation::Update, doc).actor(actor.cloned());
        global.hooks.run(HookPhase::AfterChange, args).await
    }

    pub async fn read_global(&self, actor: Option<&Actor>, slug: &str) -> anyhow::Result<Value> {
        let global = self.global(slug)?;
        let doc = self
            .store
            .get(&global_storage(slug), slug)
            .unwrap_or_else(|| json!({}));
        let args = HookArgs::new(Operation::Read, doc).actor(actor.cloned());
        global.hooks.run(HookPhase::AfterRead, args).await
    }

    /// Every record in the audit collection, oldest first.
    pub fn records(&self) -> Vec<AuditRecord> {
        self.store
            .documents(AUDIT)
            .iter()
            .map(|doc| AuditRecord::from_document(doc).expect("stored record should parse"))
            .collect()
    }
}

// =============================================================================
// HELPERS
// =============================================================================

fn global_storage(slug: &str) -> String {
    format!("__global:{}", slug)
}

fn into_fields(data: Value) -> anyhow::Result<Map<String, Value>> {
    match data {
        Value::Object(fields) => Ok(fields),
        other => bail!("document data must be an object, got {}", other),
    }
}

fn merge(doc: &mut Value, patch: Value) {
    if let (Value::Object(doc), Value::Object(patch)) = (doc, patch) {
        for (key, value) in patch {
            doc.insert(key, value);
        }
    }
}

/// Id of a document returned by the host.
pub fn id_of(doc: &Value) -> String {
    doc["id"].as_str().expect("document should have an id").to_string()
}

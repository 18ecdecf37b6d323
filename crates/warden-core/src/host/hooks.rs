//! Lifecycle hook chains.
//!
//! A chain is an ordered list of hooks for one phase of one resource. The
//! host runs the chain sequentially: every hook receives the document the
//! previous hook returned, and the last hook's result is what the caller of
//! the original operation sees.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use crate::{Actor, Operation};

/// Lifecycle phase a hook is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HookPhase {
    BeforeChange,
    AfterChange,
    BeforeRead,
    AfterRead,
    BeforeDelete,
    AfterDelete,
}

impl HookPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BeforeChange => "beforeChange",
            Self::AfterChange => "afterChange",
            Self::BeforeRead => "beforeRead",
            Self::AfterRead => "afterRead",
            Self::BeforeDelete => "beforeDelete",
            Self::AfterDelete => "afterDelete",
        }
    }

    pub fn is_after(&self) -> bool {
        matches!(self, Self::AfterChange | Self::AfterRead | Self::AfterDelete)
    }
}

impl fmt::Display for HookPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Arguments handed to every hook in a chain.
#[derive(Debug, Clone)]
pub struct HookArgs {
    /// Operation that triggered the chain. For `afterChange` this is either
    /// `Create` or `Update`.
    pub operation: Operation,
    /// Document as returned by the previous hook (or the operation itself).
    pub doc: Value,
    /// Authenticated identity of the request, if any.
    pub actor: Option<Actor>,
    /// Whether the read is part of a multi-document query.
    pub find_many: bool,
}

impl HookArgs {
    pub fn new(operation: Operation, doc: Value) -> Self {
        Self {
            operation,
            doc,
            actor: None,
            find_many: false,
        }
    }

    pub fn actor(mut self, actor: Option<Actor>) -> Self {
        self.actor = actor;
        self
    }

    pub fn find_many(mut self, find_many: bool) -> Self {
        self.find_many = find_many;
        self
    }
}

/// A callback the host runs at a lifecycle phase.
#[async_trait]
pub trait LifecycleHook: Send + Sync {
    /// Name used in diagnostics.
    fn name(&self) -> &str {
        "anonymous"
    }

    /// Plugin that registered the hook. Application hooks have none.
    fn owner(&self) -> Option<&str> {
        None
    }

    /// Run the hook and return the (possibly modified) document.
    async fn call(&self, args: HookArgs) -> anyhow::Result<Value>;
}

/// Adapter turning an async closure into a [`LifecycleHook`].
pub struct FnHook<F> {
    name: String,
    f: F,
}

#[async_trait]
impl<F, Fut> LifecycleHook for FnHook<F>
where
    F: Fn(HookArgs) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<Value>> + Send,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn call(&self, args: HookArgs) -> anyhow::Result<Value> {
        (self.f)(args).await
    }
}

/// Build a shareable hook from an async closure.
pub fn hook_fn<F, Fut>(name: impl Into<String>, f: F) -> Arc<dyn LifecycleHook>
where
    F: Fn(HookArgs) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
{
    Arc::new(FnHook {
        name: name.into(),
        f,
    })
}

/// Ordered hooks for one phase.
#[derive(Clone, Default)]
pub struct HookChain {
    hooks: Vec<Arc<dyn LifecycleHook>>,
}

impl HookChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a hook after every hook already in the chain.
    pub fn push(&mut self, hook: Arc<dyn LifecycleHook>) {
        self.hooks.push(hook);
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Hook names in run order.
    pub fn names(&self) -> Vec<&str> {
        self.hooks.iter().map(|h| h.name()).collect()
    }

    /// Names of the hooks registered by `owner`.
    pub fn owned_by(&self, owner: &str) -> Vec<&str> {
        self.hooks
            .iter()
            .filter(|h| h.owner() == Some(owner))
            .map(|h| h.name())
            .collect()
    }

    /// Run every hook in order, threading the document through.
    pub async fn run(&self, mut args: HookArgs) -> anyhow::Result<Value> {
        for hook in &self.hooks {
            args.doc = hook.call(args.clone()).await?;
        }
        Ok(args.doc)
    }
}

impl fmt::Debug for HookChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

/// All hook chains of a resource, keyed by phase.
#[derive(Debug, Clone, Default)]
pub struct Hooks {
    chains: BTreeMap<HookPhase, HookChain>,
}

impl Hooks {
    pub fn chain(&self, phase: HookPhase) -> Option<&HookChain> {
        self.chains.get(&phase)
    }

    /// Append a hook to a phase, creating the chain if needed.
    pub fn append(&mut self, phase: HookPhase, hook: Arc<dyn LifecycleHook>) {
        self.chains.entry(phase).or_default().push(hook);
    }

    /// Number of hooks registered for a phase.
    pub fn count(&self, phase: HookPhase) -> usize {
        self.chain(phase).map(HookChain::len).unwrap_or(0)
    }

    /// Run a phase. A phase without hooks returns the document unchanged.
    pub async fn run(&self, phase: HookPhase, args: HookArgs) -> anyhow::Result<Value> {
        match self.chain(phase) {
            Some(chain) => chain.run(args).await,
            None => Ok(args.doc),
        }
    }
}

//! Hook injection.
//!
//! Appends audit hooks to every eligible resource of an application. Hooks
//! are injected regardless of the `disabled` flag and operation toggles; the
//! event logger applies those at run time.

use std::sync::Arc;
use warden_core::{
    AppConfig, HookPhase, HookRegistry, HostError, LifecycleHook, ResourceDescriptor, ResourceKind,
};

use crate::hooks::{AUDIT_HOOK_OWNER, AuditHook};
use crate::logger::EventLogger;

/// Which resources received audit hooks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InjectionSummary {
    pub collections: Vec<String>,
    pub globals: Vec<String>,
    pub skipped: Vec<String>,
}

/// Attach audit hooks to all collections and globals that are not excluded.
///
/// The audit collection itself is never instrumented.
pub fn inject_audit_hooks(
    app: &mut AppConfig,
    logger: Arc<EventLogger>,
) -> Result<InjectionSummary, HostError> {
    app.ensure_resources();

    let config = logger.config();
    let mut summary = InjectionSummary::default();

    for resource in app.resources() {
        let excluded = match resource.kind {
            ResourceKind::Collection => config.is_collection_excluded(&resource.slug),
            ResourceKind::Global => config.is_global_excluded(&resource.slug),
        };
        if excluded {
            tracing::debug!(kind = %resource.kind, slug = %resource.slug, "Not auditing resource");
            summary.skipped.push(resource.slug);
            continue;
        }

        let hooks: Vec<AuditHook> = match resource.kind {
            ResourceKind::Collection => vec![
                AuditHook::collection_change(logger.clone(), resource.clone()),
                AuditHook::collection_delete(logger.clone(), resource.clone()),
                AuditHook::read(logger.clone(), resource.clone()),
            ],
            ResourceKind::Global => vec![
                AuditHook::global_change(logger.clone(), resource.clone()),
                AuditHook::read(logger.clone(), resource.clone()),
            ],
        };

        for hook in hooks {
            let phase = hook.phase();
            if already_registered(app, &resource, phase, hook.name()) {
                tracing::warn!(
                    slug = %resource.slug,
                    phase = %phase,
                    hook = %hook.name(),
                    "Audit hook already registered, skipping"
                );
                continue;
            }
            let handler: Arc<dyn LifecycleHook> = Arc::new(hook);
            app.register_after_event(&resource, phase, handler)?;
        }

        match resource.kind {
            ResourceKind::Collection => summary.collections.push(resource.slug),
            ResourceKind::Global => summary.globals.push(resource.slug),
        }
    }

    tracing::info!(
        collections = summary.collections.len(),
        globals = summary.globals.len(),
        skipped = summary.skipped.len(),
        "Audit hooks injected"
    );

    Ok(summary)
}

fn already_registered(
    app: &AppConfig,
    resource: &ResourceDescriptor,
    phase: HookPhase,
    name: &str,
) -> bool {
    let hooks = match resource.kind {
        ResourceKind::Collection => app.collection(&resource.slug).map(|c| &c.hooks),
        ResourceKind::Global => app.global(&resource.slug).map(|g| &g.hooks),
    };
    hooks
        .and_then(|hooks| hooks.chain(phase))
        .is_some_and(|chain| chain.owned_by(AUDIT_HOOK_OWNER).contains(&name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::Value;
    use warden_core::{
        AuditOptions, CollectionConfig, GlobalConfig, HookArgs, Operation, hook_fn,
    };

    fn existing(name: &'static str) -> Arc<dyn LifecycleHook> {
        hook_fn(name, |args: HookArgs| async move { Ok::<Value, anyhow::Error>(args.doc) })
    }

    fn logger(options: AuditOptions) -> Arc<EventLogger> {
        let store = Arc::new(MemoryStore::new());
        Arc::new(EventLogger::new(Arc::new(options.resolve()), store.clone(), store))
    }

    fn app() -> AppConfig {
        AppConfig::new()
            .with_collection(
                CollectionConfig::new("posts")
                    .hook(HookPhase::AfterChange, existing("posts:existing"))
                    .hook(HookPhase::BeforeChange, existing("posts:before")),
            )
            .with_collection(CollectionConfig::new("audit-log"))
            .with_collection(CollectionConfig::new("excluded-collection"))
            .with_global(
                GlobalConfig::new("settings")
                    .hook(HookPhase::AfterChange, existing("settings:existing"))
                    .hook(HookPhase::BeforeRead, existing("settings:before")),
            )
            .with_global(GlobalConfig::new("excluded-global"))
    }

    fn options() -> AuditOptions {
        AuditOptions::default()
            .exclude_collection("excluded-collection")
            .exclude_global("excluded-global")
    }

    #[test]
    fn adds_hooks_to_a_standard_collection() {
        let mut app = app();
        inject_audit_hooks(&mut app, logger(options())).unwrap();

        let posts = &app.collection("posts").unwrap().hooks;
        assert_eq!(
            posts.chain(HookPhase::AfterChange).unwrap().names(),
            vec!["posts:existing", "audit:posts:afterChange"]
        );
        assert_eq!(posts.count(HookPhase::AfterDelete), 1);
        assert_eq!(posts.count(HookPhase::AfterRead), 1);
        assert_eq!(posts.count(HookPhase::BeforeChange), 1);
    }

    #[test]
    fn adds_hooks_to_a_standard_global() {
        let mut app = app();
        inject_audit_hooks(&mut app, logger(options())).unwrap();

        let settings = &app.global("settings").unwrap().hooks;
        assert_eq!(settings.count(HookPhase::AfterChange), 2);
        assert_eq!(settings.count(HookPhase::AfterRead), 1);
        assert_eq!(settings.count(HookPhase::BeforeRead), 1);
        assert!(settings.chain(HookPhase::AfterDelete).is_none());
    }

    #[test]
    fn never_instruments_the_audit_collection_or_exclusions() {
        let mut app = app();
        let summary = inject_audit_hooks(&mut app, logger(options())).unwrap();

        for slug in ["audit-log", "excluded-collection"] {
            let hooks = &app.collection(slug).unwrap().hooks;
            assert!(hooks.chain(HookPhase::AfterChange).is_none());
            assert!(hooks.chain(HookPhase::AfterDelete).is_none());
            assert!(hooks.chain(HookPhase::AfterRead).is_none());
        }
        let excluded = &app.global("excluded-global").unwrap().hooks;
        assert!(excluded.chain(HookPhase::AfterChange).is_none());
        assert!(excluded.chain(HookPhase::AfterRead).is_none());

        assert_eq!(summary.collections, vec!["posts".to_string()]);
        assert_eq!(summary.globals, vec!["settings".to_string()]);
        assert_eq!(summary.skipped.len(), 3);
    }

    #[test]
    fn empty_application_is_initialised_not_rejected() {
        let mut app = AppConfig::new();
        let summary = inject_audit_hooks(&mut app, logger(AuditOptions::default())).unwrap();

        assert_eq!(summary, InjectionSummary::default());
        assert_eq!(app.collections.as_ref().map(Vec::len), Some(0));
        assert_eq!(app.globals.as_ref().map(Vec::len), Some(0));
    }

    #[test]
    fn hooks_are_injected_even_when_everything_is_off() {
        let mut app = app();
        let options = options()
            .disabled(true)
            .operation(Operation::Create, false)
            .operation(Operation::Update, false)
            .operation(Operation::Delete, false);
        inject_audit_hooks(&mut app, logger(options)).unwrap();

        let posts = &app.collection("posts").unwrap().hooks;
        assert_eq!(posts.count(HookPhase::AfterChange), 2);
        assert_eq!(posts.count(HookPhase::AfterDelete), 1);
        assert_eq!(posts.count(HookPhase::AfterRead), 1);

        let settings = &app.global("settings").unwrap().hooks;
        assert_eq!(settings.count(HookPhase::AfterChange), 2);
        assert_eq!(settings.count(HookPhase::AfterRead), 1);
    }

    #[test]
    fn injecting_twice_does_not_double_hooks() {
        let mut app = app();
        let logger = logger(options());
        inject_audit_hooks(&mut app, logger.clone()).unwrap();
        inject_audit_hooks(&mut app, logger).unwrap();

        let posts = &app.collection("posts").unwrap().hooks;
        assert_eq!(posts.count(HookPhase::AfterChange), 2);
        assert_eq!(posts.count(HookPhase::AfterDelete), 1);
        assert_eq!(app.global("settings").unwrap().hooks.count(HookPhase::AfterRead), 1);
    }

    #[test]
    fn same_named_application_hook_does_not_block_injection() {
        let mut app = AppConfig::new().with_collection(
            CollectionConfig::new("posts")
                .hook(HookPhase::AfterChange, existing("audit:posts:afterChange")),
        );
        inject_audit_hooks(&mut app, logger(AuditOptions::default())).unwrap();

        let chain = app
            .collection("posts")
            .unwrap()
            .hooks
            .chain(HookPhase::AfterChange)
            .unwrap();
        assert_eq!(chain.len(), 2);
        assert_eq!(chain.owned_by(AUDIT_HOOK_OWNER), vec!["audit:posts:afterChange"]);
    }
}

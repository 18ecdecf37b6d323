//! Lifecycle hooks that feed the event logger.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use warden_core::{FailureMode, HookArgs, HookPhase, LifecycleHook, Operation, ResourceDescriptor};

use crate::logger::{EventLogger, LogOutcome, LogRequest};

/// Owner tag carried by every audit hook.
pub const AUDIT_HOOK_OWNER: &str = "warden-audit";

/// Where a hook takes its operation kind from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookOperation {
    /// Use the operation that triggered the chain (create or update).
    Triggered,
    /// Always record this operation.
    Fixed(Operation),
}

/// Audit hook attached to one phase of one resource.
pub struct AuditHook {
    logger: Arc<EventLogger>,
    resource: ResourceDescriptor,
    phase: HookPhase,
    operation: HookOperation,
    name: String,
}

impl AuditHook {
    pub fn new(
        logger: Arc<EventLogger>,
        resource: ResourceDescriptor,
        phase: HookPhase,
        operation: HookOperation,
    ) -> Self {
        let name = format!("audit:{}:{}", resource.slug, phase);
        Self {
            logger,
            resource,
            phase,
            operation,
            name,
        }
    }

    /// `afterChange` on a collection: logs the triggering create or update.
    pub fn collection_change(logger: Arc<EventLogger>, resource: ResourceDescriptor) -> Self {
        Self::new(logger, resource, HookPhase::AfterChange, HookOperation::Triggered)
    }

    /// `afterDelete` on a collection.
    pub fn collection_delete(logger: Arc<EventLogger>, resource: ResourceDescriptor) -> Self {
        Self::new(
            logger,
            resource,
            HookPhase::AfterDelete,
            HookOperation::Fixed(Operation::Delete),
        )
    }

    /// `afterRead` on a collection or global.
    pub fn read(logger: Arc<EventLogger>, resource: ResourceDescriptor) -> Self {
        Self::new(
            logger,
            resource,
            HookPhase::AfterRead,
            HookOperation::Fixed(Operation::Read),
        )
    }

    /// `afterChange` on a global. Globals only ever update.
    pub fn global_change(logger: Arc<EventLogger>, resource: ResourceDescriptor) -> Self {
        Self::new(
            logger,
            resource,
            HookPhase::AfterChange,
            HookOperation::Fixed(Operation::Update),
        )
    }

    pub fn phase(&self) -> HookPhase {
        self.phase
    }

    pub fn resource(&self) -> &ResourceDescriptor {
        &self.resource
    }

    fn operation_for(&self, args: &HookArgs) -> Operation {
        match self.operation {
            HookOperation::Triggered => args.operation,
            HookOperation::Fixed(op) => op,
        }
    }
}

#[async_trait]
impl LifecycleHook for AuditHook {
    fn name(&self) -> &str {
        &self.name
    }

    fn owner(&self) -> Option<&str> {
        Some(AUDIT_HOOK_OWNER)
    }

    async fn call(&self, args: HookArgs) -> anyhow::Result<Value> {
        let operation = self.operation_for(&args);
        let request = LogRequest::new(operation, &self.resource, &args.doc, args.actor.as_ref())
            .find_many(args.find_many);

        match self.logger.log(request).await {
            Ok(LogOutcome::Written { .. }) | Ok(LogOutcome::Skipped(_)) => {}
            Err(err) => match self.logger.config().failure_mode {
                FailureMode::Report => {
                    tracing::error!(
                        hook = %self.name,
                        resource = %self.resource.slug,
                        operation = %operation,
                        error = %err,
                        "Audit logging failed"
                    );
                }
                FailureMode::Propagate => return Err(err.into()),
            },
        }

        Ok(args.doc)
    }
}

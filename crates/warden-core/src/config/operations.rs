//! Per-operation logging toggles.

use serde::{Deserialize, Serialize};

use crate::Operation;

/// Which operation kinds produce audit records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationToggles {
    #[serde(default = "default_true")]
    pub create: bool,

    /// Read hooks fire far more often than writes, so reads are off by default.
    #[serde(default)]
    pub read: bool,

    #[serde(default = "default_true")]
    pub update: bool,

    #[serde(default = "default_true")]
    pub delete: bool,
}

impl Default for OperationToggles {
    fn default() -> Self {
        Self {
            create: true,
            read: false,
            update: true,
            delete: true,
        }
    }
}

impl OperationToggles {
    /// Every operation switched on.
    pub fn all() -> Self {
        Self {
            create: true,
            read: true,
            update: true,
            delete: true,
        }
    }

    /// Every operation switched off.
    pub fn none() -> Self {
        Self {
            create: false,
            read: false,
            update: false,
            delete: false,
        }
    }

    /// Check whether an operation kind is enabled.
    pub fn is_enabled(&self, operation: Operation) -> bool {
        match operation {
            Operation::Create => self.create,
            Operation::Read => self.read,
            Operation::Update => self.update,
            Operation::Delete => self.delete,
        }
    }

    /// Apply a partial override key by key.
    pub fn merge(self, overrides: &OperationOverrides) -> Self {
        Self {
            create: overrides.create.unwrap_or(self.create),
            read: overrides.read.unwrap_or(self.read),
            update: overrides.update.unwrap_or(self.update),
            delete: overrides.delete.unwrap_or(self.delete),
        }
    }
}

/// Caller-supplied operation toggles; unset keys keep their defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete: Option<bool>,
}

impl OperationOverrides {
    /// Override a single operation kind.
    pub fn set(mut self, operation: Operation, enabled: bool) -> Self {
        let slot = match operation {
            Operation::Create => &mut self.create,
            Operation::Read => &mut self.read,
            Operation::Update => &mut self.update,
            Operation::Delete => &mut self.delete,
        };
        *slot = Some(enabled);
        self
    }
}

fn default_true() -> bool {
    true
}

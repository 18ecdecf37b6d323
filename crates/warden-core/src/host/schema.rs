//! Declared shape of collections: fields, access rules and admin settings.

use serde::{Deserialize, Serialize};

use crate::{Actor, Operation};

/// Access rule for one operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Access {
    /// Any request, authenticated or not.
    #[default]
    Anyone,
    /// Only requests carrying an actor.
    Authenticated,
    /// No request through the normal document paths.
    Nobody,
}

impl Access {
    pub fn permits(&self, actor: Option<&Actor>) -> bool {
        match self {
            Self::Anyone => true,
            Self::Authenticated => actor.is_some(),
            Self::Nobody => false,
        }
    }
}

/// Per-operation access rules of a collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessConfig {
    #[serde(default)]
    pub create: Access,
    #[serde(default)]
    pub read: Access,
    #[serde(default)]
    pub update: Access,
    #[serde(default)]
    pub delete: Access,
}

impl AccessConfig {
    /// Readable according to `read`; create, update and delete always denied.
    pub fn read_only(read: Access) -> Self {
        Self {
            create: Access::Nobody,
            read,
            update: Access::Nobody,
            delete: Access::Nobody,
        }
    }

    pub fn rule(&self, operation: Operation) -> Access {
        match operation {
            Operation::Create => self.create,
            Operation::Read => self.read,
            Operation::Update => self.update,
            Operation::Delete => self.delete,
        }
    }

    pub fn permits(&self, operation: Operation, actor: Option<&Actor>) -> bool {
        self.rule(operation).permits(actor)
    }
}

/// Field value type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Date,
    Select { options: Vec<String> },
    Relationship { relation_to: String },
}

/// One declared field of a collection or global.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldConfig {
    pub name: String,
    #[serde(flatten)]
    pub field_type: FieldType,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub read_only: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Display format for date fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_format: Option<String>,
}

impl FieldConfig {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            required: false,
            read_only: false,
            label: None,
            display_format: None,
        }
    }

    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Text)
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn display_format(mut self, format: impl Into<String>) -> Self {
        self.display_format = Some(format.into());
        self
    }
}

/// Admin panel settings of a collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminConfig {
    #[serde(default)]
    pub default_columns: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_as_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(default)]
    pub disable_copy_to_locale: bool,
}

/// Singular/plural display labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Labels {
    pub singular: String,
    pub plural: String,
}

//! Admin display values for audit rows.

use chrono::{DateTime, Utc};
use std::fmt::Write;
use urlencoding::encode;
use warden_core::Operation;

const ADMIN_ROOT: &str = "/admin";

/// Display value of the `operation` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationCell {
    Known(Operation),
    Invalid,
}

impl OperationCell {
    pub fn from_raw(raw: Option<&str>) -> Self {
        raw.and_then(Operation::parse)
            .map(Self::Known)
            .unwrap_or(Self::Invalid)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Known(op) => op.as_str(),
            Self::Invalid => "Invalid",
        }
    }
}

/// Label of a stored `operation` value.
pub fn operation_label(raw: Option<&str>) -> &'static str {
    OperationCell::from_raw(raw).label()
}

/// Display value of the `previousVersionId` column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionCell {
    /// The row lacks its resource type or document id.
    NotFound,
    /// No version preceded this operation.
    None,
    Link { label: String, href: String },
}

/// Link to the audited document's edit view.
pub fn document_link(resource_type: &str, document_id: &str) -> String {
    format!(
        "{}/collections/{}/{}",
        ADMIN_ROOT,
        encode(resource_type),
        encode(document_id)
    )
}

/// Link to a record's `resourceUrl`, or `None` when it is empty.
pub fn resource_link(resource_url: &str) -> Option<String> {
    if resource_url.is_empty() {
        return None;
    }
    Some(format!("{}/{}", ADMIN_ROOT, resource_url))
}

/// Display value linking to the version an operation superseded.
pub fn previous_version_cell(
    resource_type: Option<&str>,
    document_id: Option<&str>,
    previous_version_id: Option<&str>,
) -> VersionCell {
    let (Some(resource_type), Some(document_id)) = (
        resource_type.filter(|s| !s.is_empty()),
        document_id.filter(|s| !s.is_empty()),
    ) else {
        return VersionCell::NotFound;
    };
    let Some(version) = previous_version_id.filter(|s| !s.is_empty()) else {
        return VersionCell::None;
    };

    VersionCell::Link {
        label: version.to_string(),
        href: format!(
            "{}/collections/{}/{}/versions/{}",
            ADMIN_ROOT,
            encode(resource_type),
            encode(document_id),
            encode(version)
        ),
    }
}

/// Format a record timestamp with a chrono format string.
///
/// An invalid format string falls back to RFC 3339.
pub fn format_timestamp(timestamp: &DateTime<Utc>, date_format: &str) -> String {
    let mut out = String::new();
    match write!(out, "{}", timestamp.format(date_format)) {
        Ok(()) => out,
        Err(_) => {
            tracing::warn!(date_format = %date_format, "Invalid date format, using RFC 3339");
            timestamp.to_rfc3339()
        }
    }
}

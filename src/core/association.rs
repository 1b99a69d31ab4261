//! Associations between label entities and arbitrary targets
//!
//! A label is any entity used to tag another one: a tag, a colour, a font,
//! a hashtag. Both ends are [`EntityReference`]s, so a single store links
//! labels of any kind to targets of any kind.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::core::identity::RecordId;
use crate::core::reference::{EntityKind, EntityReference};

/// Identifier of an association (`ASC-...`)
pub type AssociationId = RecordId;

/// A recorded link between a label and a target
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Association {
    pub id: AssociationId,
    pub label: EntityReference,
    pub target: EntityReference,
    /// Role of the label on the target (e.g. "primary", "accent")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<String>,
    pub is_primary: bool,
    pub sort_order: i64,
    pub created_at: DateTime<Utc>,
    /// Insertion sequence, breaks `created_at` ties
    #[serde(skip)]
    pub(crate) seq: i64,
}

/// Options for [`crate::core::store::Store::attach`]
#[derive(Debug, Clone, Default)]
pub struct AttachOptions {
    pub usage: Option<String>,
    pub make_primary: bool,
    /// Explicit position; defaults to after the last association of the target
    pub order: Option<i64>,
}

impl AttachOptions {
    pub fn usage(mut self, usage: impl Into<String>) -> Self {
        self.usage = Some(usage.into());
        self
    }

    pub fn primary(mut self) -> Self {
        self.make_primary = true;
        self
    }

    pub fn order(mut self, order: i64) -> Self {
        self.order = Some(order);
        self
    }
}

/// Errors that can occur during association operations
#[derive(Debug, Error)]
pub enum AssociationError {
    #[error("Association already exists: {label} → {target} ({})", usage_label(.usage))]
    DuplicateAssociation {
        label: EntityReference,
        target: EntityReference,
        usage: Option<String>,
    },

    #[error("Inconsistent state: {count} primary {label_kind} associations on {target}")]
    InconsistentState {
        target: EntityReference,
        label_kind: EntityKind,
        count: usize,
    },

    #[error("Invalid reorder for {target}: {reason}")]
    InvalidReorder {
        target: EntityReference,
        reason: String,
    },

    #[error("Association not found: {0}")]
    NotFound(AssociationId),

    #[error("No sort position left after {max} on {target}")]
    OrderOverflow { target: EntityReference, max: i64 },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

fn usage_label(usage: &Option<String>) -> String {
    match usage {
        Some(usage) => format!("usage '{}'", usage),
        None => "no usage".to_string(),
    }
}

/// Blank usages are the same role as no usage at all
pub fn normalize_usage(usage: Option<String>) -> Option<String> {
    usage
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty())
}

/// Sort into rendering order: `sort_order`, then creation time, then
/// insertion order
pub fn sort_for_rendering(associations: &mut [Association]) {
    associations.sort_by(|a, b| {
        a.sort_order
            .cmp(&b.sort_order)
            .then_with(|| a.created_at.cmp(&b.created_at))
            .then_with(|| a.seq.cmp(&b.seq))
    });
}

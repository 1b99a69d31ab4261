//! Workflow status values

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle family of a workflow record, fixed at creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowFamily {
    /// draft -> submitted -> under_review -> approved | rejected
    Review,
    /// in_progress -> completed
    Progress,
}

impl WorkflowFamily {
    /// Status a freshly created record starts in
    pub fn initial_status(&self) -> WorkflowStatus {
        match self {
            WorkflowFamily::Review => WorkflowStatus::Draft,
            WorkflowFamily::Progress => WorkflowStatus::InProgress,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowFamily::Review => "review",
            WorkflowFamily::Progress => "progress",
        }
    }
}

impl fmt::Display for WorkflowFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkflowFamily {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "review" => Ok(WorkflowFamily::Review),
            "progress" => Ok(WorkflowFamily::Progress),
            _ => Err(format!("Unknown workflow family: {}", s)),
        }
    }
}

/// Stored status of a workflow record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    #[default]
    Draft,
    Submitted,
    UnderReview,
    Approved,
    Rejected,
    InProgress,
    Completed,
}

impl WorkflowStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowStatus::Draft => "draft",
            WorkflowStatus::Submitted => "submitted",
            WorkflowStatus::UnderReview => "under_review",
            WorkflowStatus::Approved => "approved",
            WorkflowStatus::Rejected => "rejected",
            WorkflowStatus::InProgress => "in_progress",
            WorkflowStatus::Completed => "completed",
        }
    }

    /// Family whose transitions this status belongs to
    pub fn family(&self) -> WorkflowFamily {
        match self {
            WorkflowStatus::InProgress | WorkflowStatus::Completed => WorkflowFamily::Progress,
            _ => WorkflowFamily::Review,
        }
    }

    /// Whether a human decision has been recorded
    pub fn is_decided(&self) -> bool {
        matches!(self, WorkflowStatus::Approved | WorkflowStatus::Rejected)
    }
}

impl fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkflowStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "draft" => Ok(WorkflowStatus::Draft),
            "submitted" => Ok(WorkflowStatus::Submitted),
            "under_review" => Ok(WorkflowStatus::UnderReview),
            "approved" => Ok(WorkflowStatus::Approved),
            "rejected" => Ok(WorkflowStatus::Rejected),
            "in_progress" => Ok(WorkflowStatus::InProgress),
            "completed" => Ok(WorkflowStatus::Completed),
            _ => Err(format!("Unknown workflow status: {}", s)),
        }
    }
}

/// Read-time view of a record's state
///
/// An approval past its expiry reads as `Expired` while the stored status
/// stays `approved`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectiveState {
    Stored(WorkflowStatus),
    Expired,
}

impl fmt::Display for EffectiveState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EffectiveState::Stored(status) => write!(f, "{}", status),
            EffectiveState::Expired => write!(f, "expired"),
        }
    }
}

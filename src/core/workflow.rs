//! Workflow engine for review and progress lifecycles
//!
//! Review-family records move `draft -> submitted -> under_review ->
//! approved | rejected`; progress-family records move `in_progress ->
//! completed` once their progress reaches 100.
//!
//! Every transition here is pure: it takes the current record and the
//! current time and returns the next record. Persisting the result is the
//! caller's job (see [`crate::core::store::Store::transition`], which wraps
//! load, transition and save in a single transaction).

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::core::format::days_until;
use crate::core::identity::{RecordId, RecordPrefix};
use crate::core::reference::EntityReference;
use crate::core::status::{EffectiveState, WorkflowFamily, WorkflowStatus};

/// Workflow configuration from project config
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct WorkflowConfig {
    /// Validity period of an approval in days (0 = approvals never expire)
    pub default_validity_days: u32,

    /// Points awarded when a progress workflow completes
    pub completion_points: i64,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            default_validity_days: 365,
            completion_points: 10,
        }
    }
}

impl WorkflowConfig {
    /// Validity period applied to approvals when the caller gives none
    pub fn default_validity(&self) -> Option<Duration> {
        validity_days(self.default_validity_days)
    }
}

/// Validity period for a number of days; `0` means the approval never expires
pub fn validity_days(days: u32) -> Option<Duration> {
    match days {
        0 => None,
        days => Some(Duration::days(i64::from(days))),
    }
}

/// Errors that can occur during workflow operations
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("Invalid status transition: {from} → {to}")]
    InvalidTransition {
        from: WorkflowStatus,
        to: WorkflowStatus,
    },

    #[error("A rejection reason is required")]
    MissingReason,

    #[error("Workflow not found: {0}")]
    NotFound(RecordId),

    #[error("Validity period of {days} days runs past the last representable date")]
    ValidityOutOfRange { days: i64 },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// A record tracked through a review or progress lifecycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowRecord {
    pub id: RecordId,
    pub family: WorkflowFamily,
    pub subject: EntityReference,
    pub status: WorkflowStatus,
    /// Completion percentage, always within 0..=100
    pub progress: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewer: Option<EntityReference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decided_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points_earned: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WorkflowRecord {
    /// Create a record in the initial status of its family
    pub fn new(family: WorkflowFamily, subject: EntityReference, now: DateTime<Utc>) -> Self {
        Self {
            id: RecordId::new(RecordPrefix::Wfl),
            family,
            subject,
            status: family.initial_status(),
            progress: 0,
            value: None,
            reviewer: None,
            submitted_at: None,
            reviewed_at: None,
            decided_at: None,
            completed_at: None,
            expires_at: None,
            notes: None,
            rejection_reason: None,
            score: None,
            points_earned: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Computes the points a completed workflow earns
pub trait Scorer {
    fn points_for(&self, record: &WorkflowRecord) -> i64;
}

impl<F> Scorer for F
where
    F: Fn(&WorkflowRecord) -> i64,
{
    fn points_for(&self, record: &WorkflowRecord) -> i64 {
        self(record)
    }
}

/// Scorer awarding the same number of points for every completion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedPoints(pub i64);

impl Scorer for FixedPoints {
    fn points_for(&self, _record: &WorkflowRecord) -> i64 {
        self.0
    }
}

/// Options for recording an approval
#[derive(Debug, Clone)]
pub struct ApprovalOptions {
    /// Acting reviewer
    pub reviewer: EntityReference,
    /// Reviewer notes
    pub notes: Option<String>,
    /// Review score
    pub score: Option<i32>,
    /// How long the approval stays valid (None = no expiry)
    pub validity: Option<Duration>,
}

impl ApprovalOptions {
    pub fn new(reviewer: EntityReference) -> Self {
        Self {
            reviewer,
            notes: None,
            score: None,
            validity: None,
        }
    }
}

/// Result of a progress update
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressOutcome {
    pub record: WorkflowRecord,
    /// True only for the update that moved the record to `completed`
    pub completed_now: bool,
}

/// Workflow engine for managing status transitions
#[derive(Debug, Clone, Default)]
pub struct WorkflowEngine {
    config: WorkflowConfig,
}

impl WorkflowEngine {
    /// Create a new workflow engine
    pub fn new(config: WorkflowConfig) -> Self {
        Self { config }
    }

    /// Get the workflow configuration
    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    /// Approval options carrying the configured default validity period
    pub fn approval_options(&self, reviewer: EntityReference) -> ApprovalOptions {
        ApprovalOptions {
            validity: self.config.default_validity(),
            ..ApprovalOptions::new(reviewer)
        }
    }

    /// Check if a status transition is valid
    pub fn is_valid_transition(&self, from: WorkflowStatus, to: WorkflowStatus) -> bool {
        self.allowed_transitions(from).contains(&to)
    }

    /// Get allowed transitions from the current status
    pub fn allowed_transitions(&self, current: WorkflowStatus) -> Vec<WorkflowStatus> {
        match current {
            WorkflowStatus::Draft => vec![WorkflowStatus::Submitted],
            // Direct approval passes through under_review implicitly
            WorkflowStatus::Submitted => {
                vec![WorkflowStatus::UnderReview, WorkflowStatus::Approved]
            }
            WorkflowStatus::UnderReview => {
                vec![WorkflowStatus::Approved, WorkflowStatus::Rejected]
            }
            WorkflowStatus::Rejected => vec![WorkflowStatus::Draft],
            WorkflowStatus::Approved => vec![],
            WorkflowStatus::InProgress => vec![WorkflowStatus::Completed],
            WorkflowStatus::Completed => vec![],
        }
    }

    fn require(
        &self,
        record: &WorkflowRecord,
        to: WorkflowStatus,
    ) -> Result<(), WorkflowError> {
        if self.is_valid_transition(record.status, to) {
            Ok(())
        } else {
            Err(WorkflowError::InvalidTransition {
                from: record.status,
                to,
            })
        }
    }

    /// `draft -> submitted`
    pub fn submit(
        &self,
        record: &WorkflowRecord,
        now: DateTime<Utc>,
    ) -> Result<WorkflowRecord, WorkflowError> {
        self.require(record, WorkflowStatus::Submitted)?;

        let mut next = record.clone();
        next.status = WorkflowStatus::Submitted;
        next.submitted_at = Some(now);
        next.updated_at = now;
        debug!(id = %next.id, from = %record.status, to = %next.status, "workflow submitted");
        Ok(next)
    }

    /// `submitted -> under_review`
    ///
    /// Repeating the call with the same reviewer is a no-op.
    pub fn begin_review(
        &self,
        record: &WorkflowRecord,
        reviewer: &EntityReference,
        now: DateTime<Utc>,
    ) -> Result<WorkflowRecord, WorkflowError> {
        if record.status == WorkflowStatus::UnderReview
            && record.reviewer.as_ref() == Some(reviewer)
        {
            return Ok(record.clone());
        }
        self.require(record, WorkflowStatus::UnderReview)?;

        let mut next = record.clone();
        next.status = WorkflowStatus::UnderReview;
        next.reviewer = Some(reviewer.clone());
        next.updated_at = now;
        debug!(id = %next.id, reviewer = %reviewer, "workflow under review");
        Ok(next)
    }

    /// `under_review -> approved` (or `submitted -> approved`, passing
    /// through `under_review`)
    pub fn approve(
        &self,
        record: &WorkflowRecord,
        options: &ApprovalOptions,
        now: DateTime<Utc>,
    ) -> Result<WorkflowRecord, WorkflowError> {
        let reviewing = if record.status == WorkflowStatus::Submitted {
            self.begin_review(record, &options.reviewer, now)?
        } else {
            record.clone()
        };
        self.require(&reviewing, WorkflowStatus::Approved)?;

        let mut next = reviewing;
        next.status = WorkflowStatus::Approved;
        next.reviewer = Some(options.reviewer.clone());
        next.reviewed_at = Some(now);
        next.decided_at = Some(now);
        next.expires_at = options
            .validity
            .map(|period| {
                now.checked_add_signed(period)
                    .ok_or(WorkflowError::ValidityOutOfRange {
                        days: period.num_days(),
                    })
            })
            .transpose()?;
        next.rejection_reason = None;
        if options.notes.is_some() {
            next.notes = options.notes.clone();
        }
        if options.score.is_some() {
            next.score = options.score;
        }
        next.updated_at = now;
        debug!(id = %next.id, reviewer = %options.reviewer, expires_at = ?next.expires_at, "workflow approved");
        Ok(next)
    }

    /// `under_review -> rejected`; the reason must not be blank
    pub fn reject(
        &self,
        record: &WorkflowRecord,
        reviewer: &EntityReference,
        reason: &str,
        notes: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<WorkflowRecord, WorkflowError> {
        self.require(record, WorkflowStatus::Rejected)?;
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(WorkflowError::MissingReason);
        }

        let mut next = record.clone();
        next.status = WorkflowStatus::Rejected;
        next.reviewer = Some(reviewer.clone());
        next.reviewed_at = Some(now);
        next.decided_at = Some(now);
        next.rejection_reason = Some(reason.to_string());
        if let Some(notes) = notes {
            next.notes = Some(notes.to_string());
        }
        next.updated_at = now;
        debug!(id = %next.id, reviewer = %reviewer, reason, "workflow rejected");
        Ok(next)
    }

    /// `rejected -> draft`, clearing the previous decision so the record
    /// can be revised and submitted again
    pub fn reopen(
        &self,
        record: &WorkflowRecord,
        now: DateTime<Utc>,
    ) -> Result<WorkflowRecord, WorkflowError> {
        self.require(record, WorkflowStatus::Draft)?;

        let mut next = record.clone();
        next.status = WorkflowStatus::Draft;
        next.reviewer = None;
        next.submitted_at = None;
        next.reviewed_at = None;
        next.decided_at = None;
        next.expires_at = None;
        next.updated_at = now;
        debug!(id = %next.id, "workflow reopened");
        Ok(next)
    }

    /// Set progress (clamped to 0..=100), completing the record the first
    /// time progress reaches 100
    ///
    /// A `value` of `None` keeps the current value.
    pub fn update_progress(
        &self,
        record: &WorkflowRecord,
        new_progress: i64,
        value: Option<f64>,
        scorer: &dyn Scorer,
        now: DateTime<Utc>,
    ) -> Result<ProgressOutcome, WorkflowError> {
        if record.family != WorkflowFamily::Progress {
            return Err(WorkflowError::InvalidTransition {
                from: record.status,
                to: WorkflowStatus::InProgress,
            });
        }

        let mut next = record.clone();
        next.progress = new_progress.clamp(0, 100) as u8;
        if value.is_some() {
            next.value = value;
        }
        next.updated_at = now;

        let completed_now = next.progress >= 100 && record.status == WorkflowStatus::InProgress;
        if completed_now {
            next.status = WorkflowStatus::Completed;
            next.completed_at = Some(now);
            if next.points_earned.is_none() {
                next.points_earned = Some(scorer.points_for(&next));
            }
            debug!(id = %next.id, points = ?next.points_earned, "workflow completed");
        }

        Ok(ProgressOutcome {
            record: next,
            completed_now,
        })
    }

    /// Approved and not past its expiry
    pub fn is_valid(&self, record: &WorkflowRecord, now: DateTime<Utc>) -> bool {
        record.status == WorkflowStatus::Approved
            && record.expires_at.map_or(true, |expires_at| expires_at > now)
    }

    /// Stored status, or `Expired` for an approval past its expiry
    pub fn effective_state(&self, record: &WorkflowRecord, now: DateTime<Utc>) -> EffectiveState {
        if record.status == WorkflowStatus::Approved && !self.is_valid(record, now) {
            EffectiveState::Expired
        } else {
            EffectiveState::Stored(record.status)
        }
    }

    /// Whole days until an approval expires (None without an expiry)
    pub fn days_until_expiry(&self, record: &WorkflowRecord, now: DateTime<Utc>) -> Option<i64> {
        record.expires_at.map(|expires_at| days_until(expires_at, now))
    }
}

//! Workflow record persistence
//!
//! Transitions load, apply and save inside one IMMEDIATE transaction, so two
//! writers racing on the same record cannot both succeed from the same
//! starting status.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use tracing::{debug, info};

use super::serialize::{optional_reference_at, reference_at};
use super::Store;
use crate::core::identity::RecordId;
use crate::core::reference::EntityReference;
use crate::core::status::{WorkflowFamily, WorkflowStatus};
use crate::core::workflow::{
    ProgressOutcome, Scorer, WorkflowEngine, WorkflowError, WorkflowRecord,
};

const COLUMNS: &str = "id, family, subject_kind, subject_id, status, progress, value, \
     reviewer_kind, reviewer_id, submitted_at, reviewed_at, decided_at, completed_at, \
     expires_at, notes, rejection_reason, score, points_earned, created_at, updated_at";

fn workflow_from_row(row: &Row<'_>) -> rusqlite::Result<WorkflowRecord> {
    Ok(WorkflowRecord {
        id: row.get(0)?,
        family: row.get(1)?,
        subject: reference_at(row, 2)?,
        status: row.get(4)?,
        progress: row.get(5)?,
        value: row.get(6)?,
        reviewer: optional_reference_at(row, 7)?,
        submitted_at: row.get(9)?,
        reviewed_at: row.get(10)?,
        decided_at: row.get(11)?,
        completed_at: row.get(12)?,
        expires_at: row.get(13)?,
        notes: row.get(14)?,
        rejection_reason: row.get(15)?,
        score: row.get(16)?,
        points_earned: row.get(17)?,
        created_at: row.get(18)?,
        updated_at: row.get(19)?,
    })
}

fn save(conn: &Connection, record: &WorkflowRecord) -> rusqlite::Result<()> {
    conn.execute(
        &format!(
            "INSERT OR REPLACE INTO workflows ({}) VALUES
             (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20)",
            COLUMNS
        ),
        params![
            record.id,
            record.family,
            record.subject.kind(),
            record.subject.id(),
            record.status,
            record.progress,
            record.value,
            record.reviewer.as_ref().map(|r| r.kind().as_str()),
            record.reviewer.as_ref().map(|r| r.id()),
            record.submitted_at,
            record.reviewed_at,
            record.decided_at,
            record.completed_at,
            record.expires_at,
            record.notes,
            record.rejection_reason,
            record.score,
            record.points_earned,
            record.created_at,
            record.updated_at,
        ],
    )?;
    Ok(())
}

fn find(conn: &Connection, id: &RecordId) -> rusqlite::Result<Option<WorkflowRecord>> {
    conn.query_row(
        &format!("SELECT {} FROM workflows WHERE id = ?1", COLUMNS),
        params![id],
        workflow_from_row,
    )
    .optional()
}

fn query_list(
    conn: &Connection,
    sql: &str,
    params: &[&dyn rusqlite::ToSql],
) -> rusqlite::Result<Vec<WorkflowRecord>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params, workflow_from_row)?;
    rows.collect()
}

impl Store {
    /// Create a workflow record for `subject` in its family's initial status
    pub fn create_workflow(
        &mut self,
        family: WorkflowFamily,
        subject: &EntityReference,
    ) -> Result<WorkflowRecord, WorkflowError> {
        let record = WorkflowRecord::new(family, subject.clone(), self.clock.now());
        save(&self.conn, &record)?;
        info!(id = %record.id, %family, %subject, "workflow created");
        Ok(record)
    }

    /// Look up a workflow record by id
    pub fn workflow(&self, id: &RecordId) -> Result<Option<WorkflowRecord>, WorkflowError> {
        Ok(find(&self.conn, id)?)
    }

    /// Every workflow record about `subject`, oldest first
    pub fn workflows_for(
        &self,
        subject: &EntityReference,
    ) -> Result<Vec<WorkflowRecord>, WorkflowError> {
        let sql = format!(
            "SELECT {} FROM workflows
             WHERE subject_kind = ?1 AND subject_id = ?2
             ORDER BY created_at, id",
            COLUMNS
        );
        Ok(query_list(&self.conn, &sql, params![subject.kind(), subject.id()])?)
    }

    /// Every workflow record, optionally only those in `status`
    pub fn list_workflows(
        &self,
        status: Option<WorkflowStatus>,
    ) -> Result<Vec<WorkflowRecord>, WorkflowError> {
        let sql = format!(
            "SELECT {} FROM workflows
             WHERE (?1 IS NULL OR status = ?1)
             ORDER BY created_at, id",
            COLUMNS
        );
        Ok(query_list(&self.conn, &sql, params![status])?)
    }

    /// Delete a workflow record; returns whether it existed
    pub fn delete_workflow(&mut self, id: &RecordId) -> Result<bool, WorkflowError> {
        let removed = self
            .conn
            .execute("DELETE FROM workflows WHERE id = ?1", params![id])?;
        Ok(removed > 0)
    }

    /// Load a record, apply `apply` and save the result in one transaction
    ///
    /// If `apply` fails nothing is written.
    pub fn transition<F>(&mut self, id: &RecordId, apply: F) -> Result<WorkflowRecord, WorkflowError>
    where
        F: FnOnce(&WorkflowRecord, DateTime<Utc>) -> Result<WorkflowRecord, WorkflowError>,
    {
        self.apply_to_workflow(id, |record, now| {
            let next = apply(record, now)?;
            Ok((next.clone(), next))
        })
    }

    /// Set progress on a progress-family record, completing it (and
    /// awarding points once) when progress reaches 100
    pub fn update_progress(
        &mut self,
        engine: &WorkflowEngine,
        id: &RecordId,
        progress: i64,
        value: Option<f64>,
        scorer: &dyn Scorer,
    ) -> Result<ProgressOutcome, WorkflowError> {
        self.apply_to_workflow(id, |record, now| {
            let outcome = engine.update_progress(record, progress, value, scorer, now)?;
            Ok((outcome.record.clone(), outcome))
        })
    }

    fn apply_to_workflow<T, F>(&mut self, id: &RecordId, apply: F) -> Result<T, WorkflowError>
    where
        F: FnOnce(&WorkflowRecord, DateTime<Utc>) -> Result<(WorkflowRecord, T), WorkflowError>,
    {
        let now = self.clock.now();
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let current = find(&tx, id)?.ok_or(WorkflowError::NotFound(*id))?;
        let (next, output) = apply(&current, now)?;
        if next != current {
            save(&tx, &next)?;
        }
        tx.commit()?;

        debug!(%id, from = %current.status, to = %next.status, "workflow saved");
        Ok(output)
    }
}

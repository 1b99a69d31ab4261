//! Association operations on the store

use std::collections::HashSet;

use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use tracing::{debug, error};

use super::serialize::reference_at;
use super::Store;
use crate::core::association::{
    normalize_usage, sort_for_rendering, Association, AssociationError, AssociationId,
    AttachOptions,
};
use crate::core::identity::{RecordId, RecordPrefix};
use crate::core::reference::{EntityKind, EntityReference};

const COLUMNS: &str =
    "id, label_kind, label_id, target_kind, target_id, usage, is_primary, sort_order, created_at, seq";

fn association_from_row(row: &Row<'_>) -> rusqlite::Result<Association> {
    Ok(Association {
        id: row.get(0)?,
        label: reference_at(row, 1)?,
        target: reference_at(row, 3)?,
        usage: row.get(5)?,
        is_primary: row.get(6)?,
        sort_order: row.get(7)?,
        created_at: row.get(8)?,
        seq: row.get(9)?,
    })
}

fn load(conn: &Connection, id: &AssociationId) -> Result<Association, AssociationError> {
    find(conn, id)?.ok_or_else(|| AssociationError::NotFound(*id))
}

fn find(conn: &Connection, id: &AssociationId) -> rusqlite::Result<Option<Association>> {
    conn.query_row(
        &format!("SELECT {} FROM associations WHERE id = ?1", COLUMNS),
        params![id],
        association_from_row,
    )
    .optional()
}

/// Id of the association for this (label, target, usage) triple, if any
fn find_triple(
    conn: &Connection,
    label: &EntityReference,
    target: &EntityReference,
    usage: Option<&str>,
) -> rusqlite::Result<Option<AssociationId>> {
    conn.query_row(
        "SELECT id FROM associations
         WHERE label_kind = ?1 AND label_id = ?2 AND target_kind = ?3 AND target_id = ?4
           AND COALESCE(usage, '') = COALESCE(?5, '')",
        params![label.kind(), label.id(), target.kind(), target.id(), usage],
        |row| row.get(0),
    )
    .optional()
}

/// Demote every primary association of `label_kind` on `target`
fn demote_primaries(
    conn: &Connection,
    label_kind: &EntityKind,
    target: &EntityReference,
) -> rusqlite::Result<usize> {
    conn.execute(
        "UPDATE associations SET is_primary = 0
         WHERE target_kind = ?1 AND target_id = ?2 AND label_kind = ?3 AND is_primary = 1",
        params![target.kind(), target.id(), label_kind],
    )
}

fn next_sort_order(
    conn: &Connection,
    target: &EntityReference,
) -> Result<i64, AssociationError> {
    let max: Option<i64> = conn.query_row(
        "SELECT MAX(sort_order) FROM associations WHERE target_kind = ?1 AND target_id = ?2",
        params![target.kind(), target.id()],
        |row| row.get(0),
    )?;
    match max {
        None => Ok(0),
        Some(max) => max.checked_add(1).ok_or_else(|| AssociationError::OrderOverflow {
            target: target.clone(),
            max,
        }),
    }
}

fn query_list(
    conn: &Connection,
    sql: &str,
    params: &[&dyn rusqlite::ToSql],
) -> rusqlite::Result<Vec<Association>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params, association_from_row)?;
    rows.collect()
}

fn for_target(
    conn: &Connection,
    target: &EntityReference,
    label_kind: Option<&EntityKind>,
) -> rusqlite::Result<Vec<Association>> {
    let sql = format!(
        "SELECT {} FROM associations
         WHERE target_kind = ?1 AND target_id = ?2 AND (?3 IS NULL OR label_kind = ?3)",
        COLUMNS
    );
    let mut list = query_list(conn, &sql, params![target.kind(), target.id(), label_kind])?;
    sort_for_rendering(&mut list);
    Ok(list)
}

impl Store {
    /// Link `label` to `target`
    ///
    /// Fails with `DuplicateAssociation` if the (label, target, usage)
    /// triple is already recorded. With `make_primary`, any existing primary
    /// of the same label kind on the target is demoted in the same
    /// transaction.
    pub fn attach(
        &mut self,
        label: &EntityReference,
        target: &EntityReference,
        options: AttachOptions,
    ) -> Result<Association, AssociationError> {
        let now = self.clock.now();
        let usage = normalize_usage(options.usage);

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        if find_triple(&tx, label, target, usage.as_deref())?.is_some() {
            return Err(AssociationError::DuplicateAssociation {
                label: label.clone(),
                target: target.clone(),
                usage,
            });
        }

        if options.make_primary {
            demote_primaries(&tx, label.kind(), target)?;
        }

        let sort_order = match options.order {
            Some(order) => order,
            None => next_sort_order(&tx, target)?,
        };

        let id = RecordId::new(RecordPrefix::Asc);
        tx.execute(
            "INSERT INTO associations
                (id, label_kind, label_id, target_kind, target_id, usage, is_primary, sort_order, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                id,
                label.kind(),
                label.id(),
                target.kind(),
                target.id(),
                usage,
                options.make_primary,
                sort_order,
                now,
            ],
        )?;
        let seq = tx.last_insert_rowid();
        tx.commit()?;

        debug!(%id, %label, %target, usage = ?usage, primary = options.make_primary, "attached label");
        Ok(Association {
            id,
            label: label.clone(),
            target: target.clone(),
            usage,
            is_primary: options.make_primary,
            sort_order,
            created_at: now,
            seq,
        })
    }

    /// Remove the association for the (label, target, usage) triple
    ///
    /// Returns whether anything was removed; detaching a missing association
    /// is not an error.
    pub fn detach(
        &mut self,
        label: &EntityReference,
        target: &EntityReference,
        usage: Option<&str>,
    ) -> Result<bool, AssociationError> {
        let usage = normalize_usage(usage.map(str::to_string));
        let removed = self.conn.execute(
            "DELETE FROM associations
             WHERE label_kind = ?1 AND label_id = ?2 AND target_kind = ?3 AND target_id = ?4
               AND COALESCE(usage, '') = COALESCE(?5, '')",
            params![label.kind(), label.id(), target.kind(), target.id(), usage],
        )?;
        if removed > 0 {
            debug!(%label, %target, usage = ?usage, "detached label");
        }
        Ok(removed > 0)
    }

    /// Associations on `target` in rendering order, optionally restricted to
    /// one label kind
    pub fn list_for_target(
        &self,
        target: &EntityReference,
        label_kind: Option<&EntityKind>,
    ) -> Result<Vec<Association>, AssociationError> {
        Ok(for_target(&self.conn, target, label_kind)?)
    }

    /// The primary association of `label_kind` on `target`
    ///
    /// More than one primary is reported as `InconsistentState` rather than
    /// silently picking one.
    pub fn primary_for(
        &self,
        target: &EntityReference,
        label_kind: &EntityKind,
    ) -> Result<Option<Association>, AssociationError> {
        let sql = format!(
            "SELECT {} FROM associations
             WHERE target_kind = ?1 AND target_id = ?2 AND label_kind = ?3 AND is_primary = 1",
            COLUMNS
        );
        let mut primaries =
            query_list(&self.conn, &sql, params![target.kind(), target.id(), label_kind])?;

        if primaries.len() > 1 {
            error!(
                %target,
                label_kind = %label_kind,
                count = primaries.len(),
                "multiple primary associations"
            );
            return Err(AssociationError::InconsistentState {
                target: target.clone(),
                label_kind: label_kind.clone(),
                count: primaries.len(),
            });
        }
        Ok(primaries.pop())
    }

    /// Rewrite the sort order of every association on `target`
    ///
    /// `ids` must name each of the target's associations exactly once; the
    /// position in the slice becomes the new `sort_order`.
    pub fn reorder(
        &mut self,
        target: &EntityReference,
        ids: &[AssociationId],
    ) -> Result<Vec<Association>, AssociationError> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let existing: HashSet<AssociationId> = for_target(&tx, target, None)?
            .into_iter()
            .map(|a| a.id)
            .collect();
        let requested: HashSet<&AssociationId> = ids.iter().collect();

        if requested.len() != ids.len() {
            return Err(AssociationError::InvalidReorder {
                target: target.clone(),
                reason: "duplicate association ids".to_string(),
            });
        }
        if let Some(unknown) = ids.iter().find(|id| !existing.contains(*id)) {
            return Err(AssociationError::InvalidReorder {
                target: target.clone(),
                reason: format!("{} is not associated with this target", unknown),
            });
        }
        if ids.len() != existing.len() {
            return Err(AssociationError::InvalidReorder {
                target: target.clone(),
                reason: format!(
                    "expected {} association ids, got {}",
                    existing.len(),
                    ids.len()
                ),
            });
        }

        for (position, id) in ids.iter().enumerate() {
            tx.execute(
                "UPDATE associations SET sort_order = ?1 WHERE id = ?2",
                params![position as i64, id],
            )?;
        }
        let list = for_target(&tx, target, None)?;
        tx.commit()?;

        debug!(%target, count = list.len(), "reordered associations");
        Ok(list)
    }

    /// Make an association the primary of its label kind on its target
    pub fn set_primary(&mut self, id: &AssociationId) -> Result<Association, AssociationError> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let association = load(&tx, id)?;
        demote_primaries(&tx, association.label.kind(), &association.target)?;
        tx.execute(
            "UPDATE associations SET is_primary = 1 WHERE id = ?1",
            params![id],
        )?;
        tx.commit()?;

        debug!(%id, target = %association.target, "promoted to primary");
        Ok(Association {
            is_primary: true,
            ..association
        })
    }

    /// Clear the primary flag on an association
    pub fn clear_primary(&mut self, id: &AssociationId) -> Result<Association, AssociationError> {
        let updated = self.conn.execute(
            "UPDATE associations SET is_primary = 0 WHERE id = ?1",
            params![id],
        )?;
        if updated == 0 {
            return Err(AssociationError::NotFound(*id));
        }
        load(&self.conn, id)
    }

    /// Change the usage of an association
    ///
    /// Fails with `DuplicateAssociation` if another association already
    /// holds the new (label, target, usage) triple.
    pub fn set_usage(
        &mut self,
        id: &AssociationId,
        usage: Option<&str>,
    ) -> Result<Association, AssociationError> {
        let usage = normalize_usage(usage.map(str::to_string));
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let association = load(&tx, id)?;
        if let Some(other) = find_triple(
            &tx,
            &association.label,
            &association.target,
            usage.as_deref(),
        )? {
            if &other != id {
                return Err(AssociationError::DuplicateAssociation {
                    label: association.label,
                    target: association.target,
                    usage,
                });
            }
        }

        tx.execute(
            "UPDATE associations SET usage = ?1 WHERE id = ?2",
            params![usage, id],
        )?;
        tx.commit()?;

        Ok(Association {
            usage,
            ..association
        })
    }

    /// Look up an association by id
    pub fn association(&self, id: &AssociationId) -> Result<Option<Association>, AssociationError> {
        Ok(find(&self.conn, id)?)
    }

    /// Every association carrying `label`, oldest first
    pub fn list_for_label(
        &self,
        label: &EntityReference,
    ) -> Result<Vec<Association>, AssociationError> {
        let sql = format!(
            "SELECT {} FROM associations
             WHERE label_kind = ?1 AND label_id = ?2
             ORDER BY created_at, seq",
            COLUMNS
        );
        Ok(query_list(&self.conn, &sql, params![label.kind(), label.id()])?)
    }

    /// Number of distinct targets per label of `label_kind`, most used first
    pub fn label_counts(
        &self,
        label_kind: &EntityKind,
    ) -> Result<Vec<(EntityReference, usize)>, AssociationError> {
        let mut stmt = self.conn.prepare(
            "SELECT label_kind, label_id, COUNT(DISTINCT target_kind || ':' || target_id) AS uses
             FROM associations
             WHERE label_kind = ?1
             GROUP BY label_kind, label_id
             ORDER BY uses DESC, label_id ASC",
        )?;
        let rows = stmt.query_map(params![label_kind], |row| {
            let label = reference_at(row, 0)?;
            let uses: i64 = row.get(2)?;
            Ok((label, uses as usize))
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Drop every association where `entity` is either the label or the
    /// target; call when the entity itself is deleted
    pub fn remove_entity(&mut self, entity: &EntityReference) -> Result<usize, AssociationError> {
        let removed = self.conn.execute(
            "DELETE FROM associations
             WHERE (label_kind = ?1 AND label_id = ?2) OR (target_kind = ?1 AND target_id = ?2)",
            params![entity.kind(), entity.id()],
        )?;
        debug!(%entity, removed, "removed associations for entity");
        Ok(removed)
    }
}

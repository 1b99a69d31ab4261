//! SQLite serialization for typed values
//!
//! Implements ToSql and FromSql for WorkflowStatus, WorkflowFamily,
//! EntityKind and RecordId so they are stored as text and read back typed.

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, Type, ValueRef};
use rusqlite::Row;

use crate::core::identity::RecordId;
use crate::core::reference::{EntityKind, EntityReference};
use crate::core::status::{WorkflowFamily, WorkflowStatus};

fn invalid_text(e: String) -> FromSqlError {
    FromSqlError::Other(Box::new(std::io::Error::new(
        std::io::ErrorKind::InvalidData,
        e,
    )))
}

// =========================================================================
// WorkflowStatus - ToSql/FromSql
// =========================================================================

impl ToSql for WorkflowStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for WorkflowStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value.as_str()?.parse().map_err(invalid_text)
    }
}

// =========================================================================
// WorkflowFamily - ToSql/FromSql
// =========================================================================

impl ToSql for WorkflowFamily {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for WorkflowFamily {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value.as_str()?.parse().map_err(invalid_text)
    }
}

// =========================================================================
// EntityKind - ToSql/FromSql
// =========================================================================

impl ToSql for EntityKind {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for EntityKind {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        EntityKind::new(value.as_str()?).map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

// =========================================================================
// RecordId - ToSql/FromSql
// =========================================================================

impl ToSql for RecordId {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.to_string()))
    }
}

impl FromSql for RecordId {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

// =========================================================================
// EntityReference - stored as a (kind, id) column pair
// =========================================================================

/// Read a reference from two adjacent columns
pub(crate) fn reference_at(row: &Row<'_>, kind_idx: usize) -> rusqlite::Result<EntityReference> {
    let kind: EntityKind = row.get(kind_idx)?;
    let id: i64 = row.get(kind_idx + 1)?;
    EntityReference::from_parts(kind, id)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(kind_idx + 1, Type::Integer, Box::new(e)))
}

/// Read an optional reference; both columns NULL means none
pub(crate) fn optional_reference_at(
    row: &Row<'_>,
    kind_idx: usize,
) -> rusqlite::Result<Option<EntityReference>> {
    let kind: Option<EntityKind> = row.get(kind_idx)?;
    let id: Option<i64> = row.get(kind_idx + 1)?;
    match (kind, id) {
        (Some(kind), Some(id)) => EntityReference::from_parts(kind, id)
            .map(Some)
            .map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(kind_idx + 1, Type::Integer, Box::new(e))
            }),
        _ => Ok(None),
    }
}

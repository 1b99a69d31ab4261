//! SQLite-backed store for associations and workflow records
//!
//! Every mutation runs inside an IMMEDIATE transaction so the check and the
//! write it guards (duplicate detection, primary demotion, reordering,
//! workflow transitions) are atomic with respect to other writers.

mod associations;
mod serialize;
mod workflows;

use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use tracing::debug;

use crate::core::clock::{Clock, SystemClock};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS associations (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    id TEXT NOT NULL UNIQUE,
    label_kind TEXT NOT NULL,
    label_id INTEGER NOT NULL,
    target_kind TEXT NOT NULL,
    target_id INTEGER NOT NULL,
    usage TEXT,
    is_primary INTEGER NOT NULL DEFAULT 0,
    sort_order INTEGER NOT NULL,
    created_at TEXT NOT NULL
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_associations_unique
    ON associations(label_kind, label_id, target_kind, target_id, COALESCE(usage, ''));
CREATE INDEX IF NOT EXISTS idx_associations_target
    ON associations(target_kind, target_id);
CREATE INDEX IF NOT EXISTS idx_associations_label
    ON associations(label_kind, label_id);

CREATE TABLE IF NOT EXISTS workflows (
    id TEXT PRIMARY KEY,
    family TEXT NOT NULL,
    subject_kind TEXT NOT NULL,
    subject_id INTEGER NOT NULL,
    status TEXT NOT NULL,
    progress INTEGER NOT NULL DEFAULT 0,
    value REAL,
    reviewer_kind TEXT,
    reviewer_id INTEGER,
    submitted_at TEXT,
    reviewed_at TEXT,
    decided_at TEXT,
    completed_at TEXT,
    expires_at TEXT,
    notes TEXT,
    rejection_reason TEXT,
    score INTEGER,
    points_earned INTEGER,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_workflows_subject
    ON workflows(subject_kind, subject_id);
CREATE INDEX IF NOT EXISTS idx_workflows_status
    ON workflows(status);
";

/// Persistent store for associations and workflow records
pub struct Store {
    conn: Connection,
    clock: Box<dyn Clock>,
}

impl Store {
    /// Open (or create) the database at `path`
    pub fn open(path: &Path) -> Result<Self, rusqlite::Error> {
        let conn = Connection::open(path)?;
        // Concurrent writers wait for each other instead of failing
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        let store = Self::from_connection(conn)?;
        debug!(path = %path.display(), "store opened");
        Ok(store)
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> Result<Self, rusqlite::Error> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, rusqlite::Error> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn,
            clock: Box::new(SystemClock),
        })
    }

    /// Replace the time source used to stamp records
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Current time according to the store's clock
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// View log — append-only SQLite record of who opened which document.
//
// Schema:
//   document_views(
//     id          INTEGER PRIMARY KEY AUTOINCREMENT,
//     document_id TEXT    NOT NULL,   -- UUID
//     viewer_id   TEXT    NOT NULL,   -- UUID
//     viewed_at   TEXT    NOT NULL,   -- RFC 3339
//     ip_address  TEXT                -- optional, as reported by the session
//   )

use std::path::Path;
use std::sync::Mutex;

use rusqlite::{Connection, params};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use vitrine_core::error::{Result, VitrineError};
use vitrine_core::types::{DocumentId, ViewEvent};

fn db_err(e: rusqlite::Error) -> VitrineError {
    VitrineError::Database(e.to_string())
}

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS document_views (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    document_id TEXT    NOT NULL,
    viewer_id   TEXT    NOT NULL,
    viewed_at   TEXT    NOT NULL,
    ip_address  TEXT
);
CREATE INDEX IF NOT EXISTS idx_document_views_document
    ON document_views (document_id);";

/// Sink for "viewed" events.
///
/// Callers treat recording as fire-and-forget: an error is logged and the
/// viewer carries on.
pub trait ViewRecorder: Send + Sync {
    fn record(&self, event: &ViewEvent) -> Result<()>;
}

/// One stored row, used for queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewEntry {
    pub id: i64,
    pub document_id: String,
    pub viewer_id: String,
    pub viewed_at: String,
    pub ip_address: Option<String>,
}

/// `ViewRecorder` backed by a SQLite database.
pub struct SqliteViewLog {
    conn: Mutex<Connection>,
}

impl SqliteViewLog {
    /// Open (or create) the view log at `path`, in WAL mode.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path).map_err(db_err)?;
        conn.execute_batch("PRAGMA journal_mode = WAL;")
            .map_err(db_err)?;
        conn.execute_batch(SCHEMA).map_err(db_err)?;

        debug!("view log opened");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(db_err)?;
        conn.execute_batch(SCHEMA).map_err(db_err)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Views of one document, oldest first.
    pub fn views_for_document(&self, document_id: &DocumentId) -> Result<Vec<ViewEntry>> {
        let conn = self.conn.lock().expect("view log lock poisoned");
        let mut stmt = conn
            .prepare(
                "SELECT id, document_id, viewer_id, viewed_at, ip_address
                 FROM document_views
                 WHERE document_id = ?1
                 ORDER BY id ASC",
            )
            .map_err(db_err)?;

        let rows = stmt
            .query_map(params![document_id.to_string()], row_to_entry)
            .map_err(db_err)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(db_err)
    }

    /// The most recent `limit` views across all documents, newest first.
    pub fn recent_views(&self, limit: u32) -> Result<Vec<ViewEntry>> {
        let conn = self.conn.lock().expect("view log lock poisoned");
        let mut stmt = conn
            .prepare(
                "SELECT id, document_id, viewer_id, viewed_at, ip_address
                 FROM document_views
                 ORDER BY id DESC
                 LIMIT ?1",
            )
            .map_err(db_err)?;

        let rows = stmt.query_map(params![limit], row_to_entry).map_err(db_err)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(db_err)
    }

    pub fn view_count(&self, document_id: &DocumentId) -> Result<u64> {
        let conn = self.conn.lock().expect("view log lock poisoned");
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM document_views WHERE document_id = ?1",
                params![document_id.to_string()],
                |row| row.get(0),
            )
            .map_err(db_err)?;
        Ok(count as u64)
    }
}

fn row_to_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<ViewEntry> {
    Ok(ViewEntry {
        id: row.get(0)?,
        document_id: row.get(1)?,
        viewer_id: row.get(2)?,
        viewed_at: row.get(3)?,
        ip_address: row.get(4)?,
    })
}

impl ViewRecorder for SqliteViewLog {
    #[instrument(skip_all, fields(document = %event.document_id))]
    fn record(&self, event: &ViewEvent) -> Result<()> {
        let conn = self.conn.lock().expect("view log lock poisoned");
        conn.execute(
            "INSERT INTO document_views (document_id, viewer_id, viewed_at, ip_address)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                event.document_id.to_string(),
                event.viewer_id.to_string(),
                event.viewed_at.to_rfc3339(),
                event.ip_address.map(|ip| ip.to_string()),
            ],
        )
        .map_err(|e| VitrineError::ViewLog(e.to_string()))?;

        debug!("view recorded");
        Ok(())
    }
}

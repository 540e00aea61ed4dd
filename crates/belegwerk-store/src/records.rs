// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Confirmed records, stored in SQLite.
//
// The field set is kept as JSON (tagged by domain) so both document families
// share one table. Media bytes are not stored here; a record only carries the
// URL and SHA-256 of its original.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{Connection, params};
use tracing::{debug, info, instrument};

use belegwerk_core::error::{BelegwerkError, Result};
use belegwerk_core::types::{
    DocumentDomain, ExtractionResult, NewRecord, RecordId, RecordStatus, TargetPeriod,
};

const CREATE_TABLE_SQL: &str = r#"
    CREATE TABLE IF NOT EXISTS records (
        id TEXT PRIMARY KEY,
        domain TEXT NOT NULL,
        fields TEXT NOT NULL,
        period TEXT NOT NULL,
        status TEXT NOT NULL,
        original_url TEXT,
        media_hash TEXT,
        created_at TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS records_period ON records (period);
"#;

const SELECT_COLUMNS: &str =
    "SELECT id, domain, fields, period, status, original_url, media_hash, created_at FROM records";

/// A record as read back from the database.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord {
    pub id: RecordId,
    pub domain: DocumentDomain,
    pub fields: ExtractionResult,
    pub period: TargetPeriod,
    pub status: RecordStatus,
    pub original_url: Option<String>,
    pub media_hash: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// SQLite-backed record table.
///
/// `rusqlite` is synchronous; calls are short local writes and run inline.
pub struct SqliteRecordStore {
    conn: Mutex<Connection>,
}

impl SqliteRecordStore {
    /// Open (or create) the database at `path` in WAL mode.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path.as_ref())
            .map_err(|e| BelegwerkError::Database(format!("open: {e}")))?;
        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(|e| BelegwerkError::Database(format!("WAL pragma: {e}")))?;
        conn.execute_batch(CREATE_TABLE_SQL)
            .map_err(|e| BelegwerkError::Database(format!("create table: {e}")))?;

        info!("record database opened");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| BelegwerkError::Database(format!("open in-memory: {e}")))?;
        conn.execute_batch(CREATE_TABLE_SQL)
            .map_err(|e| BelegwerkError::Database(format!("create table: {e}")))?;

        debug!("in-memory record database opened");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().expect("record database lock poisoned")
    }

    /// Insert a committed record and return its new id.
    #[instrument(skip_all, fields(domain = record.fields.domain().as_str(), period = %record.period))]
    pub fn insert(&self, record: &NewRecord) -> Result<RecordId> {
        let id = RecordId::new();
        let fields_json = serde_json::to_string(&record.fields)?;

        self.conn()
            .execute(
                "INSERT INTO records (id, domain, fields, period, status, original_url, media_hash, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    id.to_string(),
                    record.fields.domain().as_str(),
                    fields_json,
                    record.period.to_string(),
                    record.status.as_str(),
                    record.original_url,
                    record.media_hash,
                    Utc::now().to_rfc3339(),
                ],
            )
            .map_err(|e| BelegwerkError::Database(format!("insert record: {e}")))?;

        info!(record_id = %id, "record stored");
        Ok(id)
    }

    #[instrument(skip(self), fields(record_id = %id))]
    pub fn get_record(&self, id: &RecordId) -> Result<Option<StoredRecord>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(&format!("{SELECT_COLUMNS} WHERE id = ?1"))
            .map_err(|e| BelegwerkError::Database(format!("prepare get_record: {e}")))?;
        let mut rows = stmt
            .query_map(params![id.to_string()], row_to_record)
            .map_err(|e| BelegwerkError::Database(format!("query get_record: {e}")))?;

        match rows.next() {
            Some(Ok(record)) => Ok(Some(record)),
            Some(Err(e)) => Err(BelegwerkError::Database(format!("row parse: {e}"))),
            None => Ok(None),
        }
    }

    /// Every record, newest first.
    pub fn all_records(&self) -> Result<Vec<StoredRecord>> {
        self.query(
            &format!("{SELECT_COLUMNS} ORDER BY created_at DESC, rowid DESC"),
            [],
        )
    }

    /// Records booked against `period`, newest first.
    pub fn records_for_period(&self, period: TargetPeriod) -> Result<Vec<StoredRecord>> {
        self.query(
            &format!("{SELECT_COLUMNS} WHERE period = ?1 ORDER BY created_at DESC, rowid DESC"),
            params![period.to_string()],
        )
    }

    /// Delete a record. Deleting a missing record is not an error.
    #[instrument(skip(self), fields(record_id = %id))]
    pub fn delete_record(&self, id: &RecordId) -> Result<()> {
        self.conn()
            .execute("DELETE FROM records WHERE id = ?1", params![id.to_string()])
            .map_err(|e| BelegwerkError::Database(format!("delete record: {e}")))?;
        info!(record_id = %id, "record deleted");
        Ok(())
    }

    pub fn count(&self) -> Result<usize> {
        let count: i64 = self
            .conn()
            .query_row("SELECT COUNT(*) FROM records", [], |row| row.get(0))
            .map_err(|e| BelegwerkError::Database(format!("count: {e}")))?;
        Ok(count as usize)
    }

    fn query(&self, sql: &str, params: impl rusqlite::Params) -> Result<Vec<StoredRecord>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(sql)
            .map_err(|e| BelegwerkError::Database(format!("prepare: {e}")))?;
        let records = stmt
            .query_map(params, row_to_record)
            .map_err(|e| BelegwerkError::Database(format!("query: {e}")))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| BelegwerkError::Database(format!("collect rows: {e}")))?;

        debug!(count = records.len(), "records retrieved");
        Ok(records)
    }
}

// ---------------------------------------------------------------------------
// Row mapping
// ---------------------------------------------------------------------------

fn conversion_error(
    column: usize,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, Box::new(err))
}

#[derive(Debug)]
struct BadValue(String);

impl std::fmt::Display for BadValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unrecognised value {:?}", self.0)
    }
}

impl std::error::Error for BadValue {}

/// Column order must match `SELECT_COLUMNS`.
fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<StoredRecord> {
    let id_str: String = row.get(0)?;
    let domain_str: String = row.get(1)?;
    let fields_json: String = row.get(2)?;
    let period_str: String = row.get(3)?;
    let status_str: String = row.get(4)?;
    let original_url: Option<String> = row.get(5)?;
    let media_hash: Option<String> = row.get(6)?;
    let created_at_str: String = row.get(7)?;

    let uuid = uuid::Uuid::parse_str(&id_str).map_err(|e| conversion_error(0, e))?;
    let domain = DocumentDomain::parse(&domain_str).ok_or_else(|| conversion_error(1, BadValue(domain_str)))?;
    let fields: ExtractionResult =
        serde_json::from_str(&fields_json).map_err(|e| conversion_error(2, e))?;
    let period = TargetPeriod::parse(&period_str).ok_or_else(|| conversion_error(3, BadValue(period_str)))?;
    let status = RecordStatus::parse(&status_str).ok_or_else(|| conversion_error(4, BadValue(status_str)))?;
    let created_at = DateTime::parse_from_rfc3339(&created_at_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(7, e))?;

    Ok(StoredRecord {
        id: RecordId(uuid),
        domain,
        fields,
        period,
        status,
        original_url,
        media_hash,
        created_at,
    })
}

//! Run repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist one row per run key, merging repeated saves.
//! - Serve the two read paths the engine needs: a `saved_at` window for
//!   monthly reports and the most recent runs for rewrite seeding.
//!
//! # Invariants
//! - `upsert_run` never clears a stored field with an absent one.
//! - Range bounds are inclusive and compared as RFC 3339 UTC strings.

use crate::db::DbError;
use crate::model::run_record::RunRecord;
use rusqlite::{params, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

const RUN_SELECT_SQL: &str = "SELECT
    run_key,
    topic,
    title,
    content,
    strategy_id,
    source_id,
    channel_id,
    created_at,
    saved_at,
    ymd
FROM content_engine_runs";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for run and insight persistence.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for run records.
pub trait RunRepository {
    /// Inserts or merges `record` by `run_key`.
    fn upsert_run(&self, record: &RunRecord) -> RepoResult<()>;
    fn get_run(&self, run_key: &str) -> RepoResult<Option<RunRecord>>;
    /// Runs with `start_iso <= saved_at <= end_iso`, oldest first.
    fn list_runs_saved_between(&self, start_iso: &str, end_iso: &str) -> RepoResult<Vec<RunRecord>>;
    /// Up to `limit` runs, newest `saved_at` first.
    fn list_recent_runs(&self, limit: u32) -> RepoResult<Vec<RunRecord>>;
}

/// SQLite-backed run repository.
pub struct SqliteRunRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRunRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl RunRepository for SqliteRunRepository<'_> {
    fn upsert_run(&self, record: &RunRecord) -> RepoResult<()> {
        if record.run_key.trim().is_empty() {
            return Err(RepoError::InvalidData("run_key cannot be empty".to_string()));
        }

        self.conn.execute(
            "INSERT INTO content_engine_runs (
                run_key,
                topic,
                title,
                content,
                strategy_id,
                source_id,
                channel_id,
                created_at,
                saved_at,
                ymd
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            ON CONFLICT(run_key) DO UPDATE SET
                topic = COALESCE(excluded.topic, topic),
                title = COALESCE(excluded.title, title),
                content = COALESCE(excluded.content, content),
                strategy_id = COALESCE(excluded.strategy_id, strategy_id),
                source_id = COALESCE(excluded.source_id, source_id),
                channel_id = COALESCE(excluded.channel_id, channel_id),
                created_at = COALESCE(excluded.created_at, created_at),
                saved_at = excluded.saved_at,
                ymd = COALESCE(excluded.ymd, ymd);",
            params![
                record.run_key.as_str(),
                record.topic.as_deref(),
                record.title.as_deref(),
                record.content.as_deref(),
                record.strategy_id.as_deref(),
                record.source_id.as_deref(),
                record.channel_id.as_deref(),
                record.created_at.as_deref(),
                record.saved_at.as_str(),
                record.ymd.as_deref(),
            ],
        )?;

        Ok(())
    }

    fn get_run(&self, run_key: &str) -> RepoResult<Option<RunRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{RUN_SELECT_SQL} WHERE run_key = ?1;"))?;
        let mut rows = stmt.query([run_key])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_run_row(row)?));
        }
        Ok(None)
    }

    fn list_runs_saved_between(&self, start_iso: &str, end_iso: &str) -> RepoResult<Vec<RunRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "{RUN_SELECT_SQL}
             WHERE saved_at >= ?1 AND saved_at <= ?2
             ORDER BY saved_at ASC, run_key ASC;"
        ))?;
        let mut rows = stmt.query(params![start_iso, end_iso])?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(parse_run_row(row)?);
        }
        Ok(records)
    }

    fn list_recent_runs(&self, limit: u32) -> RepoResult<Vec<RunRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "{RUN_SELECT_SQL}
             ORDER BY saved_at DESC, run_key ASC
             LIMIT ?1;"
        ))?;
        let mut rows = stmt.query([i64::from(limit)])?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(parse_run_row(row)?);
        }
        Ok(records)
    }
}

fn parse_run_row(row: &Row<'_>) -> RepoResult<RunRecord> {
    Ok(RunRecord {
        run_key: row.get("run_key")?,
        topic: row.get("topic")?,
        title: row.get("title")?,
        content: row.get("content")?,
        strategy_id: row.get("strategy_id")?,
        source_id: row.get("source_id")?,
        channel_id: row.get("channel_id")?,
        created_at: row.get("created_at")?,
        saved_at: row.get("saved_at")?,
        ymd: row.get("ymd")?,
    })
}

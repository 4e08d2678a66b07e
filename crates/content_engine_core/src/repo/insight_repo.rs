//! Monthly insight repository.
//!
//! # Responsibility
//! - Store one JSON document per `YYYY-MM` month.
//! - Merge new top-level fields over an existing document on upsert.
//!
//! # Invariants
//! - Stored payloads are always JSON objects.
//! - Read-merge-write happens inside one transaction.

use crate::repo::run_repo::{RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::{Map, Value};

const DECIDED_AT_FIELD: &str = "decidedAt";

/// JSON object stored for one month.
pub type InsightDocument = Map<String, Value>;

/// Repository interface for monthly insight documents.
pub trait InsightRepository {
    /// Merges `payload` over the stored document for `month` and returns the result.
    fn upsert_insight(&self, month: &str, payload: &InsightDocument) -> RepoResult<InsightDocument>;
    fn get_insight(&self, month: &str) -> RepoResult<Option<InsightDocument>>;
}

/// SQLite-backed insight repository.
pub struct SqliteInsightRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteInsightRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl InsightRepository for SqliteInsightRepository<'_> {
    fn upsert_insight(&self, month: &str, payload: &InsightDocument) -> RepoResult<InsightDocument> {
        let tx = self.conn.unchecked_transaction()?;

        let existing: Option<String> = tx
            .query_row(
                "SELECT payload FROM monthly_insights WHERE month = ?1;",
                [month],
                |row| row.get(0),
            )
            .optional()?;

        let mut merged = match existing {
            Some(text) => parse_document(month, &text)?,
            None => Map::new(),
        };
        for (key, value) in payload {
            merged.insert(key.clone(), value.clone());
        }

        let decided_at = merged
            .get(DECIDED_AT_FIELD)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let text = serde_json::to_string(&merged)
            .map_err(|err| RepoError::InvalidData(format!("insight for {month}: {err}")))?;

        tx.execute(
            "INSERT INTO monthly_insights (month, payload, decided_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(month) DO UPDATE SET
                payload = excluded.payload,
                decided_at = excluded.decided_at;",
            params![month, text, decided_at],
        )?;
        tx.commit()?;

        Ok(merged)
    }

    fn get_insight(&self, month: &str) -> RepoResult<Option<InsightDocument>> {
        let stored: Option<String> = self
            .conn
            .query_row(
                "SELECT payload FROM monthly_insights WHERE month = ?1;",
                [month],
                |row| row.get(0),
            )
            .optional()?;

        stored
            .map(|text| parse_document(month, &text))
            .transpose()
    }
}

fn parse_document(month: &str, text: &str) -> RepoResult<InsightDocument> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(RepoError::InvalidData(format!(
            "insight for {month} is not a JSON object"
        ))),
        Err(err) => Err(RepoError::InvalidData(format!(
            "insight for {month} is not valid JSON: {err}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::{InsightDocument, InsightRepository, SqliteInsightRepository};
    use crate::db::open_db_in_memory;
    use serde_json::{json, Value};

    fn document(value: Value) -> InsightDocument {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn upsert_merges_top_level_fields() {
        let conn = open_db_in_memory().expect("db should open");
        let repo = SqliteInsightRepository::new(&conn);

        repo.upsert_insight(
            "2024-02",
            &document(json!({ "month": "2024-02", "notes": "first", "decisions": ["a"] })),
        )
        .expect("insert should succeed");
        let merged = repo
            .upsert_insight(
                "2024-02",
                &document(json!({ "notes": "second", "decidedAt": "2024-03-01T00:00:00.000Z" })),
            )
            .expect("merge should succeed");

        assert_eq!(merged["notes"], json!("second"));
        assert_eq!(merged["decisions"], json!(["a"]));

        let stored = repo
            .get_insight("2024-02")
            .expect("read should succeed")
            .expect("document should exist");
        assert_eq!(stored, merged);
    }

    #[test]
    fn missing_month_reads_as_none() {
        let conn = open_db_in_memory().expect("db should open");
        let repo = SqliteInsightRepository::new(&conn);
        assert!(repo
            .get_insight("1999-01")
            .expect("read should succeed")
            .is_none());
    }
}

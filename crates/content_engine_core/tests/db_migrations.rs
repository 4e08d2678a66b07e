use content_engine_core::db::migrations::latest_version;
use content_engine_core::{
    open_db, open_db_in_memory, DbError, RunRecord, RunRepository, SqliteRunRepository,
};
use rusqlite::Connection;

fn run(run_key: &str, title: Option<&str>, saved_at: &str) -> RunRecord {
    RunRecord {
        run_key: run_key.to_string(),
        topic: Some("Cable bags".to_string()),
        title: title.map(str::to_string),
        strategy_id: Some("quiet-spread".to_string()),
        saved_at: saved_at.to_string(),
        ..RunRecord::default()
    }
}

#[test]
fn fresh_store_has_run_and_insight_tables_with_range_index() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "content_engine_runs");
    assert_table_exists(&conn, "monthly_insights");
    assert_eq!(
        index_columns(&conn, "idx_content_engine_runs_saved_at"),
        vec!["saved_at".to_string()]
    );
}

#[test]
fn run_without_saved_at_is_rejected_by_schema() {
    let conn = open_db_in_memory().unwrap();

    let result = conn.execute(
        "INSERT INTO content_engine_runs (run_key) VALUES ('no-saved-at');",
        [],
    );
    assert!(result.is_err());
}

#[test]
fn merged_run_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("content_engine.sqlite3");
    let key = "2024-02-03__quiet-spread__keywords__discover__Cable%20bags";

    {
        let conn = open_db(&path).unwrap();
        let repo = SqliteRunRepository::new(&conn);
        repo.upsert_run(&run(key, Some("First title"), "2024-02-03T09:00:00.000Z"))
            .unwrap();
        repo.upsert_run(&run(key, None, "2024-02-03T18:00:00.000Z"))
            .unwrap();
    }

    let conn = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn), latest_version());
    let stored = SqliteRunRepository::new(&conn).get_run(key).unwrap().unwrap();
    assert_eq!(stored.title.as_deref(), Some("First title"));
    assert_eq!(stored.saved_at, "2024-02-03T18:00:00.000Z");
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM content_engine_runs;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 1);
}

#[test]
fn store_written_by_newer_build_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.sqlite3");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    assert_eq!(err.code(), "schema_too_new");
    match err {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn index_columns(conn: &Connection, index_name: &str) -> Vec<String> {
    let mut stmt = conn
        .prepare("SELECT name FROM pragma_index_info(?1) ORDER BY seqno;")
        .unwrap();
    let rows = stmt
        .query_map([index_name], |row| row.get::<_, String>(0))
        .unwrap();
    rows.collect::<Result<Vec<_>, _>>().unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}

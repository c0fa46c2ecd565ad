//! Shared helpers for integration tests across the workspace.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::Value;

use validtime_core::config::StorageConfig;
use validtime_core::{InstantKind, RangeSubtype, TemporalKind};
use validtime_storage::{
    ColumnDef, ITemporalStore, SqliteStore, TabularSource, TemporalColumn, TemporalTable,
};

pub type MemorySource = TabularSource<Cursor<Vec<u8>>>;

/// Fresh in-memory store with range functions registered.
pub fn memory_store() -> SqliteStore {
    SqliteStore::open_in_memory(&StorageConfig::default()).expect("open in-memory store")
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

/// Instant from any text the instant parser accepts.
pub fn instant(text: &str) -> DateTime<Utc> {
    InstantKind::parse_value(text).expect("valid instant")
}

/// Snapshot source over in-memory CSV text, empty cells as NULL.
pub fn csv_source(text: &str) -> MemorySource {
    TabularSource::from_reader(Cursor::new(text.as_bytes().to_vec()), "")
        .expect("valid snapshot header")
}

/// Write a snapshot file under `dir`.
pub fn write_snapshot(dir: &Path, name: &str, text: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, text).expect("write snapshot");
    path
}

pub fn temp_dir() -> tempfile::TempDir {
    tempfile::tempdir().expect("create temp dir")
}

/// Table with the given plain columns, a `valid` range column and
/// sequenced plus current uniqueness over `keys`.
pub fn keyed_table(
    name: &str,
    subtype: RangeSubtype,
    columns: &[(&str, &str)],
    keys: &[&str],
) -> TemporalTable {
    columns
        .iter()
        .fold(
            TemporalTable::new(name, TemporalColumn::new("valid", subtype)),
            |table, (col, ty)| table.column(ColumnDef::new(*col, *ty)),
        )
        .sequenced_unique(keys)
        .current_unique(keys)
}

/// The `category` fixture: `cat` categories over instants.
///
/// | id | cat | valid |
/// |----|-----|-------|
/// | 1 | 1 | [1996-01-01, 1996-06-01) |
/// | 2 | 1 | [1996-06-01, 1996-10-01) |
/// | 3 | 2 | [1996-03-01, current) |
/// | 4 | 1 | [1996-10-01, current) |
/// | 5 | 3 | [1995-01-01, 1996-01-01) |
pub fn category_store() -> SqliteStore {
    let store = memory_store();
    keyed_table("category", RangeSubtype::Instant, &[("cat", "INTEGER")], &["cat"])
        .create(&store)
        .expect("create category");
    let rows = [
        (1, 1, "[1996-01-01 00:00:00+00,1996-06-01 00:00:00+00)"),
        (2, 1, "[1996-06-01 00:00:00+00,1996-10-01 00:00:00+00)"),
        (3, 2, "[1996-03-01 00:00:00+00,9999-12-30 00:00:00+00)"),
        (4, 1, "[1996-10-01 00:00:00+00,9999-12-30 00:00:00+00)"),
        (5, 3, "[1995-01-01 00:00:00+00,1996-01-01 00:00:00+00)"),
    ];
    for (id, cat, valid) in rows {
        store
            .execute(
                "INSERT INTO category (id, cat, valid) VALUES (?1, ?2, period_canonical(?3))",
                &[Value::Integer(id), Value::Integer(cat), Value::Text(valid.into())],
            )
            .expect("insert category row");
    }
    store
}

/// Render a value as text; NULL is `None`.
pub fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Integer(i) => Some(i.to_string()),
        Value::Real(r) => Some(r.to_string()),
        Value::Text(s) => Some(s.clone()),
        Value::Blob(b) => Some(format!("{b:?}")),
    }
}

/// Run `sql` and return every row as text cells.
pub fn query_text<S: ITemporalStore>(store: &S, sql: &str) -> Vec<Vec<Option<String>>> {
    store
        .query(sql, &[])
        .expect("query")
        .rows
        .iter()
        .map(|row| row.iter().map(value_text).collect())
        .collect()
}

/// Current sentinel of kind `K` as stored text.
pub fn sentinel<K: TemporalKind>() -> String {
    K::format_value(&K::current())
}

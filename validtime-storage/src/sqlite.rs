//! SqliteStore: `ITemporalStore` over a single rusqlite connection.
//!
//! Opening a store applies the configured pragmas and registers the range
//! SQL functions, so every connection it hands out understands
//! `TSTZRANGE`/`DATERANGE` columns.

use std::io::Read;
use std::path::Path;
use std::time::Duration;

use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};
use tracing::{debug, warn};

use validtime_core::config::StorageConfig;
use validtime_core::{StorageError, ValidtimeError, ValidtimeResult};

use crate::dialect::SqlDialect;
use crate::functions::register_range_functions;
use crate::source::TabularSource;
use crate::store::{ColumnDef, ITemporalStore, RowSet};
use crate::to_storage_err;

const SAVEPOINT: &str = "validtime_tx";

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: &Path, config: &StorageConfig) -> ValidtimeResult<Self> {
        let conn = Connection::open(path).map_err(to_storage_err)?;
        let mode: String = conn
            .pragma_update_and_check(None, "journal_mode", config.journal_mode.as_str(), |row| {
                row.get(0)
            })
            .map_err(to_storage_err)?;
        debug!(path = %path.display(), journal_mode = %mode, "opened sqlite store");
        Self::from_connection(conn, config)
    }

    pub fn open_in_memory(config: &StorageConfig) -> ValidtimeResult<Self> {
        let conn = Connection::open_in_memory().map_err(to_storage_err)?;
        Self::from_connection(conn, config)
    }

    /// Adopt an existing connection, registering the range functions on it.
    pub fn from_connection(conn: Connection, config: &StorageConfig) -> ValidtimeResult<Self> {
        conn.busy_timeout(Duration::from_millis(config.busy_timeout_ms))
            .map_err(to_storage_err)?;
        register_range_functions(&conn).map_err(to_storage_err)?;
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    fn quote(&self, ident: &str) -> String {
        self.dialect().quote_ident(ident)
    }

    fn table_exists(&self, table: &str) -> ValidtimeResult<bool> {
        let count: i64 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
                [table],
                |row| row.get(0),
            )
            .map_err(to_storage_err)?;
        Ok(count > 0)
    }
}

impl ITemporalStore for SqliteStore {
    fn dialect(&self) -> SqlDialect {
        SqlDialect::Sqlite
    }

    fn table_columns(&self, table: &str) -> ValidtimeResult<Vec<ColumnDef>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name, type, \"notnull\" FROM pragma_table_info(?1) ORDER BY cid")
            .map_err(to_storage_err)?;
        let rows = stmt
            .query_map([table], |row| {
                Ok(ColumnDef {
                    name: row.get(0)?,
                    decl_type: row.get(1)?,
                    nullable: row.get::<_, i64>(2)? == 0,
                })
            })
            .map_err(to_storage_err)?;
        let columns = rows
            .collect::<Result<Vec<_>, _>>()
            .map_err(to_storage_err)?;
        if columns.is_empty() {
            return Err(StorageError::TableNotFound {
                table: table.to_string(),
            }
            .into());
        }
        Ok(columns)
    }

    fn create_table(&self, name: &str, columns: &[ColumnDef]) -> ValidtimeResult<()> {
        let defs: Vec<String> = columns
            .iter()
            .map(|c| {
                let mut def = self.quote(&c.name);
                if !c.decl_type.is_empty() {
                    def.push(' ');
                    def.push_str(&c.decl_type);
                }
                if !c.nullable {
                    def.push_str(" NOT NULL");
                }
                def
            })
            .collect();
        let sql = format!("CREATE TABLE {} ({})", self.quote(name), defs.join(", "));
        debug!(table = name, "create table");
        self.conn.execute(&sql, []).map_err(to_storage_err)?;
        Ok(())
    }

    fn drop_table_if_exists(&self, name: &str) -> ValidtimeResult<()> {
        self.conn
            .execute(&format!("DROP TABLE IF EXISTS {}", self.quote(name)), [])
            .map_err(to_storage_err)?;
        Ok(())
    }

    fn bulk_load<R: Read>(
        &self,
        table: &str,
        source: &mut TabularSource<R>,
    ) -> ValidtimeResult<u64> {
        let columns: Vec<String> = source.headers().iter().map(|h| self.quote(h)).collect();
        let placeholders: Vec<String> = (1..=columns.len())
            .map(|i| self.dialect().placeholder(i))
            .collect();
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.quote(table),
            columns.join(", "),
            placeholders.join(", ")
        );
        let mut stmt = self.conn.prepare(&sql).map_err(to_storage_err)?;
        let mut loaded = 0u64;
        while let Some(row) = source.next_record()? {
            stmt.execute(params_from_iter(row.iter()))
                .map_err(to_storage_err)?;
            loaded += 1;
        }
        debug!(table, rows = loaded, "bulk load complete");
        Ok(loaded)
    }

    fn execute(&self, sql: &str, params: &[Value]) -> ValidtimeResult<usize> {
        self.conn
            .execute(sql, params_from_iter(params.iter()))
            .map_err(to_storage_err)
    }

    fn query(&self, sql: &str, params: &[Value]) -> ValidtimeResult<RowSet> {
        let mut stmt = self.conn.prepare(sql).map_err(to_storage_err)?;
        let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();
        let width = columns.len();
        let rows = stmt
            .query_map(params_from_iter(params.iter()), |row| {
                (0..width)
                    .map(|i| row.get::<_, Value>(i))
                    .collect::<rusqlite::Result<Vec<Value>>>()
            })
            .map_err(to_storage_err)?;
        let rows = rows
            .collect::<Result<Vec<Vec<Value>>, _>>()
            .map_err(to_storage_err)?;
        Ok(RowSet { columns, rows })
    }

    /// SQLite locks the whole database; an IMMEDIATE transaction already
    /// holds the write lock, so this only checks the preconditions.
    fn lock_table_exclusive(&self, table: &str) -> ValidtimeResult<()> {
        if self.conn.is_autocommit() {
            return Err(ValidtimeError::InvalidArgument(format!(
                "locking {table} requires an open transaction"
            )));
        }
        if !self.table_exists(table)? {
            return Err(StorageError::TableNotFound {
                table: table.to_string(),
            }
            .into());
        }
        Ok(())
    }

    fn run_in_transaction<T, F>(&self, f: F) -> ValidtimeResult<T>
    where
        F: FnOnce(&Self) -> ValidtimeResult<T>,
    {
        // Nested scopes become savepoints of the outer transaction.
        let nested = !self.conn.is_autocommit();
        let (begin, commit, rollback) = if nested {
            (
                format!("SAVEPOINT {SAVEPOINT}"),
                format!("RELEASE {SAVEPOINT}"),
                format!("ROLLBACK TO {SAVEPOINT}; RELEASE {SAVEPOINT}"),
            )
        } else {
            (
                "BEGIN IMMEDIATE".to_string(),
                "COMMIT".to_string(),
                "ROLLBACK".to_string(),
            )
        };

        self.conn.execute_batch(&begin).map_err(to_storage_err)?;
        match f(self) {
            Ok(value) => {
                self.conn.execute_batch(&commit).map_err(to_storage_err)?;
                Ok(value)
            }
            Err(e) => {
                if let Err(rb) = self.conn.execute_batch(&rollback) {
                    warn!(error = %rb, "rollback failed");
                }
                Err(e)
            }
        }
    }
}

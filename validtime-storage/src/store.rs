//! `ITemporalStore` trait: the storage contract consumed by the merge engine.
//!
//! Everything the merge needs from a backend: relation DDL, bulk load of a
//! tabular snapshot, parameterized statements, an exclusive table lock and
//! a transaction scope that commits on success and rolls back on error.

use std::io::Read;

use rusqlite::types::Value;

use validtime_core::ValidtimeResult;

use crate::dialect::SqlDialect;
use crate::source::TabularSource;

/// Declared column of a relation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: String,
    /// Declared type as written in DDL; may be empty.
    pub decl_type: String,
    pub nullable: bool,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, decl_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            decl_type: decl_type.into(),
            nullable: true,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }
}

/// Result of a query: column names plus rows of dynamically typed values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl RowSet {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Value of column `name` in row `row`.
    pub fn get(&self, row: usize, name: &str) -> Option<&Value> {
        let idx = self.column_index(name)?;
        self.rows.get(row)?.get(idx)
    }

    /// Text value of column `name` in row `row`; NULL and non-text are `None`.
    pub fn text(&self, row: usize, name: &str) -> Option<&str> {
        match self.get(row, name)? {
            Value::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

/// Storage operations a temporal merge runs against.
pub trait ITemporalStore {
    fn dialect(&self) -> SqlDialect;

    /// Declared columns of `table`, in order.
    /// Returns `StorageError::TableNotFound` when the table does not exist.
    fn table_columns(&self, table: &str) -> ValidtimeResult<Vec<ColumnDef>>;

    fn create_table(&self, name: &str, columns: &[ColumnDef]) -> ValidtimeResult<()>;

    fn drop_table_if_exists(&self, name: &str) -> ValidtimeResult<()>;

    /// Load every record of `source` into `table`, mapping columns by the
    /// source header. Returns the number of rows loaded.
    fn bulk_load<R: Read>(&self, table: &str, source: &mut TabularSource<R>)
        -> ValidtimeResult<u64>;

    /// Run a statement that returns no rows. Returns affected rows.
    fn execute(&self, sql: &str, params: &[Value]) -> ValidtimeResult<usize>;

    fn query(&self, sql: &str, params: &[Value]) -> ValidtimeResult<RowSet>;

    /// Block concurrent writers of `table` until the enclosing transaction
    /// ends. Must be called inside [`ITemporalStore::run_in_transaction`].
    fn lock_table_exclusive(&self, table: &str) -> ValidtimeResult<()>;

    /// Run `f` in a transaction: commit when it returns `Ok`, roll back
    /// every effect when it returns `Err`.
    fn run_in_transaction<T, F>(&self, f: F) -> ValidtimeResult<T>
    where
        F: FnOnce(&Self) -> ValidtimeResult<T>;
}

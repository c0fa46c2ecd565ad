//! # validtime-storage
//!
//! SQLite persistence layer for valid-time tables.
//! Implements the `ITemporalStore` contract the merge engine consumes,
//! stores intervals as range literals and registers the range SQL
//! functions that queries, constraints and the merge rely on.

pub mod column;
pub mod dialect;
pub mod functions;
pub mod history;
pub mod lookup;
pub mod schema;
pub mod source;
pub mod sqlite;
pub mod store;

pub use column::RangeValue;
pub use dialect::{RangeFn, SqlDialect};
pub use lookup::{Lookup, LookupValue, TemporalFilter};
pub use schema::{TemporalColumn, TemporalTable};
pub use source::TabularSource;
pub use sqlite::SqliteStore;
pub use store::{ColumnDef, ITemporalStore, RowSet};

use validtime_core::{StorageError, ValidtimeError};

/// Convert a rusqlite error into a `ValidtimeError::StorageError`,
/// classifying constraint and busy failures.
pub fn to_storage_err(e: rusqlite::Error) -> ValidtimeError {
    let err = match e.sqlite_error_code() {
        Some(rusqlite::ErrorCode::ConstraintViolation) => StorageError::ConstraintViolation {
            message: e.to_string(),
        },
        Some(rusqlite::ErrorCode::DatabaseBusy) | Some(rusqlite::ErrorCode::DatabaseLocked) => {
            StorageError::Busy
        }
        _ => StorageError::SqliteError {
            message: e.to_string(),
        },
    };
    ValidtimeError::StorageError(err)
}

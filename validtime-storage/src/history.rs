//! History queries over a temporal table.

use validtime_core::{TemporalKind, ValidtimeResult};

use crate::lookup::{translate, Lookup, LookupValue};
use crate::sqlite::SqliteStore;
use crate::store::{ITemporalStore, RowSet};

impl SqliteStore {
    /// Rows whose validity ends at the current sentinel.
    pub fn current_rows<K: TemporalKind>(&self, table: &str, valid: &str) -> ValidtimeResult<RowSet> {
        self.select_where::<K>(table, valid, Lookup::Upper, LookupValue::Point(K::current()))
    }

    /// Rows whose validity contains `at`.
    pub fn rows_valid_at<K: TemporalKind>(
        &self,
        table: &str,
        valid: &str,
        at: K::Value,
    ) -> ValidtimeResult<RowSet> {
        self.select_where::<K>(table, valid, Lookup::Contains, LookupValue::Point(at))
    }

    fn select_where<K: TemporalKind>(
        &self,
        table: &str,
        valid: &str,
        lookup: Lookup,
        value: LookupValue<K>,
    ) -> ValidtimeResult<RowSet> {
        let dialect = self.dialect();
        let filter = translate(lookup, &dialect.quote_ident(valid), &value, dialect, 1)?;
        let sql = format!(
            "SELECT * FROM {} WHERE {} ORDER BY rowid",
            dialect.quote_ident(table),
            filter.sql
        );
        self.query(&sql, &filter.params)
    }
}

//! DDL for valid-time tables.
//!
//! A temporal table carries an integer primary key, ordinary columns and
//! one range column. Optional constraints:
//!
//! - `sequenced_unique`: no two rows with equal key columns have
//!   overlapping validity (enforced by triggers).
//! - `current_unique`: at most one row per key ends at a given instant,
//!   in particular at most one current row.
//! - `nonsequenced_unique`: key plus both bounds unique.
//!
//! Statements are rendered for SQLite and rely on the range functions.

use validtime_core::{RangeSubtype, ValidtimeResult};

use crate::dialect::{RangeFn, SqlDialect};
use crate::store::{ColumnDef, ITemporalStore};

/// The range column of a temporal table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemporalColumn {
    pub name: String,
    pub subtype: RangeSubtype,
    pub nullable: bool,
    /// Admit the empty interval; off by default.
    pub allow_empty: bool,
}

impl TemporalColumn {
    pub fn new(name: impl Into<String>, subtype: RangeSubtype) -> Self {
        Self {
            name: name.into(),
            subtype,
            nullable: false,
            allow_empty: false,
        }
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn allow_empty(mut self) -> Self {
        self.allow_empty = true;
        self
    }

    /// Declared column type, e.g. `TSTZRANGE`.
    pub fn db_type(&self) -> String {
        self.subtype.type_name().to_ascii_uppercase()
    }
}

#[derive(Debug, Clone)]
pub struct TemporalTable {
    name: String,
    columns: Vec<ColumnDef>,
    valid: TemporalColumn,
    sequenced_unique: Vec<String>,
    current_unique: Vec<String>,
    nonsequenced_unique: Vec<String>,
}

impl TemporalTable {
    pub fn new(name: impl Into<String>, valid: TemporalColumn) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            valid,
            sequenced_unique: Vec::new(),
            current_unique: Vec::new(),
            nonsequenced_unique: Vec::new(),
        }
    }

    pub fn column(mut self, column: ColumnDef) -> Self {
        self.columns.push(column);
        self
    }

    pub fn sequenced_unique(mut self, keys: &[&str]) -> Self {
        self.sequenced_unique = keys.iter().map(|k| k.to_string()).collect();
        self
    }

    pub fn current_unique(mut self, keys: &[&str]) -> Self {
        self.current_unique = keys.iter().map(|k| k.to_string()).collect();
        self
    }

    pub fn nonsequenced_unique(mut self, keys: &[&str]) -> Self {
        self.nonsequenced_unique = keys.iter().map(|k| k.to_string()).collect();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn valid(&self) -> &TemporalColumn {
        &self.valid
    }

    /// `CREATE TABLE`, index and trigger statements, in execution order.
    pub fn ddl(&self) -> Vec<String> {
        let d = SqlDialect::Sqlite;
        let q = |s: &str| d.quote_ident(s);
        let table = q(&self.name);
        let valid = q(&self.valid.name);
        let subtype = self.valid.subtype;
        let bound = |func: RangeFn, col: &str| d.range_fn(subtype, func, col);

        let mut defs = vec![format!("{} INTEGER PRIMARY KEY", q("id"))];
        for c in &self.columns {
            let mut def = format!("{} {}", q(&c.name), c.decl_type);
            if !c.nullable {
                def.push_str(" NOT NULL");
            }
            defs.push(def);
        }
        let mut valid_def = format!("{valid} {}", self.valid.db_type());
        if !self.valid.nullable {
            valid_def.push_str(" NOT NULL");
        }
        if !self.valid.allow_empty {
            valid_def.push_str(&format!(" CHECK ({} = 0)", bound(RangeFn::IsEmpty, &valid)));
        }
        defs.push(valid_def);

        let mut statements = vec![format!("CREATE TABLE {table} ({})", defs.join(", "))];

        let key_list = |keys: &[String]| keys.iter().map(|k| q(k)).collect::<Vec<_>>().join(", ");

        if !self.current_unique.is_empty() {
            statements.push(format!(
                "CREATE UNIQUE INDEX {} ON {table} ({}, {})",
                q(&format!("{}_curuniq", self.name)),
                key_list(&self.current_unique),
                bound(RangeFn::Upper, &valid),
            ));
        }
        if !self.nonsequenced_unique.is_empty() {
            statements.push(format!(
                "CREATE UNIQUE INDEX {} ON {table} ({}, {}, {})",
                q(&format!("{}_nsequniq", self.name)),
                key_list(&self.nonsequenced_unique),
                bound(RangeFn::Lower, &valid),
                bound(RangeFn::Upper, &valid),
            ));
        }
        if !self.sequenced_unique.is_empty() {
            statements.extend(self.sequenced_triggers());
        }
        statements
    }

    fn sequenced_triggers(&self) -> Vec<String> {
        let d = SqlDialect::Sqlite;
        let q = |s: &str| d.quote_ident(s);
        let table = q(&self.name);
        let valid = q(&self.valid.name);
        let overlaps = format!("{}_overlaps", self.valid.subtype.function_prefix());
        let keys_equal = self
            .sequenced_unique
            .iter()
            .map(|k| format!("o.{0} = NEW.{0}", q(k)))
            .collect::<Vec<_>>()
            .join(" AND ");
        let message = format!("sequenced unique violation on {}", self.name).replace('\'', "''");

        let trigger = |event: &str, suffix: &str, exclude_self: &str| {
            format!(
                "CREATE TRIGGER {} BEFORE {event} ON {table} BEGIN \
                 SELECT RAISE(ABORT, '{message}') WHERE EXISTS (\
                 SELECT 1 FROM {table} AS o WHERE {keys_equal}{exclude_self} \
                 AND {overlaps}(o.{valid}, NEW.{valid})); END",
                q(&format!("{}_sequniq_{suffix}", self.name)),
            )
        };
        vec![
            trigger("INSERT", "insert", ""),
            trigger("UPDATE", "update", " AND o.rowid <> OLD.rowid"),
        ]
    }

    /// Execute the DDL against `store`.
    pub fn create<S: ITemporalStore>(&self, store: &S) -> ValidtimeResult<()> {
        for statement in self.ddl() {
            store.execute(&statement, &[])?;
        }
        tracing::info!(table = %self.name, "temporal table created");
        Ok(())
    }
}

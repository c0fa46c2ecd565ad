//! Statement shapes issued by the merge, rendered per dialect.
//!
//! Relations: `o` is the target table, `s` the staging relation, and the
//! term relation holds keys (and copy fields) selected by a previous step.
//! Key matching is always null-safe.

use validtime_core::RangeSubtype;
use validtime_storage::{RangeFn, SqlDialect};

/// Runtime value behind a placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Bind {
    AsOf,
    Sentinel,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Statement {
    pub sql: String,
    pub binds: Vec<Bind>,
}

struct Binder {
    dialect: SqlDialect,
    binds: Vec<Bind>,
}

impl Binder {
    fn new(dialect: SqlDialect) -> Self {
        Self {
            dialect,
            binds: Vec::new(),
        }
    }

    fn bind(&mut self, bind: Bind) -> String {
        self.binds.push(bind);
        self.dialect.placeholder(self.binds.len())
    }

    fn finish(self, sql: String) -> Statement {
        Statement {
            sql,
            binds: self.binds,
        }
    }
}

pub(crate) struct MergeSql<'a> {
    pub dialect: SqlDialect,
    pub subtype: RangeSubtype,
    pub table: &'a str,
    pub staging: &'a str,
    pub term: &'a str,
    pub valid: &'a str,
    pub keys: &'a [String],
    /// Snapshot header columns.
    pub fields: &'a [String],
    /// Snapshot columns declared as ranges in the target table.
    pub ranged: &'a [(String, RangeSubtype)],
    pub copy_fields: &'a [String],
}

impl MergeSql<'_> {
    fn q(&self, ident: &str) -> String {
        self.dialect.quote_ident(ident)
    }

    fn col(&self, rel: &str, name: &str) -> String {
        format!("{}.{}", self.q(rel), self.q(name))
    }

    fn list(&self, rel: &str, names: &[String], aliased: bool) -> Vec<String> {
        names
            .iter()
            .map(|n| {
                if aliased {
                    format!("{} AS {}", self.col(rel, n), self.q(n))
                } else {
                    self.col(rel, n)
                }
            })
            .collect()
    }

    fn matching(&self, left: &str, right: &str, columns: &[String]) -> String {
        columns
            .iter()
            .map(|c| self.dialect.null_safe_eq(&self.col(left, c), &self.col(right, c)))
            .collect::<Vec<_>>()
            .join(" AND ")
    }

    fn is_current(&self, rel: &str, binder: &mut Binder) -> String {
        let upper = self
            .dialect
            .range_fn(self.subtype, RangeFn::Upper, &self.col(rel, self.valid));
        format!("{upper} = {}", binder.bind(Bind::Sentinel))
    }

    fn index_keys(&self, rel: &str) -> Statement {
        Binder::new(self.dialect).finish(format!(
            "CREATE INDEX {} ON {} ({})",
            self.q(&format!("{rel}_keys_idx")),
            self.q(rel),
            self.keys
                .iter()
                .map(|k| self.q(k))
                .collect::<Vec<_>>()
                .join(", ")
        ))
    }

    pub fn index_staging(&self) -> Statement {
        self.index_keys(self.staging)
    }

    /// Key index on the term relation; each step that creates the
    /// relation needs its own, since the relation is dropped in between.
    pub fn index_term(&self) -> Statement {
        self.index_keys(self.term)
    }

    /// Rewrite staged range columns into canonical form so they compare and
    /// store like the target's values. `None` when no column is a range.
    pub fn canonicalize_staging(&self) -> Option<Statement> {
        if self.ranged.is_empty() {
            return None;
        }
        let assignments = self
            .ranged
            .iter()
            .map(|(name, subtype)| {
                format!("{} = {}", self.q(name), self.dialect.range_cast(*subtype, &self.q(name)))
            })
            .collect::<Vec<_>>()
            .join(", ");
        Some(Binder::new(self.dialect).finish(format!(
            "UPDATE {} SET {assignments}",
            self.q(self.staging)
        )))
    }

    /// Keys of current rows with no staged row of the same key.
    pub fn select_vanished(&self) -> Statement {
        let mut b = Binder::new(self.dialect);
        let current = self.is_current("o", &mut b);
        b.finish(format!(
            "CREATE TABLE {term} AS SELECT DISTINCT {keys} FROM {table} AS {o} \
             WHERE {current} AND NOT EXISTS (SELECT 1 FROM {staging} AS {s} WHERE {on})",
            term = self.q(self.term),
            keys = self.list("o", self.keys, true).join(", "),
            table = self.q(self.table),
            o = self.q("o"),
            staging = self.q(self.staging),
            s = self.q("s"),
            on = self.matching("o", "s", self.keys),
        ))
    }

    /// Close the validity of current rows whose key appears in `rel` at the
    /// as-of value.
    pub fn terminate_matching(&self, rel: &str) -> Statement {
        let mut b = Binder::new(self.dialect);
        let lower = self
            .dialect
            .range_fn(self.subtype, RangeFn::Lower, &self.col(self.table, self.valid));
        let as_of = b.bind(Bind::AsOf);
        let closed = self.dialect.range_ctor(self.subtype, &lower, &as_of);
        let current = self.is_current(self.table, &mut b);
        b.finish(format!(
            "UPDATE {table} SET {valid} = {closed} WHERE {current} \
             AND EXISTS (SELECT 1 FROM {rel} AS {m} WHERE {on})",
            table = self.q(self.table),
            valid = self.q(self.valid),
            rel = self.q(rel),
            m = self.q("m"),
            on = self.matching(self.table, "m", self.keys),
        ))
    }

    /// Keys of current rows identical to a staged row in every snapshot column.
    pub fn select_unchanged(&self) -> Statement {
        let mut b = Binder::new(self.dialect);
        let current = self.is_current("o", &mut b);
        b.finish(format!(
            "CREATE TABLE {term} AS SELECT DISTINCT {keys} FROM {table} AS {o} \
             JOIN {staging} AS {s} ON {on} WHERE {current} AND {same}",
            term = self.q(self.term),
            keys = self.list("o", self.keys, true).join(", "),
            table = self.q(self.table),
            o = self.q("o"),
            staging = self.q(self.staging),
            s = self.q("s"),
            on = self.matching("o", "s", self.keys),
            same = self.matching("o", "s", self.fields),
        ))
    }

    pub fn delete_unchanged(&self) -> Statement {
        Binder::new(self.dialect).finish(format!(
            "DELETE FROM {staging} WHERE EXISTS (SELECT 1 FROM {term} AS {u} WHERE {on})",
            staging = self.q(self.staging),
            term = self.q(self.term),
            u = self.q("u"),
            on = self.matching(self.staging, "u", self.keys),
        ))
    }

    /// Keys and copy fields of the current rows about to be superseded.
    pub fn capture_superseded(&self) -> Statement {
        let mut b = Binder::new(self.dialect);
        let current = self.is_current("o", &mut b);
        let mut columns = self.list("o", self.keys, true);
        columns.extend(self.list("o", self.copy_fields, true));
        b.finish(format!(
            "CREATE TABLE {term} AS SELECT DISTINCT {columns} FROM {table} AS {o} \
             WHERE {current} AND EXISTS (SELECT 1 FROM {staging} AS {s} WHERE {on})",
            term = self.q(self.term),
            columns = columns.join(", "),
            table = self.q(self.table),
            o = self.q("o"),
            staging = self.q(self.staging),
            s = self.q("s"),
            on = self.matching("o", "s", self.keys),
        ))
    }

    /// New current versions for every remaining staged row. Copy fields
    /// come from the captured superseded rows.
    pub fn insert_versions(&self) -> Statement {
        let mut b = Binder::new(self.dialect);
        let as_of = b.bind(Bind::AsOf);
        let sentinel = b.bind(Bind::Sentinel);
        let validity = self.dialect.range_ctor(self.subtype, &as_of, &sentinel);

        let mut targets: Vec<String> = self.fields.iter().map(|f| self.q(f)).collect();
        targets.extend(self.copy_fields.iter().map(|f| self.q(f)));
        targets.push(self.q(self.valid));

        let mut values = self.list("s", self.fields, false);
        values.extend(self.list("p", self.copy_fields, false));
        values.push(validity);

        let mut sql = format!(
            "INSERT INTO {table} ({targets}) SELECT DISTINCT {values} FROM {staging} AS {s}",
            table = self.q(self.table),
            targets = targets.join(", "),
            values = values.join(", "),
            staging = self.q(self.staging),
            s = self.q("s"),
        );
        if !self.copy_fields.is_empty() {
            sql.push_str(&format!(
                " LEFT JOIN {term} AS {p} ON {on}",
                term = self.q(self.term),
                p = self.q("p"),
                on = self.matching("s", "p", self.keys),
            ));
        }
        b.finish(sql)
    }
}

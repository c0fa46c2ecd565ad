//! SQL dialect differences the temporal SQL generators care about.
//!
//! SQLite has no range type: ranges are stored as canonical text and all
//! range semantics come from the functions in [`crate::functions`].
//! PostgreSQL has native `tstzrange`/`daterange` operators and functions.

use validtime_core::RangeSubtype;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlDialect {
    Sqlite,
    Postgres,
}

/// Single-argument range functions with a point (or flag) result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeFn {
    Lower,
    Upper,
    Prior,
    Later,
    IsEmpty,
}

impl RangeFn {
    fn sqlite_suffix(self) -> &'static str {
        match self {
            Self::Lower => "lower",
            Self::Upper => "upper",
            Self::Prior => "prior",
            Self::Later => "later",
            Self::IsEmpty => "isempty",
        }
    }

    fn postgres_name(self) -> &'static str {
        match self {
            Self::Lower => "lower",
            Self::Upper => "upper",
            Self::Prior => "prior",
            Self::Later => "next",
            Self::IsEmpty => "isempty",
        }
    }
}

impl SqlDialect {
    /// Double-quoted identifier with embedded quotes doubled.
    pub fn quote_ident(self, ident: &str) -> String {
        format!("\"{}\"", ident.replace('"', "\"\""))
    }

    /// Positional placeholder, 1-based.
    pub fn placeholder(self, index: usize) -> String {
        match self {
            Self::Sqlite => format!("?{index}"),
            Self::Postgres => format!("${index}"),
        }
    }

    /// Equality that treats two NULLs as equal.
    pub fn null_safe_eq(self, left: &str, right: &str) -> String {
        match self {
            Self::Sqlite => format!("{left} IS {right}"),
            Self::Postgres => format!("{left} IS NOT DISTINCT FROM {right}"),
        }
    }

    pub fn range_fn(self, subtype: RangeSubtype, func: RangeFn, arg: &str) -> String {
        match self {
            Self::Sqlite => format!(
                "{}_{}({arg})",
                subtype.function_prefix(),
                func.sqlite_suffix()
            ),
            Self::Postgres => format!("{}({arg})", func.postgres_name()),
        }
    }

    /// Closed-open range constructor `[lower, upper)`.
    pub fn range_ctor(self, subtype: RangeSubtype, lower: &str, upper: &str) -> String {
        match self {
            Self::Sqlite => format!("{}_range({lower}, {upper})", subtype.function_prefix()),
            Self::Postgres => format!("{}({lower}, {upper}, '[)')", subtype.type_name()),
        }
    }

    /// `expr` read as a range of `subtype`, in canonical form.
    pub fn range_cast(self, subtype: RangeSubtype, expr: &str) -> String {
        match self {
            Self::Sqlite => format!("{}_canonical({expr})", subtype.function_prefix()),
            Self::Postgres => format!("{expr}::{}", subtype.type_name()),
        }
    }
}

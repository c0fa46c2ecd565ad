//! Lookup translation: named temporal predicates to SQL filter fragments.
//!
//! A lookup is the name used in query filters (`overlaps`, `lower`, ...).
//! [`translate`] renders it for either dialect with the value bound as a
//! parameter; [`Lookup::evaluate`] applies the same predicate in memory.

use std::fmt;
use std::str::FromStr;

use rusqlite::types::Value;

use validtime_core::interval::EMPTY;
use validtime_core::{Interval, TemporalKind, ValidtimeError, ValidtimeResult};

use crate::dialect::{RangeFn, SqlDialect};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lookup {
    Exact,
    NotEquals,
    Lt,
    Lte,
    Gt,
    Gte,
    Contains,
    ContainedBy,
    Overlaps,
    Before,
    After,
    OverLeft,
    OverRight,
    Adjacent,
    Prior,
    Lower,
    Upper,
    Later,
    IsEmpty,
    IsNull,
}

impl Lookup {
    pub const ALL: [Lookup; 20] = [
        Self::Exact,
        Self::NotEquals,
        Self::Lt,
        Self::Lte,
        Self::Gt,
        Self::Gte,
        Self::Contains,
        Self::ContainedBy,
        Self::Overlaps,
        Self::Before,
        Self::After,
        Self::OverLeft,
        Self::OverRight,
        Self::Adjacent,
        Self::Prior,
        Self::Lower,
        Self::Upper,
        Self::Later,
        Self::IsEmpty,
        Self::IsNull,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::NotEquals => "nequals",
            Self::Lt => "lt",
            Self::Lte => "lte",
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Contains => "contains",
            Self::ContainedBy => "contained_by",
            Self::Overlaps => "overlaps",
            Self::Before => "before",
            Self::After => "after",
            Self::OverLeft => "overleft",
            Self::OverRight => "overright",
            Self::Adjacent => "adjacent",
            Self::Prior => "prior",
            Self::Lower => "lower",
            Self::Upper => "upper",
            Self::Later => "later",
            Self::IsEmpty => "isempty",
            Self::IsNull => "isnull",
        }
    }

    fn bound_fn(self) -> Option<RangeFn> {
        match self {
            Self::Prior => Some(RangeFn::Prior),
            Self::Lower => Some(RangeFn::Lower),
            Self::Upper => Some(RangeFn::Upper),
            Self::Later => Some(RangeFn::Later),
            Self::IsEmpty => Some(RangeFn::IsEmpty),
            _ => None,
        }
    }

    fn postgres_operator(self) -> Option<&'static str> {
        let op = match self {
            Self::Exact => "=",
            Self::NotEquals => "<>",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Contains => "@>",
            Self::ContainedBy => "<@",
            Self::Overlaps => "&&",
            Self::Before => "<<",
            Self::After => ">>",
            Self::OverLeft => "&<",
            Self::OverRight => "&>",
            Self::Adjacent => "-|-",
            _ => return None,
        };
        Some(op)
    }

    /// Registered function suffix for interval-valued SQLite predicates.
    fn sqlite_predicate(self) -> Option<&'static str> {
        let name = match self {
            Self::Contains => "contains",
            Self::ContainedBy => "contained_by",
            Self::Overlaps => "overlaps",
            Self::Before => "before",
            Self::After => "after",
            Self::OverLeft => "overleft",
            Self::OverRight => "overright",
            Self::Adjacent => "adjacent",
            _ => return None,
        };
        Some(name)
    }

    /// Apply the lookup to a column value in memory. A NULL column matches
    /// only `isnull = true`.
    pub fn evaluate<K: TemporalKind>(
        self,
        column: Option<&Interval<K>>,
        value: &LookupValue<K>,
    ) -> ValidtimeResult<bool> {
        let Some(col) = column else {
            return Ok(self == Self::IsNull && value.as_flag(self)?);
        };
        let result = match self {
            Self::Exact => *col == value.as_interval(self)?,
            Self::NotEquals => *col != value.as_interval(self)?,
            Self::Lt => *col < value.as_interval(self)?,
            Self::Lte => *col <= value.as_interval(self)?,
            Self::Gt => *col > value.as_interval(self)?,
            Self::Gte => *col >= value.as_interval(self)?,
            Self::Contains => match value.as_interval_or_point(self)? {
                Operand::Interval(other) => col.contains(&other),
                Operand::Point(point) => col.contains_point(point),
            },
            Self::ContainedBy => col.contained_by(&value.as_interval(self)?),
            Self::Overlaps => col.overlaps(&value.as_interval(self)?),
            Self::Before => col.before(&value.as_interval(self)?),
            Self::After => col.after(&value.as_interval(self)?),
            Self::OverLeft => col.overleft(&value.as_interval(self)?),
            Self::OverRight => col.overright(&value.as_interval(self)?),
            Self::Adjacent => col.adjacent(&value.as_interval(self)?),
            Self::Prior => col.prior().ok() == Some(value.as_point(self)?),
            Self::Lower => col.start() == Some(value.as_point(self)?),
            Self::Upper => col.end() == Some(value.as_point(self)?),
            Self::Later => col.later().ok() == Some(value.as_point(self)?),
            Self::IsEmpty => col.is_empty() == value.as_flag(self)?,
            Self::IsNull => !value.as_flag(self)?,
        };
        Ok(result)
    }
}

impl fmt::Display for Lookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Lookup {
    type Err = ValidtimeError;

    fn from_str(s: &str) -> ValidtimeResult<Self> {
        Self::ALL
            .into_iter()
            .find(|l| l.name() == s)
            .ok_or_else(|| ValidtimeError::UnsupportedLookup {
                lookup: s.to_string(),
            })
    }
}

/// Right-hand side of a lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum LookupValue<K: TemporalKind> {
    Interval(Interval<K>),
    Point(K::Value),
    Flag(bool),
    /// Unparsed text; interpreted per lookup.
    Text(String),
}

enum Operand<K: TemporalKind> {
    Interval(Interval<K>),
    Point(K::Value),
}

fn wrong_value(lookup: Lookup, expected: &str) -> ValidtimeError {
    ValidtimeError::InvalidArgument(format!("lookup {lookup} expects {expected}"))
}

impl<K: TemporalKind> LookupValue<K> {
    fn as_interval(&self, lookup: Lookup) -> ValidtimeResult<Interval<K>> {
        match self {
            Self::Interval(i) => i.normalized(),
            Self::Text(text) => Interval::parse(text),
            _ => Err(wrong_value(lookup, "an interval")),
        }
    }

    fn as_point(&self, lookup: Lookup) -> ValidtimeResult<K::Value> {
        match self {
            Self::Point(p) => Ok(K::truncate(*p)),
            Self::Text(text) => K::parse_value(text),
            _ => Err(wrong_value(lookup, "a single value")),
        }
    }

    fn as_flag(&self, lookup: Lookup) -> ValidtimeResult<bool> {
        match self {
            Self::Flag(b) => Ok(*b),
            Self::Text(text) => match text.trim().to_ascii_lowercase().as_str() {
                "true" | "1" => Ok(true),
                "false" | "0" => Ok(false),
                _ => Err(wrong_value(lookup, "a boolean")),
            },
            _ => Err(wrong_value(lookup, "a boolean")),
        }
    }

    fn as_interval_or_point(&self, lookup: Lookup) -> ValidtimeResult<Operand<K>> {
        match self {
            Self::Point(_) => Ok(Operand::Point(self.as_point(lookup)?)),
            Self::Text(text) if !is_interval_text(text) => {
                Ok(Operand::Point(self.as_point(lookup)?))
            }
            _ => Ok(Operand::Interval(self.as_interval(lookup)?)),
        }
    }
}

fn is_interval_text(text: &str) -> bool {
    let t = text.trim_start();
    t.starts_with('[') || t.starts_with('(') || t.eq_ignore_ascii_case(EMPTY)
}

/// SQL filter fragment with its bound parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct TemporalFilter {
    pub sql: String,
    pub params: Vec<Value>,
}

/// Render `column <lookup> value` for `dialect`.
///
/// `column` is an already-quoted column expression. Placeholders are
/// numbered from `first_param`, so fragments can be combined into one
/// statement.
pub fn translate<K: TemporalKind>(
    lookup: Lookup,
    column: &str,
    value: &LookupValue<K>,
    dialect: SqlDialect,
    first_param: usize,
) -> ValidtimeResult<TemporalFilter> {
    let subtype = K::SUBTYPE;
    let ph = dialect.placeholder(first_param);

    if lookup == Lookup::IsNull {
        let sql = if value.as_flag(lookup)? {
            format!("{column} IS NULL")
        } else {
            format!("{column} IS NOT NULL")
        };
        return Ok(TemporalFilter { sql, params: vec![] });
    }

    if let Some(func) = lookup.bound_fn() {
        let param = if lookup == Lookup::IsEmpty {
            Value::Integer(i64::from(value.as_flag(lookup)?))
        } else {
            Value::Text(K::format_value(&value.as_point(lookup)?))
        };
        return Ok(TemporalFilter {
            sql: format!("{} = {ph}", dialect.range_fn(subtype, func, column)),
            params: vec![param],
        });
    }

    let param = match lookup {
        Lookup::Contains => match value.as_interval_or_point(lookup)? {
            Operand::Interval(i) => Value::Text(i.to_string()),
            Operand::Point(p) => Value::Text(K::format_value(&p)),
        },
        _ => Value::Text(value.as_interval(lookup)?.to_string()),
    };

    let sql = match dialect {
        SqlDialect::Postgres => {
            let op = lookup
                .postgres_operator()
                .ok_or_else(|| ValidtimeError::UnsupportedLookup {
                    lookup: lookup.to_string(),
                })?;
            // A bare point on the right of @> is an element, not a range.
            let rhs = match (&param, lookup) {
                (Value::Text(t), Lookup::Contains) if !is_interval_text(t) => {
                    format!("{ph}::{}", element_type(subtype))
                }
                _ => format!("{ph}::{}", subtype.type_name()),
            };
            format!("{column} {op} {rhs}")
        }
        SqlDialect::Sqlite => {
            let prefix = subtype.function_prefix();
            match lookup {
                Lookup::Exact => format!("{prefix}_eq({column}, {ph})"),
                Lookup::NotEquals => format!("NOT {prefix}_eq({column}, {ph})"),
                Lookup::Lt => format!("{prefix}_cmp({column}, {ph}) < 0"),
                Lookup::Lte => format!("{prefix}_cmp({column}, {ph}) <= 0"),
                Lookup::Gt => format!("{prefix}_cmp({column}, {ph}) > 0"),
                Lookup::Gte => format!("{prefix}_cmp({column}, {ph}) >= 0"),
                other => {
                    let func = other.sqlite_predicate().ok_or_else(|| {
                        ValidtimeError::UnsupportedLookup {
                            lookup: other.to_string(),
                        }
                    })?;
                    format!("{prefix}_{func}({column}, {ph})")
                }
            }
        }
    };

    Ok(TemporalFilter {
        sql,
        params: vec![param],
    })
}

fn element_type(subtype: validtime_core::RangeSubtype) -> &'static str {
    match subtype {
        validtime_core::RangeSubtype::Instant => "timestamptz",
        validtime_core::RangeSubtype::Date => "date",
    }
}

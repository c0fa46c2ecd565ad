//! Column adapter between [`Interval`] and the stored range value.
//!
//! The backend-native value is a range literal: `empty` or a bracketed
//! pair with bound markers. Storing canonicalizes; loading re-normalizes,
//! so a value read back always satisfies the closed-open invariant.

use std::marker::PhantomData;

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};

use validtime_core::{Interval, TemporalKind, ValidtimeResult};

/// Backend-native range value of kind `K`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RangeValue<K: TemporalKind> {
    Empty,
    Bounded {
        lower: K::Value,
        upper: K::Value,
        /// Two-character bound marker such as `"[)"`.
        bounds: &'static str,
        kind: PhantomData<K>,
    },
}

fn bound_marker(start_included: bool, end_included: bool) -> &'static str {
    match (start_included, end_included) {
        (true, false) => "[)",
        (true, true) => "[]",
        (false, false) => "()",
        (false, true) => "(]",
    }
}

impl<K: TemporalKind> RangeValue<K> {
    pub fn bounded(lower: K::Value, upper: K::Value, bounds: &'static str) -> Self {
        Self::Bounded {
            lower,
            upper,
            bounds,
            kind: PhantomData,
        }
    }

    /// Rebuild the interval, normalizing whatever bound marker was stored.
    pub fn to_interval(&self) -> ValidtimeResult<Interval<K>> {
        match self {
            Self::Empty => Ok(Interval::empty()),
            Self::Bounded {
                lower,
                upper,
                bounds,
                ..
            } => Interval::with_bounds(
                *lower,
                *upper,
                bounds.starts_with('['),
                bounds.ends_with(']'),
            ),
        }
    }

    /// Canonical literal, e.g. `[2000-01-01,2000-02-01)`.
    pub fn literal(&self) -> ValidtimeResult<String> {
        Ok(self.to_interval()?.to_string())
    }
}

/// Interval to native value. Empty maps to the native empty literal.
pub fn to_storage<K: TemporalKind>(interval: &Interval<K>) -> RangeValue<K> {
    match interval.bounds() {
        None => RangeValue::Empty,
        Some(b) => RangeValue::bounded(b.start, b.end, bound_marker(b.start_included, b.end_included)),
    }
}

/// Native value to interval; SQL NULL stays `None`.
pub fn from_storage<K: TemporalKind>(
    value: Option<RangeValue<K>>,
) -> ValidtimeResult<Option<Interval<K>>> {
    value.map(|v| v.to_interval()).transpose()
}

impl<K: TemporalKind> ToSql for RangeValue<K> {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        let literal = self
            .literal()
            .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;
        Ok(ToSqlOutput::from(literal))
    }
}

impl<K: TemporalKind> FromSql for RangeValue<K> {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let text = value.as_str()?;
        let interval = Interval::<K>::parse(text).map_err(|e| FromSqlError::Other(Box::new(e)))?;
        Ok(to_storage(&interval))
    }
}

//! Text encoding: `[start,end)` bracket form or the `empty` literal.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};

use crate::errors::{ValidtimeError, ValidtimeResult};

use super::kind::TemporalKind;
use super::period::{Bounds, Interval};
use super::EMPTY;

static BRACKETED: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^([\[(])([^,]+),([^\])]+)([\])])$").ok());

impl<K: TemporalKind> Interval<K> {
    /// Parse the bracket form (any inclusion flags) or `empty`/`""`.
    /// The result is normalized.
    pub fn parse(text: &str) -> ValidtimeResult<Self> {
        let text = text.trim();
        if text.is_empty() || text.eq_ignore_ascii_case(EMPTY) {
            return Ok(Self::empty());
        }
        let caps = BRACKETED
            .as_ref()
            .and_then(|re| re.captures(text))
            .ok_or_else(|| {
                ValidtimeError::Format(format!("invalid interval representation: {text:?}"))
            })?;
        let bounds = Bounds {
            start: K::parse_value(&caps[2])?,
            end: K::parse_value(&caps[3])?,
            start_included: &caps[1] == "[",
            end_included: &caps[4] == "]",
        };
        let mut interval = Self::from_raw(bounds)?;
        interval.normalize()?;
        Ok(interval)
    }
}

impl<K: TemporalKind> FromStr for Interval<K> {
    type Err = ValidtimeError;

    fn from_str(s: &str) -> ValidtimeResult<Self> {
        Self::parse(s)
    }
}

impl<K: TemporalKind> fmt::Display for Interval<K> {
    /// Renders the current flags; a non-normalized interval shows its
    /// non-canonical brackets.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.bounds() {
            None => f.write_str(EMPTY),
            Some(b) => write!(
                f,
                "{}{},{}{}",
                if b.start_included { '[' } else { '(' },
                K::format_value(&b.start),
                K::format_value(&b.end),
                if b.end_included { ']' } else { ')' },
            ),
        }
    }
}

impl<K: TemporalKind> Serialize for Interval<K> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

struct IntervalVisitor<K>(std::marker::PhantomData<K>);

impl<K: TemporalKind> Visitor<'_> for IntervalVisitor<K> {
    type Value = Interval<K>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an interval such as \"[start,end)\" or \"empty\"")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Interval<K>, E> {
        Interval::parse(v).map_err(E::custom)
    }
}

impl<'de, K: TemporalKind> Deserialize<'de> for Interval<K> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_str(IntervalVisitor(std::marker::PhantomData))
    }
}

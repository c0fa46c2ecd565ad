//! Temporal kinds: the value domain an interval ranges over.
//!
//! A kind fixes the bound type, the resolution unit used when converting
//! between open and closed bounds, the "current" sentinel and the textual
//! encoding of a single bound.

use std::fmt::{Debug, Display};
use std::hash::Hash;
use std::str::FromStr;
use std::sync::LazyLock;

use chrono::{
    DateTime, Days, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, TimeZone,
    Timelike, Utc,
};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::errors::{ValidtimeError, ValidtimeResult};

/// On-disk range subtype of a temporal column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeSubtype {
    /// Timestamp-with-time-zone range, microsecond resolution.
    Instant,
    /// Date range, one-day resolution.
    Date,
}

impl RangeSubtype {
    /// Declared column type name (`tstzrange` / `daterange`).
    pub fn type_name(self) -> &'static str {
        match self {
            Self::Instant => "tstzrange",
            Self::Date => "daterange",
        }
    }

    /// Prefix of the registered SQLite range functions.
    pub fn function_prefix(self) -> &'static str {
        match self {
            Self::Instant => "period",
            Self::Date => "daterange",
        }
    }

    /// Resolve a declared column type (case-insensitive).
    pub fn from_type_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "tstzrange" => Some(Self::Instant),
            "daterange" => Some(Self::Date),
            _ => None,
        }
    }
}

impl FromStr for RangeSubtype {
    type Err = ValidtimeError;

    fn from_str(s: &str) -> ValidtimeResult<Self> {
        Self::from_type_name(s).ok_or_else(|| {
            ValidtimeError::InvalidArgument(format!("unknown range subtype: {s}"))
        })
    }
}

/// Descriptor of an interval's value domain.
pub trait TemporalKind:
    Copy + Clone + Debug + Default + PartialEq + Eq + Hash + Send + Sync + 'static
{
    type Value: Copy + Ord + Hash + Debug + Send + Sync + 'static;

    const SUBTYPE: RangeSubtype;

    /// Sentinel end meaning "valid until further notice".
    fn current() -> Self::Value;

    /// Smallest representable value.
    fn min_value() -> Self::Value;

    /// Largest representable value.
    fn max_value() -> Self::Value;

    /// `value + resolution`, or `None` past `max_value()`.
    fn step_forward(value: Self::Value) -> Option<Self::Value>;

    /// `value - resolution`, or `None` before `min_value()`.
    fn step_back(value: Self::Value) -> Option<Self::Value>;

    /// Drop precision finer than the resolution.
    fn truncate(value: Self::Value) -> Self::Value;

    fn parse_value(text: &str) -> ValidtimeResult<Self::Value>;

    fn format_value(value: &Self::Value) -> String;
}

/// Instants (timestamp with time zone), one microsecond resolution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct InstantKind;

/// Calendar dates, one day resolution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct DateKind;

const INSTANT_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f%z";
const DATE_FORMAT: &str = "%Y-%m-%d";
const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

// 2009-06-04 12:00:00+01:00 or 2009-06-04 12:00:00 +0100, optionally quoted
static TZ_OFFSET: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r#"^"?(.*?)\s?([-+])(\d\d):?(\d\d)?"?$"#).ok());

fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or(NaiveDate::MIN)
}

fn utc(date: NaiveDate, time: NaiveTime) -> DateTime<Utc> {
    date.and_time(time).and_utc()
}

fn parse_naive(text: &str) -> Option<NaiveDateTime> {
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
}

fn parse_with_offset(text: &str) -> Option<DateTime<Utc>> {
    let re = TZ_OFFSET.as_ref()?;
    let caps = re.captures(text)?;
    let naive = parse_naive(caps.get(1)?.as_str().trim())?;
    let hours: i32 = caps.get(3)?.as_str().parse().ok()?;
    let minutes: i32 = match caps.get(4) {
        Some(m) => m.as_str().parse().ok()?,
        None => 0,
    };
    let mut seconds = hours * 3600 + minutes * 60;
    if caps.get(2)?.as_str() == "-" {
        seconds = -seconds;
    }
    let offset = FixedOffset::east_opt(seconds)?;
    offset
        .from_local_datetime(&naive)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
}

// Well-formed but outside years 0001-9999, the width of the text encoding.
fn out_of_domain<V: Display>(value: V) -> ValidtimeError {
    ValidtimeError::OutOfRange {
        operation: "represent".to_string(),
        value: format!("{value} (years 0001-9999 only)"),
    }
}

impl TemporalKind for InstantKind {
    type Value = DateTime<Utc>;

    const SUBTYPE: RangeSubtype = RangeSubtype::Instant;

    fn current() -> DateTime<Utc> {
        utc(ymd(9999, 12, 30), NaiveTime::default())
    }

    fn min_value() -> DateTime<Utc> {
        utc(ymd(1, 1, 1), NaiveTime::default())
    }

    fn max_value() -> DateTime<Utc> {
        let last = NaiveTime::from_hms_micro_opt(23, 59, 59, 999_999).unwrap_or_default();
        utc(ymd(9999, 12, 31), last)
    }

    fn step_forward(value: DateTime<Utc>) -> Option<DateTime<Utc>> {
        value
            .checked_add_signed(TimeDelta::microseconds(1))
            .filter(|v| *v <= Self::max_value())
    }

    fn step_back(value: DateTime<Utc>) -> Option<DateTime<Utc>> {
        value
            .checked_sub_signed(TimeDelta::microseconds(1))
            .filter(|v| *v >= Self::min_value())
    }

    fn truncate(value: DateTime<Utc>) -> DateTime<Utc> {
        let micros = value.nanosecond() / 1_000 * 1_000;
        value.with_nanosecond(micros).unwrap_or(value)
    }

    fn parse_value(text: &str) -> ValidtimeResult<DateTime<Utc>> {
        let text = text.trim().trim_matches('"').trim();
        let parsed = parse_naive(text)
            .map(|naive| naive.and_utc())
            .or_else(|| parse_with_offset(text))
            .ok_or_else(|| ValidtimeError::Format(format!("invalid timestamp: {text:?}")))?;
        if parsed < Self::min_value() || parsed > Self::max_value() {
            return Err(out_of_domain(parsed));
        }
        Ok(Self::truncate(parsed))
    }

    fn format_value(value: &DateTime<Utc>) -> String {
        value.format(INSTANT_FORMAT).to_string()
    }
}

impl TemporalKind for DateKind {
    type Value = NaiveDate;

    const SUBTYPE: RangeSubtype = RangeSubtype::Date;

    fn current() -> NaiveDate {
        ymd(9999, 12, 30)
    }

    fn min_value() -> NaiveDate {
        ymd(1, 1, 1)
    }

    fn max_value() -> NaiveDate {
        ymd(9999, 12, 31)
    }

    fn step_forward(value: NaiveDate) -> Option<NaiveDate> {
        value
            .checked_add_days(Days::new(1))
            .filter(|v| *v <= Self::max_value())
    }

    fn step_back(value: NaiveDate) -> Option<NaiveDate> {
        value
            .checked_sub_days(Days::new(1))
            .filter(|v| *v >= Self::min_value())
    }

    fn truncate(value: NaiveDate) -> NaiveDate {
        value
    }

    fn parse_value(text: &str) -> ValidtimeResult<NaiveDate> {
        let text = text.trim().trim_matches('"').trim();
        let parsed = NaiveDate::parse_from_str(text, DATE_FORMAT)
            .map_err(|e| ValidtimeError::Format(format!("invalid date {text:?}: {e}")))?;
        if parsed < Self::min_value() || parsed > Self::max_value() {
            return Err(out_of_domain(parsed));
        }
        Ok(parsed)
    }

    fn format_value(value: &NaiveDate) -> String {
        value.format(DATE_FORMAT).to_string()
    }
}

//! Interval algebra through the public API: construction paths, text
//! encoding, normalization and the lookup predicates.

use chrono::{NaiveDate, TimeZone, Utc};
use validtime_core::interval::{DateKind, InstantKind, TemporalKind};
use validtime_core::{DateRange, Period, ValidtimeError};

fn dt(y: i32, m: u32, d: u32) -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
}

#[test]
fn construction_paths_agree() {
    let from_text: Period = "[1996-10-01 00:00:00+00,1997-01-01 00:00:00+00)".parse().unwrap();
    let from_bounds = Period::new(dt(1996, 10, 1), dt(1997, 1, 1)).unwrap();
    let copied = from_bounds;
    assert_eq!(from_text, from_bounds);
    assert_eq!(copied, from_text);
}

#[test]
fn string_with_offset_lands_in_utc() {
    let p: Period = "[2009-06-04 12:00:00 +0100,2009-06-05 12:00:00 +0100)".parse().unwrap();
    assert_eq!(
        p.to_string(),
        "[2009-06-04 11:00:00.000000+0000,2009-06-05 11:00:00.000000+0000)"
    );
}

#[test]
fn empty_equality_rules() {
    let a = Period::new(dt(2000, 1, 1), dt(2000, 2, 1)).unwrap();
    assert_eq!(Period::empty(), Period::parse("empty").unwrap());
    assert_ne!(Period::empty(), a);
    assert_ne!(a, Period::new(dt(2000, 1, 1), dt(2000, 2, 2)).unwrap());
}

#[test]
fn overflow_when_closing_the_maximum() {
    let mut p = Period::new(dt(2000, 1, 1), InstantKind::max_value()).unwrap();
    p.set_end_included(true).unwrap();
    assert!(matches!(p.normalize(), Err(ValidtimeError::OutOfRange { .. })));

    // the sentinel itself still has room for one more unit
    let mut current = Period::starting(dt(2000, 1, 1)).unwrap();
    current.set_end_included(true).unwrap();
    current.normalize().unwrap();
    assert!(!current.is_current());
}

#[test]
fn prior_of_minimum_is_out_of_range() {
    let d = DateRange::new(DateKind::min_value(), NaiveDate::from_ymd_opt(2000, 1, 1).unwrap())
        .unwrap();
    assert_eq!(d.prior().unwrap_err().error_code(), "OUT_OF_RANGE");
}

#[test]
fn date_range_example() {
    let d: DateRange = "[2000-01-01, 2000-02-01]".parse().unwrap();
    assert_eq!(d.to_string(), "[2000-01-01,2000-02-02)");
    assert_eq!(d.prior().unwrap(), NaiveDate::from_ymd_opt(1999, 12, 31).unwrap());
    assert_eq!(d.later().unwrap(), NaiveDate::from_ymd_opt(2000, 2, 2).unwrap());
    assert_eq!(d.last().unwrap(), NaiveDate::from_ymd_opt(2000, 2, 1).unwrap());
}

#[test]
fn comparison_operators_follow_start_then_end() {
    let a = Period::new(dt(2000, 1, 1), dt(2000, 3, 1)).unwrap();
    let b = Period::new(dt(2000, 1, 1), dt(2000, 4, 1)).unwrap();
    let c = Period::new(dt(2000, 2, 1), dt(2000, 2, 2)).unwrap();
    assert!(a < b);
    assert!(b < c);
    assert!(c > a);
    assert_eq!(a.max(c), c);
}

#[test]
fn current_sentinels() {
    assert_eq!(
        InstantKind::format_value(&InstantKind::current()),
        "9999-12-30 00:00:00.000000+0000"
    );
    assert_eq!(DateKind::format_value(&DateKind::current()), "9999-12-30");
}

//! Property tests for interval normalization, encoding and algebra.

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use proptest::prelude::*;
use validtime_core::Period;

// Microsecond offsets within a few years keep sums far from the domain edges.
// Ends sit at least two units past starts so flipping flags never empties.
fn instant() -> impl Strategy<Value = DateTime<Utc>> {
    (0i64..100_000_000_000_000).prop_map(|us| {
        Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap() + TimeDelta::microseconds(us)
    })
}

fn raw_period() -> impl Strategy<Value = Period> {
    (instant(), instant(), any::<bool>(), any::<bool>()).prop_map(|(a, b, si, ei)| {
        Period::with_bounds(a.min(b), a.max(b) + TimeDelta::microseconds(2), si, ei).unwrap()
    })
}

fn period_or_empty() -> impl Strategy<Value = Period> {
    prop_oneof![
        1 => Just(Period::empty()),
        9 => raw_period(),
    ]
}

proptest! {
    #[test]
    fn prop_normalize_idempotent(p in raw_period(), flip_start in any::<bool>(), flip_end in any::<bool>()) {
        let mut p = p;
        p.set_start_included(!flip_start).unwrap();
        p.set_end_included(flip_end).unwrap();
        let once = p.normalized().unwrap();
        let twice = once.normalized().unwrap();
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn prop_canonical_closed_open(p in raw_period()) {
        prop_assert_eq!(p.start_included(), Some(true));
        prop_assert_eq!(p.end_included(), Some(false));
    }

    #[test]
    fn prop_text_roundtrip(p in period_or_empty()) {
        let parsed: Period = p.to_string().parse().unwrap();
        prop_assert_eq!(parsed, p);
    }

    #[test]
    fn prop_overlap_symmetric(a in period_or_empty(), b in period_or_empty()) {
        prop_assert_eq!(a.overlaps(&b), b.overlaps(&a));
    }

    #[test]
    fn prop_intersection_commutes_and_is_contained(a in period_or_empty(), b in period_or_empty()) {
        let ab = a.intersection(&b);
        prop_assert_eq!(ab, b.intersection(&a));
        if a.overlaps(&b) {
            prop_assert!(ab.contained_by(&a));
            prop_assert!(ab.contained_by(&b));
            prop_assert!(!ab.is_empty());
        } else {
            prop_assert!(ab.is_empty());
        }
    }

    #[test]
    fn prop_union_encloses_both(a in raw_period(), b in raw_period()) {
        let u = a.union(&b);
        prop_assert!(u.contains(&a));
        prop_assert!(u.contains(&b));
    }

    #[test]
    fn prop_ordering_total_and_consistent(mut items in prop::collection::vec(period_or_empty(), 0..20)) {
        items.sort();
        for pair in items.windows(2) {
            prop_assert!(pair[0] <= pair[1]);
            if let (Some(a), Some(b)) = (pair[0].bounds(), pair[1].bounds()) {
                prop_assert!((a.start, a.end) <= (b.start, b.end));
            }
        }
    }

    #[test]
    fn prop_adjacent_never_overlaps(a in raw_period(), b in raw_period()) {
        if a.adjacent(&b) {
            prop_assert!(!a.overlaps(&b));
        }
    }
}

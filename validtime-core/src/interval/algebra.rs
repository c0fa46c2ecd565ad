//! Predicates, set operations and ordering.
//!
//! Predicates read the stored bounds and assume closed-open form, which is
//! what construction guarantees. Empty intervals follow range semantics:
//! contained by everything, overlapping and adjacent to nothing.

use std::cmp::Ordering;
use std::ops::{BitAnd, BitOr};

use super::kind::TemporalKind;
use super::period::Interval;

impl<K: TemporalKind> Interval<K> {
    /// Both non-empty and sharing at least one value.
    pub fn overlaps(&self, other: &Self) -> bool {
        match (self.bounds(), other.bounds()) {
            (Some(a), Some(b)) => a.start < b.end && b.start < a.end,
            _ => false,
        }
    }

    /// `value` lies in `[start, end)`.
    pub fn contains_point(&self, value: K::Value) -> bool {
        self.bounds()
            .map_or(false, |b| b.start <= value && value < b.end)
    }

    /// Every value of `other` lies in `self`.
    pub fn contains(&self, other: &Self) -> bool {
        match (self.bounds(), other.bounds()) {
            (_, None) => true,
            (None, Some(_)) => false,
            (Some(a), Some(b)) => a.start <= b.start && b.end <= a.end,
        }
    }

    pub fn contained_by(&self, other: &Self) -> bool {
        other.contains(self)
    }

    /// Entirely ends before `other` starts.
    pub fn before(&self, other: &Self) -> bool {
        match (self.bounds(), other.bounds()) {
            (Some(a), Some(b)) => a.end <= b.start,
            _ => false,
        }
    }

    /// Entirely starts after `other` ends.
    pub fn after(&self, other: &Self) -> bool {
        other.before(self)
    }

    /// Does not extend to the right of `other`.
    pub fn overleft(&self, other: &Self) -> bool {
        match (self.bounds(), other.bounds()) {
            (Some(a), Some(b)) => a.end <= b.end,
            _ => false,
        }
    }

    /// Does not extend to the left of `other`.
    pub fn overright(&self, other: &Self) -> bool {
        match (self.bounds(), other.bounds()) {
            (Some(a), Some(b)) => a.start >= b.start,
            _ => false,
        }
    }

    /// One interval ends exactly where the other starts.
    pub fn adjacent(&self, other: &Self) -> bool {
        match (self.bounds(), other.bounds()) {
            (Some(a), Some(b)) => a.end == b.start || b.end == a.start,
            _ => false,
        }
    }

    /// Overlap region, or empty when the intervals do not overlap.
    pub fn intersection(&self, other: &Self) -> Self {
        match (self.bounds(), other.bounds()) {
            (Some(a), Some(b)) if self.overlaps(other) => {
                Self::new(a.start.max(b.start), a.end.min(b.end)).unwrap_or_default()
            }
            _ => Self::empty(),
        }
    }

    /// Enclosing span `[min(start), max(end))`.
    ///
    /// Disjoint, non-adjacent inputs still produce the enclosing span, which
    /// covers the gap between them; check `overlaps`/`adjacent` first when
    /// that matters.
    pub fn union(&self, other: &Self) -> Self {
        match (self.bounds(), other.bounds()) {
            (Some(a), Some(b)) => {
                Self::new(a.start.min(b.start), a.end.max(b.end)).unwrap_or_default()
            }
            (Some(_), None) => *self,
            (None, _) => *other,
        }
    }
}

impl<K: TemporalKind> Ord for Interval<K> {
    /// Empty first, then lexicographic on `(start, end)`; inclusion flags
    /// only break ties between non-canonical values.
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.bounds(), other.bounds()) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(a), Some(b)) => a
                .start
                .cmp(&b.start)
                .then(a.end.cmp(&b.end))
                .then(b.start_included.cmp(&a.start_included))
                .then(a.end_included.cmp(&b.end_included)),
        }
    }
}

impl<K: TemporalKind> PartialOrd for Interval<K> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<K: TemporalKind> BitAnd for Interval<K> {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        self.intersection(&rhs)
    }
}

impl<K: TemporalKind> BitOr for Interval<K> {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(&rhs)
    }
}

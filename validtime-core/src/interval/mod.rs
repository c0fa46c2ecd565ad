//! Interval value type over instants or dates.
//!
//! An `Interval<K>` is either empty or a bounded span `start .. end` with
//! per-bound inclusion flags. Construction normalizes to the canonical
//! closed-open form `[start, end)`. Mutating a single bound or flag does not
//! re-normalize; call [`Interval::normalize`] to restore the canonical form.

mod algebra;
mod kind;
mod period;
mod text;

pub use kind::{DateKind, InstantKind, RangeSubtype, TemporalKind};
pub use period::{Bounds, Interval};

/// Interval over instants (microsecond resolution).
pub type Period = Interval<InstantKind>;

/// Interval over dates (one day resolution).
pub type DateRange = Interval<DateKind>;

/// Literal used for the empty interval in text form.
pub const EMPTY: &str = "empty";

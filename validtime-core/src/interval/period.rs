//! Interval construction, boundary accessors and normalization.

use std::marker::PhantomData;

use crate::errors::{ValidtimeError, ValidtimeResult};

use super::kind::TemporalKind;

/// Boundaries of a non-empty interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Bounds<V> {
    pub start: V,
    pub end: V,
    pub start_included: bool,
    pub end_included: bool,
}

/// A bounded span of instants or dates, or the empty interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Interval<K: TemporalKind> {
    bounds: Option<Bounds<K::Value>>,
    kind: PhantomData<K>,
}

fn empty_err(operation: &str) -> ValidtimeError {
    ValidtimeError::EmptyInterval {
        operation: operation.to_string(),
    }
}

fn out_of_range<K: TemporalKind>(operation: &str, value: &K::Value) -> ValidtimeError {
    ValidtimeError::OutOfRange {
        operation: operation.to_string(),
        value: K::format_value(value),
    }
}

impl<K: TemporalKind> Interval<K> {
    /// The distinguished empty interval.
    pub fn empty() -> Self {
        Self {
            bounds: None,
            kind: PhantomData,
        }
    }

    /// Closed-open interval `[start, end)`.
    pub fn new(start: K::Value, end: K::Value) -> ValidtimeResult<Self> {
        Self::with_bounds(start, end, true, false)
    }

    /// Interval from explicit bounds and inclusion flags, normalized.
    pub fn with_bounds(
        start: K::Value,
        end: K::Value,
        start_included: bool,
        end_included: bool,
    ) -> ValidtimeResult<Self> {
        let mut interval = Self::from_raw(Bounds {
            start: K::truncate(start),
            end: K::truncate(end),
            start_included,
            end_included,
        })?;
        interval.normalize()?;
        Ok(interval)
    }

    /// Interval starting at `start`; an omitted `end` means current.
    pub fn from_bounds(start: K::Value, end: Option<K::Value>) -> ValidtimeResult<Self> {
        match end {
            Some(end) => Self::new(start, end),
            None => Self::starting(start),
        }
    }

    /// Current interval `[start, sentinel)`.
    pub fn starting(start: K::Value) -> ValidtimeResult<Self> {
        Self::new(start, K::current())
    }

    /// Wrap bounds as-is, without normalizing.
    pub(crate) fn from_raw(bounds: Bounds<K::Value>) -> ValidtimeResult<Self> {
        if bounds.start > bounds.end {
            return Err(ValidtimeError::InvalidArgument(format!(
                "interval start {} is after end {}",
                K::format_value(&bounds.start),
                K::format_value(&bounds.end)
            )));
        }
        Ok(Self {
            bounds: Some(bounds),
            kind: PhantomData,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.bounds.is_none()
    }

    pub fn bounds(&self) -> Option<&Bounds<K::Value>> {
        self.bounds.as_ref()
    }

    pub fn start(&self) -> Option<K::Value> {
        self.bounds.map(|b| b.start)
    }

    pub fn end(&self) -> Option<K::Value> {
        self.bounds.map(|b| b.end)
    }

    pub fn start_included(&self) -> Option<bool> {
        self.bounds.map(|b| b.start_included)
    }

    pub fn end_included(&self) -> Option<bool> {
        self.bounds.map(|b| b.end_included)
    }

    fn bounds_mut(&mut self, operation: &str) -> ValidtimeResult<&mut Bounds<K::Value>> {
        self.bounds.as_mut().ok_or_else(|| empty_err(operation))
    }

    // Setters leave the interval non-canonical until `normalize()` runs.

    pub fn set_start(&mut self, start: K::Value) -> ValidtimeResult<()> {
        self.bounds_mut("set_start")?.start = K::truncate(start);
        Ok(())
    }

    pub fn set_end(&mut self, end: K::Value) -> ValidtimeResult<()> {
        self.bounds_mut("set_end")?.end = K::truncate(end);
        Ok(())
    }

    pub fn set_start_included(&mut self, included: bool) -> ValidtimeResult<()> {
        self.bounds_mut("set_start_included")?.start_included = included;
        Ok(())
    }

    pub fn set_end_included(&mut self, included: bool) -> ValidtimeResult<()> {
        self.bounds_mut("set_end_included")?.end_included = included;
        Ok(())
    }

    /// True when the interval is in closed-open form (or empty).
    pub fn is_canonical(&self) -> bool {
        self.bounds
            .map_or(true, |b| b.start_included && !b.end_included)
    }

    /// Convert to closed-open form.
    ///
    /// An open start advances by one resolution unit and becomes closed; a
    /// closed end advances by one unit and becomes open. A span left with
    /// no values (`start >= end`) collapses to empty. Idempotent. On error
    /// the interval is left unchanged.
    pub fn normalize(&mut self) -> ValidtimeResult<()> {
        let Some(mut b) = self.bounds else {
            return Ok(());
        };
        if b.start > b.end {
            return Err(ValidtimeError::InvalidArgument(format!(
                "interval start {} is after end {}",
                K::format_value(&b.start),
                K::format_value(&b.end)
            )));
        }
        if !b.start_included {
            b.start = K::step_forward(b.start)
                .ok_or_else(|| out_of_range::<K>("advance start", &b.start))?;
            b.start_included = true;
        }
        if b.end_included {
            b.end = K::step_forward(b.end)
                .ok_or_else(|| out_of_range::<K>("advance end", &b.end))?;
            b.end_included = false;
        }
        self.bounds = (b.start < b.end).then_some(b);
        Ok(())
    }

    /// Normalized copy.
    pub fn normalized(mut self) -> ValidtimeResult<Self> {
        self.normalize()?;
        Ok(self)
    }

    /// End is the sentinel and exclusive.
    pub fn is_current(&self) -> bool {
        self.bounds
            .map_or(false, |b| b.end == K::current() && !b.end_included)
    }

    /// Extend the interval until further notice.
    pub fn set_current(&mut self) -> ValidtimeResult<()> {
        let b = self.bounds_mut("set_current")?;
        b.end = K::current();
        b.end_included = false;
        Ok(())
    }

    /// Value immediately before the interval begins.
    pub fn prior(&self) -> ValidtimeResult<K::Value> {
        let b = self.bounds.ok_or_else(|| empty_err("prior"))?;
        if b.start_included {
            K::step_back(b.start).ok_or_else(|| out_of_range::<K>("step before", &b.start))
        } else {
            Ok(b.start)
        }
    }

    /// First value inside the interval.
    pub fn first(&self) -> ValidtimeResult<K::Value> {
        let b = self.bounds.ok_or_else(|| empty_err("first"))?;
        if b.start_included {
            Ok(b.start)
        } else {
            K::step_forward(b.start).ok_or_else(|| out_of_range::<K>("step after", &b.start))
        }
    }

    /// Last value inside the interval.
    pub fn last(&self) -> ValidtimeResult<K::Value> {
        let b = self.bounds.ok_or_else(|| empty_err("last"))?;
        if b.end_included {
            Ok(b.end)
        } else {
            K::step_back(b.end).ok_or_else(|| out_of_range::<K>("step before", &b.end))
        }
    }

    /// Value immediately after the interval ends.
    pub fn later(&self) -> ValidtimeResult<K::Value> {
        let b = self.bounds.ok_or_else(|| empty_err("later"))?;
        if b.end_included {
            K::step_forward(b.end).ok_or_else(|| out_of_range::<K>("step after", &b.end))
        } else {
            Ok(b.end)
        }
    }
}

impl<K: TemporalKind> Default for Interval<K> {
    fn default() -> Self {
        Self::empty()
    }
}

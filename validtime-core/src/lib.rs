//! # validtime-core
//!
//! Foundation crate for valid-time tables.
//! Defines the interval (period) value type and its algebra, the temporal
//! kinds it is parameterized by, the error taxonomy, configuration and
//! tracing setup. Every other crate in the workspace depends on this.

pub mod config;
pub mod errors;
pub mod interval;
pub mod observability;

pub use config::ValidtimeConfig;
pub use errors::{StorageError, ValidtimeError, ValidtimeResult};
pub use interval::{
    Bounds, DateKind, DateRange, InstantKind, Interval, Period, RangeSubtype, TemporalKind,
};

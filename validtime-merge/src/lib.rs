//! # validtime-merge
//!
//! Folds an incoming snapshot into a valid-time table. Unchanged current
//! rows are left alone, changed rows are terminated and replaced by a new
//! current version, and in full mode rows missing from the snapshot are
//! terminated. The whole merge runs in one storage transaction.

pub mod engine;
pub mod mode;
pub mod report;
pub mod request;
mod sql;

pub use engine::{merge_snapshot, MergeContext, TemporalMerge};
pub use mode::SnapshotMode;
pub use report::MergeReport;
pub use request::MergeRequest;

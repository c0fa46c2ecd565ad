mod storage_error;
mod validtime_error;

pub use storage_error::StorageError;
pub use validtime_error::{ValidtimeError, ValidtimeResult};

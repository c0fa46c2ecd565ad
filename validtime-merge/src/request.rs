//! Merge parameters and their validation against snapshot and table.

use validtime_core::{RangeSubtype, TemporalKind, ValidtimeError, ValidtimeResult};
use validtime_storage::ColumnDef;

use crate::mode::SnapshotMode;

/// One merge of a snapshot into `table` as of `as_of`.
#[derive(Debug, Clone)]
pub struct MergeRequest<K: TemporalKind> {
    pub table: String,
    /// Range column holding validity; defaults to `valid`.
    pub valid_field: String,
    /// Columns that identify an entity across versions.
    pub keys: Vec<String>,
    pub as_of: K::Value,
    pub mode: SnapshotMode,
    /// Columns carried forward from the superseded row when the snapshot
    /// does not supply them.
    pub copy_fields: Vec<String>,
}

impl<K: TemporalKind> MergeRequest<K> {
    pub fn new(table: impl Into<String>, keys: &[&str], as_of: K::Value) -> Self {
        Self {
            table: table.into(),
            valid_field: "valid".to_string(),
            keys: keys.iter().map(|k| k.to_string()).collect(),
            as_of: K::truncate(as_of),
            mode: SnapshotMode::Full,
            copy_fields: Vec::new(),
        }
    }

    pub fn mode(mut self, mode: SnapshotMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn valid_field(mut self, name: impl Into<String>) -> Self {
        self.valid_field = name.into();
        self
    }

    pub fn copy_fields(mut self, fields: &[&str]) -> Self {
        self.copy_fields = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    /// Checks that need neither the snapshot nor the table.
    pub(crate) fn check_arguments(&self) -> ValidtimeResult<()> {
        if self.keys.is_empty() {
            return Err(ValidtimeError::InvalidArgument(
                "merge needs at least one key column".to_string(),
            ));
        }
        if self.keys.iter().any(|k| k == &self.valid_field) {
            return Err(ValidtimeError::InvalidArgument(format!(
                "valid field {} cannot be a key",
                self.valid_field
            )));
        }
        if self.as_of >= K::current() {
            return Err(ValidtimeError::InvalidArgument(format!(
                "as-of {} must be before the current sentinel",
                K::format_value(&self.as_of)
            )));
        }
        Ok(())
    }

    /// Checks the snapshot header and the declared table columns.
    pub(crate) fn check_against(
        &self,
        headers: &[String],
        columns: &[ColumnDef],
    ) -> ValidtimeResult<()> {
        let declared = |name: &str| columns.iter().find(|c| c.name == name);

        let valid = declared(&self.valid_field).ok_or_else(|| {
            ValidtimeError::InvalidArgument(format!(
                "table {} has no valid field {}",
                self.table, self.valid_field
            ))
        })?;
        match RangeSubtype::from_type_name(&valid.decl_type) {
            Some(subtype) if subtype == K::SUBTYPE => {}
            _ => {
                return Err(ValidtimeError::InvalidArgument(format!(
                    "valid field {}.{} has type {:?}, expected {}",
                    self.table,
                    self.valid_field,
                    valid.decl_type,
                    K::SUBTYPE.type_name()
                )))
            }
        }

        for header in headers {
            if header == &self.valid_field {
                return Err(ValidtimeError::MalformedInput {
                    line: 1,
                    message: format!("snapshot must not supply the valid field {header}"),
                });
            }
            if declared(header).is_none() {
                return Err(ValidtimeError::MalformedInput {
                    line: 1,
                    message: format!("column {header} does not exist in {}", self.table),
                });
            }
        }
        for key in &self.keys {
            if !headers.contains(key) {
                return Err(ValidtimeError::InvalidArgument(format!(
                    "key column {key} missing from snapshot header"
                )));
            }
        }
        for field in &self.copy_fields {
            if headers.contains(field) {
                return Err(ValidtimeError::InvalidArgument(format!(
                    "copy field {field} is supplied by the snapshot"
                )));
            }
            if declared(field).is_none() || field == &self.valid_field {
                return Err(ValidtimeError::InvalidArgument(format!(
                    "copy field {field} is not a column of {}",
                    self.table
                )));
            }
        }
        Ok(())
    }
}

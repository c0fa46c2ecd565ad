//! TemporalMerge: applies a snapshot to a valid-time table.
//!
//! Steps, all inside one transaction holding the table lock:
//!
//! 1. Stage the snapshot into `<table><staging_suffix>`, typed like the
//!    target columns, with range columns rewritten in canonical form.
//! 2. Full mode: terminate current rows whose key is absent from staging.
//! 3. Drop staged rows identical to their current version.
//! 4. Terminate current rows superseded by a staged row and insert the
//!    staged rows as new current versions, carrying copy fields forward.
//! 5. Drop the staging relations and hand the result to the callback.

use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Instant;

use rusqlite::types::Value;
use tracing::{debug, info};

use validtime_core::config::MergeConfig;
use validtime_core::{RangeSubtype, TemporalKind, ValidtimeResult};
use validtime_storage::{ColumnDef, ITemporalStore, TabularSource};

use crate::mode::SnapshotMode;
use crate::report::MergeReport;
use crate::request::MergeRequest;
use crate::sql::{Bind, MergeSql, Statement};

/// What the callback sees of a merge that is about to commit.
#[derive(Debug)]
pub struct MergeContext<'a, K: TemporalKind> {
    pub table: &'a str,
    pub as_of: K::Value,
    pub keys: &'a [String],
    pub mode: SnapshotMode,
    pub report: &'a MergeReport,
}

pub struct TemporalMerge<'s, S: ITemporalStore> {
    store: &'s S,
    config: MergeConfig,
}

impl<'s, S: ITemporalStore> TemporalMerge<'s, S> {
    pub fn new(store: &'s S, config: MergeConfig) -> Self {
        Self { store, config }
    }

    /// Open a snapshot file, reading `config.null_token` cells as NULL.
    pub fn source_from_path(&self, path: &Path) -> ValidtimeResult<TabularSource<File>> {
        TabularSource::from_path(path, &self.config.null_token)
    }

    pub fn source_from_reader<R: Read>(&self, reader: R) -> ValidtimeResult<TabularSource<R>> {
        TabularSource::from_reader(reader, &self.config.null_token)
    }

    pub fn run<K, R>(
        &self,
        request: &MergeRequest<K>,
        source: TabularSource<R>,
    ) -> ValidtimeResult<MergeReport>
    where
        K: TemporalKind,
        R: Read,
    {
        self.run_with_callback(request, source, |_, _| Ok(()))
    }

    /// Run the merge and call `callback` before committing. An error from
    /// the callback rolls the whole merge back and is returned unchanged.
    pub fn run_with_callback<K, R, F>(
        &self,
        request: &MergeRequest<K>,
        mut source: TabularSource<R>,
        callback: F,
    ) -> ValidtimeResult<MergeReport>
    where
        K: TemporalKind,
        R: Read,
        F: FnOnce(&MergeContext<'_, K>, &S) -> ValidtimeResult<()>,
    {
        let started = Instant::now();
        request.check_arguments()?;
        let columns = self.store.table_columns(&request.table)?;
        request.check_against(source.headers(), &columns)?;

        let fields = source.headers().to_vec();
        let staging = format!("{}{}", request.table, self.config.staging_suffix);
        let term = format!("{}{}", request.table, self.config.term_suffix);
        let staging_columns: Vec<ColumnDef> = fields
            .iter()
            .map(|f| {
                let decl = columns
                    .iter()
                    .find(|c| &c.name == f)
                    .map(|c| c.decl_type.clone())
                    .unwrap_or_default();
                ColumnDef::new(f.clone(), decl)
            })
            .collect();
        let ranged: Vec<(String, RangeSubtype)> = staging_columns
            .iter()
            .filter_map(|c| RangeSubtype::from_type_name(&c.decl_type).map(|t| (c.name.clone(), t)))
            .collect();
        let sql = MergeSql {
            dialect: self.store.dialect(),
            subtype: K::SUBTYPE,
            table: &request.table,
            staging: &staging,
            term: &term,
            valid: &request.valid_field,
            keys: &request.keys,
            fields: &fields,
            ranged: &ranged,
            copy_fields: &request.copy_fields,
        };
        let as_of = Value::Text(K::format_value(&request.as_of));
        let sentinel = Value::Text(K::format_value(&K::current()));
        let exec = |store: &S, stmt: Statement| -> ValidtimeResult<u64> {
            let params: Vec<Value> = stmt
                .binds
                .iter()
                .map(|b| match b {
                    Bind::AsOf => as_of.clone(),
                    Bind::Sentinel => sentinel.clone(),
                })
                .collect();
            Ok(store.execute(&stmt.sql, &params)? as u64)
        };

        info!(
            "merging {} snapshot into {} as of {}",
            request.mode,
            request.table,
            K::format_value(&request.as_of)
        );

        self.store.run_in_transaction(|store| {
            let mut report = MergeReport::default();

            store.drop_table_if_exists(&staging)?;
            store.drop_table_if_exists(&term)?;
            store.create_table(&staging, &staging_columns)?;
            let t = Instant::now();
            report.staged = store.bulk_load(&staging, &mut source)?;
            debug!(
                "staged {} rows into {staging} in {:.2?}",
                report.staged,
                t.elapsed()
            );

            if let Some(stmt) = sql.canonicalize_staging() {
                exec(store, stmt)?;
            }

            store.lock_table_exclusive(&request.table)?;
            let index_term = |store: &S| -> ValidtimeResult<()> {
                if self.config.index_staging {
                    exec(store, sql.index_term())?;
                }
                Ok(())
            };
            if self.config.index_staging {
                exec(store, sql.index_staging())?;
            }

            if request.mode == SnapshotMode::Full {
                let t = Instant::now();
                exec(store, sql.select_vanished())?;
                index_term(store)?;
                report.vanished = exec(store, sql.terminate_matching(&term))?;
                store.drop_table_if_exists(&term)?;
                debug!(
                    "terminated {} vanished rows in {:.2?}",
                    report.vanished,
                    t.elapsed()
                );
            }

            let t = Instant::now();
            exec(store, sql.select_unchanged())?;
            index_term(store)?;
            report.unchanged = exec(store, sql.delete_unchanged())?;
            store.drop_table_if_exists(&term)?;
            debug!(
                "dropped {} unchanged rows from staging in {:.2?}",
                report.unchanged,
                t.elapsed()
            );

            let t = Instant::now();
            if !request.copy_fields.is_empty() {
                exec(store, sql.capture_superseded())?;
                index_term(store)?;
            }
            report.superseded = exec(store, sql.terminate_matching(&staging))?;
            report.inserted = exec(store, sql.insert_versions())?;
            debug!(
                "superseded {} rows, inserted {} in {:.2?}",
                report.superseded,
                report.inserted,
                t.elapsed()
            );

            store.drop_table_if_exists(&staging)?;
            store.drop_table_if_exists(&term)?;

            report.elapsed_ms = started.elapsed().as_millis() as u64;
            let context = MergeContext {
                table: &request.table,
                as_of: request.as_of,
                keys: &request.keys,
                mode: request.mode,
                report: &report,
            };
            callback(&context, store)?;

            info!(
                "merge into {} done: {} staged, {} vanished, {} unchanged, {} superseded, {} inserted ({} ms)",
                request.table,
                report.staged,
                report.vanished,
                report.unchanged,
                report.superseded,
                report.inserted,
                report.elapsed_ms
            );
            Ok(report)
        })
    }
}

/// Merge the snapshot read from `source` into `request.table` on `store`,
/// with default merge settings and an optional pre-commit callback.
pub fn merge_snapshot<K, R, S>(
    store: &S,
    source: TabularSource<R>,
    request: &MergeRequest<K>,
    callback: Option<&dyn Fn(&MergeContext<'_, K>, &S) -> ValidtimeResult<()>>,
) -> ValidtimeResult<MergeReport>
where
    K: TemporalKind,
    R: Read,
    S: ITemporalStore,
{
    let merge = TemporalMerge::new(store, MergeConfig::default());
    match callback {
        Some(cb) => merge.run_with_callback(request, source, cb),
        None => merge.run(request, source),
    }
}

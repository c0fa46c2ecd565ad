//! Merge engine integration tests against an in-memory SQLite database.

use std::cell::Cell;

use chrono::NaiveDate;
use test_fixtures::{
    category_store, csv_source, date, instant, keyed_table, memory_store, query_text, temp_dir,
    write_snapshot,
};
use validtime_core::config::MergeConfig;
use validtime_core::{DateKind, InstantKind, RangeSubtype, StorageError, ValidtimeError, ValidtimeResult};
use validtime_merge::{merge_snapshot, MergeReport, MergeRequest, SnapshotMode, TemporalMerge};
use validtime_storage::{ITemporalStore, SqliteStore, TabularSource};

type Rows = Vec<Vec<Option<String>>>;

const SEED: &str = "a,b\n1,x\n2,x\n3,x\n4,x\n";

fn snap_store() -> SqliteStore {
    let store = memory_store();
    keyed_table(
        "snap",
        RangeSubtype::Date,
        &[("a", "INTEGER"), ("b", "TEXT"), ("c", "TEXT")],
        &["a"],
    )
    .create(&store)
    .unwrap();
    store
}

fn request(as_of: NaiveDate, mode: SnapshotMode) -> MergeRequest<DateKind> {
    MergeRequest::new("snap", &["a"], as_of).mode(mode)
}

fn merge(
    store: &SqliteStore,
    csv: &str,
    as_of: NaiveDate,
    mode: SnapshotMode,
) -> ValidtimeResult<MergeReport> {
    TemporalMerge::new(store, MergeConfig::default()).run(&request(as_of, mode), csv_source(csv))
}

fn seeded() -> SqliteStore {
    let store = snap_store();
    let report = merge(&store, SEED, date(2010, 1, 1), SnapshotMode::Full).unwrap();
    assert_eq!(report.inserted, 4);
    store
}

fn rows(store: &SqliteStore) -> Rows {
    query_text(store, "SELECT a, b, c, valid FROM snap ORDER BY a, valid")
}

fn row(a: &str, b: &str, c: Option<&str>, valid: &str) -> Vec<Option<String>> {
    vec![
        Some(a.to_string()),
        Some(b.to_string()),
        c.map(str::to_string),
        Some(valid.to_string()),
    ]
}

fn seed_rows() -> Rows {
    ["1", "2", "3", "4"]
        .into_iter()
        .map(|a| row(a, "x", None, "[2010-01-01,9999-12-30)"))
        .collect()
}

fn staging_tables(store: &SqliteStore) -> Rows {
    query_text(
        store,
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name LIKE 'snap\\_%' ESCAPE '\\'",
    )
}

#[test]
fn full_snapshot_terminates_vanished_and_supersedes_changed() {
    let store = seeded();
    let report = merge(&store, "a,b\n1,x\n2,x\n3,y\n", date(2011, 1, 1), SnapshotMode::Full).unwrap();

    assert_eq!(report.staged, 3);
    assert_eq!(report.vanished, 1);
    assert_eq!(report.unchanged, 2);
    assert_eq!(report.superseded, 1);
    assert_eq!(report.inserted, 1);
    assert_eq!(
        rows(&store),
        vec![
            row("1", "x", None, "[2010-01-01,9999-12-30)"),
            row("2", "x", None, "[2010-01-01,9999-12-30)"),
            row("3", "x", None, "[2010-01-01,2011-01-01)"),
            row("3", "y", None, "[2011-01-01,9999-12-30)"),
            row("4", "x", None, "[2010-01-01,2011-01-01)"),
        ]
    );
    assert!(staging_tables(&store).is_empty());
}

#[test]
fn delta_snapshot_leaves_missing_keys_alone() {
    let store = seeded();
    let report = merge(&store, "a,b\n3,y\n5,n\n", date(2011, 1, 1), SnapshotMode::Delta).unwrap();

    assert_eq!(report.vanished, 0);
    assert_eq!(report.superseded, 1);
    assert_eq!(report.inserted, 2);
    assert_eq!(
        rows(&store),
        vec![
            row("1", "x", None, "[2010-01-01,9999-12-30)"),
            row("2", "x", None, "[2010-01-01,9999-12-30)"),
            row("3", "x", None, "[2010-01-01,2011-01-01)"),
            row("3", "y", None, "[2011-01-01,9999-12-30)"),
            row("4", "x", None, "[2010-01-01,9999-12-30)"),
            row("5", "n", None, "[2011-01-01,9999-12-30)"),
        ]
    );
}

#[test]
fn identical_snapshot_is_a_noop() {
    let store = seeded();
    let report = merge(&store, SEED, date(2011, 1, 1), SnapshotMode::Full).unwrap();
    assert!(report.is_noop());
    assert_eq!(report.unchanged, 4);
    assert_eq!(rows(&store), seed_rows());
}

#[test]
fn null_key_components_match() {
    let store = memory_store();
    keyed_table(
        "pair",
        RangeSubtype::Date,
        &[("k1", "TEXT"), ("k2", "TEXT"), ("v", "TEXT")],
        &["k1", "k2"],
    )
    .create(&store)
    .unwrap();
    let run = |csv: &str, as_of: NaiveDate| {
        TemporalMerge::new(&store, MergeConfig::default())
            .run(
                &MergeRequest::<DateKind>::new("pair", &["k1", "k2"], as_of),
                csv_source(csv),
            )
            .unwrap()
    };

    run("k1,k2,v\nx,,1\ny,z,1\n", date(2010, 1, 1));
    let second = run("k1,k2,v\nx,,1\ny,z,2\n", date(2011, 1, 1));
    assert_eq!(second.vanished, 0);
    assert_eq!(second.unchanged, 1);
    assert_eq!(second.superseded, 1);
    assert_eq!(second.inserted, 1);
    assert_eq!(
        query_text(&store, "SELECT k2, valid FROM pair WHERE k1 = 'x'"),
        vec![vec![None, Some("[2010-01-01,9999-12-30)".to_string())]]
    );

    let third = run("k1,k2,v\ny,z,2\n", date(2012, 1, 1));
    assert_eq!(third.vanished, 1);
    assert_eq!(third.unchanged, 1);
    assert_eq!(
        query_text(&store, "SELECT valid FROM pair WHERE k1 = 'x'"),
        vec![vec![Some("[2010-01-01,2012-01-01)".to_string())]]
    );
}

#[test]
fn copy_fields_carry_forward() {
    let store = snap_store();
    merge(&store, "a,b,c\n1,x,keep\n", date(2010, 1, 1), SnapshotMode::Full).unwrap();

    let req = request(date(2011, 1, 1), SnapshotMode::Full).copy_fields(&["c"]);
    let report = TemporalMerge::new(&store, MergeConfig::default())
        .run(&req, csv_source("a,b\n1,y\n2,z\n"))
        .unwrap();

    assert_eq!(report.superseded, 1);
    assert_eq!(report.inserted, 2);
    assert_eq!(
        rows(&store),
        vec![
            row("1", "x", Some("keep"), "[2010-01-01,2011-01-01)"),
            row("1", "y", Some("keep"), "[2011-01-01,9999-12-30)"),
            row("2", "z", None, "[2011-01-01,9999-12-30)"),
        ]
    );
}

#[test]
fn constraint_violation_rolls_back_everything() {
    let store = seeded();
    let err = merge(&store, "a,b\n3,y\n3,z\n", date(2011, 1, 1), SnapshotMode::Full).unwrap_err();
    assert!(err.is_constraint_violation(), "{err}");
    assert_eq!(err.error_code(), "CONSTRAINT_VIOLATION");
    assert_eq!(rows(&store), seed_rows());
    assert!(staging_tables(&store).is_empty());
    assert!(store.connection().is_autocommit());
}

#[test]
fn callback_failure_rolls_back() {
    let store = seeded();
    let err = TemporalMerge::new(&store, MergeConfig::default())
        .run_with_callback(
            &request(date(2011, 1, 1), SnapshotMode::Full),
            csv_source("a,b\n1,changed\n"),
            |_, _| Err(ValidtimeError::Callback("cache refresh failed".into())),
        )
        .unwrap_err();
    assert!(matches!(err, ValidtimeError::Callback(_)));
    assert_eq!(rows(&store), seed_rows());
}

#[test]
fn callback_sees_merged_state_before_commit() {
    let store = seeded();
    let seen_current = Cell::new(0usize);
    let report = TemporalMerge::new(&store, MergeConfig::default())
        .run_with_callback(
            &request(date(2011, 1, 1), SnapshotMode::Delta),
            csv_source("a,b\n9,new\n"),
            |ctx, store| {
                assert_eq!(ctx.table, "snap");
                assert_eq!(ctx.mode, SnapshotMode::Delta);
                assert_eq!(ctx.keys, ["a".to_string()]);
                assert_eq!(ctx.as_of, date(2011, 1, 1));
                assert_eq!(ctx.report.inserted, 1);
                assert!(!store.connection().is_autocommit());
                seen_current.set(store.current_rows::<DateKind>("snap", "valid")?.len());
                Ok(())
            },
        )
        .unwrap();
    assert_eq!(seen_current.get(), 5);
    assert_eq!(report.inserted, 1);
}

#[test]
fn malformed_row_aborts_before_any_change() {
    let store = seeded();
    let err = merge(&store, "a,b\n1,x\n2\n", date(2011, 1, 1), SnapshotMode::Full).unwrap_err();
    assert!(matches!(err, ValidtimeError::MalformedInput { line: 3, .. }), "{err}");
    assert_eq!(rows(&store), seed_rows());
    assert!(staging_tables(&store).is_empty());
}

#[test]
fn header_problems_are_rejected_up_front() {
    let store = seeded();
    let err = merge(&store, "a,zzz\n1,2\n", date(2011, 1, 1), SnapshotMode::Full).unwrap_err();
    assert!(matches!(err, ValidtimeError::MalformedInput { line: 1, .. }));

    let err = merge(&store, "b\nx\n", date(2011, 1, 1), SnapshotMode::Full).unwrap_err();
    assert!(matches!(err, ValidtimeError::InvalidArgument(_)));

    assert!(matches!(
        TabularSource::from_reader(std::io::Cursor::new(Vec::new()), ""),
        Err(ValidtimeError::MalformedInput { .. })
    ));
    assert_eq!(rows(&store), seed_rows());
}

#[test]
fn bad_arguments_are_invalid() {
    let store = seeded();
    assert!(matches!(
        "weekly".parse::<SnapshotMode>(),
        Err(ValidtimeError::InvalidArgument(_))
    ));

    let no_keys = MergeRequest::<DateKind>::new("snap", &[], date(2011, 1, 1));
    let err = TemporalMerge::new(&store, MergeConfig::default())
        .run(&no_keys, csv_source("a,b\n1,y\n"))
        .unwrap_err();
    assert!(matches!(err, ValidtimeError::InvalidArgument(_)));

    let wrong_kind = MergeRequest::<InstantKind>::new("snap", &["a"], instant("2011-01-01 00:00:00"));
    let err = TemporalMerge::new(&store, MergeConfig::default())
        .run(&wrong_kind, csv_source("a,b\n1,y\n"))
        .unwrap_err();
    assert!(matches!(err, ValidtimeError::InvalidArgument(_)));

    let err = TemporalMerge::new(&store, MergeConfig::default())
        .run(
            &MergeRequest::<DateKind>::new("missing", &["a"], date(2011, 1, 1)),
            csv_source("a\n1\n"),
        )
        .unwrap_err();
    assert!(matches!(
        err,
        ValidtimeError::StorageError(StorageError::TableNotFound { .. })
    ));
    assert_eq!(rows(&store), seed_rows());
}

#[test]
fn instant_table_merge() {
    let store = category_store();
    let report = TemporalMerge::new(&store, MergeConfig::default())
        .run(
            &MergeRequest::<InstantKind>::new("category", &["cat"], instant("1997-01-01 00:00:00+00")),
            csv_source("cat\n1\n5\n"),
        )
        .unwrap();
    assert_eq!(report.vanished, 1);
    assert_eq!(report.unchanged, 1);
    assert_eq!(report.inserted, 1);
    assert_eq!(
        query_text(&store, "SELECT valid FROM category WHERE id = 3"),
        vec![vec![Some(
            "[1996-03-01 00:00:00.000000+0000,1997-01-01 00:00:00.000000+0000)".to_string()
        )]]
    );
    assert_eq!(
        query_text(&store, "SELECT valid FROM category WHERE cat = 5"),
        vec![vec![Some(
            "[1997-01-01 00:00:00.000000+0000,9999-12-30 00:00:00.000000+0000)".to_string()
        )]]
    );
}

#[test]
fn terminating_at_or_before_start_fails_and_rolls_back() {
    let store = category_store();
    let before = query_text(&store, "SELECT id, cat, valid FROM category ORDER BY id");
    let run = |as_of: &str| {
        TemporalMerge::new(&store, MergeConfig::default())
            .run(
                &MergeRequest::<InstantKind>::new("category", &["cat"], instant(as_of)),
                csv_source("cat\n2\n"),
            )
            .unwrap_err()
    };

    // Category 1 became current on 1996-10-01.
    let at_start = run("1996-10-01 00:00:00+00");
    assert!(at_start.is_constraint_violation(), "{at_start}");

    let before_start = run("1996-09-01 00:00:00+00");
    assert!(matches!(
        before_start,
        ValidtimeError::StorageError(StorageError::SqliteError { .. })
    ));

    assert_eq!(
        query_text(&store, "SELECT id, cat, valid FROM category ORDER BY id"),
        before
    );
}

#[test]
fn merge_from_file_and_report_json() {
    let dir = temp_dir();
    let path = write_snapshot(dir.path(), "snap.csv", SEED);
    let store = snap_store();
    let source = TabularSource::from_path(&path, "").unwrap();
    let report = merge_snapshot(
        &store,
        source,
        &request(date(2010, 1, 1), SnapshotMode::Full),
        None,
    )
    .unwrap();
    assert_eq!(report.inserted, 4);

    let json = serde_json::to_value(report).unwrap();
    assert_eq!(json["inserted"], 4);
    assert_eq!(json["vanished"], 0);
    assert_eq!(rows(&store), seed_rows());
    assert_eq!(store.table_columns("snap").unwrap().len(), 5);
}

fn span_store() -> SqliteStore {
    let store = memory_store();
    keyed_table(
        "spans",
        RangeSubtype::Date,
        &[("a", "INTEGER"), ("span", "DATERANGE")],
        &["a"],
    )
    .create(&store)
    .unwrap();
    store
}

fn merge_spans(store: &SqliteStore, csv: &str, as_of: NaiveDate) -> ValidtimeResult<MergeReport> {
    TemporalMerge::new(store, MergeConfig::default()).run(
        &MergeRequest::<DateKind>::new("spans", &["a"], as_of),
        csv_source(csv),
    )
}

#[test]
fn range_columns_compare_in_canonical_form() {
    let store = span_store();
    merge_spans(&store, "a,span\n1,\"[2000-01-01,2000-02-01]\"\n", date(2010, 1, 1)).unwrap();
    let spans = || query_text(&store, "SELECT a, span, valid FROM spans ORDER BY valid");
    let first = vec![vec![
        Some("1".to_string()),
        Some("[2000-01-01,2000-02-02)".to_string()),
        Some("[2010-01-01,9999-12-30)".to_string()),
    ]];
    assert_eq!(spans(), first);

    // Same range, other spellings.
    for (csv, as_of) in [
        ("a,span\n1,\"[2000-01-01,2000-02-02)\"\n", date(2010, 2, 1)),
        ("a,span\n1,\"(1999-12-31,2000-02-01]\"\n", date(2010, 3, 1)),
    ] {
        let report = merge_spans(&store, csv, as_of).unwrap();
        assert_eq!(report.unchanged, 1, "{csv}");
        assert!(report.is_noop(), "{csv}");
    }
    assert_eq!(spans(), first);

    let changed = merge_spans(&store, "a,span\n1,\"[2000-01-01,2000-03-01]\"\n", date(2010, 4, 1))
        .unwrap();
    assert_eq!((changed.superseded, changed.inserted), (1, 1));
    assert_eq!(spans()[1][1].as_deref(), Some("[2000-01-01,2000-03-02)"));
}

#[test]
fn malformed_range_cell_rolls_back() {
    let store = span_store();
    merge_spans(&store, "a,span\n1,\"[2000-01-01,2000-02-01)\"\n", date(2010, 1, 1)).unwrap();
    let before = query_text(&store, "SELECT a, span, valid FROM spans");

    let err = merge_spans(&store, "a,span\n1,not a range\n", date(2010, 2, 1)).unwrap_err();
    assert!(matches!(err, ValidtimeError::StorageError(_)), "{err}");
    assert_eq!(query_text(&store, "SELECT a, span, valid FROM spans"), before);
    assert!(query_text(
        &store,
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name LIKE 'spans\\_%' ESCAPE '\\'",
    )
    .is_empty());
}

#[test]
fn large_identical_snapshot_remerges_in_linear_time() {
    const KEYS: usize = 30_000;
    let mut csv = String::from("a,b\n");
    for a in 0..KEYS {
        csv.push_str(&format!("{a},value-{}\n", a % 97));
    }
    let store = snap_store();
    let first = merge(&store, &csv, date(2010, 1, 1), SnapshotMode::Full).unwrap();
    assert_eq!(first.inserted, KEYS as u64);

    let again = merge(&store, &csv, date(2011, 1, 1), SnapshotMode::Full).unwrap();
    assert_eq!(again.unchanged, KEYS as u64);
    assert!(again.is_noop());
    // A per-row scan of the unchanged keys takes tens of seconds at this size.
    assert!(again.elapsed_ms < 10_000, "re-merge took {} ms", again.elapsed_ms);
}

#[test]
fn null_token_comes_from_merge_config() {
    let store = snap_store();
    let config = MergeConfig {
        null_token: "NULL".to_string(),
        ..MergeConfig::default()
    };
    let merge = TemporalMerge::new(&store, config);
    let source = merge
        .source_from_reader(std::io::Cursor::new(b"a,b,c\n1,NULL,\n".to_vec()))
        .unwrap();
    merge
        .run(&request(date(2010, 1, 1), SnapshotMode::Full), source)
        .unwrap();
    assert_eq!(
        query_text(&store, "SELECT b, c FROM snap"),
        vec![vec![None, Some(String::new())]]
    );

    let dir = temp_dir();
    let path = write_snapshot(dir.path(), "nulls.csv", "a,b,c\n1,NULL,\n");
    let report = merge
        .run(
            &request(date(2011, 1, 1), SnapshotMode::Full),
            merge.source_from_path(&path).unwrap(),
        )
        .unwrap();
    assert!(report.is_noop());
}

//! Integration tests for the batch driver.
//!
//! A scripted provider stands in for the remote service so per-row failure
//! containment, file naming and combined output can be checked on disk.

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use divlab_core::batch::{run_batch, BatchError, BatchOptions, RowError};
use divlab_core::data::{BatchProgress, DataError, DividendProvider};
use divlab_core::domain::DividendRecord;

fn record(date: &str, amount: &str) -> DividendRecord {
    DividendRecord {
        div_date: date.into(),
        div_amount: amount.into(),
        div_payment_type: "3".into(),
        pay_date: "2024-11-14".into(),
        yield_pct: "0.44%".into(),
        ticker: None,
    }
}

/// Serves canned results per asset id and records every call.
struct ScriptedProvider {
    responses: HashMap<String, Vec<DividendRecord>>,
    calls: RefCell<Vec<String>>,
}

impl ScriptedProvider {
    fn new() -> Self {
        Self {
            responses: HashMap::new(),
            calls: RefCell::new(Vec::new()),
        }
    }

    fn with(mut self, id: &str, records: Vec<DividendRecord>) -> Self {
        self.responses.insert(id.to_string(), records);
        self
    }
}

impl DividendProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn fetch_dividends(&self, asset_id: &str) -> Result<Vec<DividendRecord>, DataError> {
        self.calls.borrow_mut().push(asset_id.to_string());
        match asset_id {
            "500" => Err(DataError::Http { status: 500 }),
            "down" => Err(DataError::Transport("connection refused".into())),
            id => self.responses.get(id).cloned().ok_or_else(|| {
                DataError::MalformedResponse("missing `data.investingAsset`".into())
            }),
        }
    }
}

#[derive(Default)]
struct RecordingProgress {
    lines: RefCell<Vec<String>>,
}

impl BatchProgress for RecordingProgress {
    fn on_start(&self, ticker: &str, asset_id: &str, _index: usize, _total: usize) {
        self.lines
            .borrow_mut()
            .push(format!("start {ticker} {asset_id}"));
    }

    fn on_saved(&self, ticker: &str, count: usize, _path: &Path) {
        self.lines.borrow_mut().push(format!("saved {ticker} {count}"));
    }

    fn on_failed(&self, ticker: &str, asset_id: &str, error: &RowError) {
        self.lines
            .borrow_mut()
            .push(format!("error {ticker} {asset_id}: {error}"));
    }

    fn on_combined(&self, _path: &Path, total_records: usize) {
        self.lines
            .borrow_mut()
            .push(format!("combined {total_records}"));
    }
}

fn write_input(dir: &Path, content: &str) -> PathBuf {
    let path = dir.join("assets.csv");
    std::fs::write(&path, content).unwrap();
    path
}

fn options(input: PathBuf, out: PathBuf, combined: Option<&str>) -> BatchOptions {
    BatchOptions {
        input_file: input,
        output_dir: out,
        combined: combined.map(String::from),
    }
}

#[test]
fn failing_row_is_skipped_and_batch_continues() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), "id,ticker\n12345,ACME\n99999,BADID\n6408,AAPL\n");
    let out = dir.path().join("out");

    let provider = ScriptedProvider::new()
        .with("12345", vec![record("2024-11-08", "0.25"), record("2024-08-09", "0.24")])
        .with("6408", vec![record("2024-11-08", "0.25")]);
    let progress = RecordingProgress::default();

    let summary = run_batch(&provider, &options(input, out.clone(), None), &progress).unwrap();

    assert_eq!(*provider.calls.borrow(), vec!["12345", "99999", "6408"]);
    assert_eq!(summary.total, 3);
    assert_eq!(summary.succeeded, 2);
    assert_eq!(summary.failed, 1);
    assert!(!summary.all_succeeded());
    assert_eq!(summary.errors[0].0, "BADID");

    assert!(out.join("ACME_dividends.csv").exists());
    assert!(out.join("AAPL_dividends.csv").exists());
    assert!(!out.join("BADID_dividends.csv").exists());

    let acme = std::fs::read_to_string(out.join("ACME_dividends.csv")).unwrap();
    let lines: Vec<&str> = acme.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "ticker,div_date,div_amount,div_payment_type,pay_date,yield");
    assert!(lines[1].starts_with("ACME,2024-11-08,0.25"));

    let log = progress.lines.borrow();
    let error_lines: Vec<&String> = log.iter().filter(|l| l.starts_with("error")).collect();
    assert_eq!(error_lines.len(), 1);
    assert!(error_lines[0].contains("BADID"));
    assert!(error_lines[0].contains("99999"));
}

#[test]
fn every_error_kind_is_contained() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), "id,ticker\n500,HTTP\ndown,NET\n   ,BLANK\n1,OK\n");
    let out = dir.path().join("out");

    // The scripted provider has no answer for "   ", so that row is malformed.
    let provider = ScriptedProvider::new().with("1", vec![record("2024-01-01", "1")]);
    let summary = run_batch(
        &provider,
        &options(input, out.clone(), Some("all.csv")),
        &RecordingProgress::default(),
    )
    .unwrap();

    assert_eq!(provider.calls.borrow().len(), 4);
    assert_eq!(summary.failed, 3);
    assert!(matches!(
        summary.errors[0].1,
        RowError::Fetch(DataError::Http { status: 500 })
    ));
    assert!(matches!(summary.errors[1].1, RowError::Fetch(DataError::Transport(_))));

    let combined = std::fs::read_to_string(out.join("all.csv")).unwrap();
    assert_eq!(combined.lines().count(), 2);
    assert!(combined.lines().nth(1).unwrap().starts_with("OK,"));
}

#[test]
fn unwritable_asset_file_is_skipped_and_batch_continues() {
    let dir = tempfile::tempdir().unwrap();
    // The slash puts BRK/B_dividends.csv in a subdirectory that does not exist.
    let input = write_input(dir.path(), "id,ticker\n1,BRK/B\n2,ACME\n");
    let out = dir.path().join("out");

    let provider = ScriptedProvider::new()
        .with("1", vec![record("2024-03-01", "1")])
        .with("2", vec![record("2024-06-01", "2")]);
    let progress = RecordingProgress::default();

    let summary = run_batch(
        &provider,
        &options(input, out.clone(), Some("all.csv")),
        &progress,
    )
    .unwrap();

    assert_eq!(*provider.calls.borrow(), vec!["1", "2"]);
    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.errors[0].0, "BRK/B");
    assert!(matches!(summary.errors[0].1, RowError::Write(_)));
    assert_eq!(summary.records_fetched, 1);

    assert!(out.join("ACME_dividends.csv").exists());
    let combined = std::fs::read_to_string(out.join("all.csv")).unwrap();
    let lines: Vec<&str> = combined.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[1].starts_with("ACME,"));

    let log = progress.lines.borrow();
    assert!(log.iter().any(|l| l.starts_with("error BRK/B 1:")));
}

#[test]
fn missing_ticker_uses_id_for_file_and_column() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), "id\n6408\n");
    let out = dir.path().join("out");
    let provider = ScriptedProvider::new().with("6408", vec![record("2024-11-08", "0.25")]);

    run_batch(&provider, &options(input, out.clone(), None), &RecordingProgress::default())
        .unwrap();

    let content = std::fs::read_to_string(out.join("6408_dividends.csv")).unwrap();
    for line in content.lines().skip(1) {
        assert!(line.starts_with("6408,"), "line: {line}");
    }
}

#[test]
fn combined_file_is_concatenation_in_row_order() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), "id,ticker\n1,AAA\n2,BBB\n3,CCC\n");
    let out = dir.path().join("nested").join("out");

    let provider = ScriptedProvider::new()
        .with("1", vec![record("2024-03-01", "1"), record("2023-03-01", "2")])
        .with("3", vec![record("2024-06-01", "3")]);
    let progress = RecordingProgress::default();

    let summary = run_batch(
        &provider,
        &options(input, out.clone(), Some("combined.csv")),
        &progress,
    )
    .unwrap();

    assert_eq!(summary.records_fetched, 3);
    assert_eq!(summary.combined_path.as_deref(), Some(out.join("combined.csv").as_path()));

    let combined = std::fs::read_to_string(out.join("combined.csv")).unwrap();
    let aaa = std::fs::read_to_string(out.join("AAA_dividends.csv")).unwrap();
    let ccc = std::fs::read_to_string(out.join("CCC_dividends.csv")).unwrap();

    let mut expected: Vec<&str> = vec![aaa.lines().next().unwrap()];
    expected.extend(aaa.lines().skip(1));
    expected.extend(ccc.lines().skip(1));
    assert_eq!(combined.lines().collect::<Vec<_>>(), expected);

    assert_eq!(progress.lines.borrow().last().unwrap(), "combined 3");
}

#[test]
fn no_combined_file_unless_requested() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), "id,ticker\n1,AAA\n");
    let out = dir.path().join("out");
    let provider = ScriptedProvider::new().with("1", vec![record("2024-03-01", "1")]);

    let summary =
        run_batch(&provider, &options(input, out.clone(), None), &RecordingProgress::default())
            .unwrap();

    assert!(summary.combined_path.is_none());
    let files: Vec<_> = std::fs::read_dir(&out).unwrap().collect();
    assert_eq!(files.len(), 1);
}

#[test]
fn combined_file_written_even_when_every_row_fails() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), "id,ticker\n500,X\n");
    let out = dir.path().join("out");

    run_batch(
        &ScriptedProvider::new(),
        &options(input, out.clone(), Some("all.csv")),
        &RecordingProgress::default(),
    )
    .unwrap();

    let combined = std::fs::read_to_string(out.join("all.csv")).unwrap();
    assert_eq!(combined.lines().count(), 1);
}

#[test]
fn existing_output_directory_is_reused() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), "id,ticker\n1,AAA\n");
    let out = dir.path().join("out");
    std::fs::create_dir_all(&out).unwrap();
    std::fs::write(out.join("keep.txt"), "x").unwrap();

    let provider = ScriptedProvider::new().with("1", vec![record("2024-03-01", "1")]);
    run_batch(&provider, &options(input, out.clone(), None), &RecordingProgress::default())
        .unwrap();

    assert!(out.join("keep.txt").exists());
    assert!(out.join("AAA_dividends.csv").exists());
}

#[test]
fn rerun_produces_identical_files() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), "id,ticker\n1,AAA\n2,BBB\n");
    let provider = ScriptedProvider::new()
        .with("1", vec![record("2024-03-01", "1")])
        .with("2", vec![record("2024-04-01", "2"), record("2024-01-01", "3")]);

    let out_a = dir.path().join("a");
    let out_b = dir.path().join("b");
    let progress = RecordingProgress::default();
    run_batch(&provider, &options(input.clone(), out_a.clone(), Some("all.csv")), &progress).unwrap();
    run_batch(&provider, &options(input, out_b.clone(), Some("all.csv")), &progress).unwrap();

    for name in ["AAA_dividends.csv", "BBB_dividends.csv", "all.csv"] {
        assert_eq!(
            std::fs::read(out_a.join(name)).unwrap(),
            std::fs::read(out_b.join(name)).unwrap(),
            "{name} differs between runs"
        );
    }
}

#[test]
fn bad_input_aborts_before_any_fetch() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), "symbol,ticker\nX,Y\n");
    let provider = ScriptedProvider::new();

    let err = run_batch(
        &provider,
        &options(input, dir.path().join("out"), None),
        &RecordingProgress::default(),
    )
    .unwrap_err();

    assert!(matches!(err, BatchError::InputFormat(_)));
    assert!(provider.calls.borrow().is_empty());
    assert!(!dir.path().join("out").exists());
}

#[test]
fn unusable_output_directory_aborts() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), "id,ticker\n1,AAA\n");
    // A regular file where the output directory should go.
    let blocker = dir.path().join("out");
    std::fs::write(&blocker, "not a dir").unwrap();

    let provider = ScriptedProvider::new().with("1", vec![record("2024-03-01", "1")]);
    let err = run_batch(&provider, &options(input, blocker, None), &RecordingProgress::default())
        .unwrap_err();

    assert!(matches!(err, BatchError::Io { .. }));
    assert!(provider.calls.borrow().is_empty());
}

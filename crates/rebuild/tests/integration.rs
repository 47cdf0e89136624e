use std::path::Path;

use bbb_frame::{Column, DType, Frame};
use bbb_io::native;
use bbb_rebuild::{run, DescriptionIssue, Input, RebuildConfig, RebuildError};
use rust_xlsxwriter::Workbook;
use tempfile::{tempdir, TempDir};

const DESCRIPTION: &str = "## Bookbinders Book Club\n\nPurchase history for BBB customers.\n";

const CONFIG: &str = r#"
[sources]
nonbook = "data/bbb_nonbook.xlsx"
"#;

// -------------------------------------------------------------------------
// Fixtures
// -------------------------------------------------------------------------

fn write_sources(dir: &Path) {
    let data = dir.join("data");
    std::fs::create_dir_all(&data).unwrap();

    std::fs::write(
        data.join("bbb_demographics.tsv"),
        "acctnum\tgender\tstate\tzip\n\
         10001\tM\tNY\t10019\n\
         10002\tF\tMA\t2134\n\
         10003\tF\tNY\t10011\n",
    )
    .unwrap();

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.write_string(0, 0, "acctnum").unwrap();
    sheet.write_string(0, 1, "nonbook").unwrap();
    for (row, (acct, amount)) in [(10001.0, 40.0), (10002.0, 15.0)].into_iter().enumerate() {
        sheet.write_number(row as u32 + 1, 0, acct).unwrap();
        sheet.write_number(row as u32 + 1, 1, amount).unwrap();
    }
    workbook.save(data.join("bbb_nonbook.xlsx")).unwrap();

    let conn = rusqlite::Connection::open(data.join("bbb.sqlite")).unwrap();
    conn.execute_batch(
        "CREATE TABLE buyer (acctnum INTEGER, buyer TEXT, training INTEGER);
         INSERT INTO buyer VALUES (10001, 'yes', 1), (10002, 'no', 0);
         CREATE TABLE purchase (acctnum INTEGER, date INTEGER, purchase TEXT, price REAL);
         INSERT INTO purchase VALUES
             (10001, 14000, 'child', 10.6),
             (10001, 14610, 'cook', 20.6),
             (10002, 14610, 'art', 9.9);",
    )
    .unwrap();

    std::fs::write(data.join("bbb_description.txt"), DESCRIPTION).unwrap();
}

fn s(v: &str) -> Option<String> {
    Some(v.to_string())
}

fn int32(name: &str, values: [i32; 3]) -> Column {
    Column::int32(name, values.into_iter().map(Some).collect())
}

/// The table the fixture sources should rebuild to, written out by hand.
fn expected_table() -> Frame {
    Frame::new(vec![
        Column::str("acctnum", vec![s("10001"), s("10002"), s("10003")]),
        Column::categorical("gender", &[s("M"), s("F"), s("F")]),
        Column::categorical("state", &[s("NY"), s("MA"), s("NY")]),
        Column::str("zip", vec![s("10019"), s("02134"), s("10011")]),
        Column::str("zip3", vec![s("100"), s("021"), s("100")]),
        int32("first", [22, 2, 0]),
        int32("last", [2, 2, 0]),
        int32("book", [31, 9, 0]),
        int32("nonbook", [40, 15, 0]),
        int32("total", [71, 24, 0]),
        int32("purch", [2, 1, 0]),
        int32("child", [1, 0, 0]),
        int32("youth", [0, 0, 0]),
        int32("cook", [1, 0, 0]),
        int32("do_it", [0, 0, 0]),
        int32("reference", [0, 0, 0]),
        int32("art", [0, 1, 0]),
        int32("geog", [0, 0, 0]),
        Column::categorical("buyer", &[s("yes"), s("no"), None]),
        int32("training", [1, 0, 0]),
    ])
    .unwrap()
    .with_description(DESCRIPTION)
}

fn workspace(reference: &Frame) -> TempDir {
    let dir = tempdir().unwrap();
    write_sources(dir.path());
    native::save(reference, &dir.path().join("data/bbb.bbt")).unwrap();
    dir
}

fn config() -> RebuildConfig {
    RebuildConfig::from_toml(CONFIG).unwrap()
}

fn output_path(dir: &TempDir) -> std::path::PathBuf {
    dir.path().join("data/bbb_rec.bbt")
}

// -------------------------------------------------------------------------
// Success
// -------------------------------------------------------------------------

#[test]
fn matching_reference_writes_output() {
    let dir = workspace(&expected_table());

    let outcome = run(&config(), dir.path()).unwrap();

    assert_eq!(outcome.output, output_path(&dir));
    assert!(outcome.output.is_file());
    let written = native::load(&outcome.output).unwrap();
    assert!(bbb_frame::frames_equal(&written, &expected_table()));
    assert_eq!(written.description.as_deref(), Some(DESCRIPTION));
    assert_eq!(outcome.fingerprint, native::fingerprint(&outcome.output).unwrap());
}

#[test]
fn repeated_runs_are_byte_identical() {
    let dir = workspace(&expected_table());
    let first = run(&config(), dir.path()).unwrap().fingerprint;
    let second = run(&config(), dir.path()).unwrap().fingerprint;
    assert_eq!(first, second);
}

#[test]
fn every_account_appears_once_in_demographics_order() {
    let dir = workspace(&expected_table());
    let table = run(&config(), dir.path()).unwrap().table;
    assert_eq!(
        table.column("acctnum").unwrap().as_str().unwrap(),
        &[s("10001"), s("10002"), s("10003")]
    );
}

#[test]
fn output_dtypes_follow_target_schema() {
    let dir = workspace(&expected_table());
    let table = run(&config(), dir.path()).unwrap().table;
    for (name, dtype) in table.dtypes() {
        let expected = match name {
            "acctnum" | "zip" | "zip3" => DType::Str,
            "gender" | "state" | "buyer" => DType::Categorical,
            _ => DType::Int32,
        };
        assert_eq!(dtype, expected, "column {name}");
    }
}

// -------------------------------------------------------------------------
// Failures
// -------------------------------------------------------------------------

#[test]
fn value_mismatch_blocks_write() {
    let mut reference = expected_table();
    reference.replace_column(int32("book", [31, 10, 0])).unwrap();
    let dir = workspace(&reference);

    let err = run(&config(), dir.path()).unwrap_err();

    let report = err.mismatch_report().expect("frame mismatch");
    assert!(report.to_string().contains("book: 1 value mismatch(es)"));
    assert!(!output_path(&dir).exists());
}

#[test]
fn dtype_mismatch_is_shown_in_dtype_table() {
    let mut reference = expected_table();
    reference.cast("training", DType::Int64).unwrap();
    let dir = workspace(&reference);

    let err = run(&config(), dir.path()).unwrap_err();

    let report = err.mismatch_report().expect("frame mismatch").to_string();
    let line = report.lines().find(|l| l.starts_with("training")).unwrap();
    assert!(line.contains("int32"));
    assert!(line.contains("int64"));
    assert!(line.ends_with("false"));
    assert!(!output_path(&dir).exists());
}

#[test]
fn description_mismatch_blocks_write() {
    let reference = expected_table().with_description("something else");
    let dir = workspace(&reference);

    let err = run(&config(), dir.path()).unwrap_err();

    assert!(matches!(err, RebuildError::DescriptionMismatch(DescriptionIssue::Differs)));
    assert!(err.to_string().contains("description"));
    assert!(!output_path(&dir).exists());
}

#[test]
fn frame_failure_reported_before_description_failure() {
    let mut reference = expected_table().with_description("something else");
    reference.replace_column(int32("geog", [0, 0, 1])).unwrap();
    let dir = workspace(&reference);

    let err = run(&config(), dir.path()).unwrap_err();
    assert!(matches!(err, RebuildError::FrameMismatch(_)));
}

#[test]
fn missing_purchase_table_is_a_load_error() {
    let dir = workspace(&expected_table());
    let conn = rusqlite::Connection::open(dir.path().join("data/bbb.sqlite")).unwrap();
    conn.execute_batch("DROP TABLE purchase;").unwrap();
    drop(conn);

    let err = run(&config(), dir.path()).unwrap_err();

    assert!(matches!(err, RebuildError::Load { input: Input::Database, .. }));
    assert!(err.to_string().contains("no table 'purchase'"));
}

#[test]
fn missing_reference_is_a_reference_error() {
    let dir = workspace(&expected_table());
    std::fs::remove_file(dir.path().join("data/bbb.bbt")).unwrap();

    let err = run(&config(), dir.path()).unwrap_err();

    assert!(matches!(err, RebuildError::Reference(_)));
    assert!(!output_path(&dir).exists());
}

#[test]
fn reference_path_can_be_overridden() {
    let dir = workspace(&expected_table());
    let pinned = dir.path().join("pinned.bbt");
    std::fs::rename(dir.path().join("data/bbb.bbt"), &pinned).unwrap();

    let mut config = config();
    config.reference.set_location(pinned.to_str().unwrap());

    run(&config, dir.path()).unwrap();
    assert!(output_path(&dir).is_file());
}

#[test]
fn text_in_nonbook_sheet_is_a_load_error() {
    let dir = workspace(&expected_table());
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.write_string(0, 0, "acctnum").unwrap();
    sheet.write_string(0, 1, "nonbook").unwrap();
    sheet.write_number(1, 0, 10001.0).unwrap();
    sheet.write_number(1, 1, 40.0).unwrap();
    sheet.write_number(2, 0, 10002.0).unwrap();
    sheet.write_string(2, 1, "n/a").unwrap();
    workbook.save(dir.path().join("data/bbb_nonbook.xlsx")).unwrap();

    let err = run(&config(), dir.path()).unwrap_err();

    assert!(
        matches!(
            err,
            RebuildError::NonNumericColumn { input: Input::Nonbook, ref column, dtype: DType::Str, .. }
                if column == "nonbook"
        ),
        "{err:?}"
    );
    assert_eq!(
        err.to_string(),
        "nonbook: column 'nonbook' must be numeric, found string (e.g. 'n/a')"
    );
    assert!(!output_path(&dir).exists());
}

#[test]
fn text_price_in_database_is_a_load_error() {
    let dir = workspace(&expected_table());
    let conn = rusqlite::Connection::open(dir.path().join("data/bbb.sqlite")).unwrap();
    conn.execute_batch("INSERT INTO purchase VALUES (10003, 14610, 'geog', 'free');").unwrap();
    drop(conn);

    let err = run(&config(), dir.path()).unwrap_err();

    assert!(
        matches!(err, RebuildError::NonNumericColumn { input: Input::Database, ref column, .. } if column == "price"),
        "{err:?}"
    );
    assert!(err.to_string().contains("'free'"));
    assert!(!output_path(&dir).exists());
}

// Pipeline: load sources, rebuild the account table, verify, write.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use bbb_frame::{Column, DType, Frame, Value};
use bbb_io::{csv, fetch, native, sqlite, text, xlsx};
use tracing::info;

use crate::aggregate::{category_totals, decode_purchases, recency, Category};
use crate::config::{DatesConfig, RebuildConfig, SourcesConfig};
use crate::error::{Input, RebuildError};
use crate::{schema, transform, validate};

pub const KEY: &str = "acctnum";

const BUYER_FIELDS: [&str; 3] = ["acctnum", "buyer", "training"];
const PURCHASE_FIELDS: [&str; 4] = ["acctnum", "date", "purchase", "price"];

// ---------------------------------------------------------------------------
// Sources
// ---------------------------------------------------------------------------

/// Raw inputs, as read.
#[derive(Debug, Clone)]
pub struct Sources {
    pub demographics: Frame,
    pub nonbook: Frame,
    pub buyer: Frame,
    pub purchase: Frame,
    pub description: String,
}

/// Read every source. Relative paths resolve against `base`.
pub fn load_sources(config: &SourcesConfig, base: &Path) -> Result<Sources, RebuildError> {
    let demographics = csv::import_tsv(&base.join(&config.demographics))
        .map_err(RebuildError::load(Input::Demographics))?;
    require_columns(&demographics, Input::Demographics, &[KEY, "zip"])?;
    info!(rows = demographics.nrows(), "loaded demographics");

    let nonbook = xlsx::import_first_sheet(&base.join(&config.nonbook))
        .map_err(RebuildError::load(Input::Nonbook))?;
    require_columns(&nonbook, Input::Nonbook, &[KEY, "nonbook"])?;
    require_numeric(&nonbook, Input::Nonbook, &["nonbook"])?;
    info!(rows = nonbook.nrows(), "loaded nonbook");

    let (buyer, purchase) = load_database(&base.join(&config.database))
        .map_err(RebuildError::load(Input::Database))?;
    require_numeric(&buyer, Input::Database, &["training"])?;
    require_numeric(&purchase, Input::Database, &["date", "price"])?;
    info!(buyer = buyer.nrows(), purchase = purchase.nrows(), "loaded database");

    let description = text::read_description(&base.join(&config.description))
        .map_err(RebuildError::load(Input::Description))?;
    info!(chars = description.chars().count(), "loaded description");

    Ok(Sources { demographics, nonbook, buyer, purchase, description })
}

fn load_database(path: &Path) -> Result<(Frame, Frame), bbb_io::IoError> {
    let conn = sqlite::open(path)?;
    sqlite::require_table(&conn, "buyer", &BUYER_FIELDS)?;
    sqlite::require_table(&conn, "purchase", &PURCHASE_FIELDS)?;
    Ok((sqlite::read_table(&conn, "buyer")?, sqlite::read_table(&conn, "purchase")?))
}

fn require_columns(frame: &Frame, input: Input, names: &[&str]) -> Result<(), RebuildError> {
    match names.iter().find(|n| !frame.has_column(n)) {
        Some(missing) => Err(RebuildError::MissingColumn { input, column: missing.to_string() }),
        None => Ok(()),
    }
}

/// Reject text in columns that are summed, counted or read as day offsets.
fn require_numeric(frame: &Frame, input: Input, names: &[&str]) -> Result<(), RebuildError> {
    for name in names {
        let column = frame.column(name)?;
        if column.dtype().is_numeric() {
            continue;
        }
        let sample = (0..column.len())
            .map(|row| column.get(row))
            .find(|v| matches!(v, Value::Str(s) if s.trim().parse::<f64>().is_err()))
            .map(|v| v.to_string());
        return Err(RebuildError::NonNumericColumn {
            input,
            column: name.to_string(),
            dtype: column.dtype(),
            sample,
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Rebuild
// ---------------------------------------------------------------------------

/// Build the account table from `sources`. Pure; touches no files.
///
/// One row per demographics account, in demographics order. Accounts with
/// no purchase, nonbook or buyer row get zero counts and null labels.
pub fn rebuild(sources: &Sources, dates: &DatesConfig) -> Result<Frame, RebuildError> {
    let mut base = transform::normalize_zip(&sources.demographics)?;
    base.cast(KEY, DType::Int64)?;
    ensure_unique_accounts(&base)?;

    let purchases = decode_purchases(&sources.purchase, dates.epoch)?;
    let recency = recency(&purchases, dates.reference_date)?;
    let totals = category_totals(&purchases)?;
    info!(purchases = purchases.len(), accounts = recency.nrows(), "aggregated purchases");

    let nonbook = keyed(&sources.nonbook, &[KEY, "nonbook"])?;
    let buyer = keyed(&sources.buyer, &BUYER_FIELDS)?;

    let mut joined = base
        .left_join(&recency, KEY)?
        .left_join(&totals, KEY)?
        .left_join(&nonbook, KEY)?
        .left_join(&buyer, KEY)?;
    info!(rows = joined.nrows(), cols = joined.ncols(), "joined sources");

    schema::fill_missing_counts(&mut joined)?;
    add_derived(&mut joined)?;

    let mut table = schema::conform(&joined)?;
    table.description = Some(sources.description.clone());
    info!(rows = table.nrows(), cols = table.ncols(), "cast to target schema");
    Ok(table)
}

fn ensure_unique_accounts(frame: &Frame) -> Result<(), RebuildError> {
    let keys = frame.column(KEY)?.as_int64()?;
    let mut seen = HashSet::with_capacity(keys.len());
    for (row, key) in keys.iter().enumerate() {
        let key = key.ok_or_else(|| RebuildError::MissingValue {
            input: Input::Demographics,
            field: KEY.to_string(),
            row,
        })?;
        if !seen.insert(key) {
            return Err(RebuildError::DuplicateAccount(key.to_string()));
        }
    }
    Ok(())
}

/// `names` of `frame`, with the key as `Int64`.
fn keyed(frame: &Frame, names: &[&str]) -> Result<Frame, RebuildError> {
    let mut out = frame.select(names)?;
    out.cast(KEY, DType::Int64)?;
    Ok(out)
}

/// `purch` = purchases across the seven categories;
/// `total` = `book` + `nonbook`, truncated later with the rest.
fn add_derived(frame: &mut Frame) -> Result<(), RebuildError> {
    let mut purch = vec![Some(0i64); frame.nrows()];
    for cat in Category::ALL {
        let counts = frame.column(cat.as_str())?.cast(DType::Int64)?;
        for (acc, n) in purch.iter_mut().zip(counts.as_int64()?) {
            *acc = acc.zip(*n).map(|(a, n)| a + n);
        }
    }

    let book = frame.column("book")?.cast(DType::Float64)?;
    let nonbook = frame.column("nonbook")?.cast(DType::Float64)?;
    let total = book
        .as_float64()?
        .iter()
        .zip(nonbook.as_float64()?)
        .map(|(b, n)| b.zip(*n).map(|(b, n)| b + n))
        .collect();

    frame.push_column(Column::int64("purch", purch))?;
    frame.push_column(Column::float64("total", total))?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Run
// ---------------------------------------------------------------------------

/// Result of a successful run.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub table: Frame,
    pub output: PathBuf,
    /// BLAKE3 digest of the written artifact.
    pub fingerprint: String,
}

/// Load the reference table named by the config.
pub fn load_reference(config: &RebuildConfig, base: &Path) -> Result<Frame, RebuildError> {
    let source = fetch::resolve(config.reference.source(), base);
    info!(%source, "loading reference table");
    let reference = fetch::load_reference(&source, config.reference.timeout())
        .map_err(RebuildError::Reference)?;
    info!(rows = reference.nrows(), cols = reference.ncols(), "loaded reference table");
    Ok(reference)
}

/// Load the sources and rebuild the table.
pub fn build(config: &RebuildConfig, base: &Path) -> Result<Frame, RebuildError> {
    let sources = load_sources(&config.sources, base)?;
    rebuild(&sources, &config.dates)
}

/// Verify `table` against the reference and, only when both checks pass,
/// write it to the configured output path.
pub fn publish(config: &RebuildConfig, base: &Path, table: Frame) -> Result<RunOutcome, RebuildError> {
    let reference = load_reference(config, base)?;
    validate::verify(&table, &reference)?;
    info!("rebuilt table matches reference");

    let output = base.join(&config.output.path);
    native::save(&table, &output).map_err(RebuildError::Write)?;
    let fingerprint = native::fingerprint(&output).map_err(RebuildError::Write)?;
    info!(path = %output.display(), %fingerprint, "wrote output");

    Ok(RunOutcome { table, output, fingerprint })
}

/// Full run: [`build`] then [`publish`].
pub fn run(config: &RebuildConfig, base: &Path) -> Result<RunOutcome, RebuildError> {
    let table = build(config, base)?;
    publish(config, base, table)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! On-disk layout for raw downloads and the processed market panel.

use std::collections::BTreeSet;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use copbrief_primitives::{Date, Ticker};
use polars::prelude::*;
use tracing::debug;

use crate::DataError;

/// Processed panel location relative to the storage base directory.
pub const MARKET_DAILY: &str = "processed/market_daily.parquet";

/// Create `path` and its parents if needed.
///
/// # Errors
/// Propagates filesystem errors.
pub fn ensure_dir(path: impl AsRef<Path>) -> Result<PathBuf, DataError> {
    let path = path.as_ref();
    fs::create_dir_all(path)?;
    Ok(path.to_path_buf())
}

/// Create and return `base/raw/<subdir>/<date>`.
///
/// # Errors
/// Propagates filesystem errors.
pub fn date_folder(base: impl AsRef<Path>, subdir: &str, date: Date) -> Result<PathBuf, DataError> {
    ensure_dir(base.as_ref().join("raw").join(subdir).join(date.format("%Y-%m-%d").to_string()))
}

/// Remove everything inside `path` except `.gitkeep`.
///
/// A missing directory is left alone.
///
/// # Errors
/// Propagates filesystem errors.
pub fn clean_directory(path: impl AsRef<Path>) -> Result<(), DataError> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(());
    }
    for entry in fs::read_dir(path)? {
        let entry = entry?;
        if entry.file_name() == ".gitkeep" {
            continue;
        }
        if entry.file_type()?.is_dir() {
            fs::remove_dir_all(entry.path())?;
        } else {
            fs::remove_file(entry.path())?;
        }
    }
    Ok(())
}

/// Write one CSV with `date,close` columns per ticker of `long`.
///
/// Files are named after [`Ticker::file_stem`].
///
/// Returns the written paths in ticker order.
///
/// # Errors
/// Returns [`DataError::MissingColumn`] when `ticker` is absent, and
/// propagates Polars and filesystem errors.
pub fn save_closes_per_symbol(long: &DataFrame, dir: impl AsRef<Path>) -> Result<Vec<PathBuf>, DataError> {
    let dir = ensure_dir(dir)?;
    let tickers: BTreeSet<String> = long
        .column("ticker")
        .map_err(|_| DataError::MissingColumn("ticker".to_string()))?
        .str()?
        .into_iter()
        .flatten()
        .map(str::to_string)
        .collect();

    let mut written = Vec::with_capacity(tickers.len());
    for ticker in tickers {
        let mut df = long
            .clone()
            .lazy()
            .filter(col("ticker").eq(lit(ticker.as_str())))
            .select([col("date"), col("close")])
            .sort(["date"], SortMultipleOptions::default())
            .collect()?;
        let path = dir.join(format!("{}.csv", Ticker::new(ticker.as_str()).file_stem()));
        let mut file = File::create(&path)?;
        CsvWriter::new(&mut file).include_header(true).finish(&mut df)?;
        debug!(%ticker, path = %path.display(), rows = df.height(), "saved closes");
        written.push(path);
    }
    Ok(written)
}

/// Write `df` to a Parquet file, creating parent directories.
///
/// # Errors
/// Propagates Polars and filesystem errors.
pub fn write_parquet(df: &DataFrame, path: impl AsRef<Path>) -> Result<(), DataError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    let file = File::create(path)?;
    ParquetWriter::new(file).finish(&mut df.clone())?;
    Ok(())
}

/// Read a Parquet file written by [`write_parquet`].
///
/// # Errors
/// Propagates Polars and filesystem errors.
pub fn read_parquet(path: impl AsRef<Path>) -> Result<DataFrame, DataError> {
    let file = File::open(path)?;
    Ok(ParquetReader::new(file).finish()?)
}

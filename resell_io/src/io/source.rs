//! CSV transaction source.
//!
//! Reads `product_id,price,date_created` rows from one file or from every `*.csv`
//! in a directory. Extra columns are ignored. Rows with an empty, non-numeric or
//! non-finite (`NaN`, `inf`) price are skipped (counted and logged); an unparseable
//! timestamp fails the read.

use std::{
    fs,
    path::{Path, PathBuf},
};

use chrono_tz::Tz;
use resell_core::{Transaction, TransactionSource};
use serde::Deserialize;
use snafu::{Backtrace, ResultExt, Snafu};
use tracing::{debug, warn};

use crate::tz::{self, DstPolicy, TimestampError};

/// Errors from reading transactions or catalog rows.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum SourceError {
    /// The configured path does not exist.
    #[snafu(display("input path not found: {}", path.display()))]
    Missing { path: PathBuf, backtrace: Backtrace },

    /// Listing an input directory failed.
    #[snafu(display("failed to list {}: {source}", path.display()))]
    ListDir {
        path: PathBuf,
        source: std::io::Error,
        backtrace: Backtrace,
    },

    /// Opening a CSV file failed.
    #[snafu(display("failed to open {}: {source}", path.display()))]
    Open {
        path: PathBuf,
        source: csv::Error,
        backtrace: Backtrace,
    },

    /// A row could not be decoded.
    #[snafu(display("bad row in {} (line {line}): {source}", path.display()))]
    Row {
        path: PathBuf,
        line: u64,
        source: csv::Error,
        backtrace: Backtrace,
    },

    /// A timestamp cell could not be parsed or converted.
    #[snafu(display("bad timestamp in {} (line {line}): {source}", path.display()))]
    Timestamp {
        path: PathBuf,
        line: u64,
        source: TimestampError,
    },
}

#[derive(Debug, Deserialize)]
struct TransactionRow {
    product_id: String,
    #[serde(deserialize_with = "csv::invalid_option")]
    price: Option<f64>,
    date_created: String,
}

/// Transactions read from CSV files.
#[derive(Debug, Clone)]
pub struct CsvTransactionSource {
    path: PathBuf,
    exclude: Vec<PathBuf>,
    source_tz: Tz,
    dst_policy: DstPolicy,
}

impl CsvTransactionSource {
    /// Source over a single file or a directory of CSV files, naive timestamps in UTC.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            exclude: Vec::new(),
            source_tz: chrono_tz::UTC,
            dst_policy: DstPolicy::default(),
        }
    }

    /// Interpret naive timestamps in `tz`.
    pub fn with_source_tz(mut self, tz: Tz) -> Self {
        self.source_tz = tz;
        self
    }

    /// DST handling for naive timestamps.
    pub fn with_dst_policy(mut self, policy: DstPolicy) -> Self {
        self.dst_policy = policy;
        self
    }

    /// Skip this file when scanning a directory (the catalog usually sits beside
    /// the transaction files).
    pub fn excluding(mut self, path: impl Into<PathBuf>) -> Self {
        self.exclude.push(path.into());
        self
    }

    fn is_excluded(&self, candidate: &Path) -> bool {
        let canon = fs::canonicalize(candidate).ok();
        self.exclude.iter().any(|ex| {
            ex == candidate || (canon.is_some() && fs::canonicalize(ex).ok() == canon)
        })
    }

    /// Files that will be read, sorted by path.
    pub fn files(&self) -> Result<Vec<PathBuf>, SourceError> {
        if !self.path.exists() {
            return MissingSnafu { path: &self.path }.fail();
        }
        if self.path.is_file() {
            return Ok(vec![self.path.clone()]);
        }
        let mut files = Vec::new();
        for entry in fs::read_dir(&self.path).context(ListDirSnafu { path: &self.path })? {
            let path = entry.context(ListDirSnafu { path: &self.path })?.path();
            let is_csv = path
                .extension()
                .is_some_and(|e| e.eq_ignore_ascii_case("csv"));
            if is_csv && path.is_file() && !self.is_excluded(&path) {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    fn read_file(&self, path: &Path, out: &mut Vec<Transaction>) -> Result<usize, SourceError> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_path(path)
            .context(OpenSnafu { path })?;

        let mut skipped = 0;
        for (i, row) in rdr.deserialize::<TransactionRow>().enumerate() {
            // header is line 1
            let line = i as u64 + 2;
            let row = row.context(RowSnafu { path, line })?;
            let Some(price) = row.price.filter(|p| p.is_finite()) else {
                skipped += 1;
                continue;
            };
            let date_created =
                tz::parse_timestamp(&row.date_created, self.source_tz, self.dst_policy)
                    .context(TimestampSnafu { path, line })?;
            out.push(Transaction::new(row.product_id, price, date_created));
        }
        Ok(skipped)
    }
}

impl TransactionSource for CsvTransactionSource {
    type Error = SourceError;

    fn fetch_all(&self) -> Result<Vec<Transaction>, SourceError> {
        let mut out = Vec::new();
        for file in self.files()? {
            let before = out.len();
            let skipped = self.read_file(&file, &mut out)?;
            if skipped > 0 {
                warn!(file = %file.display(), skipped, "rows without a usable price were skipped");
            }
            debug!(file = %file.display(), rows = out.len() - before, "read transactions");
        }
        Ok(out)
    }
}

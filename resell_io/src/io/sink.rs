//! CSV result sink.
//!
//! - `emit_series` writes `<dir>/<label>.csv`, replacing any earlier file.
//! - `emit_log` appends to `<dir>/<log_file>`; the header is written only when
//!   the file is created, so repeated runs accumulate one log.

use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

use resell_core::{InterpolationLogEntry, MarketSeries, ProductSeries, ResultSink};
use snafu::{Backtrace, ResultExt, Snafu};
use tracing::info;

/// Errors from writing results.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum SinkError {
    /// Creating the output directory or file failed.
    #[snafu(display("failed to create {}: {source}", path.display()))]
    Create {
        path: PathBuf,
        source: std::io::Error,
        backtrace: Backtrace,
    },

    /// Serializing a record failed.
    #[snafu(display("failed to write {}: {source}", path.display()))]
    Serialize {
        path: PathBuf,
        source: csv::Error,
        backtrace: Backtrace,
    },

    /// Flushing buffered output failed.
    #[snafu(display("failed to flush {}: {source}", path.display()))]
    Flush {
        path: PathBuf,
        source: std::io::Error,
        backtrace: Backtrace,
    },
}

/// Write a market series as CSV (`period_start,market_resell_index,contributors`).
pub fn write_market_csv<W: Write>(
    w: W,
    series: &MarketSeries,
    path: &Path,
) -> Result<(), SinkError> {
    let mut wtr = csv::Writer::from_writer(w);
    for p in &series.points {
        wtr.serialize(p).context(SerializeSnafu { path })?;
    }
    wtr.flush().context(FlushSnafu { path })
}

/// Write a product series as CSV, one row per bucket.
pub fn write_product_csv<W: Write>(
    w: W,
    series: &ProductSeries,
    path: &Path,
) -> Result<(), SinkError> {
    let mut wtr = csv::Writer::from_writer(w);
    for p in &series.points {
        wtr.serialize(p).context(SerializeSnafu { path })?;
    }
    wtr.flush().context(FlushSnafu { path })
}

/// Write log entries as CSV, with or without the header row.
pub fn write_log_csv<W: Write>(
    w: W,
    entries: &[InterpolationLogEntry],
    header: bool,
    path: &Path,
) -> Result<(), SinkError> {
    let mut wtr = csv::WriterBuilder::new().has_headers(header).from_writer(w);
    for e in entries {
        wtr.serialize(e).context(SerializeSnafu { path })?;
    }
    wtr.flush().context(FlushSnafu { path })
}

/// Writes series and log files under one directory.
#[derive(Debug, Clone)]
pub struct CsvSink {
    dir: PathBuf,
    log_file: String,
}

impl CsvSink {
    /// Sink rooted at `dir`, appending log entries to `dir/log_file`.
    pub fn new(dir: impl Into<PathBuf>, log_file: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            log_file: log_file.into(),
        }
    }

    /// Where a series with `label` is written.
    pub fn series_path(&self, label: &str) -> PathBuf {
        self.dir.join(format!("{label}.csv"))
    }

    /// Where log entries are appended.
    pub fn log_path(&self) -> PathBuf {
        self.dir.join(&self.log_file)
    }

    fn ensure_dir(&self) -> Result<(), SinkError> {
        fs::create_dir_all(&self.dir).context(CreateSnafu { path: &self.dir })
    }
}

impl ResultSink for CsvSink {
    type Error = SinkError;

    fn emit_series(&mut self, series: &MarketSeries, label: &str) -> Result<(), SinkError> {
        self.ensure_dir()?;
        let path = self.series_path(label);
        let file = fs::File::create(&path).context(CreateSnafu { path: &path })?;
        write_market_csv(file, series, &path)?;
        info!(path = %path.display(), buckets = series.points.len(), "wrote market series");
        Ok(())
    }

    fn emit_log(&mut self, entries: &[InterpolationLogEntry]) -> Result<(), SinkError> {
        if entries.is_empty() {
            return Ok(());
        }
        self.ensure_dir()?;
        let path = self.log_path();
        let is_new = !path.exists();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .context(CreateSnafu { path: &path })?;
        write_log_csv(file, entries, is_new, &path)?;
        info!(path = %path.display(), entries = entries.len(), "appended interpolation log");
        Ok(())
    }
}

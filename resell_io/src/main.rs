use std::io::{self, Write};
use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser;
use resell_core::{InterpolationLog, compute_product_series};
use resell_io::{
    cli::{Cli, Commands},
    config::AppConfig,
    io::{CsvSink, CsvTransactionSource, load_catalog, sink::write_product_csv},
    load_config_path, run_pipeline,
};
use tracing::{error, info};

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}

fn load(config: &Path, baseline: Option<DateTime<Utc>>) -> Result<AppConfig> {
    let mut cfg = load_config_path(config)?;
    if let Some(b) = baseline {
        cfg.index.baseline_date = b;
    }
    Ok(cfg)
}

fn source_for(cfg: &AppConfig) -> Result<CsvTransactionSource> {
    Ok(CsvTransactionSource::new(&cfg.input.transactions)
        .excluding(&cfg.input.catalog)
        .with_source_tz(cfg.source_tz()?)
        .with_dst_policy(cfg.input.dst_policy))
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { config, baseline } => {
            let cfg = load(&config, baseline)?;
            let source = source_for(&cfg)?;
            let catalog = load_catalog(&cfg.input.catalog).context("failed to load catalog")?;
            let mut sink = CsvSink::new(&cfg.output.dir, cfg.output.log_file.clone());

            let report = run_pipeline(&source, &catalog, &mut sink, &cfg)?;
            info!(?report, "pipeline finished");
            if report.is_empty() {
                error!("no product produced a usable series; market index is empty");
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Product {
            config,
            id,
            width,
            baseline,
        } => {
            let cfg = load(&config, baseline)?;
            let transactions = resell_core::TransactionSource::fetch_all(&source_for(&cfg)?)
                .context("failed to read transactions")?;
            let catalog = load_catalog(&cfg.input.catalog).context("failed to load catalog")?;

            let log = InterpolationLog::new();
            let series =
                compute_product_series(&transactions, &catalog, &id, width, &cfg.index, &log);
            if series.is_empty() {
                error!(product_id = %id, "no transactions at or after the baseline date");
                return Ok(ExitCode::FAILURE);
            }
            let stdout = io::stdout();
            let mut lock = stdout.lock();
            write_product_csv(&mut lock, &series, Path::new("<stdout>"))?;
            lock.flush()?;
            for e in log.drain() {
                info!(
                    product_id = %e.product_id,
                    date = %e.date_created,
                    column = ?e.column,
                    method = ?e.method,
                    original = ?e.original_value,
                    new = e.new_value,
                    "synthesized value"
                );
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn main() -> ExitCode {
    init_tracing();
    match run() {
        Ok(code) => code,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

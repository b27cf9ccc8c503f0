//! Resell market index computation.
//!
//! Turns raw resale transactions and product metadata into baseline-normalized
//! index series:
//! - [`product`]: one product's bucketed, repaired, rescaled series
//! - [`market`]: cross-product mean on a common grid, constituent selection, alpha sweeps
//! - [`baseline`], [`formula`], [`threshold`]: the building blocks the aggregators use
//! - [`log`]: the audit trail of every synthesized value
//! - [`sources`]: the collaborator traits plus in-memory implementations
//!
//! Nothing in here does I/O, and no computation returns an error: missing or
//! malformed per-product data is repaired and logged instead.

#![deny(missing_docs)]

pub mod baseline;
pub mod bucket;
pub mod fill;
pub mod formula;
pub mod log;
pub mod market;
pub mod models;
pub mod normalize;
pub mod params;
pub mod product;
pub mod sources;
pub mod threshold;

pub use bucket::BucketWidth;
pub use formula::FormulaKind;
pub use log::{InterpolationLog, InterpolationLogEntry, LogColumn, RepairMethod};
pub use market::{
    MarketRun, compute_alpha_sweep, compute_market_run, compute_market_series, select_constituents,
    sweep_label,
};
pub use models::{
    Baseline, Bucket, MarketPoint, MarketSeries, ProductId, ProductMeta, ProductPoint,
    ProductSeries, Provenance, Transaction,
};
pub use params::{IndexParams, MissingPricePolicy, ParamsError};
pub use product::compute_product_series;
pub use sources::{Catalog, MemorySink, ProductCatalog, ResultSink, TransactionSource, VecSource};

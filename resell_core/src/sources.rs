//! Collaborator seams.
//!
//! The aggregators only see these traits:
//! - [`TransactionSource`]: every resale record, fetched once per run
//! - [`ProductCatalog`]: per-product metadata, looked up by id
//! - [`ResultSink`]: receives market series and the interpolation log
//!
//! In-memory implementations live here too ([`VecSource`], [`Catalog`],
//! [`MemorySink`]); file-backed ones live in the I/O crate.

use std::convert::Infallible;

use indexmap::IndexMap;

use crate::{
    log::InterpolationLogEntry,
    models::{MarketSeries, ProductId, ProductMeta, Transaction},
};

/// Supplies every resale transaction.
pub trait TransactionSource {
    /// Failure to read or parse the underlying data.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Fetch all transactions; order is not significant.
    fn fetch_all(&self) -> Result<Vec<Transaction>, Self::Error>;
}

/// Per-product metadata lookup.
pub trait ProductCatalog {
    /// Every listed product, in catalog order.
    fn fetch_all(&self) -> Vec<ProductMeta>;

    /// Metadata for one product.
    fn get(&self, product_id: &str) -> Option<&ProductMeta>;

    /// Every listed product id, in catalog order.
    fn product_ids(&self) -> Vec<ProductId> {
        self.fetch_all().into_iter().map(|m| m.product_id).collect()
    }
}

/// Consumes computed series and log entries.
pub trait ResultSink {
    /// Failure to persist output.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Store one market series under `label`.
    fn emit_series(&mut self, series: &MarketSeries, label: &str) -> Result<(), Self::Error>;

    /// Append interpolation log entries.
    fn emit_log(&mut self, entries: &[InterpolationLogEntry]) -> Result<(), Self::Error>;
}

/// A [`TransactionSource`] over an owned vector.
#[derive(Debug, Clone, Default)]
pub struct VecSource(pub Vec<Transaction>);

impl TransactionSource for VecSource {
    type Error = Infallible;

    fn fetch_all(&self) -> Result<Vec<Transaction>, Self::Error> {
        Ok(self.0.clone())
    }
}

/// In-memory catalog keyed by product id; keeps insertion order.
///
/// A later entry for the same id replaces the earlier one.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    products: IndexMap<ProductId, ProductMeta>,
}

impl Catalog {
    /// An empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace one product.
    pub fn insert(&mut self, meta: ProductMeta) {
        self.products.insert(meta.product_id.clone(), meta);
    }

    /// Number of listed products.
    pub fn len(&self) -> usize {
        self.products.len()
    }

    /// True when no product is listed.
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

impl FromIterator<ProductMeta> for Catalog {
    fn from_iter<I: IntoIterator<Item = ProductMeta>>(iter: I) -> Self {
        let mut catalog = Catalog::new();
        for meta in iter {
            catalog.insert(meta);
        }
        catalog
    }
}

impl ProductCatalog for Catalog {
    fn fetch_all(&self) -> Vec<ProductMeta> {
        self.products.values().cloned().collect()
    }

    fn get(&self, product_id: &str) -> Option<&ProductMeta> {
        self.products.get(product_id)
    }

    fn product_ids(&self) -> Vec<ProductId> {
        self.products.keys().cloned().collect()
    }
}

/// A [`ResultSink`] that keeps everything in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    /// Emitted series with their labels, in emission order.
    pub series: Vec<(String, MarketSeries)>,
    /// Emitted log entries, in emission order.
    pub log: Vec<InterpolationLogEntry>,
}

impl MemorySink {
    /// The most recent series emitted under `label`.
    pub fn series_labelled(&self, label: &str) -> Option<&MarketSeries> {
        self.series
            .iter()
            .rev()
            .find(|(l, _)| l == label)
            .map(|(_, s)| s)
    }
}

impl ResultSink for MemorySink {
    type Error = Infallible;

    fn emit_series(&mut self, series: &MarketSeries, label: &str) -> Result<(), Self::Error> {
        self.series.push((label.to_string(), series.clone()));
        Ok(())
    }

    fn emit_log(&mut self, entries: &[InterpolationLogEntry]) -> Result<(), Self::Error> {
        self.log.extend_from_slice(entries);
        Ok(())
    }
}

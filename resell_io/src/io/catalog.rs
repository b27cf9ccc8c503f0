//! CSV product catalog (`product_id,original_price,name`).
//!
//! An empty or non-numeric `original_price` loads as absent; the aggregator then
//! applies its missing-price policy. A repeated `product_id` keeps the last row.

use std::path::Path;

use resell_core::{Catalog, ProductMeta};
use serde::Deserialize;
use snafu::ResultExt;
use tracing::debug;

use super::source::{MissingSnafu, OpenSnafu, RowSnafu, SourceError};

#[derive(Debug, Deserialize)]
struct CatalogRow {
    product_id: String,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    original_price: Option<f64>,
    #[serde(default)]
    name: String,
}

/// Load a catalog file into an in-memory [`Catalog`].
pub fn load_catalog(path: impl AsRef<Path>) -> Result<Catalog, SourceError> {
    let path = path.as_ref();
    if !path.exists() {
        return MissingSnafu { path }.fail();
    }
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .context(OpenSnafu { path })?;

    let mut catalog = Catalog::new();
    for (i, row) in rdr.deserialize::<CatalogRow>().enumerate() {
        let line = i as u64 + 2;
        let row = row.context(RowSnafu { path, line })?;
        catalog.insert(ProductMeta {
            product_id: row.product_id,
            original_price: row.original_price,
            name: row.name,
        });
    }
    debug!(file = %path.display(), products = catalog.len(), "loaded catalog");
    Ok(catalog)
}

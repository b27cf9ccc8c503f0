#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use resell_core::{Catalog, ProductMeta, Transaction};

/// 2025-02-`d` at `h`:00 UTC.
pub fn at(d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 2, d, h, 0, 0).unwrap()
}

pub fn tx(id: &str, price: f64, when: DateTime<Utc>) -> Transaction {
    Transaction::new(id, price, when)
}

/// `n` identical sales of `id` at `price`, one per minute from `start`.
pub fn burst(id: &str, price: f64, start: DateTime<Utc>, n: usize) -> Vec<Transaction> {
    (0..n)
        .map(|i| tx(id, price, start + chrono::Duration::minutes(i as i64)))
        .collect()
}

pub fn catalog(entries: &[(&str, Option<f64>)]) -> Catalog {
    entries
        .iter()
        .map(|(id, price)| ProductMeta {
            product_id: id.to_string(),
            original_price: *price,
            name: format!("Item {id}"),
        })
        .collect()
}

pub fn ids(v: &[&str]) -> Vec<String> {
    v.iter().map(|s| s.to_string()).collect()
}

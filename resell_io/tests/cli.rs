mod common;
use common::{Workspace, read};

use std::path::PathBuf;
use std::process::{Command, Output};

use resell_io::pipeline::DAILY_LABEL;

fn resell_index(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_resell-index"))
        .args(args)
        .env("RUST_LOG", "warn")
        .output()
        .expect("run resell-index")
}

/// Workspace with the given transactions, a two-product catalog, and a config file.
fn workspace(transactions: &str) -> (Workspace, PathBuf) {
    let ws = Workspace::new();
    ws.write("data/transactions.csv", transactions);
    ws.write(
        "data/product_meta.csv",
        "product_id,original_price,name\n1,100,Sneaker\n2,50,Hoodie\n",
    );
    let config = ws.write("resell.toml", &ws.config_toml("formula = \"plain\"", ""));
    (ws, config)
}

fn path_arg(p: &std::path::Path) -> &str {
    p.to_str().expect("utf-8 temp path")
}

#[test]
fn run_fails_when_every_trade_precedes_the_baseline() {
    let (ws, config) = workspace(
        "product_id,price,date_created\n\
         1,100,2025-01-20 10:00:00\n\
         2,50,2025-01-21 10:00:00\n",
    );

    let out = resell_index(&["run", "--config", path_arg(&config)]);
    assert!(!out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    // the same trades count once the baseline moves back
    let out = resell_index(&[
        "run",
        "--config",
        path_arg(&config),
        "--baseline",
        "2025-01-20",
    ]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    let daily = read(&ws.out().join(format!("{DAILY_LABEL}.csv")));
    assert!(daily.starts_with("period_start,market_resell_index,contributors\n"));
}

#[test]
fn product_prints_its_series_on_stdout() {
    let (_ws, config) = workspace(
        "product_id,price,date_created\n\
         1,100,2025-01-31 10:00:00\n\
         1,120,2025-02-01 10:00:00\n\
         2,50,2025-01-31 10:00:00\n",
    );

    let out = resell_index(&["product", "--config", path_arg(&config), "--id", "1"]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    insta::assert_snapshot!(String::from_utf8_lossy(&out.stdout), @r"
    period_start,avg_price,total_volume,resell_index,normalized_premium
    2025-01-31T00:00:00Z,100.0,1,100.0,0.0
    2025-02-01T00:00:00Z,120.0,1,120.0,20.0
    ");
}

#[test]
fn product_without_trades_fails_with_empty_stdout() {
    let (_ws, config) = workspace("product_id,price,date_created\n2,50,2025-01-31 10:00:00\n");

    let out = resell_index(&["product", "--config", path_arg(&config), "--id", "1"]);
    assert!(!out.status.success());
    assert!(out.stdout.is_empty());
}

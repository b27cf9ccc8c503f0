mod common;
use common::{Workspace, at, read};

use resell_core::{
    Catalog, MemorySink, ProductMeta, ResultSink, Transaction, TransactionSource, VecSource,
};
use resell_io::{
    io::{CsvSink, CsvTransactionSource, load_catalog},
    load_config_str,
    pipeline::{DAILY_LABEL, FOUR_HOUR_LABEL},
    run_pipeline,
};

fn meta(id: &str, price: Option<f64>) -> ProductMeta {
    ProductMeta {
        product_id: id.into(),
        original_price: price,
        name: format!("Item {id}"),
    }
}

#[test]
fn in_memory_pipeline_emits_every_series_and_the_log() {
    let ws = Workspace::new();
    let cfg = load_config_str(&ws.config_toml("", "constituents = 1\nalphas = [0.5]")).unwrap();

    let source = VecSource(vec![
        Transaction::new("1", 100.0, at(2025, 1, 31, 10)),
        Transaction::new("1", 110.0, at(2025, 1, 31, 11)),
        Transaction::new("1", 120.0, at(2025, 2, 1, 9)),
        Transaction::new("2", 60.0, at(2025, 1, 31, 15)),
        Transaction::new("2", 70.0, at(2025, 2, 2, 15)),
        // only before the baseline
        Transaction::new("3", 10.0, at(2025, 1, 20, 0)),
    ]);
    let catalog: Catalog = [meta("1", Some(100.0)), meta("2", None), meta("3", Some(5.0))]
        .into_iter()
        .collect();
    let mut sink = MemorySink::default();

    let report = run_pipeline(&source, &catalog, &mut sink, &cfg).unwrap();

    assert_eq!(report.transactions, 6);
    assert_eq!(report.products_considered, 3);
    assert_eq!(report.daily_contributors, 2);
    assert_eq!(report.daily_buckets, 3);
    assert_eq!(report.constituents, vec!["1".to_string()]);
    assert_eq!(report.four_hour_contributors, 1);
    assert_eq!(report.sweep_labels, vec!["alpha=0.5".to_string()]);
    // product 2 has no list price: one substitution per pass that includes it
    assert_eq!(report.log_entries, 2);
    assert!(!report.is_empty());

    let labels: Vec<&str> = sink.series.iter().map(|(l, _)| l.as_str()).collect();
    assert_eq!(labels, vec![DAILY_LABEL, FOUR_HOUR_LABEL, "alpha=0.5"]);
    let daily = sink.series_labelled(DAILY_LABEL).unwrap();
    assert_eq!(daily.skipped, vec!["3".to_string()]);
    assert_eq!(daily.points[0].market_resell_index, 100.0);
    assert_eq!(sink.log.len(), 2);
}

#[test]
fn empty_market_is_reported_not_raised() {
    let ws = Workspace::new();
    let cfg = load_config_str(&ws.config_toml("", "")).unwrap();
    let source = VecSource(vec![Transaction::new("1", 100.0, at(2025, 1, 1, 0))]);
    let catalog: Catalog = [meta("1", Some(100.0))].into_iter().collect();
    let mut sink = MemorySink::default();

    let report = run_pipeline(&source, &catalog, &mut sink, &cfg).unwrap();
    assert!(report.is_empty());
    assert!(report.constituents.is_empty());
    assert!(sink.series.iter().all(|(_, s)| s.is_empty()));
}

#[test]
fn csv_pipeline_end_to_end() {
    let ws = Workspace::new();
    ws.write(
        "data/transactions.csv",
        "product_id,price,date_created\n\
         1,100,2025-01-31 10:00:00\n\
         1,120,2025-02-01 10:00:00\n\
         2,50,2025-01-31 10:00:00\n\
         2,50,2025-01-31 11:00:00\n\
         2,40,2025-02-01 10:00:00\n",
    );
    ws.write(
        "data/product_meta.csv",
        "product_id,original_price,name\n1,100,Sneaker\n2,50,Hoodie\n",
    );
    let cfg = load_config_str(&ws.config_toml("formula = \"plain\"", "constituents = 1")).unwrap();

    let source = CsvTransactionSource::new(&cfg.input.transactions)
        .excluding(&cfg.input.catalog)
        .with_source_tz(cfg.source_tz().unwrap());
    assert_eq!(source.fetch_all().unwrap().len(), 5);
    let catalog = load_catalog(&cfg.input.catalog).unwrap();
    let mut sink = CsvSink::new(&cfg.output.dir, cfg.output.log_file.clone());

    let report = run_pipeline(&source, &catalog, &mut sink, &cfg).unwrap();
    assert_eq!(report.constituents, vec!["2".to_string()]);
    assert_eq!(report.log_entries, 0);

    insta::assert_snapshot!(read(&sink.series_path(DAILY_LABEL)), @r"
    period_start,market_resell_index,contributors
    2025-01-31T00:00:00Z,100.0,2
    2025-02-01T00:00:00Z,80.0,2
    ");

    let fine = read(&sink.series_path(FOUR_HOUR_LABEL));
    let rows: Vec<&str> = fine.lines().skip(1).collect();
    // 08:00 on the 31st through 08:00 on the 1st
    assert_eq!(rows.len(), 7);
    assert_eq!(rows[0], "2025-01-31T08:00:00Z,100.0,1");
    assert_eq!(rows[1], "2025-01-31T12:00:00Z,0.0,0");
    assert_eq!(rows[6], "2025-02-01T08:00:00Z,40.0,1");

    assert!(!sink.log_path().exists());
}

#[test]
fn log_file_appends_with_a_single_header() {
    use resell_core::{InterpolationLogEntry, LogColumn, RepairMethod};

    let ws = Workspace::new();
    let mut sink = CsvSink::new(ws.out(), "interpolation_log.csv");
    let entry = |id: &str, original: Option<f64>, new_value: f64| InterpolationLogEntry {
        product_id: id.into(),
        date_created: at(2025, 1, 31, 0),
        column: LogColumn::AvgPrice,
        method: RepairMethod::AdjustedPrice,
        original_value: original,
        new_value,
    };

    sink.emit_log(&[entry("7", None, 10.0)]).unwrap();
    sink.emit_log(&[entry("8", Some(0.0), 10.0)]).unwrap();
    sink.emit_log(&[]).unwrap();

    insta::assert_snapshot!(read(&sink.log_path()), @r"
    product_id,date_created,column,method,original_value,new_value
    7,2025-01-31T00:00:00Z,avg_price,adjusted_price,,10.0
    8,2025-01-31T00:00:00Z,avg_price,adjusted_price,0.0,10.0
    ");
}

//! File-backed collaborators: CSV transaction source, catalog loader and result sink.

pub mod catalog;
pub mod sink;
pub mod source;

pub use catalog::load_catalog;
pub use sink::{CsvSink, SinkError};
pub use source::{CsvTransactionSource, SourceError};

//! Training progress reporting.
//!
//! - [`ConsoleLogger`]: fixed-width console table
//! - [`CsvLogger`]: CSV file output for analysis

pub mod logger;

pub use logger::{ConsoleLogger, CsvLogger, MetricsLogger};

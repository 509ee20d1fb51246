//! Artifact writers.
//!
//! Long-format tables are written as CSV (default) or Parquet, and quality
//! reports as `key: value` text files.
//!
//! # Example
//!
//! ```rust,ignore
//! use indicator_processing::reporting::ReportGenerator;
//! use indicator_processing::config::OutputFormat;
//!
//! let generator = ReportGenerator::new("data/processed");
//! let path = generator.write_long_table(&mut df, "worldbank_population", OutputFormat::Csv)?;
//! ```

mod generator;

pub use generator::ReportGenerator;

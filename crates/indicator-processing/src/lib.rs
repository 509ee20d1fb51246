//! Indicator Processing Library
//!
//! Acquisition, long-format normalization and quality reporting for public
//! health indicator datasets built with Rust and Polars.
//!
//! # Overview
//!
//! World Bank, WHO and UNDP exports arrive with metadata preambles, one
//! column per year or several indicators per row. This library turns them into
//! one canonical shape, `country_code, year, indicator, value`, restricted to a
//! fixed country and year universe:
//!
//! - **Header Detection**: Find the real header row behind metadata lines
//! - **Schema Registry**: Per-source reshape mode, rename table and filter
//! - **Reshaping**: Wide years, already long, and multi-field unpivots
//! - **Quality Reports**: Missing cells, duplicates and column types
//! - **Acquisition**: ZIP downloads, UNDP HDI queries and a provenance log
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use indicator_processing::{Pipeline, PipelineConfig};
//!
//! let pipeline = Pipeline::builder()
//!     .config(PipelineConfig::default())
//!     .build()?;
//!
//! // Reshape a registered source into data/processed/{stem}_long.csv
//! let summary = pipeline.clean_file(
//!     "data/raw/worldbank_population.csv",
//!     "worldbank_population",
//!     None,
//!     None,
//! )?;
//! println!("{} long rows written to {}", summary.output_rows, summary.output);
//!
//! // Quality report into data/quality/{stem}_quality_report.txt
//! let (report, _path) = pipeline.assess_file("data/raw/worldbank_population.csv", None)?;
//! println!("{}", report);
//! ```
//!
//! # Working on frames directly
//!
//! ```rust,ignore
//! use indicator_processing::{RawTable, ReshapeEngine, SchemaRegistry, CountryYearFilter};
//! use indicator_processing::header::detect_header_offset_in_file;
//!
//! let registry = SchemaRegistry::builtin(&CountryYearFilter::default());
//! let entry = registry.lookup("who_treatment_outcomes");
//!
//! let skip = detect_header_offset_in_file("who.csv", "iso3", 20)?;
//! let raw = RawTable::from_csv_path("who.csv", skip)?;
//! let cleaned = ReshapeEngine::clean(&raw, entry)?;
//! ```
//!
//! # Configuration
//!
//! Use [`PipelineConfig`] to change directories, the scan window or the
//! country/year universe:
//!
//! ```rust,ignore
//! use indicator_processing::config::*;
//!
//! let config = PipelineConfig::builder()
//!     .processed_dir("out/processed")
//!     .max_scan_lines(10)
//!     .filter(CountryYearFilter::new(["USA", "FRA"], 2015, 2020))
//!     .output_format(OutputFormat::Parquet)
//!     .build()?;
//! ```

pub mod acquire;
pub mod config;
pub mod error;
pub mod header;
pub mod loader;
pub mod pipeline;
pub mod provenance;
pub mod quality;
pub mod reporting;
pub mod reshape;
pub mod schema;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use config::{
    ConfigValidationError, CountryYearFilter, OutputFormat, PipelineConfig, PipelineConfigBuilder,
};
pub use error::{PipelineError, Result as PipelineResult, ResultExt};
pub use header::{detect_header_offset, detect_header_offset_in_file};
pub use loader::RawTable;
pub use pipeline::{Pipeline, PipelineBuilder};
pub use provenance::{MetadataLog, ProvenanceRecord};
pub use quality::{QualityAssessor, QualityReport};
pub use reporting::ReportGenerator;
pub use reshape::{Observation, ReshapeEngine, apply_post_filter};
pub use schema::{
    IndicatorSource, RenameMap, ReshapeMode, SchemaEntry, SchemaRegistry, ValueKind,
};
pub use types::{
    CleanOutput, CountryYearValue, IndicatorValue, LONG_COLUMNS, LongTable, ProcessingSummary,
};
pub use utils::is_missing_cell;

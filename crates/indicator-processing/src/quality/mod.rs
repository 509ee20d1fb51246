//! Data quality assessment.
//!
//! Produces flat summary statistics over a raw or cleaned table: row and
//! column counts, missing cells, duplicate rows and per-column dtypes.

mod analyzer;

pub use analyzer::{ColumnDtype, QualityAssessor, QualityReport};

//! Shared utilities for the indicator pipeline.
//!
//! Helpers used by the loader, the reshape engine and the quality assessor.

use crate::error::Result;
use polars::prelude::*;

// =============================================================================
// Data Type Utilities
// =============================================================================

/// Short dtype label used in quality reports.
pub fn dtype_label(dtype: &DataType) -> String {
    match dtype {
        DataType::String => "str".to_string(),
        DataType::Float64 => "f64".to_string(),
        DataType::Int64 => "i64".to_string(),
        other => format!("{}", other),
    }
}

// =============================================================================
// Cell Utilities
// =============================================================================

/// Cell contents read as missing, in addition to empty cells.
pub const MISSING_MARKERS: [&str; 19] = [
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN", "<NA>",
    "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null", "..",
];

/// Check if a raw cell is empty or a missing-value marker.
///
/// Markers are matched exactly after trimming.
///
/// # Example
///
/// ```rust,ignore
/// use indicator_processing::utils::is_missing_cell;
///
/// assert!(is_missing_cell("  "));
/// assert!(is_missing_cell("NaN"));
/// assert!(!is_missing_cell("0"));
/// ```
pub fn is_missing_cell(s: &str) -> bool {
    let trimmed = s.trim();
    trimmed.is_empty() || MISSING_MARKERS.contains(&trimmed)
}

/// Whether a column name is a bare year such as `2021`.
#[inline]
pub fn is_year_column(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_digit())
}

/// Column names of a frame, as owned strings.
pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .into_iter()
        .map(|s| s.to_string())
        .collect()
}

/// Read one column as optional strings, whatever its dtype.
pub fn string_cells(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let series = df
        .column(name)?
        .as_materialized_series()
        .cast(&DataType::String)?;
    let cells = series
        .str()?
        .into_iter()
        .map(|opt| opt.map(str::to_string))
        .collect();
    Ok(cells)
}

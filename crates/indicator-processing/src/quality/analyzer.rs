//! Quality assessment of raw tables.
//!
//! Counts are taken on the sanitized string frame; dtypes come from a
//! best-effort numeric coercion of each column.

use crate::error::Result;
use crate::loader::RawTable;
use crate::reshape::{coerce_numeric_columns, sanitize_column_names};
use crate::utils::{column_names, dtype_label, is_missing_cell};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info};

/// Dtype of one column after best-effort numeric coercion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDtype {
    pub column: String,
    pub dtype: String,
}

/// Summary statistics of one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityReport {
    #[serde(rename = "rows")]
    pub row_count: usize,
    #[serde(rename = "columns")]
    pub column_count: usize,
    #[serde(rename = "missing_values")]
    pub missing_value_count: usize,
    #[serde(rename = "duplicate_rows")]
    pub duplicate_row_count: usize,
    pub columns_with_missing: Vec<String>,
    /// In column order.
    #[serde(rename = "column_types")]
    pub column_dtypes: Vec<ColumnDtype>,
}

impl QualityReport {
    /// Render as `key: value` lines.
    pub fn to_text(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for QualityReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let missing = self
            .columns_with_missing
            .iter()
            .map(|c| format!("'{}'", c))
            .collect::<Vec<_>>()
            .join(", ");
        let dtypes = self
            .column_dtypes
            .iter()
            .map(|c| format!("'{}': '{}'", c.column, c.dtype))
            .collect::<Vec<_>>()
            .join(", ");

        writeln!(f, "rows: {}", self.row_count)?;
        writeln!(f, "columns: {}", self.column_count)?;
        writeln!(f, "missing_values: {}", self.missing_value_count)?;
        writeln!(f, "duplicate_rows: {}", self.duplicate_row_count)?;
        writeln!(f, "columns_with_missing: [{}]", missing)?;
        writeln!(f, "column_types: {{{}}}", dtypes)
    }
}

/// Computes [`QualityReport`]s.
pub struct QualityAssessor;

impl QualityAssessor {
    /// Assess a raw table. Column names are sanitized first; rows are not
    /// filtered.
    pub fn assess_raw(raw: &RawTable) -> Result<QualityReport> {
        Self::assess(raw.frame())
    }

    pub fn assess(df: &DataFrame) -> Result<QualityReport> {
        let df = sanitize_column_names(df.clone())?;

        let mut missing_value_count = 0;
        let mut columns_with_missing = Vec::new();
        for column in df.get_columns() {
            let missing = Self::count_missing(column.as_materialized_series())?;
            if missing > 0 {
                columns_with_missing.push(column.name().to_string());
                missing_value_count += missing;
            }
        }

        let duplicate_row_count = Self::count_duplicates(&df)?;

        let coerced = coerce_numeric_columns(df)?;
        let column_dtypes = coerced
            .get_columns()
            .iter()
            .map(|c| ColumnDtype {
                column: c.name().to_string(),
                dtype: dtype_label(c.dtype()),
            })
            .collect();

        let report = QualityReport {
            row_count: coerced.height(),
            column_count: coerced.width(),
            missing_value_count,
            duplicate_row_count,
            columns_with_missing,
            column_dtypes,
        };
        info!(
            "Quality: {} rows, {} columns, {} missing, {} duplicates",
            report.row_count,
            report.column_count,
            report.missing_value_count,
            report.duplicate_row_count
        );
        Ok(report)
    }

    /// Nulls plus, for string columns, empty or missing-marker cells.
    fn count_missing(series: &Series) -> Result<usize> {
        if series.dtype() != &DataType::String {
            return Ok(series.null_count());
        }
        let count = series
            .str()?
            .into_iter()
            .filter(|cell| cell.is_none_or(is_missing_cell))
            .count();
        Ok(count)
    }

    /// Rows equal to an earlier row.
    fn count_duplicates(df: &DataFrame) -> Result<usize> {
        if df.width() == 0 || df.height() == 0 {
            return Ok(0);
        }
        let unique = df.unique::<&str, &str>(None, UniqueKeepStrategy::First, None)?;
        let duplicates = df.height() - unique.height();
        debug!(
            "{} duplicate rows across {:?}",
            duplicates,
            column_names(df)
        );
        Ok(duplicates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> DataFrame {
        df![
            "Country Code" => ["USA", "CHN", "USA"],
            "2020" => [Some("1"), Some(""), Some("1")],
            "ratio" => [Some("0.5"), None, Some("0.5")],
            "Unnamed: 3" => ["", "", ""],
        ]
        .unwrap()
    }

    #[test]
    fn test_assess_counts() {
        let report = QualityAssessor::assess(&sample()).unwrap();

        assert_eq!(report.row_count, 3);
        assert_eq!(report.column_count, 3);
        assert_eq!(report.missing_value_count, 2);
        assert_eq!(report.duplicate_row_count, 1);
        assert_eq!(report.columns_with_missing, vec!["2020", "ratio"]);
        assert_eq!(
            report.column_dtypes,
            vec![
                ColumnDtype {
                    column: "Country Code".into(),
                    dtype: "str".into()
                },
                ColumnDtype {
                    column: "2020".into(),
                    dtype: "i64".into()
                },
                ColumnDtype {
                    column: "ratio".into(),
                    dtype: "f64".into()
                },
            ]
        );
    }

    #[test]
    fn test_render_text() {
        let report = QualityAssessor::assess(&sample()).unwrap();
        let text = report.to_text();
        assert_eq!(
            text,
            "rows: 3\n\
             columns: 3\n\
             missing_values: 2\n\
             duplicate_rows: 1\n\
             columns_with_missing: ['2020', 'ratio']\n\
             column_types: {'Country Code': 'str', '2020': 'i64', 'ratio': 'f64'}\n"
        );
    }

    #[test]
    fn test_json_keys() {
        let report = QualityAssessor::assess(&sample()).unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["rows"], 3);
        assert_eq!(json["duplicate_rows"], 1);
        assert_eq!(json["column_types"][0]["column"], "Country Code");
    }

    #[test]
    fn test_empty_frame() {
        let report = QualityAssessor::assess(&DataFrame::empty()).unwrap();
        assert_eq!(report.row_count, 0);
        assert_eq!(report.column_count, 0);
        assert_eq!(report.duplicate_row_count, 0);
    }
}

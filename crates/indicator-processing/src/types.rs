use crate::error::Result;
use crate::schema::ValueKind;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Column names of the canonical long table, in output order.
pub const LONG_COLUMNS: [&str; 4] = ["country_code", "year", "indicator", "value"];

/// A numeric observation, float or integer depending on the source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IndicatorValue {
    Integer(i64),
    Float(f64),
}

impl IndicatorValue {
    pub fn as_f64(&self) -> f64 {
        match self {
            Self::Integer(v) => *v as f64,
            Self::Float(v) => *v,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.as_f64() == 0.0
    }
}

/// One canonical row: a single observation for a country, year and indicator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryYearValue {
    pub country_code: String,
    pub year: i32,
    pub indicator: String,
    /// `None` when the source reported nothing for this cell.
    pub value: Option<IndicatorValue>,
}

/// Canonical long-format output of a registered source.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LongTable {
    pub rows: Vec<CountryYearValue>,
    pub value_kind: ValueKind,
}

impl LongTable {
    pub fn new(rows: Vec<CountryYearValue>, value_kind: ValueKind) -> Self {
        Self { rows, value_kind }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Build a frame with the [`LONG_COLUMNS`] layout.
    ///
    /// `value` is `Int64` for integer sources and `Float64` otherwise.
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let countries: Vec<&str> = self.rows.iter().map(|r| r.country_code.as_str()).collect();
        let years: Vec<i32> = self.rows.iter().map(|r| r.year).collect();
        let indicators: Vec<&str> = self.rows.iter().map(|r| r.indicator.as_str()).collect();

        let values = match self.value_kind {
            ValueKind::Integer => {
                let values: Vec<Option<i64>> = self
                    .rows
                    .iter()
                    .map(|r| match r.value {
                        Some(IndicatorValue::Integer(v)) => Some(v),
                        Some(IndicatorValue::Float(v)) if v.fract() == 0.0 => Some(v as i64),
                        _ => None,
                    })
                    .collect();
                Column::new(LONG_COLUMNS[3].into(), values)
            }
            ValueKind::Float => {
                let values: Vec<Option<f64>> = self
                    .rows
                    .iter()
                    .map(|r| r.value.map(|v| v.as_f64()))
                    .collect();
                Column::new(LONG_COLUMNS[3].into(), values)
            }
        };

        let df = DataFrame::new(vec![
            Column::new(LONG_COLUMNS[0].into(), countries),
            Column::new(LONG_COLUMNS[1].into(), years),
            Column::new(LONG_COLUMNS[2].into(), indicators),
            values,
        ])?;
        Ok(df)
    }
}

/// Result of cleaning one raw table.
#[derive(Debug, Clone)]
pub enum CleanOutput {
    /// A registered source reshaped into canonical rows.
    Long(LongTable),
    /// An unregistered source: the sanitized frame, otherwise untouched.
    PassThrough(DataFrame),
}

impl CleanOutput {
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        match self {
            Self::Long(table) => table.to_dataframe(),
            Self::PassThrough(df) => Ok(df.clone()),
        }
    }

    pub fn row_count(&self) -> usize {
        match self {
            Self::Long(table) => table.len(),
            Self::PassThrough(df) => df.height(),
        }
    }

    pub fn is_pass_through(&self) -> bool {
        matches!(self, Self::PassThrough(_))
    }
}

/// Summary of one `clean`/`transform` run, printed by the CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingSummary {
    pub source: String,
    pub input: String,
    pub output: String,
    pub header_offset: usize,
    pub input_rows: usize,
    pub output_rows: usize,
    pub pass_through: bool,
}

//! Reshape engine: raw tables to canonical long format.
//!
//! Dispatch is on the entry's [`ReshapeMode`]:
//!
//! - **WideYears**: one column per year, unpivoted column by column
//! - **AlreadyLong**: one row per country and year, country codes extracted
//! - **MultiField**: several mapped indicator columns per row
//!
//! Every mode is followed by the same post-filter, which keeps only rows whose
//! country is in the entry's allow-list and whose year lies in its range.
//! Unregistered sources are passed through after column sanitization.

pub(crate) mod converters;
pub(crate) mod sanitizers;
mod strategies;

pub use converters::{coerce_numeric_columns, coerce_value, parse_number, parse_year};
pub use sanitizers::{extract_iso3, find_country_column, sanitize_column_names};
pub use strategies::{VALUE_COLUMN, VARIABLE_COLUMN};

use crate::config::CountryYearFilter;
use crate::error::Result;
use crate::loader::RawTable;
use crate::schema::{ReshapeMode, SchemaEntry};
use crate::types::{CleanOutput, CountryYearValue, IndicatorValue, LongTable};
use polars::prelude::*;
use tracing::{debug, info};

/// An unpivoted row before the post-filter. Country and year may still be
/// missing here.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub country_code: Option<String>,
    pub year: Option<i32>,
    pub indicator: String,
    pub value: Option<IndicatorValue>,
}

/// Stateless reshape operations.
pub struct ReshapeEngine;

impl ReshapeEngine {
    /// Reshape a raw table into canonical rows for a registered source.
    ///
    /// Pure: the same input always yields the same rows in the same order.
    pub fn reshape(raw: &RawTable, entry: &SchemaEntry) -> Result<LongTable> {
        let observations = Self::unpivot(raw, entry)?;
        let before = observations.len();
        let rows = apply_post_filter(observations, &entry.post_filter);
        info!(
            "Reshaped '{}': {} observations, {} after filtering",
            entry.id,
            before,
            rows.len()
        );
        Ok(LongTable::new(rows, entry.value_kind))
    }

    /// Sanitize and unpivot without the post-filter.
    pub fn unpivot(raw: &RawTable, entry: &SchemaEntry) -> Result<Vec<Observation>> {
        let df = sanitize_column_names(raw.frame().clone())?;
        debug!(
            "Reshaping '{}' as {:?} ({} rows x {} columns)",
            entry.id,
            entry.reshape_mode,
            df.height(),
            df.width()
        );
        match entry.reshape_mode {
            ReshapeMode::WideYears => strategies::wide_years(&df, entry),
            ReshapeMode::AlreadyLong => strategies::already_long(&df, entry),
            ReshapeMode::MultiField => strategies::multi_field(&df, entry),
        }
    }

    /// Clean with a registered entry, or pass the sanitized frame through
    /// when there is none.
    pub fn clean(raw: &RawTable, entry: Option<&SchemaEntry>) -> Result<CleanOutput> {
        match entry {
            Some(entry) => Ok(CleanOutput::Long(Self::reshape(raw, entry)?)),
            None => {
                info!("No schema entry; passing the table through");
                let df = sanitize_column_names(raw.frame().clone())?;
                Ok(CleanOutput::PassThrough(df))
            }
        }
    }

    /// Generic long transform for arbitrary tables.
    ///
    /// Wholly numeric columns are melted into `Variable`/`Value`; rows with
    /// no value are dropped.
    pub fn melt(raw: &RawTable) -> Result<DataFrame> {
        let df = sanitize_column_names(raw.frame().clone())?;
        let long = strategies::melt_numeric(&df)?;
        info!(
            "Melted {} rows into {} long rows",
            df.height(),
            long.height()
        );
        Ok(long)
    }
}

/// Keep observations with a known country and year that pass `filter`.
pub fn apply_post_filter(
    observations: Vec<Observation>,
    filter: &CountryYearFilter,
) -> Vec<CountryYearValue> {
    observations
        .into_iter()
        .filter_map(|obs| {
            let country_code = obs.country_code?;
            let year = obs.year?;
            filter
                .contains(&country_code, year)
                .then_some(CountryYearValue {
                    country_code,
                    year,
                    indicator: obs.indicator,
                    value: obs.value,
                })
        })
        .collect()
}

//! Per-mode unpivot strategies.
//!
//! Each strategy turns a sanitized string frame into unfiltered
//! [`Observation`]s. Coercion happens here; the country/year post-filter is
//! applied by the engine afterwards.

use super::converters::{coerce_value, infer_numeric_dtype, parse_year, string_to_numeric};
use super::sanitizers::{extract_iso3, find_country_column};
use super::Observation;
use crate::error::{PipelineError, Result};
use crate::schema::SchemaEntry;
use crate::utils::{column_names, is_year_column, string_cells};
use polars::prelude::*;
use tracing::{debug, warn};

pub const VARIABLE_COLUMN: &str = "Variable";
pub const VALUE_COLUMN: &str = "Value";
const WIDE_COUNTRY_COLUMN: &str = "Country Code";

fn constant_indicator(entry: &SchemaEntry) -> Result<&str> {
    entry
        .constant_indicator()
        .ok_or_else(|| {
            PipelineError::schema_mismatch(&entry.id, "entry has no constant indicator")
        })
}

fn trimmed(cell: Option<String>) -> Option<String> {
    cell.map(|c| c.trim().to_string()).filter(|c| !c.is_empty())
}

/// Unpivot one column per year, column by column.
pub(crate) fn wide_years(df: &DataFrame, entry: &SchemaEntry) -> Result<Vec<Observation>> {
    let indicator = constant_indicator(entry)?;
    let names = column_names(df);
    // Wide exports carry names next to codes, so there is no fallback here.
    let country_column = entry
        .country_column
        .as_deref()
        .unwrap_or(WIDE_COUNTRY_COLUMN)
        .to_string();
    if !names.contains(&country_column) {
        return Err(PipelineError::schema_mismatch(
            &entry.id,
            format!("required column '{}' is missing", country_column),
        ));
    }

    let year_columns: Vec<&String> = names.iter().filter(|n| is_year_column(n)).collect();
    if year_columns.is_empty() {
        warn!("Source '{}' has no year columns; nothing to unpivot", entry.id);
        return Ok(Vec::new());
    }
    debug!(
        "Unpivoting {} year columns x {} rows for '{}' (country column '{}')",
        year_columns.len(),
        df.height(),
        entry.id,
        country_column
    );

    let countries: Vec<Option<String>> = string_cells(df, &country_column)?
        .into_iter()
        .map(trimmed)
        .collect();

    let mut observations = Vec::with_capacity(year_columns.len() * df.height());
    for year_column in year_columns {
        let year = parse_year(year_column);
        for (country, cell) in countries.iter().zip(string_cells(df, year_column)?) {
            observations.push(Observation {
                country_code: country.clone(),
                year,
                indicator: indicator.to_string(),
                value: coerce_value(cell.as_deref(), entry.value_kind),
            });
        }
    }
    Ok(observations)
}

/// One row per country and year already; only the country code needs
/// extracting.
pub(crate) fn already_long(df: &DataFrame, entry: &SchemaEntry) -> Result<Vec<Observation>> {
    let indicator = constant_indicator(entry)?;
    let names = column_names(df);
    let country_column = find_country_column(&names, entry.country_column.as_deref())
        .ok_or_else(|| PipelineError::schema_mismatch(&entry.id, "no country column found"))?;

    for required in ["year", "value"] {
        if !names.iter().any(|n| n == required) {
            return Err(PipelineError::schema_mismatch(
                &entry.id,
                format!("required column '{}' is missing", required),
            ));
        }
    }

    let countries = string_cells(df, &country_column)?;
    let years = string_cells(df, "year")?;
    let values = string_cells(df, "value")?;

    let observations = countries
        .into_iter()
        .zip(years)
        .zip(values)
        .map(|((country, year), value)| Observation {
            country_code: trimmed(country).map(|c| extract_iso3(&c)),
            year: year.as_deref().and_then(parse_year),
            indicator: indicator.to_string(),
            value: coerce_value(value.as_deref(), entry.value_kind),
        })
        .collect();
    Ok(observations)
}

/// Unpivot the renamed indicator columns, in rename-map order.
pub(crate) fn multi_field(df: &DataFrame, entry: &SchemaEntry) -> Result<Vec<Observation>> {
    let rename_map = entry
        .field_rename_map
        .as_ref()
        .ok_or_else(|| PipelineError::schema_mismatch(&entry.id, "entry has no rename map"))?;
    let names = column_names(df);

    let country_column = entry
        .country_column
        .iter()
        .map(String::as_str)
        .chain(["iso3"])
        .find(|candidate| names.iter().any(|n| n == candidate))
        .ok_or_else(|| {
            PipelineError::schema_mismatch(&entry.id, "no country code column found")
        })?;
    if !names.iter().any(|n| n == "year") {
        return Err(PipelineError::schema_mismatch(
            &entry.id,
            "required column 'year' is missing",
        ));
    }

    let fields: Vec<(&str, &str)> = rename_map
        .iter()
        .filter(|(from, _)| names.iter().any(|n| n == from))
        .collect();
    if fields.is_empty() {
        return Err(PipelineError::schema_mismatch(
            &entry.id,
            "no rename-map field is present in the table",
        ));
    }
    debug!(
        "Unpivoting {} of {} mapped fields for '{}'",
        fields.len(),
        rename_map.len(),
        entry.id
    );

    let countries: Vec<Option<String>> = string_cells(df, country_column)?
        .into_iter()
        .map(trimmed)
        .collect();
    let years: Vec<Option<i32>> = string_cells(df, "year")?
        .iter()
        .map(|y| y.as_deref().and_then(parse_year))
        .collect();

    let mut observations = Vec::new();
    let mut zeros = 0usize;
    for (from, indicator) in fields {
        let cells = string_cells(df, from)?;
        for ((country, year), cell) in countries.iter().zip(&years).zip(cells) {
            let Some(value) = coerce_value(cell.as_deref(), entry.value_kind) else {
                continue;
            };
            if entry.drop_zero_values && value.is_zero() {
                zeros += 1;
                continue;
            }
            observations.push(Observation {
                country_code: country.clone(),
                year: *year,
                indicator: indicator.to_string(),
                value: Some(value),
            });
        }
    }
    if zeros > 0 {
        debug!("Dropped {} zero values for '{}'", zeros, entry.id);
    }
    Ok(observations)
}

/// Melt an arbitrary table: wholly numeric columns become `Variable`/`Value`
/// pairs, the remaining columns are repeated as identifiers.
pub(crate) fn melt_numeric(df: &DataFrame) -> Result<DataFrame> {
    let mut id_columns = Vec::new();
    let mut value_columns = Vec::new();
    for column in df.get_columns() {
        let series = column.as_materialized_series();
        if infer_numeric_dtype(series)?.is_some() {
            value_columns.push(string_to_numeric(series, &DataType::Float64)?);
        } else {
            id_columns.push(series.name().to_string());
        }
    }
    debug!(
        "Melting {} value columns with {} id columns",
        value_columns.len(),
        id_columns.len()
    );

    let id_cells: Vec<Vec<Option<String>>> = id_columns
        .iter()
        .map(|name| string_cells(df, name))
        .collect::<Result<_>>()?;

    let mut ids_out: Vec<Vec<Option<String>>> = vec![Vec::new(); id_columns.len()];
    let mut variables: Vec<String> = Vec::new();
    let mut values: Vec<f64> = Vec::new();

    for series in &value_columns {
        for (row, value) in series.f64()?.into_iter().enumerate() {
            let Some(value) = value else {
                continue;
            };
            for (out, cells) in ids_out.iter_mut().zip(&id_cells) {
                out.push(cells[row].clone());
            }
            variables.push(series.name().to_string());
            values.push(value);
        }
    }

    let mut columns: Vec<Column> = id_columns
        .iter()
        .zip(ids_out)
        .map(|(name, cells)| Column::new(name.as_str().into(), cells))
        .collect();
    columns.push(variable_column(variables));
    columns.push(Column::new(VALUE_COLUMN.into(), values));

    Ok(DataFrame::new(columns)?)
}

/// Variable names become numbers when every one parses, else stay text.
fn variable_column(variables: Vec<String>) -> Column {
    if !variables.is_empty() {
        let ints: std::result::Result<Vec<i64>, _> =
            variables.iter().map(|v| v.parse::<i64>()).collect();
        if let Ok(ints) = ints {
            return Column::new(VARIABLE_COLUMN.into(), ints);
        }
        let floats: std::result::Result<Vec<f64>, _> =
            variables.iter().map(|v| v.parse::<f64>()).collect();
        if let Ok(floats) = floats {
            return Column::new(VARIABLE_COLUMN.into(), floats);
        }
    }
    Column::new(VARIABLE_COLUMN.into(), variables)
}

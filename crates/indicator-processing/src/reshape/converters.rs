//! Cell and column type conversion.

use crate::error::{PipelineError, Result};
use crate::schema::ValueKind;
use crate::types::IndicatorValue;
use crate::utils::is_missing_cell;
use polars::prelude::*;
use tracing::trace;

/// Parse a year cell. `"2020"` and `"2020.0"` both give 2020; anything
/// missing, fractional or out of range gives `None`.
pub fn parse_year(cell: &str) -> Option<i32> {
    if is_missing_cell(cell) {
        return None;
    }
    let value = cell.trim().parse::<f64>().ok()?;
    if !value.is_finite() || value.fract() != 0.0 {
        return None;
    }
    if value < i32::MIN as f64 || value > i32::MAX as f64 {
        return None;
    }
    Some(value as i32)
}

/// Strictly parse a numeric cell.
///
/// Missing markers give `Ok(None)`, as do infinities and NaN. Text that is
/// not a number is a [`PipelineError::CoercionFailure`].
pub fn parse_number(cell: &str) -> Result<Option<f64>> {
    if is_missing_cell(cell) {
        return Ok(None);
    }
    match cell.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(Some(v)),
        Ok(_) => Ok(None),
        Err(_) => Err(PipelineError::CoercionFailure {
            value: cell.to_string(),
            target: "f64",
        }),
    }
}

/// Coerce a raw cell to an indicator value of the given kind.
///
/// Coercion failures are recovered as `None`. For integer sources a
/// non-integral number is also `None`.
pub fn coerce_value(cell: Option<&str>, kind: ValueKind) -> Option<IndicatorValue> {
    let number = match parse_number(cell?) {
        Ok(number) => number?,
        Err(e) => {
            trace!("{}", e);
            return None;
        }
    };
    match kind {
        ValueKind::Float => Some(IndicatorValue::Float(number)),
        ValueKind::Integer => {
            if number.fract() == 0.0 && number.abs() < i64::MAX as f64 {
                Some(IndicatorValue::Integer(number as i64))
            } else {
                trace!("Non-integral value {} read as missing", number);
                None
            }
        }
    }
}

/// Numeric dtype a string column could be read as, if any.
///
/// `Int64` when every present cell is an integer literal, `Float64` when
/// every present cell is a number (or none is present), else `None`.
pub fn infer_numeric_dtype(series: &Series) -> Result<Option<DataType>> {
    if series.dtype() != &DataType::String {
        return Ok(None);
    }

    let mut all_integer = true;
    let mut present = 0usize;
    for cell in series.str()?.into_iter().flatten() {
        if is_missing_cell(cell) {
            continue;
        }
        present += 1;
        let trimmed = cell.trim();
        if trimmed.parse::<i64>().is_ok() {
            continue;
        }
        all_integer = false;
        if trimmed.parse::<f64>().is_err() {
            return Ok(None);
        }
    }

    if present > 0 && all_integer {
        Ok(Some(DataType::Int64))
    } else {
        Ok(Some(DataType::Float64))
    }
}

/// Convert a string series to `Float64` or `Int64`; missing cells and cells
/// that do not parse become null.
pub fn string_to_numeric(series: &Series, target_dtype: &DataType) -> Result<Series> {
    let str_series = series.str()?;

    match target_dtype {
        DataType::Int64 => {
            let values: Vec<Option<i64>> = str_series
                .into_iter()
                .map(|opt| {
                    opt.filter(|v| !is_missing_cell(v))
                        .and_then(|v| v.trim().parse::<i64>().ok())
                })
                .collect();
            Ok(Series::new(series.name().clone(), values))
        }
        DataType::Float64 => {
            let values: Vec<Option<f64>> = str_series
                .into_iter()
                .map(|opt| opt.and_then(|v| parse_number(v).ok().flatten()))
                .collect();
            Ok(Series::new(series.name().clone(), values))
        }
        _ => Ok(series.clone()),
    }
}

/// Coerce every column that is wholly numeric; other columns are untouched.
pub fn coerce_numeric_columns(df: DataFrame) -> Result<DataFrame> {
    let mut df = df;
    for name in crate::utils::column_names(&df) {
        let series = df.column(&name)?.as_materialized_series().clone();
        if let Some(dtype) = infer_numeric_dtype(&series)? {
            let converted = string_to_numeric(&series, &dtype)?;
            df.replace(&name, converted)?;
        }
    }
    Ok(df)
}

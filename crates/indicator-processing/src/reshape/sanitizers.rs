//! Column-name and cell sanitization applied before reshaping.

use crate::error::Result;
use crate::utils::column_names;
use once_cell::sync::Lazy;
use polars::prelude::*;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use tracing::debug;

static ISO3_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z]{3}$").expect("Invalid regex: ISO3"));

/// Make names unique by suffixing repeats with `.1`, `.2`, …
///
/// The first occurrence keeps its name. A suffixed name that collides with a
/// later literal name is bumped again.
pub(crate) fn make_unique(names: Vec<String>) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::with_capacity(names.len());
    let mut counts: HashMap<String, usize> = HashMap::new();

    names
        .into_iter()
        .map(|name| {
            if seen.insert(name.clone()) {
                return name;
            }
            let count = counts.entry(name.clone()).or_insert(0);
            loop {
                *count += 1;
                let candidate = format!("{}.{}", name, count);
                if seen.insert(candidate.clone()) {
                    return candidate;
                }
            }
        })
        .collect()
}

/// Normalize column names.
///
/// Names are trimmed, empty names become `column_{i}`, repeats are suffixed
/// and any column whose name contains `Unnamed` is dropped.
pub fn sanitize_column_names(df: DataFrame) -> Result<DataFrame> {
    let stripped: Vec<String> = column_names(&df)
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let trimmed = name.trim();
            if trimmed.is_empty() {
                format!("column_{}", i)
            } else {
                trimmed.to_string()
            }
        })
        .collect();
    let renamed = make_unique(stripped);

    let mut df = df;
    df.set_column_names(renamed.clone())?;

    let (kept, dropped): (Vec<String>, Vec<String>) =
        renamed.into_iter().partition(|name| !name.contains("Unnamed"));
    if !dropped.is_empty() {
        debug!("Dropping placeholder columns: {:?}", dropped);
    }

    Ok(df.select(kept)?)
}

/// Pull an ISO3 code out of a `"<a> - <b>"` cell.
///
/// The segment before the first ` - ` wins when it is a three-letter upper
/// case code, otherwise the last segment is tried. Cells that match neither
/// fall back to their trimmed first segment.
pub fn extract_iso3(cell: &str) -> String {
    let segments: Vec<&str> = cell.split(" - ").map(str::trim).collect();
    let first = segments.first().copied().unwrap_or("");
    if ISO3_PATTERN.is_match(first) {
        return first.to_string();
    }
    match segments.last() {
        Some(last) if ISO3_PATTERN.is_match(last) => last.to_string(),
        _ => first.to_string(),
    }
}

/// Find the country column: `preferred` when present, else the first name
/// containing "country" in any case.
pub fn find_country_column(names: &[String], preferred: Option<&str>) -> Option<String> {
    if let Some(preferred) = preferred
        && names.iter().any(|n| n == preferred)
    {
        return Some(preferred.to_string());
    }
    names
        .iter()
        .find(|n| n.to_lowercase().contains("country"))
        .cloned()
}

//! Raw CSV loading.
//!
//! Files are read without schema inference: every cell stays a string until
//! the reshape engine or the quality assessor coerces it. The header row is
//! taken from the file itself after skipping the detected preamble, so blank
//! and repeated header cells can be named deterministically.

use crate::error::{Result, ResultExt};
use crate::reshape::sanitizers::make_unique;
use crate::utils::column_names;
use polars::io::csv::read::CsvReadOptions;
use polars::prelude::*;
use std::io::Cursor;
use std::path::Path;
use tracing::{debug, info};

/// Placeholder prefix given to header cells that are empty in the source.
pub const UNNAMED_PREFIX: &str = "Unnamed: ";

/// A raw tabular frame whose columns are all strings.
///
/// Column names are unique but not yet sanitized; see
/// [`crate::reshape::sanitize_column_names`].
#[derive(Debug, Clone)]
pub struct RawTable {
    frame: DataFrame,
    skipped_lines: usize,
}

impl RawTable {
    /// Wrap an existing frame (e.g. built in memory).
    pub fn from_frame(frame: DataFrame) -> Self {
        Self {
            frame,
            skipped_lines: 0,
        }
    }

    /// Read a CSV file, skipping `skip_lines` preamble lines.
    pub fn from_csv_path(path: impl AsRef<Path>, skip_lines: usize) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).context(format!("Reading {}", path.display()))?;
        let table = Self::from_csv_bytes(&bytes, skip_lines)
            .context(format!("Parsing {}", path.display()))?;
        info!(
            "Loaded {}: {} rows x {} columns (skipped {} lines)",
            path.display(),
            table.height(),
            table.width(),
            skip_lines
        );
        Ok(table)
    }

    /// Parse CSV content, skipping `skip_lines` preamble lines.
    ///
    /// Blank lines outside quoted cells are ignored and ragged lines are
    /// truncated or padded with nulls. Content with nothing after the preamble yields an empty table.
    pub fn from_csv_bytes(bytes: &[u8], skip_lines: usize) -> Result<Self> {
        let content = String::from_utf8_lossy(bytes);
        let body = drop_blank_lines(content.lines().skip(skip_lines));

        if body.is_empty() {
            debug!("No content after {} skipped lines", skip_lines);
            return Ok(Self {
                frame: DataFrame::empty(),
                skipped_lines: skip_lines,
            });
        }

        let headerless = CsvReadOptions::default()
            .with_has_header(false)
            .with_infer_schema_length(Some(0))
            .with_parse_options(
                CsvParseOptions::default()
                    .with_quote_char(Some(b'"'))
                    .with_truncate_ragged_lines(true),
            )
            .into_reader_with_file_handle(Cursor::new(body))
            .finish()?;

        let frame = promote_header_row(headerless)?;
        Ok(Self {
            frame,
            skipped_lines: skip_lines,
        })
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    /// Number of data rows.
    pub fn height(&self) -> usize {
        self.frame.height()
    }

    pub fn width(&self) -> usize {
        self.frame.width()
    }

    pub fn column_names(&self) -> Vec<String> {
        column_names(&self.frame)
    }

    /// Preamble lines skipped before the header row.
    pub fn skipped_lines(&self) -> usize {
        self.skipped_lines
    }
}

/// Join lines, skipping blank ones unless they sit inside a quoted cell.
///
/// An odd number of quote characters on a line opens or closes a quoted
/// cell; doubled quotes inside a cell count as two and leave the state alone.
fn drop_blank_lines<'a>(lines: impl Iterator<Item = &'a str>) -> String {
    let mut kept = Vec::new();
    let mut in_quotes = false;
    for line in lines {
        if !in_quotes && line.trim().is_empty() {
            continue;
        }
        if line.matches('"').count() % 2 == 1 {
            in_quotes = !in_quotes;
        }
        kept.push(line);
    }
    kept.join("\n")
}

/// Use the first row of a headerless frame as its column names.
fn promote_header_row(df: DataFrame) -> Result<DataFrame> {
    let mut header = Vec::with_capacity(df.width());
    for (i, column) in df.get_columns().iter().enumerate() {
        let cell = column
            .as_materialized_series()
            .str()?
            .get(0)
            .map(|s| s.trim_matches(|c: char| c == '\u{feff}' || c == '\n' || c == '\r'))
            .unwrap_or("");
        if cell.is_empty() {
            header.push(format!("{}{}", UNNAMED_PREFIX, i));
        } else {
            header.push(cell.to_string());
        }
    }

    let mut data = df.slice(1, df.height().saturating_sub(1));
    data.set_column_names(make_unique(header))?;
    Ok(data)
}

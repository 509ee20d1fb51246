use crate::config::OutputFormat;
use crate::quality::QualityReport;
use anyhow::{Context, Result};
use polars::prelude::*;
use serde::Serialize;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Writes pipeline artifacts into one output directory.
#[derive(Debug, Clone)]
pub struct ReportGenerator {
    output_dir: PathBuf,
}

impl Default for ReportGenerator {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("data/processed"),
        }
    }
}

impl ReportGenerator {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// File stem used to name artifacts derived from `input`.
    pub fn stem_of(input: &Path) -> String {
        input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "dataset".to_string())
    }

    /// Path of the long-format artifact for `stem`.
    pub fn long_table_path(&self, stem: &str, format: OutputFormat) -> PathBuf {
        self.output_dir
            .join(format!("{}_long.{}", stem, format.extension()))
    }

    /// Path of the text quality report for `stem`.
    pub fn quality_report_path(&self, stem: &str) -> PathBuf {
        self.output_dir.join(format!("{}_quality_report.txt", stem))
    }

    /// Write `df` as `{stem}_long.csv` or `{stem}_long.parquet`.
    pub fn write_long_table(
        &self,
        df: &mut DataFrame,
        stem: &str,
        format: OutputFormat,
    ) -> Result<PathBuf> {
        let path = self.long_table_path(stem, format);
        self.write_frame(df, &path, format)?;
        Ok(path)
    }

    /// Write `df` to an explicit path.
    pub fn write_frame(&self, df: &mut DataFrame, path: &Path, format: OutputFormat) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let mut file =
            File::create(path).with_context(|| format!("creating {}", path.display()))?;

        match format {
            OutputFormat::Csv => {
                CsvWriter::new(&mut file)
                    .include_header(true)
                    .with_separator(b',')
                    .with_quote_char(b'"')
                    .finish(df)?;
            }
            OutputFormat::Parquet => {
                ParquetWriter::new(&mut file).finish(df)?;
            }
        }

        info!(
            "Saved {} rows x {} columns: {}",
            df.height(),
            df.width(),
            path.display()
        );
        Ok(())
    }

    /// Write the `key: value` rendering of `report` as
    /// `{stem}_quality_report.txt`.
    pub fn write_quality_report(&self, report: &QualityReport, stem: &str) -> Result<PathBuf> {
        let path = self.quality_report_path(stem);
        self.write_quality_report_to(report, &path)?;
        Ok(path)
    }

    pub fn write_quality_report_to(&self, report: &QualityReport, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let mut file = File::create(path)?;
        file.write_all(report.to_text().as_bytes())?;

        info!("Quality report saved: {}", path.display());
        Ok(())
    }

    /// Pretty JSON of any serializable report.
    pub fn to_json<T: Serialize>(report: &T) -> Result<String> {
        let json = serde_json::to_string_pretty(report)?;
        debug!("Serialized report ({} bytes)", json.len());
        Ok(json)
    }
}

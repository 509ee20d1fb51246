//! Configuration types for the indicator pipeline.
//!
//! This module provides configuration options using the builder pattern.
//! The country/year universe lives in [`CountryYearFilter`], an immutable
//! value handed to the schema registry and from there to every reshape.

use crate::schema::constants::{
    DEFAULT_HEADER_KEYWORD, DEFAULT_MAX_SCAN_LINES, EARLIEST_INCLUDED_YEAR, INCLUDED_COUNTRY_CODES,
    LATEST_INCLUDED_YEAR,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Output format for canonical long tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// Comma-separated values with a header row
    #[default]
    Csv,
    /// Apache Parquet
    Parquet,
}

impl OutputFormat {
    /// File extension for this format, without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Parquet => "parquet",
        }
    }
}

/// The fixed country/year universe every canonical row must belong to.
///
/// Both year bounds are inclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryYearFilter {
    pub countries: BTreeSet<String>,
    pub year_min: i32,
    pub year_max: i32,
}

impl Default for CountryYearFilter {
    fn default() -> Self {
        Self::new(
            INCLUDED_COUNTRY_CODES.iter().copied(),
            EARLIEST_INCLUDED_YEAR,
            LATEST_INCLUDED_YEAR,
        )
    }
}

impl CountryYearFilter {
    pub fn new<I, S>(countries: I, year_min: i32, year_max: i32) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            countries: countries.into_iter().map(Into::into).collect(),
            year_min,
            year_max,
        }
    }

    /// Whether a (country, year) pair lies inside the universe.
    #[inline]
    pub fn contains(&self, country_code: &str, year: i32) -> bool {
        self.includes_country(country_code) && self.includes_year(year)
    }

    #[inline]
    pub fn includes_country(&self, country_code: &str) -> bool {
        self.countries.contains(country_code)
    }

    #[inline]
    pub fn includes_year(&self, year: i32) -> bool {
        (self.year_min..=self.year_max).contains(&year)
    }

    /// Validate bounds and country codes.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.year_min > self.year_max {
            return Err(ConfigValidationError::InvalidYearRange {
                year_min: self.year_min,
                year_max: self.year_max,
            });
        }

        if self.countries.is_empty() {
            return Err(ConfigValidationError::EmptyCountrySet);
        }

        if let Some(bad) = self
            .countries
            .iter()
            .find(|code| code.len() != 3 || !code.chars().all(|c| c.is_ascii_uppercase()))
        {
            return Err(ConfigValidationError::InvalidCountryCode(bad.clone()));
        }

        Ok(())
    }
}

/// Configuration for acquisition, cleaning and reporting runs.
///
/// Use [`PipelineConfig::builder()`] to create a configuration with the
/// fluent API, or [`PipelineConfig::from_json_file`] to load one from disk
/// (missing fields fall back to defaults).
///
/// # Example
///
/// ```rust,ignore
/// use indicator_processing::config::{CountryYearFilter, PipelineConfig};
///
/// let config = PipelineConfig::builder()
///     .processed_dir("out/processed")
///     .filter(CountryYearFilter::new(["USA", "FRA"], 2015, 2020))
///     .build()?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Directory for downloaded and extracted files.
    /// Default: "data/raw"
    pub raw_dir: PathBuf,

    /// Directory for canonical long tables.
    /// Default: "data/processed"
    pub processed_dir: PathBuf,

    /// Directory for quality reports.
    /// Default: "data/quality"
    pub quality_dir: PathBuf,

    /// Append-only provenance log (JSON array).
    /// Default: "docs/metadata.json"
    pub metadata_log: PathBuf,

    /// Number of leading lines scanned for the header keyword.
    /// Default: 20
    pub max_scan_lines: usize,

    /// Header keyword used when the source has no registry entry.
    /// Default: "Country Name"
    pub header_keyword: String,

    /// Country/year universe applied by every registered source.
    pub filter: CountryYearFilter,

    /// Format of written long tables.
    /// Default: Csv
    pub output_format: OutputFormat,

    /// HTTP timeout for downloads, in seconds.
    /// Default: 60
    pub request_timeout_secs: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            raw_dir: PathBuf::from("data/raw"),
            processed_dir: PathBuf::from("data/processed"),
            quality_dir: PathBuf::from("data/quality"),
            metadata_log: PathBuf::from("docs/metadata.json"),
            max_scan_lines: DEFAULT_MAX_SCAN_LINES,
            header_keyword: DEFAULT_HEADER_KEYWORD.to_string(),
            filter: CountryYearFilter::default(),
            output_format: OutputFormat::default(),
            request_timeout_secs: 60,
        }
    }
}

impl PipelineConfig {
    /// Create a new configuration builder.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }

    /// Load a configuration from a JSON file and validate it.
    pub fn from_json_file(path: impl AsRef<Path>) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: PipelineConfig = serde_json::from_str(&content)?;
        config
            .validate()
            .map_err(|e| crate::error::PipelineError::InvalidConfig(e.to_string()))?;
        Ok(config)
    }

    /// Start a builder pre-populated with this configuration.
    pub fn to_builder(&self) -> PipelineConfigBuilder {
        PipelineConfigBuilder {
            raw_dir: Some(self.raw_dir.clone()),
            processed_dir: Some(self.processed_dir.clone()),
            quality_dir: Some(self.quality_dir.clone()),
            metadata_log: Some(self.metadata_log.clone()),
            max_scan_lines: Some(self.max_scan_lines),
            header_keyword: Some(self.header_keyword.clone()),
            filter: Some(self.filter.clone()),
            output_format: Some(self.output_format),
            request_timeout_secs: Some(self.request_timeout_secs),
        }
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.max_scan_lines == 0 {
            return Err(ConfigValidationError::InvalidScanWindow(self.max_scan_lines));
        }

        if self.header_keyword.is_empty() {
            return Err(ConfigValidationError::EmptyHeaderKeyword);
        }

        self.filter.validate()
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid year range: {year_min} > {year_max}")]
    InvalidYearRange { year_min: i32, year_max: i32 },

    #[error("Country allow-list is empty")]
    EmptyCountrySet,

    #[error("Invalid country code '{0}' (expected three uppercase letters)")]
    InvalidCountryCode(String),

    #[error("Invalid header scan window: {0} (must be at least 1)")]
    InvalidScanWindow(usize),

    #[error("Header keyword must not be empty")]
    EmptyHeaderKeyword,
}

/// Builder for [`PipelineConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct PipelineConfigBuilder {
    raw_dir: Option<PathBuf>,
    processed_dir: Option<PathBuf>,
    quality_dir: Option<PathBuf>,
    metadata_log: Option<PathBuf>,
    max_scan_lines: Option<usize>,
    header_keyword: Option<String>,
    filter: Option<CountryYearFilter>,
    output_format: Option<OutputFormat>,
    request_timeout_secs: Option<u64>,
}

impl PipelineConfigBuilder {
    /// Set the directory for downloaded files.
    pub fn raw_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.raw_dir = Some(path.into());
        self
    }

    /// Set the directory for canonical long tables.
    pub fn processed_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.processed_dir = Some(path.into());
        self
    }

    /// Set the directory for quality reports.
    pub fn quality_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.quality_dir = Some(path.into());
        self
    }

    /// Set the provenance log path.
    pub fn metadata_log(mut self, path: impl Into<PathBuf>) -> Self {
        self.metadata_log = Some(path.into());
        self
    }

    /// Set how many leading lines are scanned for the header keyword.
    pub fn max_scan_lines(mut self, lines: usize) -> Self {
        self.max_scan_lines = Some(lines);
        self
    }

    /// Set the fallback header keyword.
    pub fn header_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.header_keyword = Some(keyword.into());
        self
    }

    /// Set the country/year universe.
    pub fn filter(mut self, filter: CountryYearFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Set the output format for long tables.
    pub fn output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = Some(format);
        self
    }

    /// Set the HTTP timeout in seconds.
    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.request_timeout_secs = Some(secs);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `PipelineConfig` or an error if validation fails.
    pub fn build(self) -> Result<PipelineConfig, ConfigValidationError> {
        let defaults = PipelineConfig::default();
        let config = PipelineConfig {
            raw_dir: self.raw_dir.unwrap_or(defaults.raw_dir),
            processed_dir: self.processed_dir.unwrap_or(defaults.processed_dir),
            quality_dir: self.quality_dir.unwrap_or(defaults.quality_dir),
            metadata_log: self.metadata_log.unwrap_or(defaults.metadata_log),
            max_scan_lines: self.max_scan_lines.unwrap_or(defaults.max_scan_lines),
            header_keyword: self.header_keyword.unwrap_or(defaults.header_keyword),
            filter: self.filter.unwrap_or(defaults.filter),
            output_format: self.output_format.unwrap_or(defaults.output_format),
            request_timeout_secs: self
                .request_timeout_secs
                .unwrap_or(defaults.request_timeout_secs),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.max_scan_lines, 20);
        assert_eq!(config.header_keyword, "Country Name");
        assert_eq!(config.filter.year_min, 2014);
        assert_eq!(config.filter.year_max, 2025);
        assert!(config.filter.includes_country("USA"));
        assert!(config.filter.includes_country("EUU"));
        assert!(!config.filter.includes_country("NOR"));
        assert_eq!(config.output_format, OutputFormat::Csv);
    }

    #[test]
    fn test_filter_bounds_are_inclusive() {
        let filter = CountryYearFilter::new(["USA"], 2014, 2025);
        assert!(filter.contains("USA", 2014));
        assert!(filter.contains("USA", 2025));
        assert!(!filter.contains("USA", 2013));
        assert!(!filter.contains("USA", 2026));
        assert!(!filter.contains("usa", 2020));
    }

    #[test]
    fn test_builder_custom_values() {
        let config = PipelineConfig::builder()
            .processed_dir("out")
            .max_scan_lines(5)
            .output_format(OutputFormat::Parquet)
            .filter(CountryYearFilter::new(["FRA", "DEU"], 2000, 2010))
            .build()
            .unwrap();

        assert_eq!(config.processed_dir, PathBuf::from("out"));
        assert_eq!(config.max_scan_lines, 5);
        assert_eq!(config.output_format.extension(), "parquet");
        assert_eq!(config.filter.countries.len(), 2);
    }

    #[test]
    fn test_validation_invalid_year_range() {
        let result = PipelineConfig::builder()
            .filter(CountryYearFilter::new(["USA"], 2020, 2010))
            .build();

        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::InvalidYearRange { .. }
        ));
    }

    #[test]
    fn test_validation_invalid_country_code() {
        let result = PipelineConfig::builder()
            .filter(CountryYearFilter::new(["USA", "Fr"], 2010, 2020))
            .build();

        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::InvalidCountryCode(code) if code == "Fr"
        ));
    }

    #[test]
    fn test_validation_zero_scan_window() {
        let result = PipelineConfig::builder().max_scan_lines(0).build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::InvalidScanWindow(0)
        ));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{
            "processed_dir": "custom_output",
            "filter": { "countries": ["USA", "CAN"], "year_min": 2018, "year_max": 2022 },
            "output_format": "parquet"
        }"#;

        let config: PipelineConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.processed_dir.to_str().unwrap(), "custom_output");
        assert_eq!(config.raw_dir.to_str().unwrap(), "data/raw");
        assert_eq!(config.filter.year_min, 2018);
        assert_eq!(config.output_format, OutputFormat::Parquet);
        assert!(config.validate().is_ok());
    }
}

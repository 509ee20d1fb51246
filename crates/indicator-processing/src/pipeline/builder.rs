//! End-to-end runs over files on disk.
//!
//! The `Pipeline` ties header detection, loading, reshaping, quality
//! assessment and artifact writing together for one input file at a time.

use crate::config::{OutputFormat, PipelineConfig};
use crate::error::{PipelineError, Result};
use crate::header::detect_header_offset_in_file;
use crate::loader::RawTable;
use crate::quality::{QualityAssessor, QualityReport};
use crate::reporting::ReportGenerator;
use crate::reshape::ReshapeEngine;
use crate::schema::constants::GENERIC_HEADER_KEYWORD;
use crate::schema::SchemaRegistry;
use crate::types::ProcessingSummary;
use polars::prelude::*;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

/// Source label recorded for generic transforms.
const GENERIC_SOURCE: &str = "generic";

/// The file-level processing pipeline.
///
/// Use [`Pipeline::builder()`] to create one.
///
/// # Example
///
/// ```rust,ignore
/// use indicator_processing::{Pipeline, PipelineConfig};
///
/// let pipeline = Pipeline::builder()
///     .config(PipelineConfig::default())
///     .build()?;
///
/// let summary = pipeline.clean_file("data/raw/worldbank_population.csv", "worldbank_population", None, None)?;
/// println!("{} rows -> {}", summary.output_rows, summary.output);
///
/// let (report, path) = pipeline.assess_file("data/raw/worldbank_population.csv", None)?;
/// ```
pub struct Pipeline {
    config: PipelineConfig,
    registry: SchemaRegistry,
    processed: ReportGenerator,
    quality: ReportGenerator,
}

// Pipelines are shared read-only between callers.
static_assertions::assert_impl_all!(Pipeline: Send, Sync);

impl Pipeline {
    /// Create a new pipeline builder.
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// Skip-count of `input` for `keyword` within the configured scan window.
    pub fn detect_header(&self, input: impl AsRef<Path>, keyword: &str) -> Result<usize> {
        detect_header_offset_in_file(input, keyword, self.config.max_scan_lines)
    }

    /// Detect the header of `input` and load it with all-string columns.
    pub fn load(&self, input: impl AsRef<Path>, keyword: &str) -> Result<RawTable> {
        let input = input.as_ref();
        let offset = self.detect_header(input, keyword)?;
        RawTable::from_csv_path(input, offset)
    }

    /// Header keyword used for `source_id`: the entry's own keyword when the
    /// source is registered, the configured default otherwise.
    pub fn header_keyword_for(&self, source_id: &str) -> &str {
        self.registry
            .lookup(source_id)
            .map(|entry| entry.header_keyword.as_str())
            .unwrap_or(self.config.header_keyword.as_str())
    }

    /// Clean one raw export of `source_id` and write its long table.
    ///
    /// Unregistered sources are written through after column sanitization.
    /// The artifact goes to `output` when given, otherwise to
    /// `{processed_dir}/{stem}_long.{ext}`. `format` overrides the configured
    /// output format.
    pub fn clean_file(
        &self,
        input: impl AsRef<Path>,
        source_id: &str,
        output: Option<&Path>,
        format: Option<OutputFormat>,
    ) -> Result<ProcessingSummary> {
        let start = Instant::now();
        let input = input.as_ref();
        let format = format.unwrap_or(self.config.output_format);
        info!("Cleaning {} as '{}'", input.display(), source_id);

        let keyword = self.header_keyword_for(source_id);
        let raw = self.load(input, keyword)?;
        let cleaned = ReshapeEngine::clean(&raw, self.registry.lookup(source_id))?;
        let mut df = cleaned.to_dataframe()?;

        let path = self.write_output(&mut df, input, output, format)?;
        info!(
            "Cleaned {} in {:?}: {} -> {} rows",
            source_id,
            start.elapsed(),
            raw.height(),
            cleaned.row_count()
        );

        Ok(ProcessingSummary {
            source: source_id.to_string(),
            input: input.display().to_string(),
            output: path.display().to_string(),
            header_offset: raw.skipped_lines(),
            input_rows: raw.height(),
            output_rows: cleaned.row_count(),
            pass_through: cleaned.is_pass_through(),
        })
    }

    /// Melt every numeric column of an arbitrary table and write it as
    /// `{stem}_long.csv` (or to `output`).
    pub fn transform_file(
        &self,
        input: impl AsRef<Path>,
        output: Option<&Path>,
    ) -> Result<ProcessingSummary> {
        let input = input.as_ref();
        info!("Transforming {}", input.display());

        let raw = self.load(input, GENERIC_HEADER_KEYWORD)?;
        let mut long = ReshapeEngine::melt(&raw)?;
        let path = self.write_output(&mut long, input, output, OutputFormat::Csv)?;

        Ok(ProcessingSummary {
            source: GENERIC_SOURCE.to_string(),
            input: input.display().to_string(),
            output: path.display().to_string(),
            header_offset: raw.skipped_lines(),
            input_rows: raw.height(),
            output_rows: long.height(),
            pass_through: false,
        })
    }

    /// Assess a raw file and write its text report.
    ///
    /// The report goes to `output` when given, otherwise to
    /// `{quality_dir}/{stem}_quality_report.txt`.
    pub fn assess_file(
        &self,
        input: impl AsRef<Path>,
        output: Option<&Path>,
    ) -> Result<(QualityReport, PathBuf)> {
        let input = input.as_ref();
        info!("Assessing {}", input.display());

        let raw = self.load(input, &self.config.header_keyword)?;
        let report = QualityAssessor::assess_raw(&raw)?;

        let path = match output {
            Some(path) => {
                self.quality
                    .write_quality_report_to(&report, path)
                    .map_err(report_failure)?;
                path.to_path_buf()
            }
            None => self
                .quality
                .write_quality_report(&report, &ReportGenerator::stem_of(input))
                .map_err(report_failure)?,
        };
        debug!(
            "Quality report for {}: {} rows, {} missing",
            input.display(),
            report.row_count,
            report.missing_value_count
        );
        Ok((report, path))
    }

    fn write_output(
        &self,
        df: &mut DataFrame,
        input: &Path,
        output: Option<&Path>,
        format: OutputFormat,
    ) -> Result<PathBuf> {
        match output {
            Some(path) => {
                self.processed
                    .write_frame(df, path, format)
                    .map_err(report_failure)?;
                Ok(path.to_path_buf())
            }
            None => self
                .processed
                .write_long_table(df, &ReportGenerator::stem_of(input), format)
                .map_err(report_failure),
        }
    }
}

fn report_failure(e: anyhow::Error) -> PipelineError {
    PipelineError::ReportGenerationFailed(format!("{:#}", e))
}

/// Builder for [`Pipeline`].
#[derive(Default)]
pub struct PipelineBuilder {
    config: Option<PipelineConfig>,
    registry: Option<SchemaRegistry>,
}

impl PipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Use a custom schema registry instead of the built-in sources.
    pub fn registry(mut self, registry: SchemaRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Build the pipeline.
    ///
    /// The configuration is validated; without an explicit registry the
    /// built-in one is created over the configured filter.
    pub fn build(self) -> Result<Pipeline> {
        let config = self.config.unwrap_or_default();
        config
            .validate()
            .map_err(|e| PipelineError::InvalidConfig(e.to_string()))?;

        let registry = self
            .registry
            .unwrap_or_else(|| SchemaRegistry::builtin(&config.filter));

        Ok(Pipeline {
            processed: ReportGenerator::new(&config.processed_dir),
            quality: ReportGenerator::new(&config.quality_dir),
            registry,
            config,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CountryYearFilter;
    use crate::schema::SchemaEntry;
    use std::fs;

    const WIDE: &str = "\"Data Source\",\"World Development Indicators\",\n\
\n\
\"Last Updated Date\",\"2025-01-28\",\n\
\n\
\"Country Name\",\"Country Code\",\"Indicator Name\",\"Indicator Code\",\"2019\",\"2020\",\"2021\",\n\
\"United States\",\"USA\",\"Population, total\",\"SP.POP.TOTL\",\"328329953\",\"331526933\",\"332048977\",\n\
\"Aruba\",\"ABW\",\"Population, total\",\"SP.POP.TOTL\",\"106442\",\"106585\",\"106537\",\n\
\"France\",\"FRA\",\"Population, total\",\"SP.POP.TOTL\",\"67388001\",\"\",\"67764304\",\n";

    fn pipeline_in(dir: &Path) -> Pipeline {
        let config = PipelineConfig::builder()
            .processed_dir(dir.join("processed"))
            .quality_dir(dir.join("quality"))
            .build()
            .unwrap();
        Pipeline::builder().config(config).build().unwrap()
    }

    #[test]
    fn test_build_rejects_invalid_config() {
        let mut config = PipelineConfig::default();
        config.max_scan_lines = 0;
        let result = Pipeline::builder().config(config).build();
        assert!(matches!(result, Err(PipelineError::InvalidConfig(_))));
    }

    #[test]
    fn test_default_registry_is_builtin() {
        let pipeline = Pipeline::builder().build().unwrap();
        assert!(pipeline.registry().lookup("worldbank_population").is_some());
        assert_eq!(pipeline.header_keyword_for("unknown"), "Country Name");
    }

    #[test]
    fn test_clean_file_writes_long_csv() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("worldbank_population.csv");
        fs::write(&input, WIDE).unwrap();

        let pipeline = pipeline_in(dir.path());
        let summary = pipeline
            .clean_file(&input, "worldbank_population", None, None)
            .unwrap();

        assert_eq!(summary.header_offset, 4);
        assert_eq!(summary.input_rows, 3);
        // USA and FRA keep all three years, the blank one as a null value.
        assert_eq!(summary.output_rows, 6);
        assert!(!summary.pass_through);

        let expected = dir.path().join("processed/worldbank_population_long.csv");
        assert_eq!(summary.output, expected.display().to_string());
        let written = fs::read_to_string(expected).unwrap();
        assert!(written.starts_with("country_code,year,indicator,value"));
        assert!(written.contains("USA,2020,population,331526933"));
        assert!(written.contains("FRA,2020,population,\n"));
        assert!(!written.contains("ABW"));
    }

    #[test]
    fn test_clean_file_unknown_source_passes_through() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("other.csv");
        fs::write(&input, WIDE).unwrap();

        let summary = pipeline_in(dir.path())
            .clean_file(&input, "unknown_source", None, None)
            .unwrap();
        assert!(summary.pass_through);
        assert_eq!(summary.output_rows, 3);
    }

    #[test]
    fn test_clean_file_parquet_to_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("pop.csv");
        fs::write(&input, WIDE).unwrap();
        let output = dir.path().join("out/pop.parquet");

        let summary = pipeline_in(dir.path())
            .clean_file(
                &input,
                "worldbank_population",
                Some(&output),
                Some(OutputFormat::Parquet),
            )
            .unwrap();
        assert_eq!(summary.output, output.display().to_string());
        assert!(output.exists());
    }

    #[test]
    fn test_custom_registry() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("pop.csv");
        fs::write(&input, WIDE).unwrap();

        let filter = CountryYearFilter::new(["ABW"], 2020, 2020);
        let registry = SchemaRegistry::builder()
            .register(SchemaEntry::wide_years("aruba", "population", &filter))
            .build()
            .unwrap();
        let config = PipelineConfig::builder()
            .processed_dir(dir.path())
            .build()
            .unwrap();
        let pipeline = Pipeline::builder()
            .config(config)
            .registry(registry)
            .build()
            .unwrap();

        let summary = pipeline.clean_file(&input, "aruba", None, None).unwrap();
        assert_eq!(summary.output_rows, 1);
    }

    #[test]
    fn test_assess_file_writes_report() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("pop.csv");
        fs::write(&input, WIDE).unwrap();

        let (report, path) = pipeline_in(dir.path()).assess_file(&input, None).unwrap();
        assert_eq!(report.row_count, 3);
        assert_eq!(report.missing_value_count, 1);
        assert_eq!(path, dir.path().join("quality/pop_quality_report.txt"));
        assert!(fs::read_to_string(path).unwrap().starts_with("rows: 3"));
    }

    #[test]
    fn test_transform_file_melts_numeric_columns() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("scores.csv");
        fs::write(&input, "notes\nCountry,2020,2021\nUSA,1.5,2\nFRA,,3\n").unwrap();

        let summary = pipeline_in(dir.path()).transform_file(&input, None).unwrap();
        assert_eq!(summary.header_offset, 1);
        assert_eq!(summary.output_rows, 3);
        assert!(dir.path().join("processed/scores_long.csv").exists());
    }
}

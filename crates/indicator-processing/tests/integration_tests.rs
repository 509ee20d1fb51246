//! Integration tests for the indicator processing pipeline.
//!
//! These tests verify end-to-end behavior against small exports shaped like
//! the real World Bank, WHO and UNDP files.

use indicator_processing::acquire::{DatasetRequest, Fetcher, acquire_dataset};
use indicator_processing::provenance::register_csv;
use indicator_processing::{
    CountryYearFilter, IndicatorValue, LONG_COLUMNS, LongTable, MetadataLog, Pipeline,
    PipelineConfig, PipelineError, RawTable, ReshapeEngine, SchemaEntry, SchemaRegistry,
    detect_header_offset, detect_header_offset_in_file,
};
use polars::io::csv::read::CsvReadOptions;
use polars::prelude::*;
use pretty_assertions::assert_eq;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

// ============================================================================
// Helper Functions
// ============================================================================

fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn registry() -> SchemaRegistry {
    SchemaRegistry::builtin(&CountryYearFilter::default())
}

/// Load a fixture with the header keyword of its registered source.
fn load_fixture(filename: &str, source_id: &str) -> RawTable {
    let registry = registry();
    let entry = registry.lookup(source_id).expect("source is registered");
    let path = fixtures_path().join(filename);
    let skip = detect_header_offset_in_file(&path, &entry.header_keyword, 20)
        .expect("Failed to scan header");
    RawTable::from_csv_path(&path, skip).expect("Failed to read CSV file")
}

fn reshape_fixture(filename: &str, source_id: &str) -> LongTable {
    let raw = load_fixture(filename, source_id);
    ReshapeEngine::reshape(&raw, registry().lookup(source_id).expect("registered"))
        .expect("Reshape failed")
}

fn read_csv(path: &Path) -> DataFrame {
    CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .expect("Failed to create CSV reader")
        .finish()
        .expect("Failed to read CSV file")
}

fn test_config(dir: &Path) -> PipelineConfig {
    PipelineConfig::builder()
        .raw_dir(dir.join("raw"))
        .processed_dir(dir.join("processed"))
        .quality_dir(dir.join("quality"))
        .metadata_log(dir.join("metadata.json"))
        .build()
        .expect("valid config")
}

/// Serves one archive body for every URL.
struct FixtureFetcher(Vec<u8>);

impl Fetcher for FixtureFetcher {
    fn fetch(&self, _url: &str) -> indicator_processing::PipelineResult<Vec<u8>> {
        Ok(self.0.clone())
    }

    fn name(&self) -> &str {
        "fixture"
    }
}

fn zip_of(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = ::zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, content) in entries {
        writer
            .start_file(*name, ::zip::write::SimpleFileOptions::default())
            .unwrap();
        writer.write_all(content).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

// ============================================================================
// Header Detection
// ============================================================================

#[test]
fn test_header_offsets_of_fixtures() {
    let wb = fixtures_path().join("worldbank_population.csv");
    let who = fixtures_path().join("who_treatment_outcomes.csv");
    let hdi = fixtures_path().join("undp_hdi.csv");

    assert_eq!(detect_header_offset_in_file(&wb, "Country Name", 20).unwrap(), 4);
    assert_eq!(detect_header_offset_in_file(&who, "iso3", 20).unwrap(), 0);
    assert_eq!(detect_header_offset_in_file(&hdi, "country", 20).unwrap(), 0);
}

#[test]
fn test_header_on_line_five_and_no_match() {
    let lines = ["meta", "meta", "", "meta", "", "Country Name,2020", "x,1"];
    assert_eq!(detect_header_offset(lines, "Country Name", 20), 5);
    assert_eq!(detect_header_offset(lines, "Missing", 20), 0);
    // Outside the scan window counts as no match.
    assert_eq!(detect_header_offset(lines, "Country Name", 3), 0);
}

// ============================================================================
// World Bank Wide Exports
// ============================================================================

#[test]
fn test_wide_unpivot_yields_k_times_n_rows() {
    let raw = load_fixture("worldbank_population.csv", "worldbank_population");
    assert_eq!(raw.height(), 5);

    let registry = registry();
    let entry = registry.lookup("worldbank_population").unwrap();
    let observations = ReshapeEngine::unpivot(&raw, entry).unwrap();
    // Five year columns by five countries, before the post-filter.
    assert_eq!(observations.len(), 25);
}

#[test]
fn test_worldbank_population_filtered() {
    let table = reshape_fixture("worldbank_population.csv", "worldbank_population");

    // CHN, FRA and USA for 2014..=2016; ABW and AFG are outside the universe.
    assert_eq!(table.len(), 9);

    let filter = CountryYearFilter::default();
    assert!(
        table
            .rows
            .iter()
            .all(|r| filter.contains(&r.country_code, r.year))
    );
    assert!(table.rows.iter().all(|r| r.indicator == "population"));

    let usa_2014 = table
        .rows
        .iter()
        .find(|r| r.country_code == "USA" && r.year == 2014)
        .unwrap();
    assert_eq!(usa_2014.value, Some(IndicatorValue::Integer(318_386_329)));

    let fra_2015 = table
        .rows
        .iter()
        .find(|r| r.country_code == "FRA" && r.year == 2015)
        .unwrap();
    assert_eq!(fra_2015.value, None);
}

#[test]
fn test_reshape_is_idempotent() {
    let first = reshape_fixture("worldbank_population.csv", "worldbank_population");
    let second = reshape_fixture("worldbank_population.csv", "worldbank_population");
    assert_eq!(first.rows, second.rows);

    let first = reshape_fixture("who_treatment_outcomes.csv", "who_treatment_outcomes");
    let second = reshape_fixture("who_treatment_outcomes.csv", "who_treatment_outcomes");
    assert_eq!(first.rows, second.rows);
}

// ============================================================================
// WHO Multi-Field Exports
// ============================================================================

#[test]
fn test_who_outcomes_mapping_and_zero_drop() {
    let table = reshape_fixture("who_treatment_outcomes.csv", "who_treatment_outcomes");

    let usa_2020: Vec<_> = table
        .rows
        .iter()
        .filter(|r| r.country_code == "USA" && r.year == 2020)
        .collect();

    let cohort = usa_2020
        .iter()
        .find(|r| r.indicator == "new_tb_cases_cohort")
        .unwrap();
    assert_eq!(cohort.value.map(|v| v.as_f64()), Some(100.0));
    assert!(
        usa_2020
            .iter()
            .all(|r| r.indicator != "new_tb_cases_current")
    );

    // USA 2020 and IND 2021 survive the filter; zeros and "NA" are dropped.
    assert_eq!(table.len(), 5);
    assert!(table.rows.iter().all(|r| r.value.is_some()));
    assert!(table.rows.iter().all(|r| r.country_code != "AFG"));
}

#[test]
fn test_schema_mismatch_when_no_field_present() {
    let raw = load_fixture("undp_hdi.csv", "undp_hdi");
    let registry = registry();
    let who = registry.lookup("who_treatment_outcomes").unwrap();

    let result = ReshapeEngine::reshape(&raw, who);
    match result {
        Err(err @ PipelineError::SchemaMismatch { .. }) => {
            assert_eq!(err.error_code(), "SCHEMA_MISMATCH");
            assert!(err.is_fatal());
        }
        other => panic!("expected SchemaMismatch, got {:?}", other.map(|t| t.len())),
    }
}

// ============================================================================
// UNDP HDI Exports
// ============================================================================

#[test]
fn test_hdi_default_universe() {
    let table = reshape_fixture("undp_hdi.csv", "undp_hdi");
    let codes: Vec<&str> = table.rows.iter().map(|r| r.country_code.as_str()).collect();
    assert_eq!(codes, vec!["USA", "FRA"]);
    assert!(table.rows.iter().all(|r| r.indicator == "hdi"));
}

#[test]
fn test_hdi_country_code_extraction() {
    let raw = load_fixture("undp_hdi.csv", "undp_hdi");
    let filter = CountryYearFilter::new(["AFG", "FRA"], 2014, 2025);
    let entry = SchemaEntry::already_long("undp_hdi", "hdi", &filter);

    let table = ReshapeEngine::reshape(&raw, &entry).unwrap();
    let codes: Vec<&str> = table.rows.iter().map(|r| r.country_code.as_str()).collect();
    // "Afghanistan - AFG" and "FRA - France" both resolve.
    assert_eq!(codes, vec!["AFG", "FRA"]);
}

// ============================================================================
// Pipeline Runs
// ============================================================================

#[test]
fn test_pipeline_clean_writes_canonical_csv() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = Pipeline::builder()
        .config(test_config(dir.path()))
        .build()
        .unwrap();

    let input = fixtures_path().join("worldbank_population.csv");
    let summary = pipeline
        .clean_file(&input, "worldbank_population", None, None)
        .unwrap();
    assert_eq!(summary.header_offset, 4);
    assert_eq!(summary.output_rows, 9);

    let output = dir.path().join("processed/worldbank_population_long.csv");
    let df = read_csv(&output);
    let names: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|n| n.to_string())
        .collect();
    assert_eq!(names, LONG_COLUMNS.to_vec());
    assert_eq!(df.height(), 9);
}

#[test]
fn test_pipeline_assess_report() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = Pipeline::builder()
        .config(test_config(dir.path()))
        .build()
        .unwrap();

    let input = fixtures_path().join("worldbank_population.csv");
    let (report, path) = pipeline.assess_file(&input, None).unwrap();

    assert_eq!(report.row_count, 5);
    assert_eq!(report.column_count, 9);
    assert_eq!(report.missing_value_count, 1);
    assert_eq!(report.duplicate_row_count, 0);
    assert_eq!(report.columns_with_missing, vec!["2015".to_string()]);
    assert_eq!(
        path,
        dir.path().join("quality/worldbank_population_quality_report.txt")
    );

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["rows"], 5);
    assert_eq!(json["missing_values"], 1);
}

#[test]
fn test_pipeline_clean_who_to_parquet() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path())
        .to_builder()
        .output_format(indicator_processing::OutputFormat::Parquet)
        .build()
        .unwrap();
    let pipeline = Pipeline::builder().config(config).build().unwrap();

    let input = fixtures_path().join("who_treatment_outcomes.csv");
    let summary = pipeline
        .clean_file(&input, "who_treatment_outcomes", None, None)
        .unwrap();
    assert_eq!(summary.output_rows, 5);
    assert!(
        dir.path()
            .join("processed/who_treatment_outcomes_long.parquet")
            .exists()
    );
}

// ============================================================================
// Acquisition and Provenance
// ============================================================================

#[test]
fn test_register_csv_appends_records() {
    let dir = tempfile::tempdir().unwrap();
    let csv = dir.path().join("worldbank_population.csv");
    std::fs::copy(fixtures_path().join("worldbank_population.csv"), &csv).unwrap();
    let log = MetadataLog::new(dir.path().join("docs/metadata.json"));

    let record = register_csv(&csv, 4, "worldbank_population", &log).unwrap();
    assert_eq!(record.rows, 5);
    assert_eq!(record.file, "worldbank_population.csv");
    assert_eq!(record.hash.len(), 64);
    assert!(record.timestamp.ends_with('Z'));

    register_csv(&csv, 4, "worldbank_population", &log).unwrap();
    let records = log.records().unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].hash, records[1].hash);
}

#[test]
fn test_acquire_then_clean() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let log = MetadataLog::new(&config.metadata_log);

    let body = std::fs::read(fixtures_path().join("worldbank_population.csv")).unwrap();
    let archive = zip_of(&[
        ("API_SP.POP.TOTL_DS2_en_csv_v2.csv", body.as_slice()),
        ("Metadata_Country_API_SP.POP.TOTL_DS2_en_csv_v2.csv", &b"Country Code\n"[..]),
    ]);
    let fetcher = FixtureFetcher(archive);
    let request = DatasetRequest::new(
        "https://api.worldbank.org/v2/en/indicator/SP.POP.TOTL?downloadformat=csv",
        "worldbank_population",
        &config.raw_dir,
    );

    let acquisition = acquire_dataset(&fetcher, &request, &config, &log).unwrap();
    assert_eq!(
        acquisition.csv_path,
        config.raw_dir.join("worldbank_population.csv")
    );
    assert_eq!(acquisition.header_offset, 4);
    assert_eq!(acquisition.record.rows, 5);
    assert_eq!(log.records().unwrap().len(), 1);

    let pipeline = Pipeline::builder().config(config).build().unwrap();
    let summary = pipeline
        .clean_file(&acquisition.csv_path, "worldbank_population", None, None)
        .unwrap();
    assert_eq!(summary.output_rows, 9);
}

#[test]
fn test_acquire_without_matching_entries_fails() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let log = MetadataLog::new(&config.metadata_log);

    let fetcher = FixtureFetcher(zip_of(&[("readme.txt", &b"nothing here"[..])]));
    let request = DatasetRequest::new("https://example.org/x.zip", "empty", &config.raw_dir);

    let result = acquire_dataset(&fetcher, &request, &config, &log);
    assert!(matches!(result, Err(PipelineError::NoFilesExtracted { .. })));
    assert!(log.records().unwrap().is_empty());
}

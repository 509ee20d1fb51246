//! End-to-end acquisition flows: download, extract, register.

use super::archive::extract_from_zip;
use super::fetcher::{Fetcher, download_file};
use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result, ResultExt};
use crate::header::detect_header_offset_in_file;
use crate::provenance::{MetadataLog, ProvenanceRecord, register_csv};
use crate::schema::constants::{
    DEFAULT_ARCHIVE_EXCLUDE, DEFAULT_ARCHIVE_INCLUDE, HDRO_API_URL, WORLDBANK_TB_ARCHIVE_INCLUDE,
    WORLDBANK_TB_URL,
};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use url::Url;

/// A bulk ZIP download to acquire.
#[derive(Debug, Clone)]
pub struct DatasetRequest {
    pub url: String,
    /// Base name of the saved archive and of the renamed main CSV.
    pub prefix: String,
    pub dest_dir: PathBuf,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

impl DatasetRequest {
    /// Request with the World Bank archive filters (`API` in, `Metadata` out).
    pub fn new(
        url: impl Into<String>,
        prefix: impl Into<String>,
        dest_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            url: url.into(),
            prefix: prefix.into(),
            dest_dir: dest_dir.into(),
            include: vec![DEFAULT_ARCHIVE_INCLUDE.to_string()],
            exclude: vec![DEFAULT_ARCHIVE_EXCLUDE.to_string()],
        }
    }

    pub fn include(mut self, patterns: Vec<String>) -> Self {
        self.include = patterns;
        self
    }

    pub fn exclude(mut self, patterns: Vec<String>) -> Self {
        self.exclude = patterns;
        self
    }
}

/// Outcome of a successful acquisition.
#[derive(Debug, Clone, Serialize)]
pub struct Acquisition {
    pub csv_path: PathBuf,
    pub header_offset: usize,
    pub record: ProvenanceRecord,
}

/// Download a ZIP, extract it, rename the first extracted file to
/// `{prefix}.csv` and register it in the metadata log.
pub fn acquire_dataset(
    fetcher: &dyn Fetcher,
    request: &DatasetRequest,
    config: &PipelineConfig,
    log: &MetadataLog,
) -> Result<Acquisition> {
    info!("Acquiring '{}' from {}", request.prefix, request.url);
    let archive_name = format!("{}.zip", request.prefix);
    let (_, bytes) = download_file(
        fetcher,
        &request.url,
        &request.dest_dir,
        Some(archive_name.as_str()),
    )?;

    let extracted = extract_from_zip(
        &bytes,
        &request.dest_dir,
        &request.include,
        &request.exclude,
    )?;
    let Some(main_csv) = extracted.first() else {
        return Err(PipelineError::NoFilesExtracted {
            include: request.include.clone(),
            exclude: request.exclude.clone(),
        });
    };

    let csv_path = request.dest_dir.join(format!("{}.csv", request.prefix));
    fs::rename(main_csv, &csv_path).context(format!(
        "Renaming {} to {}",
        main_csv.display(),
        csv_path.display()
    ))?;

    register(&csv_path, &request.prefix, config, log)
}

/// World Bank tuberculosis incidence bulk download.
pub fn acquire_worldbank_tb(
    fetcher: &dyn Fetcher,
    dest_dir: &Path,
    config: &PipelineConfig,
    log: &MetadataLog,
) -> Result<Acquisition> {
    let request = DatasetRequest::new(WORLDBANK_TB_URL, "worldbank_tb", dest_dir)
        .include(vec![WORLDBANK_TB_ARCHIVE_INCLUDE.to_string()]);
    acquire_dataset(fetcher, &request, config, log)
}

fn register(
    csv_path: &Path,
    source: &str,
    config: &PipelineConfig,
    log: &MetadataLog,
) -> Result<Acquisition> {
    let header_offset =
        detect_header_offset_in_file(csv_path, &config.header_keyword, config.max_scan_lines)?;
    let record = register_csv(csv_path, header_offset, source, log)?;
    Ok(Acquisition {
        csv_path: csv_path.to_path_buf(),
        header_offset,
        record,
    })
}

/// Parameters of an HDRO composite-indices query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HdiQuery {
    pub countries: String,
    /// Comma-separated years.
    pub years: String,
    pub indicators: String,
    pub prefix: String,
}

impl Default for HdiQuery {
    fn default() -> Self {
        Self {
            countries: "all".to_string(),
            years: "2020,2021,2022".to_string(),
            indicators: "HDI".to_string(),
            prefix: "undp_hdi".to_string(),
        }
    }
}

impl HdiQuery {
    pub fn url(&self, api_key: &str) -> Result<Url> {
        let url = Url::parse_with_params(
            HDRO_API_URL,
            &[
                ("apikey", api_key),
                ("countryOrAggregation", self.countries.as_str()),
                ("year", self.years.as_str()),
                ("indicator", self.indicators.as_str()),
            ],
        )?;
        Ok(url)
    }
}

/// Query the UNDP HDRO API and save the CSV body as `{prefix}.csv`.
///
/// Download failures report the endpoint without the query so the API key
/// stays out of logs.
pub fn acquire_undp_hdi(
    fetcher: &dyn Fetcher,
    api_key: &str,
    query: &HdiQuery,
    dest_dir: &Path,
    log: &MetadataLog,
) -> Result<Acquisition> {
    if api_key.trim().is_empty() {
        return Err(PipelineError::InvalidConfig(
            "an HDRO API key is required".to_string(),
        ));
    }
    let url = query.url(api_key)?;
    info!(
        "Querying HDRO for {} ({} / {})",
        query.indicators, query.countries, query.years
    );

    let body = fetcher.fetch(url.as_str()).map_err(|e| match e {
        PipelineError::DownloadFailure { reason, .. } => PipelineError::DownloadFailure {
            url: HDRO_API_URL.to_string(),
            reason,
        },
        other => other,
    })?;

    fs::create_dir_all(dest_dir)?;
    let csv_path = dest_dir.join(format!("{}.csv", query.prefix));
    fs::write(&csv_path, &body).context(format!("Writing {}", csv_path.display()))?;
    info!("UNDP HDI dataset saved to {}", csv_path.display());

    let record = register_csv(&csv_path, 0, &query.prefix, log)?;
    Ok(Acquisition {
        csv_path,
        header_offset: 0,
        record,
    })
}

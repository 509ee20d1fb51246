//! Dataset acquisition.
//!
//! Downloads go through the [`Fetcher`] trait so flows can be exercised
//! without a network. The blocking HTTP implementation needs the `fetch`
//! feature (enabled by default):
//!
//! ```toml
//! indicator-processing = { version = "0.1", default-features = false }
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use indicator_processing::acquire::{DatasetRequest, HttpFetcher, acquire_dataset};
//! use indicator_processing::provenance::MetadataLog;
//!
//! let fetcher = HttpFetcher::with_timeout(config.request_timeout_secs)?;
//! let log = MetadataLog::new(&config.metadata_log);
//! let request = DatasetRequest::new(url, "worldbank_population", &config.raw_dir);
//! let acquisition = acquire_dataset(&fetcher, &request, &config, &log)?;
//! ```

mod archive;
mod dataset;
mod fetcher;

#[cfg(feature = "fetch")]
mod http;

pub use archive::{entry_selected, extract_from_zip};
pub use dataset::{
    Acquisition, DatasetRequest, HdiQuery, acquire_dataset, acquire_undp_hdi,
    acquire_worldbank_tb,
};
pub use fetcher::{FALLBACK_FILE_NAME, Fetcher, download_file, infer_file_name};

#[cfg(feature = "fetch")]
pub use http::{DEFAULT_TIMEOUT_SECS, HttpFetcher};

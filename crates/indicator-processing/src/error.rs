//! Custom error types for the indicator processing pipeline.
//!
//! This module provides the error hierarchy using `thiserror`. Acquisition and
//! reshape failures are fatal and propagate to the caller; coercion failures
//! are recovered locally as null cells and only surface in logs.
//!
//! Errors serialize as `{ code, message }` so they can be emitted in JSON
//! output next to reports.

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// The main error type for the indicator pipeline.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A download returned a non-2xx status or failed in transport.
    #[error("Download of '{url}' failed: {reason}")]
    DownloadFailure { url: String, reason: String },

    /// Archive filters matched no entries.
    #[error("No files extracted from archive (include: {include:?}, exclude: {exclude:?})")]
    NoFilesExtracted {
        include: Vec<String>,
        exclude: Vec<String>,
    },

    /// The reshape engine could not find the columns a source requires.
    #[error("Schema mismatch for source '{source_id}': {reason}")]
    SchemaMismatch { source_id: String, reason: String },

    /// A cell could not be parsed into the requested type.
    #[error("Cannot coerce '{value}' to {target}")]
    CoercionFailure { value: String, target: &'static str },

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Writing a report or output artifact failed.
    #[error("Failed to generate report: {0}")]
    ReportGenerationFailed(String),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Archive could not be opened or read.
    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// A URL could not be parsed or assembled.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<PipelineError>,
    },
}

impl PipelineError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        PipelineError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Shorthand for a [`PipelineError::SchemaMismatch`].
    pub fn schema_mismatch(source_id: impl Into<String>, reason: impl Into<String>) -> Self {
        PipelineError::SchemaMismatch {
            source_id: source_id.into(),
            reason: reason.into(),
        }
    }

    /// Get a stable error code for machine-readable output.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::DownloadFailure { .. } => "DOWNLOAD_FAILURE",
            Self::NoFilesExtracted { .. } => "NO_FILES_EXTRACTED",
            Self::SchemaMismatch { .. } => "SCHEMA_MISMATCH",
            Self::CoercionFailure { .. } => "COERCION_FAILURE",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::ReportGenerationFailed(_) => "REPORT_GENERATION_FAILED",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::Zip(_) => "ZIP_ERROR",
            Self::Url(_) => "URL_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Whether this error must abort the run.
    ///
    /// Only coercion failures are recoverable: the offending cell becomes null.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::CoercionFailure { .. } => false,
            Self::WithContext { source, .. } => source.is_fatal(),
            _ => true,
        }
    }
}

impl Serialize for PipelineError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("PipelineError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| PipelineError::Polars(e).with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, std::io::Error> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| PipelineError::Io(e).with_context(context))
    }
}

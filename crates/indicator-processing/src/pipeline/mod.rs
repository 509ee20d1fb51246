//! Pipeline module.
//!
//! This module provides the file-level pipeline that runs header detection,
//! reshaping, quality assessment and artifact writing.

mod builder;

pub use builder::{Pipeline, PipelineBuilder};

//! Source schema registry.
//!
//! Each known source identifier maps to a [`SchemaEntry`] describing how its
//! raw export is reshaped: the header keyword, the reshape mode, the field
//! rename table and the country/year post-filter.

pub mod constants;
mod registry;

pub use registry::{
    IndicatorSource, RenameMap, ReshapeMode, SchemaEntry, SchemaRegistry, SchemaRegistryBuilder,
    ValueKind,
};

//! Per-source schema entries and the registry that owns them.

use super::constants::{DEFAULT_HEADER_KEYWORD, TB_TREATMENT_OUTCOME_FIELDS};
use crate::config::CountryYearFilter;
use crate::error::{PipelineError, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

/// How a source lays out its values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReshapeMode {
    /// One column per year (World Bank exports).
    WideYears,
    /// Already one row per country and year, with `year` and `value` columns.
    AlreadyLong,
    /// Several named indicator columns per country/year row (WHO outcomes).
    MultiField,
}

/// Where the `indicator` of each canonical row comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IndicatorSource {
    /// Every row gets the same indicator name.
    Constant(String),
    /// Each unpivoted column's renamed field becomes the indicator.
    RenameMap,
}

/// Numeric representation of the `value` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    #[default]
    Float,
    /// Nullable integers; non-integral values become null.
    Integer,
}

/// Ordered source-field → indicator-name table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenameMap {
    pairs: Vec<(String, String)>,
}

impl RenameMap {
    /// Build from ordered pairs. A repeated source key keeps its first
    /// position and takes the last target.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut ordered: Vec<(String, String)> = Vec::new();
        for (from, to) in pairs {
            let (from, to) = (from.into(), to.into());
            match ordered.iter_mut().find(|(key, _)| *key == from) {
                Some(existing) => existing.1 = to,
                None => ordered.push((from, to)),
            }
        }
        Self { pairs: ordered }
    }

    pub fn get(&self, source_field: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(from, _)| from == source_field)
            .map(|(_, to)| to.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(from, to)| (from.as_str(), to.as_str()))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Static configuration for one source.
///
/// Entries are immutable once registered; build them with the mode-specific
/// constructors and the `with_*` adjusters.
#[derive(Debug, Clone, Serialize)]
pub struct SchemaEntry {
    pub id: String,
    /// Substring marking the true header row of raw exports.
    pub header_keyword: String,
    pub field_rename_map: Option<RenameMap>,
    pub reshape_mode: ReshapeMode,
    pub indicator: IndicatorSource,
    /// Explicit country column. When absent or missing from the frame the
    /// mode's fallback detection applies.
    pub country_column: Option<String>,
    pub value_kind: ValueKind,
    /// Treat exact zeros as "not reported" and drop them.
    pub drop_zero_values: bool,
    pub post_filter: CountryYearFilter,
}

impl SchemaEntry {
    /// A World Bank style source with one column per year.
    pub fn wide_years(
        id: impl Into<String>,
        indicator: impl Into<String>,
        filter: &CountryYearFilter,
    ) -> Self {
        Self {
            id: id.into(),
            header_keyword: DEFAULT_HEADER_KEYWORD.to_string(),
            field_rename_map: None,
            reshape_mode: ReshapeMode::WideYears,
            indicator: IndicatorSource::Constant(indicator.into()),
            country_column: Some("Country Code".to_string()),
            value_kind: ValueKind::Float,
            drop_zero_values: false,
            post_filter: filter.clone(),
        }
    }

    /// A source already keyed one row per country and year.
    pub fn already_long(
        id: impl Into<String>,
        indicator: impl Into<String>,
        filter: &CountryYearFilter,
    ) -> Self {
        Self {
            id: id.into(),
            header_keyword: "country".to_string(),
            field_rename_map: None,
            reshape_mode: ReshapeMode::AlreadyLong,
            indicator: IndicatorSource::Constant(indicator.into()),
            country_column: None,
            value_kind: ValueKind::Float,
            drop_zero_values: false,
            post_filter: filter.clone(),
        }
    }

    /// A source carrying several indicator columns per row.
    pub fn multi_field(
        id: impl Into<String>,
        rename_map: RenameMap,
        filter: &CountryYearFilter,
    ) -> Self {
        Self {
            id: id.into(),
            header_keyword: "iso3".to_string(),
            field_rename_map: Some(rename_map),
            reshape_mode: ReshapeMode::MultiField,
            indicator: IndicatorSource::RenameMap,
            country_column: Some("country_code".to_string()),
            value_kind: ValueKind::Float,
            drop_zero_values: false,
            post_filter: filter.clone(),
        }
    }

    pub fn with_header_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.header_keyword = keyword.into();
        self
    }

    pub fn with_country_column(mut self, column: impl Into<String>) -> Self {
        self.country_column = Some(column.into());
        self
    }

    pub fn with_value_kind(mut self, kind: ValueKind) -> Self {
        self.value_kind = kind;
        self
    }

    pub fn with_zero_values_dropped(mut self, drop: bool) -> Self {
        self.drop_zero_values = drop;
        self
    }

    /// The constant indicator name, if this entry has one.
    pub fn constant_indicator(&self) -> Option<&str> {
        match &self.indicator {
            IndicatorSource::Constant(name) => Some(name),
            IndicatorSource::RenameMap => None,
        }
    }
}

/// Lookup table from source identifier to [`SchemaEntry`].
///
/// Built once at startup. Unknown identifiers are an expected outcome; the
/// pipeline falls back to a pass-through cleaner for them.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    entries: BTreeMap<String, SchemaEntry>,
}

static_assertions::assert_impl_all!(SchemaRegistry: Send, Sync);

impl SchemaRegistry {
    pub fn builder() -> SchemaRegistryBuilder {
        SchemaRegistryBuilder::default()
    }

    /// Registry of the built-in World Bank, WHO and UNDP sources, all sharing
    /// `filter` as their post-filter.
    pub fn builtin(filter: &CountryYearFilter) -> Self {
        let entries = [
            SchemaEntry::already_long("undp_hdi", "hdi", filter),
            SchemaEntry::wide_years(
                "worldbank_tb_incidence",
                "tb_incidence_per_hundred_thousand",
                filter,
            ),
            SchemaEntry::wide_years("worldbank_population", "population", filter)
                .with_value_kind(ValueKind::Integer),
            SchemaEntry::wide_years("worldbank_gdp_per_capita_usd", "gdp_per_capita_usd", filter),
            SchemaEntry::wide_years(
                "worldbank_health_expenditure_gdp_percent",
                "health_expenditure_gdp_percent",
                filter,
            ),
            SchemaEntry::wide_years(
                "worldbank_health_expenditure_usd",
                "worldbank_health_expenditure_usd",
                filter,
            ),
            SchemaEntry::multi_field(
                "who_treatment_outcomes",
                RenameMap::from_pairs(TB_TREATMENT_OUTCOME_FIELDS.iter().copied()),
                filter,
            )
            .with_zero_values_dropped(true),
        ];

        Self {
            entries: entries
                .into_iter()
                .map(|entry| (entry.id.clone(), entry))
                .collect(),
        }
    }

    pub fn lookup(&self, source_id: &str) -> Option<&SchemaEntry> {
        let entry = self.entries.get(source_id);
        if entry.is_none() {
            debug!("No schema entry registered for '{}'", source_id);
        }
        entry
    }

    /// Registered identifiers in sorted order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn entries(&self) -> impl Iterator<Item = &SchemaEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Builder for custom registries.
#[derive(Debug, Default)]
pub struct SchemaRegistryBuilder {
    entries: Vec<SchemaEntry>,
}

impl SchemaRegistryBuilder {
    pub fn register(mut self, entry: SchemaEntry) -> Self {
        self.entries.push(entry);
        self
    }

    /// Build the registry, rejecting duplicate identifiers and entries whose
    /// post-filter is invalid.
    pub fn build(self) -> Result<SchemaRegistry> {
        let mut entries = BTreeMap::new();
        for entry in self.entries {
            entry.post_filter.validate().map_err(|e| {
                PipelineError::InvalidConfig(format!("source '{}': {}", entry.id, e))
            })?;
            if entry.reshape_mode == ReshapeMode::MultiField && entry.field_rename_map.is_none() {
                return Err(PipelineError::InvalidConfig(format!(
                    "source '{}' is multi-field but has no rename map",
                    entry.id
                )));
            }
            if entries.contains_key(&entry.id) {
                return Err(PipelineError::InvalidConfig(format!(
                    "source '{}' registered twice",
                    entry.id
                )));
            }
            entries.insert(entry.id.clone(), entry);
        }
        Ok(SchemaRegistry { entries })
    }
}

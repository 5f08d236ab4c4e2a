//! Dialect registry built from settings.
//!
//! Every configured dialect yields a flat dialect and, when it declares a
//! `structured` table, a structured one paired with a flat dialect for
//! top-level and flattened views.

use std::sync::Arc;

use bom_diff_core::{
    Dialect, EquivalenceGroups, FilterSet, FilterSpec, ItemSchema, PositionSource,
};
use serde::Deserialize;
use tracing::debug;

use crate::settings::{Settings, SettingsError};

/// One `[[dialects]]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DialectSpec {
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    pub attributes: Vec<String>,
    #[serde(default)]
    pub structured: Option<StructuredSpec>,
}

/// The `structured` table of a dialect entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StructuredSpec {
    #[serde(default)]
    pub positions: Positions,
    /// Flat dialect for top-level views; defaults to the dialect itself.
    #[serde(default)]
    pub flat: Option<String>,
    /// Position columns, read after the dialect's attributes.
    #[serde(default)]
    pub filters: Vec<FilterSpec>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Positions {
    #[default]
    Explicit,
    Levels,
    Sequential,
}

impl From<Positions> for PositionSource {
    fn from(value: Positions) -> Self {
        match value {
            Positions::Explicit => PositionSource::Explicit,
            Positions::Levels => PositionSource::Levels,
            Positions::Sequential => PositionSource::Sequential,
        }
    }
}

#[derive(Debug)]
struct Entry {
    name: String,
    aliases: Vec<String>,
    flat: Arc<Dialect>,
    structured: Option<Arc<Dialect>>,
}

impl Entry {
    fn answers_to(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name) || self.aliases.iter().any(|a| a.eq_ignore_ascii_case(name))
    }
}

/// Named flat and structured dialects.
#[derive(Debug)]
pub struct DialectRegistry {
    entries: Vec<Entry>,
    source: String,
}

impl DialectRegistry {
    pub fn from_settings(
        settings: &Settings,
        groups: &EquivalenceGroups,
    ) -> Result<Self, SettingsError> {
        let categories = Arc::new(settings.category_table());
        let primary = settings.primary()?;
        let schema_error = |source| SettingsError::Schema {
            path: settings.source().to_string(),
            source,
        };
        let common = FilterSet::from_specs(&settings.filters, &categories).map_err(schema_error)?;
        let fallback = common.get(&primary).cloned();

        let schema = |filters: FilterSet| {
            Arc::new(match &fallback {
                Some(fallback) => {
                    ItemSchema::with_primary_fallback(filters, primary.as_str(), fallback.clone(), groups)
                }
                None => ItemSchema::new(filters, primary.as_str(), groups),
            })
        };

        let mut entries: Vec<Entry> = Vec::with_capacity(settings.dialects.len());
        for spec in &settings.dialects {
            if entries.iter().any(|e| e.answers_to(&spec.name)) {
                return Err(settings.invalid(format!("dialect '{}' is defined twice", spec.name)));
            }
            if let Some(unknown) = spec.attributes.iter().find(|a| common.get(a).is_none()) {
                return Err(settings.invalid(format!(
                    "dialect '{}' reads unknown attribute '{unknown}'",
                    spec.name
                )));
            }
            let flat = Dialect::flat(spec.name.clone(), schema(common.select(&spec.attributes)));
            entries.push(Entry {
                name: spec.name.clone(),
                aliases: spec.aliases.clone(),
                flat: Arc::new(flat),
                structured: None,
            });
        }

        for (index, spec) in settings.dialects.iter().enumerate() {
            let Some(structured) = &spec.structured else {
                continue;
            };
            let pair = structured.flat.as_deref().unwrap_or(&spec.name);
            let flat = entries
                .iter()
                .find(|e| e.answers_to(pair))
                .map(|e| Arc::clone(&e.flat))
                .ok_or_else(|| {
                    settings.invalid(format!(
                        "structured dialect '{}' pairs with unknown flat dialect '{pair}'",
                        spec.name
                    ))
                })?;

            let mut filters = common.select(&spec.attributes);
            for local in FilterSet::from_specs(&structured.filters, &categories)
                .map_err(schema_error)?
                .iter()
            {
                filters.push(local.clone());
            }
            let dialect = Dialect::structured(
                format!("{} structured", spec.name),
                schema(filters),
                structured.positions.into(),
            )
            .with_flat(flat);
            debug!(dialect = ?dialect, "registered structured dialect");
            entries[index].structured = Some(Arc::new(dialect));
        }

        Ok(Self {
            entries,
            source: settings.source().to_string(),
        })
    }

    /// Configured dialect names, in settings order.
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name.as_str()).collect()
    }

    fn entry(&self, name: &str) -> Result<&Entry, SettingsError> {
        self.entries
            .iter()
            .find(|e| e.answers_to(name))
            .ok_or_else(|| SettingsError::Invalid {
                path: self.source.clone(),
                message: format!(
                    "unknown dialect '{name}' (known: {})",
                    self.names().join(", ")
                ),
            })
    }

    /// Flat dialect by name or alias, in any case.
    pub fn flat(&self, name: &str) -> Result<Arc<Dialect>, SettingsError> {
        self.entry(name).map(|e| Arc::clone(&e.flat))
    }

    /// Structured dialect by name or alias, in any case.
    pub fn structured(&self, name: &str) -> Result<Arc<Dialect>, SettingsError> {
        let entry = self.entry(name)?;
        entry
            .structured
            .as_ref()
            .map(Arc::clone)
            .ok_or_else(|| SettingsError::Invalid {
                path: self.source.clone(),
                message: format!("dialect '{}' has no structured form", entry.name),
            })
    }
}

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use bom_diff_core::{Bom, Categories, FilterSpec, SchemaError};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::dialects::DialectSpec;

const EMBEDDED: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config/default.toml"));
const EMBEDDED_NAME: &str = "embedded settings";

/// Comparison settings: compared and shown properties, category table,
/// header filters and dialects.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub primary_prop: String,
    #[serde(default)]
    pub diff_properties: Vec<String>,
    #[serde(default)]
    pub show_properties: Vec<String>,
    #[serde(default)]
    pub ignored_categories: Vec<String>,
    #[serde(default)]
    pub show_common: bool,
    #[serde(default)]
    pub categories: BTreeMap<String, String>,
    #[serde(default)]
    pub filters: Vec<FilterSpec>,
    #[serde(default)]
    pub dialects: Vec<DialectSpec>,
    #[serde(skip)]
    source: String,
}

/// Errors returned when loading settings files.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse settings file {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
    #[error("invalid settings in {path}: {message}")]
    Invalid { path: String, message: String },
    #[error("invalid header filters in {path}: {source}")]
    Schema { path: String, source: SchemaError },
}

impl Settings {
    /// Built-in settings.
    pub fn embedded() -> Result<Settings, SettingsError> {
        Self::layered(None, EMBEDDED_NAME.to_string())
    }

    /// Built-in settings with every top-level key of `path` replacing its
    /// built-in counterpart.
    pub fn load(path: &Path) -> Result<Settings, SettingsError> {
        let raw = fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::layered(Some(&raw), path.display().to_string())
    }

    /// Settings from `path` when given, otherwise the built-in ones.
    pub fn resolve(path: Option<&Path>) -> Result<Settings, SettingsError> {
        match path {
            Some(path) => Self::load(path),
            None => Self::embedded(),
        }
    }

    fn layered(overlay: Option<&str>, path: String) -> Result<Settings, SettingsError> {
        let mut table: toml::Table = toml::from_str(EMBEDDED).map_err(|source| {
            SettingsError::Parse {
                path: EMBEDDED_NAME.to_string(),
                source,
            }
        })?;
        if let Some(raw) = overlay {
            let user: toml::Table = toml::from_str(raw).map_err(|source| SettingsError::Parse {
                path: path.clone(),
                source,
            })?;
            debug!(path = %path, keys = ?user.keys().collect::<Vec<_>>(), "overriding settings");
            table.extend(user);
        }
        let mut settings: Settings = toml::Value::Table(table)
            .try_into()
            .map_err(|source| SettingsError::Parse {
                path: path.clone(),
                source,
            })?;
        settings.source = path;
        settings.primary()?;
        Ok(settings)
    }

    /// Where these settings were read from.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub(crate) fn invalid(&self, message: impl Into<String>) -> SettingsError {
        SettingsError::Invalid {
            path: self.source.clone(),
            message: message.into(),
        }
    }

    /// Every configured filter name, dialect-local position columns included.
    pub fn property_names(&self) -> Vec<&str> {
        let local = self
            .dialects
            .iter()
            .filter_map(|d| d.structured.as_ref())
            .flat_map(|s| s.filters.iter());
        let mut names: Vec<&str> = Vec::new();
        for spec in self.filters.iter().chain(local) {
            if !names.contains(&spec.name.as_str()) {
                names.push(&spec.name);
            }
        }
        names
    }

    /// Case-insensitive lookup of a configured filter name.
    pub fn resolve_property(&self, name: &str) -> Option<String> {
        let wanted = name.to_lowercase();
        self.property_names()
            .into_iter()
            .find(|known| known.to_lowercase() == wanted)
            .map(str::to_string)
    }

    /// The primary comparison attribute. An unknown name is an error.
    pub fn primary(&self) -> Result<String, SettingsError> {
        self.resolve_property(&self.primary_prop).ok_or_else(|| {
            self.invalid(format!("'{}' is an invalid property name", self.primary_prop))
        })
    }

    fn resolve_all(&self, names: &[String]) -> Vec<String> {
        names
            .iter()
            .filter_map(|name| {
                let resolved = self.resolve_property(name);
                if resolved.is_none() {
                    warn!(property = %name, "unknown property name, skipping");
                }
                resolved
            })
            .collect()
    }

    pub fn diff_names(&self) -> Vec<String> {
        self.resolve_all(&self.diff_properties)
    }

    pub fn show_names(&self) -> Vec<String> {
        self.resolve_all(&self.show_properties)
    }

    pub fn category_table(&self) -> Categories {
        Categories::new(self.categories.iter().map(|(c, n)| (c.clone(), n.clone())))
    }

    /// Apply compared, shown and ignored settings to a collection.
    pub fn apply(&self, bom: &mut Bom) {
        bom.set_diff_props(self.diff_names());
        bom.set_show_props(self.show_names());
        bom.set_ignored_categories(&self.ignored_categories, &self.category_table());
    }
}

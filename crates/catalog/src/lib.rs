//! Dataset registry: every selectable indicator, where its resource lives and
//! the scaling policy used to color it.

pub mod policy;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

pub use policy::*;

/// Current registry layout. Version 1 encoded policies as string tuples.
pub const REGISTRY_SCHEMA_VERSION: u32 = 2;

const BUILTIN_REGISTRY: &str = include_str!("../assets/datasets.json");

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetEntry {
    pub name: String,
    /// Selector group, e.g. `Ecology`.
    pub group: String,
    /// Resource directory; the file is `<path>/<name>.json`.
    pub path: String,
    pub unit: String,
    pub description: String,
    pub policy: ScalingPolicy,
}

impl DatasetEntry {
    pub fn resource_path(&self) -> String {
        let dir = self.path.trim_end_matches('/');
        if dir.is_empty() {
            format!("{}.json", self.name)
        } else {
            format!("{dir}/{}.json", self.name)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    Json(String),
    UnsupportedSchemaVersion(u32),
    InvalidEntry { name: String, reason: String },
    Duplicate(String),
}

impl std::fmt::Display for CatalogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogError::Json(msg) => write!(f, "dataset registry is not valid json: {msg}"),
            CatalogError::UnsupportedSchemaVersion(v) => {
                write!(f, "unsupported dataset registry schema version {v}")
            }
            CatalogError::InvalidEntry { name, reason } => {
                write!(f, "invalid registry entry {name:?}: {reason}")
            }
            CatalogError::Duplicate(name) => write!(f, "duplicate registry entry {name:?}"),
        }
    }
}

impl std::error::Error for CatalogError {}

#[derive(Debug, Deserialize)]
struct RegistryFile {
    schema_version: u32,
    datasets: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct EntryRecord {
    name: String,
    group: String,
    path: String,
    #[serde(default)]
    unit: String,
    #[serde(default)]
    description: String,
    scaling: PolicyRecord,
}

#[derive(Debug, Deserialize)]
struct LegacyEntryRecord {
    name: String,
    group: String,
    path: String,
    #[serde(default)]
    unit: String,
    #[serde(default)]
    description: String,
    scaling: Vec<String>,
    #[serde(default)]
    thresholds: Vec<f64>,
}

/// Immutable registry keyed by dataset name, in registration order.
#[derive(Debug, Clone, Default)]
pub struct DatasetCatalog {
    entries: Vec<DatasetEntry>,
    by_name: HashMap<String, usize>,
}

impl DatasetCatalog {
    /// The registry shipped with the crate.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_json_str(BUILTIN_REGISTRY)
    }

    /// Parses and validates a registry. Every policy is checked here so later
    /// lookups cannot fail on shape.
    pub fn from_json_str(raw: &str) -> Result<Self, CatalogError> {
        let file: RegistryFile =
            serde_json::from_str(raw).map_err(|e| CatalogError::Json(e.to_string()))?;

        let decode: fn(serde_json::Value) -> Result<DatasetEntry, CatalogError> =
            match file.schema_version {
                1 => decode_legacy_entry,
                REGISTRY_SCHEMA_VERSION => decode_entry,
                other => return Err(CatalogError::UnsupportedSchemaVersion(other)),
            };

        let mut catalog = DatasetCatalog::default();
        for value in file.datasets {
            catalog.insert(decode(value)?)?;
        }
        Ok(catalog)
    }

    pub fn from_entries(entries: Vec<DatasetEntry>) -> Result<Self, CatalogError> {
        let mut catalog = DatasetCatalog::default();
        for e in entries {
            catalog.insert(e)?;
        }
        Ok(catalog)
    }

    fn insert(&mut self, entry: DatasetEntry) -> Result<(), CatalogError> {
        if self.by_name.contains_key(&entry.name) {
            return Err(CatalogError::Duplicate(entry.name));
        }
        self.by_name.insert(entry.name.clone(), self.entries.len());
        self.entries.push(entry);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&DatasetEntry> {
        self.by_name.get(name).map(|&i| &self.entries[i])
    }

    pub fn policy(&self, name: &str) -> Option<&ScalingPolicy> {
        self.get(name).map(|e| &e.policy)
    }

    pub fn entries(&self) -> &[DatasetEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Dataset names grouped for selectors, groups in first-seen order.
    pub fn groups(&self) -> Vec<(&str, Vec<&str>)> {
        let mut out: Vec<(&str, Vec<&str>)> = Vec::new();
        for e in &self.entries {
            match out.iter_mut().find(|(g, _)| *g == e.group) {
                Some((_, names)) => names.push(&e.name),
                None => out.push((&e.group, vec![&e.name])),
            }
        }
        out
    }
}

fn decode_entry(value: serde_json::Value) -> Result<DatasetEntry, CatalogError> {
    let rec: EntryRecord =
        serde_json::from_value(value).map_err(|e| CatalogError::Json(e.to_string()))?;
    let policy = rec
        .scaling
        .into_policy()
        .map_err(|reason| CatalogError::InvalidEntry {
            name: rec.name.clone(),
            reason,
        })?;
    Ok(DatasetEntry {
        name: rec.name,
        group: rec.group,
        path: rec.path,
        unit: rec.unit,
        description: rec.description,
        policy,
    })
}

fn decode_legacy_entry(value: serde_json::Value) -> Result<DatasetEntry, CatalogError> {
    let rec: LegacyEntryRecord =
        serde_json::from_value(value).map_err(|e| CatalogError::Json(e.to_string()))?;
    let policy = policy_from_legacy_tuple(&rec.scaling, &rec.thresholds).map_err(|reason| {
        CatalogError::InvalidEntry {
            name: rec.name.clone(),
            reason,
        }
    })?;
    Ok(DatasetEntry {
        name: rec.name,
        group: rec.group,
        path: rec.path,
        unit: rec.unit,
        description: rec.description,
        policy,
    })
}

use std::path::Path;

use compute::RangeStrategy;
use layers::{CorrelationStyle, DOT_SIZE_RANGE, Viewport};
use serde::{Deserialize, Serialize};

pub const DEFAULT_DATASET_A: &str = "Arable land (percent of total land area)";
pub const DEFAULT_DATASET_B: &str = "Forest cover (percent of total land area)";
pub const DEFAULT_DIRECTORY_RESOURCE: &str = "datasets/Country Ids.json";

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Json(serde_json::Error),
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "failed to read config: {e}"),
            ConfigError::Json(e) => write!(f, "invalid config json: {e}"),
            ConfigError::Invalid(msg) => write!(f, "invalid config: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Viewer settings. Every field is optional in the JSON form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub range_strategy: RangeStrategy,
    pub initial_dataset_a: String,
    pub initial_dataset_b: String,
    /// Resource path of the entity directory.
    pub directory_resource: String,
    /// `0` shows every entity.
    pub ranking_limit: usize,
    pub correlation: CorrelationStyle,
    pub viewport: Viewport,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            range_strategy: RangeStrategy::default(),
            initial_dataset_a: DEFAULT_DATASET_A.to_string(),
            initial_dataset_b: DEFAULT_DATASET_B.to_string(),
            directory_resource: DEFAULT_DIRECTORY_RESOURCE.to_string(),
            ranking_limit: 0,
            correlation: CorrelationStyle::default(),
            viewport: Viewport::default(),
        }
    }
}

impl ViewerConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: ViewerConfig = serde_json::from_str(raw).map_err(ConfigError::Json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !DOT_SIZE_RANGE.contains(&self.correlation.dot_size) {
            return Err(ConfigError::Invalid(format!(
                "dot_size {} outside {:?}",
                self.correlation.dot_size, DOT_SIZE_RANGE
            )));
        }
        if !(self.correlation.ellipse_sigma.is_finite() && self.correlation.ellipse_sigma > 0.0) {
            return Err(ConfigError::Invalid("ellipse_sigma must be positive".into()));
        }
        if !(self.viewport.width > 0.0 && self.viewport.height > 0.0) {
            return Err(ConfigError::Invalid("viewport must be non-empty".into()));
        }
        Ok(())
    }
}

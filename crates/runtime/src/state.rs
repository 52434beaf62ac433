use catalog::ScaleKind;
use compute::YearPairing;
use foundation::EntityId;
use layers::{ColorMapper, CorrelationStyle, Viewport};
use serde::{Deserialize, Serialize};

use crate::config::ViewerConfig;
use crate::dataset::Dataset;

/// Dataset slot: A drives every view, B is the correlation y axis.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Slot {
    Primary,
    Secondary,
}

impl Slot {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "a" | "primary" => Some(Slot::Primary),
            "b" | "secondary" => Some(Slot::Secondary),
            _ => None,
        }
    }
}

impl std::fmt::Display for Slot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Slot::Primary => f.write_str("A"),
            Slot::Secondary => f.write_str("B"),
        }
    }
}

/// Shared selection state behind the three views.
#[derive(Debug, Clone)]
pub struct ViewState {
    pub primary: Option<Dataset>,
    pub secondary: Option<Dataset>,
    pub highlighted: Option<EntityId>,
    pub ranking_limit: usize,
    pub correlation_year: Option<YearPairing>,
    /// Hand-edited threshold scale for the primary dataset.
    pub threshold_override: Option<ColorMapper>,
    pub style: CorrelationStyle,
    pub viewport: Viewport,
}

impl ViewState {
    pub fn new(config: &ViewerConfig) -> Self {
        Self {
            primary: None,
            secondary: None,
            highlighted: None,
            ranking_limit: config.ranking_limit,
            correlation_year: None,
            threshold_override: None,
            style: config.correlation.clone(),
            viewport: config.viewport,
        }
    }

    pub fn dataset(&self, slot: Slot) -> Option<&Dataset> {
        match slot {
            Slot::Primary => self.primary.as_ref(),
            Slot::Secondary => self.secondary.as_ref(),
        }
    }

    pub fn dataset_mut(&mut self, slot: Slot) -> &mut Option<Dataset> {
        match slot {
            Slot::Primary => &mut self.primary,
            Slot::Secondary => &mut self.secondary,
        }
    }

    /// Scale mode of the primary dataset.
    pub fn scale_mode(&self) -> Option<ScaleKind> {
        self.primary.as_ref().map(Dataset::scaling_type_current)
    }

    /// Color mapper for the primary dataset, honoring a manual threshold edit.
    pub fn primary_mapper(&self) -> Option<&ColorMapper> {
        let primary = self.primary.as_ref()?;
        Some(self.threshold_override.as_ref().unwrap_or(primary.mapper()))
    }
}

use catalog::ScaleKind;
use compute::rank;
use foundation::math::sym_log;
use foundation::{EntityId, Year};
use formats::{EntityDirectory, RecordTable};
use serde::Serialize;

use crate::scale::{ColorMapper, Fill};
use crate::symbology::Emphasis;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AxisScale {
    Linear,
    SymLog,
}

impl AxisScale {
    /// Logarithmic datasets get a symmetric-log axis so signed values still plot.
    pub fn for_mode(mode: ScaleKind) -> Self {
        match mode {
            ScaleKind::Logarithmic => AxisScale::SymLog,
            _ => AxisScale::Linear,
        }
    }

    pub fn position(self, value: f64) -> f64 {
        match self {
            AxisScale::Linear => value,
            AxisScale::SymLog => sym_log(value),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankingBar {
    /// 1-based.
    pub rank: usize,
    pub id: EntityId,
    pub label: String,
    pub value: f64,
    /// Bar length on the value axis.
    pub position: f64,
    pub fill: Fill,
    pub emphasis: Emphasis,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankingFrame {
    pub dataset: String,
    pub unit: String,
    pub year: Year,
    pub axis: AxisScale,
    pub bars: Vec<RankingBar>,
}

impl RankingFrame {
    pub fn ids(&self) -> Vec<&str> {
        self.bars.iter().map(|b| b.id.as_str()).collect()
    }
}

pub struct RankingInput<'a> {
    pub directory: &'a EntityDirectory,
    pub name: &'a str,
    pub unit: &'a str,
    pub table: &'a RecordTable,
    pub year: Year,
    pub mode: ScaleKind,
    pub mapper: &'a ColorMapper,
    pub limit: usize,
    pub highlighted: Option<&'a EntityId>,
}

pub struct RankingView;

impl RankingView {
    pub fn render(input: &RankingInput<'_>) -> RankingFrame {
        let axis = AxisScale::for_mode(input.mode);
        let values = input.table.by_year(input.year).unwrap_or_default();
        let bars = rank(&values, input.limit)
            .into_iter()
            .enumerate()
            .map(|(i, entry)| RankingBar {
                rank: i + 1,
                label: input.directory.label(&entry.id).to_string(),
                value: entry.value,
                position: axis.position(entry.value),
                fill: input.mapper.color_for(entry.value),
                emphasis: Emphasis::of(&entry.id, input.highlighted),
                id: entry.id,
            })
            .collect();

        RankingFrame {
            dataset: input.name.to_string(),
            unit: input.unit.to_string(),
            year: input.year,
            axis,
            bars,
        }
    }
}

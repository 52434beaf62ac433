use crate::correlation::CorrelationFrame;
use crate::map::MapFrame;
use crate::ranking::RankingFrame;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewKind {
    Map,
    Ranking,
    Correlation,
}

/// Thin adapter between rendered frames and whatever draws them.
pub trait Presenter {
    fn present_map(&mut self, frame: &MapFrame);
    fn present_ranking(&mut self, frame: &RankingFrame);
    fn present_correlation(&mut self, frame: &CorrelationFrame);
}

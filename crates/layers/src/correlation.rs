use catalog::ScaleKind;
use compute::{CorrelationAnalysis, CovarianceEllipse, Statistics, YearPairing};
use foundation::math::Vec2;
use foundation::{EntityId, Rgb, Year};
use formats::{EntityDirectory, RecordTable};
use serde::{Deserialize, Serialize};

use crate::ranking::AxisScale;
use crate::symbology::{Emphasis, NEUTRAL_POINT, RegionPalette};

pub const DEFAULT_DOT_SIZE: u8 = 3;
pub const DOT_SIZE_RANGE: std::ops::RangeInclusive<u8> = 1..=5;
pub const DEFAULT_ELLIPSE_SIGMA: f64 = 2.0;

/// User-adjustable scatter styling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrelationStyle {
    pub regions: RegionPalette,
    pub colour_by_region: bool,
    pub dot_size: u8,
    pub ellipse_sigma: f64,
}

impl Default for CorrelationStyle {
    fn default() -> Self {
        Self {
            regions: RegionPalette::default(),
            colour_by_region: true,
            dot_size: DEFAULT_DOT_SIZE,
            ellipse_sigma: DEFAULT_ELLIPSE_SIGMA,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartAxis {
    pub title: String,
    pub year: Year,
    pub scale: AxisScale,
    /// Suggested bounds in data units; `None` without points.
    pub min: Option<f64>,
    pub max: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterPoint {
    pub id: EntityId,
    pub label: String,
    pub region: Option<String>,
    /// Data values.
    pub x: f64,
    pub y: f64,
    /// Plot-space coordinates after the axis transforms.
    pub position: Vec2,
    pub color: Rgb,
    pub radius: f64,
    pub emphasis: Emphasis,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionEllipse {
    pub region: String,
    pub color: Rgb,
    /// Plot space.
    pub ellipse: CovarianceEllipse,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationFrame {
    pub pairing: YearPairing,
    pub x_axis: ChartAxis,
    pub y_axis: ChartAxis,
    pub points: Vec<ScatterPoint>,
    pub ellipses: Vec<RegionEllipse>,
}

impl CorrelationFrame {
    pub fn point(&self, id: &str) -> Option<&ScatterPoint> {
        self.points.iter().find(|p| p.id.as_str() == id)
    }
}

/// One axis' dataset.
pub struct Series<'a> {
    pub name: &'a str,
    pub unit: &'a str,
    pub table: &'a RecordTable,
    pub mode: ScaleKind,
}

pub struct CorrelationInput<'a> {
    pub directory: &'a EntityDirectory,
    pub x: Series<'a>,
    pub y: Series<'a>,
    pub pairing: YearPairing,
    pub highlighted: Option<&'a EntityId>,
    pub style: &'a CorrelationStyle,
}

pub struct CorrelationView;

impl CorrelationView {
    pub fn render(input: &CorrelationInput<'_>) -> CorrelationFrame {
        let (year_x, year_y) = (input.pairing.year_a(), input.pairing.year_b());
        let x_scale = AxisScale::for_mode(input.x.mode);
        let y_scale = AxisScale::for_mode(input.y.mode);
        let style = input.style;

        let points: Vec<ScatterPoint> =
            CorrelationAnalysis::pair(input.x.table, year_x, input.y.table, year_y)
                .into_iter()
                .filter_map(|p| {
                    let region = input.directory.region(&p.id);
                    if !style.regions.is_active(region) {
                        return None;
                    }
                    let color = match (style.colour_by_region, region) {
                        (true, Some(r)) => style.regions.get(r).map_or(NEUTRAL_POINT, |s| s.color),
                        _ => NEUTRAL_POINT,
                    };
                    Some(ScatterPoint {
                        label: input.directory.label(&p.id).to_string(),
                        region: region.map(str::to_string),
                        position: Vec2::new(x_scale.position(p.x), y_scale.position(p.y)),
                        x: p.x,
                        y: p.y,
                        color,
                        radius: style.dot_size as f64,
                        emphasis: Emphasis::of(&p.id, input.highlighted),
                        id: p.id,
                    })
                })
                .collect();

        let ellipses = region_ellipses(&points, style);
        CorrelationFrame {
            pairing: input.pairing,
            x_axis: axis(&input.x, year_x, x_scale, points.iter().map(|p| p.x)),
            y_axis: axis(&input.y, year_y, y_scale, points.iter().map(|p| p.y)),
            points,
            ellipses,
        }
    }
}

fn axis(series: &Series<'_>, year: Year, scale: AxisScale, values: impl Iterator<Item = f64>) -> ChartAxis {
    let bounds = Statistics::min_max(values);
    let title = if series.unit.is_empty() {
        series.name.to_string()
    } else {
        format!("{} ({})", series.name, series.unit)
    };
    ChartAxis {
        title,
        year,
        scale,
        min: bounds.map(|(lo, _)| lo),
        max: bounds.map(|(_, hi)| hi),
    }
}

/// Palette order; regions with fewer than three points get no ellipse.
fn region_ellipses(points: &[ScatterPoint], style: &CorrelationStyle) -> Vec<RegionEllipse> {
    style
        .regions
        .0
        .iter()
        .filter(|r| r.active)
        .filter_map(|r| {
            let cloud: Vec<Vec2> = points
                .iter()
                .filter(|p| p.region.as_deref() == Some(r.name.as_str()))
                .map(|p| p.position)
                .collect();
            let ellipse = CorrelationAnalysis::ellipse(&cloud, style.ellipse_sigma)?;
            let color = if style.colour_by_region { r.color } else { NEUTRAL_POINT };
            Some(RegionEllipse {
                region: r.name.clone(),
                color,
                ellipse,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn directory() -> EntityDirectory {
        EntityDirectory::parse_json(
            r#"[{"id":"1","name":"A1","region":"Asia"},
                {"id":"2","name":"A2","region":"Asia"},
                {"id":"3","name":"A3","region":"Asia"},
                {"id":"4","name":"E1","region":"Europe"},
                {"id":"5","name":"X"}]"#,
        )
        .expect("dir")
    }

    fn tables() -> (RecordTable, RecordTable) {
        let x = RecordTable::parse_json(
            r#"[{"id":"1","2017":1},{"id":"2","2017":2},{"id":"3","2017":3},
                {"id":"4","2017":4},{"id":"5","2017":5}]"#,
        )
        .expect("x");
        let y = RecordTable::parse_json(
            r#"[{"id":"1","2019":10},{"id":"2","2019":30},{"id":"3","2019":20},
                {"id":"4","2019":null},{"id":"5","2019":50}]"#,
        )
        .expect("y");
        (x, y)
    }

    fn render(style: &CorrelationStyle, x_mode: ScaleKind) -> CorrelationFrame {
        let dir = directory();
        let (x, y) = tables();
        CorrelationView::render(&CorrelationInput {
            directory: &dir,
            x: Series {
                name: "Arable",
                unit: "%",
                table: &x,
                mode: x_mode,
            },
            y: Series {
                name: "Forest",
                unit: "",
                table: &y,
                mode: ScaleKind::Linear,
            },
            pairing: YearPairing::Latest {
                a: Year(2017),
                b: Year(2019),
            },
            highlighted: Some(&EntityId::new("2")),
            style,
        })
    }

    #[test]
    fn pairs_latest_years_and_colours_regions() {
        let frame = render(&CorrelationStyle::default(), ScaleKind::Linear);
        let ids: Vec<&str> = frame.points.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3", "5"]);
        assert_eq!(frame.point("1").map(|p| p.color.to_hex()), Some("#1BDE7E".into()));
        assert_eq!(frame.point("5").map(|p| p.color), Some(NEUTRAL_POINT));
        assert_eq!(frame.point("2").map(|p| p.emphasis), Some(Emphasis::Highlighted));
        assert_eq!(frame.x_axis.title, "Arable (%)");
        assert_eq!(frame.y_axis.title, "Forest");
        assert_eq!((frame.x_axis.min, frame.x_axis.max), (Some(1.0), Some(5.0)));
        assert_eq!(frame.y_axis.year, Year(2019));

        assert_eq!(frame.ellipses.len(), 1);
        let asia = &frame.ellipses[0];
        assert_eq!(asia.region, "Asia");
        assert!((asia.ellipse.center.x - 2.0).abs() < 1e-9);
        assert!((asia.ellipse.center.y - 20.0).abs() < 1e-9);
    }

    #[test]
    fn inactive_regions_and_plain_colouring() {
        let mut style = CorrelationStyle::default();
        style.colour_by_region = false;
        style.regions.get_mut("Asia").expect("asia").active = false;
        let frame = render(&style, ScaleKind::Linear);
        let ids: Vec<&str> = frame.points.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["5"]);
        assert!(frame.points.iter().all(|p| p.color == NEUTRAL_POINT));
        assert!(frame.ellipses.is_empty());
    }

    #[test]
    fn symlog_axis_moves_plot_positions() {
        let frame = render(&CorrelationStyle::default(), ScaleKind::Logarithmic);
        assert_eq!(frame.x_axis.scale, AxisScale::SymLog);
        let p = frame.point("3").expect("point");
        assert_eq!(p.x, 3.0);
        assert!((p.position.x - 0.3).abs() < 1e-12);
    }
}

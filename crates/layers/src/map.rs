use foundation::{EntityId, Year};
use formats::{EntityDirectory, RecordTable};
use serde::{Deserialize, Serialize};

use crate::scale::{ColorMapper, Fill};
use crate::symbology::Emphasis;
use crate::threshold::Legend;

/// Drawing surface size in pixels.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 960.0,
            height: 500.0,
        }
    }
}

/// Natural Earth projection parameters for the external geometry renderer.
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct Projection {
    pub scale: f64,
    pub translate: [f64; 2],
}

impl Projection {
    pub fn natural_earth(viewport: Viewport) -> Self {
        Self {
            scale: viewport.width / std::f64::consts::TAU,
            translate: [viewport.width / 2.0, viewport.height / 1.7],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapFeature {
    pub id: EntityId,
    pub label: String,
    pub value: Option<f64>,
    pub fill: Fill,
    pub emphasis: Emphasis,
    pub tooltip: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapFrame {
    pub projection: Projection,
    pub dataset: Option<String>,
    pub year: Option<Year>,
    pub features: Vec<MapFeature>,
    pub legend: Option<Legend>,
}

impl MapFrame {
    pub fn feature(&self, id: &str) -> Option<&MapFeature> {
        self.features.iter().find(|f| f.id.as_str() == id)
    }
}

/// Loaded data for the map. Absent while nothing is committed.
pub struct MapData<'a> {
    pub name: &'a str,
    pub unit: &'a str,
    pub table: &'a RecordTable,
    pub year: Year,
    pub mapper: &'a ColorMapper,
}

pub struct MapInput<'a> {
    pub directory: &'a EntityDirectory,
    pub data: Option<MapData<'a>>,
    pub highlighted: Option<&'a EntityId>,
    pub viewport: Viewport,
}

pub struct MapView;

impl MapView {
    /// One feature per directory entry, in directory order.
    pub fn render(input: &MapInput<'_>) -> MapFrame {
        let features = input
            .directory
            .entries()
            .iter()
            .map(|entry| {
                let value = input
                    .data
                    .as_ref()
                    .map_or(f64::NAN, |d| d.table.value(&entry.id, d.year));
                let fill = match &input.data {
                    Some(d) => d.mapper.color_for(value),
                    None => Fill::Unknown,
                };
                let unit = input.data.as_ref().map_or("", |d| d.unit);
                MapFeature {
                    id: entry.id.clone(),
                    label: entry.name.clone(),
                    value: (!value.is_nan()).then_some(value),
                    fill,
                    emphasis: Emphasis::of(&entry.id, input.highlighted),
                    tooltip: tooltip(&entry.name, value, unit),
                }
            })
            .collect();

        MapFrame {
            projection: Projection::natural_earth(input.viewport),
            dataset: input.data.as_ref().map(|d| d.name.to_string()),
            year: input.data.as_ref().map(|d| d.year),
            features,
            legend: input.data.as_ref().and_then(|d| d.mapper.legend()),
        }
    }
}

fn tooltip(name: &str, value: f64, unit: &str) -> String {
    if value.is_nan() {
        format!("{name}: unknown")
    } else {
        format!("{name}: {value}{unit}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scale::ScaleResolver;
    use catalog::{ColorScheme, ScaleKind, ScalingPolicy};
    use foundation::ValueRange;
    use pretty_assertions::assert_eq;

    fn directory() -> EntityDirectory {
        EntityDirectory::parse_json(
            r#"[{"id":"1","name":"Alpha","region":"Asia"},
                {"id":"5","name":"Five","region":"Europe"},
                {"id":"9","name":"Nine"}]"#,
        )
        .expect("directory")
    }

    #[test]
    fn missing_value_renders_unknown() {
        let dir = directory();
        let table =
            RecordTable::parse_json(r#"[{"id":"1","2020":10},{"id":"5","2020":"n/a"}]"#).expect("t");
        let mapper = ScaleResolver::resolve(
            &ScalingPolicy::new(ScaleKind::Linear, ColorScheme::Mono),
            ValueRange::new(0.0, 10.0),
            ScaleKind::Linear,
        )
        .expect("mapper");
        let frame = MapView::render(&MapInput {
            directory: &dir,
            data: Some(MapData {
                name: "Test",
                unit: "%",
                table: &table,
                year: Year(2020),
                mapper: &mapper,
            }),
            highlighted: Some(&EntityId::new("1")),
            viewport: Viewport::default(),
        });

        let five = frame.feature("5").expect("five");
        assert_eq!(five.fill, Fill::Unknown);
        assert_eq!(five.value, None);
        assert_eq!(five.tooltip, "Five: unknown");
        assert_eq!(five.emphasis, Emphasis::Dimmed);

        let one = frame.feature("1").expect("one");
        assert_eq!(one.fill.to_string(), "#FF8F02");
        assert_eq!(one.tooltip, "Alpha: 10%");
        assert_eq!(one.emphasis, Emphasis::Highlighted);

        assert_eq!(frame.feature("9").map(|f| f.fill), Some(Fill::Unknown));
        assert_eq!(frame.year, Some(Year(2020)));
    }

    #[test]
    fn renders_without_data() {
        let dir = directory();
        let frame = MapView::render(&MapInput {
            directory: &dir,
            data: None,
            highlighted: None,
            viewport: Viewport {
                width: 1700.0,
                height: 850.0,
            },
        });
        assert_eq!(frame.features.len(), 3);
        assert!(frame.features.iter().all(|f| f.fill == Fill::Unknown));
        let [tx, ty] = frame.projection.translate;
        assert_eq!(tx, 850.0);
        assert!((ty - 500.0).abs() < 1e-9);
        assert!((frame.projection.scale - 1700.0 / std::f64::consts::TAU).abs() < 1e-12);
        assert!(frame.legend.is_none());
    }
}

use catalog::{ColorScheme, THRESHOLD_BUCKETS};
use foundation::{EntityId, Rgb};
use serde::{Deserialize, Serialize};

const WHITE: Rgb = Rgb::new(0xFF, 0xFF, 0xFF);
const ORANGE: Rgb = Rgb::new(0xFF, 0x8F, 0x02);
const BLUE: Rgb = Rgb::new(0x10, 0x4D, 0xFF);

pub const MONO: [Rgb; 2] = [WHITE, ORANGE];
pub const DUO: [Rgb; 2] = [BLUE, ORANGE];

pub const THRESHOLD_MONO: [Rgb; THRESHOLD_BUCKETS] = [
    WHITE,
    Rgb::new(0xFF, 0xEC, 0xC2),
    Rgb::new(0xFF, 0xD9, 0x87),
    Rgb::new(0xFF, 0xC1, 0x3B),
    Rgb::new(0xFA, 0xAC, 0x00),
    ORANGE,
];

pub const THRESHOLD_DUO: [Rgb; THRESHOLD_BUCKETS] = [
    BLUE,
    Rgb::new(0x5F, 0x96, 0xFF),
    Rgb::new(0xC0, 0xD6, 0xFF),
    Rgb::new(0xFF, 0xEC, 0xC2),
    Rgb::new(0xFF, 0xC1, 0x3B),
    ORANGE,
];

/// Scatter color when region colouring is off.
pub const NEUTRAL_POINT: Rgb = Rgb::new(0x42, 0x87, 0xF5);

pub fn gradient_stops(scheme: ColorScheme) -> [Rgb; 2] {
    match scheme {
        ColorScheme::Mono => MONO,
        ColorScheme::Duo => DUO,
    }
}

/// Ascending bucket colors; the lowest bucket gets the first color.
pub fn threshold_schema(scheme: ColorScheme) -> [Rgb; THRESHOLD_BUCKETS] {
    match scheme {
        ColorScheme::Mono => THRESHOLD_MONO,
        ColorScheme::Duo => THRESHOLD_DUO,
    }
}

/// How an entity is drawn relative to the shared highlight.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Emphasis {
    Normal,
    Highlighted,
    Dimmed,
}

impl Emphasis {
    pub fn of(id: &EntityId, highlighted: Option<&EntityId>) -> Self {
        match highlighted {
            None => Emphasis::Normal,
            Some(h) if h == id => Emphasis::Highlighted,
            Some(_) => Emphasis::Dimmed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionStyle {
    pub name: String,
    pub color: Rgb,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

/// Per-region scatter colors and visibility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionPalette(pub Vec<RegionStyle>);

impl RegionPalette {
    pub fn get(&self, region: &str) -> Option<&RegionStyle> {
        self.0.iter().find(|r| r.name == region)
    }

    pub fn get_mut(&mut self, region: &str) -> Option<&mut RegionStyle> {
        self.0.iter_mut().find(|r| r.name == region)
    }

    /// Regions missing from the palette are shown.
    pub fn is_active(&self, region: Option<&str>) -> bool {
        region.and_then(|r| self.get(r)).is_none_or(|s| s.active)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|r| r.name.as_str())
    }
}

impl Default for RegionPalette {
    fn default() -> Self {
        let region = |name: &str, color: Rgb| RegionStyle {
            name: name.to_string(),
            color,
            active: true,
        };
        RegionPalette(vec![
            region("Africa", Rgb::new(0xFF, 0x39, 0x00)),
            region("Asia", Rgb::new(0x1B, 0xDE, 0x7E)),
            region("Europe", Rgb::new(0x36, 0x7D, 0xFF)),
            region("North America", Rgb::new(0xFB, 0xF5, 0x2A)),
            region("South America", Rgb::new(0xDE, 0x95, 0x1B)),
            region("Oceania", Rgb::new(0xD7, 0x01, 0xFF)),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schemas_match_hex_tables() {
        let mono: Vec<String> = THRESHOLD_MONO.iter().map(|c| c.to_hex()).collect();
        assert_eq!(
            mono,
            vec!["#FFFFFF", "#FFECC2", "#FFD987", "#FFC13B", "#FAAC00", "#FF8F02"]
        );
        assert_eq!(gradient_stops(ColorScheme::Duo)[0].to_hex(), "#104DFF");
        assert_eq!(threshold_schema(ColorScheme::Duo)[2].to_hex(), "#C0D6FF");
    }

    #[test]
    fn emphasis_follows_highlight() {
        let a = EntityId::new("a");
        let b = EntityId::new("b");
        assert_eq!(Emphasis::of(&a, None), Emphasis::Normal);
        assert_eq!(Emphasis::of(&a, Some(&a)), Emphasis::Highlighted);
        assert_eq!(Emphasis::of(&b, Some(&a)), Emphasis::Dimmed);
    }

    #[test]
    fn palette_lookup_and_visibility() {
        let mut p = RegionPalette::default();
        assert_eq!(p.get("Europe").map(|r| r.color.to_hex()), Some("#367DFF".into()));
        p.get_mut("Asia").expect("asia").active = false;
        assert!(!p.is_active(Some("Asia")));
        assert!(p.is_active(Some("Atlantis")));
        assert!(p.is_active(None));
    }
}

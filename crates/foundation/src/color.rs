use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// 8-bit sRGB color, written as `#RRGGBB`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Rgb(pub [u8; 3]);

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Rgb([r, g, b])
    }

    /// Accepts `#RRGGBB` or `RRGGBB`, case-insensitive.
    pub fn parse_hex(s: &str) -> Option<Self> {
        let s = s.trim();
        let s = s.strip_prefix('#').unwrap_or(s);
        if s.len() != 6 || !s.is_ascii() {
            return None;
        }
        let r = u8::from_str_radix(&s[0..2], 16).ok()?;
        let g = u8::from_str_radix(&s[2..4], 16).ok()?;
        let b = u8::from_str_radix(&s[4..6], 16).ok()?;
        Some(Rgb([r, g, b]))
    }

    pub fn to_hex(self) -> String {
        let [r, g, b] = self.0;
        format!("#{:02X}{:02X}{:02X}", r, g, b)
    }

    /// Per-channel interpolation; `t` is clamped to `[0, 1]`.
    pub fn lerp(self, other: Rgb, t: f64) -> Rgb {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let mut out = [0u8; 3];
        for (i, c) in out.iter_mut().enumerate() {
            let a = self.0[i] as f64;
            let b = other.0[i] as f64;
            *c = (a + (b - a) * t).round().clamp(0.0, 255.0) as u8;
        }
        Rgb(out)
    }
}

impl std::fmt::Display for Rgb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for Rgb {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Rgb {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Rgb::parse_hex(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid hex color: {s:?}")))
    }
}

#[cfg(test)]
mod tests {
    use super::Rgb;

    #[test]
    fn hex_round_trips_uppercase() {
        let c = Rgb::parse_hex("#ff8f02").expect("parse");
        assert_eq!(c, Rgb::new(0xFF, 0x8F, 0x02));
        assert_eq!(c.to_hex(), "#FF8F02");
        assert!(Rgb::parse_hex("#FFF").is_none());
        assert!(Rgb::parse_hex("zzzzzz").is_none());
    }

    #[test]
    fn lerp_midpoint_rounds_to_nearest() {
        let white = Rgb::new(0xFF, 0xFF, 0xFF);
        let orange = Rgb::new(0xFF, 0x8F, 0x02);
        assert_eq!(white.lerp(orange, 0.0), white);
        assert_eq!(white.lerp(orange, 1.0), orange);
        assert_eq!(white.lerp(orange, 0.5).to_hex(), "#FFC781");
    }

    #[test]
    fn serde_uses_hex_strings() {
        let json = serde_json::to_string(&Rgb::new(16, 77, 255)).unwrap();
        assert_eq!(json, "\"#104DFF\"");
        let back: Rgb = serde_json::from_str("\"#104dff\"").unwrap();
        assert_eq!(back, Rgb::new(16, 77, 255));
    }
}

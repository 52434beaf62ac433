use serde::{Deserialize, Serialize};

/// Number of buckets (and colors) in a threshold scale.
pub const THRESHOLD_BUCKETS: usize = 6;

/// How values are turned into colors.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScaleKind {
    Linear,
    Logarithmic,
    Threshold,
}

impl ScaleKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "linear" => Some(ScaleKind::Linear),
            "logarithmic" | "log" => Some(ScaleKind::Logarithmic),
            "threshold" => Some(ScaleKind::Threshold),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScaleKind::Linear => "Linear",
            ScaleKind::Logarithmic => "Logarithmic",
            ScaleKind::Threshold => "Threshold",
        }
    }
}

impl std::fmt::Display for ScaleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mono: white to accent. Duo: cold to warm.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColorScheme {
    Mono,
    Duo,
}

/// Where threshold breakpoints come from.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ThresholdSource {
    /// Evenly spaced over the dataset range.
    #[default]
    Even,
    /// Evenly spaced in symmetric-log space, rounded to integers.
    Logarithmic,
    /// Fixed breakpoints from the registry.
    Custom,
}

/// Declarative recipe for turning a dataset range into a color mapping.
///
/// `custom_thresholds` is ascending and always ends with the `+inf` sentinel
/// when `threshold_source` is `Custom`; it is empty otherwise.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScalingPolicy {
    pub kind: ScaleKind,
    pub color_scheme: ColorScheme,
    pub threshold_source: ThresholdSource,
    pub custom_thresholds: Vec<f64>,
}

impl ScalingPolicy {
    pub fn new(kind: ScaleKind, color_scheme: ColorScheme) -> Self {
        Self {
            kind,
            color_scheme,
            threshold_source: ThresholdSource::Even,
            custom_thresholds: Vec::new(),
        }
    }

    pub fn with_threshold_source(mut self, source: ThresholdSource) -> Self {
        self.threshold_source = source;
        self
    }

    /// Builds a `Custom` policy from finite breakpoints; the sentinel is appended.
    pub fn with_custom_thresholds(mut self, finite: &[f64]) -> Result<Self, String> {
        self.threshold_source = ThresholdSource::Custom;
        self.custom_thresholds = custom_thresholds_with_sentinel(finite)?;
        Ok(self)
    }
}

/// Registry form of a policy (schema version 2).
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct PolicyRecord {
    pub kind: ScaleKind,
    pub color_scheme: ColorScheme,
    #[serde(default)]
    pub threshold_source: ThresholdSource,
    #[serde(default)]
    pub custom_thresholds: Vec<f64>,
}

impl PolicyRecord {
    pub fn into_policy(self) -> Result<ScalingPolicy, String> {
        let base = ScalingPolicy::new(self.kind, self.color_scheme);
        match self.threshold_source {
            ThresholdSource::Custom => base.with_custom_thresholds(&self.custom_thresholds),
            source => {
                if !self.custom_thresholds.is_empty() {
                    return Err(format!(
                        "custom_thresholds given but threshold_source is {source:?}"
                    ));
                }
                Ok(base.with_threshold_source(source))
            }
        }
    }
}

/// Decodes the version-1 tuple encoding: `[kind, scheme?, threshold_source?]`.
///
/// Missing trailing elements default to `Mono` and an even threshold split.
pub(crate) fn policy_from_legacy_tuple(
    tuple: &[String],
    thresholds: &[f64],
) -> Result<ScalingPolicy, String> {
    let kind_raw = tuple.first().ok_or("empty scaling tuple")?;
    let kind = ScaleKind::parse(kind_raw).ok_or_else(|| format!("unknown scale {kind_raw:?}"))?;

    let color_scheme = match tuple.get(1).map(|s| s.as_str()) {
        None | Some("Mono") => ColorScheme::Mono,
        Some("Duo") => ColorScheme::Duo,
        Some(other) => return Err(format!("unknown color scheme {other:?}")),
    };

    let base = ScalingPolicy::new(kind, color_scheme);
    match tuple.get(2).map(|s| s.as_str()) {
        None | Some("None") | Some("Linear") => Ok(base),
        Some("Logarithmic") => Ok(base.with_threshold_source(ThresholdSource::Logarithmic)),
        Some("Custom") => base.with_custom_thresholds(thresholds),
        Some(other) => Err(format!("unknown threshold source {other:?}")),
    }
}

fn custom_thresholds_with_sentinel(finite: &[f64]) -> Result<Vec<f64>, String> {
    let finite: Vec<f64> = finite.iter().copied().filter(|v| *v != f64::INFINITY).collect();
    if finite.len() != THRESHOLD_BUCKETS - 1 {
        return Err(format!(
            "expected {} custom thresholds, got {}",
            THRESHOLD_BUCKETS - 1,
            finite.len()
        ));
    }
    if finite.iter().any(|v| !v.is_finite()) {
        return Err("custom thresholds must be finite".to_string());
    }
    if finite.windows(2).any(|w| w[0] >= w[1]) {
        return Err("custom thresholds must be strictly ascending".to_string());
    }
    let mut out = finite;
    out.push(f64::INFINITY);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tuple(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn custom_thresholds_get_sentinel() {
        let p = ScalingPolicy::new(ScaleKind::Threshold, ColorScheme::Mono)
            .with_custom_thresholds(&[5.0, 10.0, 20.0, 40.0, 80.0])
            .expect("valid");
        assert_eq!(p.custom_thresholds.len(), THRESHOLD_BUCKETS);
        assert_eq!(p.custom_thresholds.last(), Some(&f64::INFINITY));
    }

    #[test]
    fn custom_thresholds_reject_bad_shapes() {
        let base = ScalingPolicy::new(ScaleKind::Threshold, ColorScheme::Mono);
        assert!(base.clone().with_custom_thresholds(&[1.0, 2.0]).is_err());
        assert!(
            base.clone()
                .with_custom_thresholds(&[1.0, 3.0, 2.0, 4.0, 5.0])
                .is_err()
        );
        assert!(base.with_custom_thresholds(&[1.0, 2.0, 3.0, 4.0, f64::NAN]).is_err());
    }

    #[test]
    fn legacy_tuples_decode() {
        let p = policy_from_legacy_tuple(&tuple(&["Logarithmic"]), &[]).unwrap();
        assert_eq!(p, ScalingPolicy::new(ScaleKind::Logarithmic, ColorScheme::Mono));

        let p = policy_from_legacy_tuple(
            &tuple(&["Threshold", "Duo", "Custom"]),
            &[-5000.0, -1000.0, 0.0, 1000.0, 5000.0],
        )
        .unwrap();
        assert_eq!(p.color_scheme, ColorScheme::Duo);
        assert_eq!(p.threshold_source, ThresholdSource::Custom);

        assert!(policy_from_legacy_tuple(&tuple(&["Cubic"]), &[]).is_err());
        assert!(policy_from_legacy_tuple(&[], &[]).is_err());
    }

    #[test]
    fn scale_kind_parses_selector_values() {
        assert_eq!(ScaleKind::parse("Logarithmic"), Some(ScaleKind::Logarithmic));
        assert_eq!(ScaleKind::parse("threshold"), Some(ScaleKind::Threshold));
        assert_eq!(ScaleKind::parse("sqrt"), None);
    }
}

//! Bucketed color scales.

use catalog::{ScalingPolicy, THRESHOLD_BUCKETS, ThresholdSource};
use foundation::math::{inverse_sym_log, sym_log};
use foundation::{Rgb, ValueRange};
use serde::{Deserialize, Serialize};

use crate::scale::{Fill, ScaleError};
use crate::symbology::threshold_schema;

/// Index of the first breakpoint strictly greater than `value`, else the last bucket.
pub fn bucket_index(breakpoints: &[f64], value: f64) -> usize {
    let last = breakpoints.len().saturating_sub(1);
    breakpoints.iter().position(|b| *b > value).unwrap_or(last)
}

/// Upper bucket edges evenly spaced over `range`, closed by `+inf`.
pub fn even_breakpoints(range: ValueRange, buckets: usize) -> Vec<f64> {
    spaced_edges(range.low, range.high, buckets)
}

/// Upper bucket edges evenly spaced in symmetric-log space, rounded to integers.
pub fn log_breakpoints(range: ValueRange, buckets: usize) -> Vec<f64> {
    let mut edges = spaced_edges(sym_log(range.low), sym_log(range.high), buckets);
    for e in edges.iter_mut().filter(|e| e.is_finite()) {
        *e = inverse_sym_log(*e).round();
    }
    edges
}

fn spaced_edges(low: f64, high: f64, buckets: usize) -> Vec<f64> {
    if buckets == 0 {
        return Vec::new();
    }
    let step = (high - low) / buckets as f64;
    let mut edges: Vec<f64> = (0..buckets - 1)
        .map(|i| low + (i + 1) as f64 * step)
        .collect();
    edges.push(f64::INFINITY);
    edges
}

/// Breakpoints for a dataset, following its policy's threshold source.
pub fn policy_breakpoints(policy: &ScalingPolicy, range: ValueRange) -> Vec<f64> {
    match policy.threshold_source {
        ThresholdSource::Even => even_breakpoints(range, THRESHOLD_BUCKETS),
        ThresholdSource::Logarithmic => log_breakpoints(range, THRESHOLD_BUCKETS),
        ThresholdSource::Custom => policy.custom_thresholds.clone(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LegendEntry {
    /// Exclusive upper edge of the bucket; `+inf` for the last one.
    #[serde(with = "edge")]
    pub breakpoint: f64,
    pub color: Rgb,
}

/// JSON has no infinity: unbounded edges travel as `"Infinity"` / `"-Infinity"`.
mod edge {
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_finite() {
            serializer.serialize_f64(*value)
        } else if *value > 0.0 {
            serializer.serialize_str("Infinity")
        } else if *value < 0.0 {
            serializer.serialize_str("-Infinity")
        } else {
            serializer.serialize_str("NaN")
        }
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        match Raw::deserialize(deserializer)? {
            Raw::Number(v) => Ok(v),
            Raw::Text(s) => match s.as_str() {
                "Infinity" | "+Infinity" | "inf" => Ok(f64::INFINITY),
                "-Infinity" | "-inf" => Ok(f64::NEG_INFINITY),
                other => Err(de::Error::custom(format!("invalid breakpoint: {other:?}"))),
            },
        }
    }
}

/// Ordered buckets of a threshold scale, lowest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Legend {
    pub entries: Vec<LegendEntry>,
}

impl Legend {
    pub fn breakpoints(&self) -> Vec<f64> {
        self.entries.iter().map(|e| e.breakpoint).collect()
    }

    /// The same colors with new breakpoints. Lengths must match.
    pub fn with_breakpoints(&self, breakpoints: &[f64]) -> Result<Legend, ScaleError> {
        if breakpoints.len() != self.entries.len() {
            return Err(ScaleError::InvalidThresholds(format!(
                "expected {} breakpoints, got {}",
                self.entries.len(),
                breakpoints.len()
            )));
        }
        Ok(Legend {
            entries: self
                .entries
                .iter()
                .zip(breakpoints)
                .map(|(e, b)| LegendEntry {
                    breakpoint: *b,
                    color: e.color,
                })
                .collect(),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdScale {
    breakpoints: Vec<f64>,
    colors: Vec<Rgb>,
}

impl ThresholdScale {
    pub fn new(breakpoints: Vec<f64>, colors: Vec<Rgb>) -> Result<Self, ScaleError> {
        if breakpoints.is_empty() || breakpoints.len() != colors.len() {
            return Err(ScaleError::InvalidThresholds(format!(
                "{} breakpoints for {} colors",
                breakpoints.len(),
                colors.len()
            )));
        }
        if breakpoints.iter().any(|b| b.is_nan()) {
            return Err(ScaleError::InvalidThresholds("breakpoint is NaN".into()));
        }
        if breakpoints.windows(2).any(|w| w[0] > w[1]) {
            return Err(ScaleError::InvalidThresholds(
                "breakpoints must be ascending".into(),
            ));
        }
        Ok(Self {
            breakpoints,
            colors,
        })
    }

    pub fn for_policy(policy: &ScalingPolicy, range: ValueRange) -> Result<Self, ScaleError> {
        let colors = threshold_schema(policy.color_scheme).to_vec();
        Self::new(policy_breakpoints(policy, range), colors)
    }

    pub fn from_legend(legend: &Legend) -> Result<Self, ScaleError> {
        Self::new(
            legend.breakpoints(),
            legend.entries.iter().map(|e| e.color).collect(),
        )
    }

    pub fn breakpoints(&self) -> &[f64] {
        &self.breakpoints
    }

    pub fn bucket_index(&self, value: f64) -> usize {
        bucket_index(&self.breakpoints, value)
    }

    pub fn color_for(&self, value: f64) -> Fill {
        if value.is_nan() {
            return Fill::Unknown;
        }
        Fill::Color(self.colors[self.bucket_index(value)])
    }

    pub fn legend(&self) -> Legend {
        Legend {
            entries: self
                .breakpoints
                .iter()
                .zip(&self.colors)
                .map(|(b, c)| LegendEntry {
                    breakpoint: *b,
                    color: *c,
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbology::THRESHOLD_MONO;
    use catalog::{ColorScheme, ScaleKind};

    #[test]
    fn custom_threshold_buckets() {
        let scale = ThresholdScale::new(
            vec![5.0, 10.0, 20.0, 40.0, 80.0, f64::INFINITY],
            THRESHOLD_MONO.to_vec(),
        )
        .expect("scale");
        assert_eq!(scale.color_for(3.0), Fill::Color(THRESHOLD_MONO[0]));
        assert_eq!(scale.color_for(12.0), Fill::Color(THRESHOLD_MONO[2]));
        assert_eq!(scale.color_for(1000.0), Fill::Color(THRESHOLD_MONO[5]));
        assert_eq!(scale.color_for(5.0), Fill::Color(THRESHOLD_MONO[1]));
        assert_eq!(scale.color_for(f64::NAN), Fill::Unknown);
    }

    #[test]
    fn bucket_index_always_in_range() {
        let finite = [1.0, 2.0, 3.0];
        for v in [-1e300, -5.0, 0.0, 1.0, 2.5, 3.0, 9.0, 1e300] {
            let i = bucket_index(&finite, v);
            assert!(i < finite.len());
        }
        assert_eq!(bucket_index(&finite, 3.0), 2);
        assert_eq!(bucket_index(&finite, 1e9), 2);
    }

    #[test]
    fn even_edges_end_with_sentinel() {
        let edges = even_breakpoints(ValueRange::new(0.0, 60.0), 6);
        assert_eq!(edges, vec![10.0, 20.0, 30.0, 40.0, 50.0, f64::INFINITY]);
    }

    #[test]
    fn log_edges_are_rounded_and_ascending() {
        let edges = log_breakpoints(ValueRange::new(0.0, 1_000_000.0), 6);
        assert_eq!(edges, vec![10.0, 100.0, 1000.0, 10_000.0, 100_000.0, f64::INFINITY]);

        let edges = log_breakpoints(ValueRange::new(-100.0, 100.0), 6);
        assert!(edges.windows(2).all(|w| w[0] <= w[1]));
        assert!(edges[..5].iter().all(|e| e.fract() == 0.0));
    }

    #[test]
    fn policy_custom_source_is_verbatim() {
        let policy = ScalingPolicy::new(ScaleKind::Threshold, ColorScheme::Duo)
            .with_custom_thresholds(&[-5.0, 0.0, 5.0, 8.0, 10.0])
            .expect("policy");
        let scale = ThresholdScale::for_policy(&policy, ValueRange::new(-3.0, 7.0)).expect("scale");
        assert_eq!(scale.breakpoints(), &[-5.0, 0.0, 5.0, 8.0, 10.0, f64::INFINITY]);
        assert_eq!(scale.legend().entries.len(), THRESHOLD_BUCKETS);
    }

    #[test]
    fn rejects_unordered_edits() {
        let legend = ThresholdScale::new(vec![1.0, 2.0], vec![Rgb::new(0, 0, 0); 2])
            .expect("scale")
            .legend();
        assert!(legend.with_breakpoints(&[1.0]).is_err());
        let edited = legend.with_breakpoints(&[3.0, 2.0]).expect("same length");
        assert!(ThresholdScale::from_legend(&edited).is_err());
    }

    #[test]
    fn legend_json_keeps_open_upper_bucket() {
        let legend = ThresholdScale::new(
            vec![5.0, 10.0, 20.0, 40.0, 80.0, f64::INFINITY],
            THRESHOLD_MONO.to_vec(),
        )
        .expect("scale")
        .legend();
        let json = serde_json::to_string(&legend).expect("serialize");
        assert!(!json.contains("null"));
        assert!(json.contains(r#""breakpoint":"Infinity""#));

        let back: Legend = serde_json::from_str(&json).expect("deserialize");
        pretty_assertions::assert_eq!(back, legend);
        assert!(ThresholdScale::from_legend(&back).is_ok());
    }

    #[test]
    fn legend_json_rejects_unknown_edge_text() {
        let raw = r##"{"entries":[{"breakpoint":"lots","color":"#000000"}]}"##;
        assert!(serde_json::from_str::<Legend>(raw).is_err());
    }
}

use catalog::{ScaleKind, ScalingPolicy};
use foundation::{Rgb, ValueRange};
use serde::{Serialize, Serializer};

use crate::symbology::gradient_stops;
use crate::threshold::{Legend, ThresholdScale};

#[derive(Debug, Clone, PartialEq)]
pub enum ScaleError {
    /// A logarithmic domain needs `low > 0`.
    InvalidScaleDomain { low: f64 },
    InvalidThresholds(String),
}

impl std::fmt::Display for ScaleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScaleError::InvalidScaleDomain { low } => {
                write!(f, "logarithmic scale needs a positive domain, low is {low}")
            }
            ScaleError::InvalidThresholds(msg) => write!(f, "invalid thresholds: {msg}"),
        }
    }
}

impl std::error::Error for ScaleError {}

/// Resolved paint for one value. Missing data is [`Fill::Unknown`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Fill {
    Color(Rgb),
    Unknown,
}

impl std::fmt::Display for Fill {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Fill::Color(c) => write!(f, "{c}"),
            Fill::Unknown => f.write_str("unknown"),
        }
    }
}

impl Serialize for Fill {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Total map from values to fills for one dataset and mode.
#[derive(Debug, Clone, PartialEq)]
pub enum ColorMapper {
    Linear { range: ValueRange, stops: [Rgb; 2] },
    Logarithmic { range: ValueRange, stops: [Rgb; 2] },
    Threshold(ThresholdScale),
}

impl ColorMapper {
    pub fn kind(&self) -> ScaleKind {
        match self {
            ColorMapper::Linear { .. } => ScaleKind::Linear,
            ColorMapper::Logarithmic { .. } => ScaleKind::Logarithmic,
            ColorMapper::Threshold(_) => ScaleKind::Threshold,
        }
    }

    pub fn color_for(&self, value: f64) -> Fill {
        if value.is_nan() {
            return Fill::Unknown;
        }
        match self {
            ColorMapper::Linear { range, stops } => {
                Fill::Color(stops[0].lerp(stops[1], range.normalize(value)))
            }
            ColorMapper::Logarithmic { range, stops } => {
                Fill::Color(stops[0].lerp(stops[1], log_fraction(*range, value)))
            }
            ColorMapper::Threshold(scale) => scale.color_for(value),
        }
    }

    /// Bucket legend; only threshold scales have one.
    pub fn legend(&self) -> Option<Legend> {
        match self {
            ColorMapper::Threshold(scale) => Some(scale.legend()),
            _ => None,
        }
    }
}

/// Position of `value` on a `ln` domain. Non-positive values sit at the low stop.
fn log_fraction(range: ValueRange, value: f64) -> f64 {
    if range.is_degenerate() {
        return 0.5;
    }
    if value <= 0.0 {
        return 0.0;
    }
    let (lo, hi) = (range.low.ln(), range.high.ln());
    ((value.ln() - lo) / (hi - lo)).clamp(0.0, 1.0)
}

pub struct ScaleResolver;

impl ScaleResolver {
    pub fn resolve(
        policy: &ScalingPolicy,
        range: ValueRange,
        mode: ScaleKind,
    ) -> Result<ColorMapper, ScaleError> {
        let stops = gradient_stops(policy.color_scheme);
        match mode {
            ScaleKind::Linear => Ok(ColorMapper::Linear { range, stops }),
            ScaleKind::Logarithmic => {
                if !range.is_positive() {
                    return Err(ScaleError::InvalidScaleDomain { low: range.low });
                }
                Ok(ColorMapper::Logarithmic { range, stops })
            }
            ScaleKind::Threshold => Ok(ColorMapper::Threshold(ThresholdScale::for_policy(
                policy, range,
            )?)),
        }
    }

    /// Like [`ScaleResolver::resolve`], but a logarithmic request on a
    /// non-positive domain degrades to linear. Returns the effective mode.
    pub fn resolve_or_linear(
        policy: &ScalingPolicy,
        range: ValueRange,
        mode: ScaleKind,
    ) -> Result<(ColorMapper, ScaleKind), ScaleError> {
        match Self::resolve(policy, range, mode) {
            Ok(mapper) => Ok((mapper, mode)),
            Err(ScaleError::InvalidScaleDomain { .. }) => {
                let mapper = Self::resolve(policy, range, ScaleKind::Linear)?;
                Ok((mapper, ScaleKind::Linear))
            }
            Err(e) => Err(e),
        }
    }

    /// Fixed threshold scale from a user-edited legend.
    pub fn resolve_with_legend(legend: &Legend) -> Result<ColorMapper, ScaleError> {
        Ok(ColorMapper::Threshold(ThresholdScale::from_legend(legend)?))
    }
}

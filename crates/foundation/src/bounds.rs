use serde::{Deserialize, Serialize};

/// Closed numeric interval used as a scale domain.
///
/// Invariant: `low <= high`. Constructors swap inverted bounds.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    pub low: f64,
    pub high: f64,
}

impl ValueRange {
    pub fn new(a: f64, b: f64) -> Self {
        if a <= b {
            ValueRange { low: a, high: b }
        } else {
            ValueRange { low: b, high: a }
        }
    }

    /// `[0, 0]`, returned for empty or all-missing data.
    pub const fn degenerate() -> Self {
        ValueRange {
            low: 0.0,
            high: 0.0,
        }
    }

    pub fn span(&self) -> f64 {
        self.high - self.low
    }

    pub fn is_degenerate(&self) -> bool {
        self.span() == 0.0
    }

    /// A logarithmic domain needs a strictly positive lower bound.
    pub fn is_positive(&self) -> bool {
        self.low > 0.0
    }

    pub fn contains(&self, v: f64) -> bool {
        v >= self.low && v <= self.high
    }

    /// Fraction of the way from `low` to `high`, clamped to `[0, 1]`.
    ///
    /// A degenerate range maps every value to the midpoint.
    pub fn normalize(&self, v: f64) -> f64 {
        if self.is_degenerate() {
            return 0.5;
        }
        ((v - self.low) / self.span()).clamp(0.0, 1.0)
    }
}

impl Default for ValueRange {
    fn default() -> Self {
        Self::degenerate()
    }
}

#[cfg(test)]
mod tests {
    use super::ValueRange;

    #[test]
    fn new_swaps_inverted_bounds() {
        let r = ValueRange::new(10.0, -2.0);
        assert_eq!(r.low, -2.0);
        assert_eq!(r.high, 10.0);
    }

    #[test]
    fn normalize_clamps_and_handles_degenerate() {
        let r = ValueRange::new(0.0, 10.0);
        assert_eq!(r.normalize(5.0), 0.5);
        assert_eq!(r.normalize(-3.0), 0.0);
        assert_eq!(r.normalize(30.0), 1.0);
        assert_eq!(ValueRange::degenerate().normalize(7.0), 0.5);
    }
}

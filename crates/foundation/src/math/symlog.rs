//! Signed logarithm for values that may be negative, zero or small.
//!
//! The transform is linear on `[-10, 10]` (`v / 10`) and `±log10(|v|)`
//! outside of it. Both pieces meet at `|v| = 10` where they evaluate to `±1`,
//! so the mapping is continuous and strictly increasing.
//!
//! An earlier form applied `log10` directly without the linear zone; it yields
//! `-inf` at zero and is not provided here.

/// Magnitude below which the transform is linear.
pub const SYM_LOG_LINEAR_ZONE: f64 = 10.0;

pub fn sym_log(value: f64) -> f64 {
    if value == 0.0 {
        return 0.0;
    }
    if value.abs() <= SYM_LOG_LINEAR_ZONE {
        return value / SYM_LOG_LINEAR_ZONE;
    }
    if value < 0.0 {
        return -(-value).log10();
    }
    value.log10()
}

pub fn inverse_sym_log(exponent: f64) -> f64 {
    if exponent == 0.0 {
        return 0.0;
    }
    if exponent.abs() <= 1.0 {
        return exponent * SYM_LOG_LINEAR_ZONE;
    }
    if exponent < 0.0 {
        return -(10f64.powf(-exponent));
    }
    10f64.powf(exponent)
}

#[cfg(test)]
mod tests {
    use super::{inverse_sym_log, sym_log};

    fn assert_round_trip(v: f64) {
        let back = inverse_sym_log(sym_log(v));
        let tol = 1e-9 * v.abs().max(1.0);
        assert!((back - v).abs() <= tol, "v={v} back={back}");
    }

    #[test]
    fn round_trip_holds_across_branches() {
        for v in [
            0.0, 10.0, -10.0, 1e-12, -1e-12, 0.5, -3.25, 9.999, 10.0001, -10.0001, 42.0, -42.0,
            1e6, -1e6, 123_456.789,
        ] {
            assert_round_trip(v);
        }
        let mut v = -1e5;
        while v <= 1e5 {
            assert_round_trip(v);
            v += 997.3;
        }
    }

    #[test]
    fn boundary_is_continuous() {
        assert_eq!(sym_log(10.0), 1.0);
        assert_eq!(sym_log(-10.0), -1.0);
        assert!((sym_log(10.000_001) - 1.0).abs() < 1e-6);
        assert_eq!(sym_log(0.0), 0.0);
        assert!(sym_log(-1e-300).is_finite());
    }

    #[test]
    fn is_monotonic() {
        let samples = [-1e4, -100.0, -10.0, -1.0, 0.0, 1.0, 10.0, 100.0, 1e4];
        for w in samples.windows(2) {
            assert!(sym_log(w[0]) < sym_log(w[1]));
        }
    }
}

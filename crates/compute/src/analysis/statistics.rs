use foundation::ValueRange;
use formats::RecordTable;
use serde::{Deserialize, Serialize};

pub struct Statistics;

impl Statistics {
    pub fn mean(values: &[f64]) -> Option<f64> {
        if values.is_empty() {
            return None;
        }
        let mut sum = 0.0;
        for &v in values {
            sum += v;
        }
        Some(sum / values.len() as f64)
    }

    /// Population standard deviation around `mean`.
    pub fn std_dev(values: &[f64], mean: f64) -> Option<f64> {
        if values.is_empty() {
            return None;
        }
        let var = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / values.len() as f64;
        Some(var.sqrt())
    }

    /// Min and max of the finite values; `None` when there are none.
    pub fn min_max(values: impl IntoIterator<Item = f64>) -> Option<(f64, f64)> {
        let mut out: Option<(f64, f64)> = None;
        for v in values.into_iter().filter(|v| !v.is_nan()) {
            out = Some(match out {
                Some((min, max)) => (min.min(v), max.max(v)),
                None => (v, v),
            });
        }
        out
    }
}

/// How a dataset's color domain is derived from its values.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeStrategy {
    /// Mean of the per-year minima and mean of the per-year maxima.
    #[default]
    PerYearAveraged,
    /// Observed extremes clamped into mean +/- half-mean standard deviations.
    StdDevClamped,
}

#[derive(Copy, Clone, Debug, Default)]
pub struct RangeAnalyzer {
    strategy: RangeStrategy,
}

impl RangeAnalyzer {
    pub fn new(strategy: RangeStrategy) -> Self {
        Self { strategy }
    }

    pub fn strategy(&self) -> RangeStrategy {
        self.strategy
    }

    /// Missing values never take part. No data at all gives `[0, 0]`.
    pub fn range(&self, table: &RecordTable) -> ValueRange {
        let range = match self.strategy {
            RangeStrategy::PerYearAveraged => per_year_averaged(table),
            RangeStrategy::StdDevClamped => std_dev_clamped(table),
        };
        range.unwrap_or_default()
    }
}

fn per_year_averaged(table: &RecordTable) -> Option<ValueRange> {
    let mut mins = Vec::with_capacity(table.years().len());
    let mut maxs = Vec::with_capacity(table.years().len());
    for col in 0..table.years().len() {
        if let Some((min, max)) = Statistics::min_max(table.column(col)) {
            mins.push(min);
            maxs.push(max);
        }
    }
    let low = Statistics::mean(&mins)?;
    let high = Statistics::mean(&maxs)?;
    Some(ValueRange::new(low, high))
}

fn std_dev_clamped(table: &RecordTable) -> Option<ValueRange> {
    let values: Vec<f64> = table.cells().filter(|v| !v.is_nan()).collect();
    let (min, max) = Statistics::min_max(values.iter().copied())?;
    let mean = Statistics::mean(&values)?;
    let sigma = Statistics::std_dev(&values, mean)?;
    // A negative mean inverts the band; order it before clamping.
    let band = ValueRange::new(mean - 0.5 * mean * sigma, mean + 0.5 * mean * sigma);
    Some(ValueRange::new(min.max(band.low), max.min(band.high)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(json: &str) -> RecordTable {
        RecordTable::parse_json(json).expect("table")
    }

    #[test]
    fn mean_works() {
        let m = Statistics::mean(&[1.0, 2.0, 3.0]).expect("mean");
        assert!((m - 2.0).abs() < 1e-9);
    }

    #[test]
    fn per_year_average_of_extremes() {
        let t = table(
            r#"[{"id":"a","2000":0,"2001":10,"2002":null},
                {"id":"b","2000":4,"2001":30,"2002":"n/a"}]"#,
        );
        let r = RangeAnalyzer::default().range(&t);
        assert_eq!(r.low, 5.0);
        assert_eq!(r.high, 17.0);
    }

    #[test]
    fn std_dev_clamped_stays_within_extremes() {
        let t = table(r#"[{"id":"a","2000":2},{"id":"b","2000":4},{"id":"c","2000":6}]"#);
        let r = RangeAnalyzer::new(RangeStrategy::StdDevClamped).range(&t);
        // mean 4, sigma ~1.633, c = 2 -> [0.73, 7.27] clamped to [2, 6]
        assert_eq!(r.low, 2.0);
        assert_eq!(r.high, 6.0);

        let t = table(r#"[{"id":"a","2000":0},{"id":"b","2000":1},{"id":"c","2000":100}]"#);
        let r = RangeAnalyzer::new(RangeStrategy::StdDevClamped).range(&t);
        assert!(r.low <= r.high);
        assert!(r.low >= 0.0 && r.high <= 100.0);
    }

    #[test]
    fn negative_mean_orders_band_before_clamping() {
        // mean -6, sigma 4, c = -3 -> band [-18, 6], data stays [-10, -2]
        let t = table(r#"[{"id":"a","2000":-10},{"id":"b","2000":-2}]"#);
        let r = RangeAnalyzer::new(RangeStrategy::StdDevClamped).range(&t);
        assert_eq!(r, ValueRange::new(-10.0, -2.0));

        // mean -2, sigma sqrt(110), c = -1 -> band cuts the low tail only
        let t = table(
            r#"[{"id":"a","2000":-20},{"id":"b","2000":2},{"id":"c","2000":4},{"id":"d","2000":6}]"#,
        );
        let r = RangeAnalyzer::new(RangeStrategy::StdDevClamped).range(&t);
        assert!((r.low - (-2.0 - 110f64.sqrt())).abs() < 1e-9);
        assert_eq!(r.high, 6.0);
    }

    #[test]
    fn zero_mean_collapses_to_mean() {
        let t = table(r#"[{"id":"a","2000":-3},{"id":"b","2000":3}]"#);
        let r = RangeAnalyzer::new(RangeStrategy::StdDevClamped).range(&t);
        assert_eq!(r, ValueRange::new(0.0, 0.0));
    }

    #[test]
    fn empty_data_is_degenerate() {
        let t = table(r#"[{"id":"a","2000":null},{"id":"b","2000":"n/a"}]"#);
        for strategy in [RangeStrategy::PerYearAveraged, RangeStrategy::StdDevClamped] {
            assert_eq!(RangeAnalyzer::new(strategy).range(&t), ValueRange::new(0.0, 0.0));
        }
    }
}

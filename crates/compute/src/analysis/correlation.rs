use foundation::math::Vec2;
use foundation::{EntityId, Year};
use formats::RecordTable;
use serde::Serialize;

use super::Statistics;

/// An entity with a finite value in both datasets.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairedValue {
    pub id: EntityId,
    pub x: f64,
    pub y: f64,
}

/// Confidence ellipse of a point cloud, in the coordinates of its input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CovarianceEllipse {
    pub center: Vec2,
    /// Semi-axis along the principal eigenvector.
    pub major: f64,
    pub minor: f64,
    /// Rotation of the major axis from +x, radians.
    pub angle: f64,
}

pub const MIN_ELLIPSE_POINTS: usize = 3;

pub struct CorrelationAnalysis;

impl CorrelationAnalysis {
    /// Joins `a[year_a]` (x) with `b[year_b]` (y) by entity id, in `a`'s row order.
    pub fn pair(a: &RecordTable, year_a: Year, b: &RecordTable, year_b: Year) -> Vec<PairedValue> {
        let (Some(col_a), Some(col_b)) = (a.year_index(year_a), b.year_index(year_b)) else {
            return Vec::new();
        };
        a.rows()
            .iter()
            .filter_map(|row| {
                let x = row.values[col_a];
                let y = b.value(&row.id, b.years()[col_b]);
                (x.is_finite() && y.is_finite()).then(|| PairedValue {
                    id: row.id.clone(),
                    x,
                    y,
                })
            })
            .collect()
    }

    /// Sample covariance ellipse scaled to `sigma` standard deviations.
    ///
    /// `None` below [`MIN_ELLIPSE_POINTS`] points or for non-finite input.
    pub fn ellipse(points: &[Vec2], sigma: f64) -> Option<CovarianceEllipse> {
        if points.len() < MIN_ELLIPSE_POINTS || points.iter().any(|p| !p.is_finite()) {
            return None;
        }
        let xs: Vec<f64> = points.iter().map(|p| p.x).collect();
        let ys: Vec<f64> = points.iter().map(|p| p.y).collect();
        let center = Vec2::new(Statistics::mean(&xs)?, Statistics::mean(&ys)?);

        let n = (points.len() - 1) as f64;
        let (mut sxx, mut syy, mut sxy) = (0.0, 0.0, 0.0);
        for p in points {
            let d = *p - center;
            sxx += d.x * d.x;
            syy += d.y * d.y;
            sxy += d.x * d.y;
        }
        let (sxx, syy, sxy) = (sxx / n, syy / n, sxy / n);

        // Eigenvalues of the symmetric 2x2 matrix [[sxx, sxy], [sxy, syy]].
        let half_trace = 0.5 * (sxx + syy);
        let disc = (0.25 * (sxx - syy) * (sxx - syy) + sxy * sxy).sqrt();
        let l1 = (half_trace + disc).max(0.0);
        let l2 = (half_trace - disc).max(0.0);
        let angle = 0.5 * (2.0 * sxy).atan2(sxx - syy);

        Some(CovarianceEllipse {
            center,
            major: sigma * l1.sqrt(),
            minor: sigma * l2.sqrt(),
            angle,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn pairs_only_finite_values() {
        let a = RecordTable::parse_json(
            r#"[{"id":"1","2015":1},{"id":"2","2015":null},{"id":"3","2015":3}]"#,
        )
        .expect("a");
        let b = RecordTable::parse_json(
            r#"[{"id":"3","2019":30},{"id":"1","2019":10},{"id":"2","2019":20}]"#,
        )
        .expect("b");
        let pairs = CorrelationAnalysis::pair(&a, Year(2015), &b, Year(2019));
        let got: Vec<(&str, f64, f64)> = pairs.iter().map(|p| (p.id.as_str(), p.x, p.y)).collect();
        assert_eq!(got, vec![("1", 1.0, 10.0), ("3", 3.0, 30.0)]);
        assert!(CorrelationAnalysis::pair(&a, Year(1990), &b, Year(2019)).is_empty());
    }

    #[test]
    fn axis_aligned_ellipse() {
        let pts = [
            Vec2::new(-2.0, 0.0),
            Vec2::new(2.0, 0.0),
            Vec2::new(0.0, -1.0),
            Vec2::new(0.0, 1.0),
        ];
        let e = CorrelationAnalysis::ellipse(&pts, 2.0).expect("ellipse");
        // sxx = 8/3, syy = 2/3
        assert!(close(e.center.x, 0.0) && close(e.center.y, 0.0));
        assert!(close(e.major, 2.0 * (8.0f64 / 3.0).sqrt()));
        assert!(close(e.minor, 2.0 * (2.0f64 / 3.0).sqrt()));
        assert!(close(e.angle, 0.0));
    }

    #[test]
    fn diagonal_cloud_is_rotated() {
        let pts = [Vec2::new(0.0, 0.0), Vec2::new(1.0, 1.0), Vec2::new(2.0, 2.0)];
        let e = CorrelationAnalysis::ellipse(&pts, 1.0).expect("ellipse");
        assert!(close(e.angle, std::f64::consts::FRAC_PI_4));
        assert!(close(e.minor, 0.0));
    }

    #[test]
    fn too_few_points() {
        let pts = [Vec2::new(0.0, 0.0), Vec2::new(1.0, 1.0)];
        assert!(CorrelationAnalysis::ellipse(&pts, 2.0).is_none());
    }
}

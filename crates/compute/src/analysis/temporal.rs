use foundation::{Year, latest_year, shared_years};
use serde::Serialize;

/// Which columns of datasets A and B the correlation view pairs up.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum YearPairing {
    /// Both datasets have this year.
    Shared { year: Year },
    /// No overlap: each dataset's most recent year.
    Latest { a: Year, b: Year },
}

impl YearPairing {
    pub fn year_a(&self) -> Year {
        match *self {
            YearPairing::Shared { year } => year,
            YearPairing::Latest { a, .. } => a,
        }
    }

    pub fn year_b(&self) -> Year {
        match *self {
            YearPairing::Shared { year } => year,
            YearPairing::Latest { b, .. } => b,
        }
    }
}

pub struct TemporalAnalysis;

impl TemporalAnalysis {
    /// First shared year in `a`'s order, otherwise the latest of each.
    /// `None` only when one side declares no years at all.
    pub fn align(a: &[Year], b: &[Year]) -> Option<YearPairing> {
        if let Some(&year) = shared_years(a, b).first() {
            return Some(YearPairing::Shared { year });
        }
        Some(YearPairing::Latest {
            a: latest_year(a)?,
            b: latest_year(b)?,
        })
    }

    /// Pairing for an explicitly chosen year, which must be shared.
    pub fn pair_at(a: &[Year], b: &[Year], year: Year) -> Option<YearPairing> {
        (a.contains(&year) && b.contains(&year)).then_some(YearPairing::Shared { year })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_shared_year_in_primary_order() {
        let a = [Year(2019), Year(2015), Year(2017)];
        let b = [Year(2015), Year(2017)];
        assert_eq!(
            TemporalAnalysis::align(&a, &b),
            Some(YearPairing::Shared { year: Year(2015) })
        );
    }

    #[test]
    fn disjoint_years_pair_latest() {
        let a = [Year(2015), Year(2016), Year(2017)];
        let b = [Year(2018), Year(2019)];
        let p = TemporalAnalysis::align(&a, &b).expect("pairing");
        assert_eq!(p, YearPairing::Latest { a: Year(2017), b: Year(2019) });
        assert_eq!((p.year_a(), p.year_b()), (Year(2017), Year(2019)));
        assert_eq!(TemporalAnalysis::align(&a, &[]), None);
    }

    #[test]
    fn explicit_year_must_be_shared() {
        let a = [Year(2015), Year(2016)];
        let b = [Year(2016)];
        assert!(TemporalAnalysis::pair_at(&a, &b, Year(2016)).is_some());
        assert!(TemporalAnalysis::pair_at(&a, &b, Year(2015)).is_none());
    }
}

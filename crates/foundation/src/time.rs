use serde::{Deserialize, Serialize};

/// Calendar year of a dataset column.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Year(pub i32);

impl Year {
    /// Parses a column key such as `"2015"`.
    pub fn parse(key: &str) -> Option<Self> {
        key.trim().parse::<i32>().ok().map(Year)
    }
}

impl std::fmt::Display for Year {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Most recent year of a column set, regardless of column order.
pub fn latest_year(years: &[Year]) -> Option<Year> {
    years.iter().copied().max()
}

/// Years present in both sets, in the order of `a`.
pub fn shared_years(a: &[Year], b: &[Year]) -> Vec<Year> {
    a.iter().copied().filter(|y| b.contains(y)).collect()
}

#[cfg(test)]
mod tests {
    use super::{Year, latest_year, shared_years};

    #[test]
    fn parse_rejects_non_integer_keys() {
        assert_eq!(Year::parse("2015"), Some(Year(2015)));
        assert_eq!(Year::parse(" 1999 "), Some(Year(1999)));
        assert_eq!(Year::parse("id"), None);
        assert_eq!(Year::parse("2015.5"), None);
    }

    #[test]
    fn shared_keeps_first_order() {
        let a = [Year(2019), Year(2015), Year(2017)];
        let b = [Year(2015), Year(2019)];
        assert_eq!(shared_years(&a, &b), vec![Year(2019), Year(2015)]);
        assert_eq!(latest_year(&a), Some(Year(2019)));
        assert_eq!(latest_year(&[]), None);
    }
}

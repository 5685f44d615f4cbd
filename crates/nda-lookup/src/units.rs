//! Age unit inference from `participants.json`.

use std::fmt;

/// Unit of the participants `age` column, inferred from its declared `Units`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgeUnit {
    Years,
    Months,
    Weeks,
    /// Units could not be determined; ages are left unconverted.
    Unknown,
}

impl AgeUnit {
    /// Classifies a `Units` string: `y` means years, then `m` months, then `w` weeks.
    pub fn infer(units: &str) -> Self {
        let units = units.to_lowercase();
        if units.contains('y') {
            Self::Years
        } else if units.contains('m') {
            Self::Months
        } else if units.contains('w') {
            Self::Weeks
        } else {
            Self::Unknown
        }
    }

    /// Factor converting this unit to months.
    pub fn multiplier(self) -> f64 {
        match self {
            Self::Years => 12.0,
            Self::Months | Self::Unknown => 1.0,
            Self::Weeks => 0.25,
        }
    }

    pub fn to_months(self, age: f64) -> f64 {
        age * self.multiplier()
    }
}

impl fmt::Display for AgeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Years => "years",
            Self::Months => "months",
            Self::Weeks => "weeks",
            Self::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infers_declared_units() {
        assert_eq!(AgeUnit::infer("years"), AgeUnit::Years);
        assert_eq!(AgeUnit::infer("Y"), AgeUnit::Years);
        assert_eq!(AgeUnit::infer("months"), AgeUnit::Months);
        assert_eq!(AgeUnit::infer("weeks"), AgeUnit::Weeks);
        assert_eq!(AgeUnit::infer(""), AgeUnit::Unknown);
        assert_eq!(AgeUnit::infer("hours"), AgeUnit::Unknown);
    }

    #[test]
    fn days_contains_y_and_reads_as_years() {
        assert_eq!(AgeUnit::infer("days"), AgeUnit::Years);
    }

    #[test]
    fn converts_to_months() {
        assert!((AgeUnit::Years.to_months(21.5086) - 258.1032).abs() < 1e-9);
        assert_eq!(AgeUnit::Weeks.to_months(52.0), 13.0);
        assert_eq!(AgeUnit::Unknown.to_months(7.0), 7.0);
    }
}

//! `Period`: a signed number of [`TimeUnit`]s.

use crate::frequency::Frequency;
use ql_core::errors::{Error, Result};
use serde::{Deserialize, Serialize};

/// A unit of calendar time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeUnit {
    /// Calendar days.
    Days,
    /// Calendar weeks (7 days).
    Weeks,
    /// Calendar months.
    Months,
    /// Calendar years (12 months).
    Years,
}

/// A time span made up of an integer length and a [`TimeUnit`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Period {
    /// Number of units.
    pub length: i32,
    /// The unit of time.
    pub unit: TimeUnit,
}

impl Period {
    /// Create a new period.
    pub fn new(length: i32, unit: TimeUnit) -> Self {
        Self { length, unit }
    }

    /// The tenor of one period at `freq`.
    ///
    /// # Errors
    /// [`Error::InvalidFrequency`] for `NoFrequency` and `OtherFrequency`.
    pub fn from_frequency(freq: Frequency) -> Result<Self> {
        let (length, unit) = match freq {
            Frequency::NoFrequency | Frequency::OtherFrequency => {
                return Err(Error::InvalidFrequency(format!(
                    "{freq} has no associated tenor"
                )))
            }
            Frequency::Once => (0, TimeUnit::Years),
            Frequency::Annual => (1, TimeUnit::Years),
            Frequency::Semiannual => (6, TimeUnit::Months),
            Frequency::EveryFourthMonth => (4, TimeUnit::Months),
            Frequency::Quarterly => (3, TimeUnit::Months),
            Frequency::Bimonthly => (2, TimeUnit::Months),
            Frequency::Monthly => (1, TimeUnit::Months),
            Frequency::EveryFourthWeek => (4, TimeUnit::Weeks),
            Frequency::Biweekly => (2, TimeUnit::Weeks),
            Frequency::Weekly => (1, TimeUnit::Weeks),
            Frequency::Daily => (1, TimeUnit::Days),
        };
        Ok(Period::new(length, unit))
    }

    /// The frequency whose tenor is this period, or `OtherFrequency` when
    /// the period does not divide a year evenly.
    pub fn frequency(&self) -> Frequency {
        let length = self.length.abs();
        if length == 0 {
            return if self.unit == TimeUnit::Years {
                Frequency::Once
            } else {
                Frequency::NoFrequency
            };
        }
        match (self.unit, length) {
            (TimeUnit::Years, 1) => Frequency::Annual,
            (TimeUnit::Months, 12) => Frequency::Annual,
            (TimeUnit::Months, 6) => Frequency::Semiannual,
            (TimeUnit::Months, 4) => Frequency::EveryFourthMonth,
            (TimeUnit::Months, 3) => Frequency::Quarterly,
            (TimeUnit::Months, 2) => Frequency::Bimonthly,
            (TimeUnit::Months, 1) => Frequency::Monthly,
            (TimeUnit::Weeks, 4) => Frequency::EveryFourthWeek,
            (TimeUnit::Weeks, 2) => Frequency::Biweekly,
            (TimeUnit::Weeks, 1) => Frequency::Weekly,
            (TimeUnit::Days, 1) => Frequency::Daily,
            _ => Frequency::OtherFrequency,
        }
    }

    /// Length expressed in months, for month and year periods.
    pub fn months(&self) -> Option<i32> {
        match self.unit {
            TimeUnit::Months => Some(self.length),
            TimeUnit::Years => Some(self.length * 12),
            TimeUnit::Days | TimeUnit::Weeks => None,
        }
    }
}

impl std::ops::Neg for Period {
    type Output = Self;
    fn neg(self) -> Self {
        Period::new(-self.length, self.unit)
    }
}

impl std::ops::Mul<i32> for Period {
    type Output = Self;
    fn mul(self, rhs: i32) -> Self {
        Period::new(self.length * rhs, self.unit)
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let abbr = match self.unit {
            TimeUnit::Days => "D",
            TimeUnit::Weeks => "W",
            TimeUnit::Months => "M",
            TimeUnit::Years => "Y",
        };
        write!(f, "{}{abbr}", self.length)
    }
}

impl std::fmt::Debug for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Period({self})")
    }
}

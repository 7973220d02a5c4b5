//! `Frequency`: how often coupons or compounding events recur.

use serde::{Deserialize, Serialize};

/// Event / payment frequency.  The discriminant is the number of events per
/// year where that is meaningful.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Frequency {
    /// No events.
    NoFrequency = -1,
    /// Once, at maturity.
    Once = 0,
    /// Once per year.
    Annual = 1,
    /// Twice per year.
    Semiannual = 2,
    /// Every fourth month.
    EveryFourthMonth = 3,
    /// Four times per year.
    Quarterly = 4,
    /// Every second month.
    Bimonthly = 6,
    /// Twelve times per year.
    Monthly = 12,
    /// Every fourth week.
    EveryFourthWeek = 13,
    /// Every second week.
    Biweekly = 26,
    /// Every week.
    Weekly = 52,
    /// Every day.
    Daily = 365,
    /// Irregular or unknown.
    OtherFrequency = 999,
}

impl Frequency {
    /// Number of periods per year, `None` for `NoFrequency` and
    /// `OtherFrequency`.
    pub fn periods_per_year(&self) -> Option<u32> {
        match self {
            Frequency::NoFrequency | Frequency::OtherFrequency => None,
            other => Some(*other as i32 as u32),
        }
    }
}

impl std::fmt::Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Frequency::NoFrequency => "No-Frequency",
            Frequency::Once => "Once",
            Frequency::Annual => "Annual",
            Frequency::Semiannual => "Semiannual",
            Frequency::EveryFourthMonth => "Every-Fourth-Month",
            Frequency::Quarterly => "Quarterly",
            Frequency::Bimonthly => "Bimonthly",
            Frequency::Monthly => "Monthly",
            Frequency::EveryFourthWeek => "Every-Fourth-Week",
            Frequency::Biweekly => "Biweekly",
            Frequency::Weekly => "Weekly",
            Frequency::Daily => "Daily",
            Frequency::OtherFrequency => "Other-Frequency",
        };
        write!(f, "{s}")
    }
}

//! `TermStructure`: a reference date plus the day counter that turns dates
//! into times from it.

use ql_core::Time;
use ql_time::{Date, DayCounter};

/// Anything anchored at a reference date and measured in year fractions.
pub trait TermStructure: std::fmt::Debug + Send + Sync {
    /// The date at which the discount factor is one.
    fn reference_date(&self) -> Date;

    /// The day counter used for date to time conversions.
    fn day_counter(&self) -> DayCounter;

    /// Year fraction from the reference date to `date`.
    fn time_from_reference(&self, date: Date) -> Time {
        self.day_counter().year_fraction(self.reference_date(), date)
    }
}

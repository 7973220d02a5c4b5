//! `FlatForward`: a yield term structure with a constant rate.
//!
//! Discount factors come straight from the wrapped [`InterestRate`], so a
//! flat 5% annually compounded curve discounts as `(1.05)^-t` rather than
//! through a continuous equivalent.

use crate::term_structure::TermStructure;
use crate::yield_term_structure::YieldTermStructure;
use ql_core::errors::Result;
use ql_core::{Compounding, DiscountFactor, Rate, Time};
use ql_time::{Date, DayCounter, Frequency, InterestRate};

/// A flat yield term structure.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlatForward {
    reference_date: Date,
    rate: InterestRate,
}

impl FlatForward {
    /// Create a flat curve quoting `rate` under the given conventions; times
    /// are measured with `day_counter`.
    ///
    /// # Errors
    /// [`ql_core::Error::InvalidFrequency`] as for [`InterestRate::new`].
    pub fn new(
        reference_date: Date,
        rate: Rate,
        day_counter: DayCounter,
        compounding: Compounding,
        frequency: Frequency,
    ) -> Result<Self> {
        Ok(Self {
            reference_date,
            rate: InterestRate::new(rate, day_counter, compounding, frequency)?,
        })
    }

    /// Create a flat curve with continuous compounding.
    pub fn continuous(reference_date: Date, rate: Rate, day_counter: DayCounter) -> Self {
        Self {
            reference_date,
            rate: InterestRate::continuous(rate, day_counter),
        }
    }

    /// The quoted rate with its conventions.
    pub fn rate(&self) -> InterestRate {
        self.rate
    }
}

impl TermStructure for FlatForward {
    fn reference_date(&self) -> Date {
        self.reference_date
    }

    fn day_counter(&self) -> DayCounter {
        self.rate.day_counter()
    }
}

impl YieldTermStructure for FlatForward {
    fn discount_impl(&self, t: Time) -> DiscountFactor {
        let factor = self.rate.compound_factor(t.abs()).unwrap_or(1.0);
        if t < 0.0 {
            factor
        } else {
            1.0 / factor
        }
    }
}

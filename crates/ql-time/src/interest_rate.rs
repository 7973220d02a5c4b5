//! Interest rates with compounding and day-count conventions.
//!
//! An [`InterestRate`] bundles a rate value with a [`DayCounter`], a
//! [`Compounding`] rule and a [`Frequency`].  It converts between rates and
//! compound (or discount) factors over a time span or a pair of dates, and
//! between equivalent rates under different conventions.

use crate::date::Date;
use crate::day_counter::DayCounter;
use crate::frequency::Frequency;
use ql_core::errors::{Error, Result};
use ql_core::{ensure, Compounding, DiscountFactor, Rate, Real, Time};
use serde::{Deserialize, Serialize};

/// An interest rate with its conventions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InterestRate {
    rate: Rate,
    day_counter: DayCounter,
    compounding: Compounding,
    frequency: Frequency,
}

/// Periods per year as a real number, validated for `compounding`.
fn compounding_periods(compounding: Compounding, frequency: Frequency) -> Result<Real> {
    if !compounding.requires_frequency() {
        return Ok(frequency.periods_per_year().map_or(1.0, |f| f.max(1) as Real));
    }
    match frequency.periods_per_year() {
        Some(f) if f > 0 => Ok(f as Real),
        _ => Err(Error::InvalidFrequency(format!(
            "{compounding} compounding needs a regular frequency, got {frequency}"
        ))),
    }
}

impl InterestRate {
    /// Create a new interest rate.
    ///
    /// # Errors
    /// [`Error::InvalidFrequency`] when `compounding` needs periods per year
    /// and `frequency` has none (`NoFrequency`, `Once`, `OtherFrequency`).
    pub fn new(
        rate: Rate,
        day_counter: DayCounter,
        compounding: Compounding,
        frequency: Frequency,
    ) -> Result<Self> {
        compounding_periods(compounding, frequency)?;
        Ok(Self {
            rate,
            day_counter,
            compounding,
            frequency,
        })
    }

    /// A continuously compounded rate, which needs no frequency.
    pub fn continuous(rate: Rate, day_counter: DayCounter) -> Self {
        Self {
            rate,
            day_counter,
            compounding: Compounding::Continuous,
            frequency: Frequency::NoFrequency,
        }
    }

    /// The rate value.
    pub fn rate(&self) -> Rate {
        self.rate
    }

    /// The day counter.
    pub fn day_counter(&self) -> DayCounter {
        self.day_counter
    }

    /// The compounding rule.
    pub fn compounding(&self) -> Compounding {
        self.compounding
    }

    /// The compounding frequency.
    pub fn frequency(&self) -> Frequency {
        self.frequency
    }

    fn periods(&self) -> Real {
        // Validated at construction.
        compounding_periods(self.compounding, self.frequency).unwrap_or(1.0)
    }

    /// Growth factor over `t` years.
    pub fn compound_factor(&self, t: Time) -> Result<Real> {
        ensure!(t >= 0.0, "negative time ({t}) not allowed");
        let r = self.rate;
        let f = self.periods();
        let simple = || 1.0 + r * t;
        let compounded = || (1.0 + r / f).powf(f * t);
        Ok(match self.compounding {
            Compounding::Simple => simple(),
            Compounding::Compounded => compounded(),
            Compounding::Continuous => (r * t).exp(),
            Compounding::SimpleThenCompounded if t <= 1.0 / f => simple(),
            Compounding::SimpleThenCompounded => compounded(),
            Compounding::CompoundedThenSimple if t <= 1.0 / f => compounded(),
            Compounding::CompoundedThenSimple => simple(),
        })
    }

    /// Growth factor between two dates, measuring time with this rate's day
    /// counter.
    ///
    /// # Errors
    /// [`Error::InvalidDateOrder`] when `d2 < d1`.
    pub fn compound_factor_between(
        &self,
        d1: Date,
        d2: Date,
        ref_start: Option<Date>,
        ref_end: Option<Date>,
    ) -> Result<Real> {
        let t = self
            .day_counter
            .checked_year_fraction(d1, d2, ref_start, ref_end)?;
        self.compound_factor(t)
    }

    /// Discount factor over `t` years.
    pub fn discount_factor(&self, t: Time) -> Result<DiscountFactor> {
        Ok(1.0 / self.compound_factor(t)?)
    }

    /// Discount factor between two dates.
    pub fn discount_factor_between(
        &self,
        d1: Date,
        d2: Date,
        ref_start: Option<Date>,
        ref_end: Option<Date>,
    ) -> Result<DiscountFactor> {
        Ok(1.0 / self.compound_factor_between(d1, d2, ref_start, ref_end)?)
    }

    /// The rate that produces growth factor `compound` over `t` years.
    pub fn implied_rate(
        compound: Real,
        day_counter: DayCounter,
        compounding: Compounding,
        frequency: Frequency,
        t: Time,
    ) -> Result<Self> {
        ensure!(compound > 0.0, "positive compound factor required, got {compound}");
        let f = compounding_periods(compounding, frequency)?;
        let rate = if compound == 1.0 {
            ensure!(t >= 0.0, "non-negative time required, got {t}");
            0.0
        } else {
            ensure!(t > 0.0, "positive time required, got {t}");
            let simple = || (compound - 1.0) / t;
            let compounded = || (compound.powf(1.0 / (f * t)) - 1.0) * f;
            match compounding {
                Compounding::Simple => simple(),
                Compounding::Compounded => compounded(),
                Compounding::Continuous => compound.ln() / t,
                Compounding::SimpleThenCompounded if t <= 1.0 / f => simple(),
                Compounding::SimpleThenCompounded => compounded(),
                Compounding::CompoundedThenSimple if t <= 1.0 / f => compounded(),
                Compounding::CompoundedThenSimple => simple(),
            }
        };
        InterestRate::new(rate, day_counter, compounding, frequency)
    }

    /// The rate that produces growth factor `compound` between two dates.
    #[allow(clippy::too_many_arguments)]
    pub fn implied_rate_between(
        compound: Real,
        day_counter: DayCounter,
        compounding: Compounding,
        frequency: Frequency,
        d1: Date,
        d2: Date,
        ref_start: Option<Date>,
        ref_end: Option<Date>,
    ) -> Result<Self> {
        let t = day_counter.checked_year_fraction(d1, d2, ref_start, ref_end)?;
        Self::implied_rate(compound, day_counter, compounding, frequency, t)
    }

    /// The rate under other conventions that grows by the same factor over
    /// `t` years.
    pub fn equivalent_rate(
        &self,
        compounding: Compounding,
        frequency: Frequency,
        t: Time,
    ) -> Result<Self> {
        Self::implied_rate(
            self.compound_factor(t)?,
            self.day_counter,
            compounding,
            frequency,
            t,
        )
    }
}

impl std::fmt::Display for InterestRate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:.6}% {} {}",
            self.rate * 100.0,
            self.day_counter,
            self.compounding
        )?;
        if self.compounding.requires_frequency() {
            write!(f, " {}", self.frequency)?;
        }
        Ok(())
    }
}

//! `YieldTermStructure`: yield / interest-rate term structures.
//!
//! This module defines the `YieldTermStructure` trait together with the three
//! quantities any yield curve provides:
//!
//! * **discount factor**: `P(0,t)`
//! * **zero rate**: the rate, under given conventions, that grows to
//!   `1 / P(0,t)` over `t`
//! * **forward rate**: the instantaneous or discrete forward rate between two
//!   dates

use crate::term_structure::TermStructure;
use ql_core::errors::Result;
use ql_core::{Compounding, DiscountFactor, Rate, Real, RelinkableHandle, Time};
use ql_time::{Date, DayCounter, Frequency, InterestRate};

/// Small time step used for instantaneous forward rate computations.
const DT: Real = 1.0e-4;

/// A yield (interest-rate) term structure.
///
/// Implementors provide [`discount_impl`](YieldTermStructure::discount_impl);
/// the forward hook has a finite-difference default that curves with an
/// analytic forward override.
pub trait YieldTermStructure: TermStructure {
    // ── Low-level impl hooks ─────────────────────────────────────────────

    /// Return the discount factor for a given time `t`.
    fn discount_impl(&self, t: Time) -> DiscountFactor;

    /// Return the instantaneous forward rate at time `t`.
    ///
    /// Default: central difference of `-ln P`.
    fn forward_rate_impl(&self, t: Time) -> Rate {
        let t1 = (t - DT / 2.0).max(0.0);
        let t2 = t1 + DT;
        (self.discount_impl(t1).ln() - self.discount_impl(t2).ln()) / (t2 - t1)
    }

    // ── Public interface ─────────────────────────────────────────────────

    /// Discount factor for a time.
    fn discount(&self, t: Time) -> DiscountFactor {
        if t == 0.0 {
            return 1.0;
        }
        self.discount_impl(t)
    }

    /// Discount factor for a date.
    fn discount_date(&self, date: Date) -> DiscountFactor {
        self.discount(self.time_from_reference(date))
    }

    /// Zero rate between the reference date and `date`, expressed under the
    /// given conventions.
    ///
    /// At the reference date itself the instantaneous forward is used.
    fn zero_rate(
        &self,
        date: Date,
        day_counter: DayCounter,
        compounding: Compounding,
        frequency: Frequency,
    ) -> Result<InterestRate> {
        let t = day_counter.year_fraction(self.reference_date(), date);
        if t <= 0.0 {
            let compound = (self.forward_rate_impl(0.0) * DT).exp();
            return InterestRate::implied_rate(compound, day_counter, compounding, frequency, DT);
        }
        let compound = 1.0 / self.discount_date(date);
        InterestRate::implied_rate(compound, day_counter, compounding, frequency, t)
    }

    /// Forward rate between two dates, expressed under the given conventions.
    ///
    /// Equal dates give the instantaneous forward at that date.
    fn forward_rate(
        &self,
        d1: Date,
        d2: Date,
        day_counter: DayCounter,
        compounding: Compounding,
        frequency: Frequency,
    ) -> Result<InterestRate> {
        if d1 == d2 {
            let t = self.time_from_reference(d1);
            let compound = (self.forward_rate_impl(t) * DT).exp();
            return InterestRate::implied_rate(compound, day_counter, compounding, frequency, DT);
        }
        let t = day_counter.checked_year_fraction(d1, d2, None, None)?;
        let compound = self.discount_date(d1) / self.discount_date(d2);
        InterestRate::implied_rate(compound, day_counter, compounding, frequency, t)
    }
}

/// A relinkable handle on a yield curve, as held by engines and indexes.
pub type YieldCurveHandle = RelinkableHandle<dyn YieldTermStructure>;

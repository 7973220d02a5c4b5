//! `Coupon` trait: the accrual-period view shared by interest coupons.
//!
//! A coupon accrues interest over `[accrual_start, accrual_end]` and pays
//! on a payment date that may be adjusted away from the accrual end.  The
//! reference period differs from the accrual period only for irregular
//! (stub) coupons, where ActualActual(Bond) needs the notional full period.

use ql_core::errors::Result;
use ql_core::{Rate, Real, Time};
use ql_time::{Date, DayCounter, EvaluationContext, Schedule};
use std::fmt;

/// An interest-rate coupon.
pub trait Coupon: fmt::Debug {
    /// Payment date.
    fn payment_date(&self) -> Date;

    /// The notional the coupon accrues on.
    fn nominal(&self) -> Real;

    /// Start of the accrual period.
    fn accrual_start_date(&self) -> Date;

    /// End of the accrual period.
    fn accrual_end_date(&self) -> Date;

    /// Reference period start.
    fn reference_period_start(&self) -> Date {
        self.accrual_start_date()
    }

    /// Reference period end.
    fn reference_period_end(&self) -> Date {
        self.accrual_end_date()
    }

    /// The day counter used for accrual.
    fn day_counter(&self) -> DayCounter;

    /// The full accrual period as a year fraction.
    fn accrual_period(&self) -> Time {
        self.day_counter().year_fraction_with_reference(
            self.accrual_start_date(),
            self.accrual_end_date(),
            Some(self.reference_period_start()),
            Some(self.reference_period_end()),
        )
    }

    /// The annualized rate the coupon pays.
    fn rate(&self, ctx: &EvaluationContext) -> Result<Rate>;

    /// Year fraction accrued from the accrual start up to `date`; zero
    /// before the start and after payment.
    fn accrued_period(&self, date: Date) -> Time {
        if date <= self.accrual_start_date() || date > self.payment_date() {
            return 0.0;
        }
        let end = date.min(self.accrual_end_date());
        self.day_counter().year_fraction_with_reference(
            self.accrual_start_date(),
            end,
            Some(self.reference_period_start()),
            Some(self.reference_period_end()),
        )
    }

    /// Interest accrued up to `date`.
    fn accrued_amount(&self, ctx: &EvaluationContext, date: Date) -> Result<Real> {
        let tau = self.accrued_period(date);
        if tau == 0.0 {
            return Ok(0.0);
        }
        Ok(self.nominal() * self.rate(ctx)? * tau)
    }
}

/// Reference period for the `i`-th of `n` schedule periods.
///
/// An irregular first period is measured against the full tenor ending at
/// its end date, an irregular last period against the full tenor starting at
/// its start date.  Regular periods, and schedules without a tenor, use the
/// accrual dates themselves.
pub(crate) fn reference_period(
    schedule: &Schedule,
    i: usize,
    n: usize,
    start: Date,
    end: Date,
) -> Result<(Date, Date)> {
    let Some(tenor) = schedule.tenor() else {
        return Ok((start, end));
    };
    if i == 0 && !schedule.is_regular(i) {
        return Ok((end.shift(-tenor)?, end));
    }
    if i + 1 == n && !schedule.is_regular(i) {
        return Ok((start, start.shift(tenor)?));
    }
    Ok((start, end))
}

/// Value at position `i`, extending the last entry when `values` is short.
pub(crate) fn nth_or_last<T: Copy>(values: &[T], i: usize) -> Option<T> {
    values.get(i).or_else(|| values.last()).copied()
}

//! Fixed-rate coupons and leg builders.

use crate::cashflow::{CashFlow, Leg};
use crate::coupon::{nth_or_last, reference_period, Coupon};
use ql_core::errors::{Error, Result};
use ql_core::{ensure, Compounding, Rate, Real};
use ql_time::{
    BusinessDayConvention, Calendar, Date, DayCounter, EvaluationContext, Frequency,
    InterestRate, NullCalendar, Schedule,
};
use std::sync::Arc;

/// A coupon paying a fixed interest rate.
///
/// The amount is `nominal × (compound factor − 1)` over the accrual period,
/// which reduces to `nominal × rate × τ` for simple compounding.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedRateCoupon {
    payment_date: Date,
    nominal: Real,
    rate: InterestRate,
    accrual_start: Date,
    accrual_end: Date,
    ref_start: Date,
    ref_end: Date,
    amount: Real,
}

impl FixedRateCoupon {
    /// Create a new fixed-rate coupon.
    ///
    /// # Errors
    /// [`Error::InvalidDateOrder`] unless `accrual_start < accrual_end`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        payment_date: Date,
        nominal: Real,
        rate: InterestRate,
        accrual_start: Date,
        accrual_end: Date,
        ref_start: Date,
        ref_end: Date,
    ) -> Result<Self> {
        if accrual_end <= accrual_start {
            return Err(Error::InvalidDateOrder {
                start: accrual_start.to_string(),
                end: accrual_end.to_string(),
            });
        }
        let amount = nominal
            * (rate.compound_factor_between(
                accrual_start,
                accrual_end,
                Some(ref_start),
                Some(ref_end),
            )? - 1.0);
        Ok(Self {
            payment_date,
            nominal,
            rate,
            accrual_start,
            accrual_end,
            ref_start,
            ref_end,
            amount,
        })
    }

    /// The coupon's `InterestRate`.
    pub fn interest_rate(&self) -> &InterestRate {
        &self.rate
    }

    /// The amount paid.
    pub fn amount(&self) -> Real {
        self.amount
    }
}

impl Coupon for FixedRateCoupon {
    fn payment_date(&self) -> Date {
        self.payment_date
    }

    fn nominal(&self) -> Real {
        self.nominal
    }

    fn accrual_start_date(&self) -> Date {
        self.accrual_start
    }

    fn accrual_end_date(&self) -> Date {
        self.accrual_end
    }

    fn reference_period_start(&self) -> Date {
        self.ref_start
    }

    fn reference_period_end(&self) -> Date {
        self.ref_end
    }

    fn day_counter(&self) -> DayCounter {
        self.rate.day_counter()
    }

    fn rate(&self, _ctx: &EvaluationContext) -> Result<Rate> {
        Ok(self.rate.rate())
    }

    fn accrued_amount(&self, _ctx: &EvaluationContext, date: Date) -> Result<Real> {
        if date <= self.accrual_start || date > self.payment_date {
            return Ok(0.0);
        }
        let end = date.min(self.accrual_end);
        let factor = self.rate.compound_factor_between(
            self.accrual_start,
            end,
            Some(self.ref_start),
            Some(self.ref_end),
        )?;
        Ok(self.nominal * (factor - 1.0))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Fixed-rate leg builder
// ────────────────────────────────────────────────────────────────────────────

/// Build a fixed-rate leg from a schedule.
///
/// Notionals and rates are given per period; a short vector extends its
/// last value to the remaining periods.  Coupons pay at the accrual end
/// rolled with the payment convention on the payment calendar.
#[derive(Debug, Clone)]
pub struct FixedRateLeg<'a> {
    schedule: &'a Schedule,
    day_counter: DayCounter,
    notionals: Vec<Real>,
    coupon_rates: Vec<Rate>,
    compounding: Compounding,
    frequency: Frequency,
    payment_calendar: Arc<dyn Calendar>,
    payment_convention: BusinessDayConvention,
}

impl<'a> FixedRateLeg<'a> {
    /// Start a leg over `schedule` accruing with `day_counter`.
    pub fn new(schedule: &'a Schedule, day_counter: DayCounter) -> Self {
        Self {
            schedule,
            day_counter,
            notionals: Vec::new(),
            coupon_rates: Vec::new(),
            compounding: Compounding::Simple,
            frequency: Frequency::Annual,
            payment_calendar: Arc::new(NullCalendar),
            payment_convention: BusinessDayConvention::Unadjusted,
        }
    }

    /// A single notional for every period.
    pub fn with_notional(self, notional: Real) -> Self {
        self.with_notionals(vec![notional])
    }

    /// Notionals per period.
    pub fn with_notionals(mut self, notionals: Vec<Real>) -> Self {
        self.notionals = notionals;
        self
    }

    /// A single coupon rate for every period.
    pub fn with_coupon_rate(self, rate: Rate) -> Self {
        self.with_coupon_rates(vec![rate])
    }

    /// Coupon rates per period.
    pub fn with_coupon_rates(mut self, rates: Vec<Rate>) -> Self {
        self.coupon_rates = rates;
        self
    }

    /// Compounding of the coupon rate within each period.
    pub fn with_compounding(mut self, compounding: Compounding, frequency: Frequency) -> Self {
        self.compounding = compounding;
        self.frequency = frequency;
        self
    }

    /// Calendar used to roll payment dates.
    pub fn with_payment_calendar(mut self, calendar: Arc<dyn Calendar>) -> Self {
        self.payment_calendar = calendar;
        self
    }

    /// Convention used to roll payment dates.
    pub fn with_payment_adjustment(mut self, convention: BusinessDayConvention) -> Self {
        self.payment_convention = convention;
        self
    }

    /// Build the coupons.
    ///
    /// # Errors
    /// When notionals or rates are missing, or the rate conventions are
    /// invalid.
    pub fn build(self) -> Result<Leg> {
        ensure!(!self.notionals.is_empty(), "no notional given for fixed-rate leg");
        ensure!(!self.coupon_rates.is_empty(), "no coupon rate given for fixed-rate leg");
        let n = self.schedule.len().saturating_sub(1);
        let mut leg = Leg::with_capacity(n);
        for (i, (start, end)) in self.schedule.periods().enumerate() {
            let (ref_start, ref_end) = reference_period(self.schedule, i, n, start, end)?;
            let payment = self.payment_calendar.adjust(end, self.payment_convention)?;
            let nominal = nth_or_last(&self.notionals, i).unwrap_or_default();
            let rate = InterestRate::new(
                nth_or_last(&self.coupon_rates, i).unwrap_or_default(),
                self.day_counter,
                self.compounding,
                self.frequency,
            )?;
            leg.push(CashFlow::Fixed(FixedRateCoupon::new(
                payment, nominal, rate, start, end, ref_start, ref_end,
            )?));
        }
        Ok(leg)
    }
}

/// Notional outstanding at the start of each period of a level-payment
/// (French) amortization of `face` over `schedule`.
///
/// Interest accrues at `rate` each period and every period pays the same
/// total of interest plus principal, so the outstanding amount reaches
/// zero at the last date.
pub fn level_payment_notionals(
    schedule: &Schedule,
    rate: &InterestRate,
    face: Real,
) -> Result<Vec<Real>> {
    let factors = schedule
        .periods()
        .map(|(start, end)| rate.compound_factor_between(start, end, None, None))
        .collect::<Result<Vec<_>>>()?;
    ensure!(!factors.is_empty(), "amortization needs at least one period");

    let mut discount = 1.0;
    let mut annuity = 0.0;
    for f in &factors {
        discount /= f;
        annuity += discount;
    }
    ensure!(
        annuity > 0.0 && annuity.is_finite(),
        "degenerate annuity ({annuity}) for rate {rate}"
    );
    let payment = face / annuity;

    let mut outstanding = face;
    let mut notionals = Vec::with_capacity(factors.len());
    for f in factors {
        notionals.push(outstanding);
        outstanding = outstanding * f - payment;
    }
    Ok(notionals)
}

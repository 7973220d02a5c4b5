//! Rate helpers for yield-curve bootstrapping.
//!
//! A *rate helper* couples a market quote, read through a [`Handle`], with
//! the conventions needed to turn it into a discount-factor constraint at a
//! *pillar date*.  The bootstrapper varies the discount factor at each pillar
//! until the helper's [`quote_error`](RateHelper::quote_error) vanishes:
//!
//! * deposit: `(P(start) / P(pillar) − 1) / τ − quote`;
//! * swap: `float PV / fixed annuity − quote`, i.e. the par-rate gap;
//! * bond: `NPV × 100 / notional − (clean quote + accrued)` at settlement.
//!
//! Dates are fixed when a helper is constructed; quotes are read every time
//! the helper is evaluated, so a curve can be rebuilt after quotes move.

use ql_cashflows::cashflows;
use ql_core::errors::{Error, Result};
use ql_core::{ensure, Handle, Price, Rate, Real};
use ql_indexes::IborIndex;
use ql_instruments::{Bond, BondTerms};
use ql_quotes::Quote;
use ql_termstructures::{YieldCurveHandle, YieldTermStructure};
use ql_time::{
    BusinessDayConvention, Calendar, Date, DateGeneration, DayCounter, EvaluationContext,
    Frequency, Period, Schedule, ScheduleBuilder,
};
use std::sync::Arc;

/// Read a quote, failing with [`Error::IllsetQuote`] when the handle is empty
/// or the value is not finite.
fn read_quote(quote: &Handle<dyn Quote>, instrument: &str) -> Result<Real> {
    quote
        .get()
        .ok_or_else(|| Error::IllsetQuote {
            instrument: instrument.to_owned(),
            value: Real::NAN,
        })?
        .checked_value(instrument)
}

// ── RateHelper ────────────────────────────────────────────────────────────────

/// A market instrument constraining the curve at its pillar date.
#[derive(Debug, Clone)]
pub enum RateHelper {
    /// A money-market deposit.
    Deposit(DepositRateHelper),
    /// A par interest-rate swap.
    Swap(SwapRateHelper),
    /// A bond quoted at a clean price.
    Bond(BondHelper),
}

impl RateHelper {
    /// The date up to which this helper determines the curve.
    pub fn pillar_date(&self) -> Date {
        match self {
            RateHelper::Deposit(h) => h.maturity_date(),
            RateHelper::Swap(h) => h.maturity_date(),
            RateHelper::Bond(h) => h.bond().maturity_date(),
        }
    }

    /// The first date on which the helper needs a discount factor.
    pub fn earliest_date(&self) -> Date {
        match self {
            RateHelper::Deposit(h) => h.start_date(),
            RateHelper::Swap(h) => h.start_date(),
            RateHelper::Bond(h) => h.settlement_date(),
        }
    }

    /// A short description used in logs and errors.
    pub fn description(&self) -> &str {
        match self {
            RateHelper::Deposit(h) => &h.description,
            RateHelper::Swap(h) => &h.description,
            RateHelper::Bond(h) => h.bond.description(),
        }
    }

    /// The current market quote.
    ///
    /// # Errors
    /// [`Error::IllsetQuote`] if the quote is missing, not finite, or outside
    /// the domain the instrument admits.
    pub fn quote(&self) -> Result<Real> {
        match self {
            RateHelper::Deposit(h) => h.quote(),
            RateHelper::Swap(h) => h.quote(),
            RateHelper::Bond(h) => h.quote(),
        }
    }

    /// The quote implied by `curve`.
    pub fn implied_quote(&self, curve: &dyn YieldTermStructure) -> Result<Real> {
        match self {
            RateHelper::Deposit(h) => h.implied_quote(curve),
            RateHelper::Swap(h) => h.implied_quote(curve),
            RateHelper::Bond(h) => h.implied_quote(curve),
        }
    }

    /// Implied minus market quote; zero on a curve that reprices the helper.
    pub fn quote_error(&self, curve: &dyn YieldTermStructure) -> Result<Real> {
        Ok(self.implied_quote(curve)? - self.quote()?)
    }
}

impl From<DepositRateHelper> for RateHelper {
    fn from(h: DepositRateHelper) -> Self {
        RateHelper::Deposit(h)
    }
}

impl From<SwapRateHelper> for RateHelper {
    fn from(h: SwapRateHelper) -> Self {
        RateHelper::Swap(h)
    }
}

impl From<BondHelper> for RateHelper {
    fn from(h: BondHelper) -> Self {
        RateHelper::Bond(h)
    }
}

// ── DepositRateHelper ─────────────────────────────────────────────────────────

/// A deposit (money-market) rate helper.
///
/// The deposit starts `fixing_days` business days after the evaluation date
/// and matures one tenor later; its quote is the simple rate over that
/// period.
#[derive(Debug, Clone)]
pub struct DepositRateHelper {
    quote: Handle<dyn Quote>,
    start_date: Date,
    maturity_date: Date,
    day_counter: DayCounter,
    description: String,
}

impl DepositRateHelper {
    /// Create a deposit helper from market conventions.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        quote: Handle<dyn Quote>,
        tenor: Period,
        fixing_days: u32,
        calendar: &dyn Calendar,
        convention: BusinessDayConvention,
        end_of_month: bool,
        day_counter: DayCounter,
        ctx: &EvaluationContext,
    ) -> Result<Self> {
        let today = ctx.evaluation_date()?;
        let start_date = calendar.advance_business_days(today, fixing_days as i32)?;
        let maturity_date = calendar.advance(start_date, tenor, convention, end_of_month)?;
        if maturity_date <= start_date {
            return Err(Error::InvalidDateOrder {
                start: start_date.to_string(),
                end: maturity_date.to_string(),
            });
        }
        Ok(Self {
            quote,
            start_date,
            maturity_date,
            day_counter,
            description: format!("{tenor} deposit"),
        })
    }

    /// Create a deposit helper with the conventions of `index`.
    pub fn from_index(
        quote: Handle<dyn Quote>,
        index: &IborIndex,
        ctx: &EvaluationContext,
    ) -> Result<Self> {
        Self::new(
            quote,
            index.tenor(),
            index.fixing_days(),
            index.fixing_calendar(),
            index.business_day_convention(),
            index.end_of_month(),
            index.day_counter(),
            ctx,
        )
    }

    /// Value date of the deposit.
    pub fn start_date(&self) -> Date {
        self.start_date
    }

    /// Maturity of the deposit; the helper's pillar.
    pub fn maturity_date(&self) -> Date {
        self.maturity_date
    }

    fn accrual(&self) -> Real {
        self.day_counter
            .year_fraction(self.start_date, self.maturity_date)
    }

    /// The quoted rate.  The discount base `1 + r·τ` must be positive.
    pub fn quote(&self) -> Result<Rate> {
        let rate = read_quote(&self.quote, &self.description)?;
        if 1.0 + rate * self.accrual() <= 0.0 {
            return Err(Error::IllsetQuote {
                instrument: self.description.clone(),
                value: rate,
            });
        }
        Ok(rate)
    }

    /// Simple forward rate over the deposit period on `curve`.
    pub fn implied_quote(&self, curve: &dyn YieldTermStructure) -> Result<Rate> {
        let tau = self.accrual();
        ensure!(tau > 0.0, "{}: empty accrual period", self.description);
        Ok((curve.discount_date(self.start_date) / curve.discount_date(self.maturity_date) - 1.0)
            / tau)
    }
}

// ── SwapRateHelper ────────────────────────────────────────────────────────────

/// A par-swap rate helper: fixed leg against an Ibor leg.
///
/// The floating leg is projected off the forecast handle when one is linked
/// and off the curve being bootstrapped otherwise; both legs are discounted
/// on the curve being bootstrapped.
#[derive(Debug, Clone)]
pub struct SwapRateHelper {
    quote: Handle<dyn Quote>,
    start_date: Date,
    maturity_date: Date,
    fixed_periods: Vec<(Date, Date)>,
    fixed_day_counter: DayCounter,
    float_periods: Vec<(Date, Date)>,
    index: Arc<IborIndex>,
    forecast: YieldCurveHandle,
    description: String,
}

impl SwapRateHelper {
    /// Create a swap helper.
    ///
    /// The swap starts at spot (the index's fixing days after the evaluation
    /// date) moved by `forward_start`, and runs for `tenor`.  Both legs are
    /// generated backward from the maturity.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        quote: Handle<dyn Quote>,
        tenor: Period,
        calendar: &dyn Calendar,
        fixed_frequency: Frequency,
        fixed_convention: BusinessDayConvention,
        fixed_day_counter: DayCounter,
        index: Arc<IborIndex>,
        forward_start: Period,
        ctx: &EvaluationContext,
    ) -> Result<Self> {
        let today = ctx.evaluation_date()?;
        let spot = calendar.advance_business_days(today, index.fixing_days() as i32)?;
        let start = calendar.advance(
            spot,
            forward_start,
            index.business_day_convention(),
            false,
        )?;
        let end = start.shift(tenor)?;

        let fixed = ScheduleBuilder::new(start, end, Period::from_frequency(fixed_frequency)?, calendar)
            .with_convention(fixed_convention)
            .with_termination_convention(fixed_convention)
            .with_rule(DateGeneration::Backward)
            .build()?;
        let float = ScheduleBuilder::new(start, end, index.tenor(), calendar)
            .with_convention(index.business_day_convention())
            .with_termination_convention(index.business_day_convention())
            .with_rule(DateGeneration::Backward)
            .build()?;

        let periods = |s: &Schedule| s.periods().collect::<Vec<_>>();
        Ok(Self {
            quote,
            start_date: fixed.start_date().min(float.start_date()),
            maturity_date: fixed.end_date().max(float.end_date()),
            fixed_periods: periods(&fixed),
            fixed_day_counter,
            float_periods: periods(&float),
            description: format!("{tenor} swap vs {}", index.name()),
            index,
            forecast: YieldCurveHandle::null(),
        })
    }

    /// Project the floating leg off `forecast` instead of the curve being
    /// bootstrapped.
    pub fn with_forecast_curve(mut self, forecast: YieldCurveHandle) -> Self {
        self.forecast = forecast;
        self
    }

    /// First accrual date.
    pub fn start_date(&self) -> Date {
        self.start_date
    }

    /// Last payment date; the helper's pillar.
    pub fn maturity_date(&self) -> Date {
        self.maturity_date
    }

    /// The quoted par rate.
    pub fn quote(&self) -> Result<Rate> {
        read_quote(&self.quote, &self.description)
    }

    /// Fixed-leg PV of one unit of rate.
    fn annuity(&self, curve: &dyn YieldTermStructure) -> Real {
        self.fixed_periods
            .iter()
            .map(|&(s, e)| self.fixed_day_counter.year_fraction(s, e) * curve.discount_date(e))
            .sum()
    }

    fn floating_leg_pv(&self, curve: &dyn YieldTermStructure) -> Real {
        let forecast = self.forecast.current();
        let projection: &dyn YieldTermStructure = match &forecast {
            Some(f) => &**f,
            None => curve,
        };
        let dc = self.index.day_counter();
        self.float_periods
            .iter()
            .map(|&(s, e)| {
                IborIndex::simple_forward(projection, dc, s, e)
                    * dc.year_fraction(s, e)
                    * curve.discount_date(e)
            })
            .sum()
    }

    /// Par swap rate on `curve`.
    pub fn implied_quote(&self, curve: &dyn YieldTermStructure) -> Result<Rate> {
        let annuity = self.annuity(curve);
        ensure!(
            annuity > 0.0 && annuity.is_finite(),
            "{}: degenerate fixed-leg annuity {annuity}",
            self.description
        );
        Ok(self.floating_leg_pv(curve) / annuity)
    }
}

// ── BondHelper ────────────────────────────────────────────────────────────────

/// A bond quoted at a clean price per 100 of notional.
#[derive(Debug, Clone)]
pub struct BondHelper {
    quote: Handle<dyn Quote>,
    bond: Bond,
    ctx: EvaluationContext,
    settlement_date: Date,
}

impl BondHelper {
    /// Create a helper for `bond` settling as of `ctx`.
    pub fn new(quote: Handle<dyn Quote>, bond: Bond, ctx: &EvaluationContext) -> Result<Self> {
        let settlement_date = bond.settlement_date(ctx)?;
        Ok(Self {
            quote,
            bond,
            ctx: *ctx,
            settlement_date,
        })
    }

    /// Create a helper for a fixed-rate bullet bond.
    pub fn fixed_rate(
        quote: Handle<dyn Quote>,
        terms: BondTerms,
        schedule: &Schedule,
        coupons: &[Rate],
        day_counter: DayCounter,
        ctx: &EvaluationContext,
    ) -> Result<Self> {
        let bond = Bond::fixed_rate(terms, schedule, coupons, day_counter)?;
        Self::new(quote, bond, ctx)
    }

    /// The underlying bond.
    pub fn bond(&self) -> &Bond {
        &self.bond
    }

    /// Settlement date the quote refers to.
    pub fn settlement_date(&self) -> Date {
        self.settlement_date
    }

    /// The quoted clean price; must be positive.
    pub fn quote(&self) -> Result<Price> {
        let price = read_quote(&self.quote, self.bond.description())?;
        if price <= 0.0 {
            return Err(Error::IllsetQuote {
                instrument: self.bond.description().to_owned(),
                value: price,
            });
        }
        Ok(price)
    }

    /// Clean price implied by `curve` at settlement.
    pub fn implied_quote(&self, curve: &dyn YieldTermStructure) -> Result<Price> {
        let notional = self.bond.outstanding_notional(&self.ctx, self.settlement_date);
        ensure!(
            notional > 0.0,
            "{}: nothing outstanding at {}",
            self.bond.description(),
            self.settlement_date
        );
        let npv = cashflows::npv(self.bond.cashflows(), curve, &self.ctx, self.settlement_date)?;
        let accrued = self
            .bond
            .accrued_amount(&self.ctx, Some(self.settlement_date))?;
        Ok(npv * 100.0 / notional - accrued)
    }
}

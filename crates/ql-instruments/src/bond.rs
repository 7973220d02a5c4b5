//! Bonds: zero-coupon, fixed-rate, amortizing, and floating-rate.
//!
//! A [`Bond`] owns its cash flows (coupons plus redemptions) and delegates
//! curve-based valuation to an attached [`PricingEngine`].  Prices are
//! quoted per 100 of the notional outstanding at settlement; yields are
//! flat rates reproducing the dirty price at settlement.
//!
//! Engine results are cached per (engine version, index market versions,
//! evaluation date, settlement-flow flag), so relinking the engine's curve
//! handle or an index forecast handle, adding fixings, or moving the
//! evaluation date invalidates them on the next read.

use crate::instrument::{Instrument, PricingEngine, PricingResults};
use ql_cashflows::cashflows;
use ql_cashflows::{
    level_payment_notionals, CashFlow, FixedRateLeg, FloatingRateLeg, Leg, Redemption,
    YieldSolverConfig,
};
use ql_core::errors::{Error, Result};
use ql_core::{ensure, Compounding, LazyCache, Rate, Real, Spread};
use ql_indexes::IborIndex;
use ql_time::{
    BusinessDayConvention, Calendar, Date, DayCounter, EvaluationContext, Frequency,
    InterestRate, Schedule,
};
use std::sync::Arc;

/// Cache stamp: engine version, forecast and fixing versions of every index
/// the coupons fix on, evaluation date, settlement-flow flag.
type Stamp = (u64, Vec<(u64, u64)>, Date, bool);

// ────────────────────────────────────────────────────────────────────────────
// Construction terms
// ────────────────────────────────────────────────────────────────────────────

/// Settlement and redemption terms shared by every bond.
#[derive(Debug, Clone)]
pub struct BondTerms {
    /// Business days from trade to settlement.
    pub settlement_days: u32,
    /// Calendar for settlement and payment dates.
    pub calendar: Arc<dyn Calendar>,
    /// Face amount.
    pub face_amount: Real,
    /// Redemption as a percentage of the notional repaid.
    pub redemption: Real,
    /// Roll convention for payment dates.
    pub payment_convention: BusinessDayConvention,
    /// Issue date; settlement never precedes it.
    pub issue_date: Option<Date>,
}

impl BondTerms {
    /// Terms redeeming at par with `Following` payments and no issue date.
    pub fn new(settlement_days: u32, calendar: Arc<dyn Calendar>, face_amount: Real) -> Self {
        Self {
            settlement_days,
            calendar,
            face_amount,
            redemption: 100.0,
            payment_convention: BusinessDayConvention::Following,
            issue_date: None,
        }
    }

    /// Redemption per 100 of notional.
    pub fn with_redemption(mut self, redemption: Real) -> Self {
        self.redemption = redemption;
        self
    }

    /// Payment-date roll convention.
    pub fn with_payment_convention(mut self, convention: BusinessDayConvention) -> Self {
        self.payment_convention = convention;
        self
    }

    /// Issue date.
    pub fn with_issue_date(mut self, issue_date: Date) -> Self {
        self.issue_date = Some(issue_date);
        self
    }
}

/// Coupon terms of a floating-rate bond.  Per-period vectors extend their
/// last value.
#[derive(Debug, Clone, PartialEq)]
pub struct FloatingCouponTerms {
    /// Accrual day counter.
    pub day_counter: DayCounter,
    /// Fixing days; the index's when `None`.
    pub fixing_days: Option<u32>,
    /// Gearings.
    pub gearings: Vec<Real>,
    /// Spreads.
    pub spreads: Vec<Spread>,
    /// Caps; none when empty.
    pub caps: Vec<Rate>,
    /// Floors; none when empty.
    pub floors: Vec<Rate>,
    /// Fix at the end of each accrual period.
    pub in_arrears: bool,
}

impl FloatingCouponTerms {
    /// Plain index coupons accruing with `day_counter`.
    pub fn new(day_counter: DayCounter) -> Self {
        Self {
            day_counter,
            fixing_days: None,
            gearings: vec![1.0],
            spreads: vec![0.0],
            caps: Vec::new(),
            floors: Vec::new(),
            in_arrears: false,
        }
    }

    /// A single spread for every coupon.
    pub fn with_spread(mut self, spread: Spread) -> Self {
        self.spreads = vec![spread];
        self
    }

    /// Fixing days.
    pub fn with_fixing_days(mut self, fixing_days: u32) -> Self {
        self.fixing_days = Some(fixing_days);
        self
    }

    /// Fix in arrears.
    pub fn in_arrears(mut self, in_arrears: bool) -> Self {
        self.in_arrears = in_arrears;
        self
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Bond
// ────────────────────────────────────────────────────────────────────────────

/// A bond: coupons and redemptions plus settlement conventions.
#[derive(Debug, Clone)]
pub struct Bond {
    description: String,
    settlement_days: u32,
    calendar: Arc<dyn Calendar>,
    issue_date: Option<Date>,
    maturity_date: Date,
    cashflows: Leg,
    /// Each payment date with the notional of the period it pays.
    notional_schedule: Vec<(Date, Real)>,
    engine: Option<Arc<dyn PricingEngine<Bond>>>,
    yield_solver: YieldSolverConfig,
    cache: LazyCache<Stamp, PricingResults>,
}

impl Bond {
    /// A bond paying `face × redemption / 100` at `maturity`.
    pub fn zero_coupon(terms: BondTerms, maturity: Date) -> Result<Self> {
        let payment = terms.calendar.adjust(maturity, terms.payment_convention)?;
        let flows = vec![CashFlow::Redemption(Redemption::new(
            terms.face_amount * terms.redemption / 100.0,
            payment,
        ))];
        let description = format!("zero-coupon bond {maturity}");
        let notionals = vec![(payment, terms.face_amount)];
        Self::assemble(terms, flows, notionals, description)
    }

    /// A bullet bond paying fixed coupons over `schedule`.
    pub fn fixed_rate(
        terms: BondTerms,
        schedule: &Schedule,
        coupons: &[Rate],
        day_counter: DayCounter,
    ) -> Result<Self> {
        ensure!(!coupons.is_empty(), "fixed-rate bond needs at least one coupon rate");
        let leg = FixedRateLeg::new(schedule, day_counter)
            .with_notional(terms.face_amount)
            .with_coupon_rates(coupons.to_vec())
            .with_payment_calendar(Arc::clone(&terms.calendar))
            .with_payment_adjustment(terms.payment_convention)
            .build()?;
        let description = format!(
            "fixed-rate bond {:.4}% {}",
            coupons[0] * 100.0,
            schedule.end_date()
        );
        Self::from_coupons(terms, leg, description)
    }

    /// A fixed-rate bond amortizing by level payments: every period pays the
    /// same total of interest plus principal.
    pub fn amortizing_fixed_rate(
        terms: BondTerms,
        schedule: &Schedule,
        coupon: Rate,
        day_counter: DayCounter,
    ) -> Result<Self> {
        let rate = InterestRate::new(coupon, day_counter, Compounding::Simple, Frequency::Annual)?;
        let notionals = level_payment_notionals(schedule, &rate, terms.face_amount)?;
        let leg = FixedRateLeg::new(schedule, day_counter)
            .with_notionals(notionals)
            .with_coupon_rate(coupon)
            .with_payment_calendar(Arc::clone(&terms.calendar))
            .with_payment_adjustment(terms.payment_convention)
            .build()?;
        let description = format!(
            "amortizing bond {:.4}% {}",
            coupon * 100.0,
            schedule.end_date()
        );
        Self::from_coupons(terms, leg, description)
    }

    /// A bond paying Ibor coupons over `schedule`.
    pub fn floating_rate(
        terms: BondTerms,
        schedule: &Schedule,
        index: Arc<IborIndex>,
        coupon_terms: FloatingCouponTerms,
    ) -> Result<Self> {
        let description = format!("{} floater {}", index.name(), schedule.end_date());
        let mut builder = FloatingRateLeg::new(schedule, index)
            .with_notional(terms.face_amount)
            .with_day_counter(coupon_terms.day_counter)
            .with_gearings(coupon_terms.gearings)
            .with_spreads(coupon_terms.spreads)
            .with_caps(coupon_terms.caps)
            .with_floors(coupon_terms.floors)
            .in_arrears(coupon_terms.in_arrears)
            .with_payment_calendar(Arc::clone(&terms.calendar))
            .with_payment_adjustment(terms.payment_convention);
        if let Some(days) = coupon_terms.fixing_days {
            builder = builder.with_fixing_days(days);
        }
        Self::from_coupons(terms, builder.build()?, description)
    }

    /// A bond from an arbitrary coupon leg.  Every decrease of the coupon
    /// notional repays the difference on that coupon's payment date, and
    /// the last notional is repaid with the last coupon.
    pub fn from_coupons(terms: BondTerms, coupons: Leg, description: String) -> Result<Self> {
        let nominals: Vec<(Date, Real)> = coupons
            .iter()
            .filter_map(|cf| cf.coupon().map(|c| (cf.date(), c.nominal())))
            .collect();
        ensure!(!nominals.is_empty(), "{description}: no coupons given");

        let mut flows = Leg::with_capacity(coupons.len() + 1);
        let mut next_nominals = nominals.iter().skip(1).map(|&(_, n)| n);
        for cf in coupons {
            let step = cf.coupon().map(|c| c.nominal());
            let date = cf.date();
            flows.push(cf);
            if let Some(nominal) = step {
                let next = next_nominals.next().unwrap_or(0.0);
                if nominal > next {
                    flows.push(CashFlow::Redemption(Redemption::new(
                        (nominal - next) * terms.redemption / 100.0,
                        date,
                    )));
                }
            }
        }
        Self::assemble(terms, flows, nominals, description)
    }

    fn assemble(
        terms: BondTerms,
        mut flows: Leg,
        notional_schedule: Vec<(Date, Real)>,
        description: String,
    ) -> Result<Self> {
        // Stable: a coupon stays ahead of the redemption paid with it.
        flows.sort_by_key(CashFlow::date);
        let maturity_date = cashflows::maturity_date(&flows)
            .ok_or_else(|| Error::InvalidArgument(format!("{description}: no cash flows")))?;
        if let Some(issue) = terms.issue_date {
            if issue >= maturity_date {
                return Err(Error::InvalidDateOrder {
                    start: issue.to_string(),
                    end: maturity_date.to_string(),
                });
            }
        }
        tracing::debug!(
            bond = %description,
            flows = flows.len(),
            maturity = %maturity_date,
            "bond constructed"
        );
        Ok(Self {
            description,
            settlement_days: terms.settlement_days,
            calendar: terms.calendar,
            issue_date: terms.issue_date,
            maturity_date,
            cashflows: flows,
            notional_schedule,
            engine: None,
            yield_solver: YieldSolverConfig::default(),
            cache: LazyCache::new(),
        })
    }

    /// Attach the engine that prices this bond.
    pub fn with_pricing_engine(mut self, engine: Arc<dyn PricingEngine<Bond>>) -> Self {
        self.set_pricing_engine(engine);
        self
    }

    /// Replace the pricing engine, dropping cached results.
    pub fn set_pricing_engine(&mut self, engine: Arc<dyn PricingEngine<Bond>>) {
        self.engine = Some(engine);
        self.cache.invalidate();
    }

    /// Solver settings for yield calculations.
    pub fn with_yield_solver(mut self, config: YieldSolverConfig) -> Self {
        self.yield_solver = config;
        self
    }

    /// Replace the description used in logs and errors.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    // ── Inspectors ───────────────────────────────────────────────────────

    /// Human-readable description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Business days from trade to settlement.
    pub fn settlement_days(&self) -> u32 {
        self.settlement_days
    }

    /// Settlement calendar.
    pub fn calendar(&self) -> &dyn Calendar {
        &*self.calendar
    }

    /// Issue date, if given.
    pub fn issue_date(&self) -> Option<Date> {
        self.issue_date
    }

    /// Date of the last payment.
    pub fn maturity_date(&self) -> Date {
        self.maturity_date
    }

    /// All cash flows, ordered by payment date.
    pub fn cashflows(&self) -> &Leg {
        &self.cashflows
    }

    /// The redemption flows.
    pub fn redemptions(&self) -> impl Iterator<Item = &CashFlow> + '_ {
        self.cashflows.iter().filter(|cf| cf.is_redemption())
    }

    /// Notional outstanding at `date`: the notional of the first period
    /// paying after it.  On a payment date this is the notional left once
    /// that payment is made; zero from maturity on.
    pub fn notional(&self, date: Date) -> Real {
        self.notional_schedule
            .iter()
            .find(|&&(d, _)| d > date)
            .map_or(0.0, |&(_, n)| n)
    }

    /// Notional the remaining flows at `date` are paid on.  Matches
    /// [`notional`](Self::notional) unless the context counts flows paid on
    /// `date` as outstanding, in which case that period's notional is used.
    pub fn outstanding_notional(&self, ctx: &EvaluationContext, date: Date) -> Real {
        if !ctx.include_settlement_date_flows() {
            return self.notional(date);
        }
        self.notional_schedule
            .iter()
            .find(|&&(d, _)| d >= date)
            .map_or(0.0, |&(_, n)| n)
    }

    /// The settlement date for a trade on `date`.
    pub fn settlement_date_for(&self, date: Date) -> Result<Date> {
        let settlement = self
            .calendar
            .advance_business_days(date, self.settlement_days as i32)?;
        Ok(self.issue_date.map_or(settlement, |issue| issue.max(settlement)))
    }

    /// The settlement date for a trade on the evaluation date.
    pub fn settlement_date(&self, ctx: &EvaluationContext) -> Result<Date> {
        self.settlement_date_for(ctx.evaluation_date()?)
    }

    fn settlement_or_default(&self, ctx: &EvaluationContext, settlement: Option<Date>) -> Result<Date> {
        match settlement {
            Some(date) => Ok(date),
            None => self.settlement_date(ctx),
        }
    }

    // ── Engine-based valuation ───────────────────────────────────────────

    fn index_versions(&self) -> Vec<(u64, u64)> {
        let mut versions: Vec<(u64, u64)> = self
            .cashflows
            .iter()
            .filter_map(|cf| match cf {
                CashFlow::Floating(c) => Some(c.index().market_version()),
                _ => None,
            })
            .collect();
        versions.dedup();
        versions
    }

    fn results(&self, ctx: &EvaluationContext) -> Result<PricingResults> {
        let engine = self
            .engine
            .as_ref()
            .ok_or_else(|| Error::NoPricingCurve(self.description.clone()))?;
        let stamp = (
            engine.version(),
            self.index_versions(),
            ctx.evaluation_date()?,
            ctx.include_settlement_date_flows(),
        );
        self.cache
            .get_or_try_compute(&stamp, || engine.calculate(self, ctx))
    }

    /// Present value at settlement of the flows still to be paid.
    ///
    /// # Errors
    /// [`Error::NoPricingCurve`] without an engine or with an engine whose
    /// curve handle is empty.
    pub fn npv(&self, ctx: &EvaluationContext) -> Result<Real> {
        Ok(self.results(ctx)?.npv)
    }

    /// Dirty price per 100 of the notional outstanding at settlement.
    pub fn dirty_price(&self, ctx: &EvaluationContext) -> Result<Real> {
        let settlement = self.settlement_date(ctx)?;
        let notional = self.outstanding_notional(ctx, settlement);
        if notional == 0.0 {
            return Ok(0.0);
        }
        Ok(self.npv(ctx)? * 100.0 / notional)
    }

    /// Clean price: dirty price less accrued interest.
    pub fn clean_price(&self, ctx: &EvaluationContext) -> Result<Real> {
        Ok(self.dirty_price(ctx)? - self.accrued_amount(ctx, None)?)
    }

    // ── Coupon queries ───────────────────────────────────────────────────

    /// Accrued interest per 100 of notional at `settlement` (the bond's
    /// settlement date when `None`).
    pub fn accrued_amount(&self, ctx: &EvaluationContext, settlement: Option<Date>) -> Result<Real> {
        let settlement = self.settlement_or_default(ctx, settlement)?;
        let notional = self.outstanding_notional(ctx, settlement);
        if notional == 0.0 {
            return Ok(0.0);
        }
        Ok(cashflows::accrued_amount(&self.cashflows, ctx, settlement)? * 100.0 / notional)
    }

    /// Rate of the coupon last paid before settlement.
    pub fn previous_coupon_rate(
        &self,
        ctx: &EvaluationContext,
        settlement: Option<Date>,
    ) -> Result<Option<Rate>> {
        let settlement = self.settlement_or_default(ctx, settlement)?;
        cashflows::previous_coupon_rate(&self.cashflows, ctx, settlement)
    }

    /// Rate of the coupon paid next after settlement.
    pub fn next_coupon_rate(
        &self,
        ctx: &EvaluationContext,
        settlement: Option<Date>,
    ) -> Result<Option<Rate>> {
        let settlement = self.settlement_or_default(ctx, settlement)?;
        cashflows::next_coupon_rate(&self.cashflows, ctx, settlement)
    }

    // ── Yield-based valuation ────────────────────────────────────────────

    /// Dirty price per 100 at the flat yield `y`.
    pub fn dirty_price_from_yield(
        &self,
        ctx: &EvaluationContext,
        y: Rate,
        day_counter: DayCounter,
        compounding: Compounding,
        frequency: Frequency,
        settlement: Option<Date>,
    ) -> Result<Real> {
        let settlement = self.settlement_or_default(ctx, settlement)?;
        let notional = self.outstanding_notional(ctx, settlement);
        if notional == 0.0 {
            return Ok(0.0);
        }
        let rate = InterestRate::new(y, day_counter, compounding, frequency)?;
        Ok(cashflows::npv_from_yield(&self.cashflows, &rate, ctx, settlement)? * 100.0 / notional)
    }

    /// Clean price per 100 at the flat yield `y`.
    pub fn clean_price_from_yield(
        &self,
        ctx: &EvaluationContext,
        y: Rate,
        day_counter: DayCounter,
        compounding: Compounding,
        frequency: Frequency,
        settlement: Option<Date>,
    ) -> Result<Real> {
        let settlement = self.settlement_or_default(ctx, settlement)?;
        let dirty = self.dirty_price_from_yield(
            ctx,
            y,
            day_counter,
            compounding,
            frequency,
            Some(settlement),
        )?;
        Ok(dirty - self.accrued_amount(ctx, Some(settlement))?)
    }

    /// The flat yield reproducing the clean price `clean`.
    ///
    /// # Errors
    /// [`Error::YieldSolverNonConvergence`] naming this bond, the target
    /// dirty price, and the rate bracket.
    pub fn yield_from_clean_price(
        &self,
        ctx: &EvaluationContext,
        clean: Real,
        day_counter: DayCounter,
        compounding: Compounding,
        frequency: Frequency,
        settlement: Option<Date>,
    ) -> Result<Rate> {
        let settlement = self.settlement_or_default(ctx, settlement)?;
        let notional = self.outstanding_notional(ctx, settlement);
        ensure!(notional > 0.0, "{}: no notional outstanding at {settlement}", self.description);
        let dirty = clean + self.accrued_amount(ctx, Some(settlement))?;
        let target = dirty * notional / 100.0;
        let y = cashflows::yield_rate(
            &self.cashflows,
            target,
            day_counter,
            compounding,
            frequency,
            ctx,
            settlement,
            &self.yield_solver,
        )
        .map_err(|e| match e {
            Error::YieldSolverNonConvergence {
                lower,
                upper,
                reason,
                ..
            } => Error::YieldSolverNonConvergence {
                instrument: self.description.clone(),
                target: dirty,
                lower,
                upper,
                reason,
            },
            other => other,
        })?;
        Ok(y.rate())
    }

    /// The flat yield reproducing the engine's clean price.
    pub fn yield_rate(
        &self,
        ctx: &EvaluationContext,
        day_counter: DayCounter,
        compounding: Compounding,
        frequency: Frequency,
    ) -> Result<Rate> {
        let clean = self.clean_price(ctx)?;
        self.yield_from_clean_price(ctx, clean, day_counter, compounding, frequency, None)
    }
}

impl Instrument for Bond {
    fn is_expired(&self, ctx: &EvaluationContext) -> Result<bool> {
        let today = ctx.evaluation_date()?;
        let include = ctx.include_settlement_date_flows();
        Ok(self
            .cashflows
            .iter()
            .all(|cf| cf.has_occurred(today, include)))
    }

    fn maturity_date(&self) -> Option<Date> {
        Some(self.maturity_date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ql_indexes::FixingStore;
    use ql_termstructures::{FlatForward, YieldCurveHandle, YieldTermStructure};
    use ql_time::{
        ActualActualConvention, DateGeneration, NullCalendar, Period, ScheduleBuilder,
        Target, Thirty360Convention, TimeUnit, UnitedStates, UsMarket, WeekendsOnly,
    };
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn date(y: u16, m: u8, d: u8) -> Date {
        Date::from_ymd(y, m, d).unwrap()
    }

    /// Discounts on a relinkable curve and counts its calls.
    #[derive(Debug)]
    struct CurveEngine {
        curve: YieldCurveHandle,
        calls: AtomicUsize,
    }

    impl CurveEngine {
        fn new(curve: YieldCurveHandle) -> Arc<Self> {
            Arc::new(Self {
                curve,
                calls: AtomicUsize::new(0),
            })
        }
    }

    impl PricingEngine<Bond> for CurveEngine {
        fn calculate(&self, bond: &Bond, ctx: &EvaluationContext) -> Result<PricingResults> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let curve = self
                .curve
                .current()
                .ok_or_else(|| Error::NoPricingCurve(bond.description().to_string()))?;
            let settlement = bond.settlement_date(ctx)?;
            let npv = cashflows::npv(bond.cashflows(), &*curve, ctx, settlement)?;
            Ok(PricingResults::from_npv(npv))
        }

        fn version(&self) -> u64 {
            self.curve.version()
        }
    }

    fn flat(rate: Rate) -> Arc<dyn YieldTermStructure> {
        Arc::new(FlatForward::continuous(
            date(2008, 9, 18),
            rate,
            DayCounter::Actual365Fixed,
        ))
    }

    fn ctx() -> EvaluationContext {
        EvaluationContext::with_evaluation_date(date(2008, 9, 15))
    }

    fn treasury_4_5() -> Bond {
        let cal = UnitedStates::new(UsMarket::GovernmentBond);
        let schedule = ScheduleBuilder::new(
            date(2007, 5, 15),
            date(2017, 5, 15),
            Period::new(6, TimeUnit::Months),
            &cal,
        )
        .with_convention(BusinessDayConvention::Unadjusted)
        .with_termination_convention(BusinessDayConvention::Unadjusted)
        .with_rule(DateGeneration::Backward)
        .build()
        .unwrap();
        let terms = BondTerms::new(3, Arc::new(Target), 100.0)
            .with_payment_convention(BusinessDayConvention::ModifiedFollowing)
            .with_issue_date(date(2007, 5, 15));
        Bond::fixed_rate(
            terms,
            &schedule,
            &[0.045],
            DayCounter::ActualActual(ActualActualConvention::Bond),
        )
        .unwrap()
    }

    #[test]
    fn zero_coupon_redeems_at_maturity() {
        let terms = BondTerms::new(3, Arc::new(Target), 100.0)
            .with_redemption(116.92)
            .with_issue_date(date(2003, 8, 15));
        let curve = flat(0.04);
        let bond = Bond::zero_coupon(terms, date(2013, 8, 15))
            .unwrap()
            .with_pricing_engine(CurveEngine::new(YieldCurveHandle::from_arc(curve.clone())));
        let ctx = ctx();

        assert_eq!(bond.cashflows().len(), 1);
        assert_eq!(bond.maturity_date(), date(2013, 8, 15));
        assert_eq!(bond.settlement_date(&ctx).unwrap(), date(2008, 9, 18));
        assert_eq!(bond.notional(date(2008, 9, 18)), 100.0);
        assert_eq!(bond.notional(date(2013, 8, 16)), 0.0);
        assert_eq!(bond.accrued_amount(&ctx, None).unwrap(), 0.0);
        assert_eq!(bond.next_coupon_rate(&ctx, None).unwrap(), None);

        let expected =
            116.92 * curve.discount_date(date(2013, 8, 15)) / curve.discount_date(date(2008, 9, 18));
        assert_abs_diff_eq!(bond.dirty_price(&ctx).unwrap(), expected, epsilon = 1e-10);
        assert_abs_diff_eq!(bond.clean_price(&ctx).unwrap(), expected, epsilon = 1e-10);
    }

    #[test]
    fn fixed_rate_clean_dirty_and_accrued() {
        let bond = treasury_4_5().with_pricing_engine(CurveEngine::new(
            YieldCurveHandle::from_arc(flat(0.04)),
        ));
        let ctx = ctx();
        // 20 coupons and one redemption.
        assert_eq!(bond.cashflows().len(), 21);
        assert_eq!(bond.redemptions().count(), 1);
        assert!(bond.cashflows().last().unwrap().is_redemption());

        // 126 of the 184 days from 15 May to 15 November 2008.
        let accrued = bond.accrued_amount(&ctx, None).unwrap();
        assert_abs_diff_eq!(accrued, 2.25 * 126.0 / 184.0, epsilon = 1e-12);

        let dirty = bond.dirty_price(&ctx).unwrap();
        let clean = bond.clean_price(&ctx).unwrap();
        assert_abs_diff_eq!(dirty - clean, accrued, epsilon = 1e-12);
        assert_eq!(bond.next_coupon_rate(&ctx, None).unwrap(), Some(0.045));
        assert_eq!(bond.previous_coupon_rate(&ctx, None).unwrap(), Some(0.045));
    }

    #[test]
    fn yield_round_trips_the_clean_price() {
        let bond = treasury_4_5().with_pricing_engine(CurveEngine::new(
            YieldCurveHandle::from_arc(flat(0.04)),
        ));
        let ctx = ctx();
        let dc = DayCounter::Actual360;
        let y = bond
            .yield_rate(&ctx, dc, Compounding::Compounded, Frequency::Annual)
            .unwrap();
        let clean = bond.clean_price(&ctx).unwrap();
        let repriced = bond
            .clean_price_from_yield(&ctx, y, dc, Compounding::Compounded, Frequency::Annual, None)
            .unwrap();
        assert_abs_diff_eq!(repriced, clean, epsilon = 1e-8);
    }

    #[test]
    fn unreachable_clean_price_names_the_bond() {
        let bond = treasury_4_5();
        let err = bond
            .yield_from_clean_price(
                &ctx(),
                -50.0,
                DayCounter::Actual360,
                Compounding::Compounded,
                Frequency::Annual,
                None,
            )
            .unwrap_err();
        match err {
            Error::YieldSolverNonConvergence {
                instrument, target, ..
            } => {
                assert_eq!(instrument, bond.description());
                assert!(target < 0.0);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn amortizing_bond_pays_level_installments() {
        let cal = NullCalendar;
        let schedule = ScheduleBuilder::new(
            date(2025, 1, 15),
            date(2030, 1, 15),
            Period::new(1, TimeUnit::Months),
            &cal,
        )
        .build()
        .unwrap();
        let bond = Bond::amortizing_fixed_rate(
            BondTerms::new(0, Arc::new(NullCalendar), 100.0),
            &schedule,
            0.06,
            DayCounter::Thirty360(Thirty360Convention::BondBasis),
        )
        .unwrap();
        let ctx = EvaluationContext::with_evaluation_date(date(2025, 1, 15));

        let mut installments: Vec<(Date, Real)> = Vec::new();
        for cf in bond.cashflows() {
            let amount = cf.amount(&ctx).unwrap();
            match installments.last_mut() {
                Some((d, total)) if *d == cf.date() => *total += amount,
                _ => installments.push((cf.date(), amount)),
            }
        }
        assert_eq!(installments.len(), 60);
        let level = 100.0 * 0.005 / (1.0 - 1.005_f64.powi(-60));
        for (_, total) in &installments {
            assert_abs_diff_eq!(*total, level, epsilon = 1e-9);
        }
        let repaid: Real = bond
            .redemptions()
            .map(|cf| cf.amount(&ctx).unwrap())
            .sum();
        assert_abs_diff_eq!(repaid, 100.0, epsilon = 1e-9);
        assert!(bond.notional(date(2027, 1, 15)) < 100.0);
        assert_abs_diff_eq!(bond.notional(date(2025, 1, 20)), 100.0, epsilon = 1e-12);
    }

    #[test]
    fn amortizing_bond_at_its_coupon_rate_is_par_on_payment_dates() {
        let cal = NullCalendar;
        let schedule = ScheduleBuilder::new(
            date(2025, 1, 15),
            date(2030, 1, 15),
            Period::new(1, TimeUnit::Months),
            &cal,
        )
        .build()
        .unwrap();
        let dc = DayCounter::Thirty360(Thirty360Convention::BondBasis);
        let bond = Bond::amortizing_fixed_rate(
            BondTerms::new(0, Arc::new(NullCalendar), 100.0),
            &schedule,
            0.06,
            dc,
        )
        .unwrap();
        let ctx = EvaluationContext::with_evaluation_date(date(2025, 1, 15));
        let payment = date(2026, 1, 15);

        // The notional on a payment date is what is left after paying.
        assert_eq!(bond.notional(payment), bond.notional(date(2026, 1, 16)));
        assert!(bond.notional(payment) < bond.notional(date(2026, 1, 14)));
        assert_eq!(bond.notional(date(2030, 1, 15)), 0.0);

        for settlement in [date(2026, 1, 14), payment, date(2026, 1, 16)] {
            let clean = bond
                .clean_price_from_yield(
                    &ctx,
                    0.06,
                    dc,
                    Compounding::Compounded,
                    Frequency::Monthly,
                    Some(settlement),
                )
                .unwrap();
            assert_abs_diff_eq!(clean, 100.0, epsilon = 1e-4);
        }
        let dirty = bond
            .dirty_price_from_yield(
                &ctx,
                0.06,
                dc,
                Compounding::Compounded,
                Frequency::Monthly,
                Some(payment),
            )
            .unwrap();
        assert_abs_diff_eq!(dirty, 100.0, epsilon = 1e-9);
        let y = bond
            .yield_from_clean_price(
                &ctx,
                100.0,
                dc,
                Compounding::Compounded,
                Frequency::Monthly,
                Some(payment),
            )
            .unwrap();
        assert_abs_diff_eq!(y, 0.06, epsilon = 1e-9);
    }

    #[test]
    fn counting_settlement_flows_keeps_the_paying_notional() {
        let cal = NullCalendar;
        let schedule = ScheduleBuilder::new(
            date(2025, 1, 15),
            date(2026, 1, 15),
            Period::new(1, TimeUnit::Months),
            &cal,
        )
        .build()
        .unwrap();
        let bond = Bond::amortizing_fixed_rate(
            BondTerms::new(0, Arc::new(NullCalendar), 100.0),
            &schedule,
            0.06,
            DayCounter::Thirty360(Thirty360Convention::BondBasis),
        )
        .unwrap();
        let payment = date(2025, 6, 15);
        let ctx = EvaluationContext::with_evaluation_date(date(2025, 1, 15));
        assert_eq!(bond.outstanding_notional(&ctx, payment), bond.notional(payment));
        let ctx = ctx.with_settlement_date_flows(true);
        assert_eq!(
            bond.outstanding_notional(&ctx, payment),
            bond.notional(date(2025, 6, 14))
        );
    }

    #[test]
    fn floating_rate_bond_reads_fixings() {
        let store = Arc::new(FixingStore::new());
        store.add("TEST-IBOR-3M", date(2025, 2, 13), 0.028);
        store.add("TEST-IBOR-3M", date(2025, 5, 13), 0.030);
        let curve: Arc<dyn YieldTermStructure> = Arc::new(FlatForward::continuous(
            date(2025, 6, 2),
            0.03,
            DayCounter::Actual365Fixed,
        ));
        let index = Arc::new(
            IborIndex::new(
                "TEST-IBOR-3M",
                Period::new(3, TimeUnit::Months),
                2,
                Arc::new(WeekendsOnly),
                BusinessDayConvention::ModifiedFollowing,
                false,
                DayCounter::Actual360,
            )
            .with_fixing_source(store)
            .with_forecast_curve(YieldCurveHandle::from_arc(curve.clone())),
        );
        let cal = WeekendsOnly;
        let schedule = ScheduleBuilder::new(
            date(2025, 2, 15),
            date(2027, 2, 15),
            Period::new(3, TimeUnit::Months),
            &cal,
        )
        .with_convention(BusinessDayConvention::Unadjusted)
        .with_termination_convention(BusinessDayConvention::Unadjusted)
        .build()
        .unwrap();
        let bond = Bond::floating_rate(
            BondTerms::new(0, Arc::new(WeekendsOnly), 100.0),
            &schedule,
            index,
            FloatingCouponTerms::new(DayCounter::Actual360).with_spread(0.001),
        )
        .unwrap()
        .with_pricing_engine(CurveEngine::new(YieldCurveHandle::from_arc(curve)));
        let ctx = EvaluationContext::with_evaluation_date(date(2025, 6, 2));

        assert_eq!(bond.cashflows().len(), 9);
        assert_eq!(bond.description(), "TEST-IBOR-3M floater 15 February 2027");
        assert_abs_diff_eq!(
            bond.next_coupon_rate(&ctx, None).unwrap().unwrap(),
            0.031,
            epsilon = 1e-15
        );
        assert_abs_diff_eq!(
            bond.previous_coupon_rate(&ctx, None).unwrap().unwrap(),
            0.029,
            epsilon = 1e-15
        );
        // Close to par when the spread is small and the curve is the index's.
        let clean = bond.clean_price(&ctx).unwrap();
        assert!((clean - 100.0).abs() < 1.0, "clean price {clean}");
    }

    #[test]
    fn pricing_without_an_engine_fails() {
        let bond = treasury_4_5();
        assert_eq!(
            bond.npv(&ctx()),
            Err(Error::NoPricingCurve(bond.description().to_string()))
        );
        let unlinked = treasury_4_5()
            .with_pricing_engine(CurveEngine::new(YieldCurveHandle::null()));
        assert!(matches!(unlinked.npv(&ctx()), Err(Error::NoPricingCurve(_))));
    }

    #[test]
    fn results_are_cached_until_inputs_change() {
        let handle = YieldCurveHandle::from_arc(flat(0.04));
        let engine = CurveEngine::new(handle.clone());
        let bond = treasury_4_5().with_pricing_engine(engine.clone());
        let ctx = ctx();

        let first = bond.npv(&ctx).unwrap();
        assert_eq!(bond.npv(&ctx).unwrap(), first);
        assert_eq!(engine.calls.load(Ordering::SeqCst), 1);

        handle.link_to(flat(0.05));
        let relinked = bond.npv(&ctx).unwrap();
        assert!(relinked < first);
        assert_eq!(engine.calls.load(Ordering::SeqCst), 2);

        let mut later = ctx;
        later.set_evaluation_date(date(2008, 9, 16));
        bond.npv(&later).unwrap();
        assert_eq!(engine.calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn floater_reprices_when_its_forecast_or_fixings_move() {
        let today = date(2025, 1, 15);
        let flat_at = |rate: Rate| -> Arc<dyn YieldTermStructure> {
            Arc::new(FlatForward::continuous(today, rate, DayCounter::Actual365Fixed))
        };
        let store = Arc::new(FixingStore::new());
        let forecast = YieldCurveHandle::from_arc(flat_at(0.03));
        let index = Arc::new(
            IborIndex::new(
                "TEST-IBOR-3M",
                Period::new(3, TimeUnit::Months),
                2,
                Arc::new(NullCalendar),
                BusinessDayConvention::ModifiedFollowing,
                false,
                DayCounter::Actual360,
            )
            .with_fixing_source(store.clone())
            .with_forecast_curve(forecast.clone()),
        );
        let cal = NullCalendar;
        let schedule = ScheduleBuilder::new(
            date(2025, 1, 17),
            date(2030, 1, 17),
            Period::new(3, TimeUnit::Months),
            &cal,
        )
        .build()
        .unwrap();
        let engine = CurveEngine::new(YieldCurveHandle::from_arc(flat_at(0.03)));
        let bond = Bond::floating_rate(
            BondTerms::new(0, Arc::new(NullCalendar), 100.0),
            &schedule,
            index,
            FloatingCouponTerms::new(DayCounter::Actual360),
        )
        .unwrap()
        .with_pricing_engine(engine.clone());
        let ctx = EvaluationContext::with_evaluation_date(today);

        let before = bond.npv(&ctx).unwrap();
        assert_eq!(bond.npv(&ctx).unwrap(), before);
        assert_eq!(engine.calls.load(Ordering::SeqCst), 1);

        forecast.link_to(flat_at(0.08));
        let after = bond.npv(&ctx).unwrap();
        assert!(after > before + 1.0, "before {before}, after {after}");
        assert_eq!(engine.calls.load(Ordering::SeqCst), 2);

        // The first coupon fixes today; a stored fixing replaces its forecast.
        store.add("TEST-IBOR-3M", today, 0.20);
        let fixed = bond.npv(&ctx).unwrap();
        assert!(fixed > after, "after {after}, with fixing {fixed}");
        assert_eq!(engine.calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn expiry_follows_the_last_payment() {
        let bond = treasury_4_5();
        assert!(!bond.is_expired(&ctx()).unwrap());
        let after = EvaluationContext::with_evaluation_date(date(2017, 5, 16));
        assert!(bond.is_expired(&after).unwrap());
        assert_eq!(Instrument::maturity_date(&bond), Some(date(2017, 5, 15)));
    }

    #[test]
    fn issue_after_maturity_is_rejected() {
        let terms = BondTerms::new(0, Arc::new(NullCalendar), 100.0)
            .with_issue_date(date(2020, 1, 1));
        assert!(matches!(
            Bond::zero_coupon(terms, date(2019, 1, 1)),
            Err(Error::InvalidDateOrder { .. })
        ));
    }
}

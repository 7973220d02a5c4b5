//! Cash-flow analysis functions.
//!
//! Free functions over a [`Leg`] ordered by payment date:
//! - `npv`, `bps` against a yield curve, discounted to a settlement date
//! - `npv_from_yield`, `yield_rate` at a flat rate
//! - `duration` (simple, Macaulay, modified) and `convexity`
//! - `accrued_amount` and the previous/next cash-flow queries
//!
//! Flows that have occurred at the settlement date are skipped; whether a
//! flow paid on the settlement date itself still counts follows
//! [`EvaluationContext::include_settlement_date_flows`].
//!
//! Flat-yield discounting is stepwise: each flow is discounted from the
//! previous payment date with the coupon's reference period, so that
//! ActualActual(Bond) yields count whole coupon periods exactly.

use crate::cashflow::{CashFlow, Leg};
use ql_core::errors::{Error, Result};
use ql_core::{ensure, Compounding, Rate, Real, Time};
use ql_math::solvers1d::newton_with_brent_fallback;
use ql_termstructures::YieldTermStructure;
use ql_time::{Date, DayCounter, EvaluationContext, Frequency, InterestRate, Period, TimeUnit};
use serde::{Deserialize, Serialize};

const BASIS_POINT: Real = 1.0e-4;

/// Duration type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Duration {
    /// Time-weighted average of discounted flows.
    Simple,
    /// Macaulay duration; needs compounded yields.
    Macaulay,
    /// `-dP/dy / P`.
    Modified,
}

/// Settings for the flat-yield solver.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct YieldSolverConfig {
    /// Absolute accuracy on the yield.
    pub accuracy: Real,
    /// Iteration budget for each of the Newton and Brent stages.
    pub max_iterations: u32,
    /// Newton starting point.
    pub guess: Rate,
    /// Lower end of the admissible yields.
    pub min_rate: Rate,
    /// Upper end of the admissible yields.
    pub max_rate: Rate,
}

impl Default for YieldSolverConfig {
    fn default() -> Self {
        Self {
            accuracy: 1.0e-10,
            max_iterations: 100,
            guess: 0.05,
            min_rate: -0.99,
            max_rate: 1.0,
        }
    }
}

fn is_alive(cf: &CashFlow, ctx: &EvaluationContext, settlement: Date) -> bool {
    !cf.has_occurred(settlement, ctx.include_settlement_date_flows())
}

// ── Leg queries ──────────────────────────────────────────────────────────────

/// The maturity (last payment) date of a leg.
pub fn maturity_date(leg: &Leg) -> Option<Date> {
    leg.iter().map(CashFlow::date).max()
}

/// The last payment date that has occurred at `ref_date`.
pub fn previous_cash_flow_date(leg: &Leg, ctx: &EvaluationContext, ref_date: Date) -> Option<Date> {
    leg.iter()
        .filter(|cf| !is_alive(cf, ctx, ref_date))
        .map(CashFlow::date)
        .max()
}

/// The first payment date still to come at `ref_date`.
pub fn next_cash_flow_date(leg: &Leg, ctx: &EvaluationContext, ref_date: Date) -> Option<Date> {
    leg.iter()
        .filter(|cf| is_alive(cf, ctx, ref_date))
        .map(CashFlow::date)
        .min()
}

/// Sum of the rates of the coupons paying on `date`, `None` when no coupon
/// pays then.
fn aggregate_rate(leg: &Leg, ctx: &EvaluationContext, date: Date) -> Result<Option<Rate>> {
    let mut total = None;
    for coupon in leg.iter().filter(|cf| cf.date() == date).filter_map(CashFlow::coupon) {
        *total.get_or_insert(0.0) += coupon.rate(ctx)?;
    }
    Ok(total)
}

/// Rate of the coupon(s) last paid at `ref_date`.
pub fn previous_coupon_rate(
    leg: &Leg,
    ctx: &EvaluationContext,
    ref_date: Date,
) -> Result<Option<Rate>> {
    match previous_cash_flow_date(leg, ctx, ref_date) {
        Some(date) => aggregate_rate(leg, ctx, date),
        None => Ok(None),
    }
}

/// Rate of the coupon(s) paid next after `ref_date`.
pub fn next_coupon_rate(leg: &Leg, ctx: &EvaluationContext, ref_date: Date) -> Result<Option<Rate>> {
    match next_cash_flow_date(leg, ctx, ref_date) {
        Some(date) => aggregate_rate(leg, ctx, date),
        None => Ok(None),
    }
}

/// Interest accrued at `settlement` on the coupons paid next.
pub fn accrued_amount(leg: &Leg, ctx: &EvaluationContext, settlement: Date) -> Result<Real> {
    let Some(next) = next_cash_flow_date(leg, ctx, settlement) else {
        return Ok(0.0);
    };
    leg.iter()
        .filter(|cf| cf.date() == next)
        .map(|cf| cf.accrued_amount(ctx, settlement))
        .sum()
}

// ── Curve-based analytics ───────────────────────────────────────────────────

/// Present value at `settlement` of the flows after it:
/// `Σ amount × P(d) / P(settlement)`.
pub fn npv(
    leg: &Leg,
    curve: &dyn YieldTermStructure,
    ctx: &EvaluationContext,
    settlement: Date,
) -> Result<Real> {
    let mut total = 0.0;
    for cf in leg.iter().filter(|cf| is_alive(cf, ctx, settlement)) {
        total += cf.amount(ctx)? * curve.discount_date(cf.date());
    }
    Ok(total / curve.discount_date(settlement))
}

/// Change in [`npv`] for a one basis-point increase of every coupon rate.
pub fn bps(
    leg: &Leg,
    curve: &dyn YieldTermStructure,
    ctx: &EvaluationContext,
    settlement: Date,
) -> Result<Real> {
    let total: Real = leg
        .iter()
        .filter(|cf| is_alive(cf, ctx, settlement))
        .filter_map(|cf| {
            cf.coupon()
                .map(|c| c.nominal() * c.accrual_period() * curve.discount_date(cf.date()))
        })
        .sum();
    Ok(total * BASIS_POINT / curve.discount_date(settlement))
}

// ── Flat-yield analytics ────────────────────────────────────────────────────

/// One stepwise-discounted flow.
#[derive(Debug, Clone, Copy)]
struct DiscountedFlow {
    amount: Real,
    /// Time from settlement, summed over steps.
    time: Time,
    discount: Real,
    /// `d ln(discount) / dy`.
    log_slope: Real,
    /// `d² ln(discount) / dy²`.
    log_curvature: Real,
}

/// Discount factor over `tau` at yield `y` with its first two log
/// derivatives in `y`.
fn step_discount(y: &InterestRate, tau: Time) -> Result<(Real, Real, Real)> {
    let df = y.discount_factor(tau)?;
    let r = y.rate();
    let f = y
        .frequency()
        .periods_per_year()
        .map_or(1.0, |f| f.max(1) as Real);
    let simple = || {
        let g = 1.0 + r * tau;
        (-tau / g, tau * tau / (g * g))
    };
    let compounded = || {
        let g = 1.0 + r / f;
        (-tau / g, tau / (f * g * g))
    };
    let (slope, curvature) = match y.compounding() {
        Compounding::Simple => simple(),
        Compounding::Compounded => compounded(),
        Compounding::Continuous => (-tau, 0.0),
        Compounding::SimpleThenCompounded if tau <= 1.0 / f => simple(),
        Compounding::SimpleThenCompounded => compounded(),
        Compounding::CompoundedThenSimple if tau <= 1.0 / f => compounded(),
        Compounding::CompoundedThenSimple => simple(),
    };
    Ok((df, slope, curvature))
}

fn discounted_flows(
    leg: &Leg,
    y: &InterestRate,
    ctx: &EvaluationContext,
    settlement: Date,
) -> Result<Vec<DiscountedFlow>> {
    let dc = y.day_counter();
    let mut last = settlement;
    let mut time = 0.0;
    let mut discount = 1.0;
    let mut log_slope = 0.0;
    let mut log_curvature = 0.0;
    let mut flows = Vec::with_capacity(leg.len());

    for cf in leg.iter().filter(|cf| is_alive(cf, ctx, settlement)) {
        let date = cf.date();
        let (ref_start, ref_end) = match cf.coupon() {
            Some(c) => (c.reference_period_start(), c.reference_period_end()),
            None if last == settlement => (date.shift(Period::new(-1, TimeUnit::Years))?, date),
            None => (last, date),
        };
        let tau = dc.checked_year_fraction(last, date, Some(ref_start), Some(ref_end))?;
        let (df, slope, curvature) = step_discount(y, tau)?;
        time += tau;
        discount *= df;
        log_slope += slope;
        log_curvature += curvature;
        flows.push(DiscountedFlow {
            amount: cf.amount(ctx)?,
            time,
            discount,
            log_slope,
            log_curvature,
        });
        last = date;
    }
    Ok(flows)
}

/// Present value at `settlement` of the flows after it, discounted at the
/// flat yield `y`.
pub fn npv_from_yield(
    leg: &Leg,
    y: &InterestRate,
    ctx: &EvaluationContext,
    settlement: Date,
) -> Result<Real> {
    Ok(discounted_flows(leg, y, ctx, settlement)?
        .iter()
        .map(|f| f.amount * f.discount)
        .sum())
}

/// Value and first two yield derivatives of the leg at yield `y`.
fn npv_with_derivatives(
    leg: &Leg,
    y: &InterestRate,
    ctx: &EvaluationContext,
    settlement: Date,
) -> Result<(Real, Real, Real)> {
    let mut p = 0.0;
    let mut dp = 0.0;
    let mut d2p = 0.0;
    for f in discounted_flows(leg, y, ctx, settlement)? {
        let pv = f.amount * f.discount;
        p += pv;
        dp += pv * f.log_slope;
        d2p += pv * (f.log_slope * f.log_slope + f.log_curvature);
    }
    Ok((p, dp, d2p))
}

/// The flat yield under the given conventions at which the leg is worth
/// `npv` at `settlement`.
///
/// Newton from `config.guess`, falling back to Brent over
/// `[config.min_rate, config.max_rate]`.
///
/// # Errors
/// [`Error::YieldSolverNonConvergence`] with the bracket and budget when
/// neither stage converges; pricing errors from the leg propagate as is.
#[allow(clippy::too_many_arguments)]
pub fn yield_rate(
    leg: &Leg,
    npv: Real,
    day_counter: DayCounter,
    compounding: Compounding,
    frequency: Frequency,
    ctx: &EvaluationContext,
    settlement: Date,
    config: &YieldSolverConfig,
) -> Result<InterestRate> {
    ensure!(
        config.min_rate < config.max_rate,
        "empty yield domain [{}, {}]",
        config.min_rate,
        config.max_rate
    );
    let root = newton_with_brent_fallback(
        |r| {
            let y = InterestRate::new(r, day_counter, compounding, frequency)?;
            let (p, dp, _) = npv_with_derivatives(leg, &y, ctx, settlement)?;
            Ok((p - npv, dp))
        },
        config.guess,
        config.min_rate,
        config.max_rate,
        config.accuracy,
        config.max_iterations,
    )
    .map_err(|e| match e {
        Error::NotBracketed { .. } | Error::MaxIterations { .. } => {
            tracing::warn!(target_npv = npv, error = %e, "yield solver failed");
            Error::YieldSolverNonConvergence {
                instrument: "cash-flow leg".into(),
                target: npv,
                lower: config.min_rate,
                upper: config.max_rate,
                reason: e.to_string(),
            }
        }
        other => other,
    })?;
    tracing::debug!(yield_rate = root.x, iterations = root.iterations, "yield solved");
    InterestRate::new(root.x, day_counter, compounding, frequency)
}

/// Duration of the leg at the flat yield `y`.
///
/// # Errors
/// Macaulay duration needs [`Compounding::Compounded`].
pub fn duration(
    leg: &Leg,
    y: &InterestRate,
    kind: Duration,
    ctx: &EvaluationContext,
    settlement: Date,
) -> Result<Real> {
    let flows = discounted_flows(leg, y, ctx, settlement)?;
    let p: Real = flows.iter().map(|f| f.amount * f.discount).sum();
    if p == 0.0 {
        return Ok(0.0);
    }
    let dp: Real = flows.iter().map(|f| f.amount * f.discount * f.log_slope).sum();
    match kind {
        Duration::Simple => Ok(flows
            .iter()
            .map(|f| f.time * f.amount * f.discount)
            .sum::<Real>()
            / p),
        Duration::Modified => Ok(-dp / p),
        Duration::Macaulay => {
            ensure!(
                y.compounding() == Compounding::Compounded,
                "Macaulay duration needs a compounded yield, got {}",
                y.compounding()
            );
            let f = y
                .frequency()
                .periods_per_year()
                .map_or(1.0, |f| f.max(1) as Real);
            Ok(-dp / p * (1.0 + y.rate() / f))
        }
    }
}

/// Convexity `(d²P/dy²) / P` of the leg at the flat yield `y`.
pub fn convexity(
    leg: &Leg,
    y: &InterestRate,
    ctx: &EvaluationContext,
    settlement: Date,
) -> Result<Real> {
    let (p, _, d2p) = npv_with_derivatives(leg, y, ctx, settlement)?;
    if p == 0.0 {
        return Ok(0.0);
    }
    Ok(d2p / p)
}

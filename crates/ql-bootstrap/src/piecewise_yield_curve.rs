//! Pillar-by-pillar yield-curve bootstrap.
//!
//! Helpers are sorted by pillar date.  For each pillar in turn the discount
//! factors already solved are held fixed and the unknown discount factor at
//! the current pillar is searched for with a bracketed Brent solver inside
//! `[min_discount, max_discount]`, the trial curve being log-linear on
//! discount factors over the solved nodes plus the trial node.  The result is
//! an immutable [`DiscountCurve`]; [`PiecewiseYieldCurve`] keeps the helpers
//! around so the curve can be rebuilt once quotes move.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use ql_bootstrap::{build, DepositRateHelper, RateHelper};
//! use ql_core::Handle;
//! use ql_quotes::{Quote, SimpleQuote};
//! use ql_termstructures::YieldTermStructure;
//! use ql_time::{
//!     BusinessDayConvention, Date, DayCounter, EvaluationContext, NullCalendar, Period,
//!     TimeUnit,
//! };
//!
//! let today = Date::from_ymd(2025, 1, 2).unwrap();
//! let ctx = EvaluationContext::with_evaluation_date(today);
//! let deposit = |rate: f64, months: i32| -> RateHelper {
//!     let quote: Arc<dyn Quote> = Arc::new(SimpleQuote::new(rate));
//!     DepositRateHelper::new(
//!         Handle::from_arc(quote),
//!         Period::new(months, TimeUnit::Months),
//!         0,
//!         &NullCalendar,
//!         BusinessDayConvention::Following,
//!         false,
//!         DayCounter::Actual360,
//!         &ctx,
//!     )
//!     .unwrap()
//!     .into()
//! };
//! let helpers = vec![deposit(0.045, 6), deposit(0.04, 3)];
//! let curve = build(&helpers, today, DayCounter::Actual365Fixed).unwrap();
//! assert_eq!(curve.dates().len(), 3);
//! assert!(curve.discount(0.5) < 1.0);
//! ```

use crate::rate_helpers::RateHelper;
use ql_core::errors::{Error, Result};
use ql_core::{ensure, DiscountFactor, Rate, Real, Time};
use ql_math::{brent, expand_bracket, Root};
use ql_termstructures::{DiscountCurve, TermStructure, YieldTermStructure};
use ql_time::{Date, DayCounter};
use serde::{Deserialize, Serialize};

/// Initial half-width of the discount-factor bracket around the guess.
const BRACKET_STEP: Real = 0.01;

/// Flat rate behind the first pillar's guess.
const FIRST_GUESS_RATE: Rate = 0.05;

/// Solver settings for the bootstrap.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BootstrapConfig {
    /// Absolute accuracy on each pillar's discount factor.
    pub accuracy: Real,
    /// Iteration budget per pillar, for bracketing and for Brent each.
    pub max_iterations: u32,
    /// Lowest discount factor searched.
    pub min_discount: DiscountFactor,
    /// Highest discount factor searched; above 1 to admit negative rates.
    pub max_discount: DiscountFactor,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            accuracy: 1.0e-12,
            max_iterations: 100,
            min_discount: 1.0e-6,
            max_discount: 1.25,
        }
    }
}

/// Bootstrap a discount curve from `helpers` with the default settings.
///
/// # Errors
/// See [`build_with_config`].
pub fn build(
    helpers: &[RateHelper],
    reference_date: Date,
    day_counter: DayCounter,
) -> Result<DiscountCurve> {
    build_with_config(helpers, reference_date, day_counter, &BootstrapConfig::default())
}

/// Sort helpers by pillar, rejecting shared pillars and pillars on or before
/// the reference date.
fn sorted_by_pillar(helpers: &[RateHelper], reference_date: Date) -> Result<Vec<&RateHelper>> {
    let mut sorted: Vec<&RateHelper> = helpers.iter().collect();
    sorted.sort_by_key(|h| h.pillar_date());
    if let Some(first) = sorted.first() {
        if first.pillar_date() <= reference_date {
            return Err(Error::OutOfOrderPillars(format!(
                "{} pillar {} is not after the reference date {reference_date}",
                first.description(),
                first.pillar_date()
            )));
        }
    }
    if let Some(w) = sorted
        .windows(2)
        .find(|w| w[0].pillar_date() == w[1].pillar_date())
    {
        return Err(Error::OutOfOrderPillars(format!(
            "{} and {} share the pillar {}",
            w[0].description(),
            w[1].description(),
            w[0].pillar_date()
        )));
    }
    Ok(sorted)
}

/// Bootstrap a discount curve from `helpers`.
///
/// The curve's first node is `reference_date` with a discount factor of 1;
/// `day_counter` turns dates into interpolation times.  The result does not
/// depend on the order of `helpers`.
///
/// # Errors
/// * [`Error::OutOfOrderPillars`] if two helpers share a pillar or a pillar
///   is not after `reference_date`.
/// * [`Error::IllsetQuote`] from a helper's quote.
/// * [`Error::BootstrapNonConvergence`] naming the pillar (one-based), its
///   date, the helper, and the last bracket when a pillar cannot be solved.
pub fn build_with_config(
    helpers: &[RateHelper],
    reference_date: Date,
    day_counter: DayCounter,
    config: &BootstrapConfig,
) -> Result<DiscountCurve> {
    ensure!(!helpers.is_empty(), "no rate helpers to bootstrap");
    ensure!(
        config.min_discount > 0.0 && config.min_discount < config.max_discount,
        "invalid discount bracket [{}, {}]",
        config.min_discount,
        config.max_discount
    );
    let sorted = sorted_by_pillar(helpers, reference_date)?;
    tracing::info!(
        pillars = sorted.len(),
        %reference_date,
        "bootstrapping discount curve"
    );

    let mut dates = Vec::with_capacity(sorted.len() + 1);
    let mut discounts = Vec::with_capacity(sorted.len() + 1);
    dates.push(reference_date);
    discounts.push(1.0);

    for (i, helper) in sorted.iter().enumerate() {
        let pillar = helper.pillar_date();
        let quote = helper.quote()?;
        let guess = if dates.len() > 1 {
            DiscountCurve::new(&dates, &discounts, day_counter)?.discount_date(pillar)
        } else {
            let t: Time = day_counter.year_fraction(reference_date, pillar);
            (-FIRST_GUESS_RATE * t).exp()
        }
        .clamp(config.min_discount, config.max_discount);

        dates.push(pillar);
        discounts.push(guess);
        let node = discounts.len() - 1;

        let mut objective = |df: DiscountFactor| -> Result<Real> {
            discounts[node] = df;
            let trial = DiscountCurve::new(&dates, &discounts, day_counter)?;
            Ok(helper.implied_quote(&trial)? - quote)
        };
        let solved = expand_bracket(
            &mut objective,
            guess,
            BRACKET_STEP,
            config.min_discount,
            config.max_discount,
            config.max_iterations,
        )
        .and_then(|(lower, upper)| {
            brent(
                &mut objective,
                lower,
                upper,
                config.accuracy,
                config.max_iterations,
            )
        });

        let root: Root = match solved {
            Ok(root) => root,
            Err(e) => {
                let (lower, upper) = match e {
                    Error::NotBracketed { lower, upper, .. }
                    | Error::MaxIterations { lower, upper, .. } => (lower, upper),
                    other => return Err(other),
                };
                tracing::warn!(
                    pillar = i + 1,
                    date = %pillar,
                    helper = helper.description(),
                    lower,
                    upper,
                    error = %e,
                    "bootstrap failed"
                );
                return Err(Error::BootstrapNonConvergence {
                    pillar: i + 1,
                    date: pillar.to_string(),
                    instrument: helper.description().to_owned(),
                    lower,
                    upper,
                    reason: e.to_string(),
                });
            }
        };
        discounts[node] = root.x;
        tracing::debug!(
            pillar = i + 1,
            date = %pillar,
            helper = helper.description(),
            discount = root.x,
            iterations = root.iterations,
            "pillar solved"
        );
    }

    DiscountCurve::new(&dates, &discounts, day_counter)
}

// ── PiecewiseYieldCurve ───────────────────────────────────────────────────────

/// How well a bootstrapped curve reprices one helper.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PillarResidual {
    /// Pillar date.
    pub pillar: Date,
    /// Helper description.
    pub instrument: String,
    /// Market quote.
    pub quote: Real,
    /// Quote implied by the curve.
    pub implied: Real,
    /// `implied − quote`, in the helper's quote units.
    pub error: Real,
}

/// A bootstrapped curve together with the helpers it was built from.
///
/// The curve is immutable between calls to [`rebuild`](Self::rebuild).  It
/// implements [`YieldTermStructure`], so it can be linked into a
/// [`YieldCurveHandle`](ql_termstructures::YieldCurveHandle) directly.
#[derive(Debug, Clone)]
pub struct PiecewiseYieldCurve {
    reference_date: Date,
    day_counter: DayCounter,
    helpers: Vec<RateHelper>,
    config: BootstrapConfig,
    curve: DiscountCurve,
}

impl PiecewiseYieldCurve {
    /// Bootstrap with the default settings.
    pub fn new(
        reference_date: Date,
        helpers: Vec<RateHelper>,
        day_counter: DayCounter,
    ) -> Result<Self> {
        Self::with_config(reference_date, helpers, day_counter, BootstrapConfig::default())
    }

    /// Bootstrap with explicit settings.
    pub fn with_config(
        reference_date: Date,
        helpers: Vec<RateHelper>,
        day_counter: DayCounter,
        config: BootstrapConfig,
    ) -> Result<Self> {
        let curve = build_with_config(&helpers, reference_date, day_counter, &config)?;
        Ok(Self {
            reference_date,
            day_counter,
            helpers,
            config,
            curve,
        })
    }

    /// Bootstrap again against the helpers' current quotes.  On failure the
    /// previous curve is kept.
    pub fn rebuild(&mut self) -> Result<()> {
        self.curve = build_with_config(
            &self.helpers,
            self.reference_date,
            self.day_counter,
            &self.config,
        )?;
        Ok(())
    }

    /// The bootstrapped curve.
    pub fn curve(&self) -> &DiscountCurve {
        &self.curve
    }

    /// The helpers, in the order given.
    pub fn helpers(&self) -> &[RateHelper] {
        &self.helpers
    }

    /// The solver settings.
    pub fn config(&self) -> &BootstrapConfig {
        &self.config
    }

    /// Repricing error of every helper, in pillar order.
    pub fn residuals(&self) -> Result<Vec<PillarResidual>> {
        let mut report = self
            .helpers
            .iter()
            .map(|h| {
                let quote = h.quote()?;
                let implied = h.implied_quote(&self.curve)?;
                Ok(PillarResidual {
                    pillar: h.pillar_date(),
                    instrument: h.description().to_owned(),
                    quote,
                    implied,
                    error: implied - quote,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        report.sort_by_key(|r| r.pillar);
        Ok(report)
    }

    /// Largest absolute repricing error.
    pub fn max_abs_residual(&self) -> Result<Real> {
        Ok(self
            .residuals()?
            .iter()
            .fold(0.0, |acc: Real, r| acc.max(r.error.abs())))
    }
}

impl TermStructure for PiecewiseYieldCurve {
    fn reference_date(&self) -> Date {
        self.reference_date
    }

    fn day_counter(&self) -> DayCounter {
        self.day_counter
    }
}

impl YieldTermStructure for PiecewiseYieldCurve {
    fn discount_impl(&self, t: Time) -> DiscountFactor {
        self.curve.discount_impl(t)
    }

    fn forward_rate_impl(&self, t: Time) -> Rate {
        self.curve.forward_rate_impl(t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rate_helpers::{DepositRateHelper, SwapRateHelper};
    use approx::assert_abs_diff_eq;
    use ql_core::Handle;
    use ql_indexes::euribor;
    use ql_quotes::{Quote, SimpleQuote};
    use ql_time::{
        BusinessDayConvention, EvaluationContext, Frequency, Period, Target,
        Thirty360Convention, TimeUnit,
    };
    use std::sync::Arc;

    fn date(y: u16, m: u8, d: u8) -> Date {
        Date::from_ymd(y, m, d).unwrap()
    }

    fn ctx() -> EvaluationContext {
        EvaluationContext::with_evaluation_date(date(2008, 9, 15))
    }

    fn deposit(q: Arc<SimpleQuote>, n: i32, unit: TimeUnit) -> RateHelper {
        DepositRateHelper::new(
            Handle::from_arc(q as Arc<dyn Quote>),
            Period::new(n, unit),
            3,
            &Target,
            BusinessDayConvention::ModifiedFollowing,
            true,
            DayCounter::Actual360,
            &ctx(),
        )
        .unwrap()
        .into()
    }

    fn swap(q: Arc<SimpleQuote>, years: i32) -> RateHelper {
        SwapRateHelper::new(
            Handle::from_arc(q as Arc<dyn Quote>),
            Period::new(years, TimeUnit::Years),
            &Target,
            Frequency::Annual,
            BusinessDayConvention::Unadjusted,
            DayCounter::Thirty360(Thirty360Convention::European),
            Arc::new(euribor(Period::new(6, TimeUnit::Months))),
            Period::new(1, TimeUnit::Days),
            &ctx(),
        )
        .unwrap()
        .into()
    }

    fn simple(value: Real) -> Arc<SimpleQuote> {
        Arc::new(SimpleQuote::new(value))
    }

    fn depo_swap_helpers() -> Vec<RateHelper> {
        vec![
            deposit(simple(0.043375), 1, TimeUnit::Weeks),
            deposit(simple(0.031875), 1, TimeUnit::Months),
            deposit(simple(0.0320375), 3, TimeUnit::Months),
            deposit(simple(0.03385), 6, TimeUnit::Months),
            deposit(simple(0.0338125), 9, TimeUnit::Months),
            deposit(simple(0.0335125), 1, TimeUnit::Years),
            swap(simple(0.0295), 2),
            swap(simple(0.0323), 3),
            swap(simple(0.0359), 5),
            swap(simple(0.0412), 10),
            swap(simple(0.0433), 15),
        ]
    }

    #[test]
    fn curve_reprices_every_helper() {
        let curve = PiecewiseYieldCurve::new(
            date(2008, 9, 15),
            depo_swap_helpers(),
            DayCounter::Actual365Fixed,
        )
        .unwrap();
        assert_eq!(curve.curve().dates().len(), 12);
        assert_eq!(curve.curve().discounts()[0], 1.0);
        for r in curve.residuals().unwrap() {
            assert!(r.error.abs() < 1e-10, "{}: {}", r.instrument, r.error);
        }
    }

    #[test]
    fn positive_rates_give_decreasing_discounts() {
        let curve = build(&depo_swap_helpers(), date(2008, 9, 15), DayCounter::Actual365Fixed)
            .unwrap();
        assert!(curve.discounts().windows(2).all(|w| w[1] < w[0]));
    }

    #[test]
    fn insertion_order_does_not_matter() {
        let helpers = depo_swap_helpers();
        let mut reversed = helpers.clone();
        reversed.reverse();
        let a = build(&helpers, date(2008, 9, 15), DayCounter::Actual365Fixed).unwrap();
        let b = build(&reversed, date(2008, 9, 15), DayCounter::Actual365Fixed).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn one_year_deposit_fixes_its_pillar() {
        // Reference at the deposit start, so P(start) = 1.
        let q = simple(0.0194);
        let helper: RateHelper = DepositRateHelper::new(
            Handle::from_arc(q as Arc<dyn Quote>),
            Period::new(1, TimeUnit::Years),
            3,
            &Target,
            BusinessDayConvention::ModifiedFollowing,
            true,
            DayCounter::Actual365Fixed,
            &ctx(),
        )
        .unwrap()
        .into();
        let curve = build(
            std::slice::from_ref(&helper),
            date(2008, 9, 18),
            DayCounter::Actual365Fixed,
        )
        .unwrap();
        let tau = DayCounter::Actual365Fixed.year_fraction(date(2008, 9, 18), helper.pillar_date());
        assert_abs_diff_eq!(
            curve.discount_date(helper.pillar_date()),
            1.0 / (1.0 + 0.0194 * tau),
            epsilon = 1e-11
        );
    }

    #[test]
    fn shared_pillars_are_rejected() {
        let helpers = vec![
            deposit(simple(0.03), 3, TimeUnit::Months),
            deposit(simple(0.031), 3, TimeUnit::Months),
        ];
        assert!(matches!(
            build(&helpers, date(2008, 9, 15), DayCounter::Actual365Fixed),
            Err(Error::OutOfOrderPillars(_))
        ));
    }

    #[test]
    fn pillar_before_reference_is_rejected() {
        let helpers = vec![deposit(simple(0.03), 1, TimeUnit::Weeks)];
        assert!(matches!(
            build(&helpers, date(2008, 12, 31), DayCounter::Actual365Fixed),
            Err(Error::OutOfOrderPillars(_))
        ));
    }

    #[test]
    fn unreachable_quote_reports_the_pillar() {
        let helpers = vec![
            deposit(simple(0.03), 3, TimeUnit::Months),
            // A 6M rate this high needs a discount factor below the floor.
            deposit(simple(50.0), 6, TimeUnit::Months),
        ];
        let config = BootstrapConfig {
            min_discount: 0.5,
            ..BootstrapConfig::default()
        };
        let err = build_with_config(&helpers, date(2008, 9, 15), DayCounter::Actual365Fixed, &config)
            .unwrap_err();
        match err {
            Error::BootstrapNonConvergence {
                pillar,
                instrument,
                lower,
                ..
            } => {
                assert_eq!(pillar, 2);
                assert_eq!(instrument, "6M deposit");
                assert_eq!(lower, 0.5);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn rebuild_follows_quote_moves() {
        let q = simple(0.03);
        let helpers = vec![
            deposit(q.clone(), 3, TimeUnit::Months),
            deposit(simple(0.032), 6, TimeUnit::Months),
        ];
        let mut curve =
            PiecewiseYieldCurve::new(date(2008, 9, 15), helpers, DayCounter::Actual365Fixed)
                .unwrap();
        let pillar = curve.helpers()[0].pillar_date();
        let before = curve.discount_date(pillar);

        q.set_value(0.04);
        assert!(curve.max_abs_residual().unwrap() > 1e-3);
        curve.rebuild().unwrap();
        assert!(curve.discount_date(pillar) < before);
        assert!(curve.max_abs_residual().unwrap() < 1e-10);

        q.set_value(f64::NAN);
        assert!(matches!(curve.rebuild(), Err(Error::IllsetQuote { .. })));
        assert!(curve.discount_date(pillar) < before);
    }

    #[test]
    fn config_reads_partial_tables() {
        let config: BootstrapConfig =
            serde_json::from_str(r#"{ "accuracy": 1e-10 }"#).unwrap();
        assert_eq!(config.accuracy, 1e-10);
        assert_eq!(config.max_iterations, 100);
        assert_eq!(config.max_discount, 1.25);
    }
}

//! End-to-end bond pricing: bootstrap a bond curve and a deposit/swap curve
//! from September 2008 quotes, then value a zero-coupon, a fixed-rate, and a
//! floating-rate bond against them.

use approx::assert_abs_diff_eq;
use std::sync::Arc;

use fixed_income::bootstrap::{
    BondHelper, DepositRateHelper, PiecewiseYieldCurve, RateHelper, SwapRateHelper,
};
use fixed_income::core::{Compounding, Error, Handle, Rate, Real};
use fixed_income::indexes::{euribor, usd_libor, FixingStore};
use fixed_income::instruments::{Bond, BondTerms, FloatingCouponTerms, Instrument};
use fixed_income::pricingengines::DiscountingBondEngine;
use fixed_income::quotes::{Quote, QuoteBook, QuoteSource, SimpleQuote};
use fixed_income::termstructures::{YieldCurveHandle, YieldTermStructure};
use fixed_income::time::{
    ActualActualConvention, BusinessDayConvention, Calendar, Date, DateGeneration, DayCounter,
    EvaluationContext, Frequency, Period, ScheduleBuilder, Target, Thirty360Convention, TimeUnit,
    UnitedStates, UsMarket,
};
use fixed_income::PricingConfig;

fn date(y: u16, m: u8, d: u8) -> Date {
    Date::from_ymd(y, m, d).unwrap()
}

fn quote(value: Real) -> Handle<dyn Quote> {
    Handle::from_arc(Arc::new(SimpleQuote::new(value)) as Arc<dyn Quote>)
}

fn ctx() -> EvaluationContext {
    EvaluationContext::with_evaluation_date(date(2008, 9, 15))
}

const SETTLEMENT_DAYS: u32 = 3;
const CURVE_DC: DayCounter = DayCounter::ActualActual(ActualActualConvention::Isda);
const BOND_DC: DayCounter = DayCounter::ActualActual(ActualActualConvention::Bond);

fn settlement() -> Date {
    Target.advance_business_days(date(2008, 9, 15), SETTLEMENT_DAYS as i32).unwrap()
}

// ─── market data ────────────────────────────────────────────────────────────

fn deposit(rate: Rate, n: i32, unit: TimeUnit, dc: DayCounter) -> RateHelper {
    DepositRateHelper::new(
        quote(rate),
        Period::new(n, unit),
        SETTLEMENT_DAYS,
        &Target,
        BusinessDayConvention::ModifiedFollowing,
        true,
        dc,
        &ctx(),
    )
    .unwrap()
    .into()
}

/// (issue, maturity, coupon, clean price)
const TREASURIES: [((u16, u8, u8), (u16, u8, u8), Rate, Real); 5] = [
    ((2005, 3, 15), (2010, 8, 31), 0.02375, 100.390625),
    ((2005, 6, 15), (2011, 8, 31), 0.04625, 106.21875),
    ((2006, 6, 30), (2013, 8, 31), 0.03125, 100.59375),
    ((2002, 11, 15), (2018, 8, 15), 0.04, 101.6875),
    ((1987, 5, 15), (2038, 5, 15), 0.045, 102.140625),
];

fn treasury_terms(issue: Date) -> BondTerms {
    BondTerms::new(
        SETTLEMENT_DAYS,
        Arc::new(UnitedStates::new(UsMarket::GovernmentBond)),
        100.0,
    )
    .with_payment_convention(BusinessDayConvention::Unadjusted)
    .with_issue_date(issue)
}

fn treasury(issue: Date, maturity: Date, coupon: Rate) -> Bond {
    let cal = UnitedStates::new(UsMarket::GovernmentBond);
    let schedule = ScheduleBuilder::new(issue, maturity, Period::new(6, TimeUnit::Months), &cal)
        .with_convention(BusinessDayConvention::Unadjusted)
        .with_termination_convention(BusinessDayConvention::Unadjusted)
        .with_rule(DateGeneration::Backward)
        .build()
        .unwrap();
    Bond::fixed_rate(treasury_terms(issue), &schedule, &[coupon], BOND_DC).unwrap()
}

fn bond_curve_helpers() -> Vec<RateHelper> {
    let mut helpers = vec![
        deposit(0.0096, 3, TimeUnit::Months, DayCounter::Actual365Fixed),
        deposit(0.0145, 6, TimeUnit::Months, DayCounter::Actual365Fixed),
        deposit(0.0194, 1, TimeUnit::Years, DayCounter::Actual365Fixed),
    ];
    for ((iy, im, id), (my, mm, md), coupon, price) in TREASURIES {
        let bond = treasury(date(iy, im, id), date(my, mm, md), coupon);
        helpers.push(BondHelper::new(quote(price), bond, &ctx()).unwrap().into());
    }
    helpers
}

fn depo_swap_helpers() -> Vec<RateHelper> {
    let mut helpers = vec![
        deposit(0.043375, 1, TimeUnit::Weeks, DayCounter::Actual360),
        deposit(0.031875, 1, TimeUnit::Months, DayCounter::Actual360),
        deposit(0.0320375, 3, TimeUnit::Months, DayCounter::Actual360),
        deposit(0.03385, 6, TimeUnit::Months, DayCounter::Actual360),
        deposit(0.0338125, 9, TimeUnit::Months, DayCounter::Actual360),
        deposit(0.0335125, 1, TimeUnit::Years, DayCounter::Actual360),
    ];
    let index = Arc::new(euribor(Period::new(6, TimeUnit::Months)));
    for (years, rate) in [(2, 0.0295), (3, 0.0323), (5, 0.0359), (10, 0.0412), (15, 0.0433)] {
        let helper = SwapRateHelper::new(
            quote(rate),
            Period::new(years, TimeUnit::Years),
            &Target,
            Frequency::Annual,
            BusinessDayConvention::Unadjusted,
            DayCounter::Thirty360(Thirty360Convention::European),
            Arc::clone(&index),
            Period::new(1, TimeUnit::Days),
            &ctx(),
        )
        .unwrap();
        helpers.push(helper.into());
    }
    helpers
}

fn bond_curve() -> PiecewiseYieldCurve {
    let config = PricingConfig::default();
    PiecewiseYieldCurve::with_config(settlement(), bond_curve_helpers(), CURVE_DC, config.bootstrap)
        .unwrap()
}

fn depo_swap_curve() -> PiecewiseYieldCurve {
    PiecewiseYieldCurve::new(settlement(), depo_swap_helpers(), CURVE_DC).unwrap()
}

fn engine_on(curve: PiecewiseYieldCurve) -> (YieldCurveHandle, Arc<DiscountingBondEngine>) {
    let handle = YieldCurveHandle::from_arc(Arc::new(curve) as Arc<dyn YieldTermStructure>);
    let engine = Arc::new(DiscountingBondEngine::new(handle.clone()));
    (handle, engine)
}

// ─── curves ─────────────────────────────────────────────────────────────────

#[test]
fn bond_curve_reprices_its_instruments() {
    let curve = bond_curve();
    assert_eq!(curve.curve().dates()[0], date(2008, 9, 18));
    assert_eq!(curve.curve().dates().len(), 9);
    for r in curve.residuals().unwrap() {
        // Deposits in rate units, bonds in price points.
        let tolerance = if r.quote > 1.0 { 1e-8 } else { 1e-10 };
        assert!(r.error.abs() < tolerance, "{}: {}", r.instrument, r.error);
    }
}

#[test]
fn one_year_deposit_pins_its_discount_factor() {
    let curve = bond_curve();
    let pillar = date(2009, 9, 18);
    let tau = DayCounter::Actual365Fixed.year_fraction(settlement(), pillar);
    assert_abs_diff_eq!(
        curve.discount_date(pillar),
        1.0 / (1.0 + 0.0194 * tau),
        epsilon = 1e-11
    );
}

#[test]
fn depo_swap_curve_discounts_decrease() {
    let curve = depo_swap_curve();
    let discounts = curve.curve().discounts();
    assert_eq!(discounts.len(), 12);
    assert!(discounts.windows(2).all(|w| w[1] < w[0]));
    assert!(curve.max_abs_residual().unwrap() < 1e-10);
}

// ─── bonds ──────────────────────────────────────────────────────────────────

#[test]
fn quoted_treasury_reprices_on_the_bond_curve() {
    let (_, engine) = engine_on(bond_curve());
    let bond = treasury(date(2005, 3, 15), date(2010, 8, 31), 0.02375).with_pricing_engine(engine);
    let ctx = ctx();
    let clean = bond.clean_price(&ctx).unwrap();
    let accrued = bond.accrued_amount(&ctx, None).unwrap();
    assert_abs_diff_eq!(clean, 100.390625, epsilon = 1e-6);
    assert_abs_diff_eq!(
        clean + accrued,
        bond.dirty_price(&ctx).unwrap(),
        epsilon = 1e-6
    );
}

#[test]
fn zero_coupon_bond() {
    let (_, engine) = engine_on(bond_curve());
    let terms = BondTerms::new(SETTLEMENT_DAYS, Arc::new(UnitedStates::new(UsMarket::GovernmentBond)), 100.0)
        .with_redemption(116.92)
        .with_issue_date(date(2003, 8, 15));
    let bond = Bond::zero_coupon(terms, date(2013, 8, 15))
        .unwrap()
        .with_pricing_engine(engine);
    let ctx = ctx();

    let clean = bond.clean_price(&ctx).unwrap();
    assert_eq!(bond.accrued_amount(&ctx, None).unwrap(), 0.0);
    assert_abs_diff_eq!(clean, bond.dirty_price(&ctx).unwrap(), epsilon = 1e-12);
    assert!(clean > 95.0 && clean < 110.0, "clean {clean}");

    let dc = DayCounter::Actual360;
    let y = bond
        .yield_rate(&ctx, dc, Compounding::Compounded, Frequency::Annual)
        .unwrap();
    assert!(y > 0.0 && y < 0.1, "yield {y}");
    assert_abs_diff_eq!(
        bond.clean_price_from_yield(&ctx, y, dc, Compounding::Compounded, Frequency::Annual, None)
            .unwrap(),
        clean,
        epsilon = 1e-8
    );
}

fn fixed_bond() -> Bond {
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
    let terms = BondTerms::new(SETTLEMENT_DAYS, Arc::new(UnitedStates::new(UsMarket::GovernmentBond)), 100.0)
        .with_payment_convention(BusinessDayConvention::ModifiedFollowing)
        .with_issue_date(date(2007, 5, 15));
    Bond::fixed_rate(terms, &schedule, &[0.045], BOND_DC).unwrap()
}

#[test]
fn fixed_rate_bond() {
    let (_, engine) = engine_on(bond_curve());
    let config = PricingConfig::default();
    let bond = fixed_bond()
        .with_pricing_engine(engine)
        .with_yield_solver(config.yield_solver);
    let ctx = ctx();

    assert_eq!(bond.settlement_date(&ctx).unwrap(), date(2008, 9, 18));
    let accrued = bond.accrued_amount(&ctx, None).unwrap();
    assert_abs_diff_eq!(accrued, 2.25 * 126.0 / 184.0, epsilon = 1e-10);
    let clean = bond.clean_price(&ctx).unwrap();
    let dirty = bond.dirty_price(&ctx).unwrap();
    assert_abs_diff_eq!(dirty - clean, accrued, epsilon = 1e-12);
    assert!(clean > 100.0, "a 4.5% coupon above the curve prices above par: {clean}");

    let dc = DayCounter::Actual360;
    let y = bond
        .yield_rate(&ctx, dc, Compounding::Compounded, Frequency::Annual)
        .unwrap();
    assert_abs_diff_eq!(
        bond.dirty_price_from_yield(&ctx, y, dc, Compounding::Compounded, Frequency::Annual, None)
            .unwrap(),
        dirty,
        epsilon = 1e-8
    );
    assert_abs_diff_eq!(
        bond.yield_from_clean_price(&ctx, clean, dc, Compounding::Compounded, Frequency::Annual, None)
            .unwrap(),
        y,
        epsilon = 1e-10
    );
    assert_eq!(bond.next_coupon_rate(&ctx, None).unwrap(), Some(0.045));
}

fn floater(spread: Rate, forecast: YieldCurveHandle) -> Bond {
    let store = Arc::new(FixingStore::new());
    let index = usd_libor(Period::new(3, TimeUnit::Months));
    store.add(index.name(), date(2008, 7, 17), 0.0278625);
    let index = Arc::new(index.with_fixing_source(store).with_forecast_curve(forecast));

    let nyse = UnitedStates::new(UsMarket::Nyse);
    let schedule = ScheduleBuilder::new(
        date(2005, 10, 21),
        date(2010, 10, 21),
        Period::new(3, TimeUnit::Months),
        &nyse,
    )
    .with_convention(BusinessDayConvention::Unadjusted)
    .with_termination_convention(BusinessDayConvention::Unadjusted)
    .with_rule(DateGeneration::Backward)
    .end_of_month(true)
    .build()
    .unwrap();
    let terms = BondTerms::new(SETTLEMENT_DAYS, Arc::new(nyse), 100.0)
        .with_payment_convention(BusinessDayConvention::ModifiedFollowing)
        .with_issue_date(date(2005, 10, 21));
    Bond::floating_rate(
        terms,
        &schedule,
        index,
        FloatingCouponTerms::new(DayCounter::Actual360)
            .with_fixing_days(2)
            .with_spread(spread)
            .in_arrears(true),
    )
    .unwrap()
}

#[test]
fn floating_rate_bond() {
    let (_, engine) = engine_on(bond_curve());
    let (forecast, _) = engine_on(depo_swap_curve());
    let bond = floater(0.001, forecast).with_pricing_engine(engine);
    let ctx = ctx();

    // The coupon paid on 21 July fixed in arrears on 17 July.
    assert_abs_diff_eq!(
        bond.previous_coupon_rate(&ctx, None).unwrap().unwrap(),
        0.0278625 + 0.001,
        epsilon = 1e-15
    );
    let next = bond.next_coupon_rate(&ctx, None).unwrap().unwrap();
    assert!(next > 0.02 && next < 0.05, "forecast coupon {next}");
    let clean = bond.clean_price(&ctx).unwrap();
    assert!(clean > 95.0 && clean < 110.0, "clean {clean}");
    assert!(bond.accrued_amount(&ctx, None).unwrap() > 0.0);
}

#[test]
fn floater_value_increases_with_spread() {
    let curve: Arc<dyn YieldTermStructure> = Arc::new(depo_swap_curve());
    let handle = YieldCurveHandle::from_arc(curve);
    let engine = Arc::new(DiscountingBondEngine::new(handle.clone()));
    let ctx = ctx();
    let npvs: Vec<Real> = [0.0, 0.001, 0.002, 0.005]
        .iter()
        .map(|&s| {
            floater(s, handle.clone())
                .with_pricing_engine(engine.clone())
                .npv(&ctx)
                .unwrap()
        })
        .collect();
    assert!(npvs.windows(2).all(|w| w[1] > w[0]), "{npvs:?}");
}

// ─── handles and failures ───────────────────────────────────────────────────

#[test]
fn relinking_the_discount_curve_reprices() {
    let (handle, engine) = engine_on(bond_curve());
    let bond = fixed_bond().with_pricing_engine(engine);
    let ctx = ctx();
    let on_bond_curve = bond.npv(&ctx).unwrap();
    handle.link_to(Arc::new(depo_swap_curve()));
    let on_swap_curve = bond.npv(&ctx).unwrap();
    // Swap rates sit well above treasury yields.
    assert!(on_swap_curve < on_bond_curve);
}

#[test]
fn quote_book_updates_reach_the_rebuilt_curve() {
    let mut book: QuoteBook = [("DEPO-3M", 0.0096), ("DEPO-6M", 0.0145), ("DEPO-1Y", 0.0194)]
        .into_iter()
        .collect();
    let helpers: Vec<RateHelper> = [
        ("DEPO-3M", 3, TimeUnit::Months),
        ("DEPO-6M", 6, TimeUnit::Months),
        ("DEPO-1Y", 1, TimeUnit::Years),
    ]
    .into_iter()
    .map(|(id, n, unit)| {
        DepositRateHelper::new(
            book.handle(id).unwrap(),
            Period::new(n, unit),
            SETTLEMENT_DAYS,
            &Target,
            BusinessDayConvention::ModifiedFollowing,
            true,
            DayCounter::Actual365Fixed,
            &ctx(),
        )
        .unwrap()
        .into()
    })
    .collect();
    let mut curve = PiecewiseYieldCurve::new(settlement(), helpers, CURVE_DC).unwrap();
    let pillar = date(2009, 9, 18);
    let tau = DayCounter::Actual365Fixed.year_fraction(settlement(), pillar);
    assert_abs_diff_eq!(curve.discount_date(pillar), 1.0 / (1.0 + 0.0194 * tau), epsilon = 1e-11);

    book.set("DEPO-1Y", 0.025);
    assert_eq!(book.current_value("DEPO-1Y"), Ok(0.025));
    // The curve keeps its nodes until rebuilt.
    assert_abs_diff_eq!(curve.discount_date(pillar), 1.0 / (1.0 + 0.0194 * tau), epsilon = 1e-11);
    curve.rebuild().unwrap();
    assert_abs_diff_eq!(curve.discount_date(pillar), 1.0 / (1.0 + 0.025 * tau), epsilon = 1e-11);
}

#[test]
fn unpriced_bond_reports_missing_curve() {
    let bond = fixed_bond();
    assert!(matches!(bond.npv(&ctx()), Err(Error::NoPricingCurve(_))));
    let unlinked = fixed_bond()
        .with_pricing_engine(Arc::new(DiscountingBondEngine::new(YieldCurveHandle::null())));
    assert!(matches!(unlinked.clean_price(&ctx()), Err(Error::NoPricingCurve(_))));
}

#[test]
fn expiry_and_redemptions() {
    let bond = fixed_bond();
    assert!(!bond.is_expired(&ctx()).unwrap());
    assert_eq!(bond.redemptions().count(), 1);
    let later = EvaluationContext::with_evaluation_date(date(2017, 6, 1));
    assert!(bond.is_expired(&later).unwrap());
}

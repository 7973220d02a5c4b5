//! Flat-yield analytics on fixed legs: inversion, duration against a
//! finite difference, and accrual bounds.

use proptest::prelude::*;
use ql_cashflows::{
    accrued_amount, duration, npv_from_yield, yield_rate, Duration, FixedRateLeg, Leg,
    Redemption, YieldSolverConfig,
};
use ql_core::{Compounding, Rate};
use ql_time::{
    Date, DayCounter, EvaluationContext, Frequency, InterestRate, NullCalendar, Period,
    ScheduleBuilder, Thirty360Convention, TimeUnit,
};

const DC: DayCounter = DayCounter::Thirty360(Thirty360Convention::BondBasis);

fn date(y: u16, m: u8, d: u8) -> Date {
    Date::from_ymd(y, m, d).unwrap()
}

fn ctx() -> EvaluationContext {
    EvaluationContext::with_evaluation_date(date(2025, 1, 15))
}

/// Semiannual bullet on 100 from 15 January 2025 over `years`.
fn bullet(coupon: Rate, years: i32) -> Leg {
    let start = date(2025, 1, 15);
    let end = start.advance(years, TimeUnit::Years).unwrap();
    let cal = NullCalendar;
    let schedule = ScheduleBuilder::new(start, end, Period::new(6, TimeUnit::Months), &cal)
        .build()
        .unwrap();
    let mut leg = FixedRateLeg::new(&schedule, DC)
        .with_notional(100.0)
        .with_coupon_rate(coupon)
        .build()
        .unwrap();
    leg.push(Redemption::new(100.0, end).into());
    leg
}

fn semiannual(y: Rate) -> InterestRate {
    InterestRate::new(y, DC, Compounding::Compounded, Frequency::Semiannual).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn yield_inverts_the_flat_yield_price(
        coupon in 0.0f64..0.12,
        y in -0.01f64..0.15,
        years in 1i32..20,
        offset in 0i32..180,
    ) {
        let leg = bullet(coupon, years);
        let ctx = ctx();
        let settlement = date(2025, 1, 15).add_days(offset).unwrap();
        let price = npv_from_yield(&leg, &semiannual(y), &ctx, settlement).unwrap();
        let solved = yield_rate(
            &leg,
            price,
            DC,
            Compounding::Compounded,
            Frequency::Semiannual,
            &ctx,
            settlement,
            &YieldSolverConfig::default(),
        )
        .unwrap();
        prop_assert!((solved.rate() - y).abs() < 1e-8, "y {} solved {}", y, solved.rate());
    }

    #[test]
    fn modified_duration_is_the_price_slope(
        coupon in 0.0f64..0.12,
        y in 0.0f64..0.15,
        years in 1i32..20,
    ) {
        let leg = bullet(coupon, years);
        let ctx = ctx();
        let settlement = date(2025, 3, 1);
        let h = 1e-5;
        let p = npv_from_yield(&leg, &semiannual(y), &ctx, settlement).unwrap();
        let up = npv_from_yield(&leg, &semiannual(y + h), &ctx, settlement).unwrap();
        let down = npv_from_yield(&leg, &semiannual(y - h), &ctx, settlement).unwrap();
        let slope = -(up - down) / (2.0 * h) / p;
        let modified = duration(&leg, &semiannual(y), Duration::Modified, &ctx, settlement).unwrap();
        prop_assert!((modified - slope).abs() < 1e-5 * modified.max(1.0), "{} vs {}", modified, slope);
    }

    #[test]
    fn accrual_stays_within_one_coupon(
        coupon in 0.0f64..0.12,
        offset in 0i32..720,
    ) {
        let leg = bullet(coupon, 2);
        let ctx = ctx();
        let settlement = date(2025, 1, 15).add_days(offset).unwrap();
        let accrued = accrued_amount(&leg, &ctx, settlement).unwrap();
        prop_assert!(accrued >= 0.0);
        prop_assert!(accrued <= 100.0 * coupon / 2.0 + 1e-12, "{}", accrued);
    }
}

#[test]
fn nothing_accrues_on_a_coupon_date() {
    let leg = bullet(0.05, 3);
    let ctx = ctx();
    for d in [date(2025, 7, 15), date(2026, 1, 15), date(2027, 7, 15)] {
        assert_eq!(accrued_amount(&leg, &ctx, d).unwrap(), 0.0);
    }
}

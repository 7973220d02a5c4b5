//! # ql-cashflows
//!
//! Cash flows, fixed and floating coupons, leg builders, and the leg
//! analytics (NPV, yield, duration, accrued interest) bonds are priced with.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// ── Modules ───────────────────────────────────────────────────────────────────

/// The `CashFlow` sum type and redemptions.
pub mod cashflow;

/// Leg analytics.
pub mod cashflows;

/// The coupon-period view.
pub mod coupon;

/// Fixed-rate coupons, leg builder, and amortizing notionals.
pub mod fixed_rate_coupon;

/// Ibor coupons and leg builder.
pub mod floating_rate_coupon;

// ── Convenience re-exports ────────────────────────────────────────────────────

pub use cashflow::{CashFlow, Leg, Redemption};
pub use cashflows::{
    accrued_amount, bps, convexity, duration, maturity_date, next_cash_flow_date,
    next_coupon_rate, npv, npv_from_yield, previous_cash_flow_date, previous_coupon_rate,
    yield_rate, Duration, YieldSolverConfig,
};
pub use coupon::Coupon;
pub use fixed_rate_coupon::{level_payment_notionals, FixedRateCoupon, FixedRateLeg};
pub use floating_rate_coupon::{FloatingRateCoupon, FloatingRateLeg};

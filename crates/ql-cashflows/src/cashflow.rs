//! The `CashFlow` sum type.
//!
//! A cash flow is an amount of money paid at a specific date.  Coupons
//! derive their amount from a rate over an accrual period; a redemption is
//! a plain amount.  Legs are ordered vectors of cash flows.

use crate::coupon::Coupon;
use crate::fixed_rate_coupon::FixedRateCoupon;
use crate::floating_rate_coupon::FloatingRateCoupon;
use ql_core::errors::Result;
use ql_core::Real;
use ql_time::{Date, EvaluationContext};

/// A single payment of a leg.
#[derive(Debug, Clone)]
pub enum CashFlow {
    /// Fixed-rate coupon.
    Fixed(FixedRateCoupon),
    /// Index-linked coupon.
    Floating(FloatingRateCoupon),
    /// Notional repayment.
    Redemption(Redemption),
}

/// A sequence of cash flows ordered by payment date.
pub type Leg = Vec<CashFlow>;

impl CashFlow {
    /// The date on which this cash flow is paid.
    pub fn date(&self) -> Date {
        match self {
            CashFlow::Fixed(c) => c.payment_date(),
            CashFlow::Floating(c) => c.payment_date(),
            CashFlow::Redemption(r) => r.date,
        }
    }

    /// The amount paid.  Floating coupons look up or forecast their fixing
    /// as of `ctx`.
    pub fn amount(&self, ctx: &EvaluationContext) -> Result<Real> {
        match self {
            CashFlow::Fixed(c) => Ok(c.amount()),
            CashFlow::Floating(c) => c.amount(ctx),
            CashFlow::Redemption(r) => Ok(r.amount),
        }
    }

    /// Whether the flow has been paid as seen from `ref_date`.
    ///
    /// A flow falling on `ref_date` counts as paid unless
    /// `include_ref_date` is set.
    pub fn has_occurred(&self, ref_date: Date, include_ref_date: bool) -> bool {
        if include_ref_date {
            self.date() < ref_date
        } else {
            self.date() <= ref_date
        }
    }

    /// Interest accrued up to `date`; zero for redemptions.
    pub fn accrued_amount(&self, ctx: &EvaluationContext, date: Date) -> Result<Real> {
        match self.coupon() {
            Some(c) => c.accrued_amount(ctx, date),
            None => Ok(0.0),
        }
    }

    /// The coupon-period view of this flow, if it is a coupon.
    pub fn coupon(&self) -> Option<&dyn Coupon> {
        match self {
            CashFlow::Fixed(c) => Some(c),
            CashFlow::Floating(c) => Some(c),
            CashFlow::Redemption(_) => None,
        }
    }

    /// Whether this is a notional repayment.
    pub fn is_redemption(&self) -> bool {
        matches!(self, CashFlow::Redemption(_))
    }
}

impl From<FixedRateCoupon> for CashFlow {
    fn from(c: FixedRateCoupon) -> Self {
        CashFlow::Fixed(c)
    }
}

impl From<FloatingRateCoupon> for CashFlow {
    fn from(c: FloatingRateCoupon) -> Self {
        CashFlow::Floating(c)
    }
}

impl From<Redemption> for CashFlow {
    fn from(r: Redemption) -> Self {
        CashFlow::Redemption(r)
    }
}

/// A redemption (notional repayment) at a specific date.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Redemption {
    /// The redemption amount.
    pub amount: Real,
    /// The redemption date.
    pub date: Date,
}

impl Redemption {
    /// Create a new redemption cash flow.
    pub fn new(amount: Real, date: Date) -> Self {
        Self { amount, date }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn has_occurred_respects_reference_date_flag() {
        let d = Date::from_ymd(2025, 6, 15).unwrap();
        let cf = CashFlow::from(Redemption::new(100.0, d));
        let before = Date::from_ymd(2025, 6, 14).unwrap();
        let after = Date::from_ymd(2025, 6, 16).unwrap();
        assert!(!cf.has_occurred(before, false));
        assert!(cf.has_occurred(d, false));
        assert!(!cf.has_occurred(d, true));
        assert!(cf.has_occurred(after, true));
    }

    #[test]
    fn redemption() {
        let d = Date::from_ymd(2030, 1, 15).unwrap();
        let cf = CashFlow::from(Redemption::new(1000.0, d));
        let ctx = EvaluationContext::new();
        assert_eq!(cf.amount(&ctx).unwrap(), 1000.0);
        assert_eq!(cf.date(), d);
        assert!(cf.coupon().is_none());
        assert_eq!(cf.accrued_amount(&ctx, d).unwrap(), 0.0);
        assert!(cf.is_redemption());
    }
}

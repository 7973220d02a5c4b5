//! Discounting bond pricing engine.
//!
//! Values a bond by discounting its remaining cash flows on a yield curve
//! and rolling the sum forward to the settlement date:
//!
//! $$\text{NPV} = \frac{1}{P(t_s)} \sum_{i : t_i > t_s} c_i \, P(t_i)$$
//!
//! The curve is held through a relinkable handle; the engine's version is the
//! handle's, so bonds priced with it notice a relink on their next read.

use ql_cashflows::cashflows;
use ql_core::errors::{Error, Result};
use ql_instruments::{Bond, PricingEngine, PricingResults};
use ql_termstructures::YieldCurveHandle;
use ql_time::EvaluationContext;

/// Discounting bond pricing engine.
#[derive(Debug, Clone)]
pub struct DiscountingBondEngine {
    discount_curve: YieldCurveHandle,
}

impl DiscountingBondEngine {
    /// Create an engine discounting on `discount_curve`.
    pub fn new(discount_curve: YieldCurveHandle) -> Self {
        Self { discount_curve }
    }

    /// The discount-curve handle.
    pub fn discount_curve(&self) -> &YieldCurveHandle {
        &self.discount_curve
    }
}

impl PricingEngine<Bond> for DiscountingBondEngine {
    fn calculate(&self, bond: &Bond, ctx: &EvaluationContext) -> Result<PricingResults> {
        let curve = self
            .discount_curve
            .current()
            .ok_or_else(|| Error::NoPricingCurve(bond.description().to_string()))?;
        let settlement = bond.settlement_date(ctx)?;
        let npv = cashflows::npv(bond.cashflows(), &*curve, ctx, settlement)?;
        let settlement_discount = curve.discount_date(settlement);
        tracing::debug!(
            bond = bond.description(),
            %settlement,
            npv,
            "discounted bond cash flows"
        );
        Ok(PricingResults::from_npv(npv).with_result("settlement_discount", settlement_discount))
    }

    fn version(&self) -> u64 {
        self.discount_curve.version()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ql_instruments::BondTerms;
    use ql_termstructures::{FlatForward, YieldTermStructure};
    use ql_time::{Date, DayCounter, NullCalendar};
    use std::sync::Arc;

    fn date(y: u16, m: u8, d: u8) -> Date {
        Date::from_ymd(y, m, d).unwrap()
    }

    fn flat(rate: f64) -> Arc<dyn YieldTermStructure> {
        Arc::new(FlatForward::continuous(
            date(2025, 1, 15),
            rate,
            DayCounter::Actual365Fixed,
        ))
    }

    fn zero(engine: DiscountingBondEngine) -> Bond {
        Bond::zero_coupon(
            BondTerms::new(0, Arc::new(NullCalendar), 100.0),
            date(2030, 1, 15),
        )
        .unwrap()
        .with_pricing_engine(Arc::new(engine))
    }

    #[test]
    fn zero_coupon_discounts_to_settlement() {
        let bond = zero(DiscountingBondEngine::new(YieldCurveHandle::from_arc(flat(0.03))));
        let ctx = EvaluationContext::with_evaluation_date(date(2025, 1, 15));
        let t = (date(2030, 1, 15) - date(2025, 1, 15)) as f64 / 365.0;
        assert_abs_diff_eq!(
            bond.npv(&ctx).unwrap(),
            100.0 * (-0.03 * t).exp(),
            epsilon = 1e-10
        );
        assert_abs_diff_eq!(bond.dirty_price(&ctx).unwrap(), 100.0 * (-0.03 * t).exp(), epsilon = 1e-10);
    }

    #[test]
    fn later_settlement_rolls_value_forward() {
        let bond = zero(DiscountingBondEngine::new(YieldCurveHandle::from_arc(flat(0.03))));
        let ctx = EvaluationContext::with_evaluation_date(date(2027, 1, 15));
        let t = (date(2030, 1, 15) - date(2027, 1, 15)) as f64 / 365.0;
        assert_abs_diff_eq!(bond.npv(&ctx).unwrap(), 100.0 * (-0.03 * t).exp(), epsilon = 1e-10);
    }

    #[test]
    fn relinking_the_curve_reprices() {
        let handle = YieldCurveHandle::from_arc(flat(0.03));
        let bond = zero(DiscountingBondEngine::new(handle.clone()));
        let ctx = EvaluationContext::with_evaluation_date(date(2025, 1, 15));
        let before = bond.npv(&ctx).unwrap();
        handle.link_to(flat(0.05));
        assert!(bond.npv(&ctx).unwrap() < before);
    }

    #[test]
    fn empty_handle_names_the_bond() {
        let bond = zero(DiscountingBondEngine::new(YieldCurveHandle::null()))
            .with_description("test zero");
        let ctx = EvaluationContext::with_evaluation_date(date(2025, 1, 15));
        assert_eq!(
            bond.npv(&ctx),
            Err(Error::NoPricingCurve("test zero".to_string()))
        );
    }

    #[test]
    fn matured_bond_is_worth_nothing() {
        let bond = zero(DiscountingBondEngine::new(YieldCurveHandle::from_arc(flat(0.03))));
        let ctx = EvaluationContext::with_evaluation_date(date(2030, 2, 1));
        assert_eq!(bond.npv(&ctx).unwrap(), 0.0);
    }
}

//! `DiscountCurve`: a yield curve defined by discount factors at pillar
//! dates, interpolated log-linearly in time.
//!
//! Log-linear interpolation on discounts gives piecewise-constant forward
//! rates.  Beyond the last pillar the last segment's forward is held flat.
//! The curve serializes as its day counter plus the ordered list of
//! `{date, discount}` nodes, and deserialization re-runs the construction
//! checks.

use crate::term_structure::TermStructure;
use crate::yield_term_structure::YieldTermStructure;
use ql_core::errors::{Error, Result};
use ql_core::{DiscountFactor, Rate, Real, Time};
use ql_math::{close_enough, Interpolation1D, LogLinearInterpolation};
use ql_time::{Date, DayCounter};
use serde::{Deserialize, Serialize};

/// One `(date, discount factor)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurveNode {
    /// Pillar date.
    pub date: Date,
    /// Discount factor from the reference date to `date`.
    pub discount: DiscountFactor,
}

/// The persisted form of a [`DiscountCurve`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurveRecord {
    /// Day counter turning dates into interpolation times.
    pub day_counter: DayCounter,
    /// Nodes in date order, the first at the reference date.
    pub nodes: Vec<CurveNode>,
}

/// A yield curve defined by discount factors at known dates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CurveRecord", into = "CurveRecord")]
pub struct DiscountCurve {
    day_counter: DayCounter,
    dates: Vec<Date>,
    times: Vec<Time>,
    discounts: Vec<DiscountFactor>,
    interp: LogLinearInterpolation,
}

impl DiscountCurve {
    /// Build a discount-factor curve from dates and corresponding discount
    /// factors.
    ///
    /// The first date is the reference date and must carry a discount factor
    /// of 1.0.  Dates must be strictly increasing and every discount factor
    /// strictly positive and finite.
    pub fn new(
        dates: &[Date],
        discounts: &[DiscountFactor],
        day_counter: DayCounter,
    ) -> Result<Self> {
        ql_core::ensure!(
            dates.len() >= 2,
            "need at least 2 dates (reference + 1 pillar)"
        );
        ql_core::ensure!(
            dates.len() == discounts.len(),
            "dates and discounts must have the same length ({} vs {})",
            dates.len(),
            discounts.len()
        );
        ql_core::ensure!(
            close_enough(discounts[0], 1.0, 10),
            "discount factor at the reference date must be 1.0, got {}",
            discounts[0]
        );
        if let Some(w) = dates.windows(2).find(|w| w[0] >= w[1]) {
            return Err(Error::InvalidDateOrder {
                start: w[0].to_string(),
                end: w[1].to_string(),
            });
        }
        if let Some((d, df)) = dates
            .iter()
            .zip(discounts)
            .find(|(_, &df)| !(df > 0.0 && df.is_finite()))
        {
            ql_core::fail!("non-positive discount factor {df} at {d}");
        }

        let reference_date = dates[0];
        let times: Vec<Time> = dates
            .iter()
            .map(|&d| day_counter.year_fraction(reference_date, d))
            .collect();
        let interp = LogLinearInterpolation::new(&times, discounts)?;

        Ok(Self {
            day_counter,
            dates: dates.to_vec(),
            times,
            discounts: discounts.to_vec(),
            interp,
        })
    }

    /// Build a curve from persisted nodes.
    pub fn from_nodes(nodes: &[CurveNode], day_counter: DayCounter) -> Result<Self> {
        let (dates, discounts): (Vec<Date>, Vec<DiscountFactor>) =
            nodes.iter().map(|n| (n.date, n.discount)).unzip();
        Self::new(&dates, &discounts, day_counter)
    }

    /// Return the pillar dates, reference date first.
    pub fn dates(&self) -> &[Date] {
        &self.dates
    }

    /// Return the pillar times.
    pub fn times(&self) -> &[Real] {
        &self.times
    }

    /// Return the pillar discount factors.
    pub fn discounts(&self) -> &[DiscountFactor] {
        &self.discounts
    }

    /// The curve as `(date, discount)` nodes.
    pub fn nodes(&self) -> Vec<CurveNode> {
        self.dates
            .iter()
            .zip(&self.discounts)
            .map(|(&date, &discount)| CurveNode { date, discount })
            .collect()
    }
}

impl TryFrom<CurveRecord> for DiscountCurve {
    type Error = Error;

    fn try_from(record: CurveRecord) -> Result<Self> {
        Self::from_nodes(&record.nodes, record.day_counter)
    }
}

impl From<DiscountCurve> for CurveRecord {
    fn from(curve: DiscountCurve) -> Self {
        CurveRecord {
            day_counter: curve.day_counter,
            nodes: curve.nodes(),
        }
    }
}

impl TermStructure for DiscountCurve {
    fn reference_date(&self) -> Date {
        self.dates[0]
    }

    fn day_counter(&self) -> DayCounter {
        self.day_counter
    }
}

impl YieldTermStructure for DiscountCurve {
    fn discount_impl(&self, t: Time) -> DiscountFactor {
        self.interp.value(t)
    }

    fn forward_rate_impl(&self, t: Time) -> Rate {
        -self.interp.log_derivative(t)
    }
}

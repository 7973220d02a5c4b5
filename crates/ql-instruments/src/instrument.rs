//! `Instrument` and `PricingEngine` traits.
//!
//! Instruments describe what is traded; engines hold the market data and
//! turn an instrument into [`PricingResults`].  An engine reports a version
//! stamp for its market data so instruments can cache results and notice
//! when a curve handle has been relinked.

use ql_core::{errors::Result, Real};
use ql_time::{Date, EvaluationContext};
use std::collections::BTreeMap;

/// Results of pricing an instrument.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PricingResults {
    /// Net present value.
    pub npv: Real,
    /// Additional named results.
    pub additional_results: BTreeMap<String, Real>,
}

impl PricingResults {
    /// Create pricing results with just an NPV.
    pub fn from_npv(npv: Real) -> Self {
        Self {
            npv,
            additional_results: BTreeMap::new(),
        }
    }

    /// Add a named result.
    pub fn with_result(mut self, key: impl Into<String>, value: Real) -> Self {
        self.additional_results.insert(key.into(), value);
        self
    }

    /// Look up a named result.
    pub fn result(&self, key: &str) -> Option<Real> {
        self.additional_results.get(key).copied()
    }
}

/// Prices instruments of type `I`.
pub trait PricingEngine<I: ?Sized>: std::fmt::Debug + Send + Sync {
    /// Price `instrument` as seen from `ctx`.
    fn calculate(&self, instrument: &I, ctx: &EvaluationContext) -> Result<PricingResults>;

    /// Stamp of the market data the engine prices with; it changes whenever
    /// that data is relinked.
    fn version(&self) -> u64;
}

/// A financial instrument.
pub trait Instrument: std::fmt::Debug + Send + Sync {
    /// Whether every payment has been made as of `ctx`.
    fn is_expired(&self, ctx: &EvaluationContext) -> Result<bool>;

    /// The last payment date.
    fn maturity_date(&self) -> Option<Date> {
        None
    }
}

//! # ql-bootstrap
//!
//! Yield-curve bootstrapping from market instruments.
//!
//! [`RateHelper`]s turn deposit, swap, and bond quotes into constraints at
//! their pillar dates; [`build`] solves the discount factor at each pillar in
//! turn so that every helper reprices its quote, producing a
//! [`DiscountCurve`](ql_termstructures::DiscountCurve) interpolated
//! log-linearly on discount factors.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// ── Modules ───────────────────────────────────────────────────────────────────

/// Pillar-by-pillar bootstrap and the rebuildable piecewise curve.
pub mod piecewise_yield_curve;

/// Deposit, swap, and bond rate helpers.
pub mod rate_helpers;

// ── Convenience re-exports ────────────────────────────────────────────────────

pub use piecewise_yield_curve::{
    build, build_with_config, BootstrapConfig, PiecewiseYieldCurve, PillarResidual,
};
pub use rate_helpers::{BondHelper, DepositRateHelper, RateHelper, SwapRateHelper};

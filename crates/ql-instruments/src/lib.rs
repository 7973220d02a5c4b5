//! # ql-instruments
//!
//! Bonds and the `Instrument` / `PricingEngine` interface they are valued
//! through.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// ── Modules ───────────────────────────────────────────────────────────────────

/// Zero-coupon, fixed-rate, amortizing, and floating-rate bonds.
pub mod bond;

/// The instrument and pricing-engine traits.
pub mod instrument;

// ── Convenience re-exports ────────────────────────────────────────────────────

pub use bond::{Bond, BondTerms, FloatingCouponTerms};
pub use instrument::{Instrument, PricingEngine, PricingResults};

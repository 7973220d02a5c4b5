//! # ql-pricingengines
//!
//! Pricing engines.
//!
//! ## Engines
//!
//! - [`DiscountingBondEngine`]: discounted cash flows on a relinkable yield curve

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// ── Modules ───────────────────────────────────────────────────────────────────

/// Curve-discounting engine for bonds.
pub mod discounting_bond_engine;

// ── Convenience re-exports ────────────────────────────────────────────────────

pub use discounting_bond_engine::DiscountingBondEngine;

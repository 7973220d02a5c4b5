//! # ql-termstructures
//!
//! Yield curves: the `YieldTermStructure` trait, the log-linear
//! `DiscountCurve` produced by bootstrapping, and the `FlatForward` curve.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// ── Modules ───────────────────────────────────────────────────────────────────

/// `TermStructure`: base trait for all term structures.
pub mod term_structure;

/// `YieldTermStructure`: yield / interest-rate term structures.
pub mod yield_term_structure;

/// `FlatForward`: constant-rate yield curve.
pub mod flat_forward;

/// `DiscountCurve`: log-linear interpolated discount factors.
pub mod discount_curve;

// ── Convenience re-exports ────────────────────────────────────────────────────

pub use discount_curve::{CurveNode, CurveRecord, DiscountCurve};
pub use flat_forward::FlatForward;
pub use term_structure::TermStructure;
pub use yield_term_structure::{YieldCurveHandle, YieldTermStructure};

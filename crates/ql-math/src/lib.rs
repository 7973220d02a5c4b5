//! # ql-math
//!
//! Numerical building blocks for curve construction and bond analytics:
//! bracketed 1-D root finders, linear and log-linear interpolation, and
//! floating-point comparisons.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// ── Modules ───────────────────────────────────────────────────────────────────

/// Floating-point comparison utilities.
pub mod comparison;

/// 1D interpolation schemes.
pub mod interpolations;

/// 1D root-finding solvers.
pub mod solvers1d;

// ── Convenience re-exports ────────────────────────────────────────────────────

pub use comparison::close_enough;
pub use interpolations::{Interpolation1D, LinearInterpolation, LogLinearInterpolation};
pub use solvers1d::{brent, expand_bracket, newton, newton_with_brent_fallback, Root};

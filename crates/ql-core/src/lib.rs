//! # ql-core
//!
//! Foundational building blocks shared by every crate in the workspace:
//! type aliases, the error taxonomy, the `Handle` / `RelinkableHandle`
//! indirection used for quotes and curves, the compounding enum, and the
//! `LazyCache` behind cached valuations.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// ── Public modules ───────────────────────────────────────────────────────────

/// Compounding conventions.
pub mod compounding;

/// Error types and the `ensure!` / `fail!` macros.
pub mod errors;

/// Shared reference handles (`Handle<T>`, `RelinkableHandle<T>`).
pub mod handle;

/// Design patterns: lazily recomputed results.
pub mod patterns;

// ── Primitive type aliases ────────────────────────────────────────────────────

/// Floating-point type used throughout the library.
pub type Real = f64;

/// Integer type used for general-purpose counting.
pub type Integer = i32;

/// Non-negative integer type.
pub type Natural = u32;

/// Alias used for array sizes / indices.
pub type Size = usize;

/// A rate expressed as a decimal (e.g. 0.05 = 5 %).
pub type Rate = Real;

/// A spread over a reference rate.
pub type Spread = Real;

/// A discount factor, normally in (0, 1].
pub type DiscountFactor = Real;

/// A price or value.
pub type Price = Real;

/// A time measurement in years.
pub type Time = Real;

// ── Re-exports for convenience ────────────────────────────────────────────────

pub use compounding::Compounding;
pub use errors::{Error, Result};
pub use handle::{Handle, RelinkableHandle};
pub use patterns::lazy_object::LazyCache;

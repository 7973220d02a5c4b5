//! # ql-indexes
//!
//! Interest-rate indexes: historical fixings and forecasting off a
//! relinkable curve.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// ── Modules ───────────────────────────────────────────────────────────────────

/// Historical fixing storage.
pub mod fixing;

/// `IborIndex`: interbank offered-rate indexes (Euribor, LIBOR, etc.).
pub mod ibor_index;

/// Concrete IBOR index definitions.
pub mod ibor;

// ── Convenience re-exports ────────────────────────────────────────────────────

pub use fixing::{FixingSource, FixingStore};
pub use ibor::{euribor, usd_libor};
pub use ibor_index::IborIndex;

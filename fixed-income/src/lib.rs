//! # fixed-income
//!
//! Values fixed-income instruments from market quotes: bootstraps a
//! discount curve from deposits, swaps, and bonds, then prices bonds against
//! it (NPV, clean and dirty price, accrued interest, yield).
//!
//! This crate is a **façade** that re-exports the workspace crates and adds
//! the pieces an application needs around them: a TOML pricing configuration
//! and a logging bootstrap.
//!
//! ## Quick start
//!
//! ```rust
//! use std::sync::Arc;
//! use fixed_income::instruments::{Bond, BondTerms};
//! use fixed_income::pricingengines::DiscountingBondEngine;
//! use fixed_income::termstructures::{FlatForward, YieldCurveHandle};
//! use fixed_income::time::{Date, DayCounter, EvaluationContext, Target};
//!
//! let today = Date::from_ymd(2025, 1, 15).unwrap();
//! let ctx = EvaluationContext::with_evaluation_date(today);
//! let curve = YieldCurveHandle::from_arc(Arc::new(FlatForward::continuous(
//!     today,
//!     0.03,
//!     DayCounter::Actual365Fixed,
//! )));
//! let bond = Bond::zero_coupon(
//!     BondTerms::new(0, Arc::new(Target), 100.0),
//!     Date::from_ymd(2030, 1, 15).unwrap(),
//! )
//! .unwrap()
//! .with_pricing_engine(Arc::new(DiscountingBondEngine::new(curve)));
//! assert!(bond.clean_price(&ctx).unwrap() < 100.0);
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// ── Modules ───────────────────────────────────────────────────────────────────

/// TOML pricing configuration.
pub mod config;

/// Logging bootstrap for applications and tests.
pub mod logging;

// ── Workspace re-exports ──────────────────────────────────────────────────────

/// Core types, aliases, and error definitions.
pub use ql_core as core;

/// Dates, calendars, day counters, interest rates, and schedules.
pub use ql_time as time;

/// Root finders, interpolation, and comparisons.
pub use ql_math as math;

/// Market quotes.
pub use ql_quotes as quotes;

/// Ibor indexes and fixing stores.
pub use ql_indexes as indexes;

/// Yield term structures.
pub use ql_termstructures as termstructures;

/// Cash flows, coupons, and leg analytics.
pub use ql_cashflows as cashflows;

/// Bonds and the pricing-engine interface.
pub use ql_instruments as instruments;

/// Pricing engines.
pub use ql_pricingengines as pricingengines;

/// Rate helpers and the curve bootstrapper.
pub use ql_bootstrap as bootstrap;

pub use config::{ConfigError, PricingConfig};
pub use logging::init_logging;

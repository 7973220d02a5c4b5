//! # ql-quotes
//!
//! Market quotes read through handles, and named quote sources.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

/// `Quote` trait and concrete implementations.
pub mod quote;

/// Quote lookup by instrument identifier.
pub mod source;

pub use quote::{Quote, SimpleQuote};
pub use source::{QuoteBook, QuoteSource};

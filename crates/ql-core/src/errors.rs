//! Error types for the valuation workspace.
//!
//! Every fallible operation returns [`Result`], whose error side is the
//! single `thiserror`-derived [`Error`] enum below.  Construction-time
//! validation failures, quote problems, and root-finder convergence failures
//! each have their own variant so that callers can match on them; the
//! `ensure!` and `fail!` macros cover generic preconditions.

use thiserror::Error;

/// The top-level error type.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// General runtime error (raised by `fail!`).
    #[error("{0}")]
    Runtime(String),

    /// Precondition violated (raised by `ensure!`).
    #[error("precondition not satisfied: {0}")]
    Precondition(String),

    /// A date could not be constructed or moved out of the supported range.
    #[error("date error: {0}")]
    Date(String),

    /// Invalid argument.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Two dates were supplied in the wrong order.
    #[error("invalid date order: {end} is before {start}")]
    InvalidDateOrder {
        /// The date expected to come first.
        start: String,
        /// The date expected to come second.
        end: String,
    },

    /// A compounding rule was given a frequency it cannot work with.
    #[error("invalid frequency: {0}")]
    InvalidFrequency(String),

    /// Schedule inputs do not describe a non-empty, forward-running range.
    #[error("invalid schedule range: {0}")]
    InvalidScheduleRange(String),

    /// A market quote is missing, non-finite, or outside its valid domain.
    #[error("ill-set quote for {instrument}: {value}")]
    IllsetQuote {
        /// Description of the instrument reading the quote.
        instrument: String,
        /// The offending value (NaN when the quote is empty).
        value: f64,
    },

    /// Rate-helper pillars are duplicated or not strictly increasing.
    #[error("out-of-order pillars: {0}")]
    OutOfOrderPillars(String),

    /// The bootstrapper could not solve a pillar.
    #[error(
        "bootstrap failed at pillar {pillar} ({date}, {instrument}) \
         within [{lower}, {upper}]: {reason}"
    )]
    BootstrapNonConvergence {
        /// One-based index of the failing pillar.
        pillar: usize,
        /// Pillar date.
        date: String,
        /// Description of the helper defining the pillar.
        instrument: String,
        /// Lower end of the last discount-factor bracket tried.
        lower: f64,
        /// Upper end of the last discount-factor bracket tried.
        upper: f64,
        /// Underlying solver failure.
        reason: String,
    },

    /// The price-to-yield inversion did not converge.
    #[error(
        "yield solver failed for {instrument} (target {target}) \
         within [{lower}, {upper}]: {reason}"
    )]
    YieldSolverNonConvergence {
        /// Description of the priced instrument.
        instrument: String,
        /// Target dirty price (or NPV) the solver tried to reproduce.
        target: f64,
        /// Lower end of the rate bracket.
        lower: f64,
        /// Upper end of the rate bracket.
        upper: f64,
        /// Underlying solver failure.
        reason: String,
    },

    /// Pricing was requested before a discount curve was attached.
    #[error("no pricing curve attached to {0}")]
    NoPricingCurve(String),

    /// A past index fixing is not in the fixing store.
    #[error("missing {index} fixing for {date}")]
    MissingFixing {
        /// Index name.
        index: String,
        /// Fixing date.
        date: String,
    },

    /// The evaluation context was used before its date was set.
    #[error("evaluation date not set")]
    EvaluationDateNotSet,

    /// A bracketed solver was given an interval without a sign change.
    #[error("root not bracketed: f({lower}) = {f_lower}, f({upper}) = {f_upper}")]
    NotBracketed {
        /// Lower end of the interval.
        lower: f64,
        /// Upper end of the interval.
        upper: f64,
        /// Function value at `lower`.
        f_lower: f64,
        /// Function value at `upper`.
        f_upper: f64,
    },

    /// A solver ran out of its iteration budget.
    #[error("maximum number of iterations ({iterations}) exceeded, last bracket [{lower}, {upper}]")]
    MaxIterations {
        /// The iteration budget.
        iterations: u32,
        /// Lower end of the last bracket.
        lower: f64,
        /// Upper end of the last bracket.
        upper: f64,
    },
}

/// Shorthand `Result` type used throughout the workspace.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Return early with [`Error::Precondition`] unless `$cond` holds.
///
/// # Example
/// ```
/// use ql_core::{ensure, errors::Error};
/// fn positive(x: f64) -> ql_core::errors::Result<f64> {
///     ensure!(x > 0.0, "x must be positive, got {x}");
///     Ok(x)
/// }
/// assert!(positive(1.0).is_ok());
/// assert!(matches!(positive(-1.0), Err(Error::Precondition(_))));
/// ```
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $($msg:tt)*) => {
        if !$cond {
            return Err($crate::errors::Error::Precondition(
                format!($($msg)*)
            ));
        }
    };
}

/// Return early with [`Error::Runtime`].
///
/// # Example
/// ```
/// use ql_core::{fail, errors::Error};
/// fn always_err() -> ql_core::errors::Result<()> {
///     fail!("something went wrong");
/// }
/// assert_eq!(always_err(), Err(Error::Runtime("something went wrong".into())));
/// ```
#[macro_export]
macro_rules! fail {
    ($($msg:tt)*) => {
        return Err($crate::errors::Error::Runtime(format!($($msg)*)))
    };
}

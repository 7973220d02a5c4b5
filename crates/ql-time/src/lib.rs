//! # ql-time
//!
//! Dates, calendars, business-day conventions, day counters, interest rates,
//! coupon schedules, and the evaluation context every valuation runs in.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// ── Modules ───────────────────────────────────────────────────────────────────

/// Business-day adjustment conventions.
pub mod business_day_convention;

/// Calendar trait and the calendars without holiday rules.
pub mod calendar;

/// Market calendars (TARGET, United States).
pub mod calendars;

/// Explicit evaluation context.
pub mod context;

/// `Date` and `Weekday`.
pub mod date;

/// Day-count conventions.
pub mod day_counter;

/// Payment / compounding frequency.
pub mod frequency;

/// Interest rates with compounding and day-count conventions.
pub mod interest_rate;

/// `Period` and `TimeUnit`.
pub mod period;

/// Coupon schedules and their generation policy.
pub mod schedule;

// ── Convenience re-exports ────────────────────────────────────────────────────

pub use business_day_convention::BusinessDayConvention;
pub use calendar::{Calendar, NullCalendar, WeekendsOnly};
pub use calendars::{Target, UnitedStates, UsMarket};
pub use context::EvaluationContext;
pub use date::{Date, Weekday};
pub use day_counter::{ActualActualConvention, DayCounter, Thirty360Convention};
pub use frequency::Frequency;
pub use interest_rate::InterestRate;
pub use period::{Period, TimeUnit};
pub use schedule::{
    DateGeneration, EndOfMonthRule, Schedule, ScheduleBuilder, SchedulePolicy, Stub, StubKind,
    StubPosition,
};

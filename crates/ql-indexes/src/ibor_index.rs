//! `IborIndex`: interbank offered-rate index.
//!
//! An index knows how to turn a fixing date into its value and maturity
//! dates, where to find historical fixings, and which curve forecasts the
//! future ones.  The forecast curve is held through a relinkable handle so
//! the same index can be re-pointed at a freshly bootstrapped curve.

use crate::fixing::{FixingSource, FixingStore};
use ql_core::errors::{Error, Result};
use ql_core::{Rate, Real};
use ql_termstructures::{YieldCurveHandle, YieldTermStructure};
use ql_time::{BusinessDayConvention, Calendar, Date, DayCounter, EvaluationContext, Period};
use std::sync::Arc;

/// An Interbank Offered Rate index (e.g. Euribor, USD LIBOR).
#[derive(Debug, Clone)]
pub struct IborIndex {
    name: String,
    tenor: Period,
    fixing_days: u32,
    calendar: Arc<dyn Calendar>,
    convention: BusinessDayConvention,
    end_of_month: bool,
    day_counter: DayCounter,
    forecast: YieldCurveHandle,
    fixings: Arc<dyn FixingSource>,
}

impl IborIndex {
    /// Create a new IBOR index with an empty forecast handle and its own
    /// fixing store.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: impl Into<String>,
        tenor: Period,
        fixing_days: u32,
        calendar: Arc<dyn Calendar>,
        convention: BusinessDayConvention,
        end_of_month: bool,
        day_counter: DayCounter,
    ) -> Self {
        Self {
            name: name.into(),
            tenor,
            fixing_days,
            calendar,
            convention,
            end_of_month,
            day_counter,
            forecast: YieldCurveHandle::null(),
            fixings: Arc::new(FixingStore::new()),
        }
    }

    /// Forecast future fixings off `curve`.  Relinking the handle later is
    /// seen by this index.
    pub fn with_forecast_curve(mut self, curve: YieldCurveHandle) -> Self {
        self.forecast = curve;
        self
    }

    /// Read historical fixings from `source`.
    pub fn with_fixing_source(mut self, source: Arc<dyn FixingSource>) -> Self {
        self.fixings = source;
        self
    }

    /// Index name, also the key into the fixing source.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The index tenor.
    pub fn tenor(&self) -> Period {
        self.tenor
    }

    /// Business days between fixing and value date.
    pub fn fixing_days(&self) -> u32 {
        self.fixing_days
    }

    /// Fixing calendar.
    pub fn fixing_calendar(&self) -> &dyn Calendar {
        &*self.calendar
    }

    /// Accrual day counter.
    pub fn day_counter(&self) -> DayCounter {
        self.day_counter
    }

    /// Convention for rolling the maturity date.
    pub fn business_day_convention(&self) -> BusinessDayConvention {
        self.convention
    }

    /// Whether maturities roll month end to month end.
    pub fn end_of_month(&self) -> bool {
        self.end_of_month
    }

    /// The forecast curve handle.
    pub fn forecast_curve(&self) -> &YieldCurveHandle {
        &self.forecast
    }

    /// Versions of the forecast link and the fixing source.  Values derived
    /// from this index's fixings are stale once either moves.
    pub fn market_version(&self) -> (u64, u64) {
        (self.forecast.version(), self.fixings.version())
    }

    /// Whether `date` is a valid fixing date.
    pub fn is_valid_fixing_date(&self, date: Date) -> bool {
        self.calendar.is_business_day(date)
    }

    /// Fixing date for an accrual starting on `value_date`.
    pub fn fixing_date(&self, value_date: Date) -> Result<Date> {
        self.calendar
            .advance_business_days(value_date, -(self.fixing_days as i32))
    }

    /// Value date for a fixing on `fixing_date`.
    pub fn value_date(&self, fixing_date: Date) -> Result<Date> {
        self.calendar
            .advance_business_days(fixing_date, self.fixing_days as i32)
    }

    /// Maturity of the deposit starting on `value_date`.
    pub fn maturity_date(&self, value_date: Date) -> Result<Date> {
        self.calendar
            .advance(value_date, self.tenor, self.convention, self.end_of_month)
    }

    /// The fixing on `fixing_date` as seen from `ctx`.
    ///
    /// Past dates come from the fixing source and fail with
    /// [`Error::MissingFixing`] when absent.  A fixing due today uses the
    /// stored value if there is one and the forecast otherwise.  Future
    /// dates are always forecast.
    pub fn fixing(&self, ctx: &EvaluationContext, fixing_date: Date) -> Result<Rate> {
        let today = ctx.evaluation_date()?;
        if fixing_date < today {
            tracing::debug!(index = %self.name, %fixing_date, "historical fixing");
            return self.fixings.fixing_at(&self.name, fixing_date);
        }
        if fixing_date == today {
            if let Some(value) = self.fixings.get(&self.name, fixing_date) {
                tracing::debug!(index = %self.name, %fixing_date, "today's fixing from store");
                return Ok(value);
            }
        }
        tracing::debug!(index = %self.name, %fixing_date, "forecast fixing");
        self.forecast_fixing(fixing_date)
    }

    /// Forward rate implied by the forecast curve for `fixing_date`:
    /// `(P(value) / P(maturity) - 1) / τ`.
    pub fn forecast_fixing(&self, fixing_date: Date) -> Result<Rate> {
        let curve = self
            .forecast
            .current()
            .ok_or_else(|| Error::NoPricingCurve(format!("{} forecast", self.name)))?;
        let start = self.value_date(fixing_date)?;
        let end = self.maturity_date(start)?;
        Ok(Self::simple_forward(&*curve, self.day_counter, start, end))
    }

    /// Simple forward rate on `curve` between two dates.
    pub fn simple_forward(
        curve: &dyn YieldTermStructure,
        day_counter: DayCounter,
        start: Date,
        end: Date,
    ) -> Rate {
        let tau: Real = day_counter.year_fraction(start, end);
        (curve.discount_date(start) / curve.discount_date(end) - 1.0) / tau
    }
}

//! Floating-rate coupons and Ibor leg builders.
//!
//! The coupon rate is `gearing × fixing + spread`, clamped to the optional
//! floor and cap.  The fixing is taken `fixing_days` business days before
//! the accrual start, or before the accrual end for coupons fixed in
//! arrears, and resolved through [`IborIndex::fixing`]: historical dates
//! read the fixing source, current and future dates are forecast.

use crate::cashflow::{CashFlow, Leg};
use crate::coupon::{nth_or_last, reference_period, Coupon};
use ql_core::errors::{Error, Result};
use ql_core::{ensure, Rate, Real, Spread};
use ql_indexes::IborIndex;
use ql_time::{
    BusinessDayConvention, Calendar, Date, DayCounter, EvaluationContext, NullCalendar, Schedule,
};
use std::sync::Arc;

// ────────────────────────────────────────────────────────────────────────────
// FloatingRateCoupon
// ────────────────────────────────────────────────────────────────────────────

/// A coupon paying an Ibor fixing times a gearing plus a spread.
#[derive(Debug, Clone)]
pub struct FloatingRateCoupon {
    payment_date: Date,
    nominal: Real,
    accrual_start: Date,
    accrual_end: Date,
    ref_start: Date,
    ref_end: Date,
    day_counter: DayCounter,
    index: Arc<IborIndex>,
    fixing_days: u32,
    in_arrears: bool,
    gearing: Real,
    spread: Spread,
    cap: Option<Rate>,
    floor: Option<Rate>,
}

impl FloatingRateCoupon {
    /// Create a coupon paying the plain index fixing, accruing with the
    /// index day counter and fixing in advance.
    ///
    /// # Errors
    /// [`Error::InvalidDateOrder`] unless `accrual_start < accrual_end`.
    pub fn new(
        payment_date: Date,
        nominal: Real,
        accrual_start: Date,
        accrual_end: Date,
        index: Arc<IborIndex>,
    ) -> Result<Self> {
        if accrual_end <= accrual_start {
            return Err(Error::InvalidDateOrder {
                start: accrual_start.to_string(),
                end: accrual_end.to_string(),
            });
        }
        Ok(Self {
            payment_date,
            nominal,
            accrual_start,
            accrual_end,
            ref_start: accrual_start,
            ref_end: accrual_end,
            day_counter: index.day_counter(),
            fixing_days: index.fixing_days(),
            index,
            in_arrears: false,
            gearing: 1.0,
            spread: 0.0,
            cap: None,
            floor: None,
        })
    }

    /// Reference period for an irregular accrual period.
    pub fn with_reference_period(mut self, start: Date, end: Date) -> Self {
        self.ref_start = start;
        self.ref_end = end;
        self
    }

    /// Accrual day counter.
    pub fn with_day_counter(mut self, day_counter: DayCounter) -> Self {
        self.day_counter = day_counter;
        self
    }

    /// Business days between fixing and the start (or end) of accrual.
    pub fn with_fixing_days(mut self, fixing_days: u32) -> Self {
        self.fixing_days = fixing_days;
        self
    }

    /// Fix at the end of the accrual period instead of the start.
    pub fn in_arrears(mut self, in_arrears: bool) -> Self {
        self.in_arrears = in_arrears;
        self
    }

    /// Multiplier on the index fixing.
    pub fn with_gearing(mut self, gearing: Real) -> Self {
        self.gearing = gearing;
        self
    }

    /// Spread over the geared fixing.
    pub fn with_spread(mut self, spread: Spread) -> Self {
        self.spread = spread;
        self
    }

    /// Upper bound on the coupon rate.
    pub fn with_cap(mut self, cap: Option<Rate>) -> Self {
        self.cap = cap;
        self
    }

    /// Lower bound on the coupon rate.
    pub fn with_floor(mut self, floor: Option<Rate>) -> Self {
        self.floor = floor;
        self
    }

    /// The index this coupon fixes on.
    pub fn index(&self) -> &IborIndex {
        &self.index
    }

    /// Gearing.
    pub fn gearing(&self) -> Real {
        self.gearing
    }

    /// Spread.
    pub fn spread(&self) -> Spread {
        self.spread
    }

    /// Cap, if any.
    pub fn cap(&self) -> Option<Rate> {
        self.cap
    }

    /// Floor, if any.
    pub fn floor(&self) -> Option<Rate> {
        self.floor
    }

    /// Whether the coupon fixes in arrears.
    pub fn is_in_arrears(&self) -> bool {
        self.in_arrears
    }

    /// Fixing days.
    pub fn fixing_days(&self) -> u32 {
        self.fixing_days
    }

    /// The date the index is observed.
    pub fn fixing_date(&self) -> Result<Date> {
        let anchor = if self.in_arrears {
            self.accrual_end
        } else {
            self.accrual_start
        };
        self.index
            .fixing_calendar()
            .advance_business_days(anchor, -(self.fixing_days as i32))
    }

    /// The raw index fixing as seen from `ctx`.
    pub fn index_fixing(&self, ctx: &EvaluationContext) -> Result<Rate> {
        self.index.fixing(ctx, self.fixing_date()?)
    }

    /// The amount paid.
    pub fn amount(&self, ctx: &EvaluationContext) -> Result<Real> {
        Ok(self.nominal * self.rate(ctx)? * self.accrual_period())
    }
}

impl Coupon for FloatingRateCoupon {
    fn payment_date(&self) -> Date {
        self.payment_date
    }

    fn nominal(&self) -> Real {
        self.nominal
    }

    fn accrual_start_date(&self) -> Date {
        self.accrual_start
    }

    fn accrual_end_date(&self) -> Date {
        self.accrual_end
    }

    fn reference_period_start(&self) -> Date {
        self.ref_start
    }

    fn reference_period_end(&self) -> Date {
        self.ref_end
    }

    fn day_counter(&self) -> DayCounter {
        self.day_counter
    }

    fn rate(&self, ctx: &EvaluationContext) -> Result<Rate> {
        let mut rate = self.gearing * self.index_fixing(ctx)? + self.spread;
        if let Some(floor) = self.floor {
            rate = rate.max(floor);
        }
        if let Some(cap) = self.cap {
            rate = rate.min(cap);
        }
        Ok(rate)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Floating-rate leg builder
// ────────────────────────────────────────────────────────────────────────────

/// Build a leg of Ibor coupons from a schedule.
///
/// Per-period vectors extend their last value; empty cap or floor vectors
/// leave the coupons unbounded on that side.
#[derive(Debug, Clone)]
pub struct FloatingRateLeg<'a> {
    schedule: &'a Schedule,
    index: Arc<IborIndex>,
    notionals: Vec<Real>,
    day_counter: Option<DayCounter>,
    fixing_days: Option<u32>,
    gearings: Vec<Real>,
    spreads: Vec<Spread>,
    caps: Vec<Rate>,
    floors: Vec<Rate>,
    in_arrears: bool,
    payment_calendar: Arc<dyn Calendar>,
    payment_convention: BusinessDayConvention,
}

impl<'a> FloatingRateLeg<'a> {
    /// Start a leg over `schedule` fixing on `index`.
    pub fn new(schedule: &'a Schedule, index: Arc<IborIndex>) -> Self {
        Self {
            schedule,
            index,
            notionals: Vec::new(),
            day_counter: None,
            fixing_days: None,
            gearings: Vec::new(),
            spreads: Vec::new(),
            caps: Vec::new(),
            floors: Vec::new(),
            in_arrears: false,
            payment_calendar: Arc::new(NullCalendar),
            payment_convention: BusinessDayConvention::Unadjusted,
        }
    }

    /// A single notional for every period.
    pub fn with_notional(self, notional: Real) -> Self {
        self.with_notionals(vec![notional])
    }

    /// Notionals per period.
    pub fn with_notionals(mut self, notionals: Vec<Real>) -> Self {
        self.notionals = notionals;
        self
    }

    /// Accrual day counter; the index day counter by default.
    pub fn with_day_counter(mut self, day_counter: DayCounter) -> Self {
        self.day_counter = Some(day_counter);
        self
    }

    /// Fixing days; the index fixing days by default.
    pub fn with_fixing_days(mut self, fixing_days: u32) -> Self {
        self.fixing_days = Some(fixing_days);
        self
    }

    /// A single gearing for every period.
    pub fn with_gearing(mut self, gearing: Real) -> Self {
        self.gearings = vec![gearing];
        self
    }

    /// Gearings per period.
    pub fn with_gearings(mut self, gearings: Vec<Real>) -> Self {
        self.gearings = gearings;
        self
    }

    /// A single spread for every period.
    pub fn with_spread(mut self, spread: Spread) -> Self {
        self.spreads = vec![spread];
        self
    }

    /// Spreads per period.
    pub fn with_spreads(mut self, spreads: Vec<Spread>) -> Self {
        self.spreads = spreads;
        self
    }

    /// Caps per period.
    pub fn with_caps(mut self, caps: Vec<Rate>) -> Self {
        self.caps = caps;
        self
    }

    /// Floors per period.
    pub fn with_floors(mut self, floors: Vec<Rate>) -> Self {
        self.floors = floors;
        self
    }

    /// Fix every coupon in arrears.
    pub fn in_arrears(mut self, in_arrears: bool) -> Self {
        self.in_arrears = in_arrears;
        self
    }

    /// Calendar used to roll payment dates.
    pub fn with_payment_calendar(mut self, calendar: Arc<dyn Calendar>) -> Self {
        self.payment_calendar = calendar;
        self
    }

    /// Convention used to roll payment dates.
    pub fn with_payment_adjustment(mut self, convention: BusinessDayConvention) -> Self {
        self.payment_convention = convention;
        self
    }

    /// Build the coupons.
    ///
    /// # Errors
    /// When notionals are missing, a gearing is zero, or a floor exceeds
    /// its cap.
    pub fn build(self) -> Result<Leg> {
        ensure!(!self.notionals.is_empty(), "no notional given for floating-rate leg");
        let n = self.schedule.len().saturating_sub(1);
        let day_counter = self.day_counter.unwrap_or_else(|| self.index.day_counter());
        let fixing_days = self.fixing_days.unwrap_or_else(|| self.index.fixing_days());
        let mut leg = Leg::with_capacity(n);
        for (i, (start, end)) in self.schedule.periods().enumerate() {
            let (ref_start, ref_end) = reference_period(self.schedule, i, n, start, end)?;
            let payment = self.payment_calendar.adjust(end, self.payment_convention)?;
            let gearing = nth_or_last(&self.gearings, i).unwrap_or(1.0);
            ensure!(gearing != 0.0, "null gearing in period {i} of floating-rate leg");
            let cap = nth_or_last(&self.caps, i);
            let floor = nth_or_last(&self.floors, i);
            if let (Some(cap), Some(floor)) = (cap, floor) {
                ensure!(floor <= cap, "floor ({floor}) above cap ({cap}) in period {i}");
            }
            let coupon = FloatingRateCoupon::new(
                payment,
                nth_or_last(&self.notionals, i).unwrap_or_default(),
                start,
                end,
                Arc::clone(&self.index),
            )?
            .with_reference_period(ref_start, ref_end)
            .with_day_counter(day_counter)
            .with_fixing_days(fixing_days)
            .in_arrears(self.in_arrears)
            .with_gearing(gearing)
            .with_spread(nth_or_last(&self.spreads, i).unwrap_or(0.0))
            .with_cap(cap)
            .with_floor(floor);
            leg.push(CashFlow::Floating(coupon));
        }
        Ok(leg)
    }
}

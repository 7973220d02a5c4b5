//! Day-count conventions.
//!
//! A [`DayCounter`] turns a pair of dates into a year fraction.  It is a
//! plain `Copy` value: every convention is a pure function of its inputs, so
//! coupons and curves carry it by value.
//!
//! Year fractions are signed: swapping the dates flips the sign.  Use
//! [`DayCounter::checked_year_fraction`] where the caller requires the dates
//! in order.

use crate::date::{civil_from_serial, is_leap_year, serial_from_civil, shift_serial_by_months, Date};
use ql_core::errors::{Error, Result};
use ql_core::Time;
use serde::{Deserialize, Serialize};

/// Month-end rules for the 30/360 family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Thirty360Convention {
    /// US (NASD) rule, including the end-of-February adjustments.
    Usa,
    /// Bond basis (ISDA 30/360).
    BondBasis,
    /// 30E/360, Eurobond basis.
    European,
}

/// Variants of Actual/Actual.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActualActualConvention {
    /// Split the interval at year boundaries and divide each part by the
    /// length of its year.
    Isda,
    /// ISMA / bond basis: the fraction of the coupon reference period,
    /// scaled by the length of that period in years.
    Bond,
}

/// A day-count convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DayCounter {
    /// Actual days / 360.
    Actual360,
    /// Actual days / 365.
    Actual365Fixed,
    /// Actual/Actual.
    ActualActual(ActualActualConvention),
    /// 30/360.
    Thirty360(Thirty360Convention),
}

impl DayCounter {
    /// Human-readable name of the convention.
    pub fn name(&self) -> &'static str {
        match self {
            DayCounter::Actual360 => "Actual/360",
            DayCounter::Actual365Fixed => "Actual/365 (Fixed)",
            DayCounter::ActualActual(ActualActualConvention::Isda) => "Actual/Actual (ISDA)",
            DayCounter::ActualActual(ActualActualConvention::Bond) => "Actual/Actual (ISMA)",
            DayCounter::Thirty360(Thirty360Convention::Usa) => "30/360 (US)",
            DayCounter::Thirty360(Thirty360Convention::BondBasis) => "30/360 (Bond Basis)",
            DayCounter::Thirty360(Thirty360Convention::European) => "30E/360 (Eurobond Basis)",
        }
    }

    /// Number of days between `d1` and `d2` under this convention.
    pub fn day_count(&self, d1: Date, d2: Date) -> i32 {
        match self {
            DayCounter::Thirty360(convention) => thirty_360_days(*convention, d1, d2),
            _ => d2 - d1,
        }
    }

    /// Year fraction between `d1` and `d2` without reference period.
    pub fn year_fraction(&self, d1: Date, d2: Date) -> Time {
        self.year_fraction_with_reference(d1, d2, None, None)
    }

    /// Year fraction between `d1` and `d2`.
    ///
    /// The reference period is only used by Actual/Actual (Bond), where it
    /// is the (possibly notional) regular coupon period containing the
    /// accrual interval.
    pub fn year_fraction_with_reference(
        &self,
        d1: Date,
        d2: Date,
        ref_start: Option<Date>,
        ref_end: Option<Date>,
    ) -> Time {
        match self {
            DayCounter::Actual360 => (d2 - d1) as Time / 360.0,
            DayCounter::Actual365Fixed => (d2 - d1) as Time / 365.0,
            DayCounter::Thirty360(convention) => {
                thirty_360_days(*convention, d1, d2) as Time / 360.0
            }
            DayCounter::ActualActual(ActualActualConvention::Isda) => {
                isda_fraction(d1.serial(), d2.serial())
            }
            DayCounter::ActualActual(ActualActualConvention::Bond) => isma_fraction(
                d1.serial(),
                d2.serial(),
                ref_start.map(|d| d.serial()),
                ref_end.map(|d| d.serial()),
            ),
        }
    }

    /// Year fraction that fails with [`Error::InvalidDateOrder`] when
    /// `d2 < d1`.
    pub fn checked_year_fraction(
        &self,
        d1: Date,
        d2: Date,
        ref_start: Option<Date>,
        ref_end: Option<Date>,
    ) -> Result<Time> {
        if d2 < d1 {
            return Err(Error::InvalidDateOrder {
                start: d1.to_string(),
                end: d2.to_string(),
            });
        }
        Ok(self.year_fraction_with_reference(d1, d2, ref_start, ref_end))
    }
}

impl std::fmt::Display for DayCounter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// ── 30/360 ────────────────────────────────────────────────────────────────────

fn is_last_of_february(d: Date) -> bool {
    d.month() == 2 && d.is_end_of_month()
}

fn thirty_360_days(convention: Thirty360Convention, d1: Date, d2: Date) -> i32 {
    let (y1, m1) = (d1.year() as i32, d1.month() as i32);
    let (y2, m2) = (d2.year() as i32, d2.month() as i32);
    let mut dd1 = d1.day_of_month() as i32;
    let mut dd2 = d2.day_of_month() as i32;
    match convention {
        Thirty360Convention::Usa => {
            if is_last_of_february(d1) {
                if is_last_of_february(d2) {
                    dd2 = 30;
                }
                dd1 = 30;
            }
            if dd2 == 31 && dd1 >= 30 {
                dd2 = 30;
            }
            if dd1 == 31 {
                dd1 = 30;
            }
        }
        Thirty360Convention::BondBasis => {
            if dd1 == 31 {
                dd1 = 30;
            }
            if dd2 == 31 && dd1 == 30 {
                dd2 = 30;
            }
        }
        Thirty360Convention::European => {
            dd1 = dd1.min(30);
            dd2 = dd2.min(30);
        }
    }
    360 * (y2 - y1) + 30 * (m2 - m1) + (dd2 - dd1)
}

// ── Actual/Actual ─────────────────────────────────────────────────────────────

fn days_in_year(year: i32) -> f64 {
    if is_leap_year(year as u16) {
        366.0
    } else {
        365.0
    }
}

fn isda_fraction(d1: i32, d2: i32) -> Time {
    if d1 == d2 {
        return 0.0;
    }
    if d1 > d2 {
        return -isda_fraction(d2, d1);
    }
    let y1 = civil_from_serial(d1).0;
    let y2 = civil_from_serial(d2).0;
    let mut sum = (y2 - y1 - 1) as Time;
    sum += (serial_from_civil(y1 + 1, 1, 1) - d1) as Time / days_in_year(y1);
    sum += (d2 - serial_from_civil(y2, 1, 1)) as Time / days_in_year(y2);
    sum
}

/// Actual/Actual (ISMA) on serial numbers.
///
/// Reference periods may be notional and fall outside the supported date
/// range, hence the raw serial arithmetic.
fn isma_fraction(d1: i32, d2: i32, ref_start: Option<i32>, ref_end: Option<i32>) -> Time {
    if d1 == d2 {
        return 0.0;
    }
    if d1 > d2 {
        return -isma_fraction(d2, d1, ref_start, ref_end);
    }
    let mut rs = ref_start.unwrap_or(d1);
    let mut re = ref_end.unwrap_or(d2);
    if re <= rs || re <= d1 {
        rs = d1;
        re = d2;
    }
    let mut months = (12.0 * (re - rs) as f64 / 365.0).round() as i32;
    if months == 0 {
        // Very short reference period: measure against one year from d1.
        rs = d1;
        re = shift_serial_by_months(d1, 12);
        months = 12;
    }
    let period = months as Time / 12.0;

    if d2 <= re {
        if d1 >= rs {
            return period * (d2 - d1) as Time / (re - rs) as Time;
        }
        // Long first coupon: d1 lies in the notional period before rs.
        let previous_ref = shift_serial_by_months(rs, -months);
        if d2 > rs {
            return isma_fraction(d1, rs, Some(previous_ref), Some(rs))
                + isma_fraction(rs, d2, Some(rs), Some(re));
        }
        return isma_fraction(d1, d2, Some(previous_ref), Some(rs));
    }

    if rs > d1 {
        let previous_ref = shift_serial_by_months(rs, -months);
        return isma_fraction(d1, rs, Some(previous_ref), Some(rs))
            + isma_fraction(rs, d2, Some(rs), Some(re));
    }

    // Long last coupon: count whole notional periods after re.
    let mut sum = isma_fraction(d1, re, Some(rs), Some(re));
    let mut i = 0;
    loop {
        let start = shift_serial_by_months(re, months * i);
        let end = shift_serial_by_months(re, months * (i + 1));
        if d2 < end {
            sum += isma_fraction(start, d2, Some(start), Some(end));
            return sum;
        }
        sum += period;
        i += 1;
    }
}

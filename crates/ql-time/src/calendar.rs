//! `Calendar` trait and the two calendars with no holiday rules.
//!
//! A calendar only has to say which dates are business days; adjustment,
//! advancing by periods, holiday lists, and business-day counts are provided
//! on top of that.  Every operation that moves a date returns a [`Result`]
//! because the move can leave the supported date range.

use crate::business_day_convention::BusinessDayConvention;
use crate::date::{Date, Weekday};
use crate::period::{Period, TimeUnit};
use ql_core::errors::Result;

/// A holiday calendar.
pub trait Calendar: std::fmt::Debug + Send + Sync {
    /// Human-readable name, e.g. `"US government bond market"`.
    fn name(&self) -> &str;

    /// Return `true` if `date` is a business day in this calendar.
    fn is_business_day(&self, date: Date) -> bool;

    /// Return `true` if `date` is a holiday or weekend day.
    fn is_holiday(&self, date: Date) -> bool {
        !self.is_business_day(date)
    }

    /// Return `true` if `weekday` is part of the weekend.
    fn is_weekend(&self, weekday: Weekday) -> bool {
        weekday.is_weekend()
    }

    /// Return `true` if `date` is on or after the last business day of its
    /// month.
    fn is_end_of_month(&self, date: Date) -> Result<bool> {
        let next = self.adjust(date.add_days(1)?, BusinessDayConvention::Following)?;
        Ok(date.month() != next.month())
    }

    /// Return the last business day of the month containing `date`.
    fn end_of_month(&self, date: Date) -> Result<Date> {
        self.adjust(date.end_of_month(), BusinessDayConvention::Preceding)
    }

    /// Roll `date` to a business day according to `convention`.
    fn adjust(&self, date: Date, convention: BusinessDayConvention) -> Result<Date> {
        match convention {
            BusinessDayConvention::Unadjusted => Ok(date),
            BusinessDayConvention::Following => {
                let mut d = date;
                while self.is_holiday(d) {
                    d = d.add_days(1)?;
                }
                Ok(d)
            }
            BusinessDayConvention::Preceding => {
                let mut d = date;
                while self.is_holiday(d) {
                    d = d.add_days(-1)?;
                }
                Ok(d)
            }
            BusinessDayConvention::ModifiedFollowing => {
                let adjusted = self.adjust(date, BusinessDayConvention::Following)?;
                if adjusted.month() != date.month() {
                    self.adjust(date, BusinessDayConvention::Preceding)
                } else {
                    Ok(adjusted)
                }
            }
            BusinessDayConvention::ModifiedPreceding => {
                let adjusted = self.adjust(date, BusinessDayConvention::Preceding)?;
                if adjusted.month() != date.month() {
                    self.adjust(date, BusinessDayConvention::Following)
                } else {
                    Ok(adjusted)
                }
            }
            BusinessDayConvention::Nearest => {
                if self.is_business_day(date) {
                    return Ok(date);
                }
                let fwd = self.adjust(date, BusinessDayConvention::Following)?;
                let bwd = self.adjust(date, BusinessDayConvention::Preceding)?;
                if fwd - date <= date - bwd {
                    Ok(fwd)
                } else {
                    Ok(bwd)
                }
            }
        }
    }

    /// Move `date` by `n` business days.  With `n == 0` the date is rolled
    /// forward to a business day.
    fn advance_business_days(&self, date: Date, n: i32) -> Result<Date> {
        if n == 0 {
            return self.adjust(date, BusinessDayConvention::Following);
        }
        let step = n.signum();
        let mut remaining = n.abs();
        let mut d = date;
        while remaining > 0 {
            d = d.add_days(step)?;
            if self.is_business_day(d) {
                remaining -= 1;
            }
        }
        Ok(d)
    }

    /// Move `date` by `period` and roll the result with `convention`.
    ///
    /// Day periods count business days.  For month and year periods, when
    /// `end_of_month` is set and `date` is the last business day of its
    /// month, the result is the last business day of the target month.
    fn advance(
        &self,
        date: Date,
        period: Period,
        convention: BusinessDayConvention,
        end_of_month: bool,
    ) -> Result<Date> {
        if period.length == 0 {
            return self.adjust(date, convention);
        }
        match period.unit {
            TimeUnit::Days => self.advance_business_days(date, period.length),
            TimeUnit::Weeks => self.adjust(date.shift(period)?, convention),
            TimeUnit::Months | TimeUnit::Years => {
                let target = date.shift(period)?;
                if end_of_month && self.is_end_of_month(date)? {
                    self.end_of_month(target)
                } else {
                    self.adjust(target, convention)
                }
            }
        }
    }

    /// Count business days between `from` and `to`.
    ///
    /// The end points are counted only when the matching flag is set.  The
    /// result is negative when `to < from`.
    fn business_days_between(
        &self,
        from: Date,
        to: Date,
        include_first: bool,
        include_last: bool,
    ) -> i32 {
        if from == to {
            return i32::from(include_first && include_last && self.is_business_day(from));
        }
        let (lo, hi, sign) = if from < to { (from, to, 1) } else { (to, from, -1) };
        let (include_lo, include_hi) = if sign > 0 {
            (include_first, include_last)
        } else {
            (include_last, include_first)
        };
        let count = Date::range_inclusive(lo, hi)
            .filter(|d| (*d != lo || include_lo) && (*d != hi || include_hi))
            .filter(|d| self.is_business_day(*d))
            .count() as i32;
        sign * count
    }

    /// Every holiday in `[from, to]`, optionally including plain weekend
    /// days.
    fn holiday_list(&self, from: Date, to: Date, include_weekends: bool) -> Vec<Date> {
        Date::range_inclusive(from, to)
            .filter(|d| {
                self.is_holiday(*d) && (include_weekends || !self.is_weekend(d.weekday()))
            })
            .collect()
    }
}

/// A calendar where every day is a business day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NullCalendar;

impl Calendar for NullCalendar {
    fn name(&self) -> &str {
        "Null"
    }

    fn is_business_day(&self, _date: Date) -> bool {
        true
    }

    fn is_weekend(&self, _weekday: Weekday) -> bool {
        false
    }
}

/// Saturdays and Sundays are holidays, nothing else.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WeekendsOnly;

impl Calendar for WeekendsOnly {
    fn name(&self) -> &str {
        "Weekends Only"
    }

    fn is_business_day(&self, date: Date) -> bool {
        !self.is_weekend(date.weekday())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: u16, m: u8, d: u8) -> Date {
        Date::from_ymd(y, m, d).unwrap()
    }

    #[test]
    fn null_calendar_always_business() {
        let cal = NullCalendar;
        assert!(cal.is_business_day(date(2023, 12, 25)));
        assert!(cal.holiday_list(date(2023, 1, 1), date(2023, 12, 31), true).is_empty());
    }

    #[test]
    fn adjust_conventions() {
        let cal = WeekendsOnly;
        let sat = date(2023, 9, 2);
        let adj = |c| cal.adjust(sat, c).unwrap();
        assert_eq!(adj(BusinessDayConvention::Following), date(2023, 9, 4));
        assert_eq!(adj(BusinessDayConvention::Preceding), date(2023, 9, 1));
        assert_eq!(adj(BusinessDayConvention::Unadjusted), sat);
        assert_eq!(adj(BusinessDayConvention::Nearest), date(2023, 9, 1));
        assert_eq!(
            cal.adjust(date(2023, 9, 3), BusinessDayConvention::Nearest).unwrap(),
            date(2023, 9, 4)
        );
    }

    #[test]
    fn modified_following_stays_in_month() {
        let cal = WeekendsOnly;
        // 30 September 2023 is a Saturday.
        assert_eq!(
            cal.adjust(date(2023, 9, 30), BusinessDayConvention::ModifiedFollowing)
                .unwrap(),
            date(2023, 9, 29)
        );
    }

    #[test]
    fn business_days_between_flags() {
        let cal = WeekendsOnly;
        let mon = date(2023, 9, 4);
        let fri = date(2023, 9, 8);
        assert_eq!(cal.business_days_between(mon, fri, true, false), 4);
        assert_eq!(cal.business_days_between(mon, fri, false, true), 4);
        assert_eq!(cal.business_days_between(mon, fri, true, true), 5);
        assert_eq!(cal.business_days_between(mon, fri, false, false), 3);
        assert_eq!(cal.business_days_between(fri, mon, true, false), -4);
        assert_eq!(cal.business_days_between(mon, mon, true, true), 1);
    }

    #[test]
    fn advance_end_of_month() {
        let cal = WeekendsOnly;
        // 29 September 2023 is the last business day of the month.
        let d = date(2023, 9, 29);
        let six_months = Period::new(6, TimeUnit::Months);
        assert_eq!(
            cal.advance(d, six_months, BusinessDayConvention::Following, true)
                .unwrap(),
            date(2024, 3, 29)
        );
        assert_eq!(
            cal.advance(d, six_months, BusinessDayConvention::Following, false)
                .unwrap(),
            date(2024, 3, 29)
        );
        assert_eq!(
            cal.advance(d, Period::new(2, TimeUnit::Days), BusinessDayConvention::Following, false)
                .unwrap(),
            date(2023, 10, 3)
        );
    }

    #[test]
    fn holiday_list_weekends() {
        let cal = WeekendsOnly;
        let list = cal.holiday_list(date(2023, 9, 1), date(2023, 9, 10), true);
        assert_eq!(list, vec![date(2023, 9, 2), date(2023, 9, 3), date(2023, 9, 9), date(2023, 9, 10)]);
        assert!(cal.holiday_list(date(2023, 9, 1), date(2023, 9, 10), false).is_empty());
    }
}

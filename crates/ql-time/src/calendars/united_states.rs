//! United States calendars.
//!
//! One type covers the three markets that matter for fixed income; the
//! holiday rules they share live in small predicate functions below.

use super::easter_monday;
use crate::calendar::Calendar;
use crate::date::{Date, Weekday};
use serde::{Deserialize, Serialize};

/// Which US market a [`UnitedStates`] calendar follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UsMarket {
    /// Federal holidays, observed on the nearest weekday.
    Settlement,
    /// New York Stock Exchange.
    Nyse,
    /// Government bond market (SIFMA recommendations).
    GovernmentBond,
}

/// United States calendar for one [`UsMarket`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitedStates {
    market: UsMarket,
}

impl UnitedStates {
    /// Calendar for `market`.
    pub fn new(market: UsMarket) -> Self {
        Self { market }
    }

    /// The market whose rules this calendar applies.
    pub fn market(&self) -> UsMarket {
        self.market
    }
}

impl Default for UnitedStates {
    fn default() -> Self {
        Self::new(UsMarket::Settlement)
    }
}

impl Calendar for UnitedStates {
    fn name(&self) -> &str {
        match self.market {
            UsMarket::Settlement => "US settlement",
            UsMarket::Nyse => "New York stock exchange",
            UsMarket::GovernmentBond => "US government bond market",
        }
    }

    fn is_business_day(&self, date: Date) -> bool {
        let w = date.weekday();
        if self.is_weekend(w) {
            return false;
        }
        let day = UsDay {
            y: date.year(),
            m: date.month(),
            d: date.day_of_month(),
            w,
            dd: date.day_of_year(),
        };
        let holiday = match self.market {
            UsMarket::Settlement => is_settlement_holiday(&day),
            UsMarket::Nyse => is_nyse_holiday(&day),
            UsMarket::GovernmentBond => is_government_bond_holiday(&day),
        };
        !holiday
    }
}

struct UsDay {
    y: u16,
    m: u8,
    d: u8,
    w: Weekday,
    dd: u16,
}

// ── Shared holiday rules ────────────────────────────────────────────────────

fn new_years_day(x: &UsDay) -> bool {
    // Moved to Monday if on Sunday.
    x.m == 1 && (x.d == 1 || (x.d == 2 && x.w == Weekday::Monday))
}

fn martin_luther_king_day(x: &UsDay, since: u16) -> bool {
    x.y >= since && x.m == 1 && x.w == Weekday::Monday && (15..=21).contains(&x.d)
}

fn washington_birthday(x: &UsDay) -> bool {
    x.m == 2 && x.w == Weekday::Monday && (15..=21).contains(&x.d)
}

fn good_friday(x: &UsDay) -> bool {
    x.dd + 3 == easter_monday(x.y)
}

fn memorial_day(x: &UsDay) -> bool {
    x.m == 5 && x.w == Weekday::Monday && x.d >= 25
}

/// Fixed-date holiday observed on Monday when on Sunday and on Friday when
/// on Saturday.
fn observed(x: &UsDay, month: u8, day: u8) -> bool {
    if x.m != month {
        return false;
    }
    x.d == day
        || (x.d == day + 1 && x.w == Weekday::Monday)
        || (x.d + 1 == day && x.w == Weekday::Friday)
}

fn juneteenth(x: &UsDay) -> bool {
    x.y >= 2022 && observed(x, 6, 19)
}

fn independence_day(x: &UsDay) -> bool {
    observed(x, 7, 4)
}

fn labor_day(x: &UsDay) -> bool {
    x.m == 9 && x.w == Weekday::Monday && x.d <= 7
}

fn columbus_day(x: &UsDay) -> bool {
    x.y >= 1971 && x.m == 10 && x.w == Weekday::Monday && (8..=14).contains(&x.d)
}

fn thanksgiving(x: &UsDay) -> bool {
    x.m == 11 && x.w == Weekday::Thursday && (22..=28).contains(&x.d)
}

fn christmas(x: &UsDay) -> bool {
    observed(x, 12, 25)
}

// ── Markets ───────────────────────────────────────────────────────────────────

fn is_settlement_holiday(x: &UsDay) -> bool {
    new_years_day(x)
        // New Year's Day on Saturday is observed on the Friday before.
        || (x.m == 12 && x.d == 31 && x.w == Weekday::Friday)
        || martin_luther_king_day(x, 1983)
        || washington_birthday(x)
        || memorial_day(x)
        || juneteenth(x)
        || independence_day(x)
        || labor_day(x)
        || columbus_day(x)
        || observed(x, 11, 11)
        || thanksgiving(x)
        || christmas(x)
}

fn is_nyse_holiday(x: &UsDay) -> bool {
    new_years_day(x)
        || martin_luther_king_day(x, 1998)
        || washington_birthday(x)
        || good_friday(x)
        || memorial_day(x)
        || juneteenth(x)
        || independence_day(x)
        || labor_day(x)
        || thanksgiving(x)
        || christmas(x)
        || matches!(
            (x.y, x.m, x.d),
            (2018, 12, 5)
                | (2012, 10, 29)
                | (2012, 10, 30)
                | (2007, 1, 2)
                | (2004, 6, 11)
                | (2001, 9, 11..=14)
                | (1994, 4, 27)
                | (1985, 9, 27)
        )
}

fn is_government_bond_holiday(x: &UsDay) -> bool {
    new_years_day(x)
        || martin_luther_king_day(x, 1983)
        || washington_birthday(x)
        // Good Friday was an early close rather than a holiday in these years.
        || (good_friday(x) && !matches!(x.y, 2015 | 2021 | 2023))
        || memorial_day(x)
        || juneteenth(x)
        || independence_day(x)
        || labor_day(x)
        || columbus_day(x)
        // Veterans' Day is not moved back to Friday.
        || (x.m == 11 && (x.d == 11 || (x.d == 12 && x.w == Weekday::Monday)))
        || thanksgiving(x)
        || christmas(x)
        || matches!((x.y, x.m, x.d), (2018, 12, 5) | (2012, 10, 30) | (2004, 6, 11))
}

//! `Date` and `Weekday`.
//!
//! Dates are stored as a serial day number compatible with spreadsheet
//! serials for every supported date: serial 367 is 1 January 1901 and serial
//! 39709 is 18 September 2008.  The supported range is 1901-01-01 to
//! 2199-12-31; every constructor and arithmetic operation checks it.
//!
//! Conversion between serials and civil dates uses the proleptic Gregorian
//! day-number algorithms, so no lookup tables are needed.  Dates serialize
//! as ISO-8601 strings (`"2008-09-18"`) through `chrono`.

use crate::period::{Period, TimeUnit};
use chrono::{Datelike, NaiveDate};
use ql_core::errors::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Offset between days-since-1970 and the serial number.
const UNIX_EPOCH_SERIAL: i32 = 25_569;

/// A calendar date represented as a serial day number.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Date(i32);

impl Date {
    /// Minimum valid date: January 1, 1901.
    pub const MIN: Date = Date(367);

    /// Maximum valid date: December 31, 2199.
    pub const MAX: Date = Date(109_574);

    // ── Constructors ─────────────────────────────────────────────────────────

    /// Create a date from a serial number.
    pub fn from_serial(serial: i32) -> Result<Self> {
        if !(Self::MIN.0..=Self::MAX.0).contains(&serial) {
            return Err(Error::Date(format!(
                "serial {serial} outside [{}, {}]",
                Self::MIN.0,
                Self::MAX.0
            )));
        }
        Ok(Date(serial))
    }

    /// Create a date from year, month (1–12), and day-of-month.
    pub fn from_ymd(year: u16, month: u8, day: u8) -> Result<Self> {
        if !(1901..=2199).contains(&year) {
            return Err(Error::Date(format!("year {year} out of range [1901, 2199]")));
        }
        if !(1..=12).contains(&month) {
            return Err(Error::Date(format!("month {month} out of range [1, 12]")));
        }
        let last = days_in_month(year, month);
        if day == 0 || day > last {
            return Err(Error::Date(format!(
                "day {day} out of range [1, {last}] for {year}-{month:02}"
            )));
        }
        Ok(Date(serial_from_civil(year as i32, month as i32, day as i32)))
    }

    /// Parse an ISO-8601 calendar date such as `2008-09-18`.
    pub fn parse_iso(s: &str) -> Result<Self> {
        let naive = NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map_err(|e| Error::Date(format!("cannot parse '{s}': {e}")))?;
        Self::try_from(naive)
    }

    // ── Accessors ─────────────────────────────────────────────────────────────

    /// Return the serial number.
    pub fn serial(&self) -> i32 {
        self.0
    }

    /// Return the year (1901–2199).
    pub fn year(&self) -> u16 {
        civil_from_serial(self.0).0 as u16
    }

    /// Return the month (1–12).
    pub fn month(&self) -> u8 {
        civil_from_serial(self.0).1 as u8
    }

    /// Return the day of the month (1–31).
    pub fn day_of_month(&self) -> u8 {
        civil_from_serial(self.0).2 as u8
    }

    /// Return the day of the year (1–366).
    pub fn day_of_year(&self) -> u16 {
        let (y, _, _) = civil_from_serial(self.0);
        (self.0 - serial_from_civil(y, 1, 1) + 1) as u16
    }

    /// Return the weekday.
    pub fn weekday(&self) -> Weekday {
        // 1 January 1970 was a Thursday.
        match (self.0 - UNIX_EPOCH_SERIAL + 3).rem_euclid(7) {
            0 => Weekday::Monday,
            1 => Weekday::Tuesday,
            2 => Weekday::Wednesday,
            3 => Weekday::Thursday,
            4 => Weekday::Friday,
            5 => Weekday::Saturday,
            _ => Weekday::Sunday,
        }
    }

    // ── Arithmetic ────────────────────────────────────────────────────────────

    /// Move by `n` calendar days.
    pub fn add_days(self, n: i32) -> Result<Self> {
        Self::from_serial(self.0 + n)
    }

    /// Move by `n` units.  Month and year moves clamp the day to the end of
    /// the target month (31 January + 1M = 28 or 29 February).
    pub fn advance(self, n: i32, unit: TimeUnit) -> Result<Self> {
        match unit {
            TimeUnit::Days => self.add_days(n),
            TimeUnit::Weeks => self.add_days(n * 7),
            TimeUnit::Months => Self::from_serial(shift_serial_by_months(self.0, n)),
            TimeUnit::Years => Self::from_serial(shift_serial_by_months(self.0, n * 12)),
        }
    }

    /// Move by a [`Period`].
    pub fn shift(self, period: Period) -> Result<Self> {
        self.advance(period.length, period.unit)
    }

    /// Return the last day of the month containing this date.
    pub fn end_of_month(self) -> Self {
        let (y, m, _) = civil_from_serial(self.0);
        Date(serial_from_civil(y, m, days_in_month(y as u16, m as u8) as i32))
    }

    /// Return `true` if this is the last calendar day of its month.
    pub fn is_end_of_month(self) -> bool {
        self == self.end_of_month()
    }

    /// Return the *n*-th occurrence of `weekday` in the given month.
    pub fn nth_weekday(n: u8, weekday: Weekday, year: u16, month: u8) -> Result<Self> {
        if n == 0 {
            return Err(Error::Date("nth_weekday: n must be >= 1".into()));
        }
        let first = Date::from_ymd(year, month, 1)?;
        let skip = (weekday.ordinal() as i32 - first.weekday().ordinal() as i32).rem_euclid(7);
        let day = 1 + skip + 7 * (n as i32 - 1);
        if day > days_in_month(year, month) as i32 {
            return Err(Error::Date(format!(
                "there is no {n}-th {weekday} in {year}-{month:02}"
            )));
        }
        Date::from_ymd(year, month, day as u8)
    }

    /// Iterate over every date in `[from, to]`.  Empty when `to < from`.
    pub fn range_inclusive(from: Date, to: Date) -> impl Iterator<Item = Date> {
        (from.0..=to.0).map(Date)
    }
}

impl std::ops::Sub<Date> for Date {
    type Output = i32;
    fn sub(self, rhs: Date) -> i32 {
        self.0 - rhs.0
    }
}

// ── chrono interop ──────────────────────────────────────────────────────────

impl TryFrom<NaiveDate> for Date {
    type Error = Error;

    fn try_from(d: NaiveDate) -> Result<Self> {
        let year = u16::try_from(d.year())
            .map_err(|_| Error::Date(format!("year {} out of range", d.year())))?;
        Date::from_ymd(year, d.month() as u8, d.day() as u8)
    }
}

impl From<Date> for NaiveDate {
    fn from(d: Date) -> Self {
        let (y, m, day) = civil_from_serial(d.0);
        // Every serial in range is a valid civil date.
        NaiveDate::from_ymd_opt(y, m as u32, day as u32).unwrap_or(NaiveDate::MIN)
    }
}

impl Serialize for Date {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let (y, m, d) = civil_from_serial(self.0);
        serializer.collect_str(&format_args!("{y:04}-{m:02}-{d:02}"))
    }
}

impl<'de> Deserialize<'de> for Date {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Date::parse_iso(&s).map_err(serde::de::Error::custom)
    }
}

// ── Display ───────────────────────────────────────────────────────────────────

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

impl std::fmt::Display for Date {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (y, m, d) = civil_from_serial(self.0);
        write!(f, "{d} {} {y}", MONTH_NAMES[m as usize - 1])
    }
}

impl std::fmt::Debug for Date {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (y, m, d) = civil_from_serial(self.0);
        write!(f, "Date({y:04}-{m:02}-{d:02})")
    }
}

// ── Weekday ───────────────────────────────────────────────────────────────────

/// Day of the week, numbered 1 (Monday) to 7 (Sunday).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Weekday {
    /// Monday (1).
    Monday = 1,
    /// Tuesday (2).
    Tuesday = 2,
    /// Wednesday (3).
    Wednesday = 3,
    /// Thursday (4).
    Thursday = 4,
    /// Friday (5).
    Friday = 5,
    /// Saturday (6).
    Saturday = 6,
    /// Sunday (7).
    Sunday = 7,
}

impl Weekday {
    /// Return the ordinal (1 = Monday … 7 = Sunday).
    pub fn ordinal(&self) -> u8 {
        *self as u8
    }

    /// Return `true` for Saturday and Sunday.
    pub fn is_weekend(&self) -> bool {
        matches!(self, Weekday::Saturday | Weekday::Sunday)
    }
}

impl std::fmt::Display for Weekday {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}

// ── Civil-date helpers ────────────────────────────────────────────────────────

/// Whether a given year is a leap year.
pub fn is_leap_year(year: u16) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// Number of days in a given month.
pub fn days_in_month(year: u16, month: u8) -> u8 {
    match month {
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => 31,
    }
}

/// Serial number of a civil date.  Not range checked.
pub(crate) fn serial_from_civil(year: i32, month: i32, day: i32) -> i32 {
    let y = if month <= 2 { year - 1 } else { year };
    let era = y.div_euclid(400);
    let yoe = y - era * 400;
    let mp = (month + 9) % 12;
    let doy = (153 * mp + 2) / 5 + day - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    era * 146_097 + doe - 719_468 + UNIX_EPOCH_SERIAL
}

/// Civil date `(year, month, day)` of a serial number.  Not range checked.
pub(crate) fn civil_from_serial(serial: i32) -> (i32, i32, i32) {
    let z = serial - UNIX_EPOCH_SERIAL + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z - era * 146_097;
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = doy - (153 * mp + 2) / 5 + 1;
    let month = if mp < 10 { mp + 3 } else { mp - 9 };
    let year = yoe + era * 400 + i32::from(month <= 2);
    (year, month, day)
}

/// Serial of the date `months` months after `serial`, clamping the day to
/// the end of the target month.  Not range checked, so day-count code can
/// walk notional reference periods outside the supported range.
pub(crate) fn shift_serial_by_months(serial: i32, months: i32) -> i32 {
    let (y, m, d) = civil_from_serial(serial);
    let total = y * 12 + (m - 1) + months;
    let (ny, nm) = (total.div_euclid(12), total.rem_euclid(12) + 1);
    let last = days_in_month(ny.rem_euclid(400) as u16 + 2000, nm as u8) as i32;
    serial_from_civil(ny, nm, d.min(last))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

//! Calendars with market holiday rules.

/// TARGET (euro area) calendar.
pub mod target;

/// United States calendars.
pub mod united_states;

pub use target::Target;
pub use united_states::{UnitedStates, UsMarket};

/// Day of the year (1-based) of Easter Monday in `year`, western rite.
pub(crate) fn easter_monday(year: u16) -> u16 {
    let y = year as i32;
    let a = y % 19;
    let b = y / 100;
    let c = y % 100;
    let d = b / 4;
    let e = b % 4;
    let f = (b + 8) / 25;
    let g = (b - f + 1) / 3;
    let h = (19 * a + b - d - g + 15) % 30;
    let i = c / 4;
    let k = c % 4;
    let l = (32 + 2 * e + 2 * i - h - k) % 7;
    let m = (a + 11 * h + 22 * l) / 451;
    let month = (h + l - 7 * m + 114) / 31;
    let day = (h + l - 7 * m + 114) % 31 + 1;
    let march_offset = if crate::date::is_leap_year(year) { 60 } else { 59 };
    // Easter Sunday is always in March or April.
    let sunday = if month == 3 { march_offset + day } else { march_offset + 31 + day };
    sunday as u16 + 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::date::Date;

    #[test]
    fn easter_mondays() {
        for (y, m, d) in [(2008, 3, 24), (2011, 4, 25), (2023, 4, 10), (2024, 4, 1), (2038, 4, 26)] {
            let expected = Date::from_ymd(y, m, d).unwrap().day_of_year();
            assert_eq!(easter_monday(y), expected, "Easter Monday {y}");
        }
    }
}

//! TARGET calendar, the settlement calendar of the euro area.

use super::easter_monday;
use crate::calendar::Calendar;
use crate::date::Date;

/// TARGET calendar.
///
/// Besides weekends the following days are holidays:
/// * New Year's Day
/// * Good Friday (since 2000)
/// * Easter Monday (since 2000)
/// * Labour Day, 1 May (since 2000)
/// * Christmas and 26 December
/// * 31 December in 1998, 1999, and 2001
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Target;

impl Calendar for Target {
    fn name(&self) -> &str {
        "TARGET"
    }

    fn is_business_day(&self, date: Date) -> bool {
        if self.is_weekend(date.weekday()) {
            return false;
        }
        let (y, m, d) = (date.year(), date.month(), date.day_of_month());
        let dd = date.day_of_year();
        let em = easter_monday(y);
        let holiday = (d == 1 && m == 1)
            || (y >= 2000 && (dd + 3 == em || dd == em))
            || (y >= 2000 && d == 1 && m == 5)
            || (m == 12 && (d == 25 || d == 26))
            || (d == 31 && m == 12 && matches!(y, 1998 | 1999 | 2001));
        !holiday
    }
}

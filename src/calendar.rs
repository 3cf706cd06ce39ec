//! Gregorian month arithmetic shared by the generators.

use crate::weekday::{Ordinal, RelativeDay};
use chrono::{Datelike as _, Days, NaiveDate, Weekday};

pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };

    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first| first.pred_opt())
        .map_or(31, |last| last.day())
}

/// `(year, month)` moved forward by `months`, `None` past chrono's range.
pub fn add_months(year: i32, month: u32, months: u64) -> Option<(i32, u32)> {
    let index = i64::from(year) * 12 + i64::from(month) - 1;
    let index = index.checked_add(i64::try_from(months).ok()?)?;
    let year = i32::try_from(index.div_euclid(12)).ok()?;
    let month = index.rem_euclid(12) as u32 + 1;

    NaiveDate::from_ymd_opt(year, month, 1).map(|_| (year, month))
}

/// Monday of the week containing `date`.
pub fn start_of_week(date: NaiveDate) -> Option<NaiveDate> {
    date.checked_sub_days(Days::new(u64::from(date.weekday().num_days_from_monday())))
}

pub fn last_weekday(year: i32, month: u32, weekday: Weekday) -> Option<NaiveDate> {
    let last = NaiveDate::from_ymd_opt(year, month, days_in_month(year, month))?;
    let back = (7 + last.weekday().num_days_from_monday() - weekday.num_days_from_monday()) % 7;
    last.checked_sub_days(Days::new(u64::from(back)))
}

/// The concrete date for a relative day in the given month.
///
/// Returns `None` when the month has no such day.
pub fn resolve(year: i32, month: u32, relative: RelativeDay) -> Option<NaiveDate> {
    let n = match relative.ordinal {
        Ordinal::First => 1,
        Ordinal::Second => 2,
        Ordinal::Third => 3,
        Ordinal::Fourth => 4,
        Ordinal::Last => return last_weekday(year, month, relative.weekday),
    };

    NaiveDate::from_weekday_of_month_opt(year, month, relative.weekday, n)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn month_lengths() {
        assert_eq!(days_in_month(2025, 1), 31);
        assert_eq!(days_in_month(2025, 2), 28);
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(1900, 2), 28);
        assert_eq!(days_in_month(2000, 2), 29);
        assert_eq!(days_in_month(2025, 4), 30);
        assert_eq!(days_in_month(2025, 12), 31);
    }

    #[test]
    fn month_stepping() {
        assert_eq!(add_months(2025, 11, 3), Some((2026, 2)));
        assert_eq!(add_months(2025, 1, 0), Some((2025, 1)));
        assert_eq!(add_months(2025, 12, 24), Some((2027, 12)));
        assert_eq!(add_months(2025, 1, u64::MAX), None);
    }

    #[test]
    fn week_start() {
        // 2025-01-08 is a Wednesday
        assert_eq!(start_of_week(ymd(2025, 1, 8)), Some(ymd(2025, 1, 6)));
        assert_eq!(start_of_week(ymd(2025, 1, 6)), Some(ymd(2025, 1, 6)));
        assert_eq!(start_of_week(ymd(2025, 1, 5)), Some(ymd(2024, 12, 30)));
    }

    #[test]
    fn relative_days() {
        let last_friday = RelativeDay::new(Weekday::Fri, Ordinal::Last);
        assert_eq!(resolve(2025, 1, last_friday), Some(ymd(2025, 1, 31)));
        assert_eq!(resolve(2025, 2, last_friday), Some(ymd(2025, 2, 28)));

        let second_tuesday = RelativeDay::new(Weekday::Tue, Ordinal::Second);
        assert_eq!(resolve(2025, 3, second_tuesday), Some(ymd(2025, 3, 11)));

        let fourth_sunday = RelativeDay::new(Weekday::Sun, Ordinal::Fourth);
        assert_eq!(resolve(2025, 2, fourth_sunday), Some(ymd(2025, 2, 23)));
    }
}

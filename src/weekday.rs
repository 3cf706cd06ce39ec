use crate::error::{RecurrenceError, RecurrenceResult};
use chrono::Weekday;
use std::fmt;

const WEEK: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// A set of weekdays, iterated Monday first.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct WeekdaySet(u8);

impl WeekdaySet {
    pub const EMPTY: WeekdaySet = WeekdaySet(0);

    pub fn single(day: Weekday) -> Self {
        WeekdaySet(bit(day))
    }

    pub fn contains(self, day: Weekday) -> bool {
        self.0 & bit(day) != 0
    }

    pub fn insert(&mut self, day: Weekday) {
        self.0 |= bit(day);
    }

    pub fn remove(&mut self, day: Weekday) {
        self.0 &= !bit(day);
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn iter(self) -> impl Iterator<Item = Weekday> {
        WEEK.into_iter().filter(move |day| self.contains(*day))
    }
}

fn bit(day: Weekday) -> u8 {
    1 << day.num_days_from_monday()
}

impl FromIterator<Weekday> for WeekdaySet {
    fn from_iter<I: IntoIterator<Item = Weekday>>(iter: I) -> Self {
        let mut set = WeekdaySet::EMPTY;
        for day in iter {
            set.insert(day);
        }
        set
    }
}

impl fmt::Debug for WeekdaySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

/// Position of a weekday within its month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Ordinal {
    First,
    Second,
    Third,
    Fourth,
    Last,
}

impl Ordinal {
    /// Stored value: 1-4, or -1 for last.
    pub fn value(self) -> i8 {
        match self {
            Ordinal::First => 1,
            Ordinal::Second => 2,
            Ordinal::Third => 3,
            Ordinal::Fourth => 4,
            Ordinal::Last => -1,
        }
    }
}

impl TryFrom<i8> for Ordinal {
    type Error = RecurrenceError;

    fn try_from(value: i8) -> RecurrenceResult<Self> {
        match value {
            1 => Ok(Ordinal::First),
            2 => Ok(Ordinal::Second),
            3 => Ok(Ordinal::Third),
            4 => Ok(Ordinal::Fourth),
            // forms put "last" in the fifth slot
            -1 | 5 => Ok(Ordinal::Last),
            other => Err(RecurrenceError::InvalidOrdinal(other)),
        }
    }
}

impl fmt::Display for Ordinal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Ordinal::First => "first",
            Ordinal::Second => "second",
            Ordinal::Third => "third",
            Ordinal::Fourth => "fourth",
            Ordinal::Last => "last",
        })
    }
}

/// "The Nth (or last) <weekday> of the month".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RelativeDay {
    pub weekday: Weekday,
    pub ordinal: Ordinal,
}

impl RelativeDay {
    pub fn new(weekday: Weekday, ordinal: Ordinal) -> Self {
        RelativeDay { weekday, ordinal }
    }
}

impl fmt::Display for RelativeDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.ordinal, weekday_name(self.weekday))
    }
}

/// Two-letter code used by stored rules ("MO".."SU").
pub fn weekday_code(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "MO",
        Weekday::Tue => "TU",
        Weekday::Wed => "WE",
        Weekday::Thu => "TH",
        Weekday::Fri => "FR",
        Weekday::Sat => "SA",
        Weekday::Sun => "SU",
    }
}

pub fn parse_weekday_code(code: &str) -> RecurrenceResult<Weekday> {
    WEEK.into_iter()
        .find(|day| weekday_code(*day).eq_ignore_ascii_case(code))
        .ok_or_else(|| RecurrenceError::UnknownWeekday(code.to_owned()))
}

pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

const MONTH_CODES: [&str; 12] = [
    "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
];

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

/// Three-letter code for a 1-based month, `None` outside 1-12.
pub fn month_code(month: u32) -> Option<&'static str> {
    MONTH_CODES.get(month_index(month)?).copied()
}

pub fn month_name(month: u32) -> Option<&'static str> {
    MONTH_NAMES.get(month_index(month)?).copied()
}

fn month_index(month: u32) -> Option<usize> {
    usize::try_from(month.checked_sub(1)?).ok()
}

pub fn parse_month_code(code: &str) -> RecurrenceResult<u32> {
    MONTH_CODES
        .iter()
        .position(|c| c.eq_ignore_ascii_case(code))
        .map(|index| index as u32 + 1)
        .ok_or_else(|| RecurrenceError::UnknownMonth(code.to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_iterates_monday_first() {
        let set: WeekdaySet = [Weekday::Sun, Weekday::Wed, Weekday::Mon].into_iter().collect();
        let days: Vec<_> = set.iter().collect();
        assert_eq!(days, vec![Weekday::Mon, Weekday::Wed, Weekday::Sun]);
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn set_insert_remove() {
        let mut set = WeekdaySet::single(Weekday::Fri);
        set.insert(Weekday::Fri);
        assert_eq!(set.len(), 1);
        set.remove(Weekday::Fri);
        assert!(set.is_empty());
    }

    #[test]
    fn ordinals() {
        assert_eq!(Ordinal::try_from(-1).unwrap(), Ordinal::Last);
        assert_eq!(Ordinal::try_from(5).unwrap(), Ordinal::Last);
        assert_eq!(Ordinal::try_from(3).unwrap(), Ordinal::Third);
        assert!(matches!(
            Ordinal::try_from(0),
            Err(RecurrenceError::InvalidOrdinal(0))
        ));
        assert_eq!(Ordinal::Last.value(), -1);
    }

    #[test]
    fn codes() {
        assert_eq!(parse_weekday_code("we").unwrap(), Weekday::Wed);
        assert!(parse_weekday_code("XX").is_err());
        assert_eq!(parse_month_code("DEC").unwrap(), 12);
        assert_eq!(month_code(2), Some("FEB"));
        assert_eq!(month_name(12), Some("December"));
        assert_eq!(month_code(0), None);
        assert_eq!(month_name(13), None);
        assert!(parse_month_code("FOO").is_err());
    }
}

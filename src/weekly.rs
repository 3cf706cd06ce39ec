use crate::calendar::start_of_week;
use crate::candidates::Period;
use crate::weekday::WeekdaySet;
use chrono::{Days, NaiveDate};

const DAYS_IN_WEEK: u64 = 7;

/// Blocks of `interval` weeks, anchored on the Monday of the start week.
pub struct Weekly {
    first_monday: Option<NaiveDate>,
    interval: u32,
    weekdays: WeekdaySet,
}

impl Weekly {
    pub fn new(start: NaiveDate, interval: u32, weekdays: WeekdaySet) -> Self {
        Weekly {
            first_monday: start_of_week(start),
            interval,
            weekdays,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.weekdays.is_empty()
    }

    pub fn period(&self, index: u64) -> Option<Period> {
        let weeks = index.checked_mul(u64::from(self.interval))?;
        let monday = self
            .first_monday?
            .checked_add_days(Days::new(weeks.checked_mul(DAYS_IN_WEEK)?))?;

        let dates = self
            .weekdays
            .iter()
            .filter_map(|day| monday.checked_add_days(Days::new(u64::from(day.num_days_from_monday()))))
            .collect();

        Some(Period {
            first_day: monday,
            dates,
        })
    }
}

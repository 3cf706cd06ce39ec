use crate::candidates::Period;
use chrono::{Datelike as _, Days, NaiveDate, Weekday};

pub struct Daily {
    start: NaiveDate,
    interval: u32,
    skip_weekends: bool,
}

impl Daily {
    pub fn new(start: NaiveDate, interval: u32, skip_weekends: bool) -> Self {
        Daily {
            start,
            interval,
            skip_weekends,
        }
    }

    /// The `index`-th stepped day. A skipped weekend still uses up its
    /// step, so the spacing of the remaining days never shifts.
    pub fn period(&self, index: u64) -> Option<Period> {
        let offset = index.checked_mul(u64::from(self.interval))?;
        let day = self.start.checked_add_days(Days::new(offset))?;

        let dates = if self.skip_weekends && is_weekend(day) {
            Vec::new()
        } else {
            vec![day]
        };

        Some(Period {
            first_day: day,
            dates,
        })
    }
}

fn is_weekend(day: NaiveDate) -> bool {
    matches!(day.weekday(), Weekday::Sat | Weekday::Sun)
}

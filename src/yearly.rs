use crate::candidates::Period;
use crate::monthly::DaySelector;
use chrono::{Datelike as _, NaiveDate};
use std::collections::BTreeMap;

/// Months in scope, each with its own day selector.
pub struct Yearly {
    year: i32,
    interval: u32,
    months: BTreeMap<u32, DaySelector>,
}

impl Yearly {
    pub fn new(start: NaiveDate, interval: u32, months: BTreeMap<u32, DaySelector>) -> Self {
        Yearly {
            year: start.year(),
            interval,
            months,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.months.values().all(DaySelector::is_empty)
    }

    pub fn period(&self, index: u64) -> Option<Period> {
        let years = index.checked_mul(u64::from(self.interval))?;
        let year = i32::try_from(i64::from(self.year).checked_add(i64::try_from(years).ok()?)?).ok()?;

        let dates = self
            .months
            .iter()
            .flat_map(|(month, selector)| selector.dates_in(year, *month))
            .collect();

        Some(Period {
            first_day: NaiveDate::from_ymd_opt(year, 1, 1)?,
            dates,
        })
    }
}

use crate::calendar::{self, add_months};
use crate::candidates::Period;
use crate::weekday::RelativeDay;
use chrono::{Datelike as _, NaiveDate};
use std::collections::BTreeSet;

/// Which days of one month are selected.
#[derive(Debug, Clone)]
pub enum DaySelector {
    Days(BTreeSet<u32>),
    Relative(Vec<RelativeDay>),
}

impl DaySelector {
    pub fn is_empty(&self) -> bool {
        match self {
            DaySelector::Days(days) => days.is_empty(),
            DaySelector::Relative(days) => days.is_empty(),
        }
    }

    /// Concrete dates in `year`/`month`. Days the month does not have
    /// (the 31st of April, a missing 4th weekday) are left out, never clamped.
    pub fn dates_in(&self, year: i32, month: u32) -> Vec<NaiveDate> {
        match self {
            DaySelector::Days(days) => days
                .iter()
                .filter_map(|day| NaiveDate::from_ymd_opt(year, month, *day))
                .collect(),
            DaySelector::Relative(days) => days
                .iter()
                .filter_map(|day| calendar::resolve(year, month, *day))
                .collect(),
        }
    }
}

pub struct Monthly {
    year: i32,
    month: u32,
    interval: u32,
    selector: DaySelector,
}

impl Monthly {
    pub fn new(start: NaiveDate, interval: u32, selector: DaySelector) -> Self {
        Monthly {
            year: start.year(),
            month: start.month(),
            interval,
            selector,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.selector.is_empty()
    }

    pub fn period(&self, index: u64) -> Option<Period> {
        let months = index.checked_mul(u64::from(self.interval))?;
        let (year, month) = add_months(self.year, self.month, months)?;

        Some(Period {
            first_day: NaiveDate::from_ymd_opt(year, month, 1)?,
            dates: self.selector.dates_in(year, month),
        })
    }
}

use crate::calendar::days_in_month;
use crate::candidates::Candidates;
use crate::rule::RecurrenceRule;
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

/// Inclusive range of calendar dates a caller wants occurrences for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        DateRange { start, end }
    }

    /// The whole of `month` in `year`, as shown by a month grid.
    pub fn month(year: i32, month: u32) -> Option<Self> {
        Some(DateRange {
            start: NaiveDate::from_ymd_opt(year, month, 1)?,
            end: NaiveDate::from_ymd_opt(year, month, days_in_month(year, month))?,
        })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn is_empty(&self) -> bool {
        self.end < self.start
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        std::iter::successors(Some(self.start), |day| day.checked_add_days(Days::new(1)))
            .take_while(move |day| *day <= end)
    }
}

/// How a rule stops on its own.
#[derive(Debug, Clone, Copy)]
enum End {
    Until(NaiveDate),
    Never,
}

/// Clips a candidate stream to a query range and to the rule's own end.
///
/// Candidates before the range are still pulled and counted: the
/// occurrence count runs from the rule's start date, not the range start.
pub struct Window<I> {
    candidates: I,
    end: End,
    remaining: Option<u32>,
    range: DateRange,
    done: bool,
}

impl<I: Iterator<Item = NaiveDate>> Window<I> {
    pub fn new(candidates: I, rule: &RecurrenceRule, range: DateRange) -> Self {
        Window {
            candidates,
            end: rule.end_date().map_or(End::Never, End::Until),
            remaining: rule.occurrence_count(),
            range,
            done: false,
        }
    }
}

impl Window<Candidates> {
    /// Candidate dates of `rule` that fall in `range`, generated no further
    /// than the earlier of the range end and the rule's end date.
    pub fn of(rule: &RecurrenceRule, range: DateRange) -> Self {
        let horizon = match rule.end_date() {
            Some(end) => end.min(range.end),
            None => range.end,
        };
        Window::new(Candidates::new(rule).until(horizon), rule, range)
    }
}

impl<I: Iterator<Item = NaiveDate>> Iterator for Window<I> {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<NaiveDate> {
        while !self.done {
            let Some(date) = self.candidates.next() else {
                break;
            };

            if let End::Until(until) = self.end {
                if date > until {
                    break;
                }
            }
            match self.remaining {
                Some(0) => break,
                Some(ref mut count) => *count -= 1,
                None => {}
            }
            if date > self.range.end {
                break;
            }

            if date >= self.range.start {
                return Some(date);
            }
        }

        self.done = true;
        None
    }
}

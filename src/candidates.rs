use crate::daily::Daily;
use crate::monthly::{DaySelector, Monthly};
use crate::rule::{Pattern, RecurrenceRule};
use crate::weekly::Weekly;
use crate::yearly::Yearly;
use chrono::NaiveDate;

/// Consecutive periods without a single candidate after which the sequence
/// is treated as exhausted.
const EMPTY_RUN_LIMIT: u32 = 1_000;

/// Candidate dates of one period (a day, a week block, a month or a year).
pub struct Period {
    pub first_day: NaiveDate,
    pub dates: Vec<NaiveDate>,
}

enum Stepper {
    Daily(Daily),
    Weekly(Weekly),
    Monthly(Monthly),
    Yearly(Yearly),
}

impl Stepper {
    fn period(&self, index: u64) -> Option<Period> {
        match self {
            Stepper::Daily(d) => d.period(index),
            Stepper::Weekly(w) => w.period(index),
            Stepper::Monthly(m) => m.period(index),
            Stepper::Yearly(y) => y.period(index),
        }
    }

    fn is_empty(&self) -> bool {
        match self {
            Stepper::Daily(_) => false,
            Stepper::Weekly(w) => w.is_empty(),
            Stepper::Monthly(m) => m.is_empty(),
            Stepper::Yearly(y) => y.is_empty(),
        }
    }
}

/// Lazily generated candidate dates of a rule: strictly increasing, no
/// duplicates, none before the rule's start date.
///
/// Periods are produced on demand, one at a time, so an open-ended rule
/// costs nothing beyond what the consumer pulls.
pub struct Candidates {
    stepper: Stepper,
    start: NaiveDate,
    index: u64,
    pending: std::vec::IntoIter<NaiveDate>,
    horizon: Option<NaiveDate>,
    empty_run: u32,
    done: bool,
}

impl Candidates {
    pub fn new(rule: &RecurrenceRule) -> Self {
        let start = rule.start_date();
        let interval = rule.interval();

        let stepper = match rule.pattern() {
            Pattern::Daily { skip_weekends } => {
                Stepper::Daily(Daily::new(start, interval, *skip_weekends))
            }
            Pattern::Weekly { weekdays } => Stepper::Weekly(Weekly::new(start, interval, *weekdays)),
            Pattern::Monthly { days } => Stepper::Monthly(Monthly::new(
                start,
                interval,
                DaySelector::Days(days.clone()),
            )),
            Pattern::RelativeMonthly { days } => Stepper::Monthly(Monthly::new(
                start,
                interval,
                DaySelector::Relative(days.clone()),
            )),
            Pattern::Yearly { months } => Stepper::Yearly(Yearly::new(
                start,
                interval,
                months
                    .iter()
                    .map(|(month, days)| (*month, DaySelector::Days(days.clone())))
                    .collect(),
            )),
            Pattern::RelativeYearly { months } => Stepper::Yearly(Yearly::new(
                start,
                interval,
                months
                    .iter()
                    .map(|(month, days)| (*month, DaySelector::Relative(days.clone())))
                    .collect(),
            )),
        };

        // an invalid rule that slipped through degrades to no candidates
        let done = rule.interval() == 0 || stepper.is_empty();

        Candidates {
            stepper,
            start,
            index: 0,
            pending: Vec::new().into_iter(),
            horizon: None,
            empty_run: 0,
            done,
        }
    }

    /// Stops generating once a period begins after `horizon`.
    pub fn until(mut self, horizon: NaiveDate) -> Self {
        self.horizon = Some(horizon);
        self
    }
}

impl Iterator for Candidates {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<NaiveDate> {
        loop {
            if let Some(date) = self.pending.next() {
                return Some(date);
            }
            if self.done {
                return None;
            }

            let Some(period) = self.stepper.period(self.index) else {
                self.done = true;
                return None;
            };
            if self.horizon.is_some_and(|horizon| period.first_day > horizon) {
                self.done = true;
                return None;
            }
            self.index += 1;

            let mut dates = period.dates;
            dates.retain(|date| *date >= self.start);
            dates.sort_unstable();
            dates.dedup();

            if dates.is_empty() {
                self.empty_run += 1;
                if self.empty_run >= EMPTY_RUN_LIMIT {
                    tracing::debug!(
                        periods = self.empty_run,
                        since = %period.first_day,
                        "No candidates in a long run of periods, stopping"
                    );
                    self.done = true;
                }
                continue;
            }

            self.empty_run = 0;
            self.pending = dates.into_iter();
        }
    }
}

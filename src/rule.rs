use crate::error::{RecurrenceError, RecurrenceResult};
use crate::wire::StoredRecurrenceRule;
use crate::weekday::{month_name, weekday_name, Ordinal, RelativeDay, WeekdaySet};
use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Frequency {
    fn unit(self) -> &'static str {
        match self {
            Frequency::Daily => "day",
            Frequency::Weekly => "week",
            Frequency::Monthly => "month",
            Frequency::Yearly => "year",
        }
    }
}

/// What repeats inside each period, keyed by frequency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pattern {
    Daily { skip_weekends: bool },
    Weekly { weekdays: WeekdaySet },
    /// Days of the month, 1-31.
    Monthly { days: BTreeSet<u32> },
    RelativeMonthly { days: Vec<RelativeDay> },
    /// Month (1-12) to days of that month.
    Yearly { months: BTreeMap<u32, BTreeSet<u32>> },
    RelativeYearly { months: BTreeMap<u32, Vec<RelativeDay>> },
}

impl Pattern {
    pub fn frequency(&self) -> Frequency {
        match self {
            Pattern::Daily { .. } => Frequency::Daily,
            Pattern::Weekly { .. } => Frequency::Weekly,
            Pattern::Monthly { .. } | Pattern::RelativeMonthly { .. } => Frequency::Monthly,
            Pattern::Yearly { .. } | Pattern::RelativeYearly { .. } => Frequency::Yearly,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Options {
    pub interval: Option<u32>,
    pub end_date: Option<NaiveDate>,
    pub occurrence_count: Option<u32>,
}

/// A validated repetition rule. Immutable: edits produce a new rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StoredRecurrenceRule", into = "StoredRecurrenceRule")]
pub struct RecurrenceRule {
    interval: u32,
    start_date: NaiveDate,
    end_date: Option<NaiveDate>,
    occurrence_count: Option<u32>,
    pattern: Pattern,
}

impl RecurrenceRule {
    pub fn new(start_date: NaiveDate, pattern: Pattern, options: Options) -> RecurrenceResult<Self> {
        let rule = RecurrenceRule {
            interval: options.interval.unwrap_or(1),
            start_date,
            end_date: options.end_date,
            occurrence_count: options.occurrence_count,
            pattern,
        };
        rule.validate()?;
        Ok(rule)
    }

    /// Builds a rule without checking it, to exercise the generator's
    /// handling of rules that slipped past validation.
    #[cfg(test)]
    pub(crate) fn unchecked(start_date: NaiveDate, pattern: Pattern, interval: u32) -> Self {
        RecurrenceRule {
            interval,
            start_date,
            end_date: None,
            occurrence_count: None,
            pattern,
        }
    }

    pub fn frequency(&self) -> Frequency {
        self.pattern.frequency()
    }

    pub fn interval(&self) -> u32 {
        self.interval
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    pub fn end_date(&self) -> Option<NaiveDate> {
        self.end_date
    }

    pub fn occurrence_count(&self) -> Option<u32> {
        self.occurrence_count
    }

    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    /// True when neither an end date nor a count bounds the rule.
    pub fn is_open_ended(&self) -> bool {
        self.end_date.is_none() && self.occurrence_count.is_none()
    }

    fn validate(&self) -> RecurrenceResult<()> {
        if self.interval == 0 {
            return Err(RecurrenceError::ZeroInterval);
        }
        if self.occurrence_count == Some(0) {
            return Err(RecurrenceError::ZeroCount);
        }
        if let Some(end) = self.end_date {
            if end < self.start_date {
                return Err(RecurrenceError::EndBeforeStart {
                    start: self.start_date,
                    end,
                });
            }
        }

        match &self.pattern {
            Pattern::Daily { .. } => Ok(()),
            Pattern::Weekly { weekdays } if weekdays.is_empty() => Err(RecurrenceError::NoWeekdays),
            Pattern::Weekly { .. } => Ok(()),
            Pattern::Monthly { days } if days.is_empty() => Err(RecurrenceError::NoMonthDays),
            Pattern::Monthly { days } => check_days(days),
            Pattern::RelativeMonthly { days } if days.is_empty() => {
                Err(RecurrenceError::NoRelativeDays)
            }
            Pattern::RelativeMonthly { .. } => Ok(()),
            Pattern::Yearly { months } => {
                check_months(months, BTreeSet::is_empty)?;
                months.values().try_for_each(check_days)
            }
            Pattern::RelativeYearly { months } => check_months(months, Vec::is_empty),
        }
    }

    fn edit(&self, pattern: Pattern) -> RecurrenceResult<Self> {
        let rule = RecurrenceRule {
            pattern,
            ..self.clone()
        };
        rule.validate()?;
        Ok(rule)
    }

    /// Adds or removes a weekday from a weekly rule.
    pub fn toggle_weekday(&self, day: Weekday) -> RecurrenceResult<Self> {
        match &self.pattern {
            Pattern::Weekly { weekdays } => {
                let mut weekdays = *weekdays;
                if weekdays.contains(day) {
                    weekdays.remove(day);
                } else {
                    weekdays.insert(day);
                }
                self.edit(Pattern::Weekly { weekdays })
            }
            _ => Ok(self.clone()),
        }
    }

    pub fn toggle_month_day(&self, day: u32) -> RecurrenceResult<Self> {
        match &self.pattern {
            Pattern::Monthly { days } => self.edit(Pattern::Monthly {
                days: toggled(days, day),
            }),
            _ => Ok(self.clone()),
        }
    }

    pub fn toggle_relative_day(&self, day: RelativeDay) -> RecurrenceResult<Self> {
        match &self.pattern {
            Pattern::RelativeMonthly { days } => self.edit(Pattern::RelativeMonthly {
                days: toggled_relative(days, day),
            }),
            _ => Ok(self.clone()),
        }
    }

    /// Removing a month also drops the days selected for it. A newly added
    /// month starts with the start date's day (or its weekday position).
    pub fn toggle_yearly_month(&self, month: u32) -> RecurrenceResult<Self> {
        use chrono::Datelike as _;

        match &self.pattern {
            Pattern::Yearly { months } => {
                let mut months = months.clone();
                if months.remove(&month).is_none() {
                    months.insert(month, BTreeSet::from([self.start_date.day()]));
                }
                self.edit(Pattern::Yearly { months })
            }
            Pattern::RelativeYearly { months } => {
                let mut months = months.clone();
                if months.remove(&month).is_none() {
                    let ordinal = match (self.start_date.day() - 1) / 7 {
                        0 => Ordinal::First,
                        1 => Ordinal::Second,
                        2 => Ordinal::Third,
                        3 => Ordinal::Fourth,
                        _ => Ordinal::Last,
                    };
                    months.insert(
                        month,
                        vec![RelativeDay::new(self.start_date.weekday(), ordinal)],
                    );
                }
                self.edit(Pattern::RelativeYearly { months })
            }
            _ => Ok(self.clone()),
        }
    }

    pub fn toggle_yearly_day(&self, month: u32, day: u32) -> RecurrenceResult<Self> {
        match &self.pattern {
            Pattern::Yearly { months } => {
                let mut months = months.clone();
                let days = toggled(months.get(&month).unwrap_or(&BTreeSet::new()), day);
                if days.is_empty() {
                    months.remove(&month);
                } else {
                    months.insert(month, days);
                }
                self.edit(Pattern::Yearly { months })
            }
            _ => Ok(self.clone()),
        }
    }

    pub fn toggle_yearly_relative_day(&self, month: u32, day: RelativeDay) -> RecurrenceResult<Self> {
        match &self.pattern {
            Pattern::RelativeYearly { months } => {
                let mut months = months.clone();
                let days = toggled_relative(months.get(&month).map_or(&[][..], Vec::as_slice), day);
                if days.is_empty() {
                    months.remove(&month);
                } else {
                    months.insert(month, days);
                }
                self.edit(Pattern::RelativeYearly { months })
            }
            _ => Ok(self.clone()),
        }
    }
}

fn check_days(days: &BTreeSet<u32>) -> RecurrenceResult<()> {
    match days.iter().find(|day| !(1..=31).contains(*day)) {
        Some(day) => Err(RecurrenceError::DayOutOfRange(*day)),
        None => Ok(()),
    }
}

fn check_months<T>(months: &BTreeMap<u32, T>, empty: impl Fn(&T) -> bool) -> RecurrenceResult<()> {
    if months.is_empty() {
        return Err(RecurrenceError::NoMonths);
    }
    for (month, selectors) in months {
        if !(1..=12).contains(month) {
            return Err(RecurrenceError::MonthOutOfRange(*month));
        }
        if empty(selectors) {
            return Err(RecurrenceError::EmptyMonth(*month));
        }
    }
    Ok(())
}

fn toggled(days: &BTreeSet<u32>, day: u32) -> BTreeSet<u32> {
    let mut days = days.clone();
    if !days.remove(&day) {
        days.insert(day);
    }
    days
}

fn toggled_relative(days: &[RelativeDay], day: RelativeDay) -> Vec<RelativeDay> {
    if days.contains(&day) {
        days.iter().copied().filter(|d| *d != day).collect()
    } else {
        days.iter().copied().chain(Some(day)).collect()
    }
}

fn join<T: fmt::Display>(items: impl IntoIterator<Item = T>, sep: &str) -> String {
    items
        .into_iter()
        .map(|item| item.to_string())
        .collect::<Vec<_>>()
        .join(sep)
}

impl fmt::Display for RecurrenceRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let frequency = self.frequency();
        if self.interval == 1 {
            f.write_str(match frequency {
                Frequency::Daily => "Daily",
                Frequency::Weekly => "Weekly",
                Frequency::Monthly => "Monthly",
                Frequency::Yearly => "Yearly",
            })?;
        } else {
            write!(f, "Every {} {}s", self.interval, frequency.unit())?;
        }

        match &self.pattern {
            Pattern::Daily { skip_weekends: true } => f.write_str(" on weekdays")?,
            Pattern::Daily { .. } => {}
            Pattern::Weekly { weekdays } => {
                write!(f, " on {}", join(weekdays.iter().map(weekday_name), ", "))?
            }
            Pattern::Monthly { days } => write!(f, " on day {}", join(days, ", "))?,
            Pattern::RelativeMonthly { days } => {
                write!(f, " on the {}", join(days, ", the "))?
            }
            Pattern::Yearly { months } => {
                let parts = months.iter().map(|(month, days)| {
                    let name = month_name(*month).unwrap_or_default();
                    format!("{} {}", name, join(days, ", "))
                });
                write!(f, " on {}", join(parts, "; "))?
            }
            Pattern::RelativeYearly { months } => {
                let parts = months.iter().flat_map(|(month, days)| {
                    let name = month_name(*month).unwrap_or_default();
                    days.iter().map(move |day| format!("the {} of {}", day, name))
                });
                write!(f, " on {}", join(parts, ", "))?
            }
        }

        if let Some(end) = self.end_date {
            write!(f, " until {}", end.format("%B %-d, %Y"))?;
        }
        match self.occurrence_count {
            Some(1) => f.write_str(", once")?,
            Some(count) => write!(f, ", {count} times")?,
            None => {}
        }
        Ok(())
    }
}

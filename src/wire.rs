//! Stored shapes of rules and events, as persisted by the backend.
//!
//! These are plain serde records with string dates. Converting them into
//! [`RecurrenceRule`] and [`BaseEvent`] is where input is parsed and checked.

use crate::error::{RecurrenceError, RecurrenceResult};
use crate::event::BaseEvent;
use crate::rule::{Frequency, Options, Pattern, RecurrenceRule};
use crate::weekday::{
    month_code, parse_month_code, parse_weekday_code, weekday_code, Ordinal, RelativeDay,
    WeekdaySet,
};
use chrono::{DateTime, Datelike as _, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

const DATE_FORMAT: &str = "%Y-%m-%d";

const NAIVE_TIMESTAMP_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum By {
    #[serde(rename = "dayOfMonth", alias = "date")]
    DayOfMonth,
    #[serde(rename = "relativeDay")]
    RelativeDay,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredWeekday {
    pub weekday: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredMonthDay {
    pub day: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub month: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRelativeDay {
    pub weekday: String,
    pub ordinal: i8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub month: Option<String>,
}

/// A recurrence rule as stored: flat, with every selector list present
/// regardless of frequency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRecurrenceRule {
    pub frequency: Frequency,
    #[serde(default = "default_interval")]
    pub interval: u32,
    pub start_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(default, alias = "count", skip_serializing_if = "Option::is_none")]
    pub occurrence_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub by: Option<By>,
    #[serde(
        default,
        rename = "skipWeekends",
        alias = "skip_weekends",
        skip_serializing_if = "Option::is_none"
    )]
    pub skip_weekends: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub weekdays: Vec<StoredWeekday>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub month_days: Vec<StoredMonthDay>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub relative_days: Vec<StoredRelativeDay>,
}

fn default_interval() -> u32 {
    1
}

fn relative_day(stored: &StoredRelativeDay) -> RecurrenceResult<RelativeDay> {
    Ok(RelativeDay::new(
        parse_weekday_code(&stored.weekday)?,
        Ordinal::try_from(stored.ordinal)?,
    ))
}


impl StoredRecurrenceRule {
    /// The explicit `by`, or the one implied by whichever selector list is
    /// filled in. Relative days win when both are.
    fn by(&self) -> Option<By> {
        self.by.or_else(|| {
            if !self.relative_days.is_empty() {
                Some(By::RelativeDay)
            } else if !self.month_days.is_empty() {
                Some(By::DayOfMonth)
            } else {
                None
            }
        })
    }

    fn pattern(&self, start: NaiveDate) -> RecurrenceResult<Pattern> {
        let pattern = match (self.frequency, self.by()) {
            (Frequency::Daily, _) => Pattern::Daily {
                skip_weekends: self.skip_weekends.unwrap_or(false),
            },
            (Frequency::Weekly, _) => {
                let mut weekdays = self
                    .weekdays
                    .iter()
                    .map(|w| parse_weekday_code(&w.weekday))
                    .collect::<RecurrenceResult<WeekdaySet>>()?;
                if weekdays.is_empty() {
                    weekdays = WeekdaySet::single(start.weekday());
                }
                Pattern::Weekly { weekdays }
            }
            (frequency, None) => return Err(RecurrenceError::MissingBy(frequency)),
            (Frequency::Monthly, Some(By::DayOfMonth)) => Pattern::Monthly {
                days: self.month_days.iter().map(|d| d.day).collect(),
            },
            (Frequency::Monthly, Some(By::RelativeDay)) => Pattern::RelativeMonthly {
                days: self
                    .relative_days
                    .iter()
                    .map(relative_day)
                    .collect::<RecurrenceResult<_>>()?,
            },
            (Frequency::Yearly, Some(By::DayOfMonth)) => {
                let mut months: BTreeMap<u32, BTreeSet<u32>> = BTreeMap::new();
                // entries without a month have no place in a yearly rule
                for entry in &self.month_days {
                    let Some(code) = &entry.month else { continue };
                    months
                        .entry(parse_month_code(code)?)
                        .or_default()
                        .insert(entry.day);
                }
                Pattern::Yearly { months }
            }
            (Frequency::Yearly, Some(By::RelativeDay)) => {
                let mut months: BTreeMap<u32, Vec<RelativeDay>> = BTreeMap::new();
                for entry in &self.relative_days {
                    let Some(code) = &entry.month else { continue };
                    let day = relative_day(entry)?;
                    let days = months.entry(parse_month_code(code)?).or_default();
                    if !days.contains(&day) {
                        days.push(day);
                    }
                }
                Pattern::RelativeYearly { months }
            }
        };
        Ok(pattern)
    }
}

impl TryFrom<StoredRecurrenceRule> for RecurrenceRule {
    type Error = RecurrenceError;

    fn try_from(stored: StoredRecurrenceRule) -> RecurrenceResult<Self> {
        RecurrenceRule::try_from(&stored)
    }
}

impl TryFrom<&StoredRecurrenceRule> for RecurrenceRule {
    type Error = RecurrenceError;

    fn try_from(stored: &StoredRecurrenceRule) -> RecurrenceResult<Self> {
        let start = parse_date(&stored.start_date, "start_date")?;
        let end_date = stored
            .end_date
            .as_deref()
            .map(|end| parse_date(end, "end_date"))
            .transpose()?;

        RecurrenceRule::new(
            start,
            stored.pattern(start)?,
            Options {
                interval: Some(stored.interval),
                end_date,
                occurrence_count: stored.occurrence_count,
            },
        )
    }
}

fn stored_relative(day: &RelativeDay, month: Option<u32>) -> StoredRelativeDay {
    StoredRelativeDay {
        weekday: weekday_code(day.weekday).to_owned(),
        ordinal: day.ordinal.value(),
        month: month.and_then(month_code).map(str::to_owned),
    }
}

impl From<RecurrenceRule> for StoredRecurrenceRule {
    fn from(rule: RecurrenceRule) -> Self {
        let mut stored = StoredRecurrenceRule {
            frequency: rule.frequency(),
            interval: rule.interval(),
            start_date: rule.start_date().format(DATE_FORMAT).to_string(),
            end_date: rule.end_date().map(|end| end.format(DATE_FORMAT).to_string()),
            occurrence_count: rule.occurrence_count(),
            by: None,
            skip_weekends: None,
            weekdays: Vec::new(),
            month_days: Vec::new(),
            relative_days: Vec::new(),
        };

        match rule.pattern() {
            Pattern::Daily { skip_weekends } => stored.skip_weekends = Some(*skip_weekends),
            Pattern::Weekly { weekdays } => {
                stored.weekdays = weekdays
                    .iter()
                    .map(|day| StoredWeekday {
                        weekday: weekday_code(day).to_owned(),
                    })
                    .collect();
            }
            Pattern::Monthly { days } => {
                stored.by = Some(By::DayOfMonth);
                stored.month_days = days
                    .iter()
                    .map(|day| StoredMonthDay {
                        day: *day,
                        month: None,
                    })
                    .collect();
            }
            Pattern::RelativeMonthly { days } => {
                stored.by = Some(By::RelativeDay);
                stored.relative_days = days.iter().map(|day| stored_relative(day, None)).collect();
            }
            Pattern::Yearly { months } => {
                stored.by = Some(By::DayOfMonth);
                stored.month_days = months
                    .iter()
                    .flat_map(|(month, days)| {
                        days.iter().map(move |day| StoredMonthDay {
                            day: *day,
                            month: month_code(*month).map(str::to_owned),
                        })
                    })
                    .collect();
            }
            Pattern::RelativeYearly { months } => {
                stored.by = Some(By::RelativeDay);
                stored.relative_days = months
                    .iter()
                    .flat_map(|(month, days)| {
                        days.iter().map(move |day| stored_relative(day, Some(*month)))
                    })
                    .collect();
            }
        }
        stored
    }
}

/// An event as stored, timestamps still unparsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredEvent {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub start_time: String,
    pub end_time: String,
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default)]
    pub is_recurring: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence_rule: Option<StoredRecurrenceRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calendar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

fn default_timezone() -> String {
    Tz::UTC.name().to_owned()
}

impl TryFrom<StoredEvent> for BaseEvent {
    type Error = RecurrenceError;

    fn try_from(stored: StoredEvent) -> RecurrenceResult<Self> {
        BaseEvent::try_from(&stored)
    }
}

impl TryFrom<&StoredEvent> for BaseEvent {
    type Error = RecurrenceError;

    fn try_from(stored: &StoredEvent) -> RecurrenceResult<Self> {
        let timezone = stored
            .timezone
            .parse::<Tz>()
            .map_err(|_| RecurrenceError::UnknownTimezone(stored.timezone.clone()))?;

        let event = BaseEvent {
            id: stored.id.clone(),
            title: stored.title.clone(),
            description: stored.description.clone(),
            start_time: parse_timestamp(&stored.start_time, "start_time")?,
            end_time: parse_timestamp(&stored.end_time, "end_time")?,
            timezone,
            is_recurring: stored.is_recurring,
            recurrence_rule: stored
                .recurrence_rule
                .as_ref()
                .map(RecurrenceRule::try_from)
                .transpose()?,
            calendar: stored.calendar.clone(),
            category: stored.category.clone(),
        };

        if event.end_time <= event.start_time {
            return Err(RecurrenceError::EndNotAfterStart);
        }
        Ok(event)
    }
}

impl From<BaseEvent> for StoredEvent {
    fn from(event: BaseEvent) -> Self {
        StoredEvent {
            start_time: format_timestamp(event.start_time),
            end_time: format_timestamp(event.end_time),
            timezone: event.timezone.name().to_owned(),
            recurrence_rule: event.recurrence_rule.map(StoredRecurrenceRule::from),
            id: event.id,
            title: event.title,
            description: event.description,
            is_recurring: event.is_recurring,
            calendar: event.calendar,
            category: event.category,
        }
    }
}

/// Millisecond-precision UTC form, `2025-01-06T09:30:00.000Z`.
pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Reads an RFC 3339 timestamp, or a naive one taken as UTC. A bare date
/// means midnight.
pub fn parse_timestamp(value: &str, field: &'static str) -> RecurrenceResult<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
        return Ok(timestamp.with_timezone(&Utc));
    }

    NAIVE_TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(value, DATE_FORMAT)
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
        .map(|naive| naive.and_utc())
        .ok_or_else(|| RecurrenceError::InvalidTimestamp {
            field,
            value: value.to_owned(),
        })
}

pub fn parse_date(value: &str, field: &'static str) -> RecurrenceResult<NaiveDate> {
    match NaiveDate::parse_from_str(value.trim(), DATE_FORMAT) {
        Ok(date) => Ok(date),
        Err(_) => parse_timestamp(value, field).map(|timestamp| timestamp.date_naive()),
    }
}

use chrono::NaiveDate;
use thiserror::Error;

use crate::rule::Frequency;

/// Errors raised while building rules and events or loading settings.
///
/// Expansion itself never fails; these surface where a rule or event is
/// constructed from caller input.
#[derive(Error, Debug)]
pub enum RecurrenceError {
    #[error("Interval must be at least 1")]
    ZeroInterval,

    #[error("Occurrence count must be at least 1")]
    ZeroCount,

    #[error("end_date {end} is before start_date {start}")]
    EndBeforeStart { start: NaiveDate, end: NaiveDate },

    #[error("Weekly recurrence needs at least one weekday")]
    NoWeekdays,

    #[error("Monthly recurrence needs at least one day of month")]
    NoMonthDays,

    #[error("Recurrence needs at least one relative day")]
    NoRelativeDays,

    #[error("Yearly recurrence needs at least one month")]
    NoMonths,

    #[error("Yearly recurrence has no day selected for month {0}")]
    EmptyMonth(u32),

    #[error("{0:?} recurrence has neither days of month nor relative days")]
    MissingBy(Frequency),

    #[error("Day must be between 1 and 31, got {0}")]
    DayOutOfRange(u32),

    #[error("Month must be between 1 and 12, got {0}")]
    MonthOutOfRange(u32),

    #[error("Ordinal must be 1-4 or -1 (last), got {0}")]
    InvalidOrdinal(i8),

    #[error("Unknown weekday code: {0}")]
    UnknownWeekday(String),

    #[error("Unknown month code: {0}")]
    UnknownMonth(String),

    #[error("Invalid {field}: {value:?}")]
    InvalidTimestamp { field: &'static str, value: String },

    #[error("Unknown timezone: {0}")]
    UnknownTimezone(String),

    #[error("end_time must be after start_time")]
    EndNotAfterStart,

    #[error("Configuration error: {0}")]
    Config(#[from] ::config::ConfigError),

    #[error("Invalid log level {level:?}: {reason}")]
    InvalidLogLevel { level: String, reason: String },

    #[error("Tracing subscriber already installed: {0}")]
    Logging(#[from] tracing_subscriber::util::TryInitError),
}

pub type RecurrenceResult<T> = std::result::Result<T, RecurrenceError>;

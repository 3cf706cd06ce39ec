//! Expands recurring calendar events into the concrete occurrences visible
//! in a date range.
//!
//! A [`RecurrenceRule`] describes which dates an event repeats on. Expanding
//! a [`BaseEvent`] over a [`DateRange`] yields one [`Occurrence`] per
//! matching date, each keeping the event's time of day and duration.

mod calendar;
mod candidates;
mod config;
mod daily;
mod error;
mod event;
mod expand;
mod merge;
mod monthly;
mod rule;
mod weekday;
mod weekly;
mod window;
mod wire;
mod yearly;

pub use candidates::{Candidates, Period};
pub use self::config::{init_tracing, ExpansionSettings, LoggingSettings, Settings};
pub use error::{RecurrenceError, RecurrenceResult};
pub use event::{materialize, BaseEvent, Occurrence};
pub use expand::{expand, expand_all, group_by_day, Expander};
pub use merge::merge;
pub use rule::{Frequency, Options, Pattern, RecurrenceRule};
pub use weekday::{Ordinal, RelativeDay, WeekdaySet};
pub use window::{DateRange, Window};
pub use wire::{
    format_timestamp, parse_date, parse_timestamp, By, StoredEvent, StoredMonthDay,
    StoredRecurrenceRule, StoredRelativeDay, StoredWeekday,
};

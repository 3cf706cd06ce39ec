use crate::rule::RecurrenceRule;
use crate::wire::{format_timestamp, StoredEvent};
use crate::window::DateRange;
use chrono::{DateTime, NaiveDate, NaiveTime, TimeDelta, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// A stored event, with timestamps parsed and its rule validated.
///
/// `end_time` is after `start_time` for every event built from a
/// [`StoredEvent`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StoredEvent", into = "StoredEvent")]
pub struct BaseEvent {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Reference calendar the event was entered in. Carried through as is.
    pub timezone: Tz,
    pub is_recurring: bool,
    pub recurrence_rule: Option<RecurrenceRule>,
    pub calendar: Option<String>,
    pub category: Option<String>,
}

impl BaseEvent {
    pub fn duration(&self) -> TimeDelta {
        self.end_time - self.start_time
    }

    /// The rule to expand, if this event actually recurs.
    pub fn active_rule(&self) -> Option<&RecurrenceRule> {
        self.recurrence_rule.as_ref().filter(|_| self.is_recurring)
    }
}

/// One concrete instance of an event, ready for rendering. Never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Occurrence {
    #[serde(flatten)]
    pub event: BaseEvent,
    pub is_recurring_instance: bool,
    /// Id of the event this instance was generated from. Lookup only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_event_id: Option<String>,
}

impl Occurrence {
    pub fn id(&self) -> &str {
        &self.event.id
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.event.start_time
    }

    pub fn end_time(&self) -> DateTime<Utc> {
        self.event.end_time
    }

    /// Calendar days the occurrence covers. An end at exactly midnight does
    /// not spill into that day.
    pub fn days(&self) -> DateRange {
        let start = self.event.start_time.date_naive();
        let mut end = self.event.end_time.date_naive();
        if end > start && self.event.end_time.time() == NaiveTime::MIN {
            end = end.pred_opt().unwrap_or(end);
        }
        DateRange::new(start, end)
    }

    pub fn overlaps(&self, range: DateRange) -> bool {
        let days = self.days();
        days.start <= range.end && range.start <= days.end
    }
}

/// A non-recurring event passes through untouched.
impl From<BaseEvent> for Occurrence {
    fn from(event: BaseEvent) -> Self {
        Occurrence {
            event,
            is_recurring_instance: false,
            original_event_id: None,
        }
    }
}

/// Places `event` on `date`, keeping its time of day and duration.
///
/// The instance id is `"{event id}_{start in ISO form}"`, so the same
/// input always yields the same id.
pub fn materialize(event: &BaseEvent, date: NaiveDate) -> Occurrence {
    let start_time = date.and_time(event.start_time.time()).and_utc();
    let end_time = start_time
        .checked_add_signed(event.duration())
        .unwrap_or(DateTime::<Utc>::MAX_UTC);

    Occurrence {
        event: BaseEvent {
            id: format!("{}_{}", event.id, format_timestamp(start_time)),
            start_time,
            end_time,
            ..event.clone()
        },
        is_recurring_instance: true,
        original_event_id: Some(event.id.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone as _;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn event(start: DateTime<Utc>, end: DateTime<Utc>) -> BaseEvent {
        BaseEvent {
            id: "7".to_owned(),
            title: "Review".to_owned(),
            description: Some("Monthly review".to_owned()),
            start_time: start,
            end_time: end,
            timezone: Tz::UTC,
            is_recurring: true,
            recurrence_rule: None,
            calendar: Some("work".to_owned()),
            category: Some("Business".to_owned()),
        }
    }

    #[test]
    fn keeps_time_of_day_and_duration() {
        let base = event(
            Utc.with_ymd_and_hms(2025, 1, 6, 9, 30, 0).unwrap(),
            Utc.with_ymd_and_hms(2025, 1, 6, 11, 0, 0).unwrap(),
        );
        let occurrence = materialize(&base, ymd(2025, 2, 14));

        assert_eq!(
            occurrence.start_time(),
            Utc.with_ymd_and_hms(2025, 2, 14, 9, 30, 0).unwrap()
        );
        assert_eq!(
            occurrence.end_time(),
            Utc.with_ymd_and_hms(2025, 2, 14, 11, 0, 0).unwrap()
        );
        assert_eq!(occurrence.id(), "7_2025-02-14T09:30:00.000Z");
        assert!(occurrence.is_recurring_instance);
        assert_eq!(occurrence.original_event_id.as_deref(), Some("7"));
        assert_eq!(occurrence.event.title, base.title);
        assert_eq!(occurrence.event.description, base.description);
        assert_eq!(occurrence.event.calendar, base.calendar);
        assert_eq!(occurrence.event.category, base.category);
    }

    #[test]
    fn idempotent() {
        let base = event(
            Utc.with_ymd_and_hms(2025, 1, 6, 9, 30, 0).unwrap(),
            Utc.with_ymd_and_hms(2025, 1, 6, 11, 0, 0).unwrap(),
        );
        assert_eq!(
            materialize(&base, ymd(2025, 3, 1)),
            materialize(&base, ymd(2025, 3, 1))
        );
    }

    #[test]
    fn overnight_event_spans_two_days() {
        let base = event(
            Utc.with_ymd_and_hms(2025, 1, 6, 22, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2025, 1, 7, 2, 0, 0).unwrap(),
        );
        let occurrence = materialize(&base, ymd(2025, 1, 10));
        assert_eq!(occurrence.days(), DateRange::new(ymd(2025, 1, 10), ymd(2025, 1, 11)));
        assert!(occurrence.overlaps(DateRange::new(ymd(2025, 1, 11), ymd(2025, 1, 20))));
        assert!(!occurrence.overlaps(DateRange::new(ymd(2025, 1, 12), ymd(2025, 1, 20))));
    }

    #[test]
    fn ending_at_midnight_stays_on_one_day() {
        let base = event(
            Utc.with_ymd_and_hms(2025, 1, 6, 23, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2025, 1, 7, 0, 0, 0).unwrap(),
        );
        let occurrence = Occurrence::from(base);
        assert_eq!(occurrence.days(), DateRange::new(ymd(2025, 1, 6), ymd(2025, 1, 6)));
    }

    #[test]
    fn serializes_flat() {
        let base = event(
            Utc.with_ymd_and_hms(2025, 1, 6, 9, 30, 0).unwrap(),
            Utc.with_ymd_and_hms(2025, 1, 6, 11, 0, 0).unwrap(),
        );
        let value = serde_json::to_value(materialize(&base, ymd(2025, 1, 13))).unwrap();

        assert_eq!(value["id"], "7_2025-01-13T09:30:00.000Z");
        assert_eq!(value["start_time"], "2025-01-13T09:30:00.000Z");
        assert_eq!(value["end_time"], "2025-01-13T11:00:00.000Z");
        assert_eq!(value["is_recurring_instance"], true);
        assert_eq!(value["original_event_id"], "7");
        assert_eq!(value["timezone"], "UTC");
    }
}

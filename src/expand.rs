use crate::config::ExpansionSettings;
use crate::event::{materialize, BaseEvent, Occurrence};
use crate::merge::merge;
use crate::wire::StoredEvent;
use crate::window::{DateRange, Window};
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Turns events into the occurrences visible in a date range.
#[derive(Debug, Clone, Default)]
pub struct Expander {
    settings: ExpansionSettings,
}

impl Expander {
    pub fn new(settings: ExpansionSettings) -> Self {
        Expander { settings }
    }

    /// Occurrences of one event in `range`, sorted by start time.
    ///
    /// An event that does not recur comes back as itself when its start
    /// date is in range.
    pub fn expand(&self, event: &BaseEvent, range: DateRange) -> Vec<Occurrence> {
        let Some(rule) = event.active_rule() else {
            return if range.contains(event.start_time.date_naive()) {
                vec![Occurrence::from(event.clone())]
            } else {
                Vec::new()
            };
        };

        let window = Window::of(rule, range).map(|date| materialize(event, date));
        let occurrences = match self.settings.max_instances_per_event {
            None => window.collect(),
            Some(limit) => {
                let mut occurrences: Vec<_> = window.take(limit.saturating_add(1)).collect();
                if occurrences.len() > limit {
                    tracing::warn!(
                        event_id = %event.id,
                        limit,
                        start = %range.start,
                        end = %range.end,
                        "Too many occurrences in range, truncating"
                    );
                    occurrences.truncate(limit);
                }
                occurrences
            }
        };

        tracing::debug!(
            event_id = %event.id,
            count = occurrences.len(),
            "Expanded recurring event"
        );
        occurrences
    }

    /// Occurrences of many events, flattened and sorted by start time.
    pub fn expand_events<'a>(
        &self,
        events: impl IntoIterator<Item = &'a BaseEvent>,
        range: DateRange,
    ) -> Vec<Occurrence> {
        let streams: Vec<_> = events
            .into_iter()
            .map(|event| self.expand(event, range).into_iter())
            .collect();
        merge(streams).collect()
    }

    /// Like [`Expander::expand_events`], reading stored events first.
    ///
    /// An event that cannot be read is logged and left out; the rest are
    /// still expanded.
    pub fn expand_all<'a>(
        &self,
        events: impl IntoIterator<Item = &'a StoredEvent>,
        range: DateRange,
    ) -> Vec<Occurrence> {
        let parsed: Vec<BaseEvent> = events
            .into_iter()
            .filter_map(|stored| match BaseEvent::try_from(stored) {
                Ok(event) => Some(event),
                Err(err) => {
                    tracing::warn!(event_id = %stored.id, error = %err, "Skipping unreadable event");
                    None
                }
            })
            .collect();

        self.expand_events(&parsed, range)
    }
}

/// [`Expander::expand`] with default settings.
pub fn expand(event: &BaseEvent, range: DateRange) -> Vec<Occurrence> {
    Expander::default().expand(event, range)
}

/// [`Expander::expand_all`] with default settings.
pub fn expand_all<'a>(
    events: impl IntoIterator<Item = &'a StoredEvent>,
    range: DateRange,
) -> Vec<Occurrence> {
    Expander::default().expand_all(events, range)
}

/// Buckets occurrences under each day of `range` they cover, so multi-day
/// occurrences appear on every day they touch.
pub fn group_by_day(
    occurrences: &[Occurrence],
    range: DateRange,
) -> BTreeMap<NaiveDate, Vec<&Occurrence>> {
    let mut grouped: BTreeMap<NaiveDate, Vec<&Occurrence>> = BTreeMap::new();

    for occurrence in occurrences {
        let days = occurrence.days();
        let visible = DateRange::new(days.start.max(range.start), days.end.min(range.end));
        for day in visible.days() {
            grouped.entry(day).or_default().push(occurrence);
        }
    }

    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::{Options, Pattern, RecurrenceRule};
    use chrono::{DateTime, TimeZone as _, Utc};
    use chrono_tz::Tz;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn daily_event(id: &str, hour: u32, options: Options) -> BaseEvent {
        BaseEvent {
            id: id.to_owned(),
            title: id.to_owned(),
            description: None,
            start_time: at(2025, 1, 1, hour),
            end_time: at(2025, 1, 1, hour + 1),
            timezone: Tz::UTC,
            is_recurring: true,
            recurrence_rule: Some(
                RecurrenceRule::new(
                    ymd(2025, 1, 1),
                    Pattern::Daily {
                        skip_weekends: false,
                    },
                    options,
                )
                .unwrap(),
            ),
            calendar: None,
            category: None,
        }
    }

    fn january() -> DateRange {
        DateRange::month(2025, 1).unwrap()
    }

    #[test_log::test]
    fn expands_recurring_event() {
        let event = daily_event("standup", 9, Options::default());
        let occurrences = expand(&event, DateRange::new(ymd(2025, 1, 1), ymd(2025, 1, 5)));

        assert_eq!(occurrences.len(), 5);
        assert_eq!(occurrences[0].start_time(), at(2025, 1, 1, 9));
        assert_eq!(occurrences[4].start_time(), at(2025, 1, 5, 9));
    }

    #[test]
    fn recurring_flag_off_passes_through() {
        let mut event = daily_event("once", 9, Options::default());
        event.is_recurring = false;

        let occurrences = expand(&event, january());
        assert_eq!(occurrences, vec![Occurrence::from(event.clone())]);
        assert_eq!(occurrences[0].id(), "once");
        assert!(!occurrences[0].is_recurring_instance);

        let february = DateRange::month(2025, 2).unwrap();
        assert!(expand(&event, february).is_empty());
    }

    #[test_log::test]
    fn truncates_at_limit() {
        let event = daily_event("busy", 9, Options::default());
        let expander = Expander::new(ExpansionSettings {
            max_instances_per_event: Some(3),
        });
        assert_eq!(expander.expand(&event, january()).len(), 3);
    }

    #[test]
    fn default_returns_whole_range() {
        let mut event = daily_event("decades", 9, Options::default());
        event.recurrence_rule = Some(
            RecurrenceRule::new(
                ymd(2000, 1, 1),
                Pattern::Daily {
                    skip_weekends: false,
                },
                Options::default(),
            )
            .unwrap(),
        );
        let range = DateRange::new(ymd(2000, 1, 1), ymd(2030, 12, 31));

        let occurrences = expand(&event, range);
        assert_eq!(occurrences.len(), range.days().count());
        assert_eq!(occurrences.len(), 11_323);
        assert_eq!(occurrences.last().unwrap().start_time(), at(2030, 12, 31, 9));
    }

    #[test]
    fn expand_events_sorted_across_events() {
        let evening = daily_event(
            "evening",
            18,
            Options {
                occurrence_count: Some(2),
                ..Options::default()
            },
        );
        let morning = daily_event(
            "morning",
            8,
            Options {
                occurrence_count: Some(2),
                ..Options::default()
            },
        );

        let occurrences = Expander::default().expand_events([&evening, &morning], january());
        let starts: Vec<_> = occurrences.iter().map(Occurrence::start_time).collect();
        assert_eq!(
            starts,
            vec![
                at(2025, 1, 1, 8),
                at(2025, 1, 1, 18),
                at(2025, 1, 2, 8),
                at(2025, 1, 2, 18)
            ]
        );
    }

    #[test_log::test]
    fn unreadable_event_is_skipped() {
        let good = StoredEvent::from(daily_event(
            "good",
            9,
            Options {
                occurrence_count: Some(3),
                ..Options::default()
            },
        ));
        let mut bad = good.clone();
        bad.id = "bad".to_owned();
        bad.start_time = "not a time".to_owned();

        let occurrences = expand_all([&bad, &good], january());
        assert_eq!(occurrences.len(), 3);
        assert!(occurrences
            .iter()
            .all(|o| o.original_event_id.as_deref() == Some("good")));
    }

    #[test]
    fn groups_multi_day_occurrences() {
        let mut event = daily_event(
            "night",
            22,
            Options {
                occurrence_count: Some(2),
                ..Options::default()
            },
        );
        event.end_time = at(2025, 1, 2, 2);

        let range = DateRange::new(ymd(2025, 1, 1), ymd(2025, 1, 2));
        let occurrences = expand(&event, range);
        let grouped = group_by_day(&occurrences, range);

        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[&ymd(2025, 1, 1)].len(), 1);
        // the first night spills into the 2nd, the second night starts on it;
        // its spill into the 3rd is out of range
        assert_eq!(grouped[&ymd(2025, 1, 2)].len(), 2);
    }
}

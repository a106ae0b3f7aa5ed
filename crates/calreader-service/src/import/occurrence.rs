//! Per-instance occurrence records.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use super::event::{AlarmTrigger, EventDefinition, ResolvedEvent};
use super::normalize::DateTimeNormalizer;
use calreader_rfc::rfc::ical::core::TriggerRelated;

/// One concrete event instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Occurrence {
    #[serde(rename = "UID")]
    pub uid: String,
    pub name: String,
    pub location: String,
    pub description: String,
    pub status: String,
    pub categories: Vec<String>,
    /// Start as Unix seconds.
    pub from: i64,
    /// End as Unix seconds.
    pub to: i64,
    pub from_s: String,
    pub to_s: String,
    #[serde(rename = "allDay")]
    pub all_day: bool,
    /// Alarm offsets in seconds relative to `from`.
    pub alarms: Vec<i64>,
}

/// Builds occurrences reported in the process zone.
pub struct OccurrenceAssembler<'n, 'a> {
    normalizer: &'n DateTimeNormalizer<'a>,
}

impl<'n, 'a> OccurrenceAssembler<'n, 'a> {
    #[must_use]
    pub fn new(normalizer: &'n DateTimeNormalizer<'a>) -> Self {
        Self { normalizer }
    }

    /// Builds the record for one instance of `def` spanning `from..to`.
    #[must_use]
    pub fn assemble(
        &self,
        def: &EventDefinition,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        all_day: bool,
    ) -> Occurrence {
        let to = to.max(from);
        Occurrence {
            uid: def.uid.clone(),
            name: def.summary.clone(),
            location: def.location.clone(),
            description: def.description.clone(),
            status: def.status.clone(),
            categories: def.categories.clone(),
            from: from.timestamp(),
            to: to.timestamp(),
            from_s: self.format(from),
            to_s: self.format(to),
            all_day,
            alarms: self.alarm_offsets(&def.alarms, from, to),
        }
    }

    /// Builds the record of an event at its own timing.
    #[must_use]
    pub fn assemble_event(&self, event: &ResolvedEvent<'_>) -> Occurrence {
        self.assemble(
            event.definition,
            event.timing.start.instant,
            event.timing.end,
            event.timing.all_day,
        )
    }

    /// ## Summary
    /// Offsets of each alarm relative to `from`, in declaration order.
    ///
    /// `RELATED=END` triggers are measured from `to`. Absolute triggers
    /// contribute their distance from `from`, and unreadable ones zero.
    #[must_use]
    pub fn alarm_offsets(
        &self,
        triggers: &[AlarmTrigger],
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Vec<i64> {
        triggers
            .iter()
            .map(|trigger| match trigger {
                AlarmTrigger::Relative { duration, related } => {
                    let base = match related {
                        TriggerRelated::Start => 0,
                        TriggerRelated::End => (to - from).num_seconds(),
                    };
                    base + duration.as_seconds()
                }
                AlarmTrigger::Absolute(raw) => self
                    .normalizer
                    .normalize(raw)
                    .map_or(0, |at| (at.instant - from).num_seconds()),
                AlarmTrigger::Unresolved => 0,
            })
            .collect()
    }

    fn format(&self, instant: DateTime<Utc>) -> String {
        instant
            .with_timezone(&self.normalizer.local_zone())
            .to_rfc3339_opts(SecondsFormat::Secs, false)
    }
}

//! Typed event definitions read from VEVENT components.

use calreader_rfc::rfc::ical::core::{Component, Duration, RRule, TriggerRelated, Value};
use chrono::{DateTime, NaiveDateTime, NaiveTime, TimeDelta, Utc};

use super::normalize::{DateTimeNormalizer, Frame, NormalizedInstant, RawDateValue};
use crate::error::{ImportError, ImportResult};

/// An RRULE as far as the tokenizer could read it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecurrenceRule {
    Valid(Box<RRule>),
    /// The raw text of a rule that failed to parse.
    Malformed(String),
}

/// How an event takes part in expansion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    /// A single occurrence.
    Simple,
    /// A series driven by an RRULE.
    Recurring(RecurrenceRule),
    /// One edited instance of a series, identified by UID and RECURRENCE-ID.
    Override(RawDateValue),
}

/// DTEND or DURATION, whichever the event carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventEnd {
    DtEnd(RawDateValue),
    Duration(Duration),
    Unspecified,
}

/// A VALARM TRIGGER.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlarmTrigger {
    Relative {
        duration: Duration,
        related: TriggerRelated,
    },
    Absolute(RawDateValue),
    /// No TRIGGER, or one that could not be read.
    Unresolved,
}

impl AlarmTrigger {
    fn from_alarm(alarm: &Component) -> Self {
        let Some(prop) = alarm.get_property("TRIGGER") else {
            return Self::Unresolved;
        };
        match &prop.value {
            Value::Duration(duration) => Self::Relative {
                duration: *duration,
                related: TriggerRelated::from_param(prop.get_param("RELATED")),
            },
            Value::DateTime(_) | Value::Date(_) => RawDateValue::from_property(prop)
                .map_or(Self::Unresolved, Self::Absolute),
            _ => Self::Unresolved,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventDefinition {
    pub uid: String,
    pub summary: String,
    pub location: String,
    pub description: String,
    pub status: String,
    pub categories: Vec<String>,
    pub start: RawDateValue,
    pub end: EventEnd,
    pub kind: EventKind,
    pub exdates: Vec<RawDateValue>,
    pub rdates: Vec<RawDateValue>,
    pub alarms: Vec<AlarmTrigger>,
}

impl EventDefinition {
    /// ## Summary
    /// Reads a VEVENT.
    ///
    /// An RRULE makes the event Recurring even when it also carries a
    /// RECURRENCE-ID. Missing text fields become empty strings.
    ///
    /// ## Errors
    /// Returns `IncompleteEventDefinition` when DTSTART is missing or unreadable.
    pub fn from_component(component: &Component) -> ImportResult<Self> {
        let uid = component.uid().unwrap_or_default().to_string();

        let start = match component.get_property("DTSTART") {
            None => return Err(ImportError::incomplete(&uid, "missing DTSTART")),
            Some(prop) => RawDateValue::from_property(prop).ok_or_else(|| {
                ImportError::incomplete(&uid, format!("unreadable DTSTART '{}'", prop.raw_value))
            })?,
        };

        let end = if let Some(dtend) = component
            .get_property("DTEND")
            .and_then(RawDateValue::from_property)
        {
            EventEnd::DtEnd(dtend)
        } else if let Some(duration) = component
            .get_property("DURATION")
            .and_then(|p| p.value.as_duration())
        {
            EventEnd::Duration(*duration)
        } else {
            EventEnd::Unspecified
        };

        let kind = if let Some(prop) = component.get_property("RRULE") {
            EventKind::Recurring(match &prop.value {
                Value::Recur(rule) => RecurrenceRule::Valid(rule.clone()),
                _ => RecurrenceRule::Malformed(prop.raw_value.clone()),
            })
        } else if let Some(recurrence_id) = component
            .get_property("RECURRENCE-ID")
            .and_then(RawDateValue::from_property)
        {
            EventKind::Override(recurrence_id)
        } else {
            EventKind::Simple
        };

        let text = |name: &str| component.text(name).unwrap_or_default().to_string();

        Ok(Self {
            summary: text("SUMMARY"),
            location: text("LOCATION"),
            description: text("DESCRIPTION"),
            status: text("STATUS"),
            categories: categories(component),
            start,
            end,
            kind,
            exdates: date_list(component, "EXDATE"),
            rdates: date_list(component, "RDATE"),
            alarms: component
                .alarms()
                .into_iter()
                .map(AlarmTrigger::from_alarm)
                .collect(),
            uid,
        })
    }

    /// ## Summary
    /// Resolves the start instant and the span of the event.
    ///
    /// The span is DTEND, else DURATION, else one day for whole-day starts,
    /// else zero. An end before the start is clamped to the start.
    ///
    /// ## Errors
    /// Returns `IncompleteEventDefinition` for impossible DTSTART or DTEND dates.
    pub fn timing<'a>(&self, normalizer: &DateTimeNormalizer<'a>) -> ImportResult<EventTiming<'a>> {
        let start = normalizer
            .normalize(&self.start)
            .ok_or_else(|| ImportError::incomplete(&self.uid, "DTSTART is not a valid date"))?;

        let mut end_civil = None;
        let span = match &self.end {
            EventEnd::DtEnd(raw) => {
                let end = normalizer
                    .normalize(raw)
                    .ok_or_else(|| ImportError::incomplete(&self.uid, "DTEND is not a valid date"))?;
                end_civil = Some(end.civil);
                if start.is_whole_day && end.is_whole_day {
                    Span::CivilDays((end.civil.date() - start.civil.date()).num_days())
                } else {
                    Span::Absolute(end.instant - start.instant)
                }
            }
            EventEnd::Duration(duration) => match duration.whole_days() {
                Some(days) if start.is_whole_day => Span::CivilDays(days),
                _ => Span::Absolute(duration.to_chrono()),
            },
            EventEnd::Unspecified if start.is_whole_day => Span::CivilDays(1),
            EventEnd::Unspecified => Span::Absolute(TimeDelta::zero()),
        };

        let end = span.end_from(normalizer, start.frame, start.instant, start.civil);
        let end_civil = end_civil.unwrap_or_else(|| normalizer.to_civil(start.frame, end));
        let all_day = start.is_whole_day
            || (end > start.instant
                && start.civil.time() == NaiveTime::MIN
                && end_civil.time() == NaiveTime::MIN);

        Ok(EventTiming {
            start,
            end,
            span,
            all_day,
        })
    }
}

fn categories(component: &Component) -> Vec<String> {
    component
        .get_properties("CATEGORIES")
        .flat_map(|prop| match &prop.value {
            Value::TextList(items) => items.clone(),
            Value::Text(item) if !item.trim().is_empty() => vec![item.trim().to_string()],
            _ => Vec::new(),
        })
        .collect()
}

fn date_list(component: &Component, name: &str) -> Vec<RawDateValue> {
    component
        .get_properties(name)
        .flat_map(RawDateValue::list_from_property)
        .collect()
}

/// Length of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Span {
    /// Elapsed time.
    Absolute(TimeDelta),
    /// Whole calendar days, which stay midnight-to-midnight across DST.
    CivilDays(i64),
}

impl Span {
    /// End of a span starting at `start`, never before it.
    #[must_use]
    pub fn end_from(
        self,
        normalizer: &DateTimeNormalizer<'_>,
        frame: Frame<'_>,
        start: DateTime<Utc>,
        civil: NaiveDateTime,
    ) -> DateTime<Utc> {
        let end = match self {
            Self::Absolute(delta) => start.checked_add_signed(delta),
            Self::CivilDays(days) => civil
                .checked_add_signed(TimeDelta::days(days))
                .map(|end| normalizer.to_utc(frame, end)),
        };
        end.map_or(start, |end| end.max(start))
    }
}

/// Start, end and all-day flag of a resolved event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EventTiming<'a> {
    pub start: NormalizedInstant<'a>,
    pub end: DateTime<Utc>,
    pub span: Span,
    pub all_day: bool,
}

/// An event definition together with its resolved timing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedEvent<'a> {
    pub definition: &'a EventDefinition,
    pub timing: EventTiming<'a>,
}

//! Expansion of recurring events into concrete instances.
//!
//! Rules are expanded on wall-clock values of the series' frame and each
//! instance is converted to an instant afterwards, so a series keeps its
//! civil time across DST in both IANA and calendar-declared zones.

use std::collections::HashMap;

use calreader_rfc::rfc::ical::core::{Frequency, RRule, RRuleUntil, WeekdayNum};
use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};

use super::event::ResolvedEvent;
use super::logger::ImportLogger;
use super::normalize::{DateTimeNormalizer, NormalizedInstant, RawDateValue};
use super::window::CachingWindow;
use crate::error::{ImportError, ImportResult};

/// Rule instances the engine may walk for one series.
const RULE_STEP_BUDGET: usize = 1_000_000;

/// An Override with its RECURRENCE-ID normalized to an instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedOverride<'a> {
    pub event: ResolvedEvent<'a>,
    pub recurrence_id: DateTime<Utc>,
}

type OverrideKey = (String, DateTime<Utc>);

/// Overrides keyed by UID and RECURRENCE-ID instant.
///
/// Every override sharing a key is consumed together; the first one in
/// document order is the one that takes effect.
#[derive(Debug, Default)]
pub struct OverrideIndex<'a> {
    overrides: Vec<ResolvedOverride<'a>>,
    by_key: HashMap<OverrideKey, Vec<usize>>,
    consumed: Vec<bool>,
}

impl<'a> OverrideIndex<'a> {
    #[must_use]
    pub fn new(overrides: Vec<ResolvedOverride<'a>>) -> Self {
        let mut by_key: HashMap<OverrideKey, Vec<usize>> = HashMap::new();
        for (index, found) in overrides.iter().enumerate() {
            by_key
                .entry((found.event.definition.uid.clone(), found.recurrence_id))
                .or_default()
                .push(index);
        }
        let consumed = vec![false; overrides.len()];
        Self {
            overrides,
            by_key,
            consumed,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.overrides.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.overrides.is_empty()
    }

    /// Takes the override replacing the instance at `recurrence_id`.
    pub fn take(&mut self, uid: &str, recurrence_id: DateTime<Utc>) -> Option<ResolvedOverride<'a>> {
        self.claim(uid, recurrence_id)
            .and_then(|index| self.overrides.get(index).copied())
    }

    /// Consumes the overrides of an instance the series excludes.
    pub fn suppress(&mut self, uid: &str, recurrence_id: DateTime<Utc>) {
        self.claim(uid, recurrence_id);
    }

    /// Overrides no instance consumed, one per key in document order.
    #[must_use]
    pub fn into_unconsumed(self) -> Vec<ResolvedOverride<'a>> {
        self.overrides
            .iter()
            .enumerate()
            .filter(|(index, found)| {
                self.consumed.get(*index) == Some(&false)
                    && self
                        .by_key
                        .get(&(found.event.definition.uid.clone(), found.recurrence_id))
                        .and_then(|indices| indices.first())
                        == Some(index)
            })
            .map(|(_, found)| *found)
            .collect()
    }

    fn claim(&mut self, uid: &str, recurrence_id: DateTime<Utc>) -> Option<usize> {
        let indices = self.by_key.get(&(uid.to_string(), recurrence_id))?;
        let first = indices
            .first()
            .copied()
            .filter(|&index| self.consumed.get(index) == Some(&false))?;
        for &index in indices {
            if let Some(flag) = self.consumed.get_mut(index) {
                *flag = true;
            }
        }
        Some(first)
    }
}

/// One retained instance of a series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SeriesInstance<'a> {
    /// The series template at a rule-computed start.
    Template {
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    },
    /// An Override replacing the instance wholesale.
    Overridden(ResolvedOverride<'a>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct InstanceStart {
    instant: DateTime<Utc>,
    civil: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UntilBound {
    /// Bound on the series' wall clock.
    Civil(NaiveDateTime),
    Instant(DateTime<Utc>),
}

impl UntilBound {
    fn admits(self, start: &InstanceStart) -> bool {
        match self {
            Self::Civil(civil) => start.civil <= civil,
            Self::Instant(instant) => start.instant <= instant,
        }
    }
}

/// Expands recurring events over a caching window.
pub struct RecurrenceExpander<'n, 'a> {
    normalizer: &'n DateTimeNormalizer<'a>,
    window: CachingWindow,
    max_instances: u16,
    logger: &'n dyn ImportLogger,
}

impl<'n, 'a> RecurrenceExpander<'n, 'a> {
    #[must_use]
    pub fn new(
        normalizer: &'n DateTimeNormalizer<'a>,
        window: CachingWindow,
        max_instances: u16,
        logger: &'n dyn ImportLogger,
    ) -> Self {
        Self {
            normalizer,
            window,
            max_instances,
            logger,
        }
    }

    /// ## Summary
    /// Expands a series near the window, net of EXDATEs and with overrides
    /// substituted.
    ///
    /// Instances are returned in start order. The bounds are padded, so the
    /// caller still applies the exact window test. Overrides whose
    /// RECURRENCE-ID the series excludes are consumed without output.
    ///
    /// ## Errors
    /// Returns `MalformedRecurrenceRule` when the rule or its UNTIL cannot be
    /// expanded.
    pub fn expand(
        &self,
        series: &ResolvedEvent<'a>,
        rule: &RRule,
        overrides: &mut OverrideIndex<'a>,
    ) -> ImportResult<Vec<SeriesInstance<'a>>> {
        let def = series.definition;
        let timing = &series.timing;

        let exdates: Vec<NormalizedInstant<'a>> = def
            .exdates
            .iter()
            .filter_map(|raw| self.normalizer.normalize(raw))
            .collect();
        for exdate in &exdates {
            overrides.suppress(&def.uid, exdate.instant);
        }

        let starts = self.instance_starts(series, rule)?;
        let mut instances = Vec::with_capacity(starts.len());
        for start in starts {
            if is_excluded(timing.start.is_whole_day, &exdates, &start) {
                continue;
            }
            if let Some(found) = overrides.take(&def.uid, start.instant) {
                instances.push(SeriesInstance::Overridden(found));
                continue;
            }
            let to = timing
                .span
                .end_from(self.normalizer, timing.start.frame, start.instant, start.civil);
            instances.push(SeriesInstance::Template {
                from: start.instant,
                to,
            });
        }
        Ok(instances)
    }

    fn instance_starts(
        &self,
        series: &ResolvedEvent<'a>,
        rule: &RRule,
    ) -> ImportResult<Vec<InstanceStart>> {
        let def = series.definition;
        let start = series.timing.start;
        let frame = start.frame;

        let reach = series.timing.end - start.instant;
        let pad = TimeDelta::days(1) + TimeDelta::seconds(1);
        let after = self
            .window
            .from
            .checked_sub_signed(reach + pad)
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let before = self
            .window
            .until
            .checked_add_signed(pad)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        let until = rule
            .until
            .as_ref()
            .map(|until| self.until_bound(&def.uid, until))
            .transpose()?;

        let after_civil = self.normalizer.to_civil(frame, after);
        let mut rule_before = before;
        if let Some(UntilBound::Instant(instant)) = until {
            rule_before = rule_before.min(instant + TimeDelta::seconds(1));
        }
        let mut before_civil = self.normalizer.to_civil(frame, rule_before);
        if let Some(UntilBound::Civil(civil)) = until {
            before_civil = before_civil.min(civil + TimeDelta::seconds(1));
        }

        let mut starts = Vec::new();
        if before_civil > after_civil {
            let civils = self.rule_civils(&def.uid, rule, start.civil, after_civil, before_civil)?;
            starts.extend(
                civils
                    .into_iter()
                    .map(|civil| InstanceStart {
                        instant: self.normalizer.to_utc(frame, civil),
                        civil,
                    })
                    .filter(|candidate| until.is_none_or(|bound| bound.admits(candidate))),
            );
        }

        for raw in &def.rdates {
            let Some(extra) = self.normalizer.normalize(raw) else {
                continue;
            };
            if extra.instant < after || extra.instant > before {
                continue;
            }
            starts.push(InstanceStart {
                instant: extra.instant,
                civil: self.normalizer.to_civil(frame, extra.instant),
            });
        }

        starts.sort_by_key(|candidate| candidate.instant);
        starts.dedup_by_key(|candidate| candidate.instant);
        Ok(starts)
    }

    /// Rule instances strictly between the bounds, as wall-clock values.
    ///
    /// The engine walks at most [`RULE_STEP_BUDGET`] instances, counted from
    /// the fast-forwarded anchor.
    fn rule_civils(
        &self,
        uid: &str,
        rule: &RRule,
        anchor: NaiveDateTime,
        after: NaiveDateTime,
        before: NaiveDateTime,
    ) -> ImportResult<Vec<NaiveDateTime>> {
        let mut engine_rule = expansion_rule(rule);
        let anchor = fast_forward(&mut engine_rule, anchor, after);
        if engine_rule.count == Some(0) {
            return Ok(Vec::new());
        }

        let parsed = engine_rule
            .to_string()
            .parse::<rrule::RRule<rrule::Unvalidated>>()
            .map_err(|err| ImportError::malformed_rule(uid, err.to_string()))?;
        let set = parsed
            .build(wall_clock(anchor))
            .map_err(|err| ImportError::malformed_rule(uid, err.to_string()))?
            .limit();

        let cap = usize::from(self.max_instances);
        let mut civils = Vec::new();
        for (step, date) in (&set).into_iter().enumerate() {
            let civil = date.naive_utc();
            if civil >= before {
                break;
            }
            if step >= RULE_STEP_BUDGET {
                self.logger.debug(&format!(
                    "Event '{uid}' was stopped after {RULE_STEP_BUDGET} rule steps"
                ));
                break;
            }
            if civil <= after {
                continue;
            }
            civils.push(civil);
            if civils.len() >= cap {
                self.logger.debug(&format!(
                    "Event '{uid}' was cut off at {} instances",
                    self.max_instances
                ));
                break;
            }
        }
        Ok(civils)
    }

    fn until_bound(&self, uid: &str, until: &RRuleUntil) -> ImportResult<UntilBound> {
        let bound = match until {
            RRuleUntil::Date(date) => date
                .to_naive()
                .and_then(|day| day.and_hms_opt(23, 59, 59))
                .map(UntilBound::Civil),
            RRuleUntil::DateTime(dt) if dt.is_floating() => dt.to_naive().map(UntilBound::Civil),
            RRuleUntil::DateTime(dt) => self
                .normalizer
                .normalize(&RawDateValue::from_datetime(dt, None))
                .map(|normalized| UntilBound::Instant(normalized.instant)),
        };
        bound.ok_or_else(|| ImportError::malformed_rule(uid, format!("invalid UNTIL '{until}'")))
    }
}

/// Wall-clock values are carried through the rule engine as UTC.
fn wall_clock(civil: NaiveDateTime) -> DateTime<rrule::Tz> {
    civil.and_utc().with_timezone(&rrule::Tz::UTC)
}

fn is_excluded(
    series_whole_day: bool,
    exdates: &[NormalizedInstant<'_>],
    start: &InstanceStart,
) -> bool {
    exdates.iter().any(|exdate| {
        if series_whole_day || exdate.is_whole_day {
            exdate.civil.date() == start.civil.date()
        } else {
            exdate.instant == start.instant
        }
    })
}

/// ## Summary
/// Moves the anchor of a fixed-period rule forward by whole periods.
///
/// The anchor lands at or before `target`, so no instance after it is lost.
/// A COUNT is reduced by the instances of the skipped periods, which is only
/// known when every period yields the same number of them; other counted
/// rules keep their anchor.
fn fast_forward(rule: &mut RRule, anchor: NaiveDateTime, target: NaiveDateTime) -> NaiveDateTime {
    let Some(step) = rule.freq.and_then(Frequency::fixed_step_seconds) else {
        return anchor;
    };
    let per_period = instances_per_period(rule);
    if rule.count.is_some() && per_period.is_none() {
        return anchor;
    }
    let period = step.saturating_mul(i64::from(rule.interval_or_default()));
    let behind = (target - anchor).num_seconds();
    if behind <= period {
        return anchor;
    }
    let periods = behind / period;
    let Some(shifted) = TimeDelta::try_seconds(periods * period)
        .and_then(|shift| anchor.checked_add_signed(shift))
    else {
        return anchor;
    };
    if let (Some(count), Some(per_period)) = (rule.count, per_period) {
        let skipped = u64::try_from(periods)
            .unwrap_or(u64::MAX)
            .saturating_mul(u64::from(per_period));
        rule.count = Some(u32::try_from(u64::from(count).saturating_sub(skipped)).unwrap_or(0));
    }
    shifted
}

/// Instances each period of a fixed-period rule yields, if that number does
/// not depend on the period.
///
/// Holds when every BY part is finer than the frequency, each one multiplying
/// the instances of a period. A part that filters periods breaks it.
fn instances_per_period(rule: &RRule) -> Option<u32> {
    let freq = rule.freq?;
    if !(rule.by_monthday.is_empty()
        && rule.by_yearday.is_empty()
        && rule.by_weekno.is_empty()
        && rule.by_month.is_empty()
        && rule.by_setpos.is_empty())
    {
        return None;
    }
    let parts = [
        (Frequency::Secondly, distinct(&rule.by_second)),
        (Frequency::Minutely, distinct(&rule.by_minute)),
        (Frequency::Hourly, distinct(&rule.by_hour)),
        (Frequency::Daily, rule.by_day.len()),
    ];
    let mut per_period: u32 = 1;
    for (unit, len) in parts {
        if len == 0 {
            continue;
        }
        if granularity(unit) >= granularity(freq) {
            return None;
        }
        per_period = per_period.saturating_mul(u32::try_from(len).ok()?);
    }
    Some(per_period)
}

const fn granularity(freq: Frequency) -> u8 {
    match freq {
        Frequency::Secondly => 0,
        Frequency::Minutely => 1,
        Frequency::Hourly => 2,
        Frequency::Daily => 3,
        Frequency::Weekly => 4,
        Frequency::Monthly => 5,
        Frequency::Yearly => 6,
    }
}

fn distinct(values: &[u8]) -> usize {
    let mut sorted = values.to_vec();
    sorted.sort_unstable();
    sorted.dedup();
    sorted.len()
}

/// The rule handed to the engine: no UNTIL, and BYDAY ordinals only where
/// the frequency gives them a meaning.
fn expansion_rule(rule: &RRule) -> RRule {
    let mut flat = rule.clone();
    flat.until = None;
    if !flat.freq.is_some_and(Frequency::allows_weekday_ordinals) {
        let mut days = Vec::with_capacity(flat.by_day.len());
        for day in flat.by_day.iter().copied().map(WeekdayNum::without_ordinal) {
            if !days.contains(&day) {
                days.push(day);
            }
        }
        flat.by_day = days;
    }
    flat
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::event::{EventDefinition, EventKind, RecurrenceRule};
    use crate::import::logger::TracingLogger;
    use calreader_rfc::rfc::ical::core::Weekday;
    use calreader_rfc::rfc::ical::expand::build_timezone_resolver;
    use calreader_rfc::rfc::ical::parse;
    use chrono::TimeZone;
    use chrono_tz::Tz;

    struct Expanded {
        instances: Vec<(DateTime<Utc>, DateTime<Utc>, String)>,
        unconsumed: Vec<String>,
    }

    fn window(from: DateTime<Utc>, until: DateTime<Utc>) -> CachingWindow {
        CachingWindow { from, until }
    }

    fn utc(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn expand(body: &str, zone: Tz, window: CachingWindow, max: u16) -> ImportResult<Expanded> {
        let text = format!("BEGIN:VCALENDAR\r\nVERSION:2.0\r\n{body}END:VCALENDAR\r\n");
        let ical = parse(&text).unwrap();
        let (resolver, _) = build_timezone_resolver(&ical);
        let normalizer = DateTimeNormalizer::new(&resolver, zone, &TracingLogger);
        let defs: Vec<EventDefinition> = ical
            .events()
            .into_iter()
            .map(|c| EventDefinition::from_component(c).unwrap())
            .collect();

        let mut series = None;
        let mut overrides = Vec::new();
        for def in &defs {
            let event = ResolvedEvent {
                definition: def,
                timing: def.timing(&normalizer).unwrap(),
            };
            match &def.kind {
                EventKind::Recurring(RecurrenceRule::Valid(rule)) => {
                    series = Some((event, rule.as_ref()));
                }
                EventKind::Override(raw) => overrides.push(ResolvedOverride {
                    event,
                    recurrence_id: normalizer.normalize(raw).unwrap().instant,
                }),
                _ => {}
            }
        }

        let (series, rule) = series.unwrap();
        let mut index = OverrideIndex::new(overrides);
        let expander = RecurrenceExpander::new(&normalizer, window, max, &TracingLogger);
        let instances = expander
            .expand(&series, rule, &mut index)?
            .into_iter()
            .map(|instance| match instance {
                SeriesInstance::Template { from, to } => {
                    (from, to, series.definition.summary.clone())
                }
                SeriesInstance::Overridden(found) => (
                    found.event.timing.start.instant,
                    found.event.timing.end,
                    found.event.definition.summary.clone(),
                ),
            })
            .collect();
        let unconsumed = index
            .into_unconsumed()
            .into_iter()
            .map(|found| found.event.definition.summary.clone())
            .collect();
        Ok(Expanded {
            instances,
            unconsumed,
        })
    }

    fn starts(expanded: &Expanded) -> Vec<DateTime<Utc>> {
        expanded.instances.iter().map(|(from, _, _)| *from).collect()
    }

    #[test]
    fn zoned_series_keeps_civil_time_and_span() {
        let expanded = expand(
            "BEGIN:VEVENT\r\nUID:w\r\nSUMMARY:Weekly\r\n\
DTSTART;TZID=Europe/Berlin:20230301T090000\r\n\
DTEND;TZID=Europe/Berlin:20230301T100000\r\n\
RRULE:FREQ=WEEKLY\r\nEND:VEVENT\r\n",
            Tz::UTC,
            window(utc(2023, 3, 20, 0), utc(2023, 4, 3, 0)),
            100,
        )
        .unwrap();

        assert_eq!(starts(&expanded), vec![utc(2023, 3, 22, 8), utc(2023, 3, 29, 7)]);
        assert!(
            expanded
                .instances
                .iter()
                .all(|(from, to, _)| (*to - *from).num_seconds() == 3600)
        );
    }

    #[test]
    fn declared_zone_series_follows_its_rule() {
        let expanded = expand(
            "BEGIN:VTIMEZONE\r\nTZID:Office Time\r\n\
BEGIN:STANDARD\r\nDTSTART:16010101T030000\r\nTZOFFSETFROM:+0200\r\nTZOFFSETTO:+0100\r\n\
RRULE:FREQ=YEARLY;BYDAY=-1SU;BYMONTH=10\r\nEND:STANDARD\r\n\
BEGIN:DAYLIGHT\r\nDTSTART:16010101T020000\r\nTZOFFSETFROM:+0100\r\nTZOFFSETTO:+0200\r\n\
RRULE:FREQ=YEARLY;BYDAY=-1SU;BYMONTH=3\r\nEND:DAYLIGHT\r\nEND:VTIMEZONE\r\n\
BEGIN:VEVENT\r\nUID:d\r\nSUMMARY:Daily\r\n\
DTSTART;TZID=Office Time:20230324T090000\r\n\
DTEND;TZID=Office Time:20230324T093000\r\n\
RRULE:FREQ=DAILY\r\nEND:VEVENT\r\n",
            Tz::UTC,
            window(utc(2023, 3, 24, 0), utc(2023, 3, 28, 0)),
            100,
        )
        .unwrap();

        assert_eq!(
            starts(&expanded),
            vec![
                utc(2023, 3, 24, 8),
                utc(2023, 3, 25, 8),
                utc(2023, 3, 26, 7),
                utc(2023, 3, 27, 7),
                utc(2023, 3, 28, 7),
            ]
        );
    }

    #[test_log::test]
    fn high_frequency_rule_is_bounded() {
        let from = utc(2023, 4, 5, 0);
        let expanded = expand(
            "BEGIN:VEVENT\r\nUID:s\r\nDTSTART:20200101T000000Z\r\nRRULE:FREQ=SECONDLY\r\nEND:VEVENT\r\n",
            Tz::UTC,
            window(from, from + TimeDelta::minutes(1)),
            100,
        )
        .unwrap();

        assert_eq!(expanded.instances.len(), 100);
        assert!(starts(&expanded)[0] >= from - TimeDelta::days(1) - TimeDelta::seconds(2));
    }

    #[test]
    fn weekly_ordinals_are_flattened() {
        let expanded = expand(
            "BEGIN:VEVENT\r\nUID:o\r\nDTSTART:20230403T090000Z\r\n\
RRULE:FREQ=WEEKLY;BYDAY=1MO\r\nEND:VEVENT\r\n",
            Tz::UTC,
            window(utc(2023, 4, 1, 0), utc(2023, 4, 22, 0)),
            100,
        )
        .unwrap();

        assert_eq!(
            starts(&expanded),
            vec![utc(2023, 4, 3, 9), utc(2023, 4, 10, 9), utc(2023, 4, 17, 9)]
        );
    }

    #[test]
    fn exdates_and_overrides() {
        let expanded = expand(
            "BEGIN:VEVENT\r\nUID:x\r\nSUMMARY:Weekly\r\n\
DTSTART:20230403T090000Z\r\nDTEND:20230403T100000Z\r\n\
RRULE:FREQ=WEEKLY;COUNT=4\r\nEXDATE:20230410T090000Z\r\nEND:VEVENT\r\n\
BEGIN:VEVENT\r\nUID:x\r\nSUMMARY:Changed\r\nRECURRENCE-ID:20230417T090000Z\r\n\
DTSTART:20230417T140000Z\r\nDTEND:20230417T150000Z\r\nEND:VEVENT\r\n\
BEGIN:VEVENT\r\nUID:x\r\nSUMMARY:Duplicate\r\nRECURRENCE-ID:20230417T090000Z\r\n\
DTSTART:20230417T160000Z\r\nEND:VEVENT\r\n\
BEGIN:VEVENT\r\nUID:x\r\nSUMMARY:Excluded\r\nRECURRENCE-ID:20230410T090000Z\r\n\
DTSTART:20230410T090000Z\r\nEND:VEVENT\r\n\
BEGIN:VEVENT\r\nUID:x\r\nSUMMARY:Orphan\r\nRECURRENCE-ID:20230501T090000Z\r\n\
DTSTART:20230501T090000Z\r\nEND:VEVENT\r\n",
            Tz::UTC,
            window(utc(2023, 4, 1, 0), utc(2023, 5, 10, 0)),
            100,
        )
        .unwrap();

        let summary: Vec<(DateTime<Utc>, &str)> = expanded
            .instances
            .iter()
            .map(|(from, _, name)| (*from, name.as_str()))
            .collect();
        assert_eq!(
            summary,
            vec![
                (utc(2023, 4, 3, 9), "Weekly"),
                (utc(2023, 4, 17, 14), "Changed"),
                (utc(2023, 4, 24, 9), "Weekly"),
            ]
        );
        assert_eq!(expanded.unconsumed, vec!["Orphan"]);
    }

    #[test]
    fn until_is_inclusive() {
        let expanded = expand(
            "BEGIN:VEVENT\r\nUID:u\r\nDTSTART:20230403T090000Z\r\n\
RRULE:FREQ=DAILY;UNTIL=20230405T090000Z\r\nEND:VEVENT\r\n",
            Tz::UTC,
            window(utc(2023, 4, 1, 0), utc(2023, 4, 30, 0)),
            100,
        )
        .unwrap();
        assert_eq!(expanded.instances.len(), 3);

        let expanded = expand(
            "BEGIN:VEVENT\r\nUID:u\r\nDTSTART;VALUE=DATE:20230403\r\n\
RRULE:FREQ=DAILY;UNTIL=20230405\r\nEND:VEVENT\r\n",
            chrono_tz::Europe::Berlin,
            window(utc(2023, 4, 1, 0), utc(2023, 4, 30, 0)),
            100,
        )
        .unwrap();
        assert_eq!(expanded.instances.len(), 3);
    }

    #[test]
    fn rdates_join_the_series() {
        let expanded = expand(
            "BEGIN:VEVENT\r\nUID:r\r\nDTSTART:20230403T090000Z\r\n\
RRULE:FREQ=WEEKLY;COUNT=2\r\nRDATE:20230405T120000Z\r\nEND:VEVENT\r\n",
            Tz::UTC,
            window(utc(2023, 4, 1, 0), utc(2023, 4, 30, 0)),
            100,
        )
        .unwrap();

        assert_eq!(
            starts(&expanded),
            vec![utc(2023, 4, 3, 9), utc(2023, 4, 5, 12), utc(2023, 4, 10, 9)]
        );
    }

    #[test]
    fn whole_day_exdate_matches_by_date() {
        let expanded = expand(
            "BEGIN:VEVENT\r\nUID:a\r\nDTSTART;VALUE=DATE:20230403\r\n\
RRULE:FREQ=DAILY;COUNT=3\r\nEXDATE;VALUE=DATE:20230404\r\nEND:VEVENT\r\n",
            chrono_tz::Europe::Berlin,
            window(utc(2023, 4, 1, 0), utc(2023, 4, 30, 0)),
            100,
        )
        .unwrap();

        assert_eq!(starts(&expanded), vec![utc(2023, 4, 2, 22), utc(2023, 4, 4, 22)]);
        assert!(
            expanded
                .instances
                .iter()
                .all(|(from, to, _)| *to - *from == TimeDelta::days(1))
        );
    }

    #[test]
    fn engine_rejection_is_malformed() {
        let result = expand(
            "BEGIN:VEVENT\r\nUID:bad\r\nDTSTART:20230403T090000Z\r\n\
RRULE:FREQ=MONTHLY;BYMONTH=13\r\nEND:VEVENT\r\n",
            Tz::UTC,
            window(utc(2023, 4, 1, 0), utc(2023, 4, 30, 0)),
            100,
        );
        assert!(matches!(
            result,
            Err(ImportError::MalformedRecurrenceRule { uid, .. }) if uid == "bad"
        ));
    }

    #[test]
    fn dtstart_off_the_pattern_is_not_an_instance() {
        // 2023-04-03 is a Monday
        let expanded = expand(
            "BEGIN:VEVENT\r\nUID:t\r\nDTSTART:20230403T090000Z\r\n\
RRULE:FREQ=WEEKLY;BYDAY=TU;COUNT=2\r\nEND:VEVENT\r\n",
            Tz::UTC,
            window(utc(2023, 4, 1, 0), utc(2023, 4, 30, 0)),
            100,
        )
        .unwrap();

        assert_eq!(starts(&expanded), vec![utc(2023, 4, 4, 9), utc(2023, 4, 11, 9)]);
    }

    #[test_log::test]
    fn counted_high_frequency_rule_reaches_the_window() {
        let from = utc(2023, 4, 4, 0);
        let expanded = expand(
            "BEGIN:VEVENT\r\nUID:c\r\nDTSTART:20220101T000000Z\r\n\
RRULE:FREQ=SECONDLY;COUNT=4000000000\r\nEND:VEVENT\r\n",
            Tz::UTC,
            window(from, utc(2023, 4, 13, 0)),
            100,
        )
        .unwrap();

        assert_eq!(expanded.instances.len(), 100);
        assert!(starts(&expanded)[0] >= from - TimeDelta::days(1) - TimeDelta::seconds(2));
    }

    #[test]
    fn counted_rule_spent_before_the_window() {
        let expanded = expand(
            "BEGIN:VEVENT\r\nUID:e\r\nDTSTART:20220101T090000Z\r\n\
RRULE:FREQ=DAILY;COUNT=10\r\nEND:VEVENT\r\n",
            Tz::UTC,
            window(utc(2023, 4, 1, 0), utc(2023, 4, 30, 0)),
            100,
        )
        .unwrap();

        assert!(expanded.instances.is_empty());
    }

    #[test]
    fn position_rule_starts_near_the_window() {
        let expanded = expand(
            "BEGIN:VEVENT\r\nUID:p\r\nDTSTART:20130101T000000Z\r\n\
RRULE:FREQ=HOURLY;BYMINUTE=0,30;BYSETPOS=1\r\nEND:VEVENT\r\n",
            Tz::UTC,
            window(utc(2023, 4, 5, 0), utc(2023, 4, 5, 6)),
            100,
        )
        .unwrap();

        let found = starts(&expanded);
        assert_eq!(found.len(), 55);
        assert_eq!(found[0], utc(2023, 4, 4, 0));
        assert_eq!(found[54], utc(2023, 4, 6, 6));
    }

    #[test]
    fn fast_forward_keeps_phase() {
        let mut rule = RRule::with_freq(Frequency::Daily);
        rule.interval = Some(2);
        let anchor = utc(2023, 1, 1, 9).naive_utc();
        let target = utc(2023, 1, 10, 0).naive_utc();
        assert_eq!(
            fast_forward(&mut rule.clone(), anchor, target),
            utc(2023, 1, 9, 9).naive_utc()
        );

        // four periods with one instance each are skipped
        let mut counted = RRule {
            count: Some(5),
            ..rule.clone()
        };
        assert_eq!(
            fast_forward(&mut counted, anchor, target),
            utc(2023, 1, 9, 9).naive_utc()
        );
        assert_eq!(counted.count, Some(1));

        let mut filtered = RRule {
            count: Some(5),
            by_month: vec![1],
            ..rule
        };
        assert_eq!(fast_forward(&mut filtered, anchor, target), anchor);
        assert_eq!(filtered.count, Some(5));
    }

    #[test]
    fn fast_forward_counts_every_weekday_of_a_period() {
        let mut rule = RRule {
            count: Some(10),
            by_day: vec![
                WeekdayNum::every(Weekday::Monday),
                WeekdayNum::every(Weekday::Wednesday),
            ],
            ..RRule::with_freq(Frequency::Weekly)
        };
        let anchor = utc(2023, 1, 2, 9).naive_utc();
        let target = utc(2023, 1, 20, 0).naive_utc();

        assert_eq!(
            fast_forward(&mut rule, anchor, target),
            utc(2023, 1, 16, 9).naive_utc()
        );
        assert_eq!(rule.count, Some(6));
    }
}

//! Calendar import: raw iCalendar text in, window-bounded occurrences out.
//!
//! Each call parses the text, builds its own timezone table, expands the
//! recurring events and returns the occurrences sorted by start. Nothing is
//! shared between calls.

pub mod event;
pub mod logger;
pub mod normalize;
pub mod occurrence;
pub mod recurrence;
pub mod window;

pub use event::{
    AlarmTrigger, EventDefinition, EventEnd, EventKind, EventTiming, RecurrenceRule,
    ResolvedEvent, Span,
};
pub use logger::{FnLogger, ImportLogger, TracingLogger};
pub use normalize::{DateTimeNormalizer, Frame, NormalizedInstant, RawDateValue};
pub use occurrence::{Occurrence, OccurrenceAssembler};
pub use recurrence::{OverrideIndex, RecurrenceExpander, ResolvedOverride, SeriesInstance};
pub use window::{CachingWindow, filter_and_sort};

use calreader_core::config::ImportConfig;
use calreader_core::constants::{DEFAULT_DAYS_AHEAD, DEFAULT_DAYS_BACK, DEFAULT_MAX_INSTANCES};
use calreader_core::error::CoreResult;
use calreader_rfc::rfc::ical::core::RRule;
use calreader_rfc::rfc::ical::expand::build_timezone_resolver;
use calreader_rfc::rfc::ical::parse;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use crate::error::{ImportError, ImportResult};

/// Window and zone settings of one import.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportOptions {
    pub days_back: u32,
    pub days_ahead: u32,
    /// Zone whole-day and floating values are read in and output is reported in.
    pub time_zone: Tz,
    /// Cap on instances of a single recurring event.
    pub max_instances: u16,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            days_back: DEFAULT_DAYS_BACK,
            days_ahead: DEFAULT_DAYS_AHEAD,
            time_zone: Tz::UTC,
            max_instances: DEFAULT_MAX_INSTANCES,
        }
    }
}

impl ImportOptions {
    /// ## Summary
    /// Builds options from the `import` configuration section.
    ///
    /// ## Errors
    /// Returns `CoreError::UnknownTimeZone` if the configured zone is not an IANA name.
    pub fn from_config(config: &ImportConfig) -> CoreResult<Self> {
        Ok(Self {
            days_back: config.days_back,
            days_ahead: config.days_ahead,
            time_zone: config.time_zone()?,
            max_instances: config.max_instances,
        })
    }
}

/// ## Summary
/// Imports a calendar, returning its occurrences within the caching window.
///
/// Problems with single events are logged and the event is skipped. When the
/// text cannot be parsed at all the error is logged and the result is empty;
/// use [`try_import_calendar`] to tell that apart from an empty calendar.
#[must_use]
pub fn import_calendar(
    raw: &str,
    options: &ImportOptions,
    now: DateTime<Utc>,
    logger: &dyn ImportLogger,
) -> Vec<Occurrence> {
    match try_import_calendar(raw, options, now, logger) {
        Ok(occurrences) => occurrences,
        Err(err) => {
            logger.error(&err.to_string());
            Vec::new()
        }
    }
}

/// ## Summary
/// Imports a calendar, surfacing a parse failure as an error.
///
/// ## Errors
/// Returns `ImportError::ParseFailure` when the text has no readable
/// calendar structure. Every other problem is recovered from and logged.
#[tracing::instrument(skip_all, fields(input_len = raw.len()))]
pub fn try_import_calendar(
    raw: &str,
    options: &ImportOptions,
    now: DateTime<Utc>,
    logger: &dyn ImportLogger,
) -> ImportResult<Vec<Occurrence>> {
    let ical = parse(raw)?;

    let window = CachingWindow::around(now, options.days_back, options.days_ahead, options.time_zone);
    logger.debug(&format!("Caching window {window}"));

    let (resolver, timezone_errors) = build_timezone_resolver(&ical);
    for err in &timezone_errors {
        logger.warn(&format!("Ignoring VTIMEZONE: {err}"));
    }
    let normalizer = DateTimeNormalizer::new(&resolver, options.time_zone, logger);

    let definitions: Vec<EventDefinition> = ical
        .events()
        .into_iter()
        .filter_map(|component| match EventDefinition::from_component(component) {
            Ok(definition) => Some(definition),
            Err(err) => {
                logger.error(&err.to_string());
                None
            }
        })
        .collect();

    let classified = Classified::sort_out(&definitions, &normalizer, &window, logger);
    let assembler = OccurrenceAssembler::new(&normalizer);
    let mut occurrences: Vec<Occurrence> = classified
        .simple
        .iter()
        .map(|event| assembler.assemble_event(event))
        .collect();

    let mut overrides = OverrideIndex::new(classified.overrides);
    let expander = RecurrenceExpander::new(&normalizer, window, options.max_instances, logger);
    for (series, rule) in &classified.series {
        match expander.expand(series, rule, &mut overrides) {
            Ok(instances) => {
                occurrences.extend(instances.into_iter().map(|instance| match instance {
                    SeriesInstance::Template { from, to } => {
                        assembler.assemble(series.definition, from, to, series.timing.all_day)
                    }
                    SeriesInstance::Overridden(found) => assembler.assemble_event(&found.event),
                }));
            }
            Err(err) => logger.error(&err.to_string()),
        }
    }
    occurrences.extend(
        overrides
            .into_unconsumed()
            .iter()
            .map(|found| assembler.assemble_event(&found.event)),
    );

    let result = filter_and_sort(occurrences, &window, logger);
    logger.debug(&format!("Imported {} occurrences", result.len()));
    Ok(result)
}

/// Resolved events grouped by how they take part in the import.
struct Classified<'a> {
    simple: Vec<ResolvedEvent<'a>>,
    series: Vec<(ResolvedEvent<'a>, &'a RRule)>,
    overrides: Vec<ResolvedOverride<'a>>,
}

impl<'a> Classified<'a> {
    /// Resolves each definition's timing and sorts it into its group.
    ///
    /// Simple and recurring events starting after the window are dropped
    /// here. Overrides always stay, as a moved instance still replaces its
    /// original slot.
    fn sort_out(
        definitions: &'a [EventDefinition],
        normalizer: &DateTimeNormalizer<'a>,
        window: &CachingWindow,
        logger: &dyn ImportLogger,
    ) -> Self {
        let mut classified = Self {
            simple: Vec::new(),
            series: Vec::new(),
            overrides: Vec::new(),
        };

        for definition in definitions {
            let timing = match definition.timing(normalizer) {
                Ok(timing) => timing,
                Err(err) => {
                    logger.error(&err.to_string());
                    continue;
                }
            };
            let event = ResolvedEvent { definition, timing };

            match &definition.kind {
                EventKind::Override(raw_id) => match normalizer.normalize(raw_id) {
                    Some(recurrence_id) => classified.overrides.push(ResolvedOverride {
                        event,
                        recurrence_id: recurrence_id.instant,
                    }),
                    None => logger.error(
                        &ImportError::incomplete(&definition.uid, "RECURRENCE-ID is not a valid date")
                            .to_string(),
                    ),
                },
                _ if timing.start.instant > window.until => {
                    logger.debug(&format!(
                        "Event '{}' starts after the cached time, skipping",
                        definition.uid
                    ));
                }
                EventKind::Simple => classified.simple.push(event),
                EventKind::Recurring(RecurrenceRule::Valid(rule)) => {
                    classified.series.push((event, rule.as_ref()));
                }
                EventKind::Recurring(RecurrenceRule::Malformed(text)) => logger.error(
                    &ImportError::malformed_rule(&definition.uid, format!("unreadable RRULE '{text}'"))
                        .to_string(),
                ),
            }
        }
        classified
    }
}

//! iCalendar document parser (RFC 5545).
//!
//! Parses complete iCalendar documents into an immutable component tree.
//! Structure errors fail the document; anything smaller is tolerated.

use std::iter::Peekable;

use super::error::{ParseError, ParseErrorKind, ParseResult};
use super::lexer::{parse_content_line, split_lines};
use super::values::{
    looks_like_date, parse_date, parse_datetime, parse_duration, parse_integer, parse_rrule,
    parse_utc_offset, split_text_list, unescape_text,
};
use crate::rfc::ical::core::{Component, ComponentKind, ContentLine, ICalendar, Property, Value};

const BOM: char = '\u{feff}';

/// Parses an iCalendar document from a string.
///
/// Content lines that cannot be tokenized are skipped with a warning, and
/// values that do not parse as their type are kept as [`Value::Unknown`].
///
/// ## Errors
///
/// Returns an error if there is no `BEGIN` line, the root is not VCALENDAR,
/// or a component is left open or closed with the wrong name.
#[tracing::instrument(skip(input), fields(input_len = input.len()))]
pub fn parse(input: &str) -> ParseResult<ICalendar> {
    tracing::debug!("Parsing iCalendar document");

    let input = input.strip_prefix(BOM).unwrap_or(input);
    let lines = split_lines(input);

    if lines.is_empty() {
        tracing::warn!("Empty iCalendar input");
        return Err(ParseError::new(ParseErrorKind::MissingBegin, 1, 1));
    }

    tracing::trace!(count = lines.len(), "Split lines");

    let mut iter = lines
        .into_iter()
        .filter_map(|(line_num, line)| match parse_content_line(&line, line_num) {
            Ok(cl) => Some((line_num, cl)),
            Err(e) => {
                tracing::warn!(line = line_num, error = %e, "Skipping malformed content line");
                None
            }
        })
        .skip_while(|(_, cl)| cl.name != "BEGIN")
        .peekable();

    let Some((begin_line, begin)) = iter.next() else {
        tracing::warn!("No BEGIN line found");
        return Err(ParseError::new(ParseErrorKind::MissingBegin, 1, 1));
    };

    let root = parse_component(&mut iter, begin_line, &begin.raw_value)?;

    if root.kind != ComponentKind::Calendar {
        tracing::warn!(name = %root.name, "Root component is not VCALENDAR");
        return Err(ParseError::new(ParseErrorKind::MissingBegin, begin_line, 1)
            .with_context(format!("expected VCALENDAR, found {}", root.name)));
    }

    if iter.peek().is_some() {
        tracing::debug!("Ignoring content after END:VCALENDAR");
    }

    tracing::debug!(
        events = root.children_of_kind(ComponentKind::Event).count(),
        timezones = root.children_of_kind(ComponentKind::Timezone).count(),
        "iCalendar document parsed"
    );

    Ok(ICalendar { root })
}

/// Parses the body of a component whose `BEGIN` line was already consumed.
fn parse_component(
    iter: &mut Peekable<impl Iterator<Item = (usize, ContentLine)>>,
    begin_line: usize,
    name: &str,
) -> ParseResult<Component> {
    let mut component = Component::named(name.trim());
    let mut last_line = begin_line;

    loop {
        let Some((line_num, content_line)) = iter.next() else {
            return Err(ParseError::new(ParseErrorKind::MissingEnd, last_line, 1)
                .with_context(format!("missing END:{}", component.name)));
        };
        last_line = line_num;

        match content_line.name.as_str() {
            "BEGIN" => {
                let child = parse_component(iter, line_num, &content_line.raw_value)?;
                if child.kind == ComponentKind::Calendar {
                    return Err(ParseError::new(ParseErrorKind::InvalidNesting, line_num, 1)
                        .with_context("nested VCALENDAR"));
                }
                component.add_child(child);
            }
            "END" => {
                let end_name = content_line.raw_value.trim().to_ascii_uppercase();
                if end_name != component.name {
                    return Err(
                        ParseError::new(ParseErrorKind::MismatchedComponent, line_num, 1)
                            .with_context(format!(
                                "expected END:{}, found END:{end_name}",
                                component.name
                            )),
                    );
                }
                return Ok(component);
            }
            _ => component.add_property(parse_property(content_line, line_num)),
        }
    }
}

/// Parses a property from a content line, resolving the value type.
fn parse_property(cl: ContentLine, line_num: usize) -> Property {
    let value_type = determine_value_type(&cl);
    let value = match parse_value(&cl, value_type, line_num) {
        Ok(value) => value,
        Err(e) => {
            tracing::debug!(
                property = %cl.name,
                error = %e,
                "Keeping unparsable value as raw text"
            );
            Value::Unknown(cl.raw_value.clone())
        }
    };
    Property::from_content_line(cl, value)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ValueType {
    Date,
    DateTime,
    Duration,
    Integer,
    Recur,
    Text,
    TextList,
    UtcOffset,
    Unknown,
}

impl ValueType {
    fn from_param(s: &str) -> Self {
        match s.to_ascii_uppercase().as_str() {
            "DATE" => Self::Date,
            "DATE-TIME" => Self::DateTime,
            "DURATION" => Self::Duration,
            "INTEGER" => Self::Integer,
            "RECUR" => Self::Recur,
            "TEXT" => Self::Text,
            "UTC-OFFSET" => Self::UtcOffset,
            _ => Self::Unknown,
        }
    }
}

/// Determines the value type for a property.
fn determine_value_type(cl: &ContentLine) -> ValueType {
    if let Some(value_type) = cl.value_type() {
        return ValueType::from_param(value_type);
    }

    let raw = cl.raw_value.trim();
    match cl.name.as_str() {
        "DTSTART" | "DTEND" | "RECURRENCE-ID" | "EXDATE" | "RDATE" => {
            let first = raw.split(',').next().unwrap_or(raw).trim();
            if looks_like_date(first) {
                ValueType::Date
            } else {
                ValueType::DateTime
            }
        }
        "DURATION" | "TRIGGER" => {
            if raw.starts_with(['P', 'p', '+', '-']) {
                ValueType::Duration
            } else {
                ValueType::DateTime
            }
        }
        "SEQUENCE" | "REPEAT" | "PRIORITY" => ValueType::Integer,
        "RRULE" => ValueType::Recur,
        "TZOFFSETFROM" | "TZOFFSETTO" => ValueType::UtcOffset,
        "CATEGORIES" => ValueType::TextList,
        _ => ValueType::Text,
    }
}

/// Parses a raw value string into a typed Value.
///
/// DATE and DATE-TIME accept comma-separated lists, which become
/// `DateList` / `DateTimeList` when more than one item is present.
fn parse_value(cl: &ContentLine, value_type: ValueType, line_num: usize) -> ParseResult<Value> {
    let raw = cl.raw_value.trim();
    let col = cl.name.len() + 2;

    match value_type {
        ValueType::Text => Ok(Value::Text(unescape_text(&cl.raw_value))),
        ValueType::TextList => Ok(Value::TextList(split_text_list(&cl.raw_value))),
        ValueType::DateTime => {
            let mut items = raw
                .split(',')
                .map(|s| parse_datetime(s.trim(), cl.tzid(), line_num, col))
                .collect::<ParseResult<Vec<_>>>()?;
            if items.len() == 1
                && let Some(dt) = items.pop()
            {
                return Ok(Value::DateTime(dt));
            }
            Ok(Value::DateTimeList(items))
        }
        ValueType::Date => {
            let mut items = raw
                .split(',')
                .map(|s| parse_date(s.trim(), line_num, col))
                .collect::<ParseResult<Vec<_>>>()?;
            if items.len() == 1
                && let Some(d) = items.pop()
            {
                return Ok(Value::Date(d));
            }
            Ok(Value::DateList(items))
        }
        ValueType::Duration => Ok(Value::Duration(parse_duration(raw, line_num, col)?)),
        ValueType::Integer => Ok(Value::Integer(parse_integer(raw, line_num, col)?)),
        ValueType::Recur => Ok(Value::Recur(Box::new(parse_rrule(raw, line_num, col)?))),
        ValueType::UtcOffset => Ok(Value::UtcOffset(parse_utc_offset(raw, line_num, col)?)),
        ValueType::Unknown => Ok(Value::Unknown(cl.raw_value.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rfc::ical::core::{DateTimeForm, Frequency};

    const SIMPLE_VEVENT: &str = "\
BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
PRODID:-//Test//Test//EN\r\n\
BEGIN:VEVENT\r\n\
UID:test-uid-123@example.com\r\n\
DTSTART;TZID=Europe/Berlin:20230405T090000\r\n\
DTEND;TZID=Europe/Berlin:20230405T100000\r\n\
SUMMARY:Test\\, with comma\r\n\
CATEGORIES:Work,Travel\r\n\
RRULE:FREQ=WEEKLY;COUNT=4\r\n\
EXDATE;TZID=Europe/Berlin:20230412T090000,20230419T090000\r\n\
BEGIN:VALARM\r\n\
TRIGGER:-PT15M\r\n\
ACTION:DISPLAY\r\n\
END:VALARM\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n";

    #[test]
    fn parse_simple_event() {
        let ical = parse(SIMPLE_VEVENT).unwrap();
        assert_eq!(ical.root.text("VERSION"), Some("2.0"));
        let events = ical.events();
        assert_eq!(events.len(), 1);
        let event = events[0];

        assert_eq!(event.uid(), Some("test-uid-123@example.com"));
        assert_eq!(event.text("SUMMARY"), Some("Test, with comma"));

        let dtstart = event.get_property("DTSTART").unwrap();
        let Value::DateTime(dt) = &dtstart.value else {
            panic!("DTSTART is not a date-time: {:?}", dtstart.value);
        };
        assert_eq!(
            dt.form,
            DateTimeForm::Zoned {
                tzid: "Europe/Berlin".into()
            }
        );

        let categories = &event.get_property("CATEGORIES").unwrap().value;
        assert_eq!(
            categories,
            &Value::TextList(vec!["Work".into(), "Travel".into()])
        );

        let rrule = event.get_property("RRULE").unwrap().value.as_recur().unwrap();
        assert_eq!(rrule.freq, Some(Frequency::Weekly));
        assert_eq!(rrule.count, Some(4));

        let exdate = &event.get_property("EXDATE").unwrap().value;
        assert!(matches!(exdate, Value::DateTimeList(list) if list.len() == 2));

        let alarms = event.alarms();
        assert_eq!(alarms.len(), 1);
        let trigger = alarms[0].get_property("TRIGGER").unwrap();
        assert_eq!(trigger.value.as_duration().unwrap().as_seconds(), -900);
    }

    #[test]
    fn infers_date_values_without_value_param() {
        let input = "BEGIN:VCALENDAR\r\nBEGIN:VEVENT\r\nDTSTART:20240101\r\nDTEND;VALUE=DATE:20240102\r\nEND:VEVENT\r\nEND:VCALENDAR\r\n";
        let ical = parse(input).unwrap();
        let event = ical.events()[0];
        for name in ["DTSTART", "DTEND"] {
            let value = &event.get_property(name).unwrap().value;
            assert!(matches!(value, Value::Date(_)), "{name}: {value:?}");
        }
    }

    #[test]
    fn bad_values_become_unknown() {
        let input = "BEGIN:VCALENDAR\r\nBEGIN:VEVENT\r\nRRULE:FREQ=SOMETIMES\r\nDTSTART:2024-01-01\r\nEND:VEVENT\r\nEND:VCALENDAR\r\n";
        let ical = parse(input).unwrap();
        let event = ical.events()[0];
        assert!(matches!(
            event.get_property("RRULE").unwrap().value,
            Value::Unknown(_)
        ));
        assert_eq!(
            event.get_property("DTSTART").unwrap().value,
            Value::Unknown("2024-01-01".into())
        );
    }

    #[test_log::test]
    fn tolerates_bom_preamble_and_bad_lines() {
        let input = "\u{feff}garbage before:\r\nBEGIN:VCALENDAR\r\nBAD LINE:x\r\nBEGIN:VEVENT\r\nUID:1\r\nEND:VEVENT\r\nEND:VCALENDAR\r\ntrailing:stuff\r\n";
        let ical = parse(input).unwrap();
        assert_eq!(ical.events().len(), 1);
        assert!(ical.root.properties.is_empty());
    }

    #[test]
    fn keeps_unknown_components() {
        let input = "BEGIN:VCALENDAR\nBEGIN:VTODO\nUID:t\nEND:VTODO\nBEGIN:VEVENT\nUID:e\nEND:VEVENT\nEND:VCALENDAR\n";
        let ical = parse(input).unwrap();
        assert_eq!(ical.root.children.len(), 2);
        assert_eq!(ical.events().len(), 1);
    }

    #[test]
    fn structural_errors() {
        assert_eq!(parse("").unwrap_err().kind, ParseErrorKind::MissingBegin);
        assert_eq!(
            parse("VERSION:2.0\r\n").unwrap_err().kind,
            ParseErrorKind::MissingBegin
        );
        assert_eq!(
            parse("BEGIN:VEVENT\r\nEND:VEVENT\r\n").unwrap_err().kind,
            ParseErrorKind::MissingBegin
        );
        assert_eq!(
            parse("BEGIN:VCALENDAR\r\nBEGIN:VEVENT\r\nEND:VCALENDAR\r\n")
                .unwrap_err()
                .kind,
            ParseErrorKind::MismatchedComponent
        );

        let err = parse("BEGIN:VCALENDAR\r\nBEGIN:VEVENT\r\nUID:1\r\n").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::MissingEnd);
        assert_eq!(err.line, 3);
    }
}

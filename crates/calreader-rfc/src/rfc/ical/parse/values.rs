//! Value type parsers for iCalendar (RFC 5545 §3.3).
//!
//! Each parser reports the line and column it was handed; the source error
//! of a failed numeric conversion carries nothing the position does not.
#![expect(
    clippy::map_err_ignore,
    reason = "Numeric conversion errors are replaced by positioned parse errors"
)]

use super::error::{ParseError, ParseErrorKind, ParseResult};
use crate::rfc::ical::core::{
    Date, DateTime, DateTimeForm, Duration, Frequency, RRule, RRuleUntil, UtcOffset,
    Weekday, WeekdayNum,
};

/// Parses a fixed-width run of ASCII digits.
fn digits<T: std::str::FromStr>(
    s: &str,
    kind: ParseErrorKind,
    line: usize,
    col: usize,
) -> ParseResult<T> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ParseError::new(kind, line, col));
    }
    s.parse::<T>().map_err(|_| ParseError::new(kind, line, col))
}

/// Returns whether a raw value has the shape of a DATE (`YYYYMMDD`).
#[must_use]
pub fn looks_like_date(s: &str) -> bool {
    s.len() == 8 && s.bytes().all(|b| b.is_ascii_digit())
}

/// Parses a DATE value (RFC 5545 §3.3.4).
///
/// Format: YYYYMMDD (e.g., "19970714")
///
/// ## Errors
/// Returns an error if the string is not a valid 8-digit date.
pub fn parse_date(s: &str, line: usize, col: usize) -> ParseResult<Date> {
    if !looks_like_date(s) {
        return Err(ParseError::new(ParseErrorKind::InvalidDate, line, col));
    }

    let year = digits::<u16>(&s[0..4], ParseErrorKind::InvalidDate, line, col)?;
    let month = digits::<u8>(&s[4..6], ParseErrorKind::InvalidDate, line, col)?;
    let day = digits::<u8>(&s[6..8], ParseErrorKind::InvalidDate, line, col)?;

    if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
        return Err(ParseError::new(ParseErrorKind::InvalidDate, line, col));
    }

    Ok(Date { year, month, day })
}

/// Reads `HHMMSS[Z]` as hour, minute, second and whether it was UTC.
fn parse_clock(s: &str, line: usize, col: usize) -> ParseResult<([u8; 3], bool)> {
    let (clock, is_utc) = match s.strip_suffix(['Z', 'z']) {
        Some(stripped) => (stripped, true),
        None => (s, false),
    };
    if clock.len() != 6 || !clock.is_ascii() {
        return Err(ParseError::new(ParseErrorKind::InvalidTime, line, col));
    }

    let mut fields = [0_u8; 3];
    for (field, at) in fields.iter_mut().zip([0, 2, 4]) {
        *field = digits::<u8>(&clock[at..at + 2], ParseErrorKind::InvalidTime, line, col)?;
    }
    // 60 is a leap second
    if fields[0] > 23 || fields[1] > 59 || fields[2] > 60 {
        return Err(ParseError::new(ParseErrorKind::InvalidTime, line, col));
    }
    Ok((fields, is_utc))
}

/// Parses a DATE-TIME value (RFC 5545 §3.3.5).
///
/// Format: YYYYMMDD"T"HHMMSS[Z] (e.g., "19970714T133000Z")
///
/// A `Z` suffix makes the value UTC even when a TZID is supplied.
///
/// ## Errors
/// Returns an error if the string is not a valid datetime format.
pub fn parse_datetime(
    s: &str,
    tzid: Option<&str>,
    line: usize,
    col: usize,
) -> ParseResult<DateTime> {
    let t_pos = s
        .find(['T', 't'])
        .ok_or_else(|| ParseError::new(ParseErrorKind::InvalidDateTime, line, col))?;

    let date = parse_date(&s[..t_pos], line, col)?;
    let ([hour, minute, second], is_utc) = parse_clock(&s[t_pos + 1..], line, col + t_pos + 1)?;

    let form = if is_utc {
        DateTimeForm::Utc
    } else if let Some(tz) = tzid {
        DateTimeForm::Zoned {
            tzid: tz.to_string(),
        }
    } else {
        DateTimeForm::Floating
    };

    Ok(DateTime {
        year: date.year,
        month: date.month,
        day: date.day,
        hour,
        minute,
        second,
        form,
    })
}

/// Parses a UTC-OFFSET value (RFC 5545 §3.3.14).
///
/// Format: (+|-)HHMM[SS] (e.g., "+0530", "-0800")
///
/// ## Errors
/// Returns an error if the string is not a valid UTC offset format.
pub fn parse_utc_offset(s: &str, line: usize, col: usize) -> ParseResult<UtcOffset> {
    let err = || ParseError::new(ParseErrorKind::InvalidUtcOffset, line, col);

    let (sign, rest) = if let Some(rest) = s.strip_prefix('+') {
        (1, rest)
    } else if let Some(rest) = s.strip_prefix('-') {
        (-1, rest)
    } else {
        return Err(err());
    };

    if !(rest.len() == 4 || rest.len() == 6) || !rest.is_ascii() {
        return Err(err());
    }

    let hours = digits::<i32>(&rest[0..2], ParseErrorKind::InvalidUtcOffset, line, col)?;
    let minutes = digits::<i32>(&rest[2..4], ParseErrorKind::InvalidUtcOffset, line, col)?;
    let seconds = if rest.len() == 6 {
        digits::<i32>(&rest[4..6], ParseErrorKind::InvalidUtcOffset, line, col)?
    } else {
        0
    };

    if minutes > 59 || seconds > 59 {
        return Err(err());
    }

    UtcOffset::from_seconds(sign * (hours * 3600 + minutes * 60 + seconds)).ok_or_else(err)
}

/// Parses a DURATION value (RFC 5545 §3.3.6).
///
/// Format: [+|-]P[nW] or [+|-]P[nD][T[nH][nM][nS]]
///
/// ## Errors
/// Returns an error if the string is not a valid duration format.
pub fn parse_duration(s: &str, line: usize, col: usize) -> ParseResult<Duration> {
    let err = || ParseError::new(ParseErrorKind::InvalidDuration, line, col);
    let mut dur = Duration::zero();

    let rest = if let Some(rest) = s.strip_prefix('-') {
        dur.negative = true;
        rest
    } else {
        s.strip_prefix('+').unwrap_or(s)
    };
    let rest = rest.strip_prefix(['P', 'p']).ok_or_else(err)?;
    if rest.is_empty() {
        return Err(err());
    }

    let mut in_time = false;
    let mut number = String::new();
    let mut saw_component = false;
    let mut saw_time_component = false;

    for c in rest.chars() {
        if c.is_ascii_digit() {
            number.push(c);
            continue;
        }
        let c = c.to_ascii_uppercase();
        if c == 'T' {
            if in_time || !number.is_empty() {
                return Err(err());
            }
            in_time = true;
            continue;
        }
        let value: u32 = number.parse().map_err(|_| err())?;
        number.clear();
        match (c, in_time) {
            ('W', false) => dur.weeks = value,
            ('D', false) => dur.days = value,
            ('H', true) => dur.hours = value,
            ('M', true) => dur.minutes = value,
            ('S', true) => dur.seconds = value,
            _ => return Err(err()),
        }
        saw_component = true;
        saw_time_component |= in_time;
    }

    if !number.is_empty() || !saw_component || (in_time && !saw_time_component) {
        return Err(err());
    }
    Ok(dur)
}

/// Parses a RECUR (RRULE) value (RFC 5545 §3.3.10).
///
/// Unknown rule parts are ignored; a rule without FREQ is rejected.
///
/// ## Errors
/// Returns an error if the string is not a valid recurrence rule.
pub fn parse_rrule(s: &str, line: usize, col: usize) -> ParseResult<RRule> {
    let mut rrule = RRule::default();

    for part in s.split(';').map(str::trim).filter(|p| !p.is_empty()) {
        let (key, value) = part
            .split_once('=')
            .ok_or_else(|| ParseError::new(ParseErrorKind::InvalidRRule, line, col))?;

        parse_rrule_part(&mut rrule, key, value, line, col)?;
    }

    if rrule.freq.is_none() {
        return Err(
            ParseError::new(ParseErrorKind::InvalidRRule, line, col).with_context("missing FREQ")
        );
    }

    Ok(rrule)
}

fn parse_rrule_part(
    rrule: &mut RRule,
    key: &str,
    value: &str,
    line: usize,
    col: usize,
) -> ParseResult<()> {
    let invalid = || ParseError::new(ParseErrorKind::InvalidRRule, line, col);
    match key.to_ascii_uppercase().as_str() {
        "FREQ" => {
            rrule.freq = Some(
                Frequency::parse(value)
                    .ok_or_else(|| ParseError::new(ParseErrorKind::InvalidFrequency, line, col))?,
            );
        }
        "INTERVAL" => rrule.interval = Some(value.parse().map_err(|_| invalid())?),
        "COUNT" => {
            if rrule.until.is_some() {
                return Err(ParseError::new(ParseErrorKind::UntilCountConflict, line, col));
            }
            rrule.count = Some(value.parse().map_err(|_| invalid())?);
        }
        "UNTIL" => {
            if rrule.count.is_some() {
                return Err(ParseError::new(ParseErrorKind::UntilCountConflict, line, col));
            }
            rrule.until = Some(if value.contains(['T', 't']) {
                RRuleUntil::DateTime(parse_datetime(value, None, line, col)?)
            } else {
                RRuleUntil::Date(parse_date(value, line, col)?)
            });
        }
        "WKST" => {
            rrule.wkst = Some(
                Weekday::parse(value)
                    .ok_or_else(|| ParseError::new(ParseErrorKind::InvalidWeekday, line, col))?,
            );
        }
        "BYSECOND" => rrule.by_second = parse_list(value, line, col)?,
        "BYMINUTE" => rrule.by_minute = parse_list(value, line, col)?,
        "BYHOUR" => rrule.by_hour = parse_list(value, line, col)?,
        "BYDAY" => {
            rrule.by_day = value
                .split(',')
                .map(|v| parse_weekday_num(v, line, col))
                .collect::<ParseResult<_>>()?;
        }
        "BYMONTHDAY" => rrule.by_monthday = parse_list(value, line, col)?,
        "BYYEARDAY" => rrule.by_yearday = parse_list(value, line, col)?,
        "BYWEEKNO" => rrule.by_weekno = parse_list(value, line, col)?,
        "BYMONTH" => rrule.by_month = parse_list(value, line, col)?,
        "BYSETPOS" => rrule.by_setpos = parse_list(value, line, col)?,
        other => tracing::trace!(part = other, "Ignoring unknown RRULE part"),
    }
    Ok(())
}

/// Parses a comma-separated list of signed or unsigned integers.
fn parse_list<T: std::str::FromStr>(s: &str, line: usize, col: usize) -> ParseResult<Vec<T>> {
    s.split(',')
        .map(|v| {
            let v = v.trim();
            v.strip_prefix('+')
                .unwrap_or(v)
                .parse()
                .map_err(|_| ParseError::new(ParseErrorKind::InvalidRRule, line, col))
        })
        .collect()
}

/// Parses a single weekday with optional ordinal (e.g., "MO", "1MO", "-1FR", "+2TU").
fn parse_weekday_num(s: &str, line: usize, col: usize) -> ParseResult<WeekdayNum> {
    let s = s.trim();
    let invalid_weekday = || ParseError::new(ParseErrorKind::InvalidWeekday, line, col);

    if s.len() < 2 || !s.is_ascii() {
        return Err(invalid_weekday());
    }

    let (ordinal_str, weekday_str) = s.split_at(s.len() - 2);
    let weekday = Weekday::parse(weekday_str).ok_or_else(invalid_weekday)?;

    if ordinal_str.is_empty() {
        return Ok(WeekdayNum::every(weekday));
    }

    let ordinal: i8 = ordinal_str
        .strip_prefix('+')
        .unwrap_or(ordinal_str)
        .parse()
        .map_err(|_| ParseError::new(ParseErrorKind::InvalidRRule, line, col))?;

    WeekdayNum::nth(ordinal, weekday)
        .ok_or_else(|| ParseError::new(ParseErrorKind::InvalidRRule, line, col))
}

/// Parses an INTEGER value (RFC 5545 §3.3.8).
///
/// ## Errors
/// Returns an error if the string is not a valid integer.
pub fn parse_integer(s: &str, line: usize, col: usize) -> ParseResult<i32> {
    s.trim()
        .parse()
        .map_err(|_| ParseError::new(ParseErrorKind::InvalidInteger, line, col))
}

/// Unescapes text values (RFC 5545 §3.3.11).
///
/// Escape sequences: \\ \, \; \n \N
#[must_use]
pub fn unescape_text(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars();

    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n' | 'N') => result.push('\n'),
                Some(',') => result.push(','),
                Some(';') => result.push(';'),
                Some('\\') | None => result.push('\\'),
                Some(other) => {
                    result.push('\\');
                    result.push(other);
                }
            }
        } else {
            result.push(c);
        }
    }

    result
}

/// Splits a TEXT list on unescaped commas and unescapes each item.
///
/// Items that are empty after trimming are dropped.
#[must_use]
pub fn split_text_list(s: &str) -> Vec<String> {
    let mut items = Vec::new();
    let mut current = String::new();
    let mut escaped = false;

    for c in s.chars() {
        if escaped {
            current.push('\\');
            current.push(c);
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == ',' {
            items.push(std::mem::take(&mut current));
        } else {
            current.push(c);
        }
    }
    if escaped {
        current.push('\\');
    }
    items.push(current);

    items
        .iter()
        .map(|item| unescape_text(item.trim()))
        .filter(|item| !item.is_empty())
        .collect()
}

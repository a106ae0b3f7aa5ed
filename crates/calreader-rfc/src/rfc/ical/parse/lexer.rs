//! Content line lexer for iCalendar (RFC 5545 §3.1).
//!
//! Handles line unfolding and tokenization of content lines.

use std::iter::Peekable;
use std::str::CharIndices;

use super::error::{ParseError, ParseErrorKind, ParseResult};
use crate::rfc::ical::core::{ContentLine, Parameter};

/// Splits input into numbered content lines, merging folded continuations.
///
/// Handles both CRLF and bare LF line endings. Lines starting with SP/HTAB
/// continue the previous line with the single whitespace removed. Lines
/// without any colon are also merged into the previous line, which repairs
/// exporters that wrap long values without folding.
#[must_use]
pub fn split_lines(input: &str) -> Vec<(usize, String)> {
    let mut lines: Vec<(usize, String)> = Vec::new();

    for (i, raw_line) in input.lines().enumerate() {
        let line = raw_line.trim_end_matches('\r');
        if line.is_empty() {
            continue;
        }

        let continuation = if let Some(rest) = line.strip_prefix([' ', '\t']) {
            Some(rest)
        } else if line.contains(':') {
            None
        } else {
            Some(line)
        };

        match (continuation, lines.last_mut()) {
            (Some(rest), Some((_, prev))) => prev.push_str(rest),
            (Some(rest), None) => lines.push((i + 1, rest.to_string())),
            (None, _) => lines.push((i + 1, line.to_string())),
        }
    }

    lines
}

/// Parses a single content line.
///
/// Format: `name *(";" param) ":" value`
///
/// ## Errors
/// Returns an error if the line is malformed or contains invalid characters.
pub fn parse_content_line(line: &str, line_num: usize) -> ParseResult<ContentLine> {
    let mut chars = line.char_indices().peekable();
    let mut name_end = None;
    let mut at_colon = false;

    while let Some(&(i, c)) = chars.peek() {
        if c == ';' || c == ':' {
            name_end = Some(i);
            at_colon = c == ':';
            chars.next();
            break;
        }
        if !c.is_ascii_alphanumeric() && c != '-' && c != '_' {
            return Err(ParseError::new(
                ParseErrorKind::InvalidPropertyName,
                line_num,
                i + 1,
            ));
        }
        chars.next();
    }

    let name_end = match name_end {
        Some(0) => {
            return Err(ParseError::new(
                ParseErrorKind::MissingPropertyName,
                line_num,
                1,
            ));
        }
        Some(end) => end,
        None => {
            return Err(ParseError::new(
                ParseErrorKind::MissingColon,
                line_num,
                line.len(),
            ));
        }
    };

    let name = line[..name_end].to_ascii_uppercase();

    let mut params = Vec::new();
    let mut value_start = name_end + 1;
    if !at_colon {
        loop {
            let (param, colon) = parse_parameter(&mut chars, line, line_num)?;
            params.push(param);
            if let Some(colon) = colon {
                value_start = colon + 1;
                break;
            }
        }
    }

    Ok(ContentLine {
        name,
        params,
        raw_value: line[value_start..].to_string(),
    })
}

/// Parses a single parameter from the character stream.
///
/// Returns the parameter and, when the parameter list ended, the byte
/// position of the colon that starts the value.
fn parse_parameter(
    chars: &mut Peekable<CharIndices<'_>>,
    line: &str,
    line_num: usize,
) -> ParseResult<(Parameter, Option<usize>)> {
    let start = chars.peek().map_or(line.len(), |&(i, _)| i);

    let mut name_end = start;
    while let Some(&(i, c)) = chars.peek() {
        if c == '=' {
            name_end = i;
            chars.next();
            break;
        }
        if !c.is_ascii_alphanumeric() && c != '-' && c != '_' {
            return Err(ParseError::new(
                ParseErrorKind::InvalidParameter,
                line_num,
                i + 1,
            ));
        }
        chars.next();
    }

    if name_end == start {
        return Err(ParseError::new(
            ParseErrorKind::InvalidParameter,
            line_num,
            start + 1,
        ));
    }

    let param_name = &line[start..name_end];

    let mut values = Vec::new();
    loop {
        values.push(parse_param_value(chars, line, line_num)?);

        match chars.next() {
            Some((_, ',')) => {}
            Some((_, ';')) => return Ok((Parameter::with_values(param_name, values), None)),
            Some((i, ':')) => return Ok((Parameter::with_values(param_name, values), Some(i))),
            Some((i, c)) => {
                return Err(
                    ParseError::new(ParseErrorKind::InvalidParameter, line_num, i + 1)
                        .with_context(format!("unexpected character '{c}'")),
                );
            }
            None => {
                return Err(ParseError::new(
                    ParseErrorKind::MissingColon,
                    line_num,
                    line.len(),
                ));
            }
        }
    }
}

/// Parses a parameter value (possibly quoted), decoding RFC 6868 caret escapes.
fn parse_param_value(
    chars: &mut Peekable<CharIndices<'_>>,
    line: &str,
    line_num: usize,
) -> ParseResult<String> {
    let Some(&(start, first)) = chars.peek() else {
        return Err(ParseError::new(
            ParseErrorKind::InvalidParameter,
            line_num,
            line.len(),
        ));
    };

    let mut value = String::new();

    if first == '"' {
        chars.next();
        loop {
            match chars.next() {
                Some((_, '"')) => return Ok(value),
                Some((_, '^')) => push_caret_escape(chars, &mut value),
                Some((_, c)) => value.push(c),
                None => {
                    return Err(ParseError::new(
                        ParseErrorKind::UnclosedQuote,
                        line_num,
                        start + 1,
                    ));
                }
            }
        }
    }

    while let Some(&(_, c)) = chars.peek() {
        if matches!(c, ',' | ';' | ':') {
            break;
        }
        chars.next();
        if c == '^' {
            push_caret_escape(chars, &mut value);
        } else {
            value.push(c);
        }
    }
    Ok(value)
}

fn push_caret_escape(chars: &mut Peekable<CharIndices<'_>>, value: &mut String) {
    let decoded = match chars.peek() {
        Some(&(_, '^')) => Some('^'),
        Some(&(_, 'n' | 'N')) => Some('\n'),
        Some(&(_, '\'')) => Some('"'),
        _ => None,
    };
    if let Some(decoded) = decoded {
        value.push(decoded);
        chars.next();
    } else {
        // not a recognized escape, keep the caret
        value.push('^');
    }
}

//! iCalendar parsing error types.

use thiserror::Error;

/// Result type for iCalendar parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// Error type for iCalendar parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} at line {line}, column {column}{}", context_suffix(.context.as_deref()))]
pub struct ParseError {
    pub kind: ParseErrorKind,
    /// Line number where the error occurred (1-based).
    pub line: usize,
    /// Column number where the error occurred (1-based).
    pub column: usize,
    /// Additional context about the error.
    pub context: Option<String>,
}

fn context_suffix(context: Option<&str>) -> String {
    context.map(|c| format!(": {c}")).unwrap_or_default()
}

impl ParseError {
    #[must_use]
    pub fn new(kind: ParseErrorKind, line: usize, column: usize) -> Self {
        Self {
            kind,
            line,
            column,
            context: None,
        }
    }

    /// Adds context to this error.
    #[must_use]
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

/// Kinds of parse errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    #[error("invalid content line format")]
    InvalidContentLine,
    #[error("missing property name")]
    MissingPropertyName,
    #[error("invalid property name")]
    InvalidPropertyName,
    #[error("missing colon separator")]
    MissingColon,
    #[error("invalid parameter format")]
    InvalidParameter,
    #[error("unclosed quoted string")]
    UnclosedQuote,
    #[error("invalid date format")]
    InvalidDate,
    #[error("invalid time format")]
    InvalidTime,
    #[error("invalid date-time format")]
    InvalidDateTime,
    #[error("invalid duration format")]
    InvalidDuration,
    #[error("invalid recurrence rule")]
    InvalidRRule,
    #[error("invalid UTC offset format")]
    InvalidUtcOffset,
    #[error("missing BEGIN line")]
    MissingBegin,
    #[error("missing END line")]
    MissingEnd,
    #[error("mismatched BEGIN/END")]
    MismatchedComponent,
    #[error("invalid component nesting")]
    InvalidNesting,
    #[error("invalid integer value")]
    InvalidInteger,
    #[error("invalid frequency")]
    InvalidFrequency,
    #[error("invalid weekday")]
    InvalidWeekday,
    #[error("UNTIL and COUNT are mutually exclusive")]
    UntilCountConflict,
}

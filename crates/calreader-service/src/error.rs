use calreader_rfc::rfc::ical::ParseError;
use calreader_rfc::rfc::ical::expand::TimezoneError;
use thiserror::Error;

/// Import pipeline errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ImportError {
    #[error("Calendar could not be parsed: {0}")]
    ParseFailure(#[from] ParseError),

    #[error("{0}, falling back to UTC")]
    UnresolvedTimezone(#[from] TimezoneError),

    #[error("Malformed recurrence rule in event '{uid}': {reason}")]
    MalformedRecurrenceRule { uid: String, reason: String },

    #[error("Incomplete event definition '{uid}': {reason}")]
    IncompleteEventDefinition { uid: String, reason: String },
}

impl ImportError {
    pub(crate) fn malformed_rule(uid: &str, reason: impl Into<String>) -> Self {
        Self::MalformedRecurrenceRule {
            uid: uid.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn incomplete(uid: &str, reason: impl Into<String>) -> Self {
        Self::IncompleteEventDefinition {
            uid: uid.to_string(),
            reason: reason.into(),
        }
    }
}

pub type ImportResult<T> = std::result::Result<T, ImportError>;

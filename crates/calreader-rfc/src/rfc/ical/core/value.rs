//! DATE and the typed property value (RFC 5545 §3.3).

use std::fmt;

use chrono::NaiveDate;

use super::{DateTime, Duration, RRule, UtcOffset};

/// A DATE as written, which may name a day that does not exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Date {
    pub year: u16,
    pub month: u8,
    pub day: u8,
}

impl Date {
    #[must_use]
    pub const fn new(year: u16, month: u8, day: u8) -> Self {
        Self { year, month, day }
    }

    /// `None` for days such as February 30.
    #[must_use]
    pub fn to_naive(self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(
            i32::from(self.year),
            u32::from(self.month),
            u32::from(self.day),
        )
    }
}

impl fmt::Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}{:02}{:02}", self.year, self.month, self.day)
    }
}

/// A property value typed by its VALUE parameter or the property's default.
///
/// Text that does not read as that type stays `Unknown`, so the importer can
/// still report it.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Date(Date),
    DateTime(DateTime),
    /// EXDATE or RDATE with `VALUE=DATE`.
    DateList(Vec<Date>),
    DateTimeList(Vec<DateTime>),
    Duration(Duration),
    Integer(i32),
    Recur(Box<RRule>),
    /// Unescaped TEXT.
    Text(String),
    /// CATEGORIES, split on unescaped commas.
    TextList(Vec<String>),
    UtcOffset(UtcOffset),
    Unknown(String),
}

impl Value {
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_duration(&self) -> Option<&Duration> {
        match self {
            Self::Duration(duration) => Some(duration),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_recur(&self) -> Option<&RRule> {
        match self {
            Self::Recur(rule) => Some(rule),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_utc_offset(&self) -> Option<UtcOffset> {
        match self {
            Self::UtcOffset(offset) => Some(*offset),
            _ => None,
        }
    }
}

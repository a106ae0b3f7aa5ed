//! DATE-TIME and UTC-OFFSET values (RFC 5545 §3.3.5, §3.3.14).

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

/// A TZOFFSETFROM or TZOFFSETTO value, east of UTC positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UtcOffset {
    seconds: i32,
}

impl UtcOffset {
    /// `None` past eighteen hours either way.
    #[must_use]
    pub const fn from_seconds(seconds: i32) -> Option<Self> {
        if seconds.abs() > 18 * 3600 {
            return None;
        }
        Some(Self { seconds })
    }

    #[must_use]
    pub const fn as_seconds(self) -> i32 {
        self.seconds
    }
}

impl fmt::Display for UtcOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.seconds < 0 { '-' } else { '+' };
        let total = self.seconds.unsigned_abs();
        write!(f, "{sign}{:02}{:02}", total / 3600, total / 60 % 60)?;
        match total % 60 {
            0 => Ok(()),
            rest => write!(f, "{rest:02}"),
        }
    }
}

/// How a DATE-TIME is anchored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateTimeForm {
    /// No zone: the same wall clock wherever it is read.
    Floating,
    /// Written with a trailing `Z`.
    Utc,
    /// Wall clock in the zone named by TZID, kept verbatim.
    Zoned { tzid: String },
}

/// A DATE-TIME as written. The fields may name an impossible moment such as
/// February 30 or a leap second.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateTime {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub form: DateTimeForm,
}

impl DateTime {
    #[must_use]
    pub fn is_utc(&self) -> bool {
        self.form == DateTimeForm::Utc
    }

    #[must_use]
    pub fn is_floating(&self) -> bool {
        self.form == DateTimeForm::Floating
    }

    #[must_use]
    pub fn tzid(&self) -> Option<&str> {
        if let DateTimeForm::Zoned { tzid } = &self.form {
            Some(tzid)
        } else {
            None
        }
    }

    /// The wall clock alone. A leap second reads as :59; an impossible day
    /// gives `None`.
    #[must_use]
    pub fn to_naive(&self) -> Option<NaiveDateTime> {
        let day = NaiveDate::from_ymd_opt(
            i32::from(self.year),
            u32::from(self.month),
            u32::from(self.day),
        )?;
        let clock = NaiveTime::from_hms_opt(
            u32::from(self.hour),
            u32::from(self.minute),
            u32::from(self.second.min(59)),
        )?;
        Some(day.and_time(clock))
    }
}

impl fmt::Display for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let zulu = if self.is_utc() { "Z" } else { "" };
        write!(
            f,
            "{:04}{:02}{:02}T{:02}{:02}{:02}{zulu}",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )
    }
}

//! iCalendar DURATION value type (RFC 5545 §3.3.6).

use std::fmt;

/// Duration value (RFC 5545 §3.3.6).
///
/// iCalendar durations are either week-based (`P1W`) or day/time-based
/// (`P1DT2H30M`). Years and months are not representable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Duration {
    /// Whether this duration is negative.
    pub negative: bool,
    pub weeks: u32,
    pub days: u32,
    pub hours: u32,
    pub minutes: u32,
    pub seconds: u32,
}

impl Duration {
    /// Creates a new zero duration.
    #[must_use]
    pub const fn zero() -> Self {
        Self {
            negative: false,
            weeks: 0,
            days: 0,
            hours: 0,
            minutes: 0,
            seconds: 0,
        }
    }

    /// Total signed length in seconds.
    ///
    /// Days count as 86400 seconds; callers that need calendar-day
    /// semantics across DST changes should use [`Duration::whole_days`].
    #[must_use]
    pub fn as_seconds(&self) -> i64 {
        let total = i64::from(self.weeks) * 7 * 86_400
            + i64::from(self.days) * 86_400
            + i64::from(self.hours) * 3_600
            + i64::from(self.minutes) * 60
            + i64::from(self.seconds);
        if self.negative { -total } else { total }
    }

    /// Returns the signed day count when the duration has no time part.
    #[must_use]
    pub fn whole_days(&self) -> Option<i64> {
        if self.hours != 0 || self.minutes != 0 || self.seconds != 0 {
            return None;
        }
        let days = i64::from(self.weeks) * 7 + i64::from(self.days);
        Some(if self.negative { -days } else { days })
    }

    /// Converts to a chrono time delta.
    #[must_use]
    pub fn to_chrono(&self) -> chrono::TimeDelta {
        chrono::TimeDelta::seconds(self.as_seconds())
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negative {
            write!(f, "-")?;
        }
        write!(f, "P")?;

        if self.weeks > 0 {
            return write!(f, "{}W", self.weeks);
        }
        if self.days > 0 {
            write!(f, "{}D", self.days)?;
        }
        if self.hours > 0 || self.minutes > 0 || self.seconds > 0 {
            write!(f, "T")?;
            if self.hours > 0 {
                write!(f, "{}H", self.hours)?;
            }
            if self.minutes > 0 {
                write!(f, "{}M", self.minutes)?;
            }
            if self.seconds > 0 {
                write!(f, "{}S", self.seconds)?;
            }
        } else if self.days == 0 {
            write!(f, "T0S")?;
        }
        Ok(())
    }
}

//! RECUR values and their rule parts (RFC 5545 §3.3.10).

use std::fmt;

use super::Date;

/// FREQ rule part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Frequency {
    Secondly,
    Minutely,
    Hourly,
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

// Indexed by discriminant.
const FREQUENCY_NAMES: [(Frequency, &str); 7] = [
    (Frequency::Secondly, "SECONDLY"),
    (Frequency::Minutely, "MINUTELY"),
    (Frequency::Hourly, "HOURLY"),
    (Frequency::Daily, "DAILY"),
    (Frequency::Weekly, "WEEKLY"),
    (Frequency::Monthly, "MONTHLY"),
    (Frequency::Yearly, "YEARLY"),
];

impl Frequency {
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        FREQUENCY_NAMES
            .iter()
            .find(|(_, name)| name.eq_ignore_ascii_case(s))
            .map(|(freq, _)| *freq)
    }

    /// Length of one period in seconds. Months and years have none.
    #[must_use]
    pub const fn fixed_step_seconds(self) -> Option<i64> {
        match self {
            Self::Secondly => Some(1),
            Self::Minutely => Some(60),
            Self::Hourly => Some(3_600),
            Self::Daily => Some(86_400),
            Self::Weekly => Some(604_800),
            Self::Monthly | Self::Yearly => None,
        }
    }

    /// `1MO` and `-1FR` only select inside months and years.
    #[must_use]
    pub const fn allows_weekday_ordinals(self) -> bool {
        matches!(self, Self::Monthly | Self::Yearly)
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(FREQUENCY_NAMES[*self as usize].1)
    }
}

/// BYDAY and WKST weekday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Weekday {
    Sunday,
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
}

// Indexed by discriminant.
const WEEKDAYS: [(Weekday, &str, chrono::Weekday); 7] = [
    (Weekday::Sunday, "SU", chrono::Weekday::Sun),
    (Weekday::Monday, "MO", chrono::Weekday::Mon),
    (Weekday::Tuesday, "TU", chrono::Weekday::Tue),
    (Weekday::Wednesday, "WE", chrono::Weekday::Wed),
    (Weekday::Thursday, "TH", chrono::Weekday::Thu),
    (Weekday::Friday, "FR", chrono::Weekday::Fri),
    (Weekday::Saturday, "SA", chrono::Weekday::Sat),
];

impl Weekday {
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        WEEKDAYS
            .iter()
            .find(|(_, code, _)| code.eq_ignore_ascii_case(s))
            .map(|(day, _, _)| *day)
    }

    #[must_use]
    pub const fn to_chrono(self) -> chrono::Weekday {
        WEEKDAYS[self as usize].2
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(WEEKDAYS[*self as usize].1)
    }
}

/// One BYDAY entry: `MO`, `1MO` or `-1FR`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekdayNum {
    /// Position within the month or year, never 0.
    pub ordinal: Option<i8>,
    pub weekday: Weekday,
}

impl WeekdayNum {
    #[must_use]
    pub const fn every(weekday: Weekday) -> Self {
        Self {
            ordinal: None,
            weekday,
        }
    }

    /// `None` unless `ordinal` is in `-53..=53` and not 0.
    #[must_use]
    pub fn nth(ordinal: i8, weekday: Weekday) -> Option<Self> {
        (ordinal != 0 && (-53..=53).contains(&ordinal)).then_some(Self {
            ordinal: Some(ordinal),
            weekday,
        })
    }

    #[must_use]
    pub const fn without_ordinal(self) -> Self {
        Self::every(self.weekday)
    }
}

impl fmt::Display for WeekdayNum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(n) = self.ordinal {
            write!(f, "{n}")?;
        }
        write!(f, "{}", self.weekday)
    }
}

/// Inclusive UNTIL bound, written as a DATE or a DATE-TIME.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RRuleUntil {
    Date(Date),
    DateTime(super::DateTime),
}

impl fmt::Display for RRuleUntil {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Date(d) => write!(f, "{d}"),
            Self::DateTime(dt) => write!(f, "{dt}"),
        }
    }
}

/// A RECUR value with its rule parts as read.
///
/// `Display` writes the parts back in a fixed order, which is the text the
/// expansion engine parses.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RRule {
    pub freq: Option<Frequency>,
    pub interval: Option<u32>,
    pub until: Option<RRuleUntil>,
    pub count: Option<u32>,
    pub wkst: Option<Weekday>,
    pub by_second: Vec<u8>,
    pub by_minute: Vec<u8>,
    pub by_hour: Vec<u8>,
    pub by_day: Vec<WeekdayNum>,
    pub by_monthday: Vec<i8>,
    pub by_yearday: Vec<i16>,
    pub by_weekno: Vec<i8>,
    pub by_month: Vec<u8>,
    pub by_setpos: Vec<i16>,
}

impl RRule {
    #[must_use]
    pub fn with_freq(freq: Frequency) -> Self {
        Self {
            freq: Some(freq),
            ..Self::default()
        }
    }

    /// INTERVAL, where a missing or zero value means 1.
    #[must_use]
    pub fn interval_or_default(&self) -> u32 {
        self.interval.unwrap_or(1).max(1)
    }
}

/// Writes `;NAME=VALUE` parts, leaving the separator off the first.
struct Parts<'a, 'f> {
    out: &'a mut fmt::Formatter<'f>,
    first: bool,
}

impl Parts<'_, '_> {
    fn one(&mut self, name: &str, value: impl fmt::Display) -> fmt::Result {
        let sep = if std::mem::take(&mut self.first) { "" } else { ";" };
        write!(self.out, "{sep}{name}={value}")
    }

    fn list<T: fmt::Display>(&mut self, name: &str, values: &[T]) -> fmt::Result {
        let Some((head, tail)) = values.split_first() else {
            return Ok(());
        };
        self.one(name, head)?;
        tail.iter().try_for_each(|value| write!(self.out, ",{value}"))
    }
}

impl fmt::Display for RRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Parts { out: f, first: true };
        if let Some(freq) = self.freq {
            parts.one("FREQ", freq)?;
        }
        if let Some(interval) = self.interval.filter(|&n| n != 1) {
            parts.one("INTERVAL", interval)?;
        }
        if let Some(until) = &self.until {
            parts.one("UNTIL", until)?;
        }
        if let Some(count) = self.count {
            parts.one("COUNT", count)?;
        }
        if let Some(wkst) = self.wkst {
            parts.one("WKST", wkst)?;
        }
        parts.list("BYSECOND", &self.by_second)?;
        parts.list("BYMINUTE", &self.by_minute)?;
        parts.list("BYHOUR", &self.by_hour)?;
        parts.list("BYDAY", &self.by_day)?;
        parts.list("BYMONTHDAY", &self.by_monthday)?;
        parts.list("BYYEARDAY", &self.by_yearday)?;
        parts.list("BYWEEKNO", &self.by_weekno)?;
        parts.list("BYMONTH", &self.by_month)?;
        parts.list("BYSETPOS", &self.by_setpos)
    }
}

//! Conversion of DATE and DATE-TIME property values to absolute instants.

use std::cell::RefCell;
use std::collections::HashSet;

use calreader_rfc::rfc::ical::core::{Date, DateTime as ICalDateTime, Property, Value};
use calreader_rfc::rfc::ical::expand::{TimeZoneResolver, ZoneInfo, localize};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use chrono_tz::Tz;

use super::logger::ImportLogger;
use crate::error::ImportError;

/// A date or date-time exactly as a property carried it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDateValue {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: Option<u8>,
    pub minute: Option<u8>,
    pub second: Option<u8>,
    /// TZID parameter, or the zone embedded in the value.
    pub tz_name: Option<String>,
    /// The value ended in `Z`.
    pub is_utc: bool,
    /// `VALUE=DATE`.
    pub is_whole_day: bool,
}

impl RawDateValue {
    #[must_use]
    pub fn from_date(date: Date) -> Self {
        Self {
            year: date.year,
            month: date.month,
            day: date.day,
            hour: None,
            minute: None,
            second: None,
            tz_name: None,
            is_utc: false,
            is_whole_day: true,
        }
    }

    /// The TZID parameter takes precedence over the zone the value embeds.
    #[must_use]
    pub fn from_datetime(dt: &ICalDateTime, tzid_param: Option<&str>) -> Self {
        Self {
            year: dt.year,
            month: dt.month,
            day: dt.day,
            hour: Some(dt.hour),
            minute: Some(dt.minute),
            second: Some(dt.second),
            tz_name: tzid_param.or_else(|| dt.tzid()).map(ToString::to_string),
            is_utc: dt.is_utc(),
            is_whole_day: false,
        }
    }

    /// Reads the first date value of a property.
    #[must_use]
    pub fn from_property(prop: &Property) -> Option<Self> {
        Self::list_from_property(prop).into_iter().next()
    }

    /// Reads every date value of a property, as EXDATE and RDATE carry lists.
    #[must_use]
    pub fn list_from_property(prop: &Property) -> Vec<Self> {
        let tzid = prop.tzid();
        match &prop.value {
            Value::Date(d) => vec![Self::from_date(*d)],
            Value::DateList(list) => list.iter().copied().map(Self::from_date).collect(),
            Value::DateTime(dt) => vec![Self::from_datetime(dt, tzid)],
            Value::DateTimeList(list) => list
                .iter()
                .map(|dt| Self::from_datetime(dt, tzid))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Wall-clock value; whole days start at midnight.
    ///
    /// Returns `None` for impossible dates such as February 30.
    #[must_use]
    pub fn civil(&self) -> Option<NaiveDateTime> {
        let date = NaiveDate::from_ymd_opt(
            i32::from(self.year),
            u32::from(self.month),
            u32::from(self.day),
        )?;
        let time = NaiveTime::from_hms_opt(
            u32::from(self.hour.unwrap_or(0)),
            u32::from(self.minute.unwrap_or(0)),
            // leap seconds are read as the second before
            u32::from(self.second.unwrap_or(0).min(59)),
        )?;
        Some(date.and_time(time))
    }
}

/// The reference frame a wall-clock value is read in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Frame<'a> {
    /// Civil time in the process zone: whole-day and floating values.
    Civil,
    /// A resolved zone.
    Zone(ZoneInfo<'a>),
}

impl Frame<'_> {
    /// Returns the IANA zone when the frame is one.
    #[must_use]
    pub fn iana(self) -> Option<Tz> {
        match self {
            Self::Zone(info) => info.iana(),
            Self::Civil => None,
        }
    }
}

/// A value converted to an absolute instant, keeping its wall clock.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedInstant<'a> {
    pub instant: DateTime<Utc>,
    pub civil: NaiveDateTime,
    pub is_whole_day: bool,
    pub frame: Frame<'a>,
}

/// Converts raw values to instants using the calendar's resolver.
pub struct DateTimeNormalizer<'a> {
    resolver: &'a TimeZoneResolver,
    local: Tz,
    logger: &'a dyn ImportLogger,
    warned: RefCell<HashSet<String>>,
}

impl<'a> DateTimeNormalizer<'a> {
    #[must_use]
    pub fn new(resolver: &'a TimeZoneResolver, local: Tz, logger: &'a dyn ImportLogger) -> Self {
        Self {
            resolver,
            local,
            logger,
            warned: RefCell::new(HashSet::new()),
        }
    }

    /// The process zone occurrences are reported in.
    #[must_use]
    pub fn local_zone(&self) -> Tz {
        self.local
    }

    /// ## Summary
    /// Converts a raw value to an absolute instant.
    ///
    /// Whole-day values are civil dates in the process zone. Other values
    /// use their TZID, then their `Z` marker, then the process zone. A zone
    /// no tier resolves is read as UTC and warned about once per name.
    ///
    /// Returns `None` only for impossible calendar dates.
    #[must_use]
    pub fn normalize(&self, raw: &RawDateValue) -> Option<NormalizedInstant<'a>> {
        let civil = raw.civil()?;
        let frame = self.frame_for(raw);
        Some(NormalizedInstant {
            instant: self.to_utc(frame, civil),
            civil,
            is_whole_day: raw.is_whole_day,
            frame,
        })
    }

    #[must_use]
    pub fn frame_for(&self, raw: &RawDateValue) -> Frame<'a> {
        if raw.is_whole_day {
            return Frame::Civil;
        }
        if let Some(name) = raw.tz_name.as_deref() {
            return match self.resolver.resolve(name) {
                Ok(info) => Frame::Zone(info),
                Err(err) => {
                    if self.warned.borrow_mut().insert(name.to_string()) {
                        self.logger.warn(&ImportError::from(err).to_string());
                    }
                    Frame::Zone(ZoneInfo::Iana(Tz::UTC))
                }
            };
        }
        if raw.is_utc {
            Frame::Zone(ZoneInfo::Iana(Tz::UTC))
        } else {
            Frame::Civil
        }
    }

    /// Reads a wall-clock value in a frame.
    #[must_use]
    pub fn to_utc(&self, frame: Frame<'_>, civil: NaiveDateTime) -> DateTime<Utc> {
        match frame {
            Frame::Civil => localize(self.local, civil).with_timezone(&Utc),
            Frame::Zone(info) => info.to_utc(civil),
        }
    }

    /// Projects an instant back into a frame's wall clock.
    #[must_use]
    pub fn to_civil(&self, frame: Frame<'_>, instant: DateTime<Utc>) -> NaiveDateTime {
        match frame {
            Frame::Civil => instant.with_timezone(&self.local).naive_local(),
            Frame::Zone(info) => info.to_local(instant),
        }
    }
}

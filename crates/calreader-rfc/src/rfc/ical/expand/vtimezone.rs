//! Calendar-declared VTIMEZONE rules.
//!
//! Reduces a VTIMEZONE component (RFC 5545 §3.6.5) to one yearly DST
//! start and end transition plus the two offsets. This is the fallback
//! for zones whose TZID no lookup table recognizes.

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};

use crate::rfc::ical::core::{
    Component, ComponentKind, DateTime as ICalDateTime, Frequency, RRule, UtcOffset, Value,
};

/// Error during VTIMEZONE rule extraction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VTimezoneError {
    #[error("Missing required TZID property")]
    MissingTzid,

    #[error("VTIMEZONE {0} has no STANDARD component")]
    MissingStandard(String),

    #[error("Missing required property {0} in {1} component")]
    MissingProperty(&'static str, &'static str),

    #[error("Invalid {0} value: {1}")]
    InvalidValue(&'static str, String),
}

/// Which day of the month a yearly transition falls on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionDay {
    /// The nth weekday of the month; negative ordinals count from month end.
    NthWeekday { ordinal: i8, weekday: chrono::Weekday },
    /// A fixed day of the month.
    MonthDay(u32),
}

/// A yearly local-time transition such as "last Sunday in March at 02:00".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearlyTransition {
    pub month: u32,
    pub day: TransitionDay,
    /// Local wall-clock time of the transition, before it takes effect.
    pub time: NaiveTime,
}

impl YearlyTransition {
    /// ## Summary
    /// Derives a transition from an observance's DTSTART and optional RRULE.
    ///
    /// BYMONTH and BYDAY give the month and weekday. A plain BYDAY combined
    /// with a BYMONTHDAY week (`BYDAY=SU;BYMONTHDAY=8,9,...,14`) is read as
    /// the matching ordinal. Without a usable yearly rule the DTSTART month
    /// and day are used every year.
    #[must_use]
    pub fn from_rule(dtstart: NaiveDateTime, rrule: Option<&RRule>) -> Self {
        let fixed = Self {
            month: dtstart.month(),
            day: TransitionDay::MonthDay(dtstart.day()),
            time: dtstart.time(),
        };

        let Some(rule) = rrule.filter(|r| r.freq == Some(Frequency::Yearly)) else {
            return fixed;
        };

        let month = rule
            .by_month
            .first()
            .map_or(dtstart.month(), |m| u32::from(*m));

        let day = match rule.by_day.first() {
            Some(wd) => {
                let weekday = wd.weekday.to_chrono();
                let ordinal = wd.ordinal.or_else(|| {
                    rule.by_monthday
                        .iter()
                        .copied()
                        .filter(|d| *d > 0)
                        .min()
                        .map(|first| (first - 1) / 7 + 1)
                });
                match ordinal {
                    Some(ordinal) => TransitionDay::NthWeekday { ordinal, weekday },
                    None => TransitionDay::MonthDay(dtstart.day()),
                }
            }
            None => TransitionDay::MonthDay(dtstart.day()),
        };

        Self {
            month,
            day,
            time: dtstart.time(),
        }
    }

    /// Projects the transition into a concrete local date-time for `year`.
    #[must_use]
    pub fn in_year(&self, year: i32) -> Option<NaiveDateTime> {
        let date = match self.day {
            TransitionDay::NthWeekday { ordinal, weekday } => {
                nth_weekday_of_month(year, self.month, weekday, ordinal)?
            }
            TransitionDay::MonthDay(day) => NaiveDate::from_ymd_opt(year, self.month, day)?,
        };
        Some(date.and_time(self.time))
    }
}

/// Calculates the nth occurrence of a weekday in a month.
///
/// - `ordinal` > 0: nth occurrence from start (1 = first)
/// - `ordinal` < 0: nth from end (-1 = last)
#[must_use]
pub fn nth_weekday_of_month(
    year: i32,
    month: u32,
    weekday: chrono::Weekday,
    ordinal: i8,
) -> Option<NaiveDate> {
    if ordinal > 0 {
        return NaiveDate::from_weekday_of_month_opt(year, month, weekday, ordinal.unsigned_abs());
    }
    if ordinal == 0 {
        return None;
    }

    let first_of_next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    let last_of_month = first_of_next.pred_opt()?;
    let days_back = (7 + last_of_month.weekday().num_days_from_monday()
        - weekday.num_days_from_monday())
        % 7;
    let date = last_of_month
        .checked_sub_signed(TimeDelta::days(i64::from(days_back)))?
        .checked_sub_signed(TimeDelta::weeks(-i64::from(ordinal) - 1))?;
    (date.month() == month).then_some(date)
}

/// A timezone declared inside the calendar, reduced to its current rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarTimezoneRule {
    /// TZID exactly as declared.
    pub id: String,
    /// Start of daylight time, if the zone observes DST.
    pub daylight_rule: Option<YearlyTransition>,
    /// Return to standard time.
    pub standard_rule: Option<YearlyTransition>,
    /// Standard offset (STANDARD TZOFFSETTO).
    pub offset_to: UtcOffset,
    /// Daylight offset (STANDARD TZOFFSETFROM).
    pub offset_from: UtcOffset,
}

struct Observance<'a> {
    dtstart: NaiveDateTime,
    component: &'a Component,
}

impl CalendarTimezoneRule {
    /// ## Summary
    /// Builds a rule from a VTIMEZONE component.
    ///
    /// When several STANDARD or DAYLIGHT blocks exist, the one with the
    /// latest DTSTART is taken as the rule in force.
    ///
    /// ## Errors
    /// Returns an error when TZID or STANDARD is missing, or an observance
    /// lacks a readable DTSTART or offset.
    pub fn from_component(component: &Component) -> Result<Self, VTimezoneError> {
        let id = component
            .get_property("TZID")
            .map(|p| p.as_text().unwrap_or(&p.raw_value).trim().to_string())
            .filter(|id| !id.is_empty())
            .ok_or(VTimezoneError::MissingTzid)?;

        let standard = latest_observance(component, ComponentKind::Standard, "STANDARD")?
            .ok_or_else(|| VTimezoneError::MissingStandard(id.clone()))?;
        let daylight = latest_observance(component, ComponentKind::Daylight, "DAYLIGHT")?;

        let offset_to = offset_property(standard.component, "TZOFFSETTO", "STANDARD")?;
        let offset_from = offset_property(standard.component, "TZOFFSETFROM", "STANDARD")?;

        let (daylight_rule, standard_rule) = match daylight {
            Some(daylight) if offset_to != offset_from => (
                Some(YearlyTransition::from_rule(
                    daylight.dtstart,
                    recur(daylight.component),
                )),
                Some(YearlyTransition::from_rule(
                    standard.dtstart,
                    recur(standard.component),
                )),
            ),
            _ => (None, None),
        };

        tracing::trace!(
            tzid = %id,
            offset_to = %offset_to,
            offset_from = %offset_from,
            observes_dst = daylight_rule.is_some(),
            "Built calendar timezone rule"
        );

        Ok(Self {
            id,
            daylight_rule,
            standard_rule,
            offset_to,
            offset_from,
        })
    }

    /// ## Summary
    /// Returns whether a local wall-clock time falls inside the DST window.
    ///
    /// The window runs from the daylight transition (inclusive) to the
    /// standard transition (exclusive) of the same calendar year. When the
    /// daylight transition comes later in the year, as in the southern
    /// hemisphere, the window wraps around the new year.
    #[must_use]
    pub fn is_daylight_at(&self, local: NaiveDateTime) -> bool {
        let (Some(daylight), Some(standard)) = (self.daylight_rule, self.standard_rule) else {
            return false;
        };
        let year = local.year();
        let (Some(start), Some(end)) = (daylight.in_year(year), standard.in_year(year)) else {
            return false;
        };

        if start <= end {
            start <= local && local < end
        } else {
            local >= start || local < end
        }
    }

    /// Returns the offset in effect at a local wall-clock time.
    #[must_use]
    pub fn offset_at(&self, local: NaiveDateTime) -> UtcOffset {
        if self.is_daylight_at(local) {
            self.offset_from
        } else {
            self.offset_to
        }
    }

    /// Converts a local wall-clock time to the UTC wall-clock time.
    #[must_use]
    pub fn to_utc(&self, local: NaiveDateTime) -> NaiveDateTime {
        shift(local, -self.offset_at(local).as_seconds())
    }

    /// Converts a UTC wall-clock time to local wall-clock time.
    #[must_use]
    pub fn local_from_utc(&self, utc: NaiveDateTime) -> NaiveDateTime {
        let daylight = shift(utc, self.offset_from.as_seconds());
        if self.is_daylight_at(daylight) {
            daylight
        } else {
            shift(utc, self.offset_to.as_seconds())
        }
    }
}

/// Moves a wall-clock value by an offset, saturating at the ends of time.
fn shift(value: NaiveDateTime, seconds: i32) -> NaiveDateTime {
    value
        .checked_add_signed(TimeDelta::seconds(i64::from(seconds)))
        .unwrap_or(if seconds < 0 {
            NaiveDateTime::MIN
        } else {
            NaiveDateTime::MAX
        })
}

fn recur(component: &Component) -> Option<&RRule> {
    component.get_property("RRULE")?.value.as_recur()
}

fn observance_start(dt: &ICalDateTime, kind: &'static str) -> Result<NaiveDateTime, VTimezoneError> {
    dt.to_naive()
        .ok_or_else(|| VTimezoneError::InvalidValue(kind, dt.to_string()))
}

fn latest_observance<'a>(
    component: &'a Component,
    kind: ComponentKind,
    kind_name: &'static str,
) -> Result<Option<Observance<'a>>, VTimezoneError> {
    let mut latest: Option<Observance<'a>> = None;
    for child in component.children_of_kind(kind) {
        let prop = child
            .get_property("DTSTART")
            .ok_or(VTimezoneError::MissingProperty("DTSTART", kind_name))?;
        let dtstart = match &prop.value {
            Value::DateTime(dt) => observance_start(dt, "DTSTART")?,
            _ => return Err(VTimezoneError::InvalidValue("DTSTART", prop.raw_value.clone())),
        };
        if latest.as_ref().is_none_or(|l| dtstart > l.dtstart) {
            latest = Some(Observance {
                dtstart,
                component: child,
            });
        }
    }
    Ok(latest)
}

fn offset_property(
    component: &Component,
    name: &'static str,
    kind_name: &'static str,
) -> Result<UtcOffset, VTimezoneError> {
    let prop = component
        .get_property(name)
        .ok_or(VTimezoneError::MissingProperty(name, kind_name))?;
    prop.value
        .as_utc_offset()
        .ok_or_else(|| VTimezoneError::InvalidValue(name, prop.raw_value.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rfc::ical::parse;

    fn naive(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    fn rule_from(vtimezone: &str) -> Result<CalendarTimezoneRule, VTimezoneError> {
        let text = format!("BEGIN:VCALENDAR\r\n{vtimezone}END:VCALENDAR\r\n");
        let ical = parse(&text).unwrap();
        CalendarTimezoneRule::from_component(ical.timezones()[0])
    }

    const BERLIN: &str = "\
BEGIN:VTIMEZONE\r\n\
TZID:W. Europe Custom\r\n\
BEGIN:STANDARD\r\n\
DTSTART:16010101T030000\r\n\
TZOFFSETFROM:+0200\r\n\
TZOFFSETTO:+0100\r\n\
RRULE:FREQ=YEARLY;BYDAY=-1SU;BYMONTH=10\r\n\
END:STANDARD\r\n\
BEGIN:DAYLIGHT\r\n\
DTSTART:16010101T020000\r\n\
TZOFFSETFROM:+0100\r\n\
TZOFFSETTO:+0200\r\n\
RRULE:FREQ=YEARLY;BYDAY=-1SU;BYMONTH=3\r\n\
END:DAYLIGHT\r\n\
END:VTIMEZONE\r\n";

    const SYDNEY: &str = "\
BEGIN:VTIMEZONE\r\n\
TZID:AUS Eastern\r\n\
BEGIN:STANDARD\r\n\
DTSTART:20080406T030000\r\n\
TZOFFSETFROM:+1100\r\n\
TZOFFSETTO:+1000\r\n\
RRULE:FREQ=YEARLY;BYMONTH=4;BYDAY=1SU\r\n\
END:STANDARD\r\n\
BEGIN:DAYLIGHT\r\n\
DTSTART:20081005T020000\r\n\
TZOFFSETFROM:+1000\r\n\
TZOFFSETTO:+1100\r\n\
RRULE:FREQ=YEARLY;BYMONTH=10;BYDAY=1SU\r\n\
END:DAYLIGHT\r\n\
END:VTIMEZONE\r\n";

    #[test]
    fn nth_weekday_first_sunday_march_2026() {
        assert_eq!(
            nth_weekday_of_month(2026, 3, chrono::Weekday::Sun, 1),
            NaiveDate::from_ymd_opt(2026, 3, 1)
        );
    }

    #[test]
    fn nth_weekday_second_sunday_march_2026() {
        assert_eq!(
            nth_weekday_of_month(2026, 3, chrono::Weekday::Sun, 2),
            NaiveDate::from_ymd_opt(2026, 3, 8)
        );
    }

    #[test]
    fn nth_weekday_last_sunday_october_2026() {
        assert_eq!(
            nth_weekday_of_month(2026, 10, chrono::Weekday::Sun, -1),
            NaiveDate::from_ymd_opt(2026, 10, 25)
        );
        assert_eq!(
            nth_weekday_of_month(2026, 12, chrono::Weekday::Thu, -1),
            NaiveDate::from_ymd_opt(2026, 12, 31)
        );
    }

    #[test]
    fn nth_weekday_out_of_month() {
        assert_eq!(nth_weekday_of_month(2026, 2, chrono::Weekday::Sun, 5), None);
        assert_eq!(nth_weekday_of_month(2026, 2, chrono::Weekday::Sun, -5), None);
        assert_eq!(nth_weekday_of_month(2026, 2, chrono::Weekday::Sun, 0), None);
    }

    #[test]
    fn berlin_rule_offsets() {
        let rule = rule_from(BERLIN).unwrap();
        assert_eq!(rule.id, "W. Europe Custom");
        assert_eq!(rule.offset_to.as_seconds(), 3600);
        assert_eq!(rule.offset_from.as_seconds(), 7200);

        // DST 2023 runs 26 March 02:00 to 29 October 03:00.
        assert!(!rule.is_daylight_at(naive(2023, 1, 10, 9, 0)));
        assert!(rule.is_daylight_at(naive(2023, 4, 5, 9, 0)));
        assert!(!rule.is_daylight_at(naive(2023, 11, 1, 9, 0)));

        assert_eq!(rule.to_utc(naive(2023, 4, 5, 9, 0)), naive(2023, 4, 5, 7, 0));
        assert_eq!(rule.to_utc(naive(2023, 1, 10, 9, 0)), naive(2023, 1, 10, 8, 0));

        assert_eq!(rule.local_from_utc(naive(2023, 4, 5, 7, 0)), naive(2023, 4, 5, 9, 0));
        assert_eq!(rule.local_from_utc(naive(2023, 1, 10, 8, 0)), naive(2023, 1, 10, 9, 0));
    }

    #[test]
    fn boundary_instant_takes_new_offset() {
        let rule = rule_from(BERLIN).unwrap();
        assert!(!rule.is_daylight_at(naive(2023, 3, 26, 1, 59)));
        assert!(rule.is_daylight_at(naive(2023, 3, 26, 2, 0)));
        assert!(rule.is_daylight_at(naive(2023, 10, 29, 2, 59)));
        assert!(!rule.is_daylight_at(naive(2023, 10, 29, 3, 0)));
    }

    #[test]
    fn southern_hemisphere_wraps_around_new_year() {
        let rule = rule_from(SYDNEY).unwrap();
        assert!(rule.is_daylight_at(naive(2024, 1, 15, 12, 0)));
        assert!(!rule.is_daylight_at(naive(2024, 6, 15, 12, 0)));
        assert!(rule.is_daylight_at(naive(2024, 12, 1, 12, 0)));
        assert_eq!(rule.offset_at(naive(2024, 1, 15, 12, 0)).as_seconds(), 11 * 3600);
    }

    #[test]
    fn latest_observance_wins() {
        let rule = rule_from(
            "BEGIN:VTIMEZONE\r\n\
TZID:US Eastern\r\n\
BEGIN:STANDARD\r\n\
DTSTART:19671029T020000\r\n\
RRULE:FREQ=YEARLY;BYDAY=-1SU;BYMONTH=10\r\n\
TZOFFSETFROM:-0400\r\n\
TZOFFSETTO:-0500\r\n\
END:STANDARD\r\n\
BEGIN:STANDARD\r\n\
DTSTART:20071104T020000\r\n\
RRULE:FREQ=YEARLY;BYDAY=1SU;BYMONTH=11\r\n\
TZOFFSETFROM:-0400\r\n\
TZOFFSETTO:-0500\r\n\
END:STANDARD\r\n\
BEGIN:DAYLIGHT\r\n\
DTSTART:19870405T020000\r\n\
RRULE:FREQ=YEARLY;BYDAY=1SU;BYMONTH=4\r\n\
TZOFFSETFROM:-0500\r\n\
TZOFFSETTO:-0400\r\n\
END:DAYLIGHT\r\n\
BEGIN:DAYLIGHT\r\n\
DTSTART:20070311T020000\r\n\
RRULE:FREQ=YEARLY;BYDAY=2SU;BYMONTH=3\r\n\
TZOFFSETFROM:-0500\r\n\
TZOFFSETTO:-0400\r\n\
END:DAYLIGHT\r\n\
END:VTIMEZONE\r\n",
        )
        .unwrap();

        // 2026: second Sunday of March is the 8th, first Sunday of November the 1st.
        assert!(rule.is_daylight_at(naive(2026, 3, 10, 12, 0)));
        assert!(!rule.is_daylight_at(naive(2026, 11, 2, 12, 0)));
    }

    #[test]
    fn monthday_week_reads_as_ordinal() {
        let dtstart = naive(2000, 3, 12, 2, 0);
        let rule = crate::rfc::ical::parse::parse_rrule(
            "FREQ=YEARLY;BYMONTH=3;BYDAY=SU;BYMONTHDAY=8,9,10,11,12,13,14",
            1,
            1,
        )
        .unwrap();
        let transition = YearlyTransition::from_rule(dtstart, Some(&rule));
        assert_eq!(
            transition.day,
            TransitionDay::NthWeekday {
                ordinal: 2,
                weekday: chrono::Weekday::Sun
            }
        );
    }

    #[test]
    fn zone_without_dst() {
        let rule = rule_from(
            "BEGIN:VTIMEZONE\r\nTZID:India\r\nBEGIN:STANDARD\r\nDTSTART:19700101T000000\r\nTZOFFSETFROM:+0530\r\nTZOFFSETTO:+0530\r\nEND:STANDARD\r\nEND:VTIMEZONE\r\n",
        )
        .unwrap();
        assert!(rule.daylight_rule.is_none());
        assert_eq!(rule.to_utc(naive(2026, 1, 15, 12, 0)), naive(2026, 1, 15, 6, 30));
    }

    #[test]
    fn missing_parts_are_errors() {
        assert_eq!(
            rule_from("BEGIN:VTIMEZONE\r\nBEGIN:STANDARD\r\nEND:STANDARD\r\nEND:VTIMEZONE\r\n"),
            Err(VTimezoneError::MissingTzid)
        );
        assert_eq!(
            rule_from("BEGIN:VTIMEZONE\r\nTZID:X\r\nEND:VTIMEZONE\r\n"),
            Err(VTimezoneError::MissingStandard("X".into()))
        );
        assert_eq!(
            rule_from(
                "BEGIN:VTIMEZONE\r\nTZID:X\r\nBEGIN:STANDARD\r\nDTSTART:19700101T000000\r\nTZOFFSETTO:+0100\r\nEND:STANDARD\r\nEND:VTIMEZONE\r\n"
            ),
            Err(VTimezoneError::MissingProperty("TZOFFSETFROM", "STANDARD"))
        );
        assert_eq!(
            rule_from(
                "BEGIN:VTIMEZONE\r\nTZID:X\r\nBEGIN:STANDARD\r\nDTSTART:19700101T000000\r\nTZOFFSETFROM:one\r\nTZOFFSETTO:+0100\r\nEND:STANDARD\r\nEND:VTIMEZONE\r\n"
            ),
            Err(VTimezoneError::InvalidValue("TZOFFSETFROM", "one".into()))
        );
    }

    #[test]
    fn conversions_saturate_at_the_ends_of_time() {
        let rule = rule_from(
            "BEGIN:VTIMEZONE\r\nTZID:My Zone\r\nBEGIN:STANDARD\r\nDTSTART:19700101T000000\r\n\
TZOFFSETFROM:-0500\r\nTZOFFSETTO:-0500\r\nEND:STANDARD\r\nEND:VTIMEZONE\r\n",
        )
        .unwrap();

        assert_eq!(rule.local_from_utc(NaiveDateTime::MIN), NaiveDateTime::MIN);
        assert_eq!(rule.to_utc(NaiveDateTime::MAX), NaiveDateTime::MAX);
        assert_eq!(
            rule.local_from_utc(naive(2023, 4, 5, 12, 0)),
            naive(2023, 4, 5, 7, 0)
        );
    }
}

//! The caching window and the final filter and sort.

use std::fmt;

use calreader_rfc::rfc::ical::expand::localize;
use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;

use super::logger::ImportLogger;
use super::occurrence::Occurrence;

const FIRST_DAY: NaiveDate = match NaiveDate::from_ymd_opt(1, 1, 1) {
    Some(day) => day,
    None => NaiveDate::MIN,
};
const LAST_DAY: NaiveDate = match NaiveDate::from_ymd_opt(9999, 12, 31) {
    Some(day) => day,
    None => NaiveDate::MAX,
};

/// The span of time occurrences are produced for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachingWindow {
    pub from: DateTime<Utc>,
    pub until: DateTime<Utc>,
}

impl CachingWindow {
    /// ## Summary
    /// Whole local days around `now`.
    ///
    /// Starts at local midnight `days_back` days before today and ends at
    /// the local midnight that closes the last of the `days_ahead` days.
    /// Both ends stay within the four-digit years a calendar can name.
    #[must_use]
    pub fn around(now: DateTime<Utc>, days_back: u32, days_ahead: u32, zone: Tz) -> Self {
        let today = now.with_timezone(&zone).date_naive();
        let first = today
            .checked_sub_days(Days::new(u64::from(days_back)))
            .map_or(FIRST_DAY, |day| day.max(FIRST_DAY));
        let end = today
            .checked_add_days(Days::new(u64::from(days_ahead) + 1))
            .map_or(LAST_DAY, |day| day.min(LAST_DAY));

        let midnight = |date: NaiveDate| {
            localize(zone, date.and_time(NaiveTime::MIN)).with_timezone(&Utc)
        };
        Self {
            from: midnight(first),
            until: midnight(end),
        }
    }

    /// ## Summary
    /// Whether an occurrence overlaps the window.
    ///
    /// Both edges are inclusive, except that an all-day occurrence merely
    /// touching an edge is outside.
    #[must_use]
    pub fn admits(&self, occurrence: &Occurrence) -> bool {
        let from = self.from.timestamp();
        let until = self.until.timestamp();
        if occurrence.to < from || occurrence.from > until {
            return false;
        }
        !(occurrence.all_day && (occurrence.to == from || occurrence.from == until))
    }
}

impl fmt::Display for CachingWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.from.to_rfc3339(), self.until.to_rfc3339())
    }
}

/// Drops occurrences outside the window and sorts the rest by start.
///
/// The sort is stable, so simultaneous occurrences keep their input order.
#[must_use]
pub fn filter_and_sort(
    occurrences: Vec<Occurrence>,
    window: &CachingWindow,
    logger: &dyn ImportLogger,
) -> Vec<Occurrence> {
    let mut kept: Vec<Occurrence> = occurrences
        .into_iter()
        .filter(|occurrence| {
            let admitted = window.admits(occurrence);
            if !admitted {
                logger.debug(&format!(
                    "Event '{}' ({} - {}) is outside the cached time, ignoring",
                    occurrence.name, occurrence.from_s, occurrence.to_s
                ));
            }
            admitted
        })
        .collect();
    kept.sort_by_key(|occurrence| occurrence.from);
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::logger::TracingLogger;
    use chrono::TimeZone;

    fn occurrence(name: &str, from: i64, to: i64, all_day: bool) -> Occurrence {
        Occurrence {
            uid: name.to_string(),
            name: name.to_string(),
            location: String::new(),
            description: String::new(),
            status: String::new(),
            categories: Vec::new(),
            from,
            to,
            from_s: String::new(),
            to_s: String::new(),
            all_day,
            alarms: Vec::new(),
        }
    }

    #[test]
    fn window_covers_whole_local_days() {
        let now = Utc.with_ymd_and_hms(2023, 4, 5, 12, 30, 0).unwrap();
        let window = CachingWindow::around(now, 1, 0, chrono_tz::Europe::Berlin);
        assert_eq!(window.from, Utc.with_ymd_and_hms(2023, 4, 3, 22, 0, 0).unwrap());
        assert_eq!(window.until, Utc.with_ymd_and_hms(2023, 4, 5, 22, 0, 0).unwrap());
    }

    #[test]
    fn today_follows_the_local_zone() {
        // 23:30 UTC is already the next day in Berlin
        let now = Utc.with_ymd_and_hms(2023, 4, 5, 23, 30, 0).unwrap();
        let window = CachingWindow::around(now, 0, 0, chrono_tz::Europe::Berlin);
        assert_eq!(window.from, Utc.with_ymd_and_hms(2023, 4, 5, 22, 0, 0).unwrap());
    }

    #[test]
    fn huge_day_counts_stop_at_the_calendar_years() {
        let now = Utc.with_ymd_and_hms(2023, 4, 5, 12, 0, 0).unwrap();
        let window = CachingWindow::around(now, u32::MAX, u32::MAX, chrono_tz::America::New_York);
        assert_eq!(window.from.with_timezone(&chrono_tz::America::New_York).date_naive(), FIRST_DAY);
        assert_eq!(window.until.with_timezone(&chrono_tz::America::New_York).date_naive(), LAST_DAY);
    }

    #[test]
    fn edges_are_inclusive_except_for_all_day() {
        let window = CachingWindow {
            from: Utc.timestamp_opt(1000, 0).unwrap(),
            until: Utc.timestamp_opt(2000, 0).unwrap(),
        };
        assert!(window.admits(&occurrence("ends-at-from", 500, 1000, false)));
        assert!(window.admits(&occurrence("starts-at-until", 2000, 2500, false)));
        assert!(!window.admits(&occurrence("before", 100, 999, false)));
        assert!(!window.admits(&occurrence("after", 2001, 2500, false)));
        assert!(!window.admits(&occurrence("all-day-ends-at-from", 500, 1000, true)));
        assert!(!window.admits(&occurrence("all-day-starts-at-until", 2000, 2500, true)));
        assert!(window.admits(&occurrence("all-day-inside", 1000, 2000, true)));
    }

    #[test_log::test]
    fn filter_sorts_stably() {
        let window = CachingWindow {
            from: Utc.timestamp_opt(0, 0).unwrap(),
            until: Utc.timestamp_opt(10_000, 0).unwrap(),
        };
        let input = vec![
            occurrence("c", 300, 400, false),
            occurrence("a1", 100, 200, false),
            occurrence("gone", 20_000, 20_100, false),
            occurrence("a2", 100, 150, false),
        ];
        let names: Vec<String> = filter_and_sort(input, &window, &TracingLogger)
            .into_iter()
            .map(|o| o.name)
            .collect();
        assert_eq!(names, vec!["a1", "a2", "c"]);
    }
}

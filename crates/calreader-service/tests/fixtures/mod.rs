//! Calendar texts shared by the import tests.
//!
//! All of them are imported at 2023-04-05T12:00:00Z unless a test says otherwise.

/// A single one-hour meeting in Berlin with a reminder.
pub const BERLIN_SINGLE: &str = "BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
PRODID:-//calreader//tests//EN\r\n\
BEGIN:VEVENT\r\n\
UID:single@example.com\r\n\
SUMMARY:Test\r\n\
LOCATION:Room 1\r\n\
DTSTART;TZID=Europe/Berlin:20230405T090000\r\n\
DTEND;TZID=Europe/Berlin:20230405T100000\r\n\
BEGIN:VALARM\r\n\
ACTION:DISPLAY\r\n\
TRIGGER:-PT15M\r\n\
END:VALARM\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n";

/// A weekly series with one excluded instance, one edited instance and one
/// instance moved from before the window into it.
pub const WEEKLY_WITH_EXCEPTIONS: &str = "BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
PRODID:-//calreader//tests//EN\r\n\
BEGIN:VEVENT\r\n\
UID:weekly@example.com\r\n\
SUMMARY:Weekly sync\r\n\
DTSTART;TZID=Europe/Berlin:20230329T090000\r\n\
DTEND;TZID=Europe/Berlin:20230329T100000\r\n\
RRULE:FREQ=WEEKLY\r\n\
EXDATE;TZID=Europe/Berlin:20230412T090000\r\n\
END:VEVENT\r\n\
BEGIN:VEVENT\r\n\
UID:weekly@example.com\r\n\
SUMMARY:Changed\r\n\
RECURRENCE-ID;TZID=Europe/Berlin:20230405T090000\r\n\
DTSTART;TZID=Europe/Berlin:20230405T090000\r\n\
DTEND;TZID=Europe/Berlin:20230405T103000\r\n\
END:VEVENT\r\n\
BEGIN:VEVENT\r\n\
UID:weekly@example.com\r\n\
SUMMARY:Moved in\r\n\
RECURRENCE-ID;TZID=Europe/Berlin:20230329T090000\r\n\
DTSTART;TZID=Europe/Berlin:20230406T140000\r\n\
DTEND;TZID=Europe/Berlin:20230406T150000\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n";

/// A daily one-hour series running across the March DST change.
pub const DAILY_ACROSS_DST: &str = "BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
PRODID:-//calreader//tests//EN\r\n\
BEGIN:VEVENT\r\n\
UID:daily@example.com\r\n\
SUMMARY:Standup\r\n\
DTSTART;TZID=Europe/Berlin:20230320T090000\r\n\
DTEND;TZID=Europe/Berlin:20230320T100000\r\n\
RRULE:FREQ=DAILY;COUNT=14\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n";

/// A whole-day event and a zoned working day.
pub const ALL_DAY_AND_WORKDAY: &str = "BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
PRODID:-//calreader//tests//EN\r\n\
BEGIN:VEVENT\r\n\
UID:holiday@example.com\r\n\
SUMMARY:Holiday\r\n\
DTSTART;VALUE=DATE:20230406\r\n\
END:VEVENT\r\n\
BEGIN:VEVENT\r\n\
UID:workday@example.com\r\n\
SUMMARY:Workday\r\n\
DTSTART;TZID=Europe/Berlin:20230407T090000\r\n\
DTEND;TZID=Europe/Berlin:20230407T170000\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n";

/// Berlin rules declared under an Exchange display name and under a name no
/// table knows, with a winter and a summer event for each.
pub const MANGLED_VTIMEZONES: &str = "BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
PRODID:Microsoft Exchange Server 2010\r\n\
BEGIN:VTIMEZONE\r\n\
TZID:(UTC+01:00) Amsterdam, Berlin, Bern, Rome, Stockholm, Vienna\r\n\
BEGIN:STANDARD\r\n\
DTSTART:16010101T030000\r\n\
TZOFFSETFROM:+0200\r\n\
TZOFFSETTO:+0100\r\n\
RRULE:FREQ=YEARLY;INTERVAL=1;BYDAY=-1SU;BYMONTH=10\r\n\
END:STANDARD\r\n\
BEGIN:DAYLIGHT\r\n\
DTSTART:16010101T020000\r\n\
TZOFFSETFROM:+0100\r\n\
TZOFFSETTO:+0200\r\n\
RRULE:FREQ=YEARLY;INTERVAL=1;BYDAY=-1SU;BYMONTH=3\r\n\
END:DAYLIGHT\r\n\
END:VTIMEZONE\r\n\
BEGIN:VTIMEZONE\r\n\
TZID:Custom Office Zone\r\n\
BEGIN:STANDARD\r\n\
DTSTART:16010101T030000\r\n\
TZOFFSETFROM:+0200\r\n\
TZOFFSETTO:+0100\r\n\
RRULE:FREQ=YEARLY;INTERVAL=1;BYDAY=-1SU;BYMONTH=10\r\n\
END:STANDARD\r\n\
BEGIN:DAYLIGHT\r\n\
DTSTART:16010101T020000\r\n\
TZOFFSETFROM:+0100\r\n\
TZOFFSETTO:+0200\r\n\
RRULE:FREQ=YEARLY;INTERVAL=1;BYDAY=-1SU;BYMONTH=3\r\n\
END:DAYLIGHT\r\n\
END:VTIMEZONE\r\n\
BEGIN:VEVENT\r\n\
UID:exchange-winter@example.com\r\n\
SUMMARY:Exchange winter\r\n\
DTSTART;TZID=\"(UTC+01:00) Amsterdam, Berlin, Bern, Rome, Stockholm, Vienna\":20230110T090000\r\n\
DTEND;TZID=\"(UTC+01:00) Amsterdam, Berlin, Bern, Rome, Stockholm, Vienna\":20230110T100000\r\n\
END:VEVENT\r\n\
BEGIN:VEVENT\r\n\
UID:exchange-summer@example.com\r\n\
SUMMARY:Exchange summer\r\n\
DTSTART;TZID=\"(UTC+01:00) Amsterdam, Berlin, Bern, Rome, Stockholm, Vienna\":20230405T090000\r\n\
DTEND;TZID=\"(UTC+01:00) Amsterdam, Berlin, Bern, Rome, Stockholm, Vienna\":20230405T100000\r\n\
END:VEVENT\r\n\
BEGIN:VEVENT\r\n\
UID:custom-winter@example.com\r\n\
SUMMARY:Custom winter\r\n\
DTSTART;TZID=Custom Office Zone:20230110T090000\r\n\
DTEND;TZID=Custom Office Zone:20230110T100000\r\n\
END:VEVENT\r\n\
BEGIN:VEVENT\r\n\
UID:custom-summer@example.com\r\n\
SUMMARY:Custom summer\r\n\
DTSTART;TZID=Custom Office Zone:20230405T090000\r\n\
DTEND;TZID=Custom Office Zone:20230405T100000\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n";

/// One event with a rule no reader understands next to a healthy one.
pub const MALFORMED_RULE: &str = "BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
PRODID:-//calreader//tests//EN\r\n\
BEGIN:VEVENT\r\n\
UID:broken@example.com\r\n\
SUMMARY:Broken\r\n\
DTSTART:20230405T090000Z\r\n\
RRULE:FREQ=SOMETIMES;COUNT=3\r\n\
END:VEVENT\r\n\
BEGIN:VEVENT\r\n\
UID:healthy@example.com\r\n\
SUMMARY:Healthy\r\n\
DTSTART:20230406T090000Z\r\n\
DURATION:PT30M\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n";

pub const NOT_A_CALENDAR: &str = "<html><body>502 Bad Gateway</body></html>\r\n";

//! Vendor timezone aliases.
//!
//! Exchange, Outlook, Lotus and older Mozilla builds write TZIDs that are
//! not IANA names: Windows zone IDs, localized display strings with the
//! UTC offset in front, or path-prefixed Olson names. This module cleans
//! such names up and maps them onto IANA zones.

use std::str::FromStr;

use chrono_tz::Tz;
use icu::time::zone::WindowsParser;
use icu::time::zone::iana::IanaParserExtended;

const VENDOR_PREFIXES: [&str; 2] = ["/mozilla.org/", "/softwarestudio.org/"];

/// Exchange/Outlook display names, keyed by the city list after the offset.
const DISPLAY_NAMES: &[(&str, &str)] = &[
    ("Amsterdam, Berlin, Bern, Rome, Stockholm, Vienna", "Europe/Berlin"),
    ("Belgrade, Bratislava, Budapest, Ljubljana, Prague", "Europe/Budapest"),
    ("Brussels, Copenhagen, Madrid, Paris", "Europe/Paris"),
    ("Sarajevo, Skopje, Warsaw, Zagreb", "Europe/Warsaw"),
    ("West Central Africa", "Africa/Lagos"),
    ("Dublin, Edinburgh, Lisbon, London", "Europe/London"),
    ("Monrovia, Reykjavik", "Atlantic/Reykjavik"),
    ("Coordinated Universal Time", "UTC"),
    ("Athens, Bucharest", "Europe/Bucharest"),
    ("Helsinki, Kyiv, Riga, Sofia, Tallinn, Vilnius", "Europe/Helsinki"),
    ("Jerusalem", "Asia/Jerusalem"),
    ("Cairo", "Africa/Cairo"),
    ("Harare, Pretoria", "Africa/Johannesburg"),
    ("Istanbul", "Europe/Istanbul"),
    ("Moscow, St. Petersburg", "Europe/Moscow"),
    ("Nairobi", "Africa/Nairobi"),
    ("Tehran", "Asia/Tehran"),
    ("Abu Dhabi, Muscat", "Asia/Dubai"),
    ("Kabul", "Asia/Kabul"),
    ("Islamabad, Karachi", "Asia/Karachi"),
    ("Chennai, Kolkata, Mumbai, New Delhi", "Asia/Kolkata"),
    ("Bangkok, Hanoi, Jakarta", "Asia/Bangkok"),
    ("Beijing, Chongqing, Hong Kong, Urumqi", "Asia/Shanghai"),
    ("Kuala Lumpur, Singapore", "Asia/Singapore"),
    ("Perth", "Australia/Perth"),
    ("Taipei", "Asia/Taipei"),
    ("Osaka, Sapporo, Tokyo", "Asia/Tokyo"),
    ("Seoul", "Asia/Seoul"),
    ("Adelaide", "Australia/Adelaide"),
    ("Brisbane", "Australia/Brisbane"),
    ("Canberra, Melbourne, Sydney", "Australia/Sydney"),
    ("Auckland, Wellington", "Pacific/Auckland"),
    ("Atlantic Time (Canada)", "America/Halifax"),
    ("Eastern Time (US & Canada)", "America/New_York"),
    ("Central Time (US & Canada)", "America/Chicago"),
    ("Mountain Time (US & Canada)", "America/Denver"),
    ("Arizona", "America/Phoenix"),
    ("Pacific Time (US & Canada)", "America/Los_Angeles"),
    ("Alaska", "America/Anchorage"),
    ("Hawaii", "Pacific/Honolulu"),
    ("Brasilia", "America/Sao_Paulo"),
    ("City of Buenos Aires", "America/Argentina/Buenos_Aires"),
    ("Buenos Aires", "America/Argentina/Buenos_Aires"),
];

/// Short legacy names some exporters write without the `Standard Time` suffix.
const LEGACY_NAMES: &[(&str, &str)] = &[
    ("Afghanistan", "Asia/Kabul"),
    ("Fiji", "Pacific/Fiji"),
    ("Myanmar", "Asia/Yangon"),
    ("New Zealand", "Pacific/Auckland"),
    ("UTC-02", "America/Noronha"),
    ("UTC-11", "Pacific/Pago_Pago"),
    ("UTC+12", "Pacific/Auckland"),
];

/// ## Summary
/// Cleans up a vendor TZID.
///
/// Strips Mozilla-style path prefixes, quotes and backslashes, collapses
/// whitespace and rewrites the leading offset of a display name to the
/// `(UTC+01:00)` form.
#[must_use]
pub fn normalize_zone_name(name: &str) -> String {
    let mut name = name.trim();
    for prefix in VENDOR_PREFIXES {
        if let Some(rest) = name.strip_prefix(prefix) {
            name = rest;
            // drop version segments such as `20050126_1/`
            while let Some((first, rest)) = name.split_once('/')
                && first.bytes().any(|b| b.is_ascii_digit())
            {
                name = rest;
            }
        }
    }

    let cleaned: String = name.chars().filter(|c| !matches!(c, '"' | '\\')).collect();
    let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");

    canonicalize_offset_prefix(&collapsed).unwrap_or(collapsed)
}

/// Rewrites `(UTC +01:00)`, `(UTC+0100)` or `(GMT+01:00)` prefixes to `(UTC+01:00)`.
fn canonicalize_offset_prefix(name: &str) -> Option<String> {
    let inner_and_rest = name.strip_prefix('(')?;
    let (inner, rest) = inner_and_rest.split_once(')')?;
    let inner = inner.trim();
    let head = inner.get(..3)?;
    if !head.eq_ignore_ascii_case("UTC") && !head.eq_ignore_ascii_case("GMT") {
        return None;
    }

    let offset = inner.get(3..)?.trim();
    let prefix = if offset.is_empty() {
        "(UTC)".to_string()
    } else {
        let sign = offset.chars().next().filter(|c| matches!(c, '+' | '-'))?;
        let digits: String = offset[1..]
            .chars()
            .filter(|c| !matches!(c, ':' | ' '))
            .collect();
        if !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let (hours, minutes) = match digits.len() {
            1 | 2 => (digits.as_str(), "00"),
            3 => (&digits[..1], &digits[1..]),
            4 => (&digits[..2], &digits[2..]),
            _ => return None,
        };
        format!("(UTC{sign}{hours:0>2}:{minutes})")
    };

    let rest = rest.trim();
    Some(if rest.is_empty() {
        prefix
    } else {
        format!("{prefix} {rest}")
    })
}

fn parse_tz(name: &str) -> Option<Tz> {
    Tz::from_str(name).ok()
}

/// Resolves IANA names and aliases through ICU, returning the canonical zone.
#[must_use]
pub fn lookup_iana_alias(name: &str) -> Option<Tz> {
    if let Some(tz) = parse_tz(name) {
        return Some(tz);
    }
    let parsed = IanaParserExtended::new().parse(name);
    if parsed.time_zone == icu::time::TimeZone::UNKNOWN {
        return None;
    }
    parse_tz(parsed.canonical)
}

/// Resolves Windows zone IDs such as `W. Europe Standard Time` through ICU.
#[must_use]
pub fn lookup_windows_zone(name: &str) -> Option<Tz> {
    let windows_parser = WindowsParser::new();
    let tz = windows_parser.parse(name, None)?;
    let iana_parser = IanaParserExtended::new();
    iana_parser
        .iter()
        .find(|entry| entry.time_zone == tz)
        .and_then(|entry| parse_tz(entry.canonical))
}

/// Resolves an Exchange display name by its city list.
///
/// Truncated lists (`Amsterdam, Berlin...`) match any entry they are a
/// prefix of. A name that only starts with an entry, such as
/// `Brisbane Office`, is not a display name.
#[must_use]
pub fn lookup_display_name(name: &str) -> Option<Tz> {
    let cities = match name.split_once(')') {
        Some((head, rest)) if head.starts_with("(UTC") => rest,
        _ => name,
    };
    let cities = cities.trim().trim_end_matches(['.', '…']).trim_end();
    if cities.len() < 4 {
        return None;
    }
    let cities = cities.to_ascii_lowercase();

    DISPLAY_NAMES
        .iter()
        .find(|(key, _)| key.to_ascii_lowercase().starts_with(&cities))
        .and_then(|(_, iana)| parse_tz(iana))
}

/// Resolves legacy short names, with or without the `Standard Time` suffix.
#[must_use]
pub fn lookup_legacy_name(name: &str) -> Option<Tz> {
    let short = name
        .strip_suffix(" Standard Time")
        .unwrap_or(name)
        .trim();
    LEGACY_NAMES
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(short))
        .and_then(|(_, iana)| parse_tz(iana))
}

/// ## Summary
/// Maps a vendor TZID onto an IANA zone.
///
/// Tries, on the normalized name: ICU IANA aliases, ICU Windows IDs, the
/// display-name table and the legacy table.
#[must_use]
pub fn resolve_vendor_alias(name: &str) -> Option<Tz> {
    let normalized = normalize_zone_name(name);
    if normalized.is_empty() {
        return None;
    }

    let resolved = lookup_iana_alias(&normalized)
        .or_else(|| lookup_windows_zone(&normalized))
        .or_else(|| lookup_display_name(&normalized))
        .or_else(|| lookup_legacy_name(&normalized));

    tracing::trace!(
        tzid = name,
        normalized = %normalized,
        resolved = ?resolved,
        "Vendor alias lookup"
    );
    resolved
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_vendor_noise() {
        assert_eq!(normalize_zone_name("/mozilla.org/20050126_1/Europe/Berlin"), "Europe/Berlin");
        assert_eq!(normalize_zone_name("/softwarestudio.org/Olson_20011030_5/America/New_York"), "America/New_York");
        assert_eq!(normalize_zone_name(" \"W. Europe\\  Standard Time\" "), "W. Europe Standard Time");
    }

    #[test]
    fn normalize_canonicalizes_offset_prefix() {
        let expected = "(UTC+01:00) Amsterdam, Berlin";
        assert_eq!(normalize_zone_name("(UTC +01:00) Amsterdam, Berlin"), expected);
        assert_eq!(normalize_zone_name("(UTC+0100) Amsterdam, Berlin"), expected);
        assert_eq!(normalize_zone_name("(GMT+01:00) Amsterdam, Berlin"), expected);
        assert_eq!(normalize_zone_name("(UTC+1) Amsterdam, Berlin"), expected);
        assert_eq!(normalize_zone_name("(UTC-03:30) Newfoundland"), "(UTC-03:30) Newfoundland");
        assert_eq!(normalize_zone_name("(UTC) Coordinated Universal Time"), "(UTC) Coordinated Universal Time");
    }

    #[test]
    fn windows_ids_resolve() {
        assert_eq!(lookup_windows_zone("Eastern Standard Time"), Some(chrono_tz::America::New_York));
        assert_eq!(lookup_windows_zone("W. Europe Standard Time"), Some(chrono_tz::Europe::Berlin));
    }

    #[test]
    fn display_names_resolve() {
        for name in [
            "(UTC+01:00) Amsterdam, Berlin, Bern, Rome, Stockholm, Vienna",
            "\"(UTC+01:00) Amsterdam, Berlin, Bern, Rome, Stockholm, Vienna\"",
            "(UTC +01:00) Amsterdam, Berlin...",
            "(GMT+0100) Amsterdam,  Berlin, Bern",
        ] {
            assert_eq!(resolve_vendor_alias(name), Some(chrono_tz::Europe::Berlin), "{name}");
        }
        assert_eq!(
            resolve_vendor_alias("(UTC-05:00) Eastern Time (US & Canada)"),
            Some(chrono_tz::America::New_York)
        );
    }

    #[test]
    fn legacy_names_resolve() {
        assert_eq!(lookup_legacy_name("Afghanistan"), Some(chrono_tz::Asia::Kabul));
        assert_eq!(lookup_legacy_name("Myanmar Standard Time"), Some(chrono_tz::Asia::Yangon));
        assert_eq!(lookup_legacy_name("utc-11"), Some(chrono_tz::Pacific::Pago_Pago));
        assert_eq!(resolve_vendor_alias("Fiji"), Some(chrono_tz::Pacific::Fiji));
    }

    #[test]
    fn unknown_names_do_not_resolve() {
        assert_eq!(resolve_vendor_alias("Totally Custom Zone"), None);
        assert_eq!(lookup_display_name("Brisbane Office"), None);
        assert_eq!(resolve_vendor_alias("(UTC+10:00) Brisbane Office"), None);
        assert_eq!(resolve_vendor_alias(""), None);
    }
}

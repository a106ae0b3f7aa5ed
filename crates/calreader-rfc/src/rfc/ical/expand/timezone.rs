//! Timezone resolution for iCalendar date-times.
//!
//! A TZID is resolved by walking an ordered list of [`ZoneLookup`] tiers:
//! IANA names, vendor aliases, then the VTIMEZONE rules the calendar
//! declares itself. The first tier that recognizes the name wins.

use std::collections::HashMap;
use std::str::FromStr;

use chrono::{DateTime, LocalResult, NaiveDateTime, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;

use super::alias::{normalize_zone_name, resolve_vendor_alias};
use super::vtimezone::{CalendarTimezoneRule, VTimezoneError};
use crate::rfc::ical::core::ICalendar;

/// Error during timezone resolution.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimezoneError {
    /// No tier recognized the identifier.
    #[error("Unresolved timezone: {0}")]
    Unresolved(String),
}

/// Offset information for a resolved TZID.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ZoneInfo<'a> {
    /// A zone from the IANA database.
    Iana(Tz),
    /// A rule declared by a VTIMEZONE in the calendar.
    Declared(&'a CalendarTimezoneRule),
}

impl ZoneInfo<'_> {
    /// ## Summary
    /// Interprets a local wall-clock time in this zone.
    ///
    /// IANA gaps shift forward one hour and folds take the earlier instant.
    /// Declared rules apply their standard or daylight offset.
    #[must_use]
    pub fn to_utc(self, local: NaiveDateTime) -> DateTime<Utc> {
        match self {
            Self::Iana(tz) => localize(tz, local).with_timezone(&Utc),
            Self::Declared(rule) => rule.to_utc(local).and_utc(),
        }
    }

    /// Converts an instant to local wall-clock time in this zone.
    #[must_use]
    pub fn to_local(self, utc: DateTime<Utc>) -> NaiveDateTime {
        match self {
            Self::Iana(tz) => utc.with_timezone(&tz).naive_local(),
            Self::Declared(rule) => rule.local_from_utc(utc.naive_utc()),
        }
    }

    /// Returns the IANA zone, if this is one.
    #[must_use]
    pub fn iana(self) -> Option<Tz> {
        match self {
            Self::Iana(tz) => Some(tz),
            Self::Declared(_) => None,
        }
    }
}

/// One tier of timezone lookup.
pub trait ZoneLookup {
    /// Short tier name used in logs.
    fn name(&self) -> &'static str;

    /// Returns offset information when this tier recognizes `tzid`.
    fn lookup<'a>(&'a self, tzid: &str) -> Option<ZoneInfo<'a>>;
}

/// Exact IANA names.
#[derive(Debug, Default, Clone, Copy)]
pub struct IanaLookup;

impl ZoneLookup for IanaLookup {
    fn name(&self) -> &'static str {
        "iana"
    }

    fn lookup<'a>(&'a self, tzid: &str) -> Option<ZoneInfo<'a>> {
        Tz::from_str(tzid.trim()).ok().map(ZoneInfo::Iana)
    }
}

/// Vendor names: Windows IDs, Exchange display names and mangled Olson paths.
#[derive(Debug, Default, Clone, Copy)]
pub struct VendorAliasLookup;

impl ZoneLookup for VendorAliasLookup {
    fn name(&self) -> &'static str {
        "vendor-alias"
    }

    fn lookup<'a>(&'a self, tzid: &str) -> Option<ZoneInfo<'a>> {
        resolve_vendor_alias(tzid).map(ZoneInfo::Iana)
    }
}

/// Rules declared by the calendar's own VTIMEZONE components.
///
/// Declared TZIDs and the TZID parameters that reference them are often
/// quoted or escaped differently, so a miss on the exact id retries with
/// the normalized form.
#[derive(Debug, Default, Clone)]
pub struct DeclaredRuleLookup {
    rules: HashMap<String, CalendarTimezoneRule>,
    normalized: HashMap<String, String>,
}

impl DeclaredRuleLookup {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a rule. A later rule with the same id replaces the earlier one.
    pub fn insert(&mut self, rule: CalendarTimezoneRule) {
        self.normalized
            .insert(normalize_zone_name(&rule.id), rule.id.clone());
        self.rules.insert(rule.id.clone(), rule);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    #[must_use]
    pub fn get(&self, tzid: &str) -> Option<&CalendarTimezoneRule> {
        self.rules.get(tzid).or_else(|| {
            self.normalized
                .get(&normalize_zone_name(tzid))
                .and_then(|id| self.rules.get(id))
        })
    }
}

impl ZoneLookup for DeclaredRuleLookup {
    fn name(&self) -> &'static str {
        "declared-rule"
    }

    fn lookup<'a>(&'a self, tzid: &str) -> Option<ZoneInfo<'a>> {
        self.get(tzid).map(ZoneInfo::Declared)
    }
}

/// Ordered list of lookup tiers.
pub struct TimeZoneResolver {
    tiers: Vec<Box<dyn ZoneLookup>>,
}

impl std::fmt::Debug for TimeZoneResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.tiers.iter().map(|t| t.name()))
            .finish()
    }
}

impl Default for TimeZoneResolver {
    fn default() -> Self {
        Self::standard()
    }
}

impl TimeZoneResolver {
    /// Creates a resolver with no tiers.
    #[must_use]
    pub fn empty() -> Self {
        Self { tiers: Vec::new() }
    }

    /// Creates a resolver with the IANA and vendor-alias tiers.
    #[must_use]
    pub fn standard() -> Self {
        Self::empty().with_tier(IanaLookup).with_tier(VendorAliasLookup)
    }

    /// Appends a tier after the existing ones.
    #[must_use]
    pub fn with_tier(mut self, tier: impl ZoneLookup + 'static) -> Self {
        self.tiers.push(Box::new(tier));
        self
    }

    /// ## Summary
    /// Resolves a TZID through each tier in order.
    ///
    /// ## Errors
    /// Returns `TimezoneError::Unresolved` if no tier recognizes it.
    pub fn resolve(&self, tzid: &str) -> Result<ZoneInfo<'_>, TimezoneError> {
        for tier in &self.tiers {
            if let Some(info) = tier.lookup(tzid) {
                tracing::trace!(tzid, tier = tier.name(), "Resolved timezone");
                return Ok(info);
            }
        }
        tracing::debug!(tzid, "No timezone tier matched");
        Err(TimezoneError::Unresolved(tzid.to_string()))
    }
}

/// ## Summary
/// Builds a resolver whose last tier holds the calendar's VTIMEZONE rules.
///
/// VTIMEZONE components that cannot be reduced to a rule are skipped and
/// returned alongside the resolver so the caller can report them.
#[must_use]
pub fn build_timezone_resolver(ical: &ICalendar) -> (TimeZoneResolver, Vec<VTimezoneError>) {
    let mut declared = DeclaredRuleLookup::new();
    let mut errors = Vec::new();

    for component in ical.timezones() {
        match CalendarTimezoneRule::from_component(component) {
            Ok(rule) => declared.insert(rule),
            Err(err) => errors.push(err),
        }
    }

    tracing::debug!(
        declared = declared.len(),
        rejected = errors.len(),
        "Built timezone resolver"
    );

    (TimeZoneResolver::standard().with_tier(declared), errors)
}

/// ## Summary
/// Interprets a local wall-clock time in an IANA zone.
///
/// A time inside a DST gap moves forward one hour. A time inside a fold
/// takes the earlier of the two instants.
#[must_use]
pub fn localize(zone: Tz, local: NaiveDateTime) -> DateTime<Tz> {
    match zone.from_local_datetime(&local) {
        LocalResult::Single(dt) => dt,
        LocalResult::Ambiguous(earliest, _) => earliest,
        LocalResult::None => zone
            .from_local_datetime(&(local + TimeDelta::hours(1)))
            .earliest()
            .unwrap_or_else(|| zone.from_utc_datetime(&local)),
    }
}

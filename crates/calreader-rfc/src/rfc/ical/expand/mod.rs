//! Timezone resolution for the zones a calendar references.
//!
//! - `alias`: vendor TZID cleanup and alias tables
//! - `timezone`: tiered resolver and local-time interpretation
//! - `vtimezone`: reduction of declared VTIMEZONE blocks to yearly rules

pub mod alias;
pub mod timezone;
pub mod vtimezone;

pub use alias::{normalize_zone_name, resolve_vendor_alias};
pub use timezone::{
    DeclaredRuleLookup, IanaLookup, TimeZoneResolver, TimezoneError, VendorAliasLookup, ZoneInfo,
    ZoneLookup, build_timezone_resolver, localize,
};
pub use vtimezone::{
    CalendarTimezoneRule, TransitionDay, VTimezoneError, YearlyTransition, nth_weekday_of_month,
};

//! iCalendar core models (RFC 5545).
//!
//! The parser produces these as an immutable tree. Nothing downstream
//! mutates a parsed calendar; interpretation works on shared references.

mod component;
mod datetime;
mod duration;
mod parameter;
mod property;
mod rrule;
mod value;

pub use component::{Component, ComponentKind, ICalendar};
pub use datetime::{DateTime, DateTimeForm, UtcOffset};
pub use duration::Duration;
pub use parameter::{Parameter, TriggerRelated};
pub use property::{ContentLine, Property};
pub use rrule::{Frequency, RRule, RRuleUntil, Weekday, WeekdayNum};
pub use value::{Date, Value};

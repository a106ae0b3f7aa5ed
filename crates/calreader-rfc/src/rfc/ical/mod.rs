//! iCalendar RFC 5545 reading.
//!
//! - `core`: Type definitions for iCalendar structures
//! - `parse`: Tokenizer and typed value parsers
//! - `expand`: Timezone resolution for the zones a calendar references
//!
//! ## Example
//!
//! ```rust
//! use calreader_rfc::rfc::ical::parse;
//!
//! let input = "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nBEGIN:VEVENT\r\nUID:a\r\nEND:VEVENT\r\nEND:VCALENDAR\r\n";
//! let ical = parse(input).unwrap();
//! assert_eq!(ical.events().len(), 1);
//! ```

pub mod core;
pub mod expand;
pub mod parse;

pub use core::{Component, ComponentKind, ICalendar, Parameter, Property};
pub use parse::{ParseError, ParseResult, parse};

//! iCalendar parsing primitives (RFC 5545).
//!
//! - Lexer: content line splitting with unfolding
//! - Values: value type parsing (DATE, DATE-TIME, DURATION, RECUR, ...)
//! - Parser: full document parsing into the component tree

mod error;
mod lexer;
mod parser;
mod values;

pub use error::{ParseError, ParseErrorKind, ParseResult};
pub use lexer::{parse_content_line, split_lines};
pub use parser::parse;
pub use values::{
    looks_like_date, parse_date, parse_datetime, parse_duration, parse_integer, parse_rrule,
    parse_utc_offset, split_text_list, unescape_text,
};

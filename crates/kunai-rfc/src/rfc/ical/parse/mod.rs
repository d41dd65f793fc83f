//! iCalendar reader (RFC 5545).
//!
//! - Lexer: line unfolding and content line tokenization
//! - Values: typed value parsers (DATE, DATE-TIME, DURATION, PERIOD, RECUR)
//! - Parser: component tree construction and value type resolution

mod error;
mod lexer;
mod parser;
mod values;

pub use error::{ParseError, ParseErrorKind, ParseResult};
pub use lexer::{parse_content_line, split_lines};
pub use parser::parse;
pub use values::{
    parse_date, parse_date_time_value, parse_datetime, parse_duration, parse_period, parse_rrule,
    unescape_text,
};

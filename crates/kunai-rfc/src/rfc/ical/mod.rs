//! iCalendar (RFC 5545) support: object model, reader, writer and
//! timezone resolution.

pub mod build;
pub mod core;
pub mod expand;
pub mod parse;

#[cfg(test)]
mod tests;

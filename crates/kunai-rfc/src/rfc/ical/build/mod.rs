//! iCalendar writer (RFC 5545).

mod escape;
mod fold;
mod serializer;

pub use escape::escape_text;
pub use fold::fold_line;
pub use serializer::{serialize, serialize_component, serialize_property};

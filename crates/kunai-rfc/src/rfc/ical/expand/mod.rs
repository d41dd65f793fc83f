//! Timezone resolution for iCalendar date-times.

mod timezone;

pub use timezone::{ConversionError, TimeZoneResolver, localize};

/// Product identifiers shared across crates
pub const APP_NAME: &str = "Kunai";
pub const APP_VENDOR: &str = "Kunai";

/// PRODID written into generated iCalendar objects (RFC 5545 §3.7.3).
pub const DEFAULT_PRODID: &str = const_str::concat!(
    "-//",
    APP_VENDOR,
    "//",
    APP_NAME,
    " Recurrence Engine//EN"
);

/// Instance key used for the base (non-override) instance of a series.
pub const MASTER_INSTANCE_KEY: &str = "master";

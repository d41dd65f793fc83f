//! Recurring-event expansion, change detection and iTip composition.

pub mod event_comparison;
pub mod event_reader;
pub mod event_reader_rdate;
pub mod event_reader_rrule;
pub mod itip;
pub mod tip_broker;

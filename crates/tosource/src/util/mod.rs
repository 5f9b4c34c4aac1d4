//! Utility modules for literal encoding.

pub mod datetime;

pub use datetime::{DateTimeParseError, format_iso_instant, parse_iso_instant};

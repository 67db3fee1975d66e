//! Stateless converters between wire encodings and values.

pub mod bcd;
pub mod text;
pub mod time;
pub mod vax;

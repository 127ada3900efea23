//! Decode errors for gateway payloads

mod parse_error;

pub use parse_error::{FromPayload, ParseError};

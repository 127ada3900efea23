//! Top-level error type for binaries embedding the client

mod client_error;

pub use client_error::{ClientError, ClientResult};

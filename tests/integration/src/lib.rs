//! Integration test utilities for the gateway client
//!
//! This crate provides an in-process fake gateway that speaks the
//! zlib-stream protocol, plus payload fixtures for end-to-end tests.

pub mod fixtures;
pub mod helpers;

pub use fixtures::*;
pub use helpers::*;

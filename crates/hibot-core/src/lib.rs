//! Core domain + application logic for hibot.
//!
//! This crate is intentionally framework-agnostic. The Discord gateway and
//! REST surface live behind ports (traits) implemented in the adapter crate.

pub mod config;
pub mod domain;
pub mod donors;
pub mod errors;
pub mod highlights;
pub mod info;
pub mod logging;
pub mod messaging;
pub mod peps;
pub mod ports;
pub mod stats;
pub mod store;
pub mod tasks;

pub use errors::{Error, Result};

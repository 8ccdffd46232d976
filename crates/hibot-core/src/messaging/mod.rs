//! Gateway-facing abstractions (events in, messages out).

pub mod port;
pub mod types;

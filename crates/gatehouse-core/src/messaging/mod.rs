//! Messenger abstractions: incoming events, outbound port, relayable payloads.

pub mod payload;
pub mod port;
pub mod types;

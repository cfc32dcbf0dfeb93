//! Core domain + application logic for the gatehouse channel bot.
//!
//! This crate is framework-agnostic. Telegram lives behind [`messaging::port::MessagingPort`],
//! persistence behind the traits in [`store`] and [`audit`].

pub mod admin_panel;
pub mod app;
pub mod audit;
pub mod broadcast;
pub mod callbacks;
pub mod commands;
pub mod config;
pub mod correlator;
pub mod domain;
pub mod errors;
pub mod join;
pub mod live_chat;
pub mod logging;
pub mod messaging;
pub mod relay;
pub mod router;
pub mod settings;
pub mod state;
pub mod store;
pub mod utils;
pub mod welcome;
pub mod wizard;

#[cfg(test)]
mod testing;

pub use app::{App, AppConfig, Stores};
pub use errors::{Error, Result};

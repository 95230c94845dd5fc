//! Core domain + routing logic for the nfd anonymous relay.
//!
//! This crate is intentionally framework-agnostic. Telegram, the HTTP gateway
//! and remote documents live behind ports (traits) implemented in adapter
//! crates.

pub mod clock;
pub mod config;
pub mod documents;
pub mod domain;
pub mod errors;
pub mod fraud;
pub mod logging;
pub mod messaging;
pub mod notify;
pub mod router;
pub mod store;

pub use errors::{Error, Result};

//! Relay control gateway client.
//!
//! Wraps the relay's control RPCs (inbound management, user entries and
//! traffic counters) behind the [`RelayControl`] trait. Share-link rendering
//! and the relay's naming conventions live in [`link`].

mod client;
mod error;
pub mod link;
mod types;

pub use client::{HttpRelayClient, RelayControl};
pub use error::RelayError;
pub use link::LinkRenderer;
pub use types::*;

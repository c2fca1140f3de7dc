//! PresenceLight: keeps a serial status light in sync with your presence.

pub mod bridge;
pub mod color;
pub mod config;
pub mod engine;
pub mod error;
pub mod hotplug;
pub mod link;
pub mod notice;
pub mod palette;
pub mod presence;
pub mod reconnect;

pub use error::PresenceLightError;

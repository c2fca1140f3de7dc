//! Unified error type for the presencelight-lib crate.
//!
//! [`PresenceLightError`] wraps module-specific errors (`LinkError`,
//! `PresenceError`, `HotplugError`) and domain-specific error kinds
//! (`Config`, `Color`). `From` impls allow `?` to propagate across module
//! boundaries.

use std::fmt;

use crate::hotplug::HotplugError;
use crate::link::LinkError;
use crate::presence::PresenceError;

/// Unified error type for presencelight-lib operations.
#[derive(Debug)]
pub enum PresenceLightError {
    /// Serial link error (open, write).
    Link(LinkError),
    /// Presence source error (connect, read).
    Presence(PresenceError),
    /// Hotplug watcher error.
    Hotplug(HotplugError),
    /// Standard I/O error (config persistence).
    Io(std::io::Error),
    /// Configuration validation error.
    Config(String),
    /// Color parsing error.
    Color(String),
}

impl fmt::Display for PresenceLightError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PresenceLightError::Link(e) => write!(f, "{e}"),
            PresenceLightError::Presence(e) => write!(f, "{e}"),
            PresenceLightError::Hotplug(e) => write!(f, "{e}"),
            PresenceLightError::Io(e) => write!(f, "I/O error: {e}"),
            PresenceLightError::Config(e) => write!(f, "Config error: {e}"),
            PresenceLightError::Color(e) => write!(f, "Color error: {e}"),
        }
    }
}

impl std::error::Error for PresenceLightError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PresenceLightError::Link(e) => Some(e),
            PresenceLightError::Presence(e) => Some(e),
            PresenceLightError::Hotplug(e) => Some(e),
            PresenceLightError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<LinkError> for PresenceLightError {
    fn from(e: LinkError) -> Self {
        PresenceLightError::Link(e)
    }
}

impl From<PresenceError> for PresenceLightError {
    fn from(e: PresenceError) -> Self {
        PresenceLightError::Presence(e)
    }
}

impl From<HotplugError> for PresenceLightError {
    fn from(e: HotplugError) -> Self {
        PresenceLightError::Hotplug(e)
    }
}

impl From<std::io::Error> for PresenceLightError {
    fn from(e: std::io::Error) -> Self {
        PresenceLightError::Io(e)
    }
}

/// Crate-level Result alias using [`PresenceLightError`].
pub type Result<T> = std::result::Result<T, PresenceLightError>;

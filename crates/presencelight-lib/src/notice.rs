//! User-visible notices raised by the engine.
//!
//! The engine never fails outward; instead it reports noteworthy transitions
//! through a [`Notifier`]. Front-ends decide how to show them (log line,
//! desktop notification, tray balloon).

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// The configured port could not be opened at startup.
    PortOpenFailed { port: String, reason: String },
    /// No presence client is running; manual mode for this session.
    PresenceNotRunning,
    /// The presence client could not be attached for another reason.
    PresenceUnavailable(String),
    /// The user signed out of the presence client.
    SignedOut,
    /// A write failed; the device is considered gone until reopened.
    DeviceLost { port: String },
    DeviceReconnected { port: String },
    /// Device change notifications are unavailable; reconnects rely on retries.
    HotplugUnavailable(String),
}

/// How serious a notice is, mapped to log levels and notification urgency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
}

impl Notice {
    pub fn severity(&self) -> Severity {
        match self {
            Notice::SignedOut | Notice::DeviceReconnected { .. } => Severity::Info,
            _ => Severity::Warning,
        }
    }

    /// Short heading for notification popups.
    pub fn title(&self) -> &'static str {
        match self.severity() {
            Severity::Info => "PresenceLight",
            Severity::Warning => "PresenceLight: Error",
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::PortOpenFailed { port, reason } => {
                write!(f, "Could not open serial port {port} ({reason}).")
            }
            Notice::PresenceNotRunning => write!(
                f,
                "Presence client not started. Running in manual mode; \
                 use the manual commands to change your light."
            ),
            Notice::PresenceUnavailable(e) => write!(
                f,
                "Could not read your presence status ({e}). Running in manual mode; \
                 use the manual commands to change your light."
            ),
            Notice::SignedOut => write!(
                f,
                "You signed out of your presence client. Switching to manual mode."
            ),
            Notice::DeviceLost { port } => {
                write!(f, "Lost connection to the indicator on {port}. Will reconnect.")
            }
            Notice::DeviceReconnected { port } => {
                write!(f, "Indicator on {port} reconnected.")
            }
            Notice::HotplugUnavailable(e) => write!(
                f,
                "Device change detection unavailable ({e}); reconnects will be periodic only."
            ),
        }
    }
}

/// Receiver of engine notices. Called on the engine's worker thread.
pub trait Notifier: Send {
    fn notify(&self, notice: &Notice);
}

/// Writes notices to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notice: &Notice) {
        match notice.severity() {
            Severity::Info => log::info!("[notice] {notice}"),
            Severity::Warning => log::warn!("[notice] {notice}"),
        }
    }
}

/// Test notifier that keeps every notice.
#[doc(hidden)]
pub mod recording {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Default, Clone)]
    pub struct RecordingNotifier {
        notices: Arc<Mutex<Vec<Notice>>>,
    }

    impl RecordingNotifier {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn notices(&self) -> Vec<Notice> {
            self.notices
                .lock()
                .map(|n| n.clone())
                .unwrap_or_default()
        }
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, notice: &Notice) {
            if let Ok(mut n) = self.notices.lock() {
                n.push(notice.clone());
            }
        }
    }
}

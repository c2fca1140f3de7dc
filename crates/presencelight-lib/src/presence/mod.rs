//! Presence source interface: what the engine consumes from a collaboration client.
//!
//! A [`PresenceSource`] is asked once to [`connect`](PresenceSource::connect).
//! The resulting [`PresenceSession`] answers snapshot reads and pushes
//! [`PresenceEvent`]s to subscribers until the returned [`Subscription`] is
//! cancelled or dropped.

pub mod feed;

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

// ── Error type ──

#[derive(Debug)]
pub enum PresenceError {
    /// The presence client is not running. Expected; not a fault.
    NotRunning,
    /// Anything else (API failure, unexpected client state).
    Other(String),
}

impl fmt::Display for PresenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PresenceError::NotRunning => write!(f, "Presence source is not running"),
            PresenceError::Other(e) => write!(f, "Presence source error: {e}"),
        }
    }
}

impl std::error::Error for PresenceError {}

pub type Result<T> = std::result::Result<T, PresenceError>;

// ── Availability ──

/// Raw availability as reported by the presence client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    /// No availability published.
    None,
    Free,
    FreeIdle,
    Busy,
    BusyIdle,
    DoNotDisturb,
    /// "Be right back".
    TemporarilyAway,
    Away,
    Offline,
    Invalid,
}

impl Availability {
    pub const ALL: [Availability; 10] = [
        Availability::None,
        Availability::Free,
        Availability::FreeIdle,
        Availability::Busy,
        Availability::BusyIdle,
        Availability::DoNotDisturb,
        Availability::TemporarilyAway,
        Availability::Away,
        Availability::Offline,
        Availability::Invalid,
    ];
}

impl FromStr for Availability {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "none" => Ok(Availability::None),
            "free" | "available" => Ok(Availability::Free),
            "free-idle" => Ok(Availability::FreeIdle),
            "busy" => Ok(Availability::Busy),
            "busy-idle" => Ok(Availability::BusyIdle),
            "dnd" | "do-not-disturb" => Ok(Availability::DoNotDisturb),
            "brb" | "be-right-back" | "temporarily-away" => Ok(Availability::TemporarilyAway),
            "away" => Ok(Availability::Away),
            "offline" => Ok(Availability::Offline),
            "invalid" => Ok(Availability::Invalid),
            other => Err(format!("unknown availability: {other}")),
        }
    }
}

impl fmt::Display for Availability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Availability::None => "none",
            Availability::Free => "free",
            Availability::FreeIdle => "free-idle",
            Availability::Busy => "busy",
            Availability::BusyIdle => "busy-idle",
            Availability::DoNotDisturb => "do-not-disturb",
            Availability::TemporarilyAway => "be-right-back",
            Availability::Away => "away",
            Availability::Offline => "offline",
            Availability::Invalid => "invalid",
        };
        f.write_str(s)
    }
}

/// One synchronous read of the user's presence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PresenceSnapshot {
    pub availability: Availability,
    /// Calendar says out of office.
    pub out_of_office: bool,
}

impl PresenceSnapshot {
    pub fn new(availability: Availability, out_of_office: bool) -> Self {
        PresenceSnapshot {
            availability,
            out_of_office,
        }
    }
}

impl Default for PresenceSnapshot {
    fn default() -> Self {
        Self::new(Availability::None, false)
    }
}

// ── Derived presence state ──

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PresenceState {
    Free,
    Busy,
    DoNotDisturb,
    Away,
    TemporarilyAway,
    Offline,
    OutOfOffice,
    Unknown,
}

impl PresenceState {
    /// Combine availability and the calendar flag.
    ///
    /// Out-of-office wins over Away, TemporarilyAway, Offline and None, but
    /// never over Free, Busy or DoNotDisturb.
    pub fn derive(snapshot: PresenceSnapshot) -> Self {
        let ooo = snapshot.out_of_office;
        match snapshot.availability {
            Availability::Free | Availability::FreeIdle => PresenceState::Free,
            Availability::Busy | Availability::BusyIdle => PresenceState::Busy,
            Availability::DoNotDisturb => PresenceState::DoNotDisturb,
            Availability::None
            | Availability::TemporarilyAway
            | Availability::Away
            | Availability::Offline
                if ooo =>
            {
                PresenceState::OutOfOffice
            }
            Availability::TemporarilyAway => PresenceState::TemporarilyAway,
            Availability::Away => PresenceState::Away,
            Availability::Offline => PresenceState::Offline,
            Availability::None | Availability::Invalid => PresenceState::Unknown,
        }
    }
}

impl fmt::Display for PresenceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PresenceState::Free => "free",
            PresenceState::Busy => "busy",
            PresenceState::DoNotDisturb => "do-not-disturb",
            PresenceState::Away => "away",
            PresenceState::TemporarilyAway => "be-right-back",
            PresenceState::Offline => "offline",
            PresenceState::OutOfOffice => "out-of-office",
            PresenceState::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

// ── Session lifecycle ──

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Uninitialized,
    Initializing,
    SigningIn,
    SignedIn,
    SigningOut,
    SignedOut,
    ShuttingDown,
    Invalid,
}

impl FromStr for SessionState {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "uninitialized" => Ok(SessionState::Uninitialized),
            "initializing" => Ok(SessionState::Initializing),
            "signing-in" => Ok(SessionState::SigningIn),
            "signed-in" => Ok(SessionState::SignedIn),
            "signing-out" => Ok(SessionState::SigningOut),
            "signed-out" => Ok(SessionState::SignedOut),
            "shutting-down" => Ok(SessionState::ShuttingDown),
            "invalid" => Ok(SessionState::Invalid),
            other => Err(format!("unknown session state: {other}")),
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionState::Uninitialized => "uninitialized",
            SessionState::Initializing => "initializing",
            SessionState::SigningIn => "signing-in",
            SessionState::SignedIn => "signed-in",
            SessionState::SigningOut => "signing-out",
            SessionState::SignedOut => "signed-out",
            SessionState::ShuttingDown => "shutting-down",
            SessionState::Invalid => "invalid",
        };
        f.write_str(s)
    }
}

/// Events pushed by a presence session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresenceEvent {
    SessionStateChanged(SessionState),
    /// The user's availability (or calendar state) changed. Re-read it.
    AvailabilityChanged,
}

// ── Subscriptions ──

/// Callback receiving presence events. Called from the source's own thread.
pub type EventSink = Box<dyn Fn(PresenceEvent) + Send>;

/// Handle for one registered [`EventSink`]. Cancelling (or dropping) it
/// unregisters the sink; no events are delivered afterwards.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Subscription {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Unregister now. Idempotent.
    pub fn cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }

    pub fn is_active(&self) -> bool {
        self.cancel.is_some()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}

// ── Traits ──

/// An attached presence client.
pub trait PresenceSession: Send {
    fn state(&self) -> SessionState;
    fn read_availability(&self) -> Result<PresenceSnapshot>;
    fn subscribe(&mut self, sink: EventSink) -> Subscription;
}

/// Entry point to a presence client.
pub trait PresenceSource {
    /// Attach to a running client. [`PresenceError::NotRunning`] when there is none.
    fn connect(&mut self) -> Result<Box<dyn PresenceSession>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn state(a: Availability, ooo: bool) -> PresenceState {
        PresenceState::derive(PresenceSnapshot::new(a, ooo))
    }

    // ── derive ──

    #[test]
    fn ooo_never_overrides_free_busy_dnd() {
        assert_eq!(state(Availability::Free, true), PresenceState::Free);
        assert_eq!(state(Availability::FreeIdle, true), PresenceState::Free);
        assert_eq!(state(Availability::Busy, true), PresenceState::Busy);
        assert_eq!(state(Availability::BusyIdle, true), PresenceState::Busy);
        assert_eq!(
            state(Availability::DoNotDisturb, true),
            PresenceState::DoNotDisturb
        );
    }

    #[test]
    fn ooo_overrides_away_offline_and_none() {
        for a in [
            Availability::None,
            Availability::TemporarilyAway,
            Availability::Away,
            Availability::Offline,
        ] {
            assert_eq!(state(a, true), PresenceState::OutOfOffice, "{a}");
        }
    }

    #[test]
    fn invalid_is_unknown_even_when_ooo() {
        assert_eq!(state(Availability::Invalid, true), PresenceState::Unknown);
        assert_eq!(state(Availability::Invalid, false), PresenceState::Unknown);
        assert_eq!(state(Availability::None, false), PresenceState::Unknown);
    }

    #[test]
    fn away_variants_without_ooo() {
        assert_eq!(
            state(Availability::TemporarilyAway, false),
            PresenceState::TemporarilyAway
        );
        assert_eq!(state(Availability::Away, false), PresenceState::Away);
        assert_eq!(state(Availability::Offline, false), PresenceState::Offline);
    }

    // ── parsing ──

    #[test]
    fn availability_parses_aliases() {
        assert_eq!("dnd".parse::<Availability>(), Ok(Availability::DoNotDisturb));
        assert_eq!(
            "Be_Right_Back".parse::<Availability>(),
            Ok(Availability::TemporarilyAway)
        );
        assert_eq!("free-idle".parse::<Availability>(), Ok(Availability::FreeIdle));
        assert!("lunch".parse::<Availability>().is_err());
    }

    #[test]
    fn availability_display_parses_back() {
        for a in Availability::ALL {
            assert_eq!(a.to_string().parse::<Availability>(), Ok(a));
        }
    }

    #[test]
    fn session_state_parses() {
        assert_eq!("signed-in".parse::<SessionState>(), Ok(SessionState::SignedIn));
        assert_eq!(
            "SHUTTING_DOWN".parse::<SessionState>(),
            Ok(SessionState::ShuttingDown)
        );
        assert!("asleep".parse::<SessionState>().is_err());
    }

    #[test]
    fn presence_error_display() {
        assert_eq!(
            PresenceError::NotRunning.to_string(),
            "Presence source is not running"
        );
        assert_eq!(
            PresenceError::Other("COM failure".into()).to_string(),
            "Presence source error: COM failure"
        );
    }

    // ── Subscription ──

    #[test]
    fn subscription_cancels_once() {
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        let mut sub = Subscription::new(move || {
            c.fetch_add(1, Ordering::SeqCst);
        });
        assert!(sub.is_active());
        sub.cancel();
        sub.cancel();
        drop(sub);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn subscription_cancels_on_drop() {
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        drop(Subscription::new(move || {
            c.fetch_add(1, Ordering::SeqCst);
        }));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}

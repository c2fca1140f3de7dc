//! Scriptable in-process presence source.
//!
//! A [`FeedHandle`] plays the part of the collaboration client: whoever holds
//! it sets the session state and availability, and every subscribed session
//! sink is notified. The console front-end and the tests drive the engine
//! through it.

use std::sync::{Arc, Mutex, MutexGuard};

use super::{
    Availability, EventSink, PresenceError, PresenceEvent, PresenceSession, PresenceSnapshot,
    PresenceSource, Result, SessionState, Subscription,
};

type SharedSink = Arc<dyn Fn(PresenceEvent) + Send + Sync>;

struct FeedInner {
    running: bool,
    failure: Option<String>,
    state: SessionState,
    snapshot: PresenceSnapshot,
    sinks: Vec<(u64, SharedSink)>,
    next_id: u64,
}

fn lock(inner: &Mutex<FeedInner>) -> MutexGuard<'_, FeedInner> {
    inner.lock().unwrap_or_else(|e| e.into_inner())
}

/// Control side of the feed. Cheap to clone.
#[derive(Clone)]
pub struct FeedHandle {
    inner: Arc<Mutex<FeedInner>>,
}

impl Default for FeedHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl FeedHandle {
    /// A running client that has not signed in yet.
    pub fn new() -> Self {
        FeedHandle {
            inner: Arc::new(Mutex::new(FeedInner {
                running: true,
                failure: None,
                state: SessionState::Uninitialized,
                snapshot: PresenceSnapshot::default(),
                sinks: Vec::new(),
                next_id: 0,
            })),
        }
    }

    /// A client that is already signed in with the given presence.
    pub fn signed_in(availability: Availability, out_of_office: bool) -> Self {
        let handle = Self::new();
        {
            let mut inner = lock(&handle.inner);
            inner.state = SessionState::SignedIn;
            inner.snapshot = PresenceSnapshot::new(availability, out_of_office);
        }
        handle
    }

    /// The [`PresenceSource`] side, to hand to the engine.
    pub fn source(&self) -> FeedSource {
        FeedSource {
            inner: Arc::clone(&self.inner),
        }
    }

    /// Whether `connect` should find a running client.
    pub fn set_running(&self, running: bool) {
        lock(&self.inner).running = running;
    }

    /// Make `connect` and reads fail with [`PresenceError::Other`].
    pub fn fail_with(&self, reason: impl Into<String>) {
        lock(&self.inner).failure = Some(reason.into());
    }

    /// Change the session state and notify subscribers.
    pub fn set_session_state(&self, state: SessionState) {
        lock(&self.inner).state = state;
        self.emit(PresenceEvent::SessionStateChanged(state));
    }

    /// Change availability and notify subscribers.
    ///
    /// Subscribers are notified even if nothing changed; redundant events
    /// are part of what the engine must tolerate.
    pub fn set_availability(&self, availability: Availability, out_of_office: bool) {
        lock(&self.inner).snapshot = PresenceSnapshot::new(availability, out_of_office);
        self.emit(PresenceEvent::AvailabilityChanged);
    }

    pub fn subscriber_count(&self) -> usize {
        lock(&self.inner).sinks.len()
    }

    fn emit(&self, event: PresenceEvent) {
        // Call sinks outside the lock so a sink may read the feed.
        let sinks: Vec<SharedSink> = lock(&self.inner)
            .sinks
            .iter()
            .map(|(_, s)| Arc::clone(s))
            .collect();
        for sink in sinks {
            sink(event);
        }
    }
}

/// Source side of the feed.
pub struct FeedSource {
    inner: Arc<Mutex<FeedInner>>,
}

impl PresenceSource for FeedSource {
    fn connect(&mut self) -> Result<Box<dyn PresenceSession>> {
        let inner = lock(&self.inner);
        if let Some(ref reason) = inner.failure {
            return Err(PresenceError::Other(reason.clone()));
        }
        if !inner.running {
            return Err(PresenceError::NotRunning);
        }
        Ok(Box::new(FeedSession {
            inner: Arc::clone(&self.inner),
        }))
    }
}

struct FeedSession {
    inner: Arc<Mutex<FeedInner>>,
}

impl PresenceSession for FeedSession {
    fn state(&self) -> SessionState {
        lock(&self.inner).state
    }

    fn read_availability(&self) -> Result<PresenceSnapshot> {
        let inner = lock(&self.inner);
        if let Some(ref reason) = inner.failure {
            return Err(PresenceError::Other(reason.clone()));
        }
        if !inner.running {
            return Err(PresenceError::NotRunning);
        }
        Ok(inner.snapshot)
    }

    fn subscribe(&mut self, sink: EventSink) -> Subscription {
        // `EventSink` is only `Send`; the mutex makes the shared copy `Sync`.
        let sink = Mutex::new(sink);
        let shared: SharedSink = Arc::new(move |event| {
            if let Ok(f) = sink.lock() {
                (*f)(event);
            }
        });

        let id = {
            let mut inner = lock(&self.inner);
            let id = inner.next_id;
            inner.next_id += 1;
            inner.sinks.push((id, shared));
            id
        };

        let weak = Arc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                lock(&inner).sinks.retain(|(sid, _)| *sid != id);
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn connect_fails_when_not_running() {
        let feed = FeedHandle::new();
        feed.set_running(false);
        let err = feed.source().connect().err().unwrap();
        assert!(matches!(err, PresenceError::NotRunning));
    }

    #[test]
    fn connect_reports_other_failures() {
        let feed = FeedHandle::new();
        feed.fail_with("API version mismatch");
        let err = feed.source().connect().err().unwrap();
        assert!(matches!(err, PresenceError::Other(ref m) if m == "API version mismatch"));
    }

    #[test]
    fn signed_in_feed_reads_snapshot() {
        let feed = FeedHandle::signed_in(Availability::Busy, true);
        let session = feed.source().connect().unwrap();
        assert_eq!(session.state(), SessionState::SignedIn);
        assert_eq!(
            session.read_availability().unwrap(),
            PresenceSnapshot::new(Availability::Busy, true)
        );
    }

    #[test]
    fn subscribers_receive_events_in_order() {
        let feed = FeedHandle::new();
        let mut session = feed.source().connect().unwrap();
        let (tx, rx) = mpsc::channel();
        let _sub = session.subscribe(Box::new(move |e| {
            let _ = tx.send(e);
        }));

        feed.set_session_state(SessionState::SignedIn);
        feed.set_availability(Availability::Free, false);
        feed.set_availability(Availability::Free, false);

        let got: Vec<PresenceEvent> = rx.try_iter().collect();
        assert_eq!(
            got,
            vec![
                PresenceEvent::SessionStateChanged(SessionState::SignedIn),
                PresenceEvent::AvailabilityChanged,
                PresenceEvent::AvailabilityChanged,
            ]
        );
    }

    #[test]
    fn cancelled_subscription_stops_delivery() {
        let feed = FeedHandle::new();
        let mut session = feed.source().connect().unwrap();
        let (tx, rx) = mpsc::channel();
        let mut sub = session.subscribe(Box::new(move |e| {
            let _ = tx.send(e);
        }));
        assert_eq!(feed.subscriber_count(), 1);

        sub.cancel();
        assert_eq!(feed.subscriber_count(), 0);
        feed.set_availability(Availability::Away, false);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn read_after_client_exit_fails() {
        let feed = FeedHandle::signed_in(Availability::Free, false);
        let session = feed.source().connect().unwrap();
        feed.set_running(false);
        assert!(matches!(
            session.read_availability(),
            Err(PresenceError::NotRunning)
        ));
    }
}

//! Synchronization engine: presence events in, indicator commands out.
//!
//! The engine owns the link, the presence session and the hotplug watcher.
//! Every producer (presence sink, hotplug thread, manual commands, the exit
//! handler) enqueues an [`Event`]; a single worker drains the queue through
//! [`Engine::handle`], so link writes never overlap. Device and presence
//! failures are turned into mode changes and [`Notice`]s, never errors.

use std::fmt;
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

use serde::Serialize;

use crate::color::Color;
use crate::hotplug::{self, HotplugMonitor};
use crate::link::{IndicatorLink, LinkError, LinkState};
use crate::notice::{Notice, Notifier};
use crate::palette::{ManualCommand, Palette, resolve_color};
use crate::presence::{
    PresenceError, PresenceEvent, PresenceSession, PresenceSource, PresenceState, SessionState,
    Subscription,
};
use crate::reconnect::{self, ReconnectConfig, ReconnectState};

/// Whether the color follows presence or is pinned by a manual command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineMode {
    Integrated,
    Manual,
}

impl fmt::Display for EngineMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineMode::Integrated => write!(f, "integrated"),
            EngineMode::Manual => write!(f, "manual"),
        }
    }
}

/// Everything the worker reacts to, in arrival order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Presence(PresenceEvent),
    /// Some device was attached or detached.
    DeviceChanged,
    Manual(ManualCommand),
    Shutdown,
}

pub type EventSender = Sender<Event>;

/// Startup parameters, fixed for the engine's lifetime.
#[derive(Debug, Clone, Default)]
pub struct EngineOptions {
    /// Serial device to drive. `None` disables the indicator.
    pub port: Option<String>,
    pub palette: Palette,
    pub reconnect: ReconnectConfig,
}

/// Point-in-time view of the engine, for logs and front-ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EngineStatus {
    pub mode: EngineMode,
    pub presence: PresenceState,
    pub signed_in: bool,
    pub port: Option<String>,
    pub link: LinkState,
    /// Last color the engine tried to show.
    pub color: Option<Color>,
    /// Last color the device accepted.
    pub confirmed: Option<Color>,
    pub hotplug: bool,
}

pub struct Engine<L: IndicatorLink> {
    link: L,
    port: Option<String>,
    palette: Palette,
    mode: EngineMode,
    presence: PresenceState,
    color: Option<Color>,
    confirmed: Option<Color>,
    session: Option<Box<dyn PresenceSession>>,
    subscription: Option<Subscription>,
    signed_in: bool,
    hotplug: Option<HotplugMonitor>,
    reconnect: ReconnectState,
    notifier: Box<dyn Notifier>,
    shut_down: bool,
}

impl<L: IndicatorLink> Engine<L> {
    pub fn new(link: L, options: EngineOptions, notifier: Box<dyn Notifier>) -> Self {
        Engine {
            link,
            port: options.port,
            palette: options.palette,
            mode: EngineMode::Integrated,
            presence: PresenceState::Unknown,
            color: None,
            confirmed: None,
            session: None,
            subscription: None,
            signed_in: false,
            hotplug: None,
            reconnect: ReconnectState::new(options.reconnect),
            notifier,
            shut_down: false,
        }
    }

    /// Open the link, then attach to the presence source.
    ///
    /// Presence events are forwarded into `events`. If the source cannot be
    /// attached the engine falls back to manual mode for the session.
    pub fn startup(&mut self, source: &mut dyn PresenceSource, events: &EventSender) {
        match self.port.clone() {
            Some(port) => match self.link.open(&port) {
                Ok(()) => log::info!("[engine] indicator on {port}"),
                Err(e) => {
                    log::warn!("[device] {e}");
                    self.reconnect.record_failure();
                    self.notifier.notify(&Notice::PortOpenFailed {
                        port,
                        reason: e.to_string(),
                    });
                }
            },
            None => log::info!("[engine] no serial port configured, indicator disabled"),
        }

        match source.connect() {
            Ok(mut session) => {
                let tx = events.clone();
                let subscription = session.subscribe(Box::new(move |event| {
                    let _ = tx.send(Event::Presence(event));
                }));
                let state = session.state();
                log::info!("[presence] attached, session {state}");
                self.session = Some(session);
                self.subscription = Some(subscription);
                if state == SessionState::SignedIn {
                    self.signed_in = true;
                    self.resolve_and_apply();
                }
            }
            Err(PresenceError::NotRunning) => {
                log::info!("[presence] source not running, manual mode");
                self.mode = EngineMode::Manual;
                self.notifier.notify(&Notice::PresenceNotRunning);
            }
            Err(e) => {
                log::warn!("[presence] attach failed: {e:?}");
                self.mode = EngineMode::Manual;
                self.notifier
                    .notify(&Notice::PresenceUnavailable(e.to_string()));
            }
        }
    }

    /// Start watching serial devices, forwarding changes into `events`.
    pub fn start_hotplug(&mut self, interval: Duration, events: &EventSender) {
        let tx = events.clone();
        self.attach_hotplug(HotplugMonitor::start(interval, move || {
            let _ = tx.send(Event::DeviceChanged);
        }));
    }

    /// Adopt a hotplug watcher. A start failure degrades to retry-only reconnects.
    pub fn attach_hotplug(&mut self, monitor: hotplug::Result<HotplugMonitor>) {
        match monitor {
            Ok(monitor) => self.hotplug = Some(monitor),
            Err(e) => {
                log::warn!("[hotplug] {e}");
                self.notifier
                    .notify(&Notice::HotplugUnavailable(e.to_string()));
            }
        }
    }

    /// Apply one event. Returns `false` once the engine has shut down.
    pub fn handle(&mut self, event: Event) -> bool {
        if self.shut_down {
            return false;
        }
        match event {
            Event::Presence(PresenceEvent::SessionStateChanged(state)) => {
                self.on_session_state(state)
            }
            Event::Presence(PresenceEvent::AvailabilityChanged) => self.on_availability_changed(),
            Event::Manual(command) => self.manual(command),
            Event::DeviceChanged => self.on_device_changed(),
            Event::Shutdown => {
                self.shutdown();
                return false;
            }
        }
        true
    }

    /// Periodic work between events: reopen a lost link once the backoff allows.
    pub fn tick(&mut self) {
        if self.shut_down || self.link.is_open() {
            return;
        }
        if let Some(port) = self.port.clone() {
            self.reopen(&port);
        }
    }

    /// Drain `events` until [`Event::Shutdown`] or every sender is gone,
    /// calling [`tick`](Self::tick) whenever the queue is idle for `tick`.
    pub fn run(mut self, events: Receiver<Event>, tick: Duration) -> EngineStatus {
        loop {
            match events.recv_timeout(tick) {
                Ok(event) => {
                    if !self.handle(event) {
                        break;
                    }
                }
                Err(RecvTimeoutError::Timeout) => self.tick(),
                Err(RecvTimeoutError::Disconnected) => {
                    log::debug!("[engine] event queue closed");
                    break;
                }
            }
        }
        self.shutdown();
        self.status()
    }

    /// Unsubscribe, stop hotplug, turn the light off and close the link.
    /// Idempotent.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;

        if let Some(mut subscription) = self.subscription.take() {
            subscription.cancel();
        }
        self.session = None;
        if let Some(mut monitor) = self.hotplug.take() {
            monitor.stop();
        }

        // Off must reach the device before the handle goes away
        if self.link.is_open() {
            let off = self.palette.off;
            self.color = Some(off);
            match self.link.set_color(off) {
                Ok(()) => self.confirmed = Some(off),
                Err(e) => log::warn!("[device] could not turn indicator off: {e}"),
            }
        }
        self.link.close();
        log::info!("[engine] shut down");
    }

    // ── Event handlers ──

    fn on_session_state(&mut self, state: SessionState) {
        match state {
            SessionState::SignedIn => {
                log::info!("[presence] signed in");
                self.signed_in = true;
                self.mode = EngineMode::Integrated;
                self.resolve_and_apply();
            }
            SessionState::SignedOut => {
                log::info!("[presence] signed out, keeping {}", self.describe_color());
                self.signed_in = false;
                self.mode = EngineMode::Manual;
                self.notifier.notify(&Notice::SignedOut);
            }
            other => log::debug!("[presence] session {other}"),
        }
    }

    fn on_availability_changed(&mut self) {
        if !self.signed_in {
            log::debug!("[presence] availability change ignored, not signed in");
            return;
        }
        if self.mode == EngineMode::Manual {
            log::info!("[engine] leaving manual mode");
        }
        self.mode = EngineMode::Integrated;
        self.resolve_and_apply();
    }

    fn manual(&mut self, command: ManualCommand) {
        if self.mode != EngineMode::Manual {
            log::info!("[engine] manual mode");
        }
        self.mode = EngineMode::Manual;
        let color = self.palette.manual(command);
        log::debug!("[engine] manual {command} -> {color}");
        self.apply_color(color);
    }

    fn on_device_changed(&mut self) {
        let Some(port) = self.port.clone() else {
            return;
        };
        // A detach of our device only shows up as a failed write
        if self.link.is_open()
            && let Some(color) = self.color
        {
            self.apply_color(color);
        }
        if !self.link.is_open() {
            self.reconnect.reset();
            self.reopen(&port);
        }
    }

    // ── Color application ──

    /// Read the session, derive the presence state and show its color.
    fn resolve_and_apply(&mut self) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        match session.read_availability() {
            Ok(snapshot) => {
                self.presence = PresenceState::derive(snapshot);
                let color = resolve_color(snapshot.availability, snapshot.out_of_office, &self.palette);
                log::debug!(
                    "[engine] {} (ooo={}) -> {} {color}",
                    snapshot.availability,
                    snapshot.out_of_office,
                    self.presence
                );
                self.apply_color(color);
            }
            Err(e) => log::warn!("[presence] availability read failed: {e}"),
        }
    }

    /// Record `color` as current and send it. Returns whether the device took it.
    fn apply_color(&mut self, color: Color) -> bool {
        self.color = Some(color);
        let was_open = self.link.is_open();
        match self.link.set_color(color) {
            Ok(()) => {
                self.confirmed = Some(color);
                true
            }
            Err(LinkError::NotOpen | LinkError::NotConfigured) => {
                log::debug!("[device] {color} not sent, link {}", self.link.state());
                false
            }
            Err(e) => {
                log::warn!("[device] {e}");
                if was_open && let Some(port) = self.port.clone() {
                    self.notifier.notify(&Notice::DeviceLost { port });
                }
                false
            }
        }
    }

    fn reopen(&mut self, port: &str) {
        if reconnect::try_reopen(&mut self.reconnect, &mut self.link, port) {
            log::info!("[device] reconnected to {port}");
            if let Some(color) = self.color {
                self.apply_color(color);
            }
            self.notifier.notify(&Notice::DeviceReconnected {
                port: port.to_string(),
            });
        }
    }

    fn describe_color(&self) -> String {
        self.color
            .map(|c| c.to_string())
            .unwrap_or_else(|| "no color".into())
    }

    // ── Accessors ──

    pub fn mode(&self) -> EngineMode {
        self.mode
    }

    pub fn presence(&self) -> PresenceState {
        self.presence
    }

    pub fn color(&self) -> Option<Color> {
        self.color
    }

    pub fn confirmed_color(&self) -> Option<Color> {
        self.confirmed
    }

    pub fn is_signed_in(&self) -> bool {
        self.signed_in
    }

    pub fn link(&self) -> &L {
        &self.link
    }

    pub fn link_mut(&mut self) -> &mut L {
        &mut self.link
    }

    pub fn status(&self) -> EngineStatus {
        EngineStatus {
            mode: self.mode,
            presence: self.presence,
            signed_in: self.signed_in,
            port: self.port.clone(),
            link: self.link.state(),
            color: self.color,
            confirmed: self.confirmed,
            hotplug: self.hotplug.is_some(),
        }
    }
}

impl<L: IndicatorLink> Drop for Engine<L> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

//! Worker thread hosting an [`Engine`].
//!
//! Front-ends hold a [`Bridge`]; they only ever enqueue events. The worker
//! performs startup, optionally watches for device changes, and runs the
//! event loop until shutdown.

use std::sync::mpsc;
use std::thread::JoinHandle;
use std::time::Duration;

use crate::engine::{Engine, EngineStatus, Event, EventSender};
use crate::link::IndicatorLink;
use crate::presence::PresenceSource;

#[derive(Debug, Clone)]
pub struct BridgeOptions {
    /// Idle interval between periodic reconnect checks.
    pub tick: Duration,
    /// Device-list polling interval. `None` disables hotplug detection.
    pub hotplug_poll: Option<Duration>,
}

impl Default for BridgeOptions {
    fn default() -> Self {
        BridgeOptions {
            tick: Duration::from_millis(500),
            hotplug_poll: Some(Duration::from_secs(1)),
        }
    }
}

pub struct Bridge {
    events: EventSender,
    worker: Option<JoinHandle<EngineStatus>>,
}

impl Bridge {
    /// Move `engine` onto a new worker thread and start it.
    pub fn start<L>(
        mut engine: Engine<L>,
        mut source: Box<dyn PresenceSource + Send>,
        options: BridgeOptions,
    ) -> std::io::Result<Self>
    where
        L: IndicatorLink + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        let events = tx.clone();
        let worker = std::thread::Builder::new()
            .name("engine".into())
            .spawn(move || {
                engine.startup(source.as_mut(), &tx);
                if let Some(interval) = options.hotplug_poll {
                    engine.start_hotplug(interval, &tx);
                }
                drop(tx);
                engine.run(rx, options.tick)
            })?;
        Ok(Bridge {
            events,
            worker: Some(worker),
        })
    }

    /// A producer handle for other threads (console, signal handler, UI).
    pub fn sender(&self) -> EventSender {
        self.events.clone()
    }

    pub fn send(&self, event: Event) {
        if self.events.send(event).is_err() {
            log::debug!("[engine] worker gone, dropped {event:?}");
        }
    }

    /// Request shutdown and wait for the worker's final status.
    pub fn shutdown(mut self) -> Option<EngineStatus> {
        self.send(Event::Shutdown);
        self.join()
    }

    /// Wait for the worker to stop on its own (after a queued `Shutdown`).
    pub fn wait(mut self) -> Option<EngineStatus> {
        self.join()
    }

    fn join(&mut self) -> Option<EngineStatus> {
        let worker = self.worker.take()?;
        match worker.join() {
            Ok(status) => Some(status),
            Err(_) => {
                log::error!("[engine] worker panicked");
                None
            }
        }
    }
}

impl Drop for Bridge {
    fn drop(&mut self) {
        if self.worker.is_some() {
            self.send(Event::Shutdown);
            self.join();
        }
    }
}

//! Hotplug monitor: coarse "a device may have changed" notifications.
//!
//! The monitor polls the OS serial-port list on a background thread and
//! fires its callback whenever the set of ports differs from the previous
//! poll. It does not say which device changed; the engine re-validates its
//! own link instead.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;

#[derive(Debug)]
pub enum HotplugError {
    StartFailed(String),
}

impl fmt::Display for HotplugError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HotplugError::StartFailed(e) => write!(f, "Hotplug watcher failed to start: {e}"),
        }
    }
}

impl std::error::Error for HotplugError {}

pub type Result<T> = std::result::Result<T, HotplugError>;

/// Current serial port names, as seen by `serialport`.
pub fn serial_port_names() -> std::result::Result<Vec<String>, String> {
    serialport::available_ports()
        .map(|ports| ports.into_iter().map(|p| p.port_name).collect())
        .map_err(|e| e.to_string())
}

/// Background device-list watcher. Stops on [`stop`](Self::stop) or drop.
pub struct HotplugMonitor {
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl HotplugMonitor {
    /// Watch the system serial ports every `interval`.
    pub fn start(interval: Duration, on_change: impl Fn() + Send + 'static) -> Result<Self> {
        Self::with_enumerator(interval, serial_port_names, on_change)
    }

    /// Watch an arbitrary device list.
    ///
    /// The first enumeration happens synchronously; if it fails the watcher
    /// is not started. Later enumeration errors are logged and skipped.
    pub fn with_enumerator<E, F>(interval: Duration, mut enumerate: E, on_change: F) -> Result<Self>
    where
        E: FnMut() -> std::result::Result<Vec<String>, String> + Send + 'static,
        F: Fn() + Send + 'static,
    {
        let mut known: BTreeSet<String> = enumerate()
            .map_err(HotplugError::StartFailed)?
            .into_iter()
            .collect();

        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);
        let handle = std::thread::Builder::new()
            .name("hotplug".into())
            .spawn(move || {
                while flag.load(Ordering::SeqCst) {
                    std::thread::park_timeout(interval);
                    if !flag.load(Ordering::SeqCst) {
                        break;
                    }
                    match enumerate() {
                        Ok(ports) => {
                            let current: BTreeSet<String> = ports.into_iter().collect();
                            if current != known {
                                log::debug!(
                                    "[hotplug] device list changed: {:?} -> {:?}",
                                    known,
                                    current
                                );
                                known = current;
                                on_change();
                            }
                        }
                        Err(e) => log::debug!("[hotplug] enumeration failed: {e}"),
                    }
                }
            })
            .map_err(|e| HotplugError::StartFailed(format!("spawn: {e}")))?;

        log::info!("[hotplug] watching serial devices every {interval:?}");
        Ok(HotplugMonitor {
            running,
            handle: Some(handle),
        })
    }

    /// Stop the watcher and wait for its thread. Idempotent.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            handle.thread().unpark();
            let _ = handle.join();
            log::debug!("[hotplug] stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }
}

impl Drop for HotplugMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}

//! Serial link to the indicator device: trait and `serialport` backend.

use std::fmt;
use std::io::Write;
use std::time::Duration;

use serde::Serialize;

use crate::color::Color;

/// Fixed line speed expected by the firmware.
pub const BAUD_RATE: u32 = 9600;

/// Read and write timeout for every port operation.
pub const IO_TIMEOUT: Duration = Duration::from_millis(1000);

/// Terminator appended to every command.
pub const LINE_TERMINATOR: &str = "\n";

// ── Error type ──

/// Serial link errors.
///
/// Every cause of a failed open (port missing, busy, permission denied)
/// collapses into `OpenFailed`; the payload is for logging only.
#[derive(Debug)]
pub enum LinkError {
    /// No serial port is configured.
    NotConfigured,
    OpenFailed(String),
    /// A command was sent while the link was Closed or Failed.
    NotOpen,
    WriteFailed(String),
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkError::NotConfigured => write!(f, "No serial port configured"),
            LinkError::OpenFailed(e) => write!(f, "Failed to open serial port: {e}"),
            LinkError::NotOpen => write!(f, "Serial link is not open"),
            LinkError::WriteFailed(e) => write!(f, "Write failed: {e}"),
        }
    }
}

impl std::error::Error for LinkError {}

pub type Result<T> = std::result::Result<T, LinkError>;

// ── Link state ──

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkState {
    Closed,
    Open,
    /// The port was expected to work but an open or write failed.
    Failed,
}

impl fmt::Display for LinkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkState::Closed => write!(f, "closed"),
            LinkState::Open => write!(f, "open"),
            LinkState::Failed => write!(f, "failed"),
        }
    }
}

// ── Trait ──

/// A line-oriented connection to one indicator device.
///
/// Implementations never panic on I/O problems: every failure is reported
/// through [`LinkError`] and reflected in [`state`](IndicatorLink::state).
pub trait IndicatorLink {
    /// Open (or reopen) the named port. Any existing handle is released first.
    fn open(&mut self, port: &str) -> Result<()>;

    /// Write `command` followed by [`LINE_TERMINATOR`]. No retry.
    fn send(&mut self, command: &str) -> Result<()>;

    /// Release the port handle. Idempotent.
    fn close(&mut self);

    fn state(&self) -> LinkState;

    /// The port most recently passed to [`open`](IndicatorLink::open).
    fn port_name(&self) -> Option<&str>;

    /// Encode `color` for the firmware and send it.
    fn set_color(&mut self, color: Color) -> Result<()> {
        self.send(&color.wire_command())
    }

    fn is_open(&self) -> bool {
        self.state() == LinkState::Open
    }
}

// ── serialport backend ──

/// Indicator link backed by a real serial port.
pub struct SerialLink {
    port: Option<Box<dyn serialport::SerialPort>>,
    port_name: Option<String>,
    state: LinkState,
}

impl Default for SerialLink {
    fn default() -> Self {
        Self::new()
    }
}

impl SerialLink {
    pub fn new() -> Self {
        SerialLink {
            port: None,
            port_name: None,
            state: LinkState::Closed,
        }
    }
}

impl IndicatorLink for SerialLink {
    fn open(&mut self, port: &str) -> Result<()> {
        // Drop any stale handle before reopening the same device node.
        self.port = None;
        self.port_name = Some(port.to_string());

        let opened = serialport::new(port, BAUD_RATE)
            .data_bits(serialport::DataBits::Eight)
            .parity(serialport::Parity::None)
            .stop_bits(serialport::StopBits::One)
            .flow_control(serialport::FlowControl::None)
            .timeout(IO_TIMEOUT)
            .open();

        match opened {
            Ok(handle) => {
                log::info!("[device] opened {port} at {BAUD_RATE} baud");
                self.port = Some(handle);
                self.state = LinkState::Open;
                Ok(())
            }
            Err(e) => {
                self.state = LinkState::Failed;
                Err(LinkError::OpenFailed(format!("{port}: {e}")))
            }
        }
    }

    fn send(&mut self, command: &str) -> Result<()> {
        let Some(port) = self.port.as_mut() else {
            return Err(LinkError::NotOpen);
        };
        if self.state != LinkState::Open {
            return Err(LinkError::NotOpen);
        }

        let line = format!("{command}{LINE_TERMINATOR}");
        let written = port.write_all(line.as_bytes()).and_then(|()| port.flush());
        match written {
            Ok(()) => {
                log::debug!("[device] sent {command}");
                Ok(())
            }
            Err(e) => {
                // The handle is useless after a write fault; reopen is the only recovery.
                self.port = None;
                self.state = LinkState::Failed;
                let name = self.port_name.as_deref().unwrap_or("?");
                Err(LinkError::WriteFailed(format!("{name}: {e}")))
            }
        }
    }

    fn close(&mut self) {
        if self.port.take().is_some() {
            log::info!(
                "[device] closed {}",
                self.port_name.as_deref().unwrap_or("?")
            );
        }
        self.state = LinkState::Closed;
    }

    fn state(&self) -> LinkState {
        self.state
    }

    fn port_name(&self) -> Option<&str> {
        self.port_name.as_deref()
    }
}

impl Drop for SerialLink {
    fn drop(&mut self) {
        self.close();
    }
}

// ── Port enumeration ──

/// A serial port visible to the OS (not yet opened).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PortInfo {
    /// Device path or name, e.g. `COM3` or `/dev/ttyACM0`.
    pub name: String,
    /// Transport kind: `usb`, `pci`, `bluetooth` or `unknown`.
    pub kind: String,
    /// USB product string, if available.
    pub product: Option<String>,
}

/// Enumerate serial ports.
pub fn list_ports() -> Result<Vec<PortInfo>> {
    let ports = serialport::available_ports()
        .map_err(|e| LinkError::OpenFailed(format!("port enumeration: {e}")))?;
    Ok(ports
        .into_iter()
        .map(|p| {
            let (kind, product) = match p.port_type {
                serialport::SerialPortType::UsbPort(usb) => ("usb", usb.product),
                serialport::SerialPortType::PciPort => ("pci", None),
                serialport::SerialPortType::BluetoothPort => ("bluetooth", None),
                serialport::SerialPortType::Unknown => ("unknown", None),
            };
            PortInfo {
                name: p.port_name,
                kind: kind.to_string(),
                product,
            }
        })
        .collect())
}

// ── Mock link for testing ──

/// In-memory link for unit and integration tests.
///
/// Always compiled, hidden from public docs.
#[doc(hidden)]
pub mod mock {
    use super::*;

    /// One recorded call, in order of arrival.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum LinkCall {
        Open(String),
        Send(String),
        Close,
    }

    /// Records every call; `fail_open` / `fail_send` inject failures.
    #[derive(Debug)]
    pub struct MockLink {
        pub calls: Vec<LinkCall>,
        /// Commands that reached the "wire" successfully.
        pub written: Vec<String>,
        /// If true, `open` fails and leaves the link Failed.
        pub fail_open: bool,
        /// If true, `send` on an open link fails and leaves it Failed.
        pub fail_send: bool,
        state: LinkState,
        port_name: Option<String>,
    }

    impl Default for MockLink {
        fn default() -> Self {
            Self::new()
        }
    }

    impl MockLink {
        pub fn new() -> Self {
            MockLink {
                calls: Vec::new(),
                written: Vec::new(),
                fail_open: false,
                fail_send: false,
                state: LinkState::Closed,
                port_name: None,
            }
        }

        /// Number of `open` attempts recorded so far.
        pub fn open_attempts(&self) -> usize {
            self.calls
                .iter()
                .filter(|c| matches!(c, LinkCall::Open(_)))
                .count()
        }

        /// Last command written successfully.
        pub fn last_written(&self) -> Option<&str> {
            self.written.last().map(String::as_str)
        }

        /// Simulate the device disappearing underneath an open handle.
        pub fn unplug(&mut self) {
            self.fail_send = true;
            self.fail_open = true;
        }

        /// Simulate the device coming back.
        pub fn plug_in(&mut self) {
            self.fail_send = false;
            self.fail_open = false;
        }
    }

    impl IndicatorLink for MockLink {
        fn open(&mut self, port: &str) -> Result<()> {
            self.calls.push(LinkCall::Open(port.to_string()));
            self.port_name = Some(port.to_string());
            if self.fail_open {
                self.state = LinkState::Failed;
                return Err(LinkError::OpenFailed(format!(
                    "{port}: mock open failure injected"
                )));
            }
            self.state = LinkState::Open;
            Ok(())
        }

        fn send(&mut self, command: &str) -> Result<()> {
            self.calls.push(LinkCall::Send(command.to_string()));
            if self.state != LinkState::Open {
                return Err(LinkError::NotOpen);
            }
            if self.fail_send {
                self.state = LinkState::Failed;
                return Err(LinkError::WriteFailed(
                    "mock: write failure injected".into(),
                ));
            }
            self.written.push(command.to_string());
            Ok(())
        }

        fn close(&mut self) {
            self.calls.push(LinkCall::Close);
            self.state = LinkState::Closed;
        }

        fn state(&self) -> LinkState {
            self.state
        }

        fn port_name(&self) -> Option<&str> {
            self.port_name.as_deref()
        }
    }
}

//! Application configuration: TOML-based, platform-aware paths.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::palette::PALETTE_KEYS;
use crate::reconnect::ReconnectConfig;

/// Header comment prepended to saved config files.
const CONFIG_HEADER: &str =
    "# PresenceLight configuration. Changes made while the app runs may be overwritten.\n\n";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Serial port number of the indicator. 0 = disabled.
    #[serde(default)]
    pub serial_port: u32,

    /// Explicit device path. Overrides the name derived from `serial_port`.
    #[serde(default)]
    pub port_path: String,

    /// Show desktop notifications for notices.
    #[serde(default = "default_true")]
    pub notifications_enabled: bool,

    /// Initial delay between periodic reconnect attempts, in seconds.
    #[serde(default = "default_retry_interval")]
    pub retry_interval_secs: u64,

    /// Device-list polling interval for hotplug detection, in milliseconds.
    #[serde(default = "default_hotplug_poll")]
    pub hotplug_poll_ms: u64,

    /// Per-state color overrides. Keys: free, busy, dnd, away, out_of_office, off.
    /// Example in TOML: `[colors]` / `busy = "#FF0000"`
    #[serde(default)]
    pub colors: HashMap<String, String>,
}

fn default_true() -> bool {
    true
}
fn default_retry_interval() -> u64 {
    5
}
fn default_hotplug_poll() -> u64 {
    1000
}

impl Default for Config {
    fn default() -> Self {
        Config {
            serial_port: 0,
            port_path: String::new(),
            notifications_enabled: true,
            retry_interval_secs: default_retry_interval(),
            hotplug_poll_ms: default_hotplug_poll(),
            colors: HashMap::new(),
        }
    }
}

/// OS device name for a 1-based serial port number.
///
/// `COM<n>` on Windows, `/dev/ttyACM<n-1>` elsewhere. `None` for 0.
pub fn port_name_for(number: u32) -> Option<String> {
    if number == 0 {
        return None;
    }
    #[cfg(windows)]
    {
        Some(format!("COM{number}"))
    }
    #[cfg(not(windows))]
    {
        Some(format!("/dev/ttyACM{}", number - 1))
    }
}

/// Validation errors that [`Config::validate`] can return.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// A `[colors]` value could not be parsed.
    InvalidColor { key: String, reason: String },
    /// A `[colors]` key is not one of the palette slots.
    UnknownColorKey(String),
    /// An interval field is zero (`field` is the TOML key).
    ZeroInterval { field: &'static str },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::InvalidColor { key, reason } => {
                write!(f, "Invalid colors.{key}: {reason}")
            }
            ValidationError::UnknownColorKey(key) => write!(
                f,
                "Unknown color key \"{key}\" (expected one of {})",
                PALETTE_KEYS.join(", ")
            ),
            ValidationError::ZeroInterval { field } => {
                write!(f, "{field} must be greater than zero")
            }
        }
    }
}

impl Config {
    /// Platform-specific config directory.
    pub fn dir() -> Option<PathBuf> {
        #[cfg(windows)]
        {
            dirs::config_dir().map(|p| p.join("PresenceLight"))
        }
        #[cfg(not(windows))]
        {
            dirs::config_dir().map(|p| p.join("presencelight"))
        }
    }

    /// Full path to config file.
    pub fn path() -> Option<PathBuf> {
        Self::dir().map(|d| d.join("config.toml"))
    }

    /// Full path to the log file used by `run --log-file`.
    pub fn log_path() -> Option<PathBuf> {
        Self::dir().map(|d| d.join("presencelight.log"))
    }

    /// Load config from disk, or return defaults if not found.
    pub fn load() -> Self {
        let (config, warnings) = Self::load_with_warnings();
        for w in &warnings {
            log::warn!("[config] {w}");
        }
        config
    }

    /// Save config to an arbitrary path atomically (write to temp file, then rename).
    ///
    /// A header comment is prepended to warn that manual edits may be overwritten.
    pub fn save_to(&self, path: &Path) -> std::io::Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let serialized = toml::to_string_pretty(self).map_err(std::io::Error::other)?;
        let contents = format!("{CONFIG_HEADER}{serialized}");
        let tmp = path.with_extension("toml.tmp");
        std::fs::write(&tmp, &contents)?;
        match std::fs::rename(&tmp, path) {
            Ok(()) => Ok(()),
            Err(_) => {
                // Rename can fail across filesystems
                let result = std::fs::write(path, &contents);
                let _ = std::fs::remove_file(&tmp);
                result
            }
        }
    }

    /// Save config to the default platform path.
    pub fn save(&self) -> std::io::Result<()> {
        let Some(path) = Self::path() else {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "No config directory",
            ));
        };
        self.save_to(&path)
    }

    /// Load config from an arbitrary path, returning the config and any parse warnings.
    ///
    /// Returns `(defaults, [])` if the file doesn't exist.
    /// Returns `(defaults, [warning])` if the file exists but can't be parsed.
    pub fn load_from(path: &Path) -> (Self, Vec<String>) {
        match std::fs::read_to_string(path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => (config, vec![]),
                Err(e) => {
                    let warning = format!(
                        "config parse error ({}), using defaults: {e}",
                        path.display()
                    );
                    (Self::default(), vec![warning])
                }
            },
            Err(_) => (Self::default(), vec![]),
        }
    }

    /// Load config from the default path, returning the config and any parse warnings.
    pub fn load_with_warnings() -> (Self, Vec<String>) {
        let Some(path) = Self::path() else {
            return (Self::default(), vec![]);
        };
        Self::load_from(&path)
    }

    /// Serial device to open, or `None` when the indicator is disabled.
    pub fn port_name(&self) -> Option<String> {
        let explicit = self.port_path.trim();
        if !explicit.is_empty() {
            return Some(explicit.to_string());
        }
        port_name_for(self.serial_port)
    }

    pub fn reconnect_config(&self) -> ReconnectConfig {
        ReconnectConfig::starting_at(Duration::from_secs(self.retry_interval_secs.max(1)))
    }

    pub fn hotplug_interval(&self) -> Duration {
        Duration::from_millis(self.hotplug_poll_ms.max(1))
    }

    /// Validate the entire config, collecting all errors.
    pub fn validate(&self) -> std::result::Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        let mut keys: Vec<&String> = self.colors.keys().collect();
        keys.sort();
        for key in keys {
            if !PALETTE_KEYS.contains(&key.as_str()) {
                errors.push(ValidationError::UnknownColorKey(key.clone()));
                continue;
            }
            if let Err(e) = crate::color::parse_color(&self.colors[key]) {
                errors.push(ValidationError::InvalidColor {
                    key: key.clone(),
                    reason: e.to_string(),
                });
            }
        }

        if self.retry_interval_secs == 0 {
            errors.push(ValidationError::ZeroInterval {
                field: "retry_interval_secs",
            });
        }
        if self.hotplug_poll_ms == 0 {
            errors.push(ValidationError::ZeroInterval {
                field: "hotplug_poll_ms",
            });
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

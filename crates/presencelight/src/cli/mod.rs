//! CLI subcommands: run the engine, one-shot colors, port listing, config.

mod config_cmd;
mod ports;
mod run;
mod set;

use std::path::Path;

use clap::Subcommand;
use serde::Serialize;

pub(super) use presencelight_lib::color::{self, Color};
pub(super) use presencelight_lib::config::Config;
pub(super) use presencelight_lib::error::Result;
pub(super) use presencelight_lib::link::{self, IndicatorLink, PortInfo, SerialLink};
pub(super) use presencelight_lib::palette::{ManualCommand, Palette};

const PADDING: usize = 2;

/// Compute alignment width for a command's key-value output.
/// Ensures at least PADDING spaces after the longest key in either level,
/// with top-level and indent values aligned to the same column.
pub(super) fn kv_width(top: &[&str], indent: &[&str]) -> usize {
    let top_max = top.iter().map(|k| k.len()).max().unwrap_or(0);
    let indent_max = indent.iter().map(|k| k.len()).max().unwrap_or(0);
    let top_need = if top.is_empty() { 0 } else { top_max + PADDING };
    // Indent keys lose 2 chars of inner width to the "  " prefix
    let indent_need = if indent.is_empty() {
        0
    } else {
        indent_max + PADDING + 2
    };
    top_need.max(indent_need)
}

pub(super) fn format_kv(key: &str, value: impl std::fmt::Display, w: usize) -> String {
    format!("{key:<width$}{value}", width = w)
}

pub(super) fn kv(key: &str, value: impl std::fmt::Display, w: usize) {
    println!("{}", format_kv(key, value, w));
}

pub(super) fn kv_indent(key: &str, value: impl std::fmt::Display, w: usize) {
    println!("  {key:<width$}{value}", width = w - 2);
}

/// Print `value` as pretty JSON on stdout.
pub(super) fn print_json(value: &impl Serialize) -> Result<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| presencelight_lib::PresenceLightError::Config(format!("JSON output: {e}")))?;
    println!("{text}");
    Ok(())
}

/// Load config from `custom_path` (or the platform default), logging warnings.
pub(super) fn load_config(custom_path: Option<&Path>) -> Config {
    let (config, warnings) = match custom_path {
        Some(path) => Config::load_from(path),
        None => Config::load_with_warnings(),
    };
    for w in &warnings {
        log::warn!("[config] {w}");
    }
    config
}

/// Palette for `config`, with override warnings logged.
pub(super) fn palette_from(config: &Config) -> Palette {
    let (palette, warnings) = Palette::from_config(config);
    for w in &warnings {
        log::warn!("[config] {w}");
    }
    palette
}

// ── JSON output structs ──

#[derive(Serialize)]
pub(super) struct ConfigOutput {
    pub config_file: Option<String>,
    pub config_file_exists: bool,
    pub port: Option<String>,
    pub settings: Config,
    pub palette: PaletteJson,
    pub problems: Vec<String>,
    pub log_file: Option<String>,
}

#[derive(Serialize)]
pub(super) struct PaletteJson {
    pub free: String,
    pub busy: String,
    pub dnd: String,
    pub away: String,
    pub out_of_office: String,
    pub off: String,
}

impl From<&Palette> for PaletteJson {
    fn from(p: &Palette) -> Self {
        PaletteJson {
            free: color::format_color(p.free),
            busy: color::format_color(p.busy),
            dnd: color::format_color(p.dnd),
            away: color::format_color(p.away),
            out_of_office: color::format_color(p.out_of_office),
            off: color::format_color(p.off),
        }
    }
}

#[derive(Serialize)]
pub(super) struct PortsOutput {
    pub count: usize,
    pub configured: Option<String>,
    pub ports: Vec<PortInfo>,
}

#[derive(Serialize)]
pub(super) struct SetOutput {
    pub port: String,
    pub color: String,
    pub command: String,
}

#[derive(Subcommand)]
pub enum Command {
    /// Keep the indicator in sync with presence until Ctrl+C (or `quit`)
    Run {
        /// Start without a presence source (manual mode only)
        #[arg(long)]
        no_presence: bool,
        /// Don't read commands from stdin
        #[arg(long)]
        no_console: bool,
        /// Write the log to the log file next to the config instead of stderr
        #[arg(long)]
        log_file: bool,
    },

    /// Send one color to the indicator and exit
    Set {
        /// free, busy, dnd, away, ooo, off, a color name or #RRGGBB
        color: String,
    },

    /// List serial ports
    Ports,

    /// Show current configuration and file paths
    Config {
        /// Persist the serial port number (0 = disabled)
        #[arg(long, value_name = "N")]
        set_port: Option<u32>,
    },
}

impl Command {
    /// Whether this command wants its log in the log file.
    pub fn logs_to_file(&self) -> bool {
        matches!(self, Command::Run { log_file: true, .. })
    }
}

pub fn run(cmd: Command, json: bool, config_path: Option<&Path>) -> Result<()> {
    match cmd {
        Command::Run {
            no_presence,
            no_console,
            log_file: _,
        } => run::cmd_run(
            run::RunOptions {
                no_presence,
                no_console,
            },
            json,
            config_path,
        ),
        Command::Set { color } => set::cmd_set(&color, json, config_path),
        Command::Ports => ports::cmd_ports(json, config_path),
        Command::Config { set_port } => config_cmd::cmd_config(json, set_port, config_path),
    }
}


#[cfg(test)]
mod json_output_tests {
    use super::*;

    #[test]
    fn palette_json_uses_hex() {
        let json = serde_json::to_value(PaletteJson::from(&Palette::default())).unwrap();
        assert_eq!(json["free"], "#006400");
        assert_eq!(json["out_of_office"], "#FF00FF");
        assert_eq!(json["off"], "#000000");
    }

    #[test]
    fn config_output_missing_paths_are_null() {
        let config = Config::default();
        let output = ConfigOutput {
            config_file: None,
            config_file_exists: false,
            port: config.port_name(),
            palette: PaletteJson::from(&Palette::default()),
            settings: config,
            problems: vec![],
            log_file: None,
        };
        let parsed = serde_json::to_value(&output).unwrap();
        assert!(parsed["config_file"].is_null());
        assert!(parsed["port"].is_null());
        assert_eq!(parsed["settings"]["serial_port"], 0);
        assert_eq!(parsed["settings"]["notifications_enabled"], true);
    }

    #[test]
    fn ports_output_shape() {
        let output = PortsOutput {
            count: 1,
            configured: Some("/dev/ttyACM0".into()),
            ports: vec![PortInfo {
                name: "/dev/ttyACM0".into(),
                kind: "usb".into(),
                product: Some("Arduino Uno".into()),
            }],
        };
        let parsed = serde_json::to_value(&output).unwrap();
        assert_eq!(parsed["count"], 1);
        assert_eq!(parsed["ports"][0]["product"], "Arduino Uno");
    }
}

#[cfg(test)]
mod command_tests {
    use super::*;

    #[test]
    fn only_run_with_log_file_logs_to_file() {
        assert!(
            Command::Run {
                no_presence: false,
                no_console: false,
                log_file: true
            }
            .logs_to_file()
        );
        assert!(!Command::Ports.logs_to_file());
    }

    #[test]
    fn load_config_from_custom_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "serial_port = 5\n").unwrap();
        assert_eq!(load_config(Some(&path)).serial_port, 5);
    }

    #[test]
    fn cmd_config_with_custom_path_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        assert!(config_cmd::cmd_config(false, None, Some(&path)).is_ok());
        assert!(config_cmd::cmd_config(true, None, Some(&path)).is_ok());
    }

    #[test]
    fn cmd_config_set_port_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        config_cmd::cmd_config(false, Some(4), Some(&path)).unwrap();
        let (config, warnings) = Config::load_from(&path);
        assert!(warnings.is_empty());
        assert_eq!(config.serial_port, 4);
    }

    #[test]
    fn cmd_set_without_port_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let err = set::cmd_set("busy", false, Some(&path)).unwrap_err();
        assert_eq!(err.to_string(), "No serial port configured");
    }

    #[test]
    fn cmd_set_rejects_unknown_color() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "serial_port = 1\n").unwrap();
        assert!(set::cmd_set("chartreuse-ish", false, Some(&path)).is_err());
    }
}

//! Presence → color mapping and manual override commands.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::color::{self, Color};
use crate::config::Config;
use crate::presence::{Availability, PresenceSnapshot, PresenceState};

/// The six indicator colors. Fixed for the lifetime of an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Palette {
    pub free: Color,
    pub busy: Color,
    pub dnd: Color,
    pub away: Color,
    pub out_of_office: Color,
    pub off: Color,
}

impl Default for Palette {
    fn default() -> Self {
        Palette {
            free: color::DARK_GREEN,
            busy: color::DARK_RED,
            dnd: color::MAROON,
            away: color::DARK_ORANGE,
            out_of_office: color::FUCHSIA,
            off: color::BLACK,
        }
    }
}

/// Keys accepted in the `[colors]` config table.
pub const PALETTE_KEYS: [&str; 6] = ["free", "busy", "dnd", "away", "out_of_office", "off"];

impl Palette {
    /// Build a palette from config overrides.
    ///
    /// Invalid or unknown entries fall back to the default and produce a
    /// warning instead of an error.
    pub fn from_config(config: &Config) -> (Self, Vec<String>) {
        let mut palette = Palette::default();
        let mut warnings = Vec::new();

        let mut keys: Vec<&String> = config.colors.keys().collect();
        keys.sort();
        for key in keys {
            let value = &config.colors[key];
            let slot = match key.as_str() {
                "free" => &mut palette.free,
                "busy" => &mut palette.busy,
                "dnd" => &mut palette.dnd,
                "away" => &mut palette.away,
                "out_of_office" => &mut palette.out_of_office,
                "off" => &mut palette.off,
                _ => {
                    warnings.push(format!("unknown color key \"{key}\" ignored"));
                    continue;
                }
            };
            match color::parse_color(value) {
                Ok(c) => *slot = c,
                Err(e) => warnings.push(format!("colors.{key}: {e}, using default {slot}")),
            }
        }
        (palette, warnings)
    }

    /// Color shown for a derived presence state.
    pub fn for_state(&self, state: PresenceState) -> Color {
        match state {
            PresenceState::Free => self.free,
            PresenceState::Busy => self.busy,
            PresenceState::DoNotDisturb => self.dnd,
            PresenceState::Away | PresenceState::TemporarilyAway => self.away,
            PresenceState::OutOfOffice => self.out_of_office,
            PresenceState::Offline | PresenceState::Unknown => self.off,
        }
    }

    /// Color pinned by a manual command.
    pub fn manual(&self, command: ManualCommand) -> Color {
        match command {
            ManualCommand::Free => self.free,
            ManualCommand::Busy => self.busy,
            ManualCommand::DoNotDisturb => self.dnd,
            ManualCommand::Away => self.away,
            ManualCommand::OutOfOffice => self.out_of_office,
            ManualCommand::Off => self.off,
        }
    }
}

/// Resolve the indicator color for one presence reading.
///
/// | availability | OOO | color |
/// |---|---|---|
/// | None | yes / no | out of office / off |
/// | Free, FreeIdle | any | free |
/// | Busy, BusyIdle | any | busy |
/// | DoNotDisturb | any | dnd |
/// | TemporarilyAway, Away | yes / no | out of office / away |
/// | Offline | yes / no | out of office / off |
/// | Invalid | any | off |
pub fn resolve_color(availability: Availability, out_of_office: bool, palette: &Palette) -> Color {
    palette.for_state(PresenceState::derive(PresenceSnapshot::new(
        availability,
        out_of_office,
    )))
}

// ── Manual override commands ──

/// One-shot color commands from the override surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ManualCommand {
    Free,
    Busy,
    DoNotDisturb,
    Away,
    OutOfOffice,
    Off,
}

impl ManualCommand {
    pub const ALL: [ManualCommand; 6] = [
        ManualCommand::Free,
        ManualCommand::Busy,
        ManualCommand::DoNotDisturb,
        ManualCommand::Away,
        ManualCommand::OutOfOffice,
        ManualCommand::Off,
    ];
}

impl FromStr for ManualCommand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "free" => Ok(ManualCommand::Free),
            "busy" => Ok(ManualCommand::Busy),
            "dnd" | "do-not-disturb" => Ok(ManualCommand::DoNotDisturb),
            "away" => Ok(ManualCommand::Away),
            "ooo" | "out-of-office" => Ok(ManualCommand::OutOfOffice),
            "off" => Ok(ManualCommand::Off),
            other => Err(format!(
                "unknown command: {other} (expected free, busy, dnd, away, ooo or off)"
            )),
        }
    }
}

impl fmt::Display for ManualCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ManualCommand::Free => "free",
            ManualCommand::Busy => "busy",
            ManualCommand::DoNotDisturb => "dnd",
            ManualCommand::Away => "away",
            ManualCommand::OutOfOffice => "ooo",
            ManualCommand::Off => "off",
        };
        f.write_str(s)
    }
}

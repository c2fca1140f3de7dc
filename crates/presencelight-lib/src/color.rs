//! Indicator colors and their serial wire encoding.
//!
//! The firmware expects one decimal integer per line: the color packed as
//! `0xAARRGGBB` with alpha fixed at `0xFF`.

use std::fmt;

use serde::Serialize;

/// An immutable 24-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color { r, g, b }
    }

    /// Packed `0xFFRRGGBB` value sent to the device.
    pub const fn to_argb(self) -> u32 {
        0xFF00_0000 | (self.r as u32) << 16 | (self.g as u32) << 8 | self.b as u32
    }

    /// The command line for this color, without the terminator.
    pub fn wire_command(self) -> String {
        self.to_argb().to_string()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

// Defaults carried over from the stock firmware setup.
pub const DARK_GREEN: Color = Color::rgb(0x00, 0x64, 0x00);
pub const DARK_RED: Color = Color::rgb(0x8B, 0x00, 0x00);
pub const MAROON: Color = Color::rgb(0x80, 0x00, 0x00);
pub const DARK_ORANGE: Color = Color::rgb(0xFF, 0x8C, 0x00);
pub const FUCHSIA: Color = Color::rgb(0xFF, 0x00, 0xFF);
pub const BLACK: Color = Color::rgb(0x00, 0x00, 0x00);

/// Parse a color string.
///
/// Accepts:
/// - Hex: `"#FF0000"`, `"FF0000"`, `"#ff0000"`
/// - Named: `"red"`, `"green"`, `"blue"`, `"white"`, `"orange"`, `"yellow"`,
///   `"purple"`, `"cyan"`, `"fuchsia"`, `"darkgreen"`, `"darkred"`, `"maroon"`,
///   `"darkorange"`, `"off"`/`"black"`
pub fn parse_color(s: &str) -> crate::error::Result<Color> {
    let s = s.trim();

    match s.to_lowercase().as_str() {
        "red" => return Ok(Color::rgb(0xFF, 0x00, 0x00)),
        "green" => return Ok(Color::rgb(0x00, 0xFF, 0x00)),
        "blue" => return Ok(Color::rgb(0x00, 0x00, 0xFF)),
        "white" => return Ok(Color::rgb(0xFF, 0xFF, 0xFF)),
        "orange" => return Ok(Color::rgb(0xFF, 0x80, 0x00)),
        "yellow" => return Ok(Color::rgb(0xFF, 0xFF, 0x00)),
        "purple" => return Ok(Color::rgb(0x80, 0x00, 0xFF)),
        "cyan" => return Ok(Color::rgb(0x00, 0xFF, 0xFF)),
        "fuchsia" | "magenta" => return Ok(FUCHSIA),
        "darkgreen" => return Ok(DARK_GREEN),
        "darkred" => return Ok(DARK_RED),
        "maroon" => return Ok(MAROON),
        "darkorange" => return Ok(DARK_ORANGE),
        "off" | "black" => return Ok(BLACK),
        _ => {}
    }

    let hex = s.strip_prefix('#').unwrap_or(s);
    if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(crate::PresenceLightError::Color(format!(
            "Invalid color: {s} (use #RRGGBB or a color name)"
        )));
    }
    let val = u32::from_str_radix(hex, 16)
        .map_err(|_| crate::PresenceLightError::Color(format!("Invalid hex color: {s}")))?;
    Ok(Color::rgb((val >> 16) as u8, (val >> 8) as u8, val as u8))
}

/// Format a color as `#RRGGBB`.
pub fn format_color(color: Color) -> String {
    color.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── wire encoding ──

    #[test]
    fn dark_green_packs_with_full_alpha() {
        assert_eq!(DARK_GREEN.to_argb(), 0xFF00_6400);
        assert_eq!(DARK_GREEN.wire_command(), "4278215680");
    }

    #[test]
    fn black_keeps_full_alpha() {
        assert_eq!(BLACK.to_argb(), 0xFF00_0000);
        assert_eq!(BLACK.wire_command(), "4278190080");
    }

    #[test]
    fn white_is_all_ones() {
        assert_eq!(Color::rgb(0xFF, 0xFF, 0xFF).to_argb(), u32::MAX);
    }

    #[test]
    fn channel_order_is_red_green_blue() {
        assert_eq!(Color::rgb(0x12, 0x34, 0x56).to_argb(), 0xFF12_3456);
    }

    // ── parse_color ──

    #[test]
    fn parse_named_colors() {
        assert_eq!(parse_color("red").unwrap(), Color::rgb(0xFF, 0, 0));
        assert_eq!(parse_color("darkgreen").unwrap(), DARK_GREEN);
        assert_eq!(parse_color("maroon").unwrap(), MAROON);
        assert_eq!(parse_color("off").unwrap(), BLACK);
        assert_eq!(parse_color("black").unwrap(), BLACK);
    }

    #[test]
    fn parse_named_case_insensitive() {
        assert_eq!(parse_color("  Fuchsia ").unwrap(), FUCHSIA);
        assert_eq!(parse_color("DARKORANGE").unwrap(), DARK_ORANGE);
    }

    #[test]
    fn parse_hex_with_and_without_hash() {
        assert_eq!(parse_color("#8B0000").unwrap(), DARK_RED);
        assert_eq!(parse_color("ff8c00").unwrap(), DARK_ORANGE);
    }

    #[test]
    fn parse_invalid_length() {
        assert!(parse_color("#FFF").is_err());
        assert!(parse_color("#FF000000").is_err());
    }

    #[test]
    fn parse_invalid_name_or_digits() {
        assert!(parse_color("chartreuse").is_err());
        assert!(parse_color("#GGHHII").is_err());
    }

    #[test]
    fn parse_rejects_signed_hex() {
        assert!(parse_color("+12345").is_err());
        assert!(parse_color("#+12345").is_err());
        assert!(parse_color("-12345").is_err());
    }

    #[test]
    fn parse_error_mentions_input() {
        let err = parse_color("nope").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Color error: Invalid color: nope (use #RRGGBB or a color name)"
        );
    }

    // ── format_color ──

    #[test]
    fn format_is_uppercase_hex() {
        assert_eq!(format_color(DARK_ORANGE), "#FF8C00");
        assert_eq!(format_color(BLACK), "#000000");
    }

    #[test]
    fn parse_accepts_formatted_output() {
        let c = Color::rgb(0xAB, 0x12, 0xCD);
        assert_eq!(parse_color(&format_color(c)).unwrap(), c);
    }
}

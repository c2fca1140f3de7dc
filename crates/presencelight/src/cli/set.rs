//! `set` subcommand: send one color to the indicator and exit.

use std::path::Path;

use super::{
    Color, IndicatorLink, ManualCommand, Palette, Result, SerialLink, SetOutput, color, kv,
    kv_width, link,
};

/// A palette command (`busy`, `ooo`, ...) or a literal color.
fn resolve(arg: &str, palette: &Palette) -> Result<Color> {
    match arg.parse::<ManualCommand>() {
        Ok(command) => Ok(palette.manual(command)),
        Err(_) => color::parse_color(arg),
    }
}

pub(super) fn cmd_set(arg: &str, json: bool, config_path: Option<&Path>) -> Result<()> {
    let config = super::load_config(config_path);
    let palette = super::palette_from(&config);
    let color = resolve(arg, &palette)?;
    let port = config.port_name().ok_or(link::LinkError::NotConfigured)?;

    let mut serial = SerialLink::new();
    serial.open(&port)?;
    let sent = serial.set_color(color);
    serial.close();
    sent?;

    let command = color.wire_command();
    if json {
        return super::print_json(&SetOutput {
            port,
            color: color::format_color(color),
            command,
        });
    }

    let w = kv_width(&["Port:", "Color:", "Command:"], &[]);
    kv("Port:", &port, w);
    kv("Color:", color, w);
    kv("Command:", &command, w);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_commands_win_over_color_names() {
        let p = Palette::default();
        assert_eq!(resolve("busy", &p).unwrap(), p.busy);
        assert_eq!(resolve("ooo", &p).unwrap(), p.out_of_office);
        assert_eq!(resolve("off", &p).unwrap(), p.off);
    }

    #[test]
    fn literal_colors_pass_through() {
        let p = Palette::default();
        assert_eq!(resolve("#123456", &p).unwrap(), Color::rgb(0x12, 0x34, 0x56));
        assert!(resolve("not a color", &p).is_err());
    }
}

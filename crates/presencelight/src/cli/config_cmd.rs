//! `config` subcommand: show current configuration and file paths.

use std::path::Path;

use super::{
    Config, ConfigOutput, PaletteJson, Result, color, kv, kv_indent, kv_width, palette_from,
};
use presencelight_lib::config::port_name_for;
use presencelight_lib::palette::PALETTE_KEYS;

pub(super) fn cmd_config(
    json: bool,
    set_port: Option<u32>,
    custom_path: Option<&Path>,
) -> Result<()> {
    let mut config = super::load_config(custom_path);
    let config_path = custom_path.map(|p| p.to_path_buf()).or_else(Config::path);

    if let Some(number) = set_port {
        config.serial_port = number;
        match &config_path {
            Some(path) => config.save_to(path)?,
            None => config.save()?,
        }
        let name = port_name_for(number).unwrap_or_else(|| "disabled".into());
        log::info!("[config] serial_port = {number} ({name})");
        if !json {
            println!("serial_port set to {number} ({name})");
            println!();
        }
    }

    let config_exists = config_path.as_ref().is_some_and(|p| p.exists());
    let palette = palette_from(&config);
    let problems: Vec<String> = match config.validate() {
        Ok(()) => vec![],
        Err(errors) => errors.iter().map(|e| e.to_string()).collect(),
    };
    let log_file = Config::log_path();

    if json {
        return super::print_json(&ConfigOutput {
            config_file: config_path.as_ref().map(|p| p.display().to_string()),
            config_file_exists: config_exists,
            port: config.port_name(),
            palette: PaletteJson::from(&palette),
            settings: config,
            problems,
            log_file: log_file.as_ref().map(|p| p.display().to_string()),
        });
    }

    // Human-readable output
    let w = kv_width(
        &["Config file:"],
        &[
            "serial_port:",
            "port_path:",
            "notifications_enabled:",
            "retry_interval_secs:",
            "hotplug_poll_ms:",
            "out_of_office:",
            "Log file:",
        ],
    );

    match &config_path {
        Some(p) => {
            if config_exists {
                kv("Config file:", format_args!("{} (loaded)", p.display()), w);
            } else {
                kv(
                    "Config file:",
                    format_args!("{} (not found, using defaults)", p.display()),
                    w,
                );
            }
        }
        None => kv("Config file:", "(no config directory)", w),
    }
    println!();

    println!("Settings:");
    let port_display = match config.port_name() {
        Some(name) if config.port_path.trim().is_empty() => {
            format!("{} -> {name}", config.serial_port)
        }
        Some(_) => format!("{} (overridden by port_path)", config.serial_port),
        None => "0 (disabled)".to_string(),
    };
    kv_indent("serial_port:", &port_display, w);
    if !config.port_path.trim().is_empty() {
        kv_indent("port_path:", &config.port_path, w);
    }
    kv_indent("notifications_enabled:", config.notifications_enabled, w);
    kv_indent(
        "retry_interval_secs:",
        format_args!("{} (max 60)", config.retry_interval_secs),
        w,
    );
    kv_indent("hotplug_poll_ms:", config.hotplug_poll_ms, w);
    println!();

    println!("Colors:");
    let slots = [
        palette.free,
        palette.busy,
        palette.dnd,
        palette.away,
        palette.out_of_office,
        palette.off,
    ];
    for (key, slot) in PALETTE_KEYS.iter().zip(slots) {
        let source = if config.colors.contains_key(*key) {
            "config"
        } else {
            "default"
        };
        kv_indent(
            &format!("{key}:"),
            format_args!("{} ({source})", color::format_color(slot)),
            w,
        );
    }

    if !problems.is_empty() {
        println!();
        println!("Problems:");
        for p in &problems {
            println!("  {p}");
        }
    }
    println!();

    println!("Files:");
    match &log_file {
        Some(p) => kv_indent("Log file:", p.display(), w),
        None => kv_indent("Log file:", "(no config directory)", w),
    }
    Ok(())
}

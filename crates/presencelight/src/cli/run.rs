//! `run` subcommand: keep the indicator in sync until shutdown.

use std::path::Path;
use std::time::Duration;

use presencelight_lib::bridge::{Bridge, BridgeOptions};
use presencelight_lib::engine::{Engine, EngineOptions, EngineStatus, Event};
use presencelight_lib::presence::Availability;
use presencelight_lib::presence::feed::FeedHandle;

use super::{Result, SerialLink, kv, kv_width};
use crate::{console, notify};

/// Idle interval between periodic reconnect checks.
const TICK: Duration = Duration::from_millis(500);

pub(super) struct RunOptions {
    pub no_presence: bool,
    pub no_console: bool,
}

pub(super) fn cmd_run(opts: RunOptions, json: bool, config_path: Option<&Path>) -> Result<()> {
    let config = super::load_config(config_path);
    let palette = super::palette_from(&config);
    let port = config.port_name();

    // Banner
    if !json {
        println!("PresenceLight: mirrors your presence on a serial indicator.");
        match &port {
            Some(p) => println!("  Indicator: {p}"),
            None => println!("  Indicator: none (set serial_port in the config)"),
        }
        if opts.no_console {
            println!("Press Ctrl+C to exit (turns the light off).");
        } else {
            println!("Type `help` for commands, `quit` or Ctrl+C to exit.");
        }
        println!();
    }

    let feed = FeedHandle::signed_in(Availability::None, false);
    if opts.no_presence {
        feed.set_running(false);
    }

    let engine = Engine::new(
        SerialLink::new(),
        EngineOptions {
            port,
            palette,
            reconnect: config.reconnect_config(),
        },
        notify::notifier(config.notifications_enabled),
    );
    let bridge = Bridge::start(
        engine,
        Box::new(feed.source()),
        BridgeOptions {
            tick: TICK,
            hotplug_poll: Some(config.hotplug_interval()),
        },
    )?;

    let shutdown = bridge.sender();
    if let Err(e) = ctrlc::set_handler(move || {
        let _ = shutdown.send(Event::Shutdown);
    }) {
        log::warn!("could not install Ctrl+C handler: {e}");
    }

    if !opts.no_console {
        let events = bridge.sender();
        let feed = feed.clone();
        std::thread::Builder::new()
            .name("console".into())
            .spawn(move || console::run_console(std::io::stdin().lock(), events, feed))?;
    }

    match bridge.wait() {
        Some(status) => print_status(&status, json),
        None => Ok(()),
    }
}

fn print_status(status: &EngineStatus, json: bool) -> Result<()> {
    if json {
        return super::print_json(status);
    }
    let label = |c: Option<presencelight_lib::color::Color>| {
        c.map(|c| c.to_string()).unwrap_or_else(|| "-".into())
    };
    let w = kv_width(&["Mode:", "Presence:", "Link:", "Last color:", "Confirmed:"], &[]);
    println!();
    kv("Mode:", status.mode, w);
    kv("Presence:", status.presence, w);
    kv(
        "Link:",
        format_args!(
            "{} ({})",
            status.link,
            status.port.as_deref().unwrap_or("no port")
        ),
        w,
    );
    kv("Last color:", label(status.color), w);
    kv("Confirmed:", label(status.confirmed), w);
    Ok(())
}

//! PresenceLight: mirror your presence status on a serial indicator light.
//!
//! Console subsystem: `run` keeps the light in sync until Ctrl+C, the other
//! subcommands are one-shot helpers.

use std::path::PathBuf;

use clap::Parser;

mod cli;
mod console;
mod notify;

#[derive(Parser)]
#[command(
    name = "presencelight",
    version,
    about = "Mirror your presence status on a serial indicator light"
)]
struct Args {
    /// Output as JSON (for run, set, ports, config)
    #[arg(long, global = true)]
    json: bool,

    /// Log engine activity (info level)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use this config file instead of the platform default
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: cli::Command,
}

/// Initialize the logger. With `to_file`, output goes to the log file next
/// to the config; falls back to stderr if the file can't be created.
fn init_logger(verbose: bool, to_file: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level));
    builder.format_target(false);

    if to_file {
        if let Some(log_path) = presencelight_lib::config::Config::log_path() {
            if let Some(dir) = log_path.parent() {
                let _ = std::fs::create_dir_all(dir);
            }
            if let Ok(file) = std::fs::File::create(&log_path) {
                builder.target(env_logger::Target::Pipe(Box::new(file)));
            }
        }
    } else {
        builder.format_timestamp(None);
    }

    builder.init();
}

fn main() {
    let args = Args::parse();
    init_logger(args.verbose, args.command.logs_to_file());

    if let Err(e) = cli::run(args.command, args.json, args.config.as_deref()) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

//! Line-based control surface for `run`.
//!
//! Each stdin line is one command. Manual colors go to the engine as
//! events; `presence` and `availability` lines drive the in-process feed
//! that stands in for the collaboration client.

use std::io::BufRead;

use presencelight_lib::engine::{Event, EventSender};
use presencelight_lib::palette::ManualCommand;
use presencelight_lib::presence::feed::FeedHandle;
use presencelight_lib::presence::{Availability, SessionState};

pub const HELP: &str = "\
Commands:
  free | busy | dnd | away | ooo | off   set the light manually
  presence <state>                       signed-in, signed-out, signing-in, ...
  availability <value> [ooo]             free, busy, dnd, away, brb, offline, none ...
  help                                   show this help
  quit                                   turn the light off and exit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleCommand {
    Manual(ManualCommand),
    Session(SessionState),
    Availability {
        availability: Availability,
        out_of_office: bool,
    },
    Help,
    Quit,
}

/// Parse one input line. Blank lines and `#` comments yield `Ok(None)`.
pub fn parse_line(line: &str) -> Result<Option<ConsoleCommand>, String> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Ok(None);
    };
    let rest: Vec<&str> = words.collect();

    let command = match head.to_lowercase().as_str() {
        "quit" | "exit" => ConsoleCommand::Quit,
        "help" | "?" => ConsoleCommand::Help,
        "presence" => match rest.as_slice() {
            [state] => ConsoleCommand::Session(state.parse()?),
            _ => return Err("usage: presence <state>".into()),
        },
        "availability" => {
            let (value, ooo) = match rest.as_slice() {
                [value] => (value, false),
                [value, flag] if flag.eq_ignore_ascii_case("ooo") => (value, true),
                _ => return Err("usage: availability <value> [ooo]".into()),
            };
            ConsoleCommand::Availability {
                availability: value.parse()?,
                out_of_office: ooo,
            }
        }
        _ if rest.is_empty() => ConsoleCommand::Manual(head.parse()?),
        other => return Err(format!("unexpected arguments after {other}")),
    };
    Ok(Some(command))
}

/// Read commands from `input` until `quit` or EOF, then request shutdown.
pub fn run_console(input: impl BufRead, events: EventSender, feed: FeedHandle) {
    for line in input.lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                log::warn!("[console] read failed: {e}");
                break;
            }
        };
        match parse_line(&line) {
            Ok(None) => {}
            Ok(Some(ConsoleCommand::Quit)) => break,
            Ok(Some(ConsoleCommand::Help)) => println!("{HELP}"),
            Ok(Some(ConsoleCommand::Manual(command))) => {
                if events.send(Event::Manual(command)).is_err() {
                    return;
                }
            }
            Ok(Some(ConsoleCommand::Session(state))) => feed.set_session_state(state),
            Ok(Some(ConsoleCommand::Availability {
                availability,
                out_of_office,
            })) => feed.set_availability(availability, out_of_office),
            Err(e) => eprintln!("{e} (type `help` for commands)"),
        }
    }
    let _ = events.send(Event::Shutdown);
}

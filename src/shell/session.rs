use std::io::{self, BufRead, Write};

use super::render::{DEFAULT_CHART_HEIGHT, DEFAULT_CHART_WIDTH, render_view};
use super::{Field, InputError, ShellState, ViewportClass, parse_frequency};
use crate::core::ContributionFrequency;

const HELP: &str = "\
Commands:
  + <field>             increase a field by one step
  - <field>             decrease a field by one step (never below zero)
  set <field> <value>   type a new value
  freq monthly|annually contribution frequency
  view                  toggle between chart and table
  viewport wide|compact table layout
  show                  print the current view
  help                  this list
  quit                  leave
Fields: initial (+/-100), contribution (+/-10), rate (+/-0.1), years (+/-1)
";

#[derive(Debug, Clone, PartialEq)]
pub enum SessionCommand {
    Increment(Field),
    Decrement(Field),
    Set(Field, String),
    Frequency(ContributionFrequency),
    ToggleView,
    Viewport(ViewportClass),
    Show,
    Help,
    Quit,
}

pub fn parse_command(line: &str) -> Result<SessionCommand, InputError> {
    let line = line.trim();
    let (head, rest) = match line.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (line, ""),
    };

    match head.to_ascii_lowercase().as_str() {
        "+" | "inc" => Ok(SessionCommand::Increment(rest.parse()?)),
        "-" | "dec" => Ok(SessionCommand::Decrement(rest.parse()?)),
        "set" => {
            let (field, value) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
            Ok(SessionCommand::Set(field.parse()?, value.trim().to_string()))
        }
        "freq" | "frequency" => Ok(SessionCommand::Frequency(parse_frequency(rest)?)),
        "view" | "toggle" => Ok(SessionCommand::ToggleView),
        "viewport" => Ok(SessionCommand::Viewport(rest.parse()?)),
        "show" => Ok(SessionCommand::Show),
        "help" | "?" => Ok(SessionCommand::Help),
        "quit" | "exit" | "q" => Ok(SessionCommand::Quit),
        _ => Err(InputError::UnknownCommand(line.to_string())),
    }
}

/// Read commands line by line until `quit` or end of input, re-rendering the
/// current view after every accepted change.
pub fn run_session<R: BufRead, W: Write>(
    state: &mut ShellState,
    input: R,
    out: &mut W,
) -> io::Result<()> {
    writeln!(out, "{}", render_view(state, DEFAULT_CHART_WIDTH, DEFAULT_CHART_HEIGHT))?;
    writeln!(out, "Type help for commands.")?;

    for line in input.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(e) => {
                writeln!(out, "error: {e}")?;
                continue;
            }
        };
        log::debug!("session command {command:?}");

        match command {
            SessionCommand::Increment(field) => state.increment(field),
            SessionCommand::Decrement(field) => state.decrement(field),
            SessionCommand::Set(field, text) => {
                if let Err(e) = state.set_text(field, &text) {
                    writeln!(out, "error: {e}")?;
                    continue;
                }
            }
            SessionCommand::Frequency(frequency) => state.set_frequency(frequency),
            SessionCommand::ToggleView => state.toggle_view_mode(),
            SessionCommand::Viewport(viewport) => state.set_viewport(viewport),
            SessionCommand::Show => {}
            SessionCommand::Help => {
                write!(out, "{HELP}")?;
                continue;
            }
            SessionCommand::Quit => break,
        }
        writeln!(out, "{}", render_view(state, DEFAULT_CHART_WIDTH, DEFAULT_CHART_HEIGHT))?;
    }

    out.flush()
}

//! Line-oriented control console
//!
//! The firmware exposes a serial console for everything a user does by
//! hand: set the clock, run or measure a motor, edit a schedule, browse the
//! journal. Bytes are collected into lines; each line parses into one
//! [`Command`].
//!
//! ```text
//! time 07:45[:30]                     set the clock
//! open | close                        one-shot run
//! measure open|close                  run until `stop`
//! stop                                end a measurement
//! set open|close HH:MM HH:MM DUR N    save a schedule
//! show open|close                     print a schedule
//! history [N]                         newest N journal entries
//! preview                             upcoming fires
//! reset                               restore default schedules
//! ```

use heapless::Vec;
use shutter_hal::TimeOfDay;

use crate::config::Action;
use crate::settings::ScheduleRecord;

/// Longest accepted line
pub const MAX_LINE: usize = 64;

/// Entries printed by `history` without a count
pub const DEFAULT_HISTORY: u16 = 10;

/// A parsed console command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    SetClock(TimeOfDay),
    Run(Action),
    Measure(Action),
    Stop,
    Save(Action, ScheduleRecord),
    Show(Action),
    History(u16),
    Preview,
    Reset,
}

/// Why a line was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    UnknownCommand,
    MissingArgument,
    InvalidArgument,
    TrailingArgument,
    LineTooLong,
}

/// Parse one line
pub fn parse(line: &str) -> Result<Command, ParseError> {
    let mut args = line.split_ascii_whitespace();
    let Some(word) = args.next() else {
        return Err(ParseError::MissingArgument);
    };

    let command = match word {
        "time" => Command::SetClock(time_arg(args.next(), true)?),
        "open" => Command::Run(Action::Open),
        "close" => Command::Run(Action::Close),
        "measure" => Command::Measure(action_arg(args.next())?),
        "stop" => Command::Stop,
        "set" => {
            let action = action_arg(args.next())?;
            let first = time_arg(args.next(), false)?;
            let last = time_arg(args.next(), false)?;
            let duration = number_arg(args.next())?;
            let event_count = number_arg(args.next())?;
            Command::Save(
                action,
                ScheduleRecord {
                    first_hour: first.hour,
                    first_minute: first.minute,
                    last_hour: last.hour,
                    last_minute: last.minute,
                    duration,
                    event_count,
                },
            )
        }
        "show" => Command::Show(action_arg(args.next())?),
        "history" => match args.next() {
            Some(n) => Command::History(n.parse().map_err(|_| ParseError::InvalidArgument)?),
            None => Command::History(DEFAULT_HISTORY),
        },
        "preview" => Command::Preview,
        "reset" => Command::Reset,
        _ => return Err(ParseError::UnknownCommand),
    };

    match args.next() {
        Some(_) => Err(ParseError::TrailingArgument),
        None => Ok(command),
    }
}

fn action_arg(arg: Option<&str>) -> Result<Action, ParseError> {
    match arg.ok_or(ParseError::MissingArgument)? {
        "open" => Ok(Action::Open),
        "close" => Ok(Action::Close),
        _ => Err(ParseError::InvalidArgument),
    }
}

fn number_arg<T: core::str::FromStr>(arg: Option<&str>) -> Result<T, ParseError> {
    arg.ok_or(ParseError::MissingArgument)?
        .parse()
        .map_err(|_| ParseError::InvalidArgument)
}

/// `HH:MM`, or `HH:MM:SS` when seconds are allowed
fn time_arg(arg: Option<&str>, seconds: bool) -> Result<TimeOfDay, ParseError> {
    let arg = arg.ok_or(ParseError::MissingArgument)?;
    let mut parts = arg.split(':');
    let mut field = || -> Result<Option<u8>, ParseError> {
        parts
            .next()
            .map(|p| p.parse().map_err(|_| ParseError::InvalidArgument))
            .transpose()
    };
    let hour = field()?.ok_or(ParseError::InvalidArgument)?;
    let minute = field()?.ok_or(ParseError::InvalidArgument)?;
    let second = match field()? {
        Some(s) if seconds => s,
        Some(_) => return Err(ParseError::InvalidArgument),
        None => 0,
    };
    if field()?.is_some() {
        return Err(ParseError::InvalidArgument);
    }
    TimeOfDay::new(hour, minute, second).ok_or(ParseError::InvalidArgument)
}

/// Collects bytes into lines
#[derive(Default)]
pub struct LineBuffer {
    line: Vec<u8, MAX_LINE>,
    overflow: bool,
}

impl LineBuffer {
    pub const fn new() -> Self {
        Self {
            line: Vec::new(),
            overflow: false,
        }
    }

    /// Add one byte; a line terminator yields the parsed line
    ///
    /// Blank lines yield nothing.
    pub fn feed(&mut self, byte: u8) -> Option<Result<Command, ParseError>> {
        if byte != b'\n' && byte != b'\r' {
            if self.line.push(byte).is_err() {
                self.overflow = true;
            }
            return None;
        }

        let result = if self.overflow {
            Some(Err(ParseError::LineTooLong))
        } else {
            match core::str::from_utf8(&self.line) {
                Ok(text) if text.trim().is_empty() => None,
                Ok(text) => Some(parse(text)),
                Err(_) => Some(Err(ParseError::InvalidArgument)),
            }
        };
        self.line.clear();
        self.overflow = false;
        result
    }
}

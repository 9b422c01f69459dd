//! Command grammar for the simulator.
//!
//! Parsing is total: anything that is not an exact match for a known
//! command (including a button with an out-of-range floor) becomes
//! [`Command::Unknown`] carrying the raw text for the crash message.

use std::fmt;

use super::MAX_FLOOR;

/// A parsed controller command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Reset,
    Panel(u8),
    PanelClear(u8),
    HallUp(u8),
    HallUpClear(u8),
    HallDown(u8),
    HallDownClear(u8),
    DoorOpen,
    DoorClose,
    MotorUp,
    MotorDown,
    Stop,
    Tick,
    Unknown(String),
}

impl Command {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "R" => return Command::Reset,
            "DO" => return Command::DoorOpen,
            "DC" => return Command::DoorClose,
            "MU" => return Command::MotorUp,
            "MD" => return Command::MotorDown,
            "S" => return Command::Stop,
            "T" => return Command::Tick,
            _ => {}
        }

        parse_button(raw).unwrap_or_else(|| Command::Unknown(raw.to_string()))
    }
}

fn parse_button(raw: &str) -> Option<Command> {
    // Exactly one trailing digit; "P01" or "P+1" are not buttons.
    let digit = *raw.as_bytes().last()?;
    if !digit.is_ascii_digit() {
        return None;
    }
    let prefix = &raw[..raw.len() - 1];
    let floor = digit - b'0';

    let (make, range): (fn(u8) -> Command, (u8, u8)) = match prefix {
        "P" => (Command::Panel, (1, MAX_FLOOR)),
        "CP" => (Command::PanelClear, (1, MAX_FLOOR)),
        "U" => (Command::HallUp, (1, MAX_FLOOR - 1)),
        "CU" => (Command::HallUpClear, (1, MAX_FLOOR - 1)),
        "D" => (Command::HallDown, (2, MAX_FLOOR)),
        "CD" => (Command::HallDownClear, (2, MAX_FLOOR)),
        _ => return None,
    };

    (range.0..=range.1).contains(&floor).then(|| make(floor))
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Reset => write!(f, "R"),
            Command::Panel(n) => write!(f, "P{n}"),
            Command::PanelClear(n) => write!(f, "CP{n}"),
            Command::HallUp(n) => write!(f, "U{n}"),
            Command::HallUpClear(n) => write!(f, "CU{n}"),
            Command::HallDown(n) => write!(f, "D{n}"),
            Command::HallDownClear(n) => write!(f, "CD{n}"),
            Command::DoorOpen => write!(f, "DO"),
            Command::DoorClose => write!(f, "DC"),
            Command::MotorUp => write!(f, "MU"),
            Command::MotorDown => write!(f, "MD"),
            Command::Stop => write!(f, "S"),
            Command::Tick => write!(f, "T"),
            Command::Unknown(raw) => write!(f, "{raw}"),
        }
    }
}

use std::fmt;

use thiserror::Error;

use super::{Command, DoorState};

/// Observable change reported to controllers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// The car will reach this floor in `APPROACH_TICKS` ticks.
    Approach(u8),
    Stopped(u8),
    DoorOpened(u8),
    DoorClosed(u8),
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::Approach(floor) => write!(f, "A{floor}"),
            Event::Stopped(floor) => write!(f, "S{floor}"),
            Event::DoorOpened(floor) => write!(f, "O{floor}"),
            Event::DoorClosed(floor) => write!(f, "C{floor}"),
        }
    }
}

/// Why the controller crashed the elevator.
///
/// These are the simulator's output, not failures of the simulator itself.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Crash {
    #[error("door command while moving")]
    DoorWhileMoving,

    #[error("door {requested} in state {current}")]
    DoorTransition {
        requested: DoorState,
        current: DoorState,
    },

    #[error("motor command while door {door}")]
    MotorWhileDoor { door: DoorState },

    #[error("motor command while moving")]
    MotorWhileMoving,

    #[error("already stopping")]
    AlreadyStopping,

    #[error("not moving")]
    NotMoving,

    #[error("out of the roof")]
    OutOfTheRoof,

    #[error("into the basement")]
    IntoTheBasement,

    #[error("unknown command - {0:?}")]
    UnknownCommand(String),
}

/// Result of handling one command.
///
/// `Display` yields the textual form: empty for [`Outcome::Silent`], the
/// command text for button echoes, the event code, or `crash: <reason>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Silent,
    Echo(Command),
    Event(Event),
    Crash(Crash),
}

impl Outcome {
    /// Only events go out on the wire; echoes and crashes stay local.
    pub fn is_broadcast(&self) -> bool {
        matches!(self, Outcome::Event(_))
    }

    pub fn is_crash(&self) -> bool {
        matches!(self, Outcome::Crash(_))
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Silent => Ok(()),
            Outcome::Echo(command) => write!(f, "{command}"),
            Outcome::Event(event) => write!(f, "{event}"),
            Outcome::Crash(crash) => write!(f, "crash: {crash}"),
        }
    }
}

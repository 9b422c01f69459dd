//! Discrete-time elevator state machine.
//!
//! The car serves floors `1..=MAX_FLOOR`. Every command is handled
//! atomically by [`Elevator::handle`]; time only advances on a tick (`T`).
//! A controller that violates the machine's preconditions latches a crash,
//! after which everything except reset is ignored.

mod command;
mod outcome;

use std::fmt;

pub use command::Command;
pub use outcome::{Crash, Event, Outcome};

pub const MAX_FLOOR: u8 = 4;

/// Ticks to travel between adjacent floors.
pub const TICKS_PER_FLOOR: u32 = 40;
/// Ticks for the door to finish opening or closing.
pub const TICKS_PER_DOOR: u32 = 20;
/// Lead time of the approach event before a floor crossing.
pub const APPROACH_TICKS: u32 = 10;

const FLOORS: usize = MAX_FLOOR as usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotorState {
    Up,
    Down,
    Off,
}

impl fmt::Display for MotorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MotorState::Up => "UP",
            MotorState::Down => "DOWN",
            MotorState::Off => "OFF",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoorState {
    Opening,
    Open,
    Closing,
    Closed,
}

impl fmt::Display for DoorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DoorState::Opening => "OPENING",
            DoorState::Open => "OPEN",
            DoorState::Closing => "CLOSING",
            DoorState::Closed => "CLOSED",
        };
        f.write_str(name)
    }
}

/// Button lamps. Index 0 is floor 1 for `panel` and `up`, floor 2 for `down`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Buttons {
    pub panel: [bool; FLOORS],
    pub up: [bool; FLOORS - 1],
    pub down: [bool; FLOORS - 1],
}

/// The simulated car.
///
/// Owned by exactly one consumer; there is no interior mutability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Elevator {
    floor: u8,
    motor: MotorState,
    door: DoorState,
    stopping: bool,
    crashed: bool,
    crash_count: u32,
    event_time: u32,
    buttons: Buttons,
}

impl Default for Elevator {
    fn default() -> Self {
        Self::new()
    }
}

impl Elevator {
    pub fn new() -> Self {
        Self {
            floor: 1,
            motor: MotorState::Off,
            door: DoorState::Closed,
            stopping: false,
            crashed: false,
            crash_count: 0,
            event_time: 0,
            buttons: Buttons::default(),
        }
    }

    pub fn floor(&self) -> u8 {
        self.floor
    }

    pub fn motor(&self) -> MotorState {
        self.motor
    }

    pub fn door(&self) -> DoorState {
        self.door
    }

    pub fn is_stopping(&self) -> bool {
        self.stopping
    }

    pub fn is_crashed(&self) -> bool {
        self.crashed
    }

    /// Crashes over the process lifetime; survives reset.
    pub fn crash_count(&self) -> u32 {
        self.crash_count
    }

    /// Ticks into the current timed activity.
    pub fn event_time(&self) -> u32 {
        self.event_time
    }

    pub fn buttons(&self) -> &Buttons {
        &self.buttons
    }

    /// Restore the power-on state, keeping the crash count.
    pub fn reset(&mut self) {
        *self = Self {
            crash_count: self.crash_count,
            ..Self::new()
        };
    }

    /// Handle one textual command.
    pub fn handle(&mut self, raw: &str) -> Outcome {
        self.apply(Command::parse(raw))
    }

    /// Handle one parsed command.
    pub fn apply(&mut self, command: Command) -> Outcome {
        if self.crashed && command != Command::Reset {
            return Outcome::Silent;
        }

        let result = match command {
            Command::Reset => {
                self.reset();
                Ok(Outcome::Silent)
            }
            Command::Panel(_)
            | Command::PanelClear(_)
            | Command::HallUp(_)
            | Command::HallUpClear(_)
            | Command::HallDown(_)
            | Command::HallDownClear(_) => {
                self.set_button(&command);
                Ok(Outcome::Echo(command))
            }
            Command::DoorOpen => self.set_door(DoorState::Opening).map(|_| Outcome::Silent),
            Command::DoorClose => self.set_door(DoorState::Closing).map(|_| Outcome::Silent),
            Command::MotorUp => self.set_motor(MotorState::Up).map(|_| Outcome::Silent),
            Command::MotorDown => self.set_motor(MotorState::Down).map(|_| Outcome::Silent),
            Command::Stop => self.request_stop().map(|_| Outcome::Silent),
            Command::Tick => self.tick().map(|event| match event {
                Some(event) => Outcome::Event(event),
                None => Outcome::Silent,
            }),
            Command::Unknown(raw) => Err(Crash::UnknownCommand(raw)),
        };

        result.unwrap_or_else(|crash| {
            self.latch_crash();
            Outcome::Crash(crash)
        })
    }

    fn latch_crash(&mut self) {
        if !self.crashed {
            self.crashed = true;
            self.crash_count += 1;
        }
    }

    fn set_button(&mut self, command: &Command) {
        // Floors were range-checked by the parser.
        let (lamp, on) = match *command {
            Command::Panel(n) => (&mut self.buttons.panel[usize::from(n) - 1], true),
            Command::PanelClear(n) => (&mut self.buttons.panel[usize::from(n) - 1], false),
            Command::HallUp(n) => (&mut self.buttons.up[usize::from(n) - 1], true),
            Command::HallUpClear(n) => (&mut self.buttons.up[usize::from(n) - 1], false),
            Command::HallDown(n) => (&mut self.buttons.down[usize::from(n) - 2], true),
            Command::HallDownClear(n) => (&mut self.buttons.down[usize::from(n) - 2], false),
            _ => return,
        };
        *lamp = on;
    }

    fn set_door(&mut self, requested: DoorState) -> Result<(), Crash> {
        if self.motor != MotorState::Off {
            return Err(Crash::DoorWhileMoving);
        }

        match (self.door, requested) {
            (DoorState::Closed, DoorState::Opening) | (DoorState::Open, DoorState::Closing) => {
                self.door = requested;
                self.event_time = 0;
                Ok(())
            }
            (current, requested) => Err(Crash::DoorTransition { requested, current }),
        }
    }

    fn set_motor(&mut self, requested: MotorState) -> Result<(), Crash> {
        if self.door != DoorState::Closed {
            return Err(Crash::MotorWhileDoor { door: self.door });
        }
        if self.motor != MotorState::Off {
            return Err(Crash::MotorWhileMoving);
        }

        self.motor = requested;
        self.event_time = 0;
        Ok(())
    }

    fn request_stop(&mut self) -> Result<(), Crash> {
        if self.stopping {
            return Err(Crash::AlreadyStopping);
        }
        if self.motor == MotorState::Off {
            return Err(Crash::NotMoving);
        }

        // Consummated by the next floor crossing.
        self.stopping = true;
        Ok(())
    }

    fn next_floor(&self) -> i16 {
        match self.motor {
            MotorState::Up => i16::from(self.floor) + 1,
            _ => i16::from(self.floor) - 1,
        }
    }

    fn tick(&mut self) -> Result<Option<Event>, Crash> {
        self.event_time = self.event_time.saturating_add(1);

        if matches!(self.door, DoorState::Opening | DoorState::Closing) {
            if self.event_time <= TICKS_PER_DOOR {
                return Ok(None);
            }

            self.event_time = 0;
            let event = if self.door == DoorState::Opening {
                self.door = DoorState::Open;
                Event::DoorOpened(self.floor)
            } else {
                self.door = DoorState::Closed;
                Event::DoorClosed(self.floor)
            };
            return Ok(Some(event));
        }

        if self.motor == MotorState::Off {
            return Ok(None);
        }

        // Exact equality on both checks: each fires once per floor.
        if self.event_time == TICKS_PER_FLOOR - APPROACH_TICKS {
            let next = u8::try_from(self.next_floor()).unwrap_or(0);
            return Ok(Some(Event::Approach(next)));
        }

        if self.event_time == TICKS_PER_FLOOR {
            let next = self.next_floor();
            if next > i16::from(MAX_FLOOR) {
                return Err(Crash::OutOfTheRoof);
            }
            if next < 1 {
                return Err(Crash::IntoTheBasement);
            }

            self.floor = next as u8;
            self.event_time = 0;

            if self.stopping {
                self.stopping = false;
                self.motor = MotorState::Off;
                return Ok(Some(Event::Stopped(self.floor)));
            }
        }

        Ok(None)
    }
}

//! Single-line terminal status display.

use std::io::{self, IsTerminal, Write};

use crossterm::style::Stylize;

use crate::elevator::{Elevator, MotorState};
use crate::mux::{Origin, RunSummary};

pub const HELP: &str = "\
Commands:
  R         reset the elevator
  P<n>      press panel button n (1-4), CP<n> clears it
  U<n>      press hall up button n (1-3), CU<n> clears it
  D<n>      press hall down button n (2-4), CD<n> clears it
  DO / DC   open / close the door
  MU / MD   start the motor up / down
  S         stop at the next floor
  T         advance time by one tick
Local only:
  H         show this help
  Q         quit
  <enter>   redraw the status line
Events sent to controllers:
  A<n> approaching n, S<n> stopped at n, O<n> door open at n, C<n> door closed at n";

/// The status line, e.g. `[*FLOOR 2| UP      | P:-2--| U:---| D:--- ] : `.
pub fn render_status(elevator: &Elevator, connected: bool) -> String {
    let conn = if connected { '*' } else { ' ' };
    let buttons = elevator.buttons();
    format!(
        "[{conn}FLOOR {}| {:<8}| P:{}| U:{}| D:{} ] : ",
        elevator.floor(),
        status(elevator),
        mask(&buttons.panel, 1),
        mask(&buttons.up, 1),
        mask(&buttons.down, 2),
    )
}

fn status(elevator: &Elevator) -> String {
    if elevator.is_crashed() {
        return "CRASH".to_string();
    }
    if elevator.is_stopping() {
        return "STOPPING".to_string();
    }
    match elevator.motor() {
        MotorState::Off => elevator.door().to_string(),
        moving => moving.to_string(),
    }
}

fn mask(lamps: &[bool], first_floor: usize) -> String {
    lamps
        .iter()
        .enumerate()
        .map(|(i, &on)| {
            if on {
                char::from_digit((first_floor + i) as u32, 10).unwrap_or('?')
            } else {
                '-'
            }
        })
        .collect()
}

pub fn summary_line(crash_count: u32) -> String {
    match crash_count {
        0 => "No crashes.".to_string(),
        1 => "1 crash.".to_string(),
        n => format!("{n} crashes."),
    }
}

/// Redraw policy for the status line.
///
/// The line is written without a trailing newline so typed input follows
/// the prompt.
pub struct Dashboard<W: Write> {
    out: W,
    last: String,
    color: bool,
}

impl Dashboard<io::Stdout> {
    pub fn stdout() -> Self {
        let out = io::stdout();
        let color = out.is_terminal();
        Self::new(out, color)
    }
}

impl<W: Write> Dashboard<W> {
    pub fn new(out: W, color: bool) -> Self {
        Self {
            out,
            last: String::new(),
            color,
        }
    }

    pub fn last_line(&self) -> &str {
        &self.last
    }

    pub fn start(&mut self, line: String) -> io::Result<()> {
        write!(self.out, "{line}")?;
        self.out.flush()?;
        self.last = line;
        Ok(())
    }

    pub fn show_help(&mut self) -> io::Result<()> {
        writeln!(self.out, "{HELP}")
    }

    /// Print `line` if it differs from the last one, if `force` is set, or
    /// if there is a crash to report. Returns whether anything was drawn.
    pub fn update(
        &mut self,
        line: String,
        origin: Origin,
        crash: Option<&str>,
        force: bool,
    ) -> io::Result<bool> {
        if line == self.last && !force && crash.is_none() {
            return Ok(false);
        }

        // Typed input already ended the previous line.
        if origin != Origin::Stdin {
            writeln!(self.out)?;
        }
        if let Some(crash) = crash {
            if self.color {
                writeln!(self.out, "{}", crash.red())?;
            } else {
                writeln!(self.out, "{crash}")?;
            }
        }
        write!(self.out, "{line}")?;
        self.out.flush()?;
        self.last = line;
        Ok(true)
    }

    pub fn finish(&mut self, summary: &RunSummary) -> io::Result<()> {
        writeln!(self.out)?;
        writeln!(self.out, "{}", summary_line(summary.crash_count))?;
        self.out.flush()
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

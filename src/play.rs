//! Scripted controller sessions.
//!
//! A script is read line by line. Blank lines and `#` comments are skipped;
//! every other line is echoed as `> <line>` and executed:
//!
//! ```text
//! SEND <cmd>        send a command to the simulator
//! SLEEP <duration>  pause, e.g. 100ms, 1.5s, 1m30s
//! WAIT <event>      print received events as `< <evt>` until <event> arrives
//! ```

use std::io::{self, Write};
use std::time::Duration;

use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

use crate::client::{Client, ClientError};

#[derive(Debug, Error)]
pub enum PlayError {
    #[error("connecting to simulator: {0}")]
    Connect(ClientError),

    #[error("line {line}: {kind}")]
    Step { line: usize, kind: StepError },

    #[error("reading script: {0}")]
    Read(io::Error),

    #[error("writing output: {0}")]
    Output(io::Error),
}

#[derive(Debug, Error)]
pub enum StepError {
    #[error("SEND requires a command")]
    MissingCommand,

    #[error("SLEEP requires a duration")]
    MissingDuration,

    #[error("parsing duration: {0}")]
    Duration(DurationError),

    #[error("WAIT requires an event")]
    MissingEvent,

    #[error("unknown command {0:?}")]
    Unknown(String),

    #[error("sending command: {0}")]
    Send(ClientError),

    #[error("receiving event: {0}")]
    Recv(ClientError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DurationError {
    #[error("invalid duration {0:?}")]
    Invalid(String),

    #[error("missing unit in duration {0:?}")]
    MissingUnit(String),

    #[error("unknown unit {unit:?} in duration {input:?}")]
    UnknownUnit { unit: String, input: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Send(String),
    Sleep(Duration),
    Wait(String),
}

impl Step {
    /// Parse one non-blank script line. Arguments past the first are ignored.
    pub fn parse(line: &str) -> Result<Self, StepError> {
        let mut words = line.split_whitespace();
        let verb = words.next().unwrap_or_default();
        let arg = words.next();

        match verb {
            "SEND" => arg
                .map(|cmd| Step::Send(cmd.to_string()))
                .ok_or(StepError::MissingCommand),
            "SLEEP" => {
                let arg = arg.ok_or(StepError::MissingDuration)?;
                parse_duration(arg)
                    .map(Step::Sleep)
                    .map_err(StepError::Duration)
            }
            "WAIT" => arg
                .map(|event| Step::Wait(event.to_string()))
                .ok_or(StepError::MissingEvent),
            other => Err(StepError::Unknown(other.to_string())),
        }
    }
}

/// Connect to `addr` and play the script on stdin, echoing to stdout.
pub async fn play_stdin(addr: &str) -> Result<(), PlayError> {
    let mut client = Client::connect(addr).await.map_err(PlayError::Connect)?;
    let script = BufReader::new(tokio::io::stdin());
    let mut out = io::stdout();

    let result = run(&mut client, script, &mut out).await;
    if let Err(err) = client.close().await {
        tracing::debug!(error = %err, "closing connection");
    }
    result
}

/// Execute `script` against a connected client.
pub async fn run<R, W>(client: &mut Client, script: R, out: &mut W) -> Result<(), PlayError>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = script.lines();
    let mut number = 0;

    while let Some(raw) = lines.next_line().await.map_err(PlayError::Read)? {
        number += 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        echo(out, '>', line).map_err(PlayError::Output)?;
        let step = Step::parse(line).map_err(|kind| PlayError::Step { line: number, kind })?;
        execute(client, step, out)
            .await
            .map_err(|err| match err {
                Failure::Step(kind) => PlayError::Step { line: number, kind },
                Failure::Output(err) => PlayError::Output(err),
            })?;
    }

    Ok(())
}

enum Failure {
    Step(StepError),
    Output(io::Error),
}

async fn execute<W: Write>(client: &mut Client, step: Step, out: &mut W) -> Result<(), Failure> {
    match step {
        Step::Send(cmd) => client
            .send(&cmd)
            .await
            .map_err(|err| Failure::Step(StepError::Send(err))),
        Step::Sleep(duration) => {
            tokio::time::sleep(duration).await;
            Ok(())
        }
        Step::Wait(event) => loop {
            let received = client
                .recv()
                .await
                .map_err(|err| Failure::Step(StepError::Recv(err)))?;
            echo(out, '<', &received).map_err(Failure::Output)?;
            if received == event {
                return Ok(());
            }
        },
    }
}

fn echo<W: Write>(out: &mut W, marker: char, text: &str) -> io::Result<()> {
    writeln!(out, "{marker} {text}")?;
    out.flush()
}

/// Parse a duration such as `300ms`, `1.5h` or `2h45m`.
///
/// Units are `ns`, `us` (or `µs`), `ms`, `s`, `m` and `h`. A bare `0` is
/// allowed. Negative durations are accepted and clamp to zero.
pub fn parse_duration(input: &str) -> Result<Duration, DurationError> {
    let invalid = || DurationError::Invalid(input.to_string());

    let mut rest = input;
    let mut negative = false;
    if let Some(stripped) = rest.strip_prefix('-') {
        negative = true;
        rest = stripped;
    } else if let Some(stripped) = rest.strip_prefix('+') {
        rest = stripped;
    }

    if rest == "0" {
        return Ok(Duration::ZERO);
    }
    if rest.is_empty() {
        return Err(invalid());
    }

    let mut total: u128 = 0;
    while !rest.is_empty() {
        let (whole, after) = split_digits(rest);
        let (fraction, after) = match after.strip_prefix('.') {
            Some(after) => split_digits(after),
            None => ("", after),
        };
        if whole.is_empty() && fraction.is_empty() {
            return Err(invalid());
        }

        let unit_len = after
            .find(|c: char| c == '.' || c.is_ascii_digit())
            .unwrap_or(after.len());
        let (unit, after) = after.split_at(unit_len);
        let scale = match unit {
            "" => return Err(DurationError::MissingUnit(input.to_string())),
            "ns" => 1,
            "us" | "µs" | "μs" => 1_000,
            "ms" => 1_000_000,
            "s" => 1_000_000_000,
            "m" => 60 * 1_000_000_000,
            "h" => 3_600 * 1_000_000_000,
            _ => {
                return Err(DurationError::UnknownUnit {
                    unit: unit.to_string(),
                    input: input.to_string(),
                })
            }
        };

        let whole: u128 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid())?
        };
        let mut nanos = whole.checked_mul(scale).ok_or_else(invalid)?;

        if !fraction.is_empty() {
            // Digits past nanosecond precision cannot change the result.
            let digits = &fraction[..fraction.len().min(18)];
            let numerator: u128 = digits.parse().map_err(|_| invalid())?;
            let denominator = 10u128.pow(digits.len() as u32);
            nanos = nanos
                .checked_add(numerator * scale / denominator)
                .ok_or_else(invalid)?;
        }

        total = total.checked_add(nanos).ok_or_else(invalid)?;
        rest = after;
    }

    if total > u128::from(u64::MAX) {
        return Err(invalid());
    }
    if negative {
        return Ok(Duration::ZERO);
    }
    Ok(Duration::from_nanos(total as u64))
}

fn split_digits(s: &str) -> (&str, &str) {
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    s.split_at(end)
}

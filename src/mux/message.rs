use std::fmt;

/// Where a message entered the simulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Stdin,
    Ctrl,
    Ticker,
    Signal,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Origin::Stdin => "stdin",
            Origin::Ctrl => "ctrl",
            Origin::Ticker => "ticker",
            Origin::Signal => "signal",
        };
        f.write_str(name)
    }
}

/// One line of input for the multiplexer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub origin: Origin,
    pub payload: String,
}

impl Message {
    pub const EOF: &'static str = "EOF";
    pub const QUIT: &'static str = "Q";
    pub const HELP: &'static str = "H";

    pub fn new(origin: Origin, payload: impl Into<String>) -> Self {
        Self {
            origin,
            payload: payload.into(),
        }
    }

    pub fn is_shutdown(&self) -> bool {
        self.payload == Self::EOF || self.payload == Self::QUIT
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {:?}", self.origin, self.payload)
    }
}

// Core types used across all Kria command channel components
use std::fmt;

// Verb vocabulary. The channel treats verbs as opaque, case-sensitive
// strings; unknown verbs are carried verbatim in Other.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Verb {
    Up,
    Down,
    Left,
    Right,
    Toggle,
    Mode,
    Button,
    Touch,
    Other(String),
}

impl Verb {
    pub fn parse(s: &str) -> Self {
        match s {
            "UP" => Verb::Up,
            "DOWN" => Verb::Down,
            "LEFT" => Verb::Left,
            "RIGHT" => Verb::Right,
            "TOGGLE" => Verb::Toggle,
            "MODE" => Verb::Mode,
            "BUTTON" => Verb::Button,
            "TOUCH" => Verb::Touch,
            other => Verb::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Verb::Up => "UP",
            Verb::Down => "DOWN",
            Verb::Left => "LEFT",
            Verb::Right => "RIGHT",
            Verb::Toggle => "TOGGLE",
            Verb::Mode => "MODE",
            Verb::Button => "BUTTON",
            Verb::Touch => "TOUCH",
            Verb::Other(s) => s,
        }
    }

    // Directional verbs map to movement events
    pub fn is_direction(&self) -> bool {
        matches!(self, Verb::Up | Verb::Down | Verb::Left | Verb::Right)
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// A single command: verb plus ordered string arguments.
// Wire form is "VERB" or "VERB:ARG[:ARG...]".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub verb: Verb,
    pub args: Vec<String>,
}

impl Command {
    pub fn new(verb: Verb) -> Self {
        Command { verb, args: Vec::new() }
    }

    pub fn with_args(verb: Verb, args: Vec<String>) -> Self {
        Command { verb, args }
    }

    pub fn button(name: &str) -> Self {
        Command::with_args(Verb::Button, vec![name.to_string()])
    }

    pub fn touch(x: i32, y: i32) -> Self {
        Command::with_args(Verb::Touch, vec![x.to_string(), y.to_string()])
    }

    pub fn mode(mode: &str) -> Self {
        Command::with_args(Verb::Mode, vec![mode.to_string()])
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.text())
    }
}

// Decode failures. Both variants are recoverable: the transport layer
// logs them and keeps serving.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    // Payload was not valid UTF-8 text
    InvalidEncoding,
    // Zero-length line or datagram
    EmptyCommand,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DecodeError::InvalidEncoding => write!(f, "payload is not valid UTF-8"),
            DecodeError::EmptyCommand => write!(f, "empty command"),
        }
    }
}

impl std::error::Error for DecodeError {}

// Semantic interpretation of a recognized command, emitted as a log
// artifact only. Has no effect on acknowledgment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandEvent {
    Movement(Verb),
    ButtonPressed(String),
    TouchAt(String, String),
    ModeChanged(String),
    Toggled,
}

impl fmt::Display for CommandEvent {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CommandEvent::Movement(dir) => write!(f, "movement: {}", dir),
            CommandEvent::ButtonPressed(name) => write!(f, "button pressed: {}", name),
            CommandEvent::TouchAt(x, y) => write!(f, "touch coordinate: ({}, {})", x, y),
            CommandEvent::ModeChanged(mode) => write!(f, "mode changed: {}", mode),
            CommandEvent::Toggled => write!(f, "mode toggle requested"),
        }
    }
}

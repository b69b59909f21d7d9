//! Command frame codec shared by `cue-bridge` and `cue-cli`.
//!
//! One frame per transport read. A frame is a verb optionally followed by a
//! payload, split on the first `:` only:
//! - `clear` | `play` | `pause` | `stop`
//! - `load:<payload>` (payload is opaque, forwarded to the playback factory)
//! - `cursor:<integer>` (absolute timestamp)

use std::io::{self, Write};

/// Separates the verb from its payload. Only the first occurrence splits.
pub const VERB_DELIMITER: u8 = b':';

/// A decoded command frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Clear,
    Play,
    Pause,
    Stop,
    Load(Vec<u8>),
    Cursor(u64),
}

/// Why a frame could not be turned into a [`Command`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("unknown verb {0:?}")]
    UnknownVerb(String),
    #[error("verb `{0}` takes no argument")]
    UnexpectedArgument(&'static str),
    #[error("verb `{0}` requires an argument")]
    MissingArgument(&'static str),
    #[error("cursor payload {0:?} is not a non-negative integer")]
    InvalidCursor(String),
}

impl Command {
    /// Parse one frame.
    ///
    /// A single trailing line terminator (`\n` or `\r\n`) is ignored so
    /// line-oriented clients can talk to the bridge directly. This applies to
    /// `load` payloads too: a payload that must end in `\n` needs one extra
    /// terminator on the wire, which [`Command::encode`] adds.
    pub fn parse(frame: &[u8]) -> Result<Self, ParseError> {
        let frame = strip_line_terminator(frame);
        let (verb, payload) = split_verb(frame);
        match (verb, payload) {
            (b"clear", None) => Ok(Command::Clear),
            (b"play", None) => Ok(Command::Play),
            (b"pause", None) => Ok(Command::Pause),
            (b"stop", None) => Ok(Command::Stop),
            (b"load", Some(payload)) => Ok(Command::Load(payload.to_vec())),
            (b"cursor", Some(payload)) => parse_cursor(payload).map(Command::Cursor),
            (b"clear", Some(_)) => Err(ParseError::UnexpectedArgument("clear")),
            (b"play", Some(_)) => Err(ParseError::UnexpectedArgument("play")),
            (b"pause", Some(_)) => Err(ParseError::UnexpectedArgument("pause")),
            (b"stop", Some(_)) => Err(ParseError::UnexpectedArgument("stop")),
            (b"load", None) => Err(ParseError::MissingArgument("load")),
            (b"cursor", None) => Err(ParseError::MissingArgument("cursor")),
            (other, _) => Err(ParseError::UnknownVerb(
                String::from_utf8_lossy(other).into_owned(),
            )),
        }
    }

    pub fn verb(&self) -> &'static str {
        match self {
            Command::Clear => "clear",
            Command::Play => "play",
            Command::Pause => "pause",
            Command::Stop => "stop",
            Command::Load(_) => "load",
            Command::Cursor(_) => "cursor",
        }
    }

    /// Encode into a single frame.
    pub fn encode(&self) -> Vec<u8> {
        let verb = self.verb().as_bytes();
        match self {
            Command::Load(payload) => {
                let mut out = Vec::with_capacity(verb.len() + 2 + payload.len());
                out.extend_from_slice(verb);
                out.push(VERB_DELIMITER);
                out.extend_from_slice(payload);
                if payload.ends_with(b"\n") {
                    out.push(b'\n');
                }
                out
            }
            Command::Cursor(timestamp) => {
                let mut out = verb.to_vec();
                out.push(VERB_DELIMITER);
                out.extend_from_slice(timestamp.to_string().as_bytes());
                out
            }
            _ => verb.to_vec(),
        }
    }
}

/// Write a command as one frame.
pub fn write_command(mut w: impl Write, command: &Command) -> io::Result<()> {
    w.write_all(&command.encode())?;
    w.flush()
}

fn split_verb(frame: &[u8]) -> (&[u8], Option<&[u8]>) {
    match frame.iter().position(|&b| b == VERB_DELIMITER) {
        Some(idx) => (&frame[..idx], Some(&frame[idx + 1..])),
        None => (frame, None),
    }
}

fn strip_line_terminator(frame: &[u8]) -> &[u8] {
    match frame.strip_suffix(b"\n") {
        Some(line) => line.strip_suffix(b"\r").unwrap_or(line),
        None => frame,
    }
}

fn parse_cursor(payload: &[u8]) -> Result<u64, ParseError> {
    std::str::from_utf8(payload)
        .ok()
        .and_then(|s| s.trim().parse::<u64>().ok())
        .ok_or_else(|| ParseError::InvalidCursor(String::from_utf8_lossy(payload).into_owned()))
}

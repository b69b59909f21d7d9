//! Shared wire records for `cue-bridge` and `cue-cli`.
//!
//! Replies travel back on the command connection, one record per command.
//! Monitor events are pushed on the separate monitor connection and never
//! answered.

use serde::{Deserialize, Serialize};

/// Outcome of a single command frame.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReplyStatus {
    /// The command was dispatched to the player and applied.
    Completed,
    /// Unknown verb, wrong argument count, or an unusable payload.
    InvalidCommand,
    /// The verb is known but not legal in the player's current state.
    CommandNotAvailable,
}

/// Reply record sent after every command frame: `{"type": "<STATUS>"}`.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Reply {
    #[serde(rename = "type")]
    pub status: ReplyStatus,
}

impl Reply {
    pub const fn new(status: ReplyStatus) -> Self {
        Self { status }
    }

    pub const fn completed() -> Self {
        Self::new(ReplyStatus::Completed)
    }
}

/// Payload of a [`MonitorEvent::TimelineChanged`] record.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimelinePosition {
    /// Timestamp of the action the cursor now points at.
    pub current_timestamp: u64,
}

/// Push-only record on the monitor channel.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MonitorEvent {
    /// The playback cursor moved to an action with a different timestamp.
    TimelineChanged { payload: TimelinePosition },
    /// A karaoke line should be shown by the display.
    Karaoke { text: String },
}

impl MonitorEvent {
    pub fn timeline_changed(current_timestamp: u64) -> Self {
        MonitorEvent::TimelineChanged {
            payload: TimelinePosition { current_timestamp },
        }
    }

    pub fn karaoke(text: impl Into<String>) -> Self {
        MonitorEvent::Karaoke { text: text.into() }
    }
}

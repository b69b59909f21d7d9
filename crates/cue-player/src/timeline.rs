//! Timeline construction.
//!
//! Backends decode their payload into actions and push them here; [`TimelineBuilder::build`]
//! sorts them and fills every positive gap with a [`DelayAction`].

use std::sync::Arc;

use crate::action::{Action, DelayAction, Sleeper};
use crate::playback::Playback;

/// A load payload could not be turned into a timeline.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    #[error("entry {index}: {reason}")]
    MalformedEntry { index: usize, reason: String },
    #[error("entry {index}: timestamp {value:?} is not a non-negative integer")]
    InvalidTimestamp { index: usize, value: String },
}

/// Parse the timestamp field of entry `index`.
pub fn parse_timestamp(index: usize, raw: &[u8]) -> Result<u64, BuildError> {
    std::str::from_utf8(raw)
        .ok()
        .and_then(|s| s.trim().parse::<u64>().ok())
        .ok_or_else(|| BuildError::InvalidTimestamp {
            index,
            value: String::from_utf8_lossy(raw).into_owned(),
        })
}

struct TimelineEntry {
    start: u64,
    duration: u64,
    action: Box<dyn Action>,
}

/// Collects actions and lays them out on a gap-free timeline.
pub struct TimelineBuilder {
    entries: Vec<TimelineEntry>,
    sleeper: Arc<dyn Sleeper>,
}

impl TimelineBuilder {
    pub fn new(sleeper: Arc<dyn Sleeper>) -> Self {
        Self {
            entries: Vec::new(),
            sleeper,
        }
    }

    /// Add an instantaneous action.
    pub fn push(&mut self, action: Box<dyn Action>) {
        self.push_with_duration(action, 0);
    }

    /// Add an action that occupies `duration` units of the timeline.
    pub fn push_with_duration(&mut self, action: Box<dyn Action>, duration: u64) {
        self.entries.push(TimelineEntry {
            start: action.timestamp(),
            duration,
            action,
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sort by start (stable, so equal timestamps keep push order) and
    /// interleave delays for every positive gap, including a leading one.
    pub fn build(self) -> Playback {
        let TimelineBuilder {
            mut entries,
            sleeper,
        } = self;
        entries.sort_by_key(|entry| entry.start);

        let mut actions: Vec<Box<dyn Action>> = Vec::with_capacity(entries.len() * 2);
        let mut cursor = 0u64;
        for entry in entries {
            if entry.start > cursor {
                actions.push(Box::new(DelayAction::new(
                    cursor,
                    entry.start - cursor,
                    sleeper.clone(),
                )));
            }
            actions.push(entry.action);
            cursor = entry.start.saturating_add(entry.duration);
        }
        Playback::new(actions)
    }
}

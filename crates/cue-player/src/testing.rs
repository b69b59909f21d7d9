//! Test doubles shared by the unit tests in this crate.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::anyhow;

use crate::action::{Action, Sleeper};
use crate::playback::{Playback, PlaybackFactory};
use crate::timeline::{BuildError, TimelineBuilder, parse_timestamp};

#[derive(Debug, Default)]
pub(crate) struct RecordingSleeper {
    slept: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub(crate) fn calls(&self) -> Vec<Duration> {
        self.slept.lock().unwrap().clone()
    }

    pub(crate) fn total(&self) -> Duration {
        self.calls().iter().sum()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) {
        self.slept.lock().unwrap().push(duration);
    }
}

/// Appends its timestamp to a shared log when executed.
pub(crate) struct RecordingAction {
    pub(crate) timestamp: u64,
    pub(crate) log: Arc<Mutex<Vec<u64>>>,
}

impl Action for RecordingAction {
    fn timestamp(&self) -> u64 {
        self.timestamp
    }

    fn execute(&self) -> anyhow::Result<()> {
        self.log.lock().unwrap().push(self.timestamp);
        Ok(())
    }
}

pub(crate) struct FailingAction {
    pub(crate) timestamp: u64,
}

impl Action for FailingAction {
    fn timestamp(&self) -> u64 {
        self.timestamp
    }

    fn execute(&self) -> anyhow::Result<()> {
        Err(anyhow!("device unplugged"))
    }
}

/// Builds playbacks from comma separated timestamps, e.g. `b"0,500,1000"`.
/// A `!` suffix makes that action fail when executed.
pub(crate) struct TimestampFactory {
    pub(crate) log: Arc<Mutex<Vec<u64>>>,
    pub(crate) sleeper: Arc<RecordingSleeper>,
}

impl TimestampFactory {
    pub(crate) fn new() -> Self {
        Self {
            log: Arc::new(Mutex::new(Vec::new())),
            sleeper: Arc::new(RecordingSleeper::default()),
        }
    }

    pub(crate) fn executed(&self) -> Vec<u64> {
        self.log.lock().unwrap().clone()
    }
}

impl PlaybackFactory for TimestampFactory {
    fn create_playback(&self, source: &[u8]) -> Result<Playback, BuildError> {
        let mut builder = TimelineBuilder::new(self.sleeper.clone());
        if source.is_empty() {
            return Ok(builder.build());
        }
        for (index, entry) in source.split(|&b| b == b',').enumerate() {
            if let Some(raw) = entry.strip_suffix(b"!") {
                let timestamp = parse_timestamp(index, raw)?;
                builder.push(Box::new(FailingAction { timestamp }));
            } else {
                let timestamp = parse_timestamp(index, entry)?;
                builder.push(Box::new(RecordingAction {
                    timestamp,
                    log: self.log.clone(),
                }));
            }
        }
        Ok(builder.build())
    }
}

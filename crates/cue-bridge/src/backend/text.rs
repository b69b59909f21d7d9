use std::sync::Arc;

use cue_bridge_types::MonitorEvent;
use cue_player::{
    Action, BuildError, MonitorSink, Playback, PlaybackFactory, Sleeper, TimelineBuilder,
    TimelineNotifier, timeline::parse_timestamp,
};

use super::{SharedWriter, entries, finish, write_locked};

pub const ENTRY_SEPARATOR: u8 = b'&';
pub const FIELD_SEPARATOR: u8 = b':';

/// Prints its text as one console line.
struct PrintAction {
    timestamp: u64,
    text: String,
    console: SharedWriter,
}

impl Action for PrintAction {
    fn timestamp(&self) -> u64 {
        self.timestamp
    }

    fn execute(&self) -> anyhow::Result<()> {
        write_locked(&self.console, &[self.text.as_bytes(), b"\n"])
    }
}

/// Pushes a karaoke line to the monitor channel.
struct KaraokeAction {
    timestamp: u64,
    text: String,
    monitor: Arc<dyn MonitorSink>,
}

impl Action for KaraokeAction {
    fn timestamp(&self) -> u64 {
        self.timestamp
    }

    fn execute(&self) -> anyhow::Result<()> {
        self.monitor.publish(MonitorEvent::karaoke(self.text.clone()));
        Ok(())
    }
}

/// Builds playbacks from `ts:text` / `ts:tag:text` entries joined by `&`.
///
/// An empty tag (or no tag) prints to the console; any other tag shows the
/// text on the karaoke display.
pub struct TextPlaybackFactory {
    console: SharedWriter,
    monitor: Arc<dyn MonitorSink>,
    sleeper: Arc<dyn Sleeper>,
    notifier: Arc<TimelineNotifier<dyn MonitorSink>>,
}

impl TextPlaybackFactory {
    pub fn new(console: SharedWriter, monitor: Arc<dyn MonitorSink>, sleeper: Arc<dyn Sleeper>) -> Self {
        Self {
            notifier: Arc::new(TimelineNotifier::new(monitor.clone())),
            console,
            monitor,
            sleeper,
        }
    }

    fn action(&self, index: usize, entry: &[u8]) -> Result<Box<dyn Action>, BuildError> {
        let fields: Vec<&[u8]> = entry.splitn(3, |&b| b == FIELD_SEPARATOR).collect();
        let (timestamp, tag, text) = match fields.as_slice() {
            [timestamp, text] => (*timestamp, &b""[..], *text),
            [timestamp, tag, text] => (*timestamp, *tag, *text),
            _ => {
                return Err(BuildError::MalformedEntry {
                    index,
                    reason: "expected `timestamp:text` or `timestamp:tag:text`".to_string(),
                });
            }
        };
        let timestamp = parse_timestamp(index, timestamp)?;
        let text = String::from_utf8_lossy(text).into_owned();

        if tag.is_empty() {
            Ok(Box::new(PrintAction {
                timestamp,
                text,
                console: self.console.clone(),
            }))
        } else {
            Ok(Box::new(KaraokeAction {
                timestamp,
                text,
                monitor: self.monitor.clone(),
            }))
        }
    }
}

impl PlaybackFactory for TextPlaybackFactory {
    fn create_playback(&self, source: &[u8]) -> Result<Playback, BuildError> {
        let mut builder = TimelineBuilder::new(self.sleeper.clone());
        for (index, entry) in entries(source, ENTRY_SEPARATOR) {
            builder.push(self.action(index, entry)?);
        }
        Ok(finish(builder, &self.notifier))
    }
}

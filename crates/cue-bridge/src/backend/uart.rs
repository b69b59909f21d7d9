use std::sync::Arc;

use cue_player::{
    Action, BuildError, MonitorSink, Playback, PlaybackFactory, Sleeper, TimelineBuilder,
    TimelineNotifier, timeline::parse_timestamp,
};

use super::{SharedWriter, entries, finish, write_locked};

pub const ENTRY_SEPARATOR: u8 = b'#';
pub const FIELD_SEPARATOR: u8 = b'.';
/// Terminates every frame written to the device.
pub const FINISH_MARKER: &[u8] = b"\n";

struct UartSendAction {
    timestamp: u64,
    payload: Vec<u8>,
    port: SharedWriter,
}

impl Action for UartSendAction {
    fn timestamp(&self) -> u64 {
        self.timestamp
    }

    fn execute(&self) -> anyhow::Result<()> {
        tracing::trace!(timestamp = self.timestamp, bytes = self.payload.len(), "uart write");
        write_locked(&self.port, &[&self.payload, FINISH_MARKER])
    }
}

/// Builds playbacks from `ts.bytes` entries joined by `#`.
///
/// Everything after the first `.` is sent verbatim, so payloads may contain
/// dots of their own.
pub struct UartPlaybackFactory {
    port: SharedWriter,
    sleeper: Arc<dyn Sleeper>,
    notifier: Arc<TimelineNotifier<dyn MonitorSink>>,
}

impl UartPlaybackFactory {
    pub fn new(port: SharedWriter, monitor: Arc<dyn MonitorSink>, sleeper: Arc<dyn Sleeper>) -> Self {
        Self {
            port,
            sleeper,
            notifier: Arc::new(TimelineNotifier::new(monitor)),
        }
    }

    fn action(&self, index: usize, entry: &[u8]) -> Result<Box<dyn Action>, BuildError> {
        let Some(split) = entry.iter().position(|&b| b == FIELD_SEPARATOR) else {
            return Err(BuildError::MalformedEntry {
                index,
                reason: "expected `timestamp.bytes`".to_string(),
            });
        };
        let timestamp = parse_timestamp(index, &entry[..split])?;
        Ok(Box::new(UartSendAction {
            timestamp,
            payload: entry[split + 1..].to_vec(),
            port: self.port.clone(),
        }))
    }
}

impl PlaybackFactory for UartPlaybackFactory {
    fn create_playback(&self, source: &[u8]) -> Result<Playback, BuildError> {
        let mut builder = TimelineBuilder::new(self.sleeper.clone());
        for (index, entry) in entries(source, ENTRY_SEPARATOR) {
            builder.push(self.action(index, entry)?);
        }
        Ok(finish(builder, &self.notifier))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{RecordingSleeper, SharedBuffer, VecMonitor};
    use cue_bridge_types::MonitorEvent;
    use std::time::Duration;

    fn factory() -> (UartPlaybackFactory, SharedBuffer, Arc<RecordingSleeper>, Arc<VecMonitor>) {
        let port = SharedBuffer::default();
        let sleeper = Arc::new(RecordingSleeper::default());
        let monitor = Arc::new(VecMonitor::default());
        let factory = UartPlaybackFactory::new(port.writer(), monitor.clone(), sleeper.clone());
        (factory, port, sleeper, monitor)
    }

    #[test]
    fn writes_frames_in_timestamp_order() {
        let (factory, port, sleeper, monitor) = factory();
        let mut playback = factory.create_playback(b"250.B#0.A#250.C").unwrap();
        while playback.execute_action().is_ok() {}

        assert_eq!(port.bytes(), b"A\nB\nC\n".to_vec());
        assert_eq!(sleeper.calls(), vec![Duration::from_millis(250)]);
        assert_eq!(
            monitor.events(),
            vec![MonitorEvent::timeline_changed(0), MonitorEvent::timeline_changed(250)]
        );
    }

    #[test]
    fn payload_keeps_later_dots_and_raw_bytes() {
        let (factory, port, _, _) = factory();
        let mut playback = factory.create_playback(b"0.1.5\xff").unwrap();
        playback.execute_action().unwrap();
        assert_eq!(port.bytes(), b"1.5\xff\n".to_vec());
    }

    #[test]
    fn blank_entries_are_skipped() {
        let (factory, _, _, _) = factory();
        let playback = factory.create_playback(b"#0.A##").unwrap();
        assert_eq!(playback.len(), 1);
    }

    #[test]
    fn rejects_entries_without_timestamp() {
        let (factory, _, _, _) = factory();
        assert!(matches!(
            factory.create_playback(b"0.A#B"),
            Err(BuildError::MalformedEntry { index: 1, .. })
        ));
        assert!(matches!(
            factory.create_playback(b"-5.A"),
            Err(BuildError::InvalidTimestamp { index: 0, .. })
        ));
    }
}

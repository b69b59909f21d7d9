//! Test doubles shared by the bridge's unit tests.

use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use cue_bridge_types::{MonitorEvent, Reply, ReplyStatus};
use cue_player::{MonitorSink, Player, Sleeper};

use crate::backend::{Backend, SharedWriter};
use crate::session::{Poll, Transport};

pub struct NoopSleeper;

impl Sleeper for NoopSleeper {
    fn sleep(&self, _duration: Duration) {}
}

#[derive(Default)]
pub struct RecordingSleeper {
    calls: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn calls(&self) -> Vec<Duration> {
        self.calls.lock().unwrap().clone()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) {
        self.calls.lock().unwrap().push(duration);
    }
}

/// In-memory console / serial port.
#[derive(Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn writer(&self) -> SharedWriter {
        self.0.clone()
    }

    pub fn bytes(&self) -> Vec<u8> {
        self.0.lock().unwrap().clone()
    }

    pub fn text(&self) -> String {
        String::from_utf8(self.bytes()).unwrap()
    }
}

#[derive(Default)]
pub struct VecMonitor {
    events: Mutex<Vec<MonitorEvent>>,
}

impl VecMonitor {
    pub fn events(&self) -> Vec<MonitorEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl MonitorSink for VecMonitor {
    fn publish(&self, event: MonitorEvent) {
        self.events.lock().unwrap().push(event);
    }
}

/// Replays a fixed sequence of polls, then reports the peer gone.
pub struct ScriptedTransport {
    polls: VecDeque<Poll>,
    pub sent: Vec<u8>,
}

impl ScriptedTransport {
    pub fn new(frames: &[&[u8]]) -> Self {
        Self {
            polls: frames.iter().map(|f| Poll::Frame(f.to_vec())).collect(),
            sent: Vec::new(),
        }
    }

    pub fn push_idle(&mut self, count: usize) {
        self.polls.extend(std::iter::repeat_n(Poll::Idle, count));
    }
}

impl Transport for ScriptedTransport {
    fn poll(&mut self) -> Poll {
        self.polls.pop_front().unwrap_or(Poll::Closed)
    }

    fn send(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.sent.extend_from_slice(bytes);
        Ok(())
    }
}

/// Decode every newline-delimited reply a transport has sent.
pub fn replies(transport: &ScriptedTransport) -> Vec<ReplyStatus> {
    transport
        .sent
        .split(|&b| b == b'\n')
        .filter(|line| !line.is_empty())
        .map(|line| serde_json::from_slice::<Reply>(line).unwrap().status)
        .collect()
}

/// A player on the text backend with an in-memory console and no real delays.
pub fn text_player(monitor: Arc<VecMonitor>) -> (Player, SharedBuffer) {
    let console = SharedBuffer::default();
    let backend = Backend::Text {
        console: console.writer(),
    };
    let player = Player::new(backend.playback_factory(monitor, Arc::new(NoopSleeper)));
    (player, console)
}

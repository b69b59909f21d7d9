//! Playback backends.
//!
//! A backend decides how a `load` payload is encoded and what its actions do.
//! Every session gets its own factory (and therefore its own timeline
//! notifier); the console or serial device behind it is shared.
//!
//! - `text`: `&`-separated `ts:text` / `ts:tag:text` entries printed to the
//!   console, or pushed to the monitor as karaoke lines when tagged.
//! - `uart`: `#`-separated `ts.bytes` entries written to a serial device.

use std::io::Write;
use std::sync::{Arc, Mutex, Weak};

use cue_player::{
    MonitorSink, Playback, PlaybackFactory, PlaybackObserver, Sleeper, TimelineBuilder,
    TimelineNotifier,
};

mod text;
mod uart;

pub use text::TextPlaybackFactory;
pub use uart::UartPlaybackFactory;

/// Output shared by all sessions of a backend.
pub type SharedWriter = Arc<Mutex<dyn Write + Send>>;

#[derive(Clone)]
pub enum Backend {
    Text { console: SharedWriter },
    Uart { port: SharedWriter },
}

impl Backend {
    pub fn name(&self) -> &'static str {
        match self {
            Backend::Text { .. } => "text",
            Backend::Uart { .. } => "uart",
        }
    }

    pub fn playback_factory(
        &self,
        monitor: Arc<dyn MonitorSink>,
        sleeper: Arc<dyn Sleeper>,
    ) -> Box<dyn PlaybackFactory> {
        match self {
            Backend::Text { console } => {
                Box::new(TextPlaybackFactory::new(console.clone(), monitor, sleeper))
            }
            Backend::Uart { port } => Box::new(UartPlaybackFactory::new(port.clone(), monitor, sleeper)),
        }
    }
}

/// Non-blank entries of `payload`, numbered in order.
fn entries(payload: &[u8], separator: u8) -> impl Iterator<Item = (usize, &[u8])> {
    payload
        .split(move |&b| b == separator)
        .filter(|entry| !entry.iter().all(u8::is_ascii_whitespace))
        .enumerate()
}

/// Build the timeline and attach the factory's notifier to it.
fn finish(builder: TimelineBuilder, notifier: &Arc<TimelineNotifier<dyn MonitorSink>>) -> Playback {
    let mut playback = builder.build();
    notifier.reset();
    playback.subscribe(Arc::downgrade(notifier) as Weak<dyn PlaybackObserver>);
    playback
}

fn write_locked(out: &SharedWriter, chunks: &[&[u8]]) -> anyhow::Result<()> {
    let mut out = out
        .lock()
        .map_err(|_| anyhow::anyhow!("output lock poisoned"))?;
    for chunk in chunks {
        out.write_all(chunk)?;
    }
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_skip_blank_and_edge_separators() {
        let got: Vec<(usize, &[u8])> = entries(b"#0.A##5.B# ", b'#').collect();
        assert_eq!(got, vec![(0, &b"0.A"[..]), (1, &b"5.B"[..])]);
        assert_eq!(entries(b"", b'&').count(), 0);
    }
}

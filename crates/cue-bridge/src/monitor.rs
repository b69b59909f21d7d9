//! Monitor channel sinks.
//!
//! Events are fire-and-forget: a missing or slow display must never hold up
//! playback. The TCP sink hands events to a writer thread through a bounded
//! queue; events are dropped when the queue is full or the display cannot be
//! reached, and a display that stops reading is disconnected after
//! [`MonitorConfig::write_timeout`].

use std::io::Write;
use std::net::{SocketAddr, TcpStream};
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender, TrySendError};
use cue_bridge_types::MonitorEvent;
use cue_player::MonitorSink;

const CONNECT_TIMEOUT: Duration = Duration::from_millis(500);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MonitorConfig {
    pub addr: SocketAddr,
    /// Events buffered for the writer thread before new ones are dropped.
    pub queue_depth: usize,
    /// A write stalled this long drops the connection.
    pub write_timeout: Duration,
}

impl MonitorConfig {
    pub fn new(addr: SocketAddr) -> Self {
        Self {
            addr,
            queue_depth: 256,
            write_timeout: Duration::from_secs(1),
        }
    }
}

/// Pushes newline-delimited JSON events to a display listening on `addr`.
///
/// The connection is opened lazily and reopened after a write failure.
pub struct TcpMonitor {
    tx: Sender<MonitorEvent>,
}

impl TcpMonitor {
    pub fn spawn(config: MonitorConfig) -> Self {
        let (tx, rx) = crossbeam_channel::bounded(config.queue_depth.max(1));
        std::thread::spawn(move || monitor_thread_main(config, rx));
        Self { tx }
    }

    /// Events waiting for the writer thread.
    pub fn pending(&self) -> usize {
        self.tx.len()
    }
}

impl MonitorSink for TcpMonitor {
    fn publish(&self, event: MonitorEvent) {
        match self.tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => tracing::debug!("monitor queue full; event dropped"),
            Err(TrySendError::Disconnected(_)) => {
                tracing::warn!("monitor writer is gone; event dropped")
            }
        }
    }
}

fn monitor_thread_main(config: MonitorConfig, rx: Receiver<MonitorEvent>) {
    let addr = config.addr;
    let mut conn: Option<TcpStream> = None;
    while let Ok(event) = rx.recv() {
        let mut line = match serde_json::to_vec(&event) {
            Ok(line) => line,
            Err(e) => {
                tracing::error!(error = %e, "monitor event encode failed");
                continue;
            }
        };
        line.push(b'\n');

        if conn.is_none() {
            match TcpStream::connect_timeout(&addr, CONNECT_TIMEOUT) {
                Ok(stream) => {
                    stream.set_nodelay(true).ok();
                    if let Err(e) = stream.set_write_timeout(Some(config.write_timeout)) {
                        tracing::warn!(monitor = %addr, error = %e, "cannot bound monitor writes; event dropped");
                        continue;
                    }
                    tracing::info!(monitor = %addr, "monitor connected");
                    conn = Some(stream);
                }
                Err(e) => {
                    tracing::debug!(monitor = %addr, error = %e, "monitor unreachable; event dropped");
                    continue;
                }
            }
        }

        if let Some(stream) = conn.as_mut() {
            if let Err(e) = stream.write_all(&line) {
                tracing::warn!(monitor = %addr, error = %e, "monitor write failed; reconnecting on next event");
                conn = None;
            }
        }
    }
}

/// Logs events instead of sending them anywhere. Used when no monitor
/// address is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogMonitor;

impl MonitorSink for LogMonitor {
    fn publish(&self, event: MonitorEvent) {
        match event {
            MonitorEvent::TimelineChanged { payload } => {
                tracing::info!(current_timestamp = payload.current_timestamp, "timeline changed");
            }
            MonitorEvent::Karaoke { text } => tracing::info!(%text, "karaoke"),
        }
    }
}

//! Progress notification.
//!
//! [`Playback`] broadcasts every cursor mutation to its observers. What gets
//! reported, and how often, is the observer's business.

use std::sync::{Arc, Mutex};

use cue_bridge_types::MonitorEvent;

use crate::playback::Playback;

pub trait PlaybackObserver {
    fn on_cursor_changed(&self, playback: &Playback);
}

/// Destination of push-only monitor events.
pub trait MonitorSink {
    fn publish(&self, event: MonitorEvent);
}

/// Publishes `TIMELINE_CHANGED` whenever the current timestamp differs from
/// the last one it reported.
pub struct TimelineNotifier<S: MonitorSink + ?Sized> {
    last_reported: Mutex<Option<u64>>,
    sink: Arc<S>,
}

impl<S: MonitorSink + ?Sized> TimelineNotifier<S> {
    pub fn new(sink: Arc<S>) -> Self {
        Self {
            last_reported: Mutex::new(None),
            sink,
        }
    }

    /// Forget the last reported timestamp, e.g. when attaching to a new playback.
    pub fn reset(&self) {
        if let Ok(mut last) = self.last_reported.lock() {
            *last = None;
        }
    }

    pub fn last_reported(&self) -> Option<u64> {
        self.last_reported.lock().ok().and_then(|g| *g)
    }
}

impl<S: MonitorSink + ?Sized> PlaybackObserver for TimelineNotifier<S> {
    fn on_cursor_changed(&self, playback: &Playback) {
        // Nothing to report past the end.
        let Ok(current) = playback.current_timestamp() else {
            return;
        };
        let Ok(mut last) = self.last_reported.lock() else {
            return;
        };
        if *last == Some(current) {
            return;
        }
        *last = Some(current);
        drop(last);
        tracing::debug!(current_timestamp = current, "timeline changed");
        self.sink.publish(MonitorEvent::timeline_changed(current));
    }
}

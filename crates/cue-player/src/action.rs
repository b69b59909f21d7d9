//! Timeline actions.
//!
//! An action is one timestamped unit of playback work. Backends provide the
//! real ones (print a line, push a karaoke event, write to a UART); the
//! timeline builder inserts [`DelayAction`]s between them.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// One timestamped step of a timeline.
pub trait Action {
    /// Position on the timeline, in backend units (milliseconds for the shipped backends).
    fn timestamp(&self) -> u64;

    /// Run the side effect.
    fn execute(&self) -> anyhow::Result<()>;

    /// Wait length if this is a synthetic delay.
    fn delay(&self) -> Option<Duration> {
        None
    }
}

impl fmt::Debug for dyn Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.delay() {
            Some(d) => write!(f, "delay@{}({}ms)", self.timestamp(), d.as_millis()),
            None => write!(f, "action@{}", self.timestamp()),
        }
    }
}

/// Blocks the control loop for the length of a delay.
pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

/// Production sleeper backed by [`std::thread::sleep`].
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Synthetic pure wait filling a gap between two real actions.
pub struct DelayAction {
    timestamp: u64,
    duration_ms: u64,
    sleeper: Arc<dyn Sleeper>,
}

impl DelayAction {
    pub fn new(timestamp: u64, duration_ms: u64, sleeper: Arc<dyn Sleeper>) -> Self {
        Self {
            timestamp,
            duration_ms,
            sleeper,
        }
    }
}

impl Action for DelayAction {
    fn timestamp(&self) -> u64 {
        self.timestamp
    }

    fn execute(&self) -> anyhow::Result<()> {
        self.sleeper.sleep(Duration::from_millis(self.duration_ms));
        Ok(())
    }

    fn delay(&self) -> Option<Duration> {
        Some(Duration::from_millis(self.duration_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingSleeper;

    #[test]
    fn delay_action_sleeps_for_its_duration() {
        let sleeper = Arc::new(RecordingSleeper::default());
        let delay = DelayAction::new(250, 750, sleeper.clone());
        delay.execute().unwrap();
        assert_eq!(sleeper.total(), Duration::from_millis(750));
        assert_eq!(delay.timestamp(), 250);
        assert_eq!(delay.delay(), Some(Duration::from_millis(750)));
    }

    #[test]
    fn debug_output_distinguishes_delays() {
        let sleeper: Arc<dyn Sleeper> = Arc::new(RecordingSleeper::default());
        let delay: Box<dyn Action> = Box::new(DelayAction::new(0, 1000, sleeper));
        assert_eq!(format!("{delay:?}"), "delay@0(1000ms)");
    }
}

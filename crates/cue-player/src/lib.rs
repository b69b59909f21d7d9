pub mod action;
pub mod observer;
pub mod playback;
pub mod player;
pub mod state;
pub mod timeline;

#[cfg(test)]
mod testing;

pub use action::{Action, DelayAction, Sleeper, ThreadSleeper};
pub use observer::{MonitorSink, PlaybackObserver, TimelineNotifier};
pub use playback::{Playback, PlaybackError, PlaybackFactory};
pub use player::{Player, PlayerError, Tick};
pub use state::{CommandNotAvailable, PlayerState};
pub use timeline::{BuildError, TimelineBuilder};

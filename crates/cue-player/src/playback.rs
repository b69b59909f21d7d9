//! An ordered timeline plus the cursor that walks it.

use std::sync::Weak;

use crate::action::Action;
use crate::observer::PlaybackObserver;
use crate::timeline::BuildError;

#[derive(Debug, thiserror::Error)]
pub enum PlaybackError {
    /// Cursor is at or past the last action.
    #[error("playback is finished")]
    Finished,
    #[error("playback has no actions")]
    Empty,
    /// The action ran but its side effect failed. The cursor has still advanced.
    #[error("action at {timestamp} failed")]
    Action {
        timestamp: u64,
        #[source]
        source: anyhow::Error,
    },
}

/// Turns a raw `load` payload into a [`Playback`].
pub trait PlaybackFactory {
    fn create_playback(&self, source: &[u8]) -> Result<Playback, BuildError>;
}

/// Immutable, sorted actions and a cursor in `[0, len]`.
///
/// `cursor == len` is the finished condition. Observers are held weakly and
/// notified after every cursor mutation.
pub struct Playback {
    actions: Vec<Box<dyn Action>>,
    cursor: usize,
    observers: Vec<Weak<dyn PlaybackObserver>>,
}

impl Playback {
    /// Sorts once (stable) by timestamp; the order never changes afterwards.
    pub fn new(mut actions: Vec<Box<dyn Action>>) -> Self {
        actions.sort_by_key(|action| action.timestamp());
        Self {
            actions,
            cursor: 0,
            observers: Vec::new(),
        }
    }

    pub fn actions(&self) -> &[Box<dyn Action>] {
        &self.actions
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_finished(&self) -> bool {
        self.cursor >= self.actions.len()
    }

    pub fn current_action(&self) -> Result<&dyn Action, PlaybackError> {
        self.actions
            .get(self.cursor)
            .map(|action| action.as_ref())
            .ok_or(PlaybackError::Finished)
    }

    pub fn current_timestamp(&self) -> Result<u64, PlaybackError> {
        self.current_action().map(|action| action.timestamp())
    }

    pub fn last_timestamp(&self) -> Result<u64, PlaybackError> {
        self.actions
            .last()
            .map(|action| action.timestamp())
            .ok_or(PlaybackError::Empty)
    }

    /// Execute the action under the cursor and advance by one.
    pub fn execute_action(&mut self) -> Result<(), PlaybackError> {
        let action = self.actions.get(self.cursor).ok_or(PlaybackError::Finished)?;
        let timestamp = action.timestamp();
        let outcome = action.execute();
        self.cursor += 1;
        self.notify_observers();
        outcome.map_err(|source| PlaybackError::Action { timestamp, source })
    }

    /// Move the cursor to the first action with `timestamp >= target`, or to
    /// `len` when there is none.
    pub fn set_cursor(&mut self, target: u64) {
        self.cursor = self
            .actions
            .partition_point(|action| action.timestamp() < target);
        self.notify_observers();
    }

    pub fn subscribe(&mut self, observer: Weak<dyn PlaybackObserver>) {
        self.observers.push(observer);
    }

    pub fn unsubscribe(&mut self, observer: &Weak<dyn PlaybackObserver>) {
        self.observers.retain(|o| !Weak::ptr_eq(o, observer));
    }

    pub fn observer_count(&self) -> usize {
        self.observers.iter().filter(|o| o.strong_count() > 0).count()
    }

    fn notify_observers(&mut self) {
        self.observers.retain(|o| o.strong_count() > 0);
        let live: Vec<_> = self.observers.iter().filter_map(Weak::upgrade).collect();
        for observer in live {
            observer.on_cursor_changed(self);
        }
    }
}

impl std::fmt::Debug for Playback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Playback")
            .field("actions", &self.actions)
            .field("cursor", &self.cursor)
            .field("observers", &self.observers.len())
            .finish()
    }
}

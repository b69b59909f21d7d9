//! Finite-state playback controller.

use crate::playback::{Playback, PlaybackError, PlaybackFactory};
use crate::state::{CommandNotAvailable, Effect, PlayerCommand, PlayerState, Transition, transition};
use crate::timeline::BuildError;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlayerError {
    #[error(transparent)]
    NotAvailable(#[from] CommandNotAvailable),
    /// The load payload was malformed; the previous playback is kept.
    #[error("invalid playback source")]
    InvalidPlayback(#[from] BuildError),
}

/// Outcome of an idle-progress tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Nothing ran (not playing).
    Idle,
    /// One action was executed.
    Executed,
    /// The timeline was exhausted; the player rewound and paused.
    Finished,
}

/// Wraps at most one [`Playback`] and gates every command through the
/// transition table.
pub struct Player {
    factory: Box<dyn PlaybackFactory>,
    state: PlayerState,
    playback: Option<Playback>,
}

impl Player {
    pub fn new(factory: Box<dyn PlaybackFactory>) -> Self {
        Self {
            factory,
            state: PlayerState::NoPlayback,
            playback: None,
        }
    }

    pub fn state(&self) -> PlayerState {
        self.state
    }

    pub fn playback(&self) -> Option<&Playback> {
        self.playback.as_ref()
    }

    pub fn current_timestamp(&self) -> Option<u64> {
        self.playback.as_ref()?.current_timestamp().ok()
    }

    pub fn last_timestamp(&self) -> Option<u64> {
        self.playback.as_ref()?.last_timestamp().ok()
    }

    /// Replace the playback with one built from `source`.
    pub fn load_playback(&mut self, source: &[u8]) -> Result<(), PlayerError> {
        self.apply(PlayerCommand::Load(source)).map(|_| ())
    }

    pub fn clear_playback(&mut self) -> Result<(), PlayerError> {
        self.apply(PlayerCommand::Clear).map(|_| ())
    }

    pub fn play(&mut self) -> Result<(), PlayerError> {
        self.apply(PlayerCommand::Play).map(|_| ())
    }

    pub fn pause(&mut self) -> Result<(), PlayerError> {
        self.apply(PlayerCommand::Pause).map(|_| ())
    }

    pub fn stop(&mut self) -> Result<(), PlayerError> {
        self.apply(PlayerCommand::Stop).map(|_| ())
    }

    pub fn set_cursor(&mut self, timestamp: u64) -> Result<(), PlayerError> {
        self.apply(PlayerCommand::SetCursor(timestamp)).map(|_| ())
    }

    /// Idle-progress tick. Legal in every state.
    pub fn next(&mut self) -> Tick {
        match self.apply(PlayerCommand::Next) {
            Ok(tick) => tick,
            Err(e) => {
                tracing::error!(error = %e, "tick rejected");
                Tick::Idle
            }
        }
    }

    fn apply(&mut self, command: PlayerCommand<'_>) -> Result<Tick, PlayerError> {
        let Transition { effect, next } = transition(self.state, command)?;
        let from = self.state;

        let tick = match effect {
            Effect::Build(source) => {
                let playback = self.factory.create_playback(source)?;
                tracing::info!(actions = playback.len(), "playback loaded");
                self.playback = Some(playback);
                self.state = next;
                Tick::Idle
            }
            Effect::Discard => {
                self.playback = None;
                self.state = next;
                Tick::Idle
            }
            Effect::Seek(timestamp) => {
                if let Some(playback) = self.playback.as_mut() {
                    playback.set_cursor(timestamp);
                }
                self.state = next;
                Tick::Idle
            }
            Effect::Execute => self.execute_one(next),
            Effect::None => {
                self.state = next;
                Tick::Idle
            }
        };

        if from != self.state {
            tracing::debug!(from = %from, to = %self.state, command = command.name(), "player state changed");
        }
        Ok(tick)
    }

    fn execute_one(&mut self, next: PlayerState) -> Tick {
        let Some(playback) = self.playback.as_mut() else {
            return Tick::Idle;
        };
        match playback.execute_action() {
            Ok(()) => {
                self.state = next;
                Tick::Executed
            }
            Err(PlaybackError::Action { timestamp, source }) => {
                tracing::warn!(timestamp, "action failed: {source:#}");
                self.state = next;
                Tick::Executed
            }
            Err(PlaybackError::Finished | PlaybackError::Empty) => {
                playback.set_cursor(0);
                self.state = PlayerState::Paused;
                tracing::info!("playback finished");
                Tick::Finished
            }
        }
    }
}

//! Player state machine definition.
//!
//! Legality of every command is a pure function of the current state and the
//! command; [`crate::player::Player`] only carries out the returned effect.

use std::fmt;

/// Player states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayerState {
    /// Nothing loaded. Initial state.
    #[default]
    NoPlayback,
    /// A playback is loaded and ticks are ignored.
    Paused,
    /// A playback is loaded and every tick executes one action.
    Playing,
}

impl PlayerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlayerState::NoPlayback => "no_playback",
            PlayerState::Paused => "paused",
            PlayerState::Playing => "playing",
        }
    }

    pub fn has_playback(&self) -> bool {
        !matches!(self, PlayerState::NoPlayback)
    }
}

impl fmt::Display for PlayerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Command addressed to the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerCommand<'a> {
    Load(&'a [u8]),
    Clear,
    Play,
    Pause,
    Stop,
    SetCursor(u64),
    /// Idle-progress tick.
    Next,
}

impl PlayerCommand<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            PlayerCommand::Load(_) => "load",
            PlayerCommand::Clear => "clear",
            PlayerCommand::Play => "play",
            PlayerCommand::Pause => "pause",
            PlayerCommand::Stop => "stop",
            PlayerCommand::SetCursor(_) => "cursor",
            PlayerCommand::Next => "next",
        }
    }
}

/// What the player has to do to honour a legal command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect<'a> {
    /// Build a brand-new playback from the source, replacing any previous one.
    Build(&'a [u8]),
    /// Drop the current playback.
    Discard,
    Seek(u64),
    /// Execute one action; on exhaustion rewind to 0 and pause.
    Execute,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition<'a> {
    pub effect: Effect<'a>,
    pub next: PlayerState,
}

impl<'a> Transition<'a> {
    const fn to(next: PlayerState, effect: Effect<'a>) -> Self {
        Self { effect, next }
    }
}

/// The command is known but illegal in the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("command `{command}` is not available while {state}")]
pub struct CommandNotAvailable {
    pub command: &'static str,
    pub state: PlayerState,
}

/// The transition table.
pub fn transition(
    state: PlayerState,
    command: PlayerCommand<'_>,
) -> Result<Transition<'_>, CommandNotAvailable> {
    use Effect::*;
    use PlayerCommand as C;
    use PlayerState::*;

    let t = match (state, command) {
        // load always rebuilds; the state is kept except from NoPlayback
        (NoPlayback, C::Load(src)) => Transition::to(Playing, Build(src)),
        (Paused, C::Load(src)) => Transition::to(Paused, Build(src)),
        (Playing, C::Load(src)) => Transition::to(Playing, Build(src)),

        (Paused | Playing, C::Clear) => Transition::to(NoPlayback, Discard),

        (Paused, C::Play) => Transition::to(Playing, None),
        (Playing, C::Play) => Transition::to(Playing, Execute),

        (Playing, C::Pause) => Transition::to(Paused, None),

        (Paused | Playing, C::Stop) => Transition::to(Paused, Seek(0)),

        (Paused, C::SetCursor(ts)) => Transition::to(Paused, Seek(ts)),
        (Playing, C::SetCursor(ts)) => Transition::to(Playing, Seek(ts)),

        (NoPlayback, C::Next) => Transition::to(NoPlayback, None),
        (Paused, C::Next) => Transition::to(Paused, None),
        (Playing, C::Next) => Transition::to(Playing, Execute),

        (NoPlayback, C::Clear | C::Play | C::Pause | C::Stop | C::SetCursor(_))
        | (Paused, C::Pause) => {
            return Err(CommandNotAvailable {
                command: command.name(),
                state,
            });
        }
    };
    Ok(t)
}

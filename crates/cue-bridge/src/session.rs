//! Per-connection protocol loop.
//!
//! A session owns one transport and one [`Player`]. Every call to
//! [`Session::next`] either serves exactly one command frame or, when nothing
//! is pending, advances playback by one tick. Only [`SessionClosed`] ends the
//! loop; every other failure becomes a status reply.

use std::io;
use std::time::Duration;

use cue_bridge_types::{Reply, ReplyStatus};
use cue_player::{Player, PlayerError, Tick};
use cue_proto::Command;

/// Result of polling a transport without blocking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Poll {
    /// No input pending.
    Idle,
    /// One read worth of bytes.
    Frame(Vec<u8>),
    /// Clean end of input (or a dead connection).
    Closed,
}

/// Byte pipe exclusively owned by one session.
pub trait Transport {
    fn poll(&mut self) -> Poll;
    fn send(&mut self, bytes: &[u8]) -> io::Result<()>;
}

/// The transport reached end of input. Normal shutdown, not a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("session closed")]
pub struct SessionClosed;

pub trait Session {
    /// Serve one frame or run one tick.
    fn next(&mut self) -> Result<(), SessionClosed>;

    /// Loop until the transport closes.
    fn run(&mut self) {
        while self.next().is_ok() {}
    }
}

#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// Sleep after a tick that did not execute anything. Zero disables it.
    pub idle_poll: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_poll: Duration::from_millis(5),
        }
    }
}

/// Text-protocol session driving a [`Player`].
pub struct ProtocolSession<T: Transport> {
    transport: T,
    player: Player,
    config: SessionConfig,
}

impl<T: Transport> ProtocolSession<T> {
    pub fn new(transport: T, player: Player, config: SessionConfig) -> Self {
        Self {
            transport,
            player,
            config,
        }
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn tick(&mut self) {
        let tick = self.player.next();
        if tick == Tick::Idle && !self.config.idle_poll.is_zero() {
            std::thread::sleep(self.config.idle_poll);
        }
    }

    fn dispatch(&mut self, frame: &[u8]) -> ReplyStatus {
        let command = match Command::parse(frame) {
            Ok(command) => command,
            Err(e) => {
                tracing::debug!(error = %e, "invalid command");
                return ReplyStatus::InvalidCommand;
            }
        };

        let result = match &command {
            Command::Clear => self.player.clear_playback(),
            Command::Play => self.player.play(),
            Command::Pause => self.player.pause(),
            Command::Stop => self.player.stop(),
            Command::Load(source) => self.player.load_playback(source),
            Command::Cursor(timestamp) => self.player.set_cursor(*timestamp),
        };

        match result {
            Ok(()) => {
                tracing::debug!(command = command.verb(), state = %self.player.state(), "command completed");
                ReplyStatus::Completed
            }
            Err(PlayerError::NotAvailable(e)) => {
                tracing::debug!(error = %e, "command rejected");
                ReplyStatus::CommandNotAvailable
            }
            Err(PlayerError::InvalidPlayback(e)) => {
                tracing::warn!(error = %e, "load rejected");
                ReplyStatus::InvalidCommand
            }
        }
    }

    fn reply(&mut self, status: ReplyStatus) {
        let mut body = match serde_json::to_vec(&Reply::new(status)) {
            Ok(body) => body,
            Err(e) => {
                tracing::error!(error = %e, "reply encode failed");
                return;
            }
        };
        body.push(b'\n');
        // A dead peer shows up as Closed on the next poll.
        if let Err(e) = self.transport.send(&body) {
            tracing::warn!(error = %e, "reply send failed");
        }
    }
}

impl<T: Transport> Session for ProtocolSession<T> {
    fn next(&mut self) -> Result<(), SessionClosed> {
        match self.transport.poll() {
            Poll::Idle => {
                self.tick();
                Ok(())
            }
            Poll::Closed => Err(SessionClosed),
            Poll::Frame(frame) => {
                let status = self.dispatch(&frame);
                self.reply(status);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ScriptedTransport, VecMonitor, replies, text_player};
    use cue_bridge_types::MonitorEvent;
    use cue_player::PlayerState;
    use std::sync::Arc;

    fn session(script: &[&[u8]]) -> (ProtocolSession<ScriptedTransport>, Arc<VecMonitor>) {
        let monitor = Arc::new(VecMonitor::default());
        let (player, _console) = text_player(monitor.clone());
        let transport = ScriptedTransport::new(script);
        let config = SessionConfig {
            idle_poll: Duration::ZERO,
        };
        (ProtocolSession::new(transport, player, config), monitor)
    }

    #[test]
    fn replies_completed_for_legal_commands() {
        let (mut s, _) = session(&[b"load:0:a&10:b", b"pause", b"play", b"stop", b"cursor:10", b"clear"]);
        s.run();
        assert_eq!(replies(s.transport()), vec![ReplyStatus::Completed; 6]);
        assert_eq!(s.player().state(), PlayerState::NoPlayback);
    }

    #[test]
    fn commands_without_playback_are_not_available() {
        let (mut s, _) = session(&[b"play", b"pause", b"stop", b"clear", b"cursor:5"]);
        s.run();
        assert_eq!(replies(s.transport()), vec![ReplyStatus::CommandNotAvailable; 5]);
        assert_eq!(s.player().state(), PlayerState::NoPlayback);
        assert!(s.player().playback().is_none());
    }

    #[test]
    fn invalid_frames_get_invalid_command() {
        let (mut s, _) = session(&[b"rewind", b"play:now", b"load:0:a", b"cursor:abc", b"cursor"]);
        s.run();
        assert_eq!(
            replies(s.transport()),
            vec![
                ReplyStatus::InvalidCommand,
                ReplyStatus::InvalidCommand,
                ReplyStatus::Completed,
                ReplyStatus::InvalidCommand,
                ReplyStatus::InvalidCommand,
            ]
        );
        // the session survived every failure
        assert_eq!(s.player().state(), PlayerState::Playing);
    }

    #[test]
    fn malformed_payload_is_invalid_command() {
        let (mut s, _) = session(&[b"load:abc:x"]);
        s.run();
        assert_eq!(replies(s.transport()), vec![ReplyStatus::InvalidCommand]);
        assert_eq!(s.player().state(), PlayerState::NoPlayback);
    }

    #[test]
    fn idle_polls_drive_playback() {
        let mut transport = ScriptedTransport::new(&[b"load:0:a&0:b"]);
        transport.push_idle(4);
        let monitor = Arc::new(VecMonitor::default());
        let (player, console) = text_player(monitor.clone());
        let mut s = ProtocolSession::new(
            transport,
            player,
            SessionConfig {
                idle_poll: Duration::ZERO,
            },
        );
        s.run();

        assert_eq!(console.text(), "a\nb\n");
        // two actions, the third tick finished and paused, the fourth is a no-op
        assert_eq!(s.player().state(), PlayerState::Paused);
        assert_eq!(s.player().playback().unwrap().cursor(), 0);
        assert_eq!(replies(s.transport()), vec![ReplyStatus::Completed]);
        assert_eq!(monitor.events(), vec![MonitorEvent::timeline_changed(0)]);
    }

    #[test]
    fn closure_ends_run_in_any_state() {
        for script in [&[][..], &[&b"load:0:a"[..]][..], &[&b"load:0:a"[..], &b"pause"[..]][..]] {
            let (mut s, _) = session(script);
            s.run();
            assert_eq!(s.next(), Err(SessionClosed));
        }
    }
}

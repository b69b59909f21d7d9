//! Session scheduling.
//!
//! The engine owns a list of session factories and runs one session at a
//! time, to completion. Factories are polled round-robin, starting after the
//! one that produced the previous session, so a busy listener cannot starve
//! the others.

use std::io;
use std::time::Duration;

use crate::session::Session;

#[derive(Debug, thiserror::Error)]
pub enum FactoryError {
    /// Nothing to accept right now.
    #[error("no session available")]
    Unavailable,
    #[error("session setup failed")]
    Failed(#[source] io::Error),
}

/// Produces sessions, typically one per accepted connection.
pub trait SessionFactory {
    /// Human-readable origin, used in logs.
    fn name(&self) -> String;

    /// Non-blocking: return [`FactoryError::Unavailable`] when there is nobody waiting.
    fn create_session(&mut self) -> Result<Box<dyn Session>, FactoryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("engine has no session factories")]
    NoSessionFactories,
}

#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Sleep after a full pass over the factories produced nothing.
    pub accept_backoff: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            accept_backoff: Duration::from_millis(10),
        }
    }
}

pub struct Engine {
    factories: Vec<Box<dyn SessionFactory>>,
    offset: usize,
    config: EngineConfig,
}

impl Engine {
    pub fn new(factories: Vec<Box<dyn SessionFactory>>, config: EngineConfig) -> Result<Self, EngineError> {
        if factories.is_empty() {
            return Err(EngineError::NoSessionFactories);
        }
        Ok(Self {
            factories,
            offset: 0,
            config,
        })
    }

    /// Serve sessions forever.
    pub fn run(&mut self) -> ! {
        loop {
            self.serve_next();
        }
    }

    /// Wait for the next session and run it until its transport closes.
    pub fn serve_next(&mut self) {
        let mut session = self.create_session();
        session.run();
        tracing::info!("session closed; waiting for the next one");
    }

    /// Block until some factory yields a session.
    pub fn create_session(&mut self) -> Box<dyn Session> {
        loop {
            if let Some(session) = self.try_create_session() {
                return session;
            }
            if !self.config.accept_backoff.is_zero() {
                std::thread::sleep(self.config.accept_backoff);
            }
        }
    }

    /// One pass over every factory, beginning at the rotating offset.
    pub fn try_create_session(&mut self) -> Option<Box<dyn Session>> {
        let count = self.factories.len();
        for step in 0..count {
            let index = (self.offset + step) % count;
            let factory = &mut self.factories[index];
            match factory.create_session() {
                Ok(session) => {
                    tracing::info!(factory = %factory.name(), "session started");
                    self.offset = (index + 1) % count;
                    return Some(session);
                }
                Err(FactoryError::Unavailable) => {}
                Err(e @ FactoryError::Failed(_)) => {
                    tracing::warn!(factory = %factory.name(), "{:#}", anyhow::Error::from(e));
                }
            }
        }
        None
    }
}

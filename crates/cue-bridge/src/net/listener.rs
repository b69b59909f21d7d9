use std::io;
use std::net::{SocketAddr, TcpListener};
use std::sync::Arc;

use cue_player::{MonitorSink, Player, Sleeper};

use super::transport::TcpTransport;
use crate::backend::Backend;
use crate::engine::{FactoryError, SessionFactory};
use crate::session::{ProtocolSession, Session, SessionConfig};

/// Accepts clients on one address; every client gets a fresh player.
pub struct TcpSessionFactory {
    listener: TcpListener,
    local_addr: SocketAddr,
    backend: Backend,
    monitor: Arc<dyn MonitorSink>,
    sleeper: Arc<dyn Sleeper>,
    session: SessionConfig,
}

impl TcpSessionFactory {
    pub fn bind(
        addr: SocketAddr,
        backend: Backend,
        monitor: Arc<dyn MonitorSink>,
        sleeper: Arc<dyn Sleeper>,
        session: SessionConfig,
    ) -> io::Result<Self> {
        let listener = TcpListener::bind(addr)?;
        listener.set_nonblocking(true)?;
        let local_addr = listener.local_addr()?;
        tracing::info!(bind = %local_addr, backend = backend.name(), "listening");
        Ok(Self {
            listener,
            local_addr,
            backend,
            monitor,
            sleeper,
            session,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

impl SessionFactory for TcpSessionFactory {
    fn name(&self) -> String {
        format!("tcp://{}", self.local_addr)
    }

    fn create_session(&mut self) -> Result<Box<dyn Session>, FactoryError> {
        let (stream, peer) = match self.listener.accept() {
            Ok(accepted) => accepted,
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Err(FactoryError::Unavailable),
            Err(e) => return Err(FactoryError::Failed(e)),
        };
        stream.set_nonblocking(false).map_err(FactoryError::Failed)?;
        stream.set_nodelay(true).ok(); // best-effort
        tracing::info!(peer = %peer, bind = %self.local_addr, "client connected");

        let player = Player::new(
            self.backend
                .playback_factory(self.monitor.clone(), self.sleeper.clone()),
        );
        Ok(Box::new(ProtocolSession::new(
            TcpTransport::new(stream, peer),
            player,
            self.session.clone(),
        )))
    }
}

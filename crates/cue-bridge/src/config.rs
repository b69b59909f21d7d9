use std::net::SocketAddr;
use std::path::PathBuf;

pub use crate::engine::EngineConfig;
pub use crate::monitor::MonitorConfig;
pub use crate::session::SessionConfig;

/// Where `load` payloads are sent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BackendConfig {
    /// Print to stdout; tagged entries go to the monitor as karaoke lines.
    Text,
    /// Write frames to a serial device configured as a raw 8N1 line.
    Uart { device: PathBuf, baud: u32 },
}

#[derive(Clone, Debug)]
pub struct ServeConfig {
    /// One session factory per address.
    pub binds: Vec<SocketAddr>,
    pub backend: BackendConfig,
    /// Display to push monitor events to. `None` logs them instead.
    pub monitor: Option<MonitorConfig>,
    pub session: SessionConfig,
    pub engine: EngineConfig,
}

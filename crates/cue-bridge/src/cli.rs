use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};

use crate::config::{BackendConfig, EngineConfig, MonitorConfig, ServeConfig, SessionConfig};

pub const DEFAULT_UART_BAUD: u32 = 115_200;

#[derive(Parser, Debug)]
#[command(name = "cue-bridge", version)]
pub struct Args {
    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Accept controller connections and run their timelines
    Serve(ServeArgs),

    /// Print the timeline a load payload would build, without running it
    Inspect {
        #[arg(long, value_enum, default_value_t = BackendKind::Text)]
        backend: BackendKind,

        /// Payload as it would follow `load:`
        payload: String,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackendKind {
    Text,
    Uart,
}

#[derive(ClapArgs, Debug)]
pub struct ServeArgs {
    /// Command listener address; repeat to listen on several
    #[arg(long = "bind", default_value = "127.0.0.1:6666")]
    pub binds: Vec<SocketAddr>,

    #[arg(long, value_enum, default_value_t = BackendKind::Text)]
    pub backend: BackendKind,

    /// Serial device used by the uart backend
    #[arg(long, default_value = "/dev/ttyAMA0")]
    pub uart_device: PathBuf,

    /// Line speed of the uart backend
    #[arg(long, default_value_t = DEFAULT_UART_BAUD)]
    pub uart_baud: u32,

    /// Display address for timeline and karaoke events
    #[arg(long, default_value = "127.0.0.1:6667")]
    pub monitor: SocketAddr,

    /// Log monitor events instead of sending them
    #[arg(long)]
    pub no_monitor: bool,

    /// Sleep between idle ticks, in milliseconds (0 spins)
    #[arg(long, default_value_t = 5)]
    pub idle_poll_ms: u64,

    /// Sleep after a pass over all listeners found no client, in milliseconds
    #[arg(long, default_value_t = 10)]
    pub accept_backoff_ms: u64,
}

impl BackendKind {
    pub fn config(self, uart_device: PathBuf, uart_baud: u32) -> BackendConfig {
        match self {
            BackendKind::Text => BackendConfig::Text,
            BackendKind::Uart => BackendConfig::Uart {
                device: uart_device,
                baud: uart_baud,
            },
        }
    }
}

impl From<ServeArgs> for ServeConfig {
    fn from(args: ServeArgs) -> Self {
        ServeConfig {
            binds: args.binds,
            backend: args.backend.config(args.uart_device, args.uart_baud),
            monitor: (!args.no_monitor).then(|| MonitorConfig::new(args.monitor)),
            session: SessionConfig {
                idle_poll: Duration::from_millis(args.idle_poll_ms),
            },
            engine: EngineConfig {
                accept_backoff: Duration::from_millis(args.accept_backoff_ms),
            },
        }
    }
}

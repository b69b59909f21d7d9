use std::io::Write;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cue_bridge::{cli, config::ServeConfig, runtime};

fn main() -> Result<()> {
    let args = cli::Args::parse();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,cue_bridge=info")),
        )
        .init();

    match args.cmd {
        cli::Command::Serve(serve) => runtime::run_serve(ServeConfig::from(serve), true),
        cli::Command::Inspect { backend, payload } => {
            let backend = backend.config(Default::default(), cli::DEFAULT_UART_BAUD);
            let mut stdout = std::io::stdout().lock();
            runtime::inspect(&backend, payload.as_bytes(), &mut stdout)?;
            stdout.flush()?;
            Ok(())
        }
    }
}

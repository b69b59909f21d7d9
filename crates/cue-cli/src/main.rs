//! `cue-cli` — operator tools for `cue-bridge`.
//!
//! - `send`: read commands from stdin, one per line, and print each reply.
//! - `monitor`: act as the display and print every monitor event.

use std::io::{self, BufRead, BufReader, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use cue_bridge_types::{MonitorEvent, Reply};
use cue_proto::{Command, write_command};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "cue-cli", version)]
struct Args {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Send commands read from stdin and print the replies
    Send {
        /// Address of the bridge, e.g. 192.168.1.10:6666
        #[arg(long, default_value = "127.0.0.1:6666")]
        server: SocketAddr,

        /// Send lines as-is instead of validating them first
        #[arg(long)]
        raw: bool,
    },

    /// Listen for monitor events and print them
    Monitor {
        #[arg(long, default_value = "127.0.0.1:6667")]
        bind: SocketAddr,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,cue_cli=info")))
        .init();

    match args.cmd {
        Cmd::Send { server, raw } => send(server, raw),
        Cmd::Monitor { bind } => monitor(bind),
    }
}

/// Request/response: the bridge treats every read as one frame, so wait for
/// each reply before sending the next line.
fn send(server: SocketAddr, raw: bool) -> Result<()> {
    let mut stream = TcpStream::connect(server).with_context(|| format!("connect {server}"))?;
    stream.set_nodelay(true).ok();
    let mut replies = BufReader::new(stream.try_clone().context("clone stream")?);
    tracing::info!(server = %server, "connected");

    for line in io::stdin().lock().lines() {
        let line = line.context("read stdin")?;
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }
        match send_line(&mut stream, line, raw) {
            Ok(()) => {}
            Err(SendError::Invalid(e)) => {
                eprintln!("skipped {line:?}: {e}");
                continue;
            }
            Err(SendError::Io(e)) => return Err(e).context("send command"),
        }

        let mut reply = String::new();
        if replies.read_line(&mut reply).context("read reply")? == 0 {
            bail!("bridge closed the connection");
        }
        let reply: Reply = serde_json::from_str(reply.trim_end()).context("decode reply")?;
        println!("{:?}", reply.status);
    }
    Ok(())
}

enum SendError {
    Invalid(cue_proto::ParseError),
    Io(io::Error),
}

/// Write one stdin line as a single frame.
fn send_line(mut w: impl Write, line: &str, raw: bool) -> Result<(), SendError> {
    if raw {
        w.write_all(line.as_bytes()).map_err(SendError::Io)?;
        return w.flush().map_err(SendError::Io);
    }
    let command = Command::parse(line.as_bytes()).map_err(SendError::Invalid)?;
    write_command(w, &command).map_err(SendError::Io)
}

fn monitor(bind: SocketAddr) -> Result<()> {
    let listener = TcpListener::bind(bind).with_context(|| format!("bind {bind}"))?;
    tracing::info!(bind = %bind, "waiting for the bridge");
    loop {
        let (stream, peer) = match listener.accept() {
            Ok(accepted) => accepted,
            Err(e) => {
                tracing::warn!("accept error: {e}");
                continue;
            }
        };
        tracing::info!(peer = %peer, "bridge connected");
        for line in BufReader::new(stream).lines() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    tracing::warn!("read error: {e}");
                    break;
                }
            };
            match serde_json::from_str::<MonitorEvent>(&line) {
                Ok(event) => println!("{}", describe(&event)),
                Err(e) => tracing::warn!(%line, "unrecognised event: {e}"),
            }
        }
        tracing::info!(peer = %peer, "bridge disconnected");
    }
}

fn describe(event: &MonitorEvent) -> String {
    match event {
        MonitorEvent::TimelineChanged { payload } => format!("@{}", payload.current_timestamp),
        MonitorEvent::Karaoke { text } => format!("♪ {text}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sent(line: &str, raw: bool) -> Vec<u8> {
        let mut out = Vec::new();
        assert!(send_line(&mut out, line, raw).is_ok());
        out
    }

    #[test]
    fn validated_frames_are_normalised() {
        assert_eq!(sent("cursor: 42", false), b"cursor:42");
        assert_eq!(sent("load:0:a&5:b", false), b"load:0:a&5:b");
        assert_eq!(sent("rewind", true), b"rewind");
    }

    #[test]
    fn invalid_lines_are_not_sent() {
        let mut out = Vec::new();
        assert!(matches!(
            send_line(&mut out, "rewind", false),
            Err(SendError::Invalid(_))
        ));
        assert!(out.is_empty());
    }

    #[test]
    fn describes_events() {
        assert_eq!(describe(&MonitorEvent::timeline_changed(250)), "@250");
        assert_eq!(describe(&MonitorEvent::karaoke("hey")), "♪ hey");
    }
}

//! Remote-controlled cue sequencer.
//!
//! A controller connects over TCP, loads a timeline of timestamped actions
//! and drives it with `play` / `pause` / `stop` / `cursor`. Progress and
//! karaoke lines are pushed to a separate display (the monitor).

pub mod backend;
pub mod cli;
pub mod config;
pub mod engine;
pub mod monitor;
pub mod net;
pub mod runtime;
pub mod session;

#[cfg(test)]
mod testing;

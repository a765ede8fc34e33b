//! Sequencer program assembler and command codec for Andes CCD controllers.
//!
//! Programs are built from [`sequencer::Mode`]s of [`sequencer::TimingState`]s, compiled by a
//! [`sequencer::ProgramAssembler`] and sent to the controller as [`command::Command`]s, either
//! through a [`session::Session`] or rendered as a hex dump.

pub mod codec;
pub mod command;
pub mod config;
pub mod error;
pub mod hex_parser;
pub mod labels;
pub mod observer;
pub mod response;
pub mod sequencer;
pub mod session;

pub use command::{Command, CommandEncoder};
pub use config::{ByteOrder, SessionConfig};
pub use error::{Error, Result};
pub use labels::PinLabels;
pub use sequencer::{CompiledProgram, Mode, Nesting, ProgramAssembler, TimingState};
pub use session::Session;

#[cfg(test)]
mod tests;

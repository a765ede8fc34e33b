//! Sequencer programs.
//!
//! The sequencer memory is 1024 lines of 96 bits. Each line is either a mode header or a timing
//! state, told apart by the top byte of the line:
//!
//! ```text
//! header  | 95..88 | 87..72      | 71..56     | 55..40       | 39..32    | 31..16    | 15..0       |
//!         | 0x80   | state count | loop count | nested loops | is nested | next addr | parent addr |
//!
//! state   | 95..88 | 87..24                   | 23..0                                          |
//!         | 0x00   | pin values               | hold time                                      |
//! ```
//!
//! The last address (0x3FF) is never written and marks a missing next or parent mode.

mod assembler;
mod mode;
mod program;
mod state;

pub use assembler::ProgramAssembler;
pub use mode::{Mode, ModeHeader, Nesting};
pub use program::{disassemble_words, CompiledProgram, TraceStep};
pub use state::TimingState;

use crate::error::{Error, Result};
use thiserror::Error;

/// Width of the pin vector of a state
pub const MAX_PINS: usize = 64;
/// Largest hold time of a state, in sequencer clock ticks
pub const MAX_HOLD_TIME: u32 = (1 << 24) - 1;
/// Largest loop and nested loop count of a mode
pub const MAX_LOOPS: u32 = u16::MAX as u32;
/// Largest number of states a single mode may hold
pub const MAX_STATES_PER_MODE: usize = 1023;
/// Number of usable sequencer memory lines
pub const MEMORY_CAPACITY: usize = 1023;
/// Address used for "no mode", the sequencer halts when jumping there
pub const INVALID_ADDRESS: u16 = 0x3FF;

pub(crate) const HEADER_TAG: u8 = 0x80;
pub(crate) const STATE_TAG: u8 = 0x00;
const WORD_BITS: u32 = 96;

pub(crate) fn tag_of(word: u128) -> u8 {
    (word >> (WORD_BITS - 8)) as u8
}

/// Structural problem found while compiling a program
#[derive(Error, PartialEq, Eq, Debug, Clone)]
pub enum Issue {
    #[error("Next mode {next:?} for mode {mode:?} does not exist")]
    UnknownNextMode { mode: String, next: String },
    #[error("Parent mode {parent:?} for mode {mode:?} does not exist")]
    UnknownParentMode { mode: String, parent: String },
    #[error("Double nested modes detected: {mode:?} in {parent:?} in {grandparent:?}")]
    DoubleNesting {
        mode: String,
        parent: String,
        grandparent: String,
    },
}

/// One line of sequencer memory
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum Word {
    Header(ModeHeader),
    State(TimingState),
}

impl Word {
    pub fn encode(&self) -> u128 {
        match self {
            Word::Header(h) => h.encode(),
            Word::State(s) => s.encode(),
        }
    }

    pub fn decode(word: u128) -> Result<Word> {
        if word >> WORD_BITS != 0 {
            return Err(Error::InvalidWord(word));
        }
        match tag_of(word) {
            HEADER_TAG => ModeHeader::decode(word).map(Word::Header),
            STATE_TAG => TimingState::decode(word).map(Word::State),
            _ => Err(Error::InvalidWord(word)),
        }
    }

    pub fn is_header(&self) -> bool {
        matches!(self, Word::Header(_))
    }
}

impl From<ModeHeader> for Word {
    fn from(h: ModeHeader) -> Self {
        Word::Header(h)
    }
}

impl From<TimingState> for Word {
    fn from(s: TimingState) -> Self {
        Word::State(s)
    }
}

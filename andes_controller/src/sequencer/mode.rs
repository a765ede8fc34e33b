use super::{
    tag_of, TimingState, HEADER_TAG, INVALID_ADDRESS, MAX_LOOPS, MAX_STATES_PER_MODE,
};
use crate::error::{Error, Result};
use std::collections::HashMap;

/// Marks a mode as running inside the loop of a parent mode
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct Nesting {
    pub parent: String,
    /// Times control goes back to the parent before moving on to the next mode
    pub nested_loop_count: u32,
}

impl Nesting {
    pub fn new(parent: impl Into<String>, nested_loop_count: u32) -> Self {
        Nesting {
            parent: parent.into(),
            nested_loop_count,
        }
    }
}

/// A named sequence of states run as a loop.
///
/// `loop_count` of 0 repeats the states forever, otherwise they are played `loop_count` times
/// before jumping to `next_mode`. A nested mode returns to its parent `nested_loop_count` times
/// before it falls through to `next_mode`, only one level of nesting is possible.
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct Mode {
    name: String,
    loop_count: u16,
    next_mode: Option<String>,
    parent_mode: Option<String>,
    nested_loop_count: u16,
    states: Vec<TimingState>,
}

fn check_loops(field: &'static str, value: u32, min: u32) -> Result<u16> {
    if value < min || value > MAX_LOOPS {
        return Err(Error::OutOfRange {
            field,
            value: value.into(),
            min: min.into(),
            max: MAX_LOOPS.into(),
        });
    }
    Ok(value as u16)
}

impl Mode {
    pub fn new(
        name: impl Into<String>,
        loop_count: u32,
        next_mode: Option<&str>,
        nesting: Option<Nesting>,
    ) -> Result<Self> {
        let loop_count = check_loops("loop_count", loop_count, 0)?;
        let (parent_mode, nested_loop_count) = match nesting {
            Some(n) => (
                Some(n.parent),
                check_loops("nested_loop_count", n.nested_loop_count, 1)?,
            ),
            None => (None, 0),
        };
        Ok(Mode {
            name: name.into(),
            loop_count,
            next_mode: next_mode.map(str::to_string),
            parent_mode,
            nested_loop_count,
            states: Vec::new(),
        })
    }

    pub fn add_state(&mut self, state: TimingState) -> Result<()> {
        if self.states.len() >= MAX_STATES_PER_MODE {
            return Err(Error::TooManyStates(self.name.clone()));
        }
        self.states.push(state);
        Ok(())
    }

    /// Appends states in order, stopping at the first one that does not fit
    pub fn add_states<I: IntoIterator<Item = TimingState>>(&mut self, states: I) -> Result<()> {
        states.into_iter().try_for_each(|s| self.add_state(s))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn loop_count(&self) -> u16 {
        self.loop_count
    }

    pub fn next_mode(&self) -> Option<&str> {
        self.next_mode.as_deref()
    }

    pub fn parent_mode(&self) -> Option<&str> {
        self.parent_mode.as_deref()
    }

    pub fn nested_loop_count(&self) -> u16 {
        self.nested_loop_count
    }

    pub fn states(&self) -> &[TimingState] {
        &self.states
    }

    pub fn is_nested(&self) -> bool {
        self.parent_mode.is_some()
    }

    /// Resolves mode references into the header stored in sequencer memory
    pub fn header(&self, addresses: &HashMap<String, u16>) -> Result<ModeHeader> {
        let resolve = |name: Option<&str>| -> Result<u16> {
            match name {
                Some(n) => addresses
                    .get(n)
                    .copied()
                    .ok_or_else(|| Error::UnknownMode(n.to_string())),
                None => Ok(INVALID_ADDRESS),
            }
        };
        Ok(ModeHeader {
            // Bounded by MAX_STATES_PER_MODE
            state_count: self.states.len() as u16,
            loop_count: self.loop_count,
            nested_loop_count: self.nested_loop_count,
            is_nested: self.is_nested(),
            next_address: resolve(self.next_mode())?,
            parent_address: resolve(self.parent_mode())?,
        })
    }

    pub fn encode(&self, addresses: &HashMap<String, u16>) -> Result<u128> {
        self.header(addresses).map(|h| h.encode())
    }
}

/// Mode header as stored in sequencer memory, with every reference already resolved
#[derive(PartialEq, Eq, Debug, Clone, Copy, Hash)]
pub struct ModeHeader {
    pub state_count: u16,
    pub loop_count: u16,
    pub nested_loop_count: u16,
    pub is_nested: bool,
    pub next_address: u16,
    pub parent_address: u16,
}

impl ModeHeader {
    pub fn encode(&self) -> u128 {
        (HEADER_TAG as u128) << 88
            | (self.state_count as u128) << 72
            | (self.loop_count as u128) << 56
            | (self.nested_loop_count as u128) << 40
            | (self.is_nested as u128) << 32
            | (self.next_address as u128) << 16
            | self.parent_address as u128
    }

    pub fn decode(word: u128) -> Result<Self> {
        if word >> 96 != 0 || tag_of(word) != HEADER_TAG {
            return Err(Error::InvalidWord(word));
        }
        let field = |shift: u32| (word >> shift) as u16;
        let is_nested = match (word >> 32) as u8 {
            0 => false,
            1 => true,
            _ => return Err(Error::InvalidWord(word)),
        };
        Ok(ModeHeader {
            state_count: field(72),
            loop_count: field(56),
            nested_loop_count: field(40),
            is_nested,
            next_address: field(16),
            parent_address: field(0),
        })
    }

    /// The sequencer never leaves a mode that loops forever
    pub fn is_terminal(&self) -> bool {
        self.loop_count == 0
    }
}

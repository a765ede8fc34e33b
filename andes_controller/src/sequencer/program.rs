use super::{ModeHeader, TimingState, Word, INVALID_ADDRESS};
use crate::{
    error::{Error, Result},
    labels::PinLabels,
};
use core::fmt::{self, Display};
use std::collections::HashMap;

/// Upper bound on steps produced by [`CompiledProgram::trace`], guards against loops of states
/// that never hold time
const TRACE_STEP_LIMIT: usize = 100_000;

/// Sequencer memory image produced by [`super::ProgramAssembler`]
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct CompiledProgram {
    words: Vec<Word>,
    addresses: HashMap<String, u16>,
}

/// One visit of a mode while following a program
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct TraceStep {
    pub mode: String,
    pub address: u16,
    /// Times the mode states were played during this visit, 0 for a mode looping forever
    pub repetitions: u32,
    /// Sequencer ticks spent in this visit, 0 for a mode looping forever
    pub ticks: u64,
}

impl CompiledProgram {
    pub(crate) fn new(words: Vec<Word>, addresses: HashMap<String, u16>) -> Self {
        CompiledProgram { words, addresses }
    }

    pub fn address_of(&self, mode: &str) -> Result<u16> {
        self.addresses
            .get(mode)
            .copied()
            .ok_or_else(|| Error::UnknownMode(mode.to_string()))
    }

    pub fn addresses(&self) -> &HashMap<String, u16> {
        &self.addresses
    }

    /// Mode names ordered by address
    pub fn mode_names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.addresses.iter().collect();
        names.sort_by_key(|(_, a)| **a);
        names.into_iter().map(|(n, _)| n.as_str()).collect()
    }

    pub fn words(&self) -> &[Word] {
        &self.words
    }

    /// Raw 96 bit memory lines, index is the memory address
    pub fn codes(&self) -> Vec<u128> {
        self.words.iter().map(Word::encode).collect()
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    fn names_by_address(&self) -> HashMap<u16, String> {
        self.addresses
            .iter()
            .map(|(n, a)| (*a, n.clone()))
            .collect()
    }

    pub fn disassemble(&self) -> String {
        disassemble_words(&self.words, &self.names_by_address(), None)
    }

    /// Same as [`CompiledProgram::disassemble`] but shows state pins by name
    pub fn disassemble_with_labels(&self, labels: &PinLabels) -> String {
        disassemble_words(&self.words, &self.names_by_address(), Some(labels))
    }

    fn mode_at(&self, address: u16) -> Result<(ModeHeader, &[Word])> {
        let start = address as usize;
        match self.words.get(start) {
            Some(Word::Header(h)) => {
                let end = start + 1 + h.state_count as usize;
                let states = self
                    .words
                    .get(start + 1..end)
                    .ok_or(Error::InvalidData("Mode states run past the end of the program"))?;
                Ok((*h, states))
            }
            Some(w) => Err(Error::InvalidWord(w.encode())),
            None => Err(Error::UnknownMode(format!("@{:04}", address))),
        }
    }

    /// Follows the program from `start_mode` the way the sequencer would run it.
    ///
    /// Stops after a mode that loops forever, on a jump to no mode, or once more than
    /// `max_ticks` ticks were spent. The visit of a nested mode that only falls through to its
    /// next mode takes no time and is left out.
    pub fn trace(&self, start_mode: &str, max_ticks: u64) -> Result<Vec<TraceStep>> {
        let names = self.names_by_address();
        let mut address = self.address_of(start_mode)?;
        let mut steps = Vec::new();
        let mut total = 0u64;
        let mut nested_visits = 0u16;

        while steps.len() < TRACE_STEP_LIMIT {
            let (header, states) = self.mode_at(address)?;
            let mode = names
                .get(&address)
                .cloned()
                .unwrap_or_else(|| format!("@{:04}", address));

            if header.is_terminal() {
                steps.push(TraceStep {
                    mode,
                    address,
                    repetitions: 0,
                    ticks: 0,
                });
                break;
            }

            let period: u64 = states
                .iter()
                .filter_map(|w| match w {
                    Word::State(s) => Some(u64::from(s.hold_time())),
                    Word::Header(_) => None,
                })
                .sum();

            // A nested mode plays its states once per jump back to the parent, and not at all
            // when it finally falls through to its next mode
            let (repetitions, next) = if header.is_nested {
                if nested_visits < header.nested_loop_count {
                    nested_visits += 1;
                    (1, header.parent_address)
                } else {
                    nested_visits = 0;
                    (0, header.next_address)
                }
            } else {
                (u32::from(header.loop_count), header.next_address)
            };

            if repetitions > 0 {
                let ticks = period * u64::from(repetitions);
                steps.push(TraceStep {
                    mode,
                    address,
                    repetitions,
                    ticks,
                });
                total += ticks;
            }

            address = next;
            if address == INVALID_ADDRESS || total >= max_ticks {
                break;
            }
        }
        Ok(steps)
    }
}

impl Display for CompiledProgram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.disassemble())
    }
}

fn address_label(address: u16, names: &HashMap<u16, String>) -> String {
    if address == INVALID_ADDRESS {
        return "-".to_string();
    }
    names
        .get(&address)
        .cloned()
        .unwrap_or_else(|| format!("@{:04}", address))
}

fn format_header(index: u16, h: &ModeHeader, names: &HashMap<u16, String>) -> String {
    format!(
        "{:04} MODE  {} | n_states:{} | n_loops:{} | nested_loops:{} | is_nested:{} | next:{} | parent:{}",
        index,
        address_label(index, names),
        h.state_count,
        h.loop_count,
        h.nested_loop_count,
        h.is_nested as u8,
        address_label(h.next_address, names),
        address_label(h.parent_address, names),
    )
}

fn format_state(index: u16, s: &TimingState, labels: Option<&PinLabels>) -> String {
    let pins = match labels {
        Some(labels) => labels
            .iter()
            .map(|(name, address)| format!("{}:{}", name, s.get_pin(address) as u8))
            .collect::<Vec<_>>()
            .join(" "),
        None => format!("pins:{:016X}", s.pins()),
    };
    format!("{:04} STATE {} | hold:{}", index, pins, s.hold_time())
}

/// Renders memory lines one per row, `names` gives the mode name stored at an address
pub fn disassemble_words(
    words: &[Word],
    names: &HashMap<u16, String>,
    labels: Option<&PinLabels>,
) -> String {
    words
        .iter()
        .enumerate()
        .map(|(i, w)| match w {
            Word::Header(h) => format_header(i as u16, h, names),
            Word::State(s) => format_state(i as u16, s, labels),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

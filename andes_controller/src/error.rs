use crate::{response::Status, sequencer::Issue};
use core::result::Result as CoreResult;
use thiserror::Error;

pub type Result<T> = CoreResult<T, Error>;

fn join_issues(issues: &[Issue]) -> String {
    issues
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

fn join_duplicates(groups: &[(u8, Vec<String>)]) -> String {
    groups
        .iter()
        .map(|(address, names)| format!("{} -> {}", address, names.join(", ")))
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("Pin addresses are shared between labels: {}", join_duplicates(.0))]
    DuplicateAddress(Vec<(u8, Vec<String>)>),
    #[error("There is no pin labeled {0:?}")]
    UnknownName(String),
    #[error("There is no label for pin address {0}")]
    UnknownAddress(u8),
    #[error("{field} ({value}) is out of range [{min}...{max}]")]
    OutOfRange {
        field: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },
    #[error("hold_time ({0}) is out of range [0...16777215]")]
    InvalidHoldTime(u32),
    #[error("Too many bits ({0}) for a sequencer state, max is 64")]
    TooManyBits(usize),
    #[error("Length of label {name:?} ({len}) does not match length of hold times ({expected})")]
    LengthMismatch {
        name: String,
        len: usize,
        expected: usize,
    },
    #[error("Mode {0:?} reached the limit of 1023 states")]
    TooManyStates(String),
    #[error("There is already a mode named {0:?}")]
    DuplicateModeName(String),
    #[error("There is no mode named {0:?}")]
    UnknownMode(String),
    #[error("Compilation stopped because of consistency errors: {}", join_issues(.0))]
    Compile(Vec<Issue>),
    #[error("Program does not fit in sequencer memory ({actual}/{capacity} lines)")]
    MemoryOverflow { actual: usize, capacity: usize },
    #[error("Only 4 and 8 byte words are supported, got {0}")]
    UnsupportedWidth(usize),
    #[error("{0:#026X} is not a valid sequencer memory word")]
    InvalidWord(u128),
    #[error("Could not parse recieved data correctly: {0}")]
    InvalidData(&'static str),
    #[error("Unexpected end of package")]
    UnexpectedEop,
    #[error("Controller rejected the command with status {0:?}")]
    Rejected(Status),

    #[error("{0}")]
    IOError(#[from] std::io::Error),
}

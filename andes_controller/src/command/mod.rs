//! Controller instruction set.
//!
//! Every instruction travels in the same envelope of 32 bit words:
//!
//! | word | content |
//! |---|---|
//! | 0 | [`MARKER`] |
//! | 1 | module index |
//! | 2 | number of words that follow, header included |
//! | 3 | header, `submodule << 16 \| operation` |
//! | 4.. | operands |
mod encoder;
mod parser;

pub use encoder::CommandEncoder;
pub use parser::{parse_instruction, RawInstruction};

use crate::{
    error::{Error, Result},
    sequencer::CompiledProgram,
};
use num_derive::{FromPrimitive, ToPrimitive};
use num_traits::FromPrimitive;

/// First word of every instruction
pub const MARKER: u32 = 0x029A;

const POWER_MANAGEMENT: u16 = 0;
const SPI_VIDEO: u16 = 1;
const SPI_BIAS_CLOCKS: u16 = 2;
const SEQUENCER: u16 = 0;

#[derive(FromPrimitive, ToPrimitive, PartialEq, Eq, Debug, Clone, Copy)]
pub enum Module {
    Configurator = 0,
    Acquisition = 1,
    Pvm = 2,
}

/// Operand of an instruction, `Wide` takes two words on the wire
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum Operand {
    Word(u32),
    Wide(u64),
}

impl Operand {
    pub fn word_count(&self) -> u32 {
        match self {
            Operand::Word(_) => 1,
            Operand::Wide(_) => 2,
        }
    }
}

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum Channel {
    One,
    Three,
}

/// Single SPI write to a board device
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub struct SpiTransfer {
    pub device: u8,
    pub polarity: u8,
    pub nbits: u8,
    pub data: u32,
}

impl SpiTransfer {
    fn control_word(&self) -> u32 {
        (self.device as u32) << 16 | (self.polarity as u32) << 8 | self.nbits as u32
    }

    fn from_words(control: u32, data: u32) -> Self {
        SpiTransfer {
            device: (control >> 16) as u8,
            polarity: (control >> 8) as u8,
            nbits: control as u8,
            data,
        }
    }
}

/// Instruction that can be sent to the controller
#[derive(PartialEq, Eq, Debug, Clone)]
pub enum Command {
    PowerOn(bool),
    ResetDacs,
    SpiVideo(SpiTransfer),
    SpiBiasClocks(SpiTransfer),
    /// Runs the program starting at `stop_cleaning` then jumps to `get_image` to read out
    GetImage {
        stop_cleaning: u16,
        get_image: u16,
        open_shutter: bool,
    },
    WriteSequencerMemory {
        address: u16,
        word: u128,
    },
    EnableSequencer,
    DisableSequencer,
    /// Exposure time in milliseconds
    WriteExposureTime(u32),
    GetPixels(Channel),
    GetData {
        channel: Channel,
        samples: u32,
    },
    /// Drives `pins` on the sequencer outputs, holding them for `hold_time` ticks
    TestSequencerOn {
        hold_time: u32,
        pins: u64,
    },
    TestSequencerOff,
}

impl Command {
    /// Module, submodule and operation codes
    pub fn codes(&self) -> (Module, u16, u16) {
        use Command::*;
        use Module::*;
        match *self {
            PowerOn(_) => (Configurator, POWER_MANAGEMENT, 1),
            ResetDacs => (Configurator, POWER_MANAGEMENT, 2),
            SpiVideo(_) => (Configurator, SPI_VIDEO, 0),
            SpiBiasClocks(_) => (Configurator, SPI_BIAS_CLOCKS, 0),
            GetImage { .. } => (Acquisition, SEQUENCER, 0),
            WriteSequencerMemory { .. } => (Acquisition, SEQUENCER, 1),
            EnableSequencer => (Acquisition, SEQUENCER, 2),
            DisableSequencer => (Acquisition, SEQUENCER, 3),
            WriteExposureTime(_) => (Acquisition, SEQUENCER, 4),
            GetPixels(Channel::One) => (Acquisition, SEQUENCER, 5),
            GetPixels(Channel::Three) => (Acquisition, SEQUENCER, 6),
            GetData {
                channel: Channel::One,
                ..
            } => (Acquisition, SEQUENCER, 7),
            GetData {
                channel: Channel::Three,
                ..
            } => (Acquisition, SEQUENCER, 8),
            TestSequencerOn { .. } => (Acquisition, SEQUENCER, 9),
            TestSequencerOff => (Acquisition, SEQUENCER, 10),
        }
    }

    pub fn operands(&self) -> Vec<Operand> {
        use Command::*;
        use Operand::*;
        match *self {
            PowerOn(on) => vec![Word(on as u32)],
            SpiVideo(t) | SpiBiasClocks(t) => vec![Word(t.control_word()), Word(t.data)],
            GetImage {
                stop_cleaning,
                get_image,
                open_shutter,
            } => vec![
                Word(stop_cleaning.into()),
                Word(get_image.into()),
                Word(open_shutter as u32),
            ],
            WriteSequencerMemory { address, word } => vec![
                Word(address.into()),
                Word((word >> 64) as u32),
                Word((word >> 32) as u32),
                Word(word as u32),
            ],
            WriteExposureTime(ms) => vec![Word(ms)],
            GetData { samples, .. } => vec![Word(samples)],
            TestSequencerOn { hold_time, pins } => vec![Word(hold_time), Wide(pins)],
            ResetDacs | EnableSequencer | DisableSequencer | GetPixels(_) | TestSequencerOff => {
                vec![]
            }
        }
    }

    /// One memory write per program word, in address order
    pub fn write_program(program: &CompiledProgram) -> Vec<Command> {
        program
            .codes()
            .into_iter()
            .enumerate()
            .map(|(address, word)| Command::WriteSequencerMemory {
                address: address as u16,
                word,
            })
            .collect()
    }

    /// Builds [`Command::GetImage`] from the names of the two modes of `program` it jumps to
    pub fn jump_addresses(
        program: &CompiledProgram,
        stop_cleaning_mode: &str,
        get_image_mode: &str,
        open_shutter: bool,
    ) -> Result<Command> {
        Ok(Command::GetImage {
            stop_cleaning: program.address_of(stop_cleaning_mode)?,
            get_image: program.address_of(get_image_mode)?,
            open_shutter,
        })
    }
}

fn address_operand(value: u32) -> Result<u16> {
    u16::try_from(value).map_err(|_| Error::InvalidData("Address operand does not fit 16 bits"))
}

impl TryFrom<&RawInstruction> for Command {
    type Error = Error;

    fn try_from(raw: &RawInstruction) -> Result<Self> {
        use Command::*;
        let module =
            Module::from_u32(raw.module).ok_or(Error::InvalidData("Unknown module index"))?;
        let cmd = match (module, raw.submodule, raw.operation, raw.operands.as_slice()) {
            (Module::Configurator, POWER_MANAGEMENT, 1, [flag]) => PowerOn(*flag != 0),
            (Module::Configurator, POWER_MANAGEMENT, 2, []) => ResetDacs,
            (Module::Configurator, SPI_VIDEO, 0, [control, data]) => {
                SpiVideo(SpiTransfer::from_words(*control, *data))
            }
            (Module::Configurator, SPI_BIAS_CLOCKS, 0, [control, data]) => {
                SpiBiasClocks(SpiTransfer::from_words(*control, *data))
            }
            (Module::Acquisition, SEQUENCER, 0, [stop, get, shutter]) => GetImage {
                stop_cleaning: address_operand(*stop)?,
                get_image: address_operand(*get)?,
                open_shutter: *shutter != 0,
            },
            (Module::Acquisition, SEQUENCER, 1, [address, high, mid, low]) => {
                WriteSequencerMemory {
                    address: address_operand(*address)?,
                    word: (*high as u128) << 64 | (*mid as u128) << 32 | *low as u128,
                }
            }
            (Module::Acquisition, SEQUENCER, 2, []) => EnableSequencer,
            (Module::Acquisition, SEQUENCER, 3, []) => DisableSequencer,
            (Module::Acquisition, SEQUENCER, 4, [ms]) => WriteExposureTime(*ms),
            (Module::Acquisition, SEQUENCER, 5, []) => GetPixels(Channel::One),
            (Module::Acquisition, SEQUENCER, 6, []) => GetPixels(Channel::Three),
            (Module::Acquisition, SEQUENCER, 7, [samples]) => GetData {
                channel: Channel::One,
                samples: *samples,
            },
            (Module::Acquisition, SEQUENCER, 8, [samples]) => GetData {
                channel: Channel::Three,
                samples: *samples,
            },
            (Module::Acquisition, SEQUENCER, 9, [hold_time, high, low]) => TestSequencerOn {
                hold_time: *hold_time,
                pins: (*high as u64) << 32 | *low as u64,
            },
            (Module::Acquisition, SEQUENCER, 10, []) => TestSequencerOff,
            _ => return Err(Error::InvalidData("Unknown instruction")),
        };
        Ok(cmd)
    }
}

impl TryFrom<RawInstruction> for Command {
    type Error = Error;

    fn try_from(raw: RawInstruction) -> Result<Self> {
        Command::try_from(&raw)
    }
}

mod cli;
mod output;

use andes_controller::{
    command::RawInstruction,
    hex_parser::{decode_from_string, parse_legacy_dump},
    sequencer::{disassemble_words, Word},
    ByteOrder, Command,
};
use clap::Parser;
use simple_eyre::{eyre::eyre, Result};
use std::{
    collections::{BTreeMap, HashMap},
    fs,
};

use cli::*;

fn main() -> Result<()> {
    simple_eyre::install()?;
    let cli = Cli::parse();
    env_logger::init();

    match &cli.command {
        Commands::Bits(conf) => print_bits(conf),
        Commands::Disasm(conf) => disassemble(conf),
    }
}

/// Word as it reads in the dump, most significant bit first
fn word_bits(word: &[u8], order: ByteOrder) -> String {
    let bits = |b: &u8| format!("{:08b}", b);
    match order {
        ByteOrder::Little => word.iter().rev().map(bits).collect(),
        ByteOrder::Big => word.iter().map(bits).collect(),
    }
}

fn dump_to_bits(lines: &[Vec<u8>], order: ByteOrder) -> String {
    lines
        .iter()
        .enumerate()
        .map(|(i, line)| {
            let words: Vec<_> = line.chunks(4).map(|w| word_bits(w, order)).collect();
            format!("{:03}:\t{}", i + 1, words.join(" "))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn print_bits(conf: &DumpConf) -> Result<()> {
    let order: ByteOrder = conf.byte_order.into();
    log::debug!("Reading {:?} as {}", conf.dump, order);
    let text = fs::read_to_string(&conf.dump)?;
    let lines = parse_legacy_dump(&text, order)?;
    conf.output
        .write_sections(&[("Bits", dump_to_bits(&lines, order))])
}

fn describe(index: usize, raw: &RawInstruction) -> String {
    match Command::try_from(raw) {
        Ok(cmd) => format!("{:03}: {:?}", index + 1, cmd),
        Err(e) => {
            log::warn!("Instruction {} not recognised: {}", index + 1, e);
            format!(
                "{:03}: module {} header {:08X} operands {:X?}",
                index + 1,
                raw.module,
                raw.header(),
                raw.operands
            )
        }
    }
}

/// Sequencer memory written by the instructions, later writes to an address win
fn memory_image(instructions: &[RawInstruction]) -> Result<Vec<Word>> {
    let writes: BTreeMap<u16, u128> = instructions
        .iter()
        .filter_map(|raw| match Command::try_from(raw) {
            Ok(Command::WriteSequencerMemory { address, word }) => Some((address, word)),
            _ => None,
        })
        .collect();
    for (expected, address) in writes.keys().enumerate() {
        if expected != *address as usize {
            return Err(eyre!("Sequencer memory is not written at address {}", expected));
        }
    }
    Ok(writes
        .into_values()
        .map(Word::decode)
        .collect::<andes_controller::Result<_>>()?)
}

fn disassemble(conf: &DumpConf) -> Result<()> {
    let order: ByteOrder = conf.byte_order.into();
    log::debug!("Decoding {:?} as {}", conf.dump, order);
    let text = fs::read_to_string(&conf.dump)?;
    let instructions = decode_from_string(&text, order)?;
    log::trace!("Found {} instructions", instructions.len());

    let listing = instructions
        .iter()
        .enumerate()
        .map(|(i, raw)| describe(i, raw))
        .collect::<Vec<_>>()
        .join("\n");
    let words = memory_image(&instructions)?;
    let memory = if words.is_empty() {
        "No sequencer memory writes".to_string()
    } else {
        disassemble_words(&words, &HashMap::new(), None)
    };
    conf.output
        .write_sections(&[("Instructions", listing), ("Sequencer memory", memory)])
}

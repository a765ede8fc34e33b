use crate::{
    command::{Command, CommandEncoder},
    config::ByteOrder,
    hex_parser::{decode_from_string, parse_legacy_dump},
    observer::NullObserver,
    sequencer::{disassemble_words, CompiledProgram, Mode, ProgramAssembler, TimingState, Word},
};

use claims::*;
use manifest_dir_macros::exist_relative_path;
use pretty_assertions::assert_eq;
use std::collections::HashMap;

const EXPOSURE_SETUP: &'static str =
    include_str!(exist_relative_path!("resources/test/exposure_setup.init"));

fn program() -> CompiledProgram {
    let mut asm = ProgramAssembler::with_observer(NullObserver);
    let mut m1 = Mode::new("M1", 3, Some("M2"), None).unwrap();
    m1.add_states([TimingState::new(0b01, 1).unwrap(), TimingState::new(0b10, 2).unwrap()])
        .unwrap();
    let mut m2 = Mode::new("M2", 0, None, None).unwrap();
    m2.add_state(TimingState::new(0b11, 5).unwrap()).unwrap();
    asm.add_mode(m1).unwrap();
    asm.add_mode(m2).unwrap();
    asm.compile().unwrap()
}

fn commands(program: &CompiledProgram) -> Vec<Command> {
    let mut cmds = vec![Command::DisableSequencer];
    cmds.extend(Command::write_program(program));
    cmds.push(Command::EnableSequencer);
    cmds.push(Command::WriteExposureTime(500));
    cmds.push(Command::jump_addresses(program, "M1", "M2", true).unwrap());
    cmds
}

#[test]
fn render_matches_recorded_dump() {
    let encoder = CommandEncoder::with_observer(ByteOrder::Little, NullObserver);
    let lines: Vec<_> = commands(&program())
        .iter()
        .map(|cmd| encoder.encode_command(cmd))
        .collect();
    assert_eq!(
        assert_ok!(encoder.render_hex(&lines, 4)),
        EXPOSURE_SETUP.trim_end()
    );
}

#[test]
fn decode_recorded_dump() {
    let raw = assert_ok!(decode_from_string(EXPOSURE_SETUP, ByteOrder::Little));
    let decoded = raw
        .iter()
        .map(Command::try_from)
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    assert_eq!(decoded, commands(&program()));
}

#[test]
fn dump_bytes_are_wire_order() {
    let lines = assert_ok!(parse_legacy_dump(EXPOSURE_SETUP, ByteOrder::Little));
    assert_eq!(lines.len(), 9);
    assert_eq!(&lines[0][..4], &[0x9A, 0x02, 0x00, 0x00]);
    // Mode header of M1, most significant word first
    assert_eq!(&lines[1][20..24], &[0x00, 0x02, 0x00, 0x80]);
}

#[test]
fn memory_rebuilt_from_dump() {
    let raw = decode_from_string(EXPOSURE_SETUP, ByteOrder::Little).unwrap();
    let words = raw
        .iter()
        .filter_map(|r| match Command::try_from(r) {
            Ok(Command::WriteSequencerMemory { word, .. }) => Some(word),
            _ => None,
        })
        .map(Word::decode)
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    let program = program();
    assert_eq!(words.as_slice(), program.words());

    let names: HashMap<u16, String> = program
        .addresses()
        .iter()
        .map(|(n, a)| (*a, n.clone()))
        .collect();
    assert_eq!(disassemble_words(&words, &names, None), program.disassemble());
}

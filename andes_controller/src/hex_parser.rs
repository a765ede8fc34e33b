//! Reading back text dumps produced by [`crate::command::CommandEncoder::render_hex`]
use crate::{
    command::{parse_instruction, RawInstruction},
    config::ByteOrder,
    error::{Error, Result},
};
use nom::{
    bytes::complete::take_while_m_n,
    character::complete::{char, digit1, space0},
    combinator::{all_consuming, map_res, opt},
    multi::many1,
    sequence::{delimited, preceded, terminated},
    IResult,
};

/// Decodes a pair of chars formatted as hex into a byte. For example "FF" -> 255
fn hex_byte(input: &str) -> IResult<&str, u8> {
    map_res(
        take_while_m_n(2, 2, |c: char| c.is_ascii_hexdigit()),
        |hex| u8::from_str_radix(hex, 16),
    )(input)
}

fn hex_word(input: &str) -> IResult<&str, Vec<u8>> {
    many1(hex_byte)(input)
}

/// `NNN:` prefix written in front of every dump line
fn line_number(input: &str) -> IResult<&str, u32> {
    terminated(map_res(digit1, str::parse), char(':'))(input)
}

/// Words of one dump line, in the order they were written
pub(crate) fn parse_dump_line(input: &str) -> IResult<&str, Vec<Vec<u8>>> {
    all_consuming(preceded(
        opt(line_number),
        many1(delimited(space0, hex_word, space0)),
    ))(input)
}

/// Turns every non empty dump line back into the bytes that were sent
pub fn parse_legacy_dump(input: &str, order: ByteOrder) -> Result<Vec<Vec<u8>>> {
    input
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            let (_, words) = parse_dump_line(line)
                .map_err(|_| Error::InvalidData("Could not parse hex dump line"))?;
            Ok(words
                .into_iter()
                .flat_map(|mut word| {
                    if order == ByteOrder::Little {
                        word.reverse();
                    }
                    word
                })
                .collect())
        })
        .collect()
}

pub fn decode_from_string(input: &str, order: ByteOrder) -> Result<Vec<RawInstruction>> {
    let mut instructions = Vec::new();
    for line in parse_legacy_dump(input, order)? {
        let mut data = line.as_slice();
        while !data.is_empty() {
            match parse_instruction(data, order) {
                Ok((tail, raw)) => {
                    data = tail;
                    instructions.push(raw);
                }
                Err(nom::Err::Incomplete(_)) => return Err(Error::UnexpectedEop),
                Err(_) => return Err(Error::InvalidData("Could not parse instruction correctly")),
            }
        }
    }
    Ok(instructions)
}

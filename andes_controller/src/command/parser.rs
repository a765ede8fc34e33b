use super::MARKER;
use crate::config::ByteOrder;
use nom::{
    error::{Error, ErrorKind},
    multi::count,
    number::streaming::u32 as word,
    IResult,
};

/// Instruction envelope with its operands still as raw 32 bit words
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct RawInstruction {
    pub module: u32,
    pub submodule: u16,
    pub operation: u16,
    pub operands: Vec<u32>,
}

impl RawInstruction {
    pub fn header(&self) -> u32 {
        (self.submodule as u32) << 16 | self.operation as u32
    }
}

/// Parses one instruction envelope, `Incomplete` is returned until all announced words arrived
pub fn parse_instruction(input: &[u8], order: ByteOrder) -> IResult<&[u8], RawInstruction> {
    let endian = order.nom_endianness();
    let (input, marker) = word(endian)(input)?;
    if marker != MARKER {
        return Err(nom::Err::Error(Error::new(input, ErrorKind::Tag)));
    }
    let (input, module) = word(endian)(input)?;
    let (input, word_count) = word(endian)(input)?;
    // Word count includes the header
    if word_count == 0 {
        return Err(nom::Err::Error(Error::new(input, ErrorKind::Verify)));
    }
    let (input, header) = word(endian)(input)?;
    let (input, operands) = count(word(endian), (word_count - 1) as usize)(input)?;
    Ok((
        input,
        RawInstruction {
            module,
            submodule: (header >> 16) as u16,
            operation: header as u16,
            operands,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use claims::*;
    use nom::{Err::Incomplete, Needed};

    const ENABLE_SEQUENCER_LE: [u8; 16] = [
        0x9A, 0x02, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x02, 0x00, 0x00,
        0x00,
    ];

    #[test]
    fn decode_header_only_instruction() {
        assert_ok_eq!(
            parse_instruction(&ENABLE_SEQUENCER_LE, ByteOrder::Little),
            (
                &[] as &[u8],
                RawInstruction {
                    module: 1,
                    submodule: 0,
                    operation: 2,
                    operands: vec![],
                }
            )
        );
    }

    #[test]
    fn decode_big_endian_operands() {
        let bytes = [
            0x00, 0x00, 0x02, 0x9A, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x02, 0x00, 0x00,
            0x00, 0x04, 0x00, 0x00, 0x01, 0xF4, 0xAA,
        ];
        let (tail, raw) = parse_instruction(&bytes, ByteOrder::Big).unwrap();
        assert_eq!(tail, &[0xAA]);
        assert_eq!(raw.header(), 4);
        assert_eq!(raw.operands, vec![500]);
    }

    #[test]
    fn partial_instruction() {
        assert_err_eq!(
            parse_instruction(&ENABLE_SEQUENCER_LE[..10], ByteOrder::Little),
            Incomplete(Needed::new(2))
        );
    }

    #[test]
    fn wrong_marker() {
        assert_err!(parse_instruction(&ENABLE_SEQUENCER_LE, ByteOrder::Big));
    }
}

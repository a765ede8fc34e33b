use super::{Command, Operand, MARKER};
use crate::{
    codec::Encoder,
    config::ByteOrder,
    error::{Error, Result},
    observer::{Event, LogObserver, Observer},
};
use bytes::BytesMut;

/// Packs instructions into the controller envelope
#[derive(Debug, Clone)]
pub struct CommandEncoder<O: Observer = LogObserver> {
    byte_order: ByteOrder,
    observer: O,
}

impl CommandEncoder {
    pub fn new(byte_order: ByteOrder) -> Self {
        CommandEncoder::with_observer(byte_order, LogObserver)
    }
}

impl Default for CommandEncoder {
    fn default() -> Self {
        CommandEncoder::new(ByteOrder::default())
    }
}

impl<O: Observer> CommandEncoder<O> {
    pub fn with_observer(byte_order: ByteOrder, observer: O) -> Self {
        CommandEncoder {
            byte_order,
            observer,
        }
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    pub fn build_header(submodule: u16, operation: u16) -> u32 {
        (submodule as u32) << 16 | operation as u32
    }

    /// Packs a 32 bit word, `value` must fit an `i32` when `signed` and an `u32` otherwise
    pub fn pack_word(&self, value: i64, signed: bool) -> Result<[u8; 4]> {
        let (min, max) = if signed {
            (i32::MIN as i64, i32::MAX as i64)
        } else {
            (0, u32::MAX as i64)
        };
        if value < min || value > max {
            return Err(Error::OutOfRange {
                field: "word",
                value,
                min,
                max,
            });
        }
        Ok(self.byte_order.u32_to_bytes(value as u32))
    }

    /// Packs a 64 bit value as two words, high word first.
    ///
    /// Only the bytes inside each word follow the byte order, so for little endian
    /// `0x1122334455667788` becomes `44 33 22 11 88 77 66 55`.
    pub fn pack_wide(&self, value: u64, signed: bool) -> Result<[u8; 8]> {
        let high = self.pack_word(half(value >> 32, signed), signed)?;
        let low = self.pack_word(half(value & 0xFFFF_FFFF, signed), signed)?;
        let mut bytes = [0u8; 8];
        bytes[..4].copy_from_slice(&high);
        bytes[4..].copy_from_slice(&low);
        Ok(bytes)
    }

    pub fn pack(&self, value: i64, width: usize, signed: bool) -> Result<Vec<u8>> {
        match width {
            4 => self.pack_word(value, signed).map(Vec::from),
            8 => self.pack_wide(value as u64, signed).map(Vec::from),
            w => Err(Error::UnsupportedWidth(w)),
        }
    }

    fn put_word(&self, dst: &mut BytesMut, value: u32) {
        dst.extend_from_slice(&self.byte_order.u32_to_bytes(value));
    }

    /// Wraps `header` and `operands` into a complete instruction
    pub fn encode_instruction(&self, module: u32, header: u32, operands: &[Operand]) -> BytesMut {
        let word_count = 1 + operands.iter().map(Operand::word_count).sum::<u32>();
        let mut dst = BytesMut::with_capacity(4 * (3 + word_count as usize));
        self.put_word(&mut dst, MARKER);
        self.put_word(&mut dst, module);
        self.put_word(&mut dst, word_count);
        self.put_word(&mut dst, header);
        for operand in operands {
            match *operand {
                Operand::Word(w) => self.put_word(&mut dst, w),
                Operand::Wide(w) => {
                    self.put_word(&mut dst, (w >> 32) as u32);
                    self.put_word(&mut dst, w as u32);
                }
            }
        }
        self.observer.notify(Event::Encoded {
            module,
            header,
            bytes: dst.len(),
        });
        dst
    }

    pub fn encode_command(&self, cmd: &Command) -> BytesMut {
        let (module, submodule, operation) = cmd.codes();
        self.encode_instruction(
            module as u32,
            Self::build_header(submodule, operation),
            &cmd.operands(),
        )
    }

    /// Text dump with one line per instruction, words read most significant byte first
    pub fn render_hex<L: AsRef<[u8]>>(&self, lines: &[L], word_width: usize) -> Result<String> {
        if word_width == 0 {
            return Err(Error::UnsupportedWidth(word_width));
        }
        let flip = self.byte_order == ByteOrder::Little;
        let rendered: Vec<String> = lines
            .iter()
            .enumerate()
            .map(|(i, line)| {
                let words: Vec<String> = line
                    .as_ref()
                    .chunks(word_width)
                    .map(|word| {
                        let hex = |b: &u8| format!("{:02X}", b);
                        if flip {
                            word.iter().rev().map(hex).collect()
                        } else {
                            word.iter().map(hex).collect()
                        }
                    })
                    .collect();
                format!("{:03}:\t{}", i + 1, words.join(" "))
            })
            .collect();
        Ok(rendered.join("\n"))
    }
}

/// Reinterprets a 32 bit half as the value the word packer expects
fn half(bits: u64, signed: bool) -> i64 {
    if signed {
        // Halves above i32::MAX are reported out of range like any other signed word
        bits as i64
    } else {
        (bits as u32).into()
    }
}

impl<O: Observer> Encoder for CommandEncoder<O> {
    type Item = Command;
    type Error = Error;

    fn encode(&mut self, item: Self::Item, dst: &mut BytesMut) -> Result<()> {
        dst.extend_from_slice(&self.encode_command(&item));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::NullObserver;
    use claims::*;
    use pretty_assertions::assert_eq;

    fn encoder(order: ByteOrder) -> CommandEncoder<NullObserver> {
        CommandEncoder::with_observer(order, NullObserver)
    }

    #[test]
    fn header_layout() {
        assert_eq!(CommandEncoder::<NullObserver>::build_header(1, 2), 0x0001_0002);
        assert_eq!(CommandEncoder::<NullObserver>::build_header(0xFFFF, 0), 0xFFFF_0000);
    }

    #[test]
    fn word_ranges() {
        let enc = encoder(ByteOrder::Little);
        assert_ok_eq!(enc.pack_word(-1, true), [0xFF; 4]);
        assert_ok_eq!(enc.pack_word(u32::MAX as i64, false), [0xFF; 4]);
        assert_ok_eq!(enc.pack_word(0x0102_0304, false), [0x04, 0x03, 0x02, 0x01]);
        assert_matches!(enc.pack_word(-1, false), Err(Error::OutOfRange { .. }));
        assert_matches!(enc.pack_word(1 << 32, false), Err(Error::OutOfRange { .. }));
        assert_matches!(enc.pack_word(i32::MAX as i64 + 1, true), Err(Error::OutOfRange { .. }));
        assert_ok_eq!(
            encoder(ByteOrder::Big).pack_word(0x0102_0304, false),
            [0x01, 0x02, 0x03, 0x04]
        );
    }

    #[test]
    fn wide_words_keep_high_word_first() {
        assert_ok_eq!(
            encoder(ByteOrder::Little).pack_wide(0x1122_3344_5566_7788, false),
            [0x44, 0x33, 0x22, 0x11, 0x88, 0x77, 0x66, 0x55]
        );
        assert_ok_eq!(
            encoder(ByteOrder::Big).pack_wide(0x1122_3344_5566_7788, false),
            [0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88]
        );
        assert_err!(encoder(ByteOrder::Little).pack_wide(0x8000_0000_0000_0000, true));
    }

    #[test]
    fn width_dispatch() {
        let enc = encoder(ByteOrder::Little);
        assert_ok_eq!(enc.pack(1, 4, false), vec![1, 0, 0, 0]);
        assert_ok_eq!(enc.pack(1, 8, false), vec![0, 0, 0, 0, 1, 0, 0, 0]);
        assert_matches!(enc.pack(1, 2, false), Err(Error::UnsupportedWidth(2)));
    }

    #[test]
    fn power_on_envelope() {
        let enc = encoder(ByteOrder::Little);
        let bytes = enc.encode_instruction(
            0,
            CommandEncoder::<NullObserver>::build_header(0, 1),
            &[Operand::Word(1)],
        );
        assert_eq!(
            bytes.as_ref(),
            &[
                0x9A, 0x02, 0x00, 0x00, // marker
                0x00, 0x00, 0x00, 0x00, // module
                0x02, 0x00, 0x00, 0x00, // word count
                0x01, 0x00, 0x00, 0x00, // header
                0x01, 0x00, 0x00, 0x00, // flag
            ]
        );
        assert_eq!(enc.encode_command(&Command::PowerOn(true)), bytes);
    }

    #[test]
    fn wide_operand_counts_twice() {
        let bytes = encoder(ByteOrder::Big).encode_command(&Command::TestSequencerOn {
            hold_time: 3,
            pins: 0x0000_0001_0000_0002,
        });
        assert_eq!(bytes.len(), 4 * 7);
        assert_eq!(&bytes[8..12], &[0, 0, 0, 4]);
        assert_eq!(&bytes[20..], &[0, 0, 0, 1, 0, 0, 0, 2]);
    }

    #[test]
    fn hex_rendering() {
        let enc = encoder(ByteOrder::Little);
        let line = enc.encode_command(&Command::EnableSequencer);
        assert_ok_eq!(
            enc.render_hex(&[&line[..], &[0x01, 0x02, 0x03, 0x04, 0x05]], 4),
            "001:\t0000029A 00000001 00000001 00000002\n002:\t04030201 05".to_string()
        );
        assert_ok_eq!(
            encoder(ByteOrder::Big).render_hex(&[[0x0Au8, 0x0B, 0x0C, 0x0D]], 2),
            "001:\t0A0B 0C0D".to_string()
        );
        assert_err!(enc.render_hex(&[[0u8; 4]], 0));
    }

    #[test]
    fn encoder_trait_appends() {
        let mut enc = encoder(ByteOrder::Little);
        let mut dst = BytesMut::new();
        enc.encode(Command::EnableSequencer, &mut dst).unwrap();
        enc.encode(Command::DisableSequencer, &mut dst).unwrap();
        assert_eq!(dst.len(), 32);
        assert_eq!(dst[12], 2);
        assert_eq!(dst[28], 3);
    }
}

use crate::{
    codec::Decoder,
    config::{ByteOrder, DEFAULT_RESPONSE_LEN},
    error::{Error, Result},
};
use bytes::{Buf, BytesMut};
use nom::{
    error::{Error as NomError, ErrorKind},
    number::streaming::u32 as word,
    IResult,
};
use num_derive::{FromPrimitive, ToPrimitive};
use num_traits::FromPrimitive;

/// First word of every packet the controller sends back
#[derive(FromPrimitive, ToPrimitive, PartialEq, Eq, Debug, Clone, Copy, Hash)]
#[repr(u32)]
pub enum Status {
    Disabled = 0,
    Ok = 0x5555_5555,
    ExposeBusy = 0xEEEE_BBBB,
    ExposeDone = 0xEEEE_DDDD,
    Timeout = 0xFEDC_BA98,
    Error = 0xFFFF_FFFF,
}

impl Status {
    /// The controller did not carry out the command
    pub fn is_failure(&self) -> bool {
        matches!(self, Status::Error | Status::Timeout)
    }
}

pub fn parse_status(input: &[u8], order: ByteOrder) -> IResult<&[u8], Status> {
    let (tail, code) = word(order.nom_endianness())(input)?;
    match Status::from_u32(code) {
        Some(status) => Ok((tail, status)),
        None => Err(nom::Err::Error(NomError::new(input, ErrorKind::Verify))),
    }
}

/// Splits a byte stream into status packets of `packet_len` bytes.
///
/// Only the status word is looked at. The padding after it is skipped, including the part of it
/// that arrives in later reads.
#[derive(Debug, Clone, Copy)]
pub struct StatusDecoder {
    byte_order: ByteOrder,
    packet_len: usize,
    // Padding of the last packet not received yet
    skip: usize,
}

impl StatusDecoder {
    pub fn new(byte_order: ByteOrder, packet_len: usize) -> Self {
        StatusDecoder {
            byte_order,
            packet_len,
            skip: 0,
        }
    }

    fn drop_padding(&mut self, buf: &mut BytesMut) {
        let dropped = self.skip.min(buf.len());
        buf.advance(dropped);
        self.skip -= dropped;
    }
}

impl Default for StatusDecoder {
    fn default() -> Self {
        StatusDecoder::new(ByteOrder::default(), DEFAULT_RESPONSE_LEN)
    }
}

impl Decoder for StatusDecoder {
    type Item = Status;
    type Error = Error;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<Status>> {
        self.drop_padding(buf);
        if self.skip > 0 {
            return Ok(None);
        }
        let status = match parse_status(&buf[..], self.byte_order) {
            Ok((_, status)) => status,
            Err(nom::Err::Incomplete(_)) => return Ok(None),
            Err(_) => return Err(Error::InvalidData("Unknown status word")),
        };
        buf.advance(4);
        self.skip = self.packet_len.saturating_sub(4);
        self.drop_padding(buf);
        Ok(Some(status))
    }
}

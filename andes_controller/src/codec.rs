//! Framing traits shared by the command encoder and the response decoder
use bytes::BytesMut;
use thiserror::Error;

pub trait Encoder {
    type Error: core::error::Error;
    type Item;

    fn encode(&mut self, item: Self::Item, dst: &mut BytesMut) -> Result<(), Self::Error>;
}

#[derive(Error, Debug, PartialEq, Eq, Clone, Copy)]
pub enum DecoderError<E> {
    #[error("Unexpected EOF caused decoder to fail")]
    UnexpectedEof,
    #[error("{0}")]
    Other(E),
}

impl<E> From<E> for DecoderError<E> {
    fn from(value: E) -> Self {
        DecoderError::Other(value)
    }
}

pub trait Decoder {
    type Error: core::error::Error;
    type Item;

    /// Takes one item off the front of `buf`, `None` means more bytes are needed
    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error>;

    /// Called once the source is exhausted, leftover bytes are an error
    fn decode_eof(
        &mut self,
        buf: &mut BytesMut,
    ) -> Result<Option<Self::Item>, DecoderError<Self::Error>> {
        match self.decode(buf)? {
            Some(frame) => Ok(Some(frame)),
            None => {
                if buf.is_empty() {
                    Ok(None)
                } else {
                    Err(DecoderError::UnexpectedEof)
                }
            }
        }
    }
}

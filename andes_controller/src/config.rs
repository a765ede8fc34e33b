use core::fmt::{self, Display};

/// Byte order applied to every 32 bit chunk sent to the controller
#[derive(PartialEq, Eq, Debug, Clone, Copy, Default, Hash)]
pub enum ByteOrder {
    /// Native order of the controller's USB interface
    #[default]
    Little,
    Big,
}

impl ByteOrder {
    pub fn u32_to_bytes(self, value: u32) -> [u8; 4] {
        match self {
            ByteOrder::Little => value.to_le_bytes(),
            ByteOrder::Big => value.to_be_bytes(),
        }
    }

    pub fn u32_from_bytes(self, bytes: [u8; 4]) -> u32 {
        match self {
            ByteOrder::Little => u32::from_le_bytes(bytes),
            ByteOrder::Big => u32::from_be_bytes(bytes),
        }
    }

    pub(crate) fn nom_endianness(self) -> nom::number::Endianness {
        match self {
            ByteOrder::Little => nom::number::Endianness::Little,
            ByteOrder::Big => nom::number::Endianness::Big,
        }
    }
}

impl Display for ByteOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ByteOrder::Little => f.write_str("little-endian"),
            ByteOrder::Big => f.write_str("big-endian"),
        }
    }
}

/// Size of a single response packet sent back by the controller
pub const DEFAULT_RESPONSE_LEN: usize = 512;

/// Settings for a command session with a controller
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub struct SessionConfig {
    /// Byte order used both for commands and for parsing responses
    pub byte_order: ByteOrder,
    /// Upper bound on bytes read while waiting for one response
    pub response_len: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            byte_order: ByteOrder::default(),
            response_len: DEFAULT_RESPONSE_LEN,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_order_applies_per_word() {
        assert_eq!(ByteOrder::Little.u32_to_bytes(0x029A), [0x9A, 0x02, 0x00, 0x00]);
        assert_eq!(ByteOrder::Big.u32_to_bytes(0x029A), [0x00, 0x00, 0x02, 0x9A]);
        assert_eq!(ByteOrder::Little.u32_from_bytes([0x9A, 0x02, 0x00, 0x00]), 0x029A);
    }

    #[test]
    fn session_defaults() {
        let conf = SessionConfig::default();
        assert_eq!(conf.byte_order, ByteOrder::Little);
        assert_eq!(conf.response_len, 512);
    }
}

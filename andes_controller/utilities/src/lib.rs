use lazy_static::lazy_static;
use manifest_dir_macros::exist_relative_path;
use mockall::mock;
use nom::{
    bytes::complete::take_while_m_n,
    character::complete::space0,
    combinator::{all_consuming, map_res},
    multi::many1,
    sequence::delimited,
    IResult,
};
use std::io::{Read, Write};

/// Decodes a pair of chars formatted as hex into a byte. For example "FF" -> 255
fn hex_byte(input: &str) -> IResult<&str, u8> {
    map_res(
        take_while_m_n(2, 2, |c: char| c.is_ascii_hexdigit()),
        |hex| u8::from_str_radix(hex, 16),
    )(input)
}

fn parse_hex_str(input: &str) -> IResult<&str, Vec<u8>> {
    all_consuming(many1(delimited(space0, hex_byte, space0)))(input)
}

lazy_static! {
    /// Response packet acknowledging a command
    pub static ref OK_RESPONSE: Vec<u8> = {
        let hex_str = include_str!(exist_relative_path!("resources/test/ok_response.txt"));
        let (_, data) = parse_hex_str(hex_str.trim())
            .expect("Failed to parse resources/test/ok_response.txt");
        data
    };
    /// Response packet of a command the controller failed to execute
    pub static ref ERROR_RESPONSE: Vec<u8> = {
        let hex_str = include_str!(exist_relative_path!("resources/test/error_response.txt"));
        let (_, data) = parse_hex_str(hex_str.trim())
            .expect("Failed to parse resources/test/error_response.txt");
        data
    };
}

mock! {
    pub IO {}
    impl Read for IO {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize>;
    }
    impl Write for IO {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize>;
        fn flush(&mut self) -> std::io::Result<()>;
    }
}

use crate::output::Output;
use andes_controller::ByteOrder;
use clap::{ArgEnum, Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print every word of a hex dump as 32 bit binary strings
    Bits(DumpConf),
    /// Decode the instructions of a hex dump and the sequencer program it uploads
    Disasm(DumpConf),
}

#[derive(Args)]
pub struct DumpConf {
    /// Hex dump with one instruction per line
    #[clap(value_parser, value_hint = clap::ValueHint::FilePath)]
    pub dump: PathBuf,

    /// Byte order the dump was rendered with
    #[clap(long, value_enum, default_value_t)]
    pub byte_order: ByteOrderArg,

    #[clap(flatten)]
    pub output: Output,
}

#[derive(ArgEnum, Clone, Copy, Default)]
pub enum ByteOrderArg {
    #[default]
    Little,
    Big,
}

impl From<ByteOrderArg> for ByteOrder {
    fn from(arg: ByteOrderArg) -> Self {
        match arg {
            ByteOrderArg::Little => ByteOrder::Little,
            ByteOrderArg::Big => ByteOrder::Big,
        }
    }
}

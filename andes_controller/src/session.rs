use crate::{
    codec::{Decoder, DecoderError},
    command::{Command, CommandEncoder},
    config::SessionConfig,
    error::{Error, Result},
    response::{Status, StatusDecoder},
    sequencer::{CompiledProgram, TimingState},
};
use bytes::BytesMut;
use scopeguard::guard;
use std::io::{Read, Write};

/// Command exchange with a controller over any byte transport.
///
/// Every command is answered by one response packet starting with a [`Status`] word.
pub struct Session<IO>
where
    IO: Read + Write,
{
    io: IO,
    config: SessionConfig,
    encoder: CommandEncoder,
    decoder: StatusDecoder,
    // Bytes received but not decoded yet
    buf: BytesMut,
}

impl<IO> Session<IO>
where
    IO: Read + Write,
{
    pub fn new(io: IO) -> Self {
        Session::with_config(io, SessionConfig::default())
    }

    pub fn with_config(io: IO, config: SessionConfig) -> Self {
        Session {
            io,
            config,
            encoder: CommandEncoder::new(config.byte_order),
            decoder: StatusDecoder::new(config.byte_order, config.response_len),
            buf: BytesMut::with_capacity(config.response_len),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Raw transport, used to read data streamed after [`Session::start_exposure`]
    pub fn io_mut(&mut self) -> &mut IO {
        &mut self.io
    }

    pub fn into_inner(self) -> IO {
        self.io
    }

    fn send_package(&mut self, cmd: &Command) -> Result<()> {
        log::trace!("Sending {:?}", cmd);
        self.io.write_all(&self.encoder.encode_command(cmd))?;
        self.io.flush()?;
        Ok(())
    }

    fn receive_status(&mut self) -> Result<Status> {
        let mut chunk = vec![0u8; self.config.response_len];
        loop {
            if let Some(status) = self.decoder.decode(&mut self.buf)? {
                return Ok(status);
            }
            let read_bytes = self.io.read(&mut chunk)?;
            if read_bytes == 0 {
                return match self.decoder.decode_eof(&mut self.buf) {
                    Ok(Some(status)) => Ok(status),
                    Ok(None) | Err(DecoderError::UnexpectedEof) => Err(Error::UnexpectedEop),
                    Err(DecoderError::Other(e)) => Err(e),
                };
            }
            self.buf.extend_from_slice(&chunk[..read_bytes]);
        }
    }

    /// Sends a command and returns whatever status the controller answered with
    pub fn exchange(&mut self, cmd: &Command) -> Result<Status> {
        self.send_package(cmd)?;
        self.receive_status()
    }

    /// Sends a command that must be acknowledged with [`Status::Ok`]
    pub fn send(&mut self, cmd: &Command) -> Result<()> {
        match self.exchange(cmd)? {
            Status::Ok => Ok(()),
            status => {
                log::error!("{:?} was answered with {:?}", cmd, status);
                Err(Error::Rejected(status))
            }
        }
    }

    pub fn set_power(&mut self, on: bool) -> Result<()> {
        self.send(&Command::PowerOn(on))
    }

    pub fn reset_dacs(&mut self) -> Result<()> {
        self.send(&Command::ResetDacs)
    }

    pub fn set_exposure_time(&mut self, ms: u32) -> Result<()> {
        self.send(&Command::WriteExposureTime(ms))
    }

    /// Replaces the sequencer memory with `program`, the sequencer is stopped while writing
    pub fn upload_program(&mut self, program: &CompiledProgram) -> Result<()> {
        log::debug!("Uploading {} sequencer memory lines", program.len());
        self.send(&Command::DisableSequencer)?;
        for cmd in Command::write_program(program) {
            self.send(&cmd)?;
        }
        self.send(&Command::EnableSequencer)?;
        Ok(())
    }

    /// Starts an exposure on an uploaded program.
    ///
    /// The controller streams image data back instead of a status packet, it is left unread on
    /// the transport.
    pub fn start_exposure(
        &mut self,
        program: &CompiledProgram,
        stop_cleaning_mode: &str,
        get_image_mode: &str,
        open_shutter: bool,
    ) -> Result<()> {
        let cmd =
            Command::jump_addresses(program, stop_cleaning_mode, get_image_mode, open_shutter)?;
        self.send_package(&cmd)
    }

    /// Drives the sequencer outputs with a fixed pattern while `f` runs.
    ///
    /// The test output is switched off afterwards even when `f` fails.
    pub fn with_test_pattern<T, F>(&mut self, hold_time: u32, pins: u64, f: F) -> Result<T>
    where
        F: FnOnce(&mut Self) -> Result<T>,
    {
        let state = TimingState::new(pins, hold_time)?;
        self.send(&Command::TestSequencerOn {
            hold_time: state.hold_time(),
            pins: state.pins(),
        })?;
        let mut session = guard(self, |s| {
            if let Err(e) = s.send(&Command::TestSequencerOff) {
                log::error!("Could not switch off sequencer test output: {}", e);
            }
        });
        f(&mut **session)
    }
}

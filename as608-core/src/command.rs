//! AS608 instruction codes and command construction

use bytes::{BufMut, Bytes, BytesMut};
use std::fmt;

use crate::error::{Error, Result};

/// Instruction codes
///
/// Only the instructions needed for image capture are listed; matching,
/// enrollment and template storage are not driven by this crate.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    /// Detect a finger and store its image in the image buffer
    GetImage = 0x01,

    /// Generate a character file from the image buffer
    ImageToTemplate = 0x02,

    /// Upload the image buffer to the host
    DownloadImage = 0x0A,

    /// Read the basic system parameters
    ReadSystemParameters = 0x0F,

    /// Verify the module handshake password
    VerifyPassword = 0x13,
}

impl Opcode {
    /// Get instruction name (datasheet mnemonic)
    pub fn name(self) -> &'static str {
        match self {
            Self::GetImage => "GenImg",
            Self::ImageToTemplate => "Img2Tz",
            Self::DownloadImage => "UpImage",
            Self::ReadSystemParameters => "ReadSysPara",
            Self::VerifyPassword => "VfyPwd",
        }
    }
}

impl From<Opcode> for u8 {
    fn from(opcode: Opcode) -> u8 {
        opcode as u8
    }
}

impl TryFrom<u8> for Opcode {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0x01 => Ok(Self::GetImage),
            0x02 => Ok(Self::ImageToTemplate),
            0x0A => Ok(Self::DownloadImage),
            0x0F => Ok(Self::ReadSystemParameters),
            0x13 => Ok(Self::VerifyPassword),
            _ => Err(Error::UnknownOpcode(value)),
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(0x{:02X})", self.name(), *self as u8)
    }
}

/// A single instruction with its arguments
///
/// Encoded into exactly one command packet by the sensor session.
///
/// # Examples
///
/// ```
/// use as608_core::{Command, Opcode};
///
/// let command = Command::verify_password(0);
/// assert_eq!(command.opcode, Opcode::VerifyPassword);
/// assert_eq!(command.payload().as_ref(), &[0x13, 0, 0, 0, 0]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub opcode: Opcode,
    pub args: Bytes,
}

impl Command {
    /// Create a command with raw argument bytes
    pub fn new(opcode: Opcode, args: impl Into<Bytes>) -> Self {
        Self {
            opcode,
            args: args.into(),
        }
    }

    pub fn get_image() -> Self {
        Self::new(Opcode::GetImage, Bytes::new())
    }

    /// Convert the image buffer into a character file in `slot` (1 or 2)
    pub fn image_to_template(slot: u8) -> Self {
        Self::new(Opcode::ImageToTemplate, vec![slot])
    }

    pub fn download_image() -> Self {
        Self::new(Opcode::DownloadImage, Bytes::new())
    }

    pub fn read_system_parameters() -> Self {
        Self::new(Opcode::ReadSystemParameters, Bytes::new())
    }

    /// Verify the 4-byte module password (big-endian on the wire)
    pub fn verify_password(password: u32) -> Self {
        Self::new(Opcode::VerifyPassword, password.to_be_bytes().to_vec())
    }

    /// Packet payload: opcode followed by the arguments
    pub fn payload(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(1 + self.args.len());
        buf.put_u8(self.opcode.into());
        buf.put_slice(&self.args);
        buf.freeze()
    }

    /// Parse a command packet payload
    pub fn decode(payload: &[u8]) -> Result<Self> {
        let (&opcode, args) = payload.split_first().ok_or(Error::Truncated {
            expected: 1,
            actual: 0,
        })?;

        Ok(Self::new(Opcode::try_from(opcode)?, Bytes::copy_from_slice(args)))
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.opcode)?;
        if !self.args.is_empty() {
            write!(f, "[{}]", hex::encode(&self.args))?;
        }
        Ok(())
    }
}

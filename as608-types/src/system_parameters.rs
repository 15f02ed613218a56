//! Basic system parameters reported by `ReadSysPara`

use std::fmt;

use bitflags::bitflags;
use byteorder::{BigEndian, ReadBytesExt};

use crate::error::{Error, Result};

bitflags! {
    /// System status register
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct StatusRegister: u16 {
        /// Module is executing a command
        const BUSY = 1 << 0;
        /// Last match succeeded
        const PASS = 1 << 1;
        /// Handshake password verified
        const PASSWORD_VERIFIED = 1 << 2;
        /// Image buffer holds a valid image
        const IMAGE_BUFFER_VALID = 1 << 3;
    }
}

/// Module configuration snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemParameters {
    pub status: StatusRegister,
    pub system_id: u16,
    /// Finger library capacity
    pub library_size: u16,
    /// Matching threshold level (1-5)
    pub security_level: u16,
    pub device_address: u32,
    /// Data packet size code: 0 = 32, 1 = 64, 2 = 128, 3 = 256 bytes
    pub packet_size_code: u16,
    /// Baud rate as a multiple of 9600
    pub baud_multiplier: u16,
}

impl SystemParameters {
    /// Size of the parameter block in the ack payload
    pub const SIZE: usize = 16;

    /// Parse the data bytes following the confirmation code
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE {
            return Err(Error::Parse(format!(
                "system parameters need {} bytes, got {}",
                Self::SIZE,
                data.len()
            )));
        }

        let mut rdr = &data[..Self::SIZE];
        let parse_err = |e: std::io::Error| Error::Parse(e.to_string());

        Ok(Self {
            status: StatusRegister::from_bits_retain(rdr.read_u16::<BigEndian>().map_err(parse_err)?),
            system_id: rdr.read_u16::<BigEndian>().map_err(parse_err)?,
            library_size: rdr.read_u16::<BigEndian>().map_err(parse_err)?,
            security_level: rdr.read_u16::<BigEndian>().map_err(parse_err)?,
            device_address: rdr.read_u32::<BigEndian>().map_err(parse_err)?,
            packet_size_code: rdr.read_u16::<BigEndian>().map_err(parse_err)?,
            baud_multiplier: rdr.read_u16::<BigEndian>().map_err(parse_err)?,
        })
    }

    /// Data packet payload size in bytes, `None` for an unknown code
    pub fn packet_size(&self) -> Option<usize> {
        match self.packet_size_code {
            0..=3 => Some(32usize << self.packet_size_code),
            _ => None,
        }
    }

    pub fn baud_rate(&self) -> u32 {
        self.baud_multiplier as u32 * 9600
    }
}

impl fmt::Display for SystemParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SysParams[addr: 0x{:08X}, capacity: {}, security: {}, baud: {}]",
            self.device_address,
            self.library_size,
            self.security_level,
            self.baud_rate()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: [u8; 16] = [
        0x00, 0x04, // status: password verified
        0x00, 0x09, // system id
        0x01, 0x2C, // library size 300
        0x00, 0x03, // security level
        0xFF, 0xFF, 0xFF, 0xFF, // address
        0x00, 0x02, // 128 byte packets
        0x00, 0x06, // 57600 baud
    ];

    #[test]
    fn test_parse_system_parameters() {
        let params = SystemParameters::parse(&SAMPLE).unwrap();

        assert_eq!(params.status, StatusRegister::PASSWORD_VERIFIED);
        assert_eq!(params.system_id, 9);
        assert_eq!(params.library_size, 300);
        assert_eq!(params.security_level, 3);
        assert_eq!(params.device_address, 0xFFFF_FFFF);
        assert_eq!(params.packet_size(), Some(128));
        assert_eq!(params.baud_rate(), 57600);
    }

    #[test]
    fn test_parse_too_short() {
        assert!(matches!(
            SystemParameters::parse(&SAMPLE[..10]),
            Err(Error::Parse(_))
        ));
    }

    #[test]
    fn test_unknown_packet_size_code() {
        let mut data = SAMPLE;
        data[13] = 0x07;

        let params = SystemParameters::parse(&data).unwrap();
        assert_eq!(params.packet_size(), None);
    }
}

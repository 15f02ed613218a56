//! Acknowledge packets and confirmation codes

use bytes::Bytes;
use std::fmt;

use crate::{
    error::{Error, Result},
    packet::{Packet, PacketType},
};

/// Confirmation code carried in byte 0 of every acknowledge packet
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Status {
    Ok,
    PacketReceiveError,
    NoFinger,
    ImageCaptureFailed,
    ImageTooDisordered,
    ImageTooSmall,
    NoMatch,
    NotFound,
    EnrollMismatch,
    BadLocation,
    UploadImageFailed,
    WrongPassword,
    InvalidImage,
    FlashError,
    /// Any code this crate does not name
    Unknown(u8),
}

impl Status {
    pub fn code(self) -> u8 {
        match self {
            Self::Ok => 0x00,
            Self::PacketReceiveError => 0x01,
            Self::NoFinger => 0x02,
            Self::ImageCaptureFailed => 0x03,
            Self::ImageTooDisordered => 0x06,
            Self::ImageTooSmall => 0x07,
            Self::NoMatch => 0x08,
            Self::NotFound => 0x09,
            Self::EnrollMismatch => 0x0A,
            Self::BadLocation => 0x0B,
            Self::UploadImageFailed => 0x0F,
            Self::WrongPassword => 0x13,
            Self::InvalidImage => 0x15,
            Self::FlashError => 0x18,
            Self::Unknown(code) => code,
        }
    }

    pub fn is_ok(self) -> bool {
        self == Self::Ok
    }

    /// Human readable description
    pub fn description(self) -> &'static str {
        match self {
            Self::Ok => "command executed",
            Self::PacketReceiveError => "error when receiving data package",
            Self::NoFinger => "no finger on the sensor",
            Self::ImageCaptureFailed => "failed to enroll the finger",
            Self::ImageTooDisordered => "image too disordered to generate a character file",
            Self::ImageTooSmall => "too few feature points to generate a character file",
            Self::NoMatch => "finger does not match",
            Self::NotFound => "no matching finger in the library",
            Self::EnrollMismatch => "failed to combine character files",
            Self::BadLocation => "page id beyond the finger library",
            Self::UploadImageFailed => "failed to upload the image",
            Self::WrongPassword => "wrong password",
            Self::InvalidImage => "no valid primary image in the image buffer",
            Self::FlashError => "error when writing flash",
            Self::Unknown(_) => "unknown confirmation code",
        }
    }
}

impl From<u8> for Status {
    fn from(code: u8) -> Self {
        match code {
            0x00 => Self::Ok,
            0x01 => Self::PacketReceiveError,
            0x02 => Self::NoFinger,
            0x03 => Self::ImageCaptureFailed,
            0x06 => Self::ImageTooDisordered,
            0x07 => Self::ImageTooSmall,
            0x08 => Self::NoMatch,
            0x09 => Self::NotFound,
            0x0A => Self::EnrollMismatch,
            0x0B => Self::BadLocation,
            0x0F => Self::UploadImageFailed,
            0x13 => Self::WrongPassword,
            0x15 => Self::InvalidImage,
            0x18 => Self::FlashError,
            other => Self::Unknown(other),
        }
    }
}

impl From<Status> for u8 {
    fn from(status: Status) -> u8 {
        status.code()
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:02X} ({})", self.code(), self.description())
    }
}

/// Decoded reply to a single command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub packet_type: PacketType,
    pub status: Status,
    /// Payload bytes after the confirmation code
    pub data: Bytes,
}

impl Response {
    /// Interpret an acknowledge packet
    ///
    /// # Errors
    ///
    /// - [`Error::UnexpectedPacketType`] if the packet is not an ack
    /// - [`Error::Truncated`] if the ack carries no confirmation code
    pub fn from_packet(packet: Packet) -> Result<Self> {
        if packet.packet_type != PacketType::Ack {
            return Err(Error::UnexpectedPacketType(packet.packet_type));
        }

        let mut payload = packet.payload;
        if payload.is_empty() {
            return Err(Error::Truncated {
                expected: 1,
                actual: 0,
            });
        }

        let data = payload.split_off(1);

        Ok(Self {
            packet_type: packet.packet_type,
            status: Status::from(payload[0]),
            data,
        })
    }

    pub fn is_ok(&self) -> bool {
        self.status.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::BROADCAST_ADDRESS;

    #[test]
    fn test_status_round_trip() {
        for code in 0..=u8::MAX {
            assert_eq!(Status::from(code).code(), code);
        }
    }

    #[test]
    fn test_status_is_ok() {
        assert!(Status::Ok.is_ok());
        assert!(!Status::NoFinger.is_ok());
        assert_eq!(Status::from(0x02), Status::NoFinger);
        assert_eq!(Status::from(0x42), Status::Unknown(0x42));
    }

    #[test]
    fn test_response_from_ack() {
        let packet = Packet::new(BROADCAST_ADDRESS, PacketType::Ack, vec![0x00, 0xAA, 0xBB]);
        let response = Response::from_packet(packet).unwrap();

        assert!(response.is_ok());
        assert_eq!(response.data.as_ref(), &[0xAA, 0xBB]);
    }

    #[test]
    fn test_response_rejects_data_packet() {
        let packet = Packet::new(BROADCAST_ADDRESS, PacketType::Data, vec![0x00]);

        assert_eq!(
            Response::from_packet(packet),
            Err(Error::UnexpectedPacketType(PacketType::Data))
        );
    }

    #[test]
    fn test_response_empty_ack() {
        let packet = Packet::new(BROADCAST_ADDRESS, PacketType::Ack, Bytes::new());

        assert!(matches!(Response::from_packet(packet), Err(Error::Truncated { .. })));
    }
}

//! Error types for as608-core

use crate::packet::PacketType;

/// Result type alias for as608 protocol operations
pub type Result<T> = std::result::Result<T, Error>;

/// Wire protocol errors
///
/// Every variant means the byte stream is malformed or out of step with the
/// sensor. None of them are retried by this crate.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Packet does not start with the `EF 01` start code
    #[error("Bad start code: expected 0xEF01, got 0x{found:04X}")]
    BadMagic {
        found: u16,
    },

    /// Fewer bytes were available than the frame requires
    #[error("Packet truncated: expected {expected} bytes, got {actual} bytes")]
    Truncated {
        expected: usize,
        actual: usize,
    },

    /// Checksum verification failed
    #[error("Checksum mismatch: expected 0x{expected:04X}, received 0x{received:04X}")]
    ChecksumMismatch {
        expected: u16,
        received: u16,
    },

    /// A well-formed packet of the wrong type arrived
    #[error("Unexpected packet type: {0}")]
    UnexpectedPacketType(PacketType),

    /// Reassembled image length differs from the expected length
    #[error("Image size mismatch: expected {expected} bytes, got {actual} bytes")]
    SizeMismatch {
        expected: usize,
        actual: usize,
    },

    /// Unknown instruction code
    #[error("Unknown opcode: 0x{0:02X}")]
    UnknownOpcode(u8),

    /// Declared length cannot even hold the checksum
    #[error("Invalid packet length field: {0} (must be at least 2)")]
    InvalidLength(u16),

    /// Payload does not fit the 16-bit length field
    #[error("Payload too large: {size} bytes (max: {max} bytes)")]
    PayloadTooLarge {
        size: usize,
        max: usize,
    },
}

impl Error {
    /// Check if the error came from a damaged frame rather than a
    /// well-formed frame arriving out of turn
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            Self::BadMagic { .. }
                | Self::Truncated { .. }
                | Self::ChecksumMismatch { .. }
                | Self::InvalidLength(_)
        )
    }
}

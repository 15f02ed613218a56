//! AS608 protocol packet structure and encoding/decoding

use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::fmt;

use crate::{
    checksum,
    constants::START_CODE,
    error::{Error, Result},
};

/// Packet identifier (PID) byte
///
/// Bytes outside the four defined identifiers are kept as [`PacketType::Other`]
/// so a well-formed frame always decodes; where the type is not acceptable the
/// caller reports [`Error::UnexpectedPacketType`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum PacketType {
    /// Command packet (host to sensor)
    Command,

    /// Data packet, more data follows
    Data,

    /// Acknowledge packet (sensor to host)
    Ack,

    /// Final data packet
    End,

    /// Any other PID byte
    Other(u8),
}

impl PacketType {
    /// Get packet type name
    pub fn name(self) -> &'static str {
        match self {
            Self::Command => "COMMAND",
            Self::Data => "DATA",
            Self::Ack => "ACK",
            Self::End => "END_DATA",
            Self::Other(_) => "UNKNOWN",
        }
    }

    /// Raw PID byte
    pub fn code(self) -> u8 {
        match self {
            Self::Command => 0x01,
            Self::Data => 0x02,
            Self::Ack => 0x07,
            Self::End => 0x08,
            Self::Other(code) => code,
        }
    }
}

impl From<PacketType> for u8 {
    fn from(packet_type: PacketType) -> u8 {
        packet_type.code()
    }
}

impl From<u8> for PacketType {
    fn from(value: u8) -> Self {
        match value {
            0x01 => Self::Command,
            0x02 => Self::Data,
            0x07 => Self::Ack,
            0x08 => Self::End,
            other => Self::Other(other),
        }
    }
}

impl fmt::Display for PacketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(0x{:02X})", self.name(), self.code())
    }
}

/// Decoded packet header
///
/// `length` is the raw length field: payload bytes plus the two checksum
/// bytes. Exactly that many bytes follow the header on the wire.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Header {
    pub address: u32,
    pub packet_type: PacketType,
    pub length: u16,
}

impl Header {
    /// Number of bytes left to read after the header
    pub fn body_len(&self) -> usize {
        self.length as usize
    }

    /// Number of payload bytes (body minus checksum)
    pub fn payload_len(&self) -> usize {
        self.body_len().saturating_sub(Packet::CHECKSUM_SIZE)
    }
}

/// Encode a packet to its wire representation
///
/// ```text
/// EF 01 ‖ address ‖ packet_type ‖ len16(payload + 2) ‖ payload ‖ checksum16
/// ```
///
/// # Errors
///
/// Returns [`Error::PayloadTooLarge`] if the payload cannot be described by
/// the 16-bit length field.
///
/// # Examples
///
/// ```
/// use as608_core::packet::{encode, PacketType};
///
/// let bytes = encode(0xFFFF_FFFF, PacketType::Command, &[0x01]).unwrap();
/// assert_eq!(
///     &bytes[..],
///     &[0xEF, 0x01, 0xFF, 0xFF, 0xFF, 0xFF, 0x01, 0x00, 0x03, 0x01, 0x00, 0x05]
/// );
/// ```
pub fn encode(address: u32, packet_type: PacketType, payload: &[u8]) -> Result<BytesMut> {
    if payload.len() > Packet::MAX_PAYLOAD_SIZE {
        return Err(Error::PayloadTooLarge {
            size: payload.len(),
            max: Packet::MAX_PAYLOAD_SIZE,
        });
    }

    let length = (payload.len() + Packet::CHECKSUM_SIZE) as u16;
    let mut buf = BytesMut::with_capacity(Packet::HEADER_SIZE + length as usize);

    // Header (big-endian)
    buf.put_u16(START_CODE);
    buf.put_u32(address);
    buf.put_u8(packet_type.into());
    buf.put_u16(length);

    buf.put_slice(payload);
    buf.put_u16(checksum::calculate(packet_type.into(), length, payload));

    Ok(buf)
}

/// Decode the fixed 9-byte packet header
///
/// # Errors
///
/// - [`Error::Truncated`] if fewer than 9 bytes are given
/// - [`Error::BadMagic`] if the start code is not `EF 01`
/// - [`Error::InvalidLength`] if the length field is below 2
pub fn decode_header(mut buf: &[u8]) -> Result<Header> {
    if buf.len() < Packet::HEADER_SIZE {
        return Err(Error::Truncated {
            expected: Packet::HEADER_SIZE,
            actual: buf.len(),
        });
    }

    let start = buf.get_u16();
    if start != START_CODE {
        return Err(Error::BadMagic { found: start });
    }

    let address = buf.get_u32();
    let packet_type = PacketType::from(buf.get_u8());
    let length = buf.get_u16();

    if (length as usize) < Packet::CHECKSUM_SIZE {
        return Err(Error::InvalidLength(length));
    }

    Ok(Header {
        address,
        packet_type,
        length,
    })
}

/// Decode the packet body that follows `header`
///
/// `buf` must hold `header.length` bytes: payload then checksum. The checksum
/// is recomputed from the already-parsed packet type and declared length.
///
/// # Errors
///
/// - [`Error::Truncated`] if `buf` is shorter than the declared length
/// - [`Error::ChecksumMismatch`] if the trailing checksum is wrong
pub fn decode_body(header: &Header, buf: &[u8]) -> Result<Bytes> {
    let body_len = header.body_len();
    if body_len < Packet::CHECKSUM_SIZE {
        return Err(Error::InvalidLength(header.length));
    }
    if buf.len() < body_len {
        return Err(Error::Truncated {
            expected: body_len,
            actual: buf.len(),
        });
    }

    let (payload, mut tail) = buf[..body_len].split_at(header.payload_len());
    let received = tail.get_u16();
    let expected = checksum::calculate(header.packet_type.into(), header.length, payload);

    if expected != received {
        return Err(Error::ChecksumMismatch { expected, received });
    }

    Ok(Bytes::copy_from_slice(payload))
}

/// AS608 protocol packet
///
/// # Packet Structure
///
/// ```text
/// ┌──────────┬──────────┬──────────┬──────────┬───────────┬──────────┐
/// │  Start   │ Address  │   PID    │  Length  │  Payload  │ Checksum │
/// │ 2 bytes  │ 4 bytes  │  1 byte  │ 2 bytes  │  N bytes  │ 2 bytes  │
/// │ (EF 01)  │ (BE u32) │          │ (BE u16) │           │ (BE u16) │
/// └──────────┴──────────┴──────────┴──────────┴───────────┴──────────┘
/// ```
///
/// All multi-byte values are big-endian. Length counts payload plus checksum.
///
/// # Examples
///
/// ```
/// use as608_core::{Packet, PacketType};
///
/// let packet = Packet::new(0xFFFF_FFFF, PacketType::Command, vec![0x01]);
/// let encoded = packet.encode().unwrap();
///
/// let decoded = Packet::decode(&encoded).unwrap();
/// assert_eq!(packet, decoded);
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Packet {
    /// Module address
    pub address: u32,

    /// Packet identifier
    pub packet_type: PacketType,

    /// Packet contents, checksum excluded
    pub payload: Bytes,
}

impl Packet {
    /// Packet header size in bytes (start, address, PID, length)
    pub const HEADER_SIZE: usize = 9;

    /// Checksum size in bytes
    pub const CHECKSUM_SIZE: usize = 2;

    /// Maximum payload size the length field can describe
    pub const MAX_PAYLOAD_SIZE: usize = u16::MAX as usize - Self::CHECKSUM_SIZE;

    /// Create a packet
    pub fn new(address: u32, packet_type: PacketType, payload: impl Into<Bytes>) -> Self {
        Self {
            address,
            packet_type,
            payload: payload.into(),
        }
    }

    /// Value of the length field for this packet
    ///
    /// Saturates at `u16::MAX` for payloads over [`Self::MAX_PAYLOAD_SIZE`],
    /// which [`Packet::encode`] rejects.
    pub fn length(&self) -> u16 {
        u16::try_from(self.payload.len() + Self::CHECKSUM_SIZE).unwrap_or(u16::MAX)
    }

    /// Calculate checksum for this packet
    pub fn checksum(&self) -> u16 {
        checksum::calculate(self.packet_type.into(), self.length(), &self.payload)
    }

    /// Encode packet to bytes
    pub fn encode(&self) -> Result<BytesMut> {
        encode(self.address, self.packet_type, &self.payload)
    }

    /// Decode one complete packet from `buf`
    ///
    /// Trailing bytes after the declared length are ignored.
    pub fn decode(buf: &[u8]) -> Result<Self> {
        let header = decode_header(buf)?;
        let payload = decode_body(&header, &buf[Self::HEADER_SIZE..])?;

        Ok(Self {
            address: header.address,
            packet_type: header.packet_type,
            payload,
        })
    }

    /// Get total encoded size
    pub fn size(&self) -> usize {
        Self::HEADER_SIZE + self.payload.len() + Self::CHECKSUM_SIZE
    }
}

impl fmt::Debug for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Packet")
            .field("address", &format!("0x{:08X}", self.address))
            .field("packet_type", &self.packet_type)
            .field("checksum", &format!("0x{:04X}", self.checksum()))
            .field("payload_len", &self.payload.len())
            .finish()
    }
}

impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Packet[{}](address=0x{:08X}, len={})",
            self.packet_type,
            self.address,
            self.payload.len()
        )
    }
}

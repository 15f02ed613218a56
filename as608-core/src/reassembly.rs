//! Image reassembly state machine
//!
//! After an `UpImage` acknowledge the sensor streams the image buffer as a
//! run of data packets (PID 0x02) closed by one end packet (PID 0x08). The
//! [`Reassembler`] consumes decoded packets one at a time and owns no I/O;
//! the caller reads packets off the transport and feeds them in.

use bytes::{Bytes, BytesMut};
use tracing::{debug, trace};

use crate::{
    constants::image,
    error::{Error, Result},
    packet::PacketType,
};

/// Outcome of feeding one packet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    /// More packets are expected
    Continue,

    /// End packet seen; call [`Reassembler::finish`]
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    AwaitingPacket,
    Done,
}

/// Accumulates data packet payloads into one flat buffer
#[derive(Debug)]
pub struct Reassembler {
    expected: usize,
    buffer: BytesMut,
    packets: usize,
    state: State,
}

impl Reassembler {
    /// Up-front buffer reservation; larger images grow as data arrives
    const MAX_PREALLOC: usize = image::SIZE;

    /// Create a reassembler for an image of exactly `expected` bytes
    pub fn new(expected: usize) -> Self {
        Self {
            expected,
            buffer: BytesMut::with_capacity(expected.min(Self::MAX_PREALLOC)),
            packets: 0,
            state: State::AwaitingPacket,
        }
    }

    /// Number of payload bytes accumulated so far
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Number of packets consumed so far
    pub fn packets(&self) -> usize {
        self.packets
    }

    pub fn is_done(&self) -> bool {
        self.state == State::Done
    }

    /// Feed the next packet (checksum already stripped)
    ///
    /// # Errors
    ///
    /// - [`Error::UnexpectedPacketType`] for anything but data/end packets,
    ///   or for any packet after the end packet
    /// - [`Error::SizeMismatch`] once the accumulated data exceeds the
    ///   expected length
    pub fn push(&mut self, packet_type: PacketType, payload: &[u8]) -> Result<Progress> {
        if self.state == State::Done {
            return Err(Error::UnexpectedPacketType(packet_type));
        }

        let progress = match packet_type {
            PacketType::Data => Progress::Continue,
            PacketType::End => Progress::Done,
            other => return Err(Error::UnexpectedPacketType(other)),
        };

        let total = self.buffer.len() + payload.len();
        if total > self.expected {
            return Err(Error::SizeMismatch {
                expected: self.expected,
                actual: total,
            });
        }

        self.buffer.extend_from_slice(payload);
        self.packets += 1;

        trace!(
            packet = self.packets,
            packet_type = %packet_type,
            received = self.buffer.len(),
            expected = self.expected,
            "Image chunk"
        );

        if progress == Progress::Done {
            self.state = State::Done;
            debug!(
                packets = self.packets,
                bytes = self.buffer.len(),
                "Image transfer complete"
            );
        }

        Ok(progress)
    }

    /// Take the reassembled image
    ///
    /// # Errors
    ///
    /// Returns [`Error::SizeMismatch`] if the end packet has not been seen or
    /// the accumulated length differs from the expected length.
    pub fn finish(self) -> Result<Bytes> {
        if self.state != State::Done || self.buffer.len() != self.expected {
            return Err(Error::SizeMismatch {
                expected: self.expected,
                actual: self.buffer.len(),
            });
        }

        Ok(self.buffer.freeze())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_reassemble_in_order() {
        let mut reassembler = Reassembler::new(6);

        assert_eq!(reassembler.push(PacketType::Data, &[1, 2]).unwrap(), Progress::Continue);
        assert_eq!(reassembler.push(PacketType::Data, &[3, 4]).unwrap(), Progress::Continue);
        assert_eq!(reassembler.push(PacketType::End, &[5, 6]).unwrap(), Progress::Done);

        assert_eq!(reassembler.packets(), 3);
        assert_eq!(reassembler.finish().unwrap().as_ref(), &[1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_end_packet_only() {
        let mut reassembler = Reassembler::new(3);

        assert_eq!(reassembler.push(PacketType::End, &[7, 8, 9]).unwrap(), Progress::Done);
        assert_eq!(reassembler.finish().unwrap().as_ref(), &[7, 8, 9]);
    }

    #[test]
    fn test_rejects_ack_mid_stream() {
        let mut reassembler = Reassembler::new(4);
        reassembler.push(PacketType::Data, &[1, 2]).unwrap();

        assert_eq!(
            reassembler.push(PacketType::Ack, &[0]),
            Err(Error::UnexpectedPacketType(PacketType::Ack))
        );
    }

    #[test]
    fn test_rejects_undefined_type_mid_stream() {
        let mut reassembler = Reassembler::new(256);
        reassembler.push(PacketType::Data, &[0; 128]).unwrap();

        let result = reassembler.push(PacketType::from(0x05), &[0; 128]);
        assert_eq!(result, Err(Error::UnexpectedPacketType(PacketType::Other(0x05))));
    }

    #[test]
    fn test_huge_expectation_does_not_reserve() {
        let mut reassembler = Reassembler::new(usize::MAX);
        reassembler.push(PacketType::Data, &[1, 2, 3]).unwrap();

        assert_eq!(reassembler.len(), 3);
    }

    #[test]
    fn test_rejects_packet_after_end() {
        let mut reassembler = Reassembler::new(2);
        reassembler.push(PacketType::End, &[1, 2]).unwrap();

        assert!(reassembler.push(PacketType::Data, &[]).is_err());
    }

    #[test]
    fn test_short_image() {
        let mut reassembler = Reassembler::new(4);
        reassembler.push(PacketType::End, &[1, 2]).unwrap();

        assert_eq!(
            reassembler.finish(),
            Err(Error::SizeMismatch { expected: 4, actual: 2 })
        );
    }

    #[test]
    fn test_overlong_image() {
        let mut reassembler = Reassembler::new(3);
        reassembler.push(PacketType::Data, &[1, 2]).unwrap();

        assert_eq!(
            reassembler.push(PacketType::End, &[3, 4]),
            Err(Error::SizeMismatch { expected: 3, actual: 4 })
        );
    }

    #[test]
    fn test_finish_without_end_packet() {
        let mut reassembler = Reassembler::new(2);
        reassembler.push(PacketType::Data, &[1, 2]).unwrap();

        assert!(!reassembler.is_done());
        assert!(matches!(reassembler.finish(), Err(Error::SizeMismatch { .. })));
    }
}

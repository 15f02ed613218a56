//! Reading framed packets off a transport

use std::time::Duration;

use bytes::Bytes;
use tracing::{debug, trace};

use as608_core::{decode_body, decode_header, Packet, Progress, Reassembler};
use as608_transport::Transport;

use crate::error::Result;

/// Read exactly one framed packet: the 9-byte header, then the body of the
/// declared length
///
/// A short read at either stage is [`as608_core::Error::Truncated`]; nothing
/// is retried.
pub async fn read_packet(transport: &mut dyn Transport, timeout: Duration) -> Result<Packet> {
    let header_buf = transport.receive(Packet::HEADER_SIZE, timeout).await?;
    let header = decode_header(&header_buf)?;

    let body = transport.receive(header.body_len(), timeout).await?;
    let payload = decode_body(&header, &body)?;

    let packet = Packet {
        address: header.address,
        packet_type: header.packet_type,
        payload,
    };

    trace!("Received: {:?}", packet);

    Ok(packet)
}

/// Collect data packets until the end packet and return the flat buffer
///
/// Fails with [`as608_core::Error::UnexpectedPacketType`] on any packet that
/// is not data or end, and with [`as608_core::Error::SizeMismatch`] if the
/// total differs from `expected_len`.
pub async fn reassemble(
    transport: &mut dyn Transport,
    timeout: Duration,
    expected_len: usize,
) -> Result<Bytes> {
    debug!("Receiving image ({} bytes)...", expected_len);

    let mut reassembler = Reassembler::new(expected_len);

    loop {
        let packet = read_packet(transport, timeout).await?;
        if reassembler.push(packet.packet_type, &packet.payload)? == Progress::Done {
            break;
        }
    }

    Ok(reassembler.finish()?)
}

//! # as608-core
//!
//! Core protocol implementation for AS608/ZA620 optical fingerprint sensors.
//!
//! This crate provides the low-level protocol primitives:
//! - Packet structure and encoding/decoding
//! - Checksum calculation
//! - Instruction codes and confirmation codes
//! - Image reassembly from data packets
//!
//! It performs no I/O.

pub mod checksum;
pub mod command;
pub mod constants;
pub mod error;
pub mod packet;
pub mod reassembly;
pub mod response;

pub use command::{Command, Opcode};
pub use error::{Error, Result};
pub use packet::{Header, Packet, PacketType, decode_body, decode_header, encode};
pub use reassembly::{Progress, Reassembler};
pub use response::{Response, Status};

/// Packet header size
pub const HEADER_SIZE: usize = Packet::HEADER_SIZE;

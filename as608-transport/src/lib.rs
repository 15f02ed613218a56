//! Transport layer for the AS608 protocol
//!
//! Provides a duplex byte stream to the sensor: a UART link through
//! [`SerialTransport`], or an in-process [`MemoryTransport`] for tests and
//! simulations.

pub mod error;
pub mod memory;
pub mod serial;

pub use error::{Error, Result};
pub use memory::MemoryTransport;
pub use serial::SerialTransport;

use std::time::Duration;

use async_trait::async_trait;
use bytes::BytesMut;

/// Transport trait for different communication methods
#[async_trait]
pub trait Transport: Send {
    /// Open the channel
    async fn connect(&mut self) -> Result<()>;
    
    /// Close the channel
    async fn disconnect(&mut self) -> Result<()>;
    
    /// Check if connected
    fn is_connected(&self) -> bool;
    
    /// Send raw bytes
    async fn send(&mut self, data: &[u8]) -> Result<()>;
    
    /// Receive up to `max_bytes`
    ///
    /// Keeps reading until `max_bytes` have arrived or `timeout` elapses.
    /// On timeout the bytes received so far are returned, which may be fewer
    /// than requested or none at all.
    async fn receive(&mut self, max_bytes: usize, timeout: Duration) -> Result<BytesMut>;
    
    /// Human readable endpoint, e.g. the serial device path
    fn description(&self) -> String;
}

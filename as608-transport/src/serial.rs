//! UART transport
//!
//! AS608 modules speak 8N1 at a multiple of 9600 baud (57600 by default).

use std::time::Duration;

use async_trait::async_trait;
use bytes::BytesMut;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::time::{timeout_at, Instant};
use tokio_serial::{
    ClearBuffer, DataBits, FlowControl, Parity, SerialPort, SerialPortBuilderExt, SerialStream,
    StopBits,
};
use tracing::{debug, trace, warn};

use crate::{error::*, Transport};

/// Serial transport for AS608 sensors
pub struct SerialTransport {
    path: String,
    baud_rate: u32,
    stream: Option<SerialStream>,
}

impl SerialTransport {
    /// Create new serial transport
    pub fn new(path: impl Into<String>, baud_rate: u32) -> Self {
        Self {
            path: path.into(),
            baud_rate,
            stream: None,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn baud_rate(&self) -> u32 {
        self.baud_rate
    }
}

#[async_trait]
impl Transport for SerialTransport {
    async fn connect(&mut self) -> Result<()> {
        if self.is_connected() {
            return Err(Error::AlreadyConnected);
        }

        debug!("Opening {} at {} baud...", self.path, self.baud_rate);

        let stream = tokio_serial::new(&self.path, self.baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .open_native_async()
            .map_err(|source| Error::Open {
                path: self.path.clone(),
                source,
            })?;

        // Drop anything the sensor sent before we were listening
        if let Err(e) = stream.clear(ClearBuffer::All) {
            warn!("Failed to clear serial buffers on {}: {}", self.path, e);
        }

        debug!("Opened {}", self.path);

        self.stream = Some(stream);
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        if let Some(mut stream) = self.stream.take() {
            debug!("Closing {}...", self.path);

            let _ = stream.shutdown().await;
        }

        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    async fn send(&mut self, data: &[u8]) -> Result<()> {
        let stream = self.stream.as_mut().ok_or(Error::NotConnected)?;

        trace!("Sending {} bytes: {}", data.len(), hex::encode(&data[..data.len().min(32)]));

        stream.write_all(data).await?;
        stream.flush().await?;

        Ok(())
    }

    async fn receive(&mut self, max_bytes: usize, timeout: Duration) -> Result<BytesMut> {
        let stream = self.stream.as_mut().ok_or(Error::NotConnected)?;

        let deadline = Instant::now() + timeout;
        let mut buf = BytesMut::with_capacity(max_bytes);
        let mut chunk = vec![0u8; max_bytes];

        while buf.len() < max_bytes {
            let remaining = max_bytes - buf.len();

            match timeout_at(deadline, stream.read(&mut chunk[..remaining])).await {
                Err(_) => {
                    debug!(
                        "Read timeout on {}: got {} of {} bytes",
                        self.path,
                        buf.len(),
                        max_bytes
                    );
                    break;
                }
                Ok(Ok(0)) => return Err(Error::ConnectionClosed),
                Ok(Ok(n)) => buf.extend_from_slice(&chunk[..n]),
                Ok(Err(e)) => return Err(Error::Io(e)),
            }
        }

        trace!(
            "Received {} bytes: {}",
            buf.len(),
            hex::encode(&buf[..buf.len().min(32)])
        );

        Ok(buf)
    }

    fn description(&self) -> String {
        format!("{}@{}", self.path, self.baud_rate)
    }
}

impl Drop for SerialTransport {
    fn drop(&mut self) {
        if self.is_connected() {
            warn!("Serial transport dropped while still connected");
        }
    }
}

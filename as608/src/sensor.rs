//! High-level sensor interface

use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::{debug, info, trace, warn};

use as608_core::{Command, Packet, PacketType, Response, Status};
use as608_transport::{SerialTransport, Transport};
use as608_types::{FingerprintImage, SystemParameters};

use crate::config::SensorConfig;
use crate::error::{Error, Result};
use crate::reader;

/// AS608 fingerprint sensor session
///
/// Owns its transport exclusively and runs one command at a time.
///
/// # Examples
///
/// ```no_run
/// use as608::Sensor;
///
/// #[tokio::main]
/// async fn main() -> as608::Result<()> {
///     let mut sensor = Sensor::serial("/dev/ttyS0", 57600);
///
///     sensor.connect().await?;
///
///     let image = sensor.capture().await?;
///     println!("Captured {}", image);
///
///     sensor.disconnect().await?;
///     Ok(())
/// }
/// ```
pub struct Sensor {
    transport: Box<dyn Transport>,
    config: SensorConfig,
}

impl Sensor {
    /// Create a sensor session over any transport
    pub fn new(transport: impl Transport + 'static) -> Self {
        Self::from_boxed(Box::new(transport))
    }

    /// Create a sensor session over an already boxed transport
    pub fn from_boxed(transport: Box<dyn Transport>) -> Self {
        Self {
            transport,
            config: SensorConfig::default(),
        }
    }

    /// Create a sensor session on a serial port
    pub fn serial(path: impl Into<String>, baud_rate: u32) -> Self {
        Self::new(SerialTransport::new(path, baud_rate))
    }

    /// Replace the whole configuration
    pub fn with_config(mut self, config: SensorConfig) -> Self {
        self.config = config;
        self
    }

    /// Set packet read timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.config.read_timeout = timeout;
        self
    }

    /// Set handshake password (default: 0)
    pub fn with_password(mut self, password: u32) -> Self {
        self.config.password = password;
        self
    }

    /// Set the post-write settle delay
    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.config.settle_delay = delay;
        self
    }

    pub fn config(&self) -> &SensorConfig {
        &self.config
    }

    /// Check if connected
    pub fn is_connected(&self) -> bool {
        self.transport.is_connected()
    }

    /// Open the transport and verify the handshake password
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - The port cannot be opened
    /// - The sensor does not answer with a well-formed ack
    /// - The sensor rejects the password
    pub async fn connect(&mut self) -> Result<()> {
        info!("Connecting to {}...", self.transport.description());

        self.transport.connect().await?;

        let response = match self.verify_password().await {
            Ok(response) => response,
            Err(e) => {
                let _ = self.transport.disconnect().await;
                return Err(e);
            }
        };

        if !response.is_ok() {
            let _ = self.transport.disconnect().await;
            return Err(Error::SensorRejected {
                status: response.status,
            });
        }

        info!("Connected to sensor at {}", self.transport.description());
        Ok(())
    }

    /// Close the transport
    pub async fn disconnect(&mut self) -> Result<()> {
        if !self.is_connected() {
            return Ok(());
        }

        info!("Disconnecting from {}...", self.transport.description());

        self.transport.disconnect().await?;

        info!("Disconnected");
        Ok(())
    }

    /// Send one command and read its acknowledge packet
    ///
    /// The returned status may be anything; interpreting it is up to the
    /// caller.
    pub async fn send_command(&mut self, command: &Command) -> Result<Response> {
        self.ensure_connected()?;

        debug!("Sending command {}", command);

        let packet = Packet::new(self.config.address, PacketType::Command, command.payload());
        self.send_packet(&packet).await?;

        if !self.config.settle_delay.is_zero() {
            sleep(self.config.settle_delay).await;
        }

        let reply = reader::read_packet(&mut *self.transport, self.config.read_timeout).await?;
        let response = Response::from_packet(reply)?;

        debug!("{} -> status {}", command.opcode, response.status);

        Ok(response)
    }

    /// Verify the configured handshake password
    ///
    /// Returns the raw response so callers can tell a wrong password from a
    /// silent sensor.
    pub async fn verify_password(&mut self) -> Result<Response> {
        self.send_command(&Command::verify_password(self.config.password))
            .await
    }

    /// Read the basic system parameters
    pub async fn read_system_parameters(&mut self) -> Result<SystemParameters> {
        let response = self.send_command(&Command::read_system_parameters()).await?;
        let response = Self::require_ok(response)?;

        let params = SystemParameters::parse(&response.data)?;

        debug!("System parameters: {}", params);

        Ok(params)
    }

    /// Try once to capture a finger image into the sensor's image buffer
    pub async fn get_image(&mut self) -> Result<Status> {
        let response = self.send_command(&Command::get_image()).await?;
        Ok(response.status)
    }

    /// Convert the image buffer into a character file in `slot`
    pub async fn image_to_template(&mut self, slot: u8) -> Result<()> {
        let response = self.send_command(&Command::image_to_template(slot)).await?;
        Self::require_ok(response)?;

        debug!("Character file generated in slot {}", slot);
        Ok(())
    }

    /// Poll get-image until a finger is detected
    ///
    /// Returns `false` once `timeout` has elapsed without an OK status; it
    /// never gives up earlier. Every poll puts a command on the wire. Errors
    /// are returned immediately.
    pub async fn wait_for_finger(&mut self, poll_interval: Duration, timeout: Duration) -> Result<bool> {
        let deadline = Instant::now() + timeout;
        let mut polls: u32 = 0;

        info!("Waiting for finger...");

        loop {
            polls += 1;
            let status = self.get_image().await?;
            if status.is_ok() {
                info!("Finger detected after {} polls", polls);
                return Ok(true);
            }

            trace!("Poll {}: {}", polls, status);

            let now = Instant::now();
            if now >= deadline {
                debug!("No finger after {} polls", polls);
                return Ok(false);
            }

            sleep(poll_interval.min(deadline - now)).await;
        }
    }

    /// Capture a finger image and download it
    ///
    /// Both the get-image and the download-image steps must report OK.
    ///
    /// # Errors
    ///
    /// - [`Error::Types`] if the dimensions are empty or too large; nothing
    ///   is sent in that case
    /// - [`Error::SensorRejected`] if either step reports a non-OK status
    /// - Protocol errors from reassembly, unchanged
    pub async fn capture_image(&mut self, width: usize, height: usize) -> Result<FingerprintImage> {
        let expected = FingerprintImage::byte_len(width, height)?;

        let status = self.get_image().await?;
        if !status.is_ok() {
            return Err(Error::SensorRejected { status });
        }

        let response = self.send_command(&Command::download_image()).await?;
        Self::require_ok(response)?;

        let pixels = reader::reassemble(&mut *self.transport, self.config.read_timeout, expected).await?;

        let image = FingerprintImage::new(width, height, pixels)?;

        info!("Captured {}", image);

        Ok(image)
    }

    /// Capture an image with the configured dimensions
    pub async fn capture(&mut self) -> Result<FingerprintImage> {
        let (width, height) = (self.config.image_width, self.config.image_height);
        self.capture_image(width, height).await
    }

    // Helper methods

    /// Open the transport without the password handshake
    pub(crate) async fn transport_connect(&mut self) -> Result<()> {
        self.transport.connect().await?;
        Ok(())
    }

    fn ensure_connected(&self) -> Result<()> {
        if !self.is_connected() {
            return Err(Error::NotConnected);
        }
        Ok(())
    }

    fn require_ok(response: Response) -> Result<Response> {
        if !response.is_ok() {
            return Err(Error::SensorRejected {
                status: response.status,
            });
        }
        Ok(response)
    }

    async fn send_packet(&mut self, packet: &Packet) -> Result<()> {
        trace!("Sending: {:?}", packet);

        let data = packet.encode()?;
        self.transport.send(&data).await?;

        Ok(())
    }
}

impl Drop for Sensor {
    fn drop(&mut self) {
        if self.is_connected() {
            warn!("Sensor dropped while still connected to {}", self.transport.description());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use as608_core::{Error as ProtocolError, Opcode};
    use as608_transport::MemoryTransport;
    use pretty_assertions::assert_eq;

    fn ack(status: u8, data: &[u8]) -> Vec<u8> {
        let mut payload = vec![status];
        payload.extend_from_slice(data);
        as608_core::encode(0xFFFF_FFFF, PacketType::Ack, &payload).unwrap().to_vec()
    }

    /// Sensor that answers every command with `status`
    fn answering(status: u8) -> MemoryTransport {
        MemoryTransport::new().with_responder(move |_| ack(status, &[]))
    }

    async fn connected(transport: MemoryTransport) -> Sensor {
        let mut sensor = Sensor::new(transport).with_timeout(Duration::from_millis(50));
        sensor.connect().await.unwrap();
        sensor
    }

    #[test]
    fn test_sensor_create() {
        let sensor = Sensor::serial("/dev/ttyS0", 57600);
        assert!(!sensor.is_connected());
    }

    #[tokio::test]
    async fn test_connect_sends_verify_password() {
        let transport = answering(0x00);
        let handle = transport.clone();

        let mut sensor = connected(transport).await;
        assert!(sensor.is_connected());

        assert_eq!(
            handle.sent()[0].as_ref(),
            &[
                0xEF, 0x01, 0xFF, 0xFF, 0xFF, 0xFF, 0x01, 0x00, 0x07, 0x13, 0x00, 0x00, 0x00,
                0x00, 0x00, 0x1B
            ]
        );

        sensor.disconnect().await.unwrap();
        assert!(!sensor.is_connected());
    }

    #[tokio::test]
    async fn test_connect_wrong_password() {
        let mut sensor = Sensor::new(answering(0x13));

        let result = sensor.connect().await;

        assert_eq!(
            result.unwrap_err().rejected_status(),
            Some(Status::WrongPassword)
        );
        assert!(!sensor.is_connected());
    }

    #[tokio::test]
    async fn test_send_command_not_connected() {
        let mut sensor = Sensor::new(MemoryTransport::new());

        let result = sensor.send_command(&Command::get_image()).await;
        assert!(matches!(result, Err(Error::NotConnected)));
    }

    #[tokio::test]
    async fn test_send_command_returns_status() {
        let transport = MemoryTransport::new().with_responder(|data| {
            match Packet::decode(data).ok().and_then(|p| Command::decode(&p.payload).ok()) {
                Some(command) if command.opcode == Opcode::GetImage => ack(0x02, &[]),
                _ => ack(0x00, &[]),
            }
        });
        let mut sensor = connected(transport).await;

        let response = sensor.send_command(&Command::get_image()).await.unwrap();

        assert_eq!(response.packet_type, PacketType::Ack);
        assert_eq!(response.status, Status::NoFinger);
    }

    #[tokio::test]
    async fn test_send_command_rejects_bad_checksum() {
        let transport = MemoryTransport::new().with_responder(|_| {
            let mut reply = ack(0x00, &[]);
            let last = reply.len() - 1;
            reply[last] ^= 0xFF;
            reply
        });
        let mut sensor = Sensor::new(transport);

        let result = sensor.connect().await;
        assert!(matches!(
            result,
            Err(Error::Protocol(ProtocolError::ChecksumMismatch { .. }))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_settle_delay_applied() {
        let mut sensor = Sensor::new(answering(0x00))
            .with_settle_delay(Duration::from_millis(200));
        sensor.connect().await.unwrap();

        let start = Instant::now();
        sensor.get_image().await.unwrap();

        assert_eq!(start.elapsed(), Duration::from_millis(200));
    }

    #[tokio::test]
    async fn test_read_system_parameters() {
        let params = [
            0x00, 0x00, 0x00, 0x09, 0x01, 0x2C, 0x00, 0x03, 0xFF, 0xFF, 0xFF, 0xFF, 0x00, 0x02,
            0x00, 0x06,
        ];
        let transport = MemoryTransport::new().with_responder(move |data| {
            match Packet::decode(data).ok().and_then(|p| Command::decode(&p.payload).ok()) {
                Some(command) if command.opcode == Opcode::ReadSystemParameters => ack(0x00, &params),
                _ => ack(0x00, &[]),
            }
        });
        let mut sensor = connected(transport).await;

        let params = sensor.read_system_parameters().await.unwrap();

        assert_eq!(params.library_size, 300);
        assert_eq!(params.baud_rate(), 57600);
    }

    #[tokio::test]
    async fn test_image_to_template_rejected() {
        let transport = MemoryTransport::new().with_responder(|data| {
            match Packet::decode(data).ok().and_then(|p| Command::decode(&p.payload).ok()) {
                Some(command) if command.opcode == Opcode::ImageToTemplate => ack(0x06, &[]),
                _ => ack(0x00, &[]),
            }
        });
        let mut sensor = connected(transport).await;

        let result = sensor.image_to_template(1).await;
        assert_eq!(
            result.unwrap_err().rejected_status(),
            Some(Status::ImageTooDisordered)
        );
    }
}

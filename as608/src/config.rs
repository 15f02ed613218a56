//! Sensor session configuration

use std::time::Duration;

use as608_core::constants::{image, BROADCAST_ADDRESS, DEFAULT_PASSWORD};

/// Session settings
///
/// Timing values are hardware settling constraints of the sensor family and
/// vary between modules, so none of them are hard-coded in the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorConfig {
    /// Module address placed in every command packet
    pub address: u32,

    /// Handshake password sent by `verify_password`
    pub password: u32,

    /// Upper bound for each packet read
    pub read_timeout: Duration,

    /// Pause after each write before reading the reply (zero disables)
    pub settle_delay: Duration,

    /// Delay between get-image polls in `wait_for_finger`
    pub poll_interval: Duration,

    pub image_width: usize,
    pub image_height: usize,
}

impl SensorConfig {
    pub fn with_address(mut self, address: u32) -> Self {
        self.address = address;
        self
    }

    pub fn with_password(mut self, password: u32) -> Self {
        self.password = password;
        self
    }

    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_image_size(mut self, width: usize, height: usize) -> Self {
        self.image_width = width;
        self.image_height = height;
        self
    }

    /// Expected image length in bytes
    pub fn image_len(&self) -> usize {
        self.image_width * self.image_height
    }
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            address: BROADCAST_ADDRESS,
            password: DEFAULT_PASSWORD,
            read_timeout: Duration::from_secs(1),
            settle_delay: Duration::ZERO,
            poll_interval: Duration::from_millis(100),
            image_width: image::WIDTH,
            image_height: image::HEIGHT,
        }
    }
}

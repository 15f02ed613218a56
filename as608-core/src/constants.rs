//! Protocol constants

/// Start code at the head of every packet (high byte first)
pub const START_CODE: u16 = 0xEF01;

/// Broadcast module address (factory default)
pub const BROADCAST_ADDRESS: u32 = 0xFFFF_FFFF;

/// Factory default password
pub const DEFAULT_PASSWORD: u32 = 0x0000_0000;

/// Factory default UART baud rate
pub const DEFAULT_BAUD_RATE: u32 = 57600;

/// Baud rates are configured as multiples of this value
pub const BAUD_RATE_UNIT: u32 = 9600;

/// Image dimensions of the AS608/ZA620 sensor family
pub mod image {
    /// Image width in pixels
    pub const WIDTH: usize = 256;

    /// Image height in pixels
    pub const HEIGHT: usize = 288;

    /// One byte per pixel, row-major
    pub const SIZE: usize = WIDTH * HEIGHT;
}

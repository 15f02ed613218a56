//! # as608
//!
//! Rust driver for AS608/ZA620-class optical fingerprint sensors on a UART
//! link.
//!
//! ## Features
//!
//! - Type-safe packet codec with checksum verification
//! - Async/await API using Tokio
//! - Multi-packet image download with strict size checking
//! - Port and baud rate discovery
//! - BMP persistence of captured images
//!
//! ## Quick Start
//!
//! ```no_run
//! use as608::{DirectorySink, ImageSink, Sensor};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> as608::Result<()> {
//!     // Connect to sensor
//!     let mut sensor = Sensor::serial("/dev/ttyS0", 57600);
//!     sensor.connect().await?;
//!     
//!     // Wait up to 10 seconds for a finger
//!     if sensor.wait_for_finger(Duration::from_millis(100), Duration::from_secs(10)).await? {
//!         let image = sensor.capture().await?;
//!         let path = DirectorySink::default().save(&image).await?;
//!         println!("Saved {}", path.display());
//!     }
//!     
//!     // Disconnect
//!     sensor.disconnect().await?;
//!     
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod discovery;
pub mod error;
pub mod reader;
pub mod sensor;
pub mod sink;

// Re-exports
pub use config::SensorConfig;
pub use discovery::{discover, Candidate};
pub use error::{Error, Result};
pub use sensor::Sensor;
pub use sink::{DirectorySink, ImageSink};

// Re-export protocol and transport types
pub use as608_core::{Command, Error as ProtocolError, Opcode, Packet, PacketType, Response, Status};
pub use as608_transport::{Error as TransportError, MemoryTransport, SerialTransport, Transport};
pub use as608_types::{FingerprintImage, StatusRegister, SystemParameters};

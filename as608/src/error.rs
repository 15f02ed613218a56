//! High-level error types

use as608_core::Status;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Protocol error: {0}")]
    Protocol(#[from] as608_core::Error),
    
    #[error("Transport error: {0}")]
    Transport(#[from] as608_transport::Error),
    
    #[error("Type error: {0}")]
    Types(#[from] as608_types::Error),
    
    #[error("Sensor not connected")]
    NotConnected,
    
    #[error("Sensor rejected command: {status}")]
    SensorRejected {
        status: Status,
    },
    
    #[error("No sensor answered on any of {tried} port/baud candidates")]
    DiscoveryFailed {
        tried: usize,
    },
    
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Status code if the sensor answered but refused the command
    pub fn rejected_status(&self) -> Option<Status> {
        match self {
            Self::SensorRejected { status } => Some(*status),
            _ => None,
        }
    }
}

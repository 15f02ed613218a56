//! Port and baud rate discovery
//!
//! Tries a ranked list of `(path, baud)` candidates with a short read
//! timeout and keeps the first one where the sensor answers verify-password
//! with a well-formed acknowledge packet. The status inside that ack does not
//! matter here; a wrong password still proves a sensor is listening.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use tracing::{debug, info};

use as608_core::constants::DEFAULT_BAUD_RATE;
use as608_transport::{SerialTransport, Transport};

use crate::config::SensorConfig;
use crate::error::{Error, Result};
use crate::sensor::Sensor;

/// Serial devices the sensor is usually wired to, most likely first
pub const DEFAULT_PORTS: &[&str] = &["/dev/ttyS0", "/dev/serial0", "/dev/ttyAMA0", "/dev/ttyUSB0"];

/// Baud rates to try, factory default first
pub const DEFAULT_BAUD_RATES: &[u32] = &[DEFAULT_BAUD_RATE, 115200, 9600, 19200, 38400];

/// One port/baud combination to probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub path: String,
    pub baud_rate: u32,
}

impl Candidate {
    pub fn new(path: impl Into<String>, baud_rate: u32) -> Self {
        Self {
            path: path.into(),
            baud_rate,
        }
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.path, self.baud_rate)
    }
}

/// Every port crossed with every baud rate, port-major
pub fn ranked_candidates<P: AsRef<str>>(ports: &[P], baud_rates: &[u32]) -> Vec<Candidate> {
    ports
        .iter()
        .flat_map(|port| {
            baud_rates
                .iter()
                .map(move |&baud| Candidate::new(port.as_ref(), baud))
        })
        .collect()
}

/// Default candidates: the usual ports, then any other port the OS reports
pub fn default_candidates() -> Vec<Candidate> {
    let mut ports: Vec<String> = DEFAULT_PORTS.iter().map(|p| p.to_string()).collect();

    match tokio_serial::available_ports() {
        Ok(available) => {
            for info in available {
                if !ports.contains(&info.port_name) {
                    ports.push(info.port_name);
                }
            }
        }
        Err(e) => debug!("Could not enumerate serial ports: {}", e),
    }

    ranked_candidates(&ports, DEFAULT_BAUD_RATES)
}

/// Probe serial candidates in order
///
/// `probe_timeout` replaces the configured read timeout while probing; the
/// returned session uses `config` unchanged.
pub async fn discover(
    candidates: &[Candidate],
    config: SensorConfig,
    probe_timeout: Duration,
) -> Result<(Candidate, Sensor)> {
    discover_with(candidates, config, probe_timeout, |candidate| async move {
        Ok(Box::new(SerialTransport::new(candidate.path, candidate.baud_rate)) as Box<dyn Transport>)
    })
    .await
}

/// Probe candidates using `open` to build each transport
pub async fn discover_with<F, Fut>(
    candidates: &[Candidate],
    config: SensorConfig,
    probe_timeout: Duration,
    mut open: F,
) -> Result<(Candidate, Sensor)>
where
    F: FnMut(Candidate) -> Fut,
    Fut: Future<Output = Result<Box<dyn Transport>>>,
{
    info!("Probing {} port/baud candidates...", candidates.len());

    for candidate in candidates {
        let transport = match open(candidate.clone()).await {
            Ok(transport) => transport,
            Err(e) => {
                debug!("{}: {}", candidate, e);
                continue;
            }
        };

        let mut sensor = Sensor::from_boxed(transport)
            .with_config(config.clone())
            .with_timeout(probe_timeout);

        if let Err(e) = sensor.transport_connect().await {
            debug!("{}: {}", candidate, e);
            continue;
        }

        match sensor.verify_password().await {
            Ok(response) => {
                info!("Sensor found on {} (status {})", candidate, response.status);
                return Ok((candidate.clone(), sensor.with_config(config)));
            }
            Err(e) => {
                debug!("{}: {}", candidate, e);
                let _ = sensor.disconnect().await;
            }
        }
    }

    Err(Error::DiscoveryFailed {
        tried: candidates.len(),
    })
}

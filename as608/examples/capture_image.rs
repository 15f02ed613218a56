//! Capture one fingerprint image and save it as BMP

use std::time::Duration;

use as608::{DirectorySink, ImageSink, Sensor};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging (RUST_LOG=as608=trace for wire dumps)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Change to your wiring
    let port = std::env::var("SENSOR_PORT").unwrap_or_else(|_| "/dev/ttyS0".to_string());
    let baud = std::env::var("SENSOR_BAUD")
        .ok()
        .and_then(|b| b.parse().ok())
        .unwrap_or(57600);

    println!("Connecting to {} at {} baud...", port, baud);

    let mut sensor = Sensor::serial(port, baud).with_settle_delay(Duration::from_millis(50));
    sensor.connect().await?;
    println!("✓ Connected!");

    let params = sensor.read_system_parameters().await?;
    println!("✓ Sensor: {}", params);

    println!("Place your finger on the sensor...");
    let poll_interval = sensor.config().poll_interval;
    if !sensor.wait_for_finger(poll_interval, Duration::from_secs(15)).await? {
        println!("✗ No finger detected");
        sensor.disconnect().await?;
        return Ok(());
    }

    let image = sensor.capture().await?;
    let path = DirectorySink::default().save(&image).await?;
    println!("✓ Saved {} to {}", image, path.display());

    sensor.disconnect().await?;
    println!("✓ Disconnected");

    Ok(())
}

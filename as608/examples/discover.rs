//! Find the port and baud rate a sensor is listening on

use std::time::Duration;

use as608::{discover, discovery, SensorConfig};

#[tokio::main]
async fn main() -> as608::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let candidates = discovery::default_candidates();
    println!("Trying {} candidates...", candidates.len());

    let (found, mut sensor) =
        discover(&candidates, SensorConfig::default(), Duration::from_millis(200)).await?;
    println!("✓ Sensor on {}", found);

    let params = sensor.read_system_parameters().await?;
    println!("✓ {}", params);

    sensor.disconnect().await?;

    Ok(())
}

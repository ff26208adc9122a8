use anyhow::Result;
use std::time::Duration;
use tracing::{info, warn};
use orient_config::AppConfig;
use orient_core::{FusionClient, FusionSettings};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "orient_app=info,orient_core=info".into()),
        )
        .init();

    info!("Orientation fusion starting");

    // Load config.
    let config = orient_config::load_config().unwrap_or_else(|e| {
        warn!(?e, "Failed to load config, using defaults");
        AppConfig::default()
    });

    let settings = FusionSettings {
        alpha: config.fusion.alpha,
        degrees_scale: config.fusion.degrees_scale,
    };
    info!(alpha = settings.alpha, degrees_scale = settings.degrees_scale, "Config loaded");

    // A path argument replays a recorded sample file instead of connecting live.
    if let Some(path) = std::env::args().nth(1) {
        let client = FusionClient::replay(&path, settings).await?;
        let last = client.finish().await?;
        let [pitch, roll, yaw] = last.pitch_roll_yaw.to_array();
        info!(pitch, roll, yaw, timestamp_ns = last.timestamp_ns, "Replay finished");
        return Ok(());
    }

    // Connect to the sensor bridge (fall back to mock if nothing is listening).
    let client = match FusionClient::connect(&config.source.address, settings).await {
        Ok(client) => client,
        Err(e) => {
            warn!(?e, "Sensor bridge not available, using mock (no orientation updates)");
            FusionClient::mock()
        }
    };

    let mut ticker = tokio::time::interval(Duration::from_millis(config.source.print_interval_ms));
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let orientation = client.orientation();
                let [pitch, roll, yaw] = orientation.pitch_roll_yaw.to_array();
                info!(pitch, roll, yaw, timestamp_ns = orientation.timestamp_ns, "Fused orientation");
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down");
                client.stop();
                break;
            }
        }
    }

    Ok(())
}

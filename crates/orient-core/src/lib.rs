pub mod fusion;
pub mod geometry;
pub mod integrator;
pub mod listener;
pub mod protocol;
pub mod source;
pub mod tracker;
pub mod types;

use anyhow::Result;
use fusion::SensorFusion;
use listener::FusionListeners;
use protocol::ProtocolParser;
use source::Subscriptions;
use std::path::Path;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use types::{FusedOrientation, SensorSample};

/// Filter parameters for a [`FusionClient`].
#[derive(Debug, Clone, Copy)]
pub struct FusionSettings {
    /// Gyro weight in the complementary blend, within [0, 1].
    pub alpha: f32,
    /// Radians-to-degrees factor applied to reported angles.
    pub degrees_scale: f32,
}

impl Default for FusionSettings {
    fn default() -> Self {
        Self {
            alpha: 0.995,
            degrees_scale: -57.0,
        }
    }
}

/// Commands sent to the fusion task.
enum FusionCommand {
    Start,
    Stop,
    Reset,
}

/// Client for a stream of motion-sensor samples.
///
/// Reads sample lines from a TCP bridge or a recorded file, runs the
/// complementary filter, and publishes the latest fused orientation.
pub struct FusionClient {
    orientation_rx: watch::Receiver<FusedOrientation>,
    command_tx: mpsc::UnboundedSender<FusionCommand>,
    task: tokio::task::JoinHandle<()>,
}

impl FusionClient {
    /// Connect to a sensor bridge streaming sample lines over TCP.
    pub async fn connect(addr: &str, settings: FusionSettings) -> Result<Self> {
        tracing::info!(%addr, "Connecting to sensor bridge");
        let stream = TcpStream::connect(addr).await?;
        tracing::info!("Connected to sensor bridge");
        Self::from_reader(stream, settings)
    }

    /// Replay a recorded sample file as fast as it can be read.
    pub async fn replay(path: impl AsRef<Path>, settings: FusionSettings) -> Result<Self> {
        let path = path.as_ref();
        let file = tokio::fs::File::open(path).await?;
        tracing::info!(?path, "Replaying recorded samples");
        Self::from_reader(file, settings)
    }

    /// Run the fusion pipeline over any byte stream of sample lines.
    pub fn from_reader<R>(reader: R, settings: FusionSettings) -> Result<Self>
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let fusion = SensorFusion::new(
            settings.alpha,
            settings.degrees_scale,
            diagnostic_listeners(),
        )?;

        let (orientation_tx, orientation_rx) = watch::channel(FusedOrientation::default());
        let (command_tx, command_rx) = mpsc::unbounded_channel();

        let task = tokio::spawn(fusion_read_loop(reader, fusion, orientation_tx, command_rx));

        Ok(Self {
            orientation_rx,
            command_tx,
            task,
        })
    }

    /// Create a mock client that never produces samples.
    pub fn mock() -> Self {
        let (orientation_tx, orientation_rx) = watch::channel(FusedOrientation::default());
        let (command_tx, _) = mpsc::unbounded_channel();
        let task = tokio::spawn(async move {
            // Keep the sender alive.
            let _tx = orientation_tx;
            tokio::signal::ctrl_c().await.ok();
        });
        Self {
            orientation_rx,
            command_tx,
            task,
        }
    }

    /// Get the latest fused orientation (non-blocking).
    pub fn orientation(&self) -> FusedOrientation {
        *self.orientation_rx.borrow()
    }

    /// A receiver that can await orientation changes.
    pub fn watch(&self) -> watch::Receiver<FusedOrientation> {
        self.orientation_rx.clone()
    }

    /// Resume processing after `stop`. Trajectories are kept.
    pub fn start(&self) {
        let _ = self.command_tx.send(FusionCommand::Start);
    }

    /// Pause processing; incoming samples are dropped.
    pub fn stop(&self) {
        let _ = self.command_tx.send(FusionCommand::Stop);
    }

    /// Zero all trajectories.
    pub fn reset(&self) {
        let _ = self.command_tx.send(FusionCommand::Reset);
    }

    /// Wait for the sample stream to end and return the last fused orientation.
    pub async fn finish(self) -> Result<FusedOrientation> {
        let Self {
            orientation_rx,
            command_tx,
            task,
        } = self;
        drop(command_tx);
        task.await?;
        let last = *orientation_rx.borrow();
        Ok(last)
    }
}

fn diagnostic_listeners() -> FusionListeners {
    FusionListeners::new()
        .on_gyro(|v, timestamp_ns| {
            tracing::trace!(pitch = v.x, roll = v.y, yaw = v.z, timestamp_ns, "Gyro orientation");
        })
        .on_acc_mag(|v, timestamp_ns| {
            tracing::trace!(pitch = v.x, roll = v.y, yaw = v.z, timestamp_ns, "Acc/mag orientation");
        })
        .on_absolute(|v, timestamp_ns| {
            tracing::trace!(azimuth = v.x, pitch = v.y, roll = v.z, timestamp_ns, "Absolute orientation");
        })
}

/// Background task: read the byte stream, parse samples, run fusion, publish orientation.
async fn fusion_read_loop<R>(
    mut reader: R,
    mut fusion: SensorFusion,
    orientation_tx: watch::Sender<FusedOrientation>,
    mut command_rx: mpsc::UnboundedReceiver<FusionCommand>,
) where
    R: AsyncRead + Unpin,
{
    let mut parser = ProtocolParser::new();
    let mut subscriptions = Subscriptions::new();
    let mut buf = [0u8; 4096];
    let mut sample_count: u64 = 0;

    if let Err(e) = fusion.start(&mut subscriptions) {
        tracing::error!(%e, "Failed to start sensor fusion");
        return;
    }

    loop {
        tokio::select! {
            biased;

            Some(cmd) = command_rx.recv() => {
                match cmd {
                    FusionCommand::Start => {
                        if let Err(e) = fusion.start(&mut subscriptions) {
                            tracing::warn!(%e, "Failed to restart sensor fusion");
                        }
                    }
                    FusionCommand::Stop => fusion.stop(&mut subscriptions),
                    FusionCommand::Reset => {
                        fusion.reset();
                        let _ = orientation_tx.send(FusedOrientation::default());
                    }
                }
            }
            result = reader.read(&mut buf) => {
                match result {
                    Ok(0) => {
                        if let Some(result) = parser.finish() {
                            match result {
                                Ok(sample) => process_sample(&sample, &mut fusion, &subscriptions, &orientation_tx),
                                Err(e) => tracing::warn!(%e, "Skipping malformed sample line"),
                            }
                        }
                        tracing::info!(sample_count, "Sample stream ended");
                        break;
                    }
                    Ok(n) => {
                        parser.push_data(&buf[..n]);

                        // Drain all available samples.
                        while let Some(result) = parser.next_sample() {
                            match result {
                                Ok(sample) => {
                                    process_sample(&sample, &mut fusion, &subscriptions, &orientation_tx);
                                    sample_count += 1;
                                    if sample_count % 1000 == 0 {
                                        tracing::debug!(sample_count, "Sensor samples processed");
                                    }
                                }
                                Err(e) => {
                                    tracing::warn!(%e, "Skipping malformed sample line");
                                }
                            }
                        }
                    }
                    Err(e) => {
                        tracing::error!(?e, "Sample stream read error");
                        break;
                    }
                }
            }
        }
    }
}

fn process_sample(
    sample: &SensorSample,
    fusion: &mut SensorFusion,
    subscriptions: &Subscriptions,
    orientation_tx: &watch::Sender<FusedOrientation>,
) {
    if !subscriptions.is_subscribed(sample.kind) {
        tracing::trace!(kind = ?sample.kind, "Dropping sample for unsubscribed stream");
        return;
    }
    if let Some(orientation) = fusion.handle(sample) {
        let _ = orientation_tx.send(orientation);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;

    const GYRO_YAW: &[u8] = b"G,1000000000,0,0,1\nG,2000000000,0,0,1\n";

    #[tokio::test]
    async fn publishes_fused_orientation() {
        let (reader, mut writer) = tokio::io::duplex(1024);
        let settings = FusionSettings {
            alpha: 1.0,
            ..FusionSettings::default()
        };
        let client = FusionClient::from_reader(reader, settings).unwrap();

        writer.write_all(GYRO_YAW).await.unwrap();
        drop(writer);

        let last = client.finish().await.unwrap();
        assert_eq!(last.timestamp_ns, 2_000_000_000);
        assert!((last.pitch_roll_yaw.z + 57.0).abs() < 1e-4);
        assert!(last.pitch_roll_yaw.x.abs() < 1e-6);
    }

    #[tokio::test]
    async fn stopped_client_drops_samples() {
        let (reader, mut writer) = tokio::io::duplex(1024);
        let client = FusionClient::from_reader(reader, FusionSettings::default()).unwrap();
        client.stop();

        writer.write_all(GYRO_YAW).await.unwrap();
        drop(writer);

        let last = client.finish().await.unwrap();
        assert_eq!(last, FusedOrientation::default());
    }

    #[tokio::test]
    async fn malformed_lines_are_skipped() {
        let (reader, mut writer) = tokio::io::duplex(1024);
        let settings = FusionSettings {
            alpha: 1.0,
            ..FusionSettings::default()
        };
        let client = FusionClient::from_reader(reader, settings).unwrap();

        writer
            .write_all(b"G,1000000000,0,0,1\nbogus\nG,2000000000,0,0,1")
            .await
            .unwrap();
        drop(writer);

        // Unterminated final line is still parsed at end of stream.
        let last = client.finish().await.unwrap();
        assert_eq!(last.timestamp_ns, 2_000_000_000);
    }

    #[tokio::test]
    async fn replay_reads_recorded_file() {
        let path = std::env::temp_dir().join(format!("orient-replay-{}.csv", std::process::id()));
        std::fs::write(&path, "# yaw at 1 rad/s\nM,0,0,22,-40\nA,0,0,0,9.81\nG,1000000000,0,0,1\nG,2000000000,0,0,1\n").unwrap();

        let settings = FusionSettings {
            alpha: 1.0,
            ..FusionSettings::default()
        };
        let client = FusionClient::replay(&path, settings).await.unwrap();
        let last = client.finish().await.unwrap();
        std::fs::remove_file(&path).ok();

        assert!((last.pitch_roll_yaw.z + 57.0).abs() < 1e-4);
    }

    #[tokio::test]
    async fn rejects_invalid_alpha() {
        let (reader, _writer) = tokio::io::duplex(64);
        let settings = FusionSettings {
            alpha: 2.0,
            ..FusionSettings::default()
        };
        assert!(FusionClient::from_reader(reader, settings).is_err());
    }
}

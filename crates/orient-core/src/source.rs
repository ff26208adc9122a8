use crate::types::SensorKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("No {0:?} sensor available")]
    Unavailable(SensorKind),
}

/// Capability to start and stop delivery of a sensor stream.
///
/// Supplied by whoever owns the transport; the fusion engine only borrows it
/// for the duration of `start`/`stop`.
pub trait SensorSource {
    fn subscribe(&mut self, kind: SensorKind) -> Result<(), SourceError>;
    fn unsubscribe(&mut self, kind: SensorKind);
}

/// Per-stream subscription flags for in-process transports.
///
/// Transports check [`Subscriptions::is_subscribed`] and drop samples for
/// streams nobody listens to.
#[derive(Debug, Clone, Default)]
pub struct Subscriptions {
    gyroscope: bool,
    accelerometer: bool,
    magnetometer: bool,
}

impl Subscriptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_subscribed(&self, kind: SensorKind) -> bool {
        *self.flag(kind)
    }

    fn flag(&self, kind: SensorKind) -> &bool {
        match kind {
            SensorKind::Gyroscope => &self.gyroscope,
            SensorKind::Accelerometer => &self.accelerometer,
            SensorKind::Magnetometer => &self.magnetometer,
        }
    }

    fn flag_mut(&mut self, kind: SensorKind) -> &mut bool {
        match kind {
            SensorKind::Gyroscope => &mut self.gyroscope,
            SensorKind::Accelerometer => &mut self.accelerometer,
            SensorKind::Magnetometer => &mut self.magnetometer,
        }
    }
}

impl SensorSource for Subscriptions {
    fn subscribe(&mut self, kind: SensorKind) -> Result<(), SourceError> {
        *self.flag_mut(kind) = true;
        tracing::debug!(?kind, "Subscribed");
        Ok(())
    }

    fn unsubscribe(&mut self, kind: SensorKind) {
        *self.flag_mut(kind) = false;
        tracing::debug!(?kind, "Unsubscribed");
    }
}

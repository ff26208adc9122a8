use crate::geometry::{GravityMagneticSolver, OrientationSolver};
use crate::integrator::GyroIntegrator;
use crate::listener::FusionListeners;
use crate::source::{SensorSource, SourceError};
use crate::tracker::AbsoluteTracker;
use crate::types::{FusedOrientation, SensorKind, SensorSample, Trajectory};
use glam::Vec3;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FusionError {
    #[error("Filter coefficient must be within [0, 1], got {0}")]
    InvalidAlpha(f32),
    #[error("Failed to subscribe to sensor stream")]
    Source(#[from] SourceError),
}

/// Fixed-weight blend of the gyro trajectory (high-pass) with the absolute
/// trajectory (low-pass).
#[derive(Debug, Clone)]
pub struct ComplementaryFilter {
    alpha: f32,
    one_minus_alpha: f32,
    fused: Trajectory,
}

impl ComplementaryFilter {
    pub fn new(alpha: f32) -> Result<Self, FusionError> {
        if !alpha.is_finite() || !(0.0..=1.0).contains(&alpha) {
            return Err(FusionError::InvalidAlpha(alpha));
        }
        Ok(Self {
            alpha,
            one_minus_alpha: 1.0 - alpha,
            fused: Trajectory::ZERO,
        })
    }

    /// Blend and feed the result back as the integrator's corrected baseline.
    pub fn blend(&mut self, gyro: &mut GyroIntegrator, absolute: Trajectory) -> Trajectory {
        self.fused = self.alpha * gyro.corrected() + self.one_minus_alpha * absolute;
        gyro.set_corrected(self.fused);
        self.fused
    }

    pub fn reset(&mut self) {
        self.fused = Trajectory::ZERO;
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn fused(&self) -> Trajectory {
        self.fused
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Stopped,
    Running,
}

/// Complementary-filter orientation engine.
///
/// Every gyro sample runs integrate -> notify gyro -> blend -> notify fused.
/// Accelerometer samples recompute the absolute trajectory once a magnetic
/// sample has been cached; magnetic samples only update the cache.
pub struct SensorFusion {
    state: EngineState,
    integrator: GyroIntegrator,
    tracker: AbsoluteTracker,
    filter: ComplementaryFilter,
    solver: Box<dyn OrientationSolver>,
    listeners: FusionListeners,
    /// Radians to reported degrees.
    degrees_scale: f32,
    gravity: Option<Vec3>,
    magnetic: Option<Vec3>,
}

impl SensorFusion {
    pub fn new(
        alpha: f32,
        degrees_scale: f32,
        listeners: FusionListeners,
    ) -> Result<Self, FusionError> {
        Self::with_solver(alpha, degrees_scale, GravityMagneticSolver, listeners)
    }

    pub fn with_solver(
        alpha: f32,
        degrees_scale: f32,
        solver: impl OrientationSolver + 'static,
        listeners: FusionListeners,
    ) -> Result<Self, FusionError> {
        Ok(Self {
            state: EngineState::Stopped,
            integrator: GyroIntegrator::new(),
            tracker: AbsoluteTracker::new(),
            filter: ComplementaryFilter::new(alpha)?,
            solver: Box::new(solver),
            listeners,
            degrees_scale,
            gravity: None,
            magnetic: None,
        })
    }

    /// Subscribe to all three streams and begin processing.
    ///
    /// Accumulated trajectories are kept; only the gyro timestamp baseline is
    /// dropped so the gap while stopped is not integrated.
    pub fn start(&mut self, source: &mut dyn SensorSource) -> Result<(), FusionError> {
        if self.state == EngineState::Running {
            return Ok(());
        }

        for (i, kind) in SensorKind::ALL.into_iter().enumerate() {
            if let Err(e) = source.subscribe(kind) {
                for subscribed in &SensorKind::ALL[..i] {
                    source.unsubscribe(*subscribed);
                }
                return Err(e.into());
            }
        }

        self.integrator.restart();
        self.state = EngineState::Running;
        tracing::info!(alpha = self.filter.alpha(), "Sensor fusion started");
        Ok(())
    }

    /// Unsubscribe from all streams. State is retained.
    pub fn stop(&mut self, source: &mut dyn SensorSource) {
        if self.state == EngineState::Stopped {
            return;
        }
        for kind in SensorKind::ALL {
            source.unsubscribe(kind);
        }
        self.state = EngineState::Stopped;
        tracing::info!("Sensor fusion stopped");
    }

    /// Zero every trajectory and drop all cached baselines. Subscriptions are untouched.
    pub fn reset(&mut self) {
        self.integrator.reset();
        self.tracker.reset();
        self.filter.reset();
        self.gravity = None;
        self.magnetic = None;
        tracing::info!("Sensor fusion reset");
    }

    /// Route a sample to its handler. Returns the fused orientation on gyro samples.
    pub fn handle(&mut self, sample: &SensorSample) -> Option<FusedOrientation> {
        match sample.kind {
            SensorKind::Gyroscope => {
                self.on_angular_velocity(sample.values, sample.timestamp_ns)
            }
            SensorKind::Accelerometer => {
                self.on_acceleration(sample.values, sample.timestamp_ns);
                None
            }
            SensorKind::Magnetometer => {
                self.on_magnetic_field(sample.values, sample.timestamp_ns);
                None
            }
        }
    }

    pub fn on_angular_velocity(
        &mut self,
        angular_velocity: Vec3,
        timestamp_ns: i64,
    ) -> Option<FusedOrientation> {
        if !self.is_running() {
            return None;
        }

        self.integrator.integrate(angular_velocity, timestamp_ns);
        self.listeners
            .gyro(self.integrator.raw() * self.degrees_scale, timestamp_ns);

        let fused = self
            .filter
            .blend(&mut self.integrator, self.tracker.trajectory())
            * self.degrees_scale;
        self.listeners.fused(fused, timestamp_ns);

        Some(FusedOrientation {
            pitch_roll_yaw: fused,
            timestamp_ns,
        })
    }

    pub fn on_acceleration(&mut self, acceleration: Vec3, timestamp_ns: i64) {
        if !self.is_running() {
            return;
        }
        self.gravity = Some(acceleration);
        self.update_absolute(timestamp_ns);
    }

    /// Recompute the absolute trajectory from the cached gravity and magnetic samples.
    fn update_absolute(&mut self, timestamp_ns: i64) {
        let (Some(gravity), Some(magnetic)) = (self.gravity, self.magnetic) else {
            tracing::trace!("No magnetic sample yet, skipping absolute orientation");
            return;
        };

        match self
            .tracker
            .update(self.solver.as_ref(), gravity, magnetic)
        {
            Ok(update) => {
                let absolute = update.orientation().to_degrees(self.degrees_scale);
                self.listeners.absolute(absolute, timestamp_ns);
            }
            Err(e) => {
                tracing::error!(%e, "Failed to compute acc/mag orientation");
            }
        }

        self.listeners
            .acc_mag(self.tracker.trajectory() * self.degrees_scale, timestamp_ns);
    }

    pub fn on_magnetic_field(&mut self, magnetic: Vec3, _timestamp_ns: i64) {
        if !self.is_running() {
            return;
        }
        self.magnetic = Some(magnetic);
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == EngineState::Running
    }

    pub fn alpha(&self) -> f32 {
        self.filter.alpha()
    }

    pub fn degrees_scale(&self) -> f32 {
        self.degrees_scale
    }

    pub fn gyro_trajectory_raw(&self) -> Trajectory {
        self.integrator.raw()
    }

    pub fn gyro_trajectory_corrected(&self) -> Trajectory {
        self.integrator.corrected()
    }

    pub fn absolute_trajectory(&self) -> Trajectory {
        self.tracker.trajectory()
    }

    pub fn fused_trajectory(&self) -> Trajectory {
        self.filter.fused()
    }

    /// Latest gravity sample seen since the last reset.
    pub fn gravity(&self) -> Option<Vec3> {
        self.gravity
    }
}

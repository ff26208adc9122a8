use crate::types::Trajectory;
use glam::Vec3;

/// Nanoseconds to seconds.
const NS2S: f64 = 1.0e-9;

/// Rectangular-rule integration of angular velocity.
///
/// Maintains two trajectories fed by the same increments: `raw`, which only
/// ever accumulates, and `corrected`, which the complementary filter
/// overwrites after every blend.
#[derive(Debug, Clone, Default)]
pub struct GyroIntegrator {
    prev_timestamp_ns: Option<i64>,
    raw: Trajectory,
    corrected: Trajectory,
}

impl GyroIntegrator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Integrate one angular-velocity sample (rad/s) and return the increment.
    ///
    /// The first sample after construction, `reset` or `restart` has no
    /// baseline timestamp and contributes a zero increment. The baseline is
    /// tracked explicitly, so a stream whose first timestamp is 0 still
    /// integrates its second sample instead of treating 0 as "no baseline".
    ///
    /// A timestamp that does not move forward (or whose difference overflows)
    /// also contributes zero; it still becomes the new baseline.
    pub fn integrate(&mut self, angular_velocity: Vec3, timestamp_ns: i64) -> Vec3 {
        let delta = match self.prev_timestamp_ns {
            Some(prev) => match timestamp_ns.checked_sub(prev) {
                Some(elapsed) if elapsed >= 0 => {
                    let dt = (elapsed as f64 * NS2S) as f32;
                    angular_velocity * dt
                }
                _ => {
                    tracing::warn!(prev, timestamp_ns, "Non-monotonic gyro timestamp, skipping step");
                    Vec3::ZERO
                }
            },
            None => Vec3::ZERO,
        };
        self.prev_timestamp_ns = Some(timestamp_ns);

        self.raw += delta;
        self.corrected += delta;
        delta
    }

    /// Forget the previous timestamp but keep both trajectories.
    pub fn restart(&mut self) {
        self.prev_timestamp_ns = None;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn raw(&self) -> Trajectory {
        self.raw
    }

    pub fn corrected(&self) -> Trajectory {
        self.corrected
    }

    /// Feedback from the filter: the blended value becomes the new baseline.
    pub fn set_corrected(&mut self, fused: Trajectory) {
        self.corrected = fused;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_sample_is_zero_delta() {
        let mut gyro = GyroIntegrator::new();
        let delta = gyro.integrate(Vec3::new(5.0, -3.0, 100.0), 42_000_000);
        assert_eq!(delta, Vec3::ZERO);
        assert_eq!(gyro.raw(), Vec3::ZERO);
        assert_eq!(gyro.corrected(), Vec3::ZERO);
    }

    #[test]
    fn constant_rate_integrates_linearly() {
        let mut gyro = GyroIntegrator::new();
        let omega = Vec3::new(0.5, -1.0, 2.0);
        gyro.integrate(omega, 1_000_000_000);
        gyro.integrate(omega, 1_250_000_000);

        let expected = omega * 0.25;
        assert!((gyro.raw() - expected).length() < 1e-6);
        assert!((gyro.corrected() - expected).length() < 1e-6);
    }

    #[test]
    fn corrected_accumulates_on_feedback_baseline() {
        let mut gyro = GyroIntegrator::new();
        gyro.integrate(Vec3::Z, 0);
        gyro.integrate(Vec3::Z, 1_000_000_000);
        gyro.set_corrected(Vec3::new(0.0, 0.0, 0.5));
        gyro.integrate(Vec3::Z, 2_000_000_000);

        assert!((gyro.raw().z - 2.0).abs() < 1e-6);
        assert!((gyro.corrected().z - 1.5).abs() < 1e-6);
    }

    #[test]
    fn overflowing_timestamp_gap_is_zero_delta() {
        let mut gyro = GyroIntegrator::new();
        gyro.integrate(Vec3::Z, i64::MIN + 1);
        let delta = gyro.integrate(Vec3::Z, i64::MAX);
        assert_eq!(delta, Vec3::ZERO);
        assert_eq!(gyro.raw(), Vec3::ZERO);

        // The extreme timestamp is still the baseline for the next step.
        gyro.integrate(Vec3::Z, i64::MAX);
        assert_eq!(gyro.raw(), Vec3::ZERO);
    }

    #[test]
    fn backwards_timestamp_is_zero_delta_and_rebaselines() {
        let mut gyro = GyroIntegrator::new();
        gyro.integrate(Vec3::Z, 5_000_000_000);
        assert_eq!(gyro.integrate(Vec3::Z, 4_000_000_000), Vec3::ZERO);
        gyro.integrate(Vec3::Z, 4_500_000_000);
        assert!((gyro.raw().z - 0.5).abs() < 1e-6);
    }

    #[test]
    fn stream_starting_at_zero_integrates_second_sample() {
        let mut gyro = GyroIntegrator::new();
        gyro.integrate(Vec3::Z, 0);
        gyro.integrate(Vec3::Z, 1_000_000_000);
        assert!((gyro.raw().z - 1.0).abs() < 1e-6);
    }

    #[test]
    fn restart_keeps_trajectories() {
        let mut gyro = GyroIntegrator::new();
        gyro.integrate(Vec3::X, 1_000_000_000);
        gyro.integrate(Vec3::X, 2_000_000_000);
        gyro.restart();

        // A long gap after restart must not be integrated.
        let delta = gyro.integrate(Vec3::X, 60_000_000_000);
        assert_eq!(delta, Vec3::ZERO);
        assert!((gyro.raw().x - 1.0).abs() < 1e-6);
    }

    #[test]
    fn reset_zeroes_everything() {
        let mut gyro = GyroIntegrator::new();
        gyro.integrate(Vec3::ONE, 1_000_000_000);
        gyro.integrate(Vec3::ONE, 3_000_000_000);
        gyro.reset();
        assert_eq!(gyro.raw(), Vec3::ZERO);
        assert_eq!(gyro.corrected(), Vec3::ZERO);
        assert_eq!(gyro.integrate(Vec3::ONE, 4_000_000_000), Vec3::ZERO);
    }
}

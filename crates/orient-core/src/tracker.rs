use crate::geometry::{GeometryError, OrientationSolver};
use crate::types::{AbsoluteOrientation, Trajectory};
use glam::Vec3;

/// Outcome of one gravity + magnetic update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrackerUpdate {
    /// First orientation since reset; cached as the baseline, trajectory untouched.
    Seeded(AbsoluteOrientation),
    /// Trajectory advanced by the difference to the previous orientation.
    Advanced(AbsoluteOrientation),
}

impl TrackerUpdate {
    pub fn orientation(&self) -> AbsoluteOrientation {
        match *self {
            TrackerUpdate::Seeded(o) | TrackerUpdate::Advanced(o) => o,
        }
    }
}

/// Turns successive absolute orientations into an accumulated trajectory in
/// the engine's (pitch, roll, yaw) convention.
#[derive(Debug, Clone, Default)]
pub struct AbsoluteTracker {
    previous: Option<AbsoluteOrientation>,
    trajectory: Trajectory,
}

impl AbsoluteTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Solve for the current orientation and fold its change into the trajectory.
    ///
    /// On solver failure nothing changes. Differences are plain subtractions,
    /// so crossing the +/-pi azimuth boundary shows up as a ~2pi jump.
    pub fn update(
        &mut self,
        solver: &dyn OrientationSolver,
        gravity: Vec3,
        magnetic: Vec3,
    ) -> Result<TrackerUpdate, GeometryError> {
        let current = solver.solve(gravity, magnetic)?;

        let update = match self.previous {
            None => TrackerUpdate::Seeded(current),
            Some(previous) => {
                let diff = current.delta(&previous);
                // Solver order is (azimuth, pitch, roll) about (-z, -x, y).
                self.trajectory.x -= diff.pitch;
                self.trajectory.y += diff.roll;
                self.trajectory.z -= diff.azimuth;
                TrackerUpdate::Advanced(current)
            }
        };

        self.previous = Some(current);
        Ok(update)
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn trajectory(&self) -> Trajectory {
        self.trajectory
    }

    pub fn previous(&self) -> Option<AbsoluteOrientation> {
        self.previous
    }
}

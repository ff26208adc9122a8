use glam::Vec3;

/// Accumulated rotation in (pitch, roll, yaw) order, i.e. rotation about (x, y, z).
pub type Trajectory = Vec3;

/// Which physical sensor a sample came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorKind {
    Gyroscope,
    Accelerometer,
    Magnetometer,
}

impl SensorKind {
    pub const ALL: [SensorKind; 3] = [
        SensorKind::Gyroscope,
        SensorKind::Accelerometer,
        SensorKind::Magnetometer,
    ];
}

/// One timestamped reading from a motion sensor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorSample {
    pub kind: SensorKind,
    /// Monotonic timestamp in nanoseconds.
    pub timestamp_ns: i64,
    /// rad/s for the gyroscope, sensor units (m/s^2, uT) otherwise.
    pub values: Vec3,
}

impl SensorSample {
    pub fn new(kind: SensorKind, timestamp_ns: i64, values: Vec3) -> Self {
        Self {
            kind,
            timestamp_ns,
            values,
        }
    }

    pub fn gyro(timestamp_ns: i64, values: Vec3) -> Self {
        Self::new(SensorKind::Gyroscope, timestamp_ns, values)
    }

    pub fn accel(timestamp_ns: i64, values: Vec3) -> Self {
        Self::new(SensorKind::Accelerometer, timestamp_ns, values)
    }

    pub fn mag(timestamp_ns: i64, values: Vec3) -> Self {
        Self::new(SensorKind::Magnetometer, timestamp_ns, values)
    }
}

/// Absolute orientation from gravity + magnetic field, in radians.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AbsoluteOrientation {
    /// Rotation about -z. 0 when the device y axis points to magnetic north.
    pub azimuth: f32,
    /// Rotation about -x.
    pub pitch: f32,
    /// Rotation about y.
    pub roll: f32,
}

impl AbsoluteOrientation {
    pub fn new(azimuth: f32, pitch: f32, roll: f32) -> Self {
        Self {
            azimuth,
            pitch,
            roll,
        }
    }

    /// Component-wise signed difference. No wraparound at +/-pi.
    pub fn delta(&self, previous: &AbsoluteOrientation) -> AbsoluteOrientation {
        AbsoluteOrientation {
            azimuth: self.azimuth - previous.azimuth,
            pitch: self.pitch - previous.pitch,
            roll: self.roll - previous.roll,
        }
    }

    /// `(azimuth, pitch, roll)` scaled by `scale`.
    pub fn to_degrees(&self, scale: f32) -> Vec3 {
        Vec3::new(self.azimuth, self.pitch, self.roll) * scale
    }
}

/// Fused orientation output published by the client.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FusedOrientation {
    /// (pitch, roll, yaw) in degrees.
    pub pitch_roll_yaw: Vec3,
    /// Timestamp of the gyro sample that produced this value.
    pub timestamp_ns: i64,
}

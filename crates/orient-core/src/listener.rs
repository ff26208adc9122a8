use glam::Vec3;

type Callback = Box<dyn FnMut(Vec3, i64) + Send>;

/// Optional output slots invoked synchronously from the sample path.
///
/// Every payload is a copy in degrees; listeners cannot reach engine state.
#[derive(Default)]
pub struct FusionListeners {
    fused: Option<Callback>,
    gyro: Option<Callback>,
    acc_mag: Option<Callback>,
    absolute: Option<Callback>,
}

impl FusionListeners {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fused (pitch, roll, yaw), once per gyro sample.
    pub fn on_fused(mut self, f: impl FnMut(Vec3, i64) + Send + 'static) -> Self {
        self.fused = Some(Box::new(f));
        self
    }

    /// Uncorrected gyro trajectory, once per gyro sample. Diagnostic.
    pub fn on_gyro(mut self, f: impl FnMut(Vec3, i64) + Send + 'static) -> Self {
        self.gyro = Some(Box::new(f));
        self
    }

    /// Accumulated acc/mag trajectory, once per accelerometer sample. Diagnostic.
    pub fn on_acc_mag(mut self, f: impl FnMut(Vec3, i64) + Send + 'static) -> Self {
        self.acc_mag = Some(Box::new(f));
        self
    }

    /// Instantaneous (azimuth, pitch, roll) from gravity + magnetic field.
    pub fn on_absolute(mut self, f: impl FnMut(Vec3, i64) + Send + 'static) -> Self {
        self.absolute = Some(Box::new(f));
        self
    }

    pub(crate) fn fused(&mut self, value: Vec3, timestamp_ns: i64) {
        if let Some(f) = self.fused.as_mut() {
            f(value, timestamp_ns);
        }
    }

    pub(crate) fn gyro(&mut self, value: Vec3, timestamp_ns: i64) {
        if let Some(f) = self.gyro.as_mut() {
            f(value, timestamp_ns);
        }
    }

    pub(crate) fn acc_mag(&mut self, value: Vec3, timestamp_ns: i64) {
        if let Some(f) = self.acc_mag.as_mut() {
            f(value, timestamp_ns);
        }
    }

    pub(crate) fn absolute(&mut self, value: Vec3, timestamp_ns: i64) {
        if let Some(f) = self.absolute.as_mut() {
            f(value, timestamp_ns);
        }
    }
}

impl std::fmt::Debug for FusionListeners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FusionListeners")
            .field("fused", &self.fused.is_some())
            .field("gyro", &self.gyro.is_some())
            .field("acc_mag", &self.acc_mag.is_some())
            .field("absolute", &self.absolute.is_some())
            .finish()
    }
}

/// IMU (Inertial Measurement Unit) sample types and unit conversion
use nalgebra::Vector3;
use num_traits::Float;

/// Three-axis reading in physical units
pub type Vector3d = Vector3<f32>;

/// Magnitude of the most negative signed 16-bit reading
///
/// A full-scale range of `fs` maps `-32768..=32767` onto roughly `-fs..fs`.
pub const RAW_FULL_SCALE: f32 = 32768.0;

/// One burst of raw accelerometer and gyroscope readings
///
/// Each component is the big-endian signed 16-bit value of one register pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RawSample {
    pub ax: i16,
    pub ay: i16,
    pub az: i16,
    pub gx: i16,
    pub gy: i16,
    pub gz: i16,
}

impl RawSample {
    /// Accelerometer components as `[x, y, z]`
    pub fn accel(&self) -> [i16; 3] {
        [self.ax, self.ay, self.az]
    }

    /// Gyroscope components as `[x, y, z]`
    pub fn gyro(&self) -> [i16; 3] {
        [self.gx, self.gy, self.gz]
    }
}

/// Sample in physical units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicalSample {
    /// Acceleration in g
    pub accel: Vector3d,
    /// Angular rate in degrees per second
    pub gyro: Vector3d,
}

impl Default for PhysicalSample {
    fn default() -> Self {
        Self {
            accel: Vector3d::zeros(),
            gyro: Vector3d::zeros(),
        }
    }
}

/// Scale one raw reading to physical units for the given full-scale range
pub fn raw_to_unit(value: i16, full_scale: f32) -> f32 {
    value as f32 / (RAW_FULL_SCALE / full_scale)
}

/// Inverse of [`raw_to_unit`], rounded to the nearest LSB and clamped to the i16 range
pub fn to_raw(value: f32, full_scale: f32) -> i16 {
    let scaled = Float::round(value * (RAW_FULL_SCALE / full_scale));
    if scaled.is_nan() {
        return 0;
    }
    scaled.clamp(i16::MIN as f32, i16::MAX as f32) as i16
}

/// Convert a raw sample to g and degrees per second
///
/// `accel_fs` is the accelerometer full-scale range in g and `gyro_fs` the
/// gyroscope range in degrees per second. Pure linear scaling, no offsets.
pub fn to_physical(raw: &RawSample, accel_fs: f32, gyro_fs: f32) -> PhysicalSample {
    PhysicalSample {
        accel: Vector3d::new(
            raw_to_unit(raw.ax, accel_fs),
            raw_to_unit(raw.ay, accel_fs),
            raw_to_unit(raw.az, accel_fs),
        ),
        gyro: Vector3d::new(
            raw_to_unit(raw.gx, gyro_fs),
            raw_to_unit(raw.gy, gyro_fs),
            raw_to_unit(raw.gz, gyro_fs),
        ),
    }
}

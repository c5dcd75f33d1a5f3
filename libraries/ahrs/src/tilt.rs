use core::f32::consts::PI;

use hal::Vector3d;
use num_traits::Float;

const RAD_TO_DEG: f32 = 180.0 / PI;

/// Tilt of the device in degrees
#[derive(Default, Debug, Clone, Copy, PartialEq)]
pub struct Orientation {
    /// Rotation about the X axis
    pub pitch: f32,
    /// Rotation about the Y axis
    pub roll: f32,
}

impl Orientation {
    /// Reported for a zero acceleration vector
    pub const LEVEL: Orientation = Orientation {
        pitch: 0.0,
        roll: 0.0,
    };

    /// Tilt from an acceleration vector in any consistent unit
    pub fn from_accel(accel: &Vector3d) -> Self {
        compute((accel.x, accel.y, accel.z))
    }
}

/// Accelerometer-only tilt estimate
///
/// Only meaningful while the device is near static, when gravity dominates
/// the measured acceleration. No gyroscope data is involved.
///
/// * pitch = atan2(ay, sqrt(ax² + az²))
/// * roll = atan2(ax, az)
///
/// A vector of exactly zero magnitude (free fall, or a sensor reading
/// nothing) returns [`Orientation::LEVEL`].
pub fn compute(accel: (f32, f32, f32)) -> Orientation {
    let (ax, ay, az) = accel;

    // also catches -0.0, where atan2 would report ±180°
    if ax == 0.0 && ay == 0.0 && az == 0.0 {
        return Orientation::LEVEL;
    }

    let pitch = Float::atan2(ay, Float::sqrt(ax * ax + az * az));
    let roll = Float::atan2(ax, az);

    Orientation {
        pitch: pitch * RAD_TO_DEG,
        roll: roll * RAD_TO_DEG,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE_DEG: f32 = 0.1;

    fn assert_close(actual: f32, expected: f32) {
        assert!(
            (actual - expected).abs() < TOLERANCE_DEG,
            "expected {} got {}",
            expected,
            actual
        );
    }

    #[test]
    fn test_gravity_on_z_is_level() {
        let o = compute((0.0, 0.0, 1.0));
        assert_close(o.pitch, 0.0);
        assert_close(o.roll, 0.0);
    }

    #[test]
    fn test_gravity_on_x_is_full_roll() {
        let o = compute((1.0, 0.0, 0.0));
        assert_close(o.roll, 90.0);
        assert_close(o.pitch, 0.0);
    }

    #[test]
    fn test_gravity_on_y_is_full_pitch() {
        let o = compute((0.0, 1.0, 0.0));
        assert_close(o.pitch, 90.0);
        assert_close(o.roll, 0.0);
    }

    #[test]
    fn test_zero_vector_is_level() {
        assert_eq!(compute((0.0, 0.0, 0.0)), Orientation::LEVEL);
        assert_eq!(compute((-0.0, 0.0, -0.0)), Orientation::LEVEL);
    }

    #[test]
    fn test_forty_five_degrees() {
        let h = core::f32::consts::FRAC_1_SQRT_2;
        assert_close(compute((h, 0.0, h)).roll, 45.0);
        assert_close(compute((0.0, -h, h)).pitch, -45.0);
    }

    #[test]
    fn test_upside_down_reports_half_turn_roll() {
        let o = compute((0.0, 0.0, -1.0));
        assert_close(o.pitch, 0.0);
        assert_close(o.roll.abs(), 180.0);
    }

    #[test]
    fn test_scale_invariant() {
        let small = compute((0.1, 0.2, 0.3));
        let large = compute((1.0, 2.0, 3.0));
        assert_close(small.pitch, large.pitch);
        assert_close(small.roll, large.roll);
    }

    #[test]
    fn test_finite_inputs_never_nan() {
        let values = [-16.0f32, -1.0, -1e-6, 0.0, 1e-6, 0.5, 2.0, 1e20];
        for &ax in &values {
            for &ay in &values {
                for &az in &values {
                    let o = compute((ax, ay, az));
                    assert!(!o.pitch.is_nan() && !o.roll.is_nan(), "{} {} {}", ax, ay, az);
                }
            }
        }
    }

    #[test]
    fn test_from_accel_matches_compute() {
        let v = Vector3d::new(0.3, -0.4, 0.85);
        assert_eq!(Orientation::from_accel(&v), compute((0.3, -0.4, 0.85)));
    }
}

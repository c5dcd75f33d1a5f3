use hal::Vector3d;

/// Slow two-axis rocking motion fed into the simulated sensor
///
/// Pitch and roll follow independent sine waves; the accelerometer sees
/// gravity rotated by them and the gyro sees their rates.
#[derive(Debug, Clone, Copy)]
pub struct TiltSweep {
    pub pitch_amplitude_deg: f32,
    pub roll_amplitude_deg: f32,
    pub pitch_rate_hz: f32,
    pub roll_rate_hz: f32,
}

impl Default for TiltSweep {
    fn default() -> Self {
        Self {
            pitch_amplitude_deg: 20.0,
            roll_amplitude_deg: 35.0,
            pitch_rate_hz: 0.05,
            roll_rate_hz: 0.08,
        }
    }
}

impl TiltSweep {
    /// True (pitch, roll) in degrees at time `t` seconds
    pub fn angles(&self, t: f32) -> (f32, f32) {
        let tau = std::f32::consts::TAU;
        (
            self.pitch_amplitude_deg * (tau * self.pitch_rate_hz * t).sin(),
            self.roll_amplitude_deg * (tau * self.roll_rate_hz * t).sin(),
        )
    }

    /// Gravity in the sensor frame, in g
    pub fn accel(&self, t: f32) -> Vector3d {
        let (pitch, roll) = self.angles(t);
        let (p, r) = (pitch.to_radians(), roll.to_radians());
        Vector3d::new(r.sin() * p.cos(), p.sin(), r.cos() * p.cos())
    }

    /// Angular rate in degrees per second
    pub fn gyro(&self, t: f32) -> Vector3d {
        let tau = std::f32::consts::TAU;
        let pitch_rate = self.pitch_amplitude_deg
            * tau
            * self.pitch_rate_hz
            * (tau * self.pitch_rate_hz * t).cos();
        let roll_rate =
            self.roll_amplitude_deg * tau * self.roll_rate_hz * (tau * self.roll_rate_hz * t).cos();
        Vector3d::new(pitch_rate, roll_rate, 0.0)
    }

    /// Die temperature word, warming slowly from power-up
    pub fn temperature_raw(&self, t: f32) -> i16 {
        (t * 10.0).min(3000.0) as i16
    }
}

//! Inertial sensor data types

use serde::{Deserialize, Serialize};

/// Raw inertial reading straight from the sensor registers, converted to
/// physical units but not yet bias-corrected.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawImuSample {
    /// Accelerometer data (g)
    pub accel: [f32; 3], // x, y, z
    /// Gyroscope data (deg/s)
    pub gyro: [f32; 3], // x, y, z
}

impl RawImuSample {
    /// True if any axis reads NaN (rejected during calibration)
    pub fn has_nan(&self) -> bool {
        self.accel.iter().chain(self.gyro.iter()).any(|v| v.is_nan())
    }
}

/// Startup bias estimate, computed once while the robot is known stationary
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AttitudeBias {
    /// Gyroscope bias (deg/s)
    pub gyro: [f32; 3],
    /// Accelerometer bias (g); z has 1.0 g of gravity subtracted
    pub accel: [f32; 3],
}

/// Tilt angles derived from the accelerometer vector
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TiltAngles {
    /// Roll in degrees
    pub roll: f32,
    /// Pitch in degrees
    pub pitch: f32,
}

impl TiltAngles {
    /// Compute roll/pitch from an accelerometer vector (g)
    ///
    /// `roll = atan2(ay, sqrt(ax^2 + az^2))`,
    /// `pitch = atan2(-ax, sqrt(ay^2 + az^2))`, both in degrees.
    pub fn from_accel(accel: [f32; 3]) -> Self {
        let [ax, ay, az] = accel;
        Self {
            roll: ay.atan2((ax * ax + az * az).sqrt()).to_degrees(),
            pitch: (-ax).atan2((ay * ay + az * az).sqrt()).to_degrees(),
        }
    }
}

/// Bias-corrected inertial sample with derived tilt
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AttitudeSample {
    /// Accelerometer data (g), bias-corrected
    pub accel: [f32; 3],
    /// Gyroscope data (deg/s), bias-corrected
    pub gyro: [f32; 3],
    /// Tilt computed from low-pass filtered acceleration
    pub tilt: TiltAngles,
}

impl AttitudeSample {
    /// Zeroed fallback sample used when the sensor read fails
    pub fn zero() -> Self {
        Self::default()
    }
}

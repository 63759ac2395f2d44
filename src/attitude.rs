//! Inertial estimation: bias calibration, tilt, and integrated yaw
//!
//! Wraps an [`ImuDriver`] and turns raw register samples into
//! bias-corrected [`AttitudeSample`]s. Transient sensor faults never
//! propagate — the caller always gets a sample, degraded if necessary, so
//! the control loop can never stall on the IMU.

use crate::drivers::ImuDriver;
use crate::types::{AttitudeBias, AttitudeSample, TiltAngles};

/// Single-pole low-pass coefficient applied to acceleration before tilt
const ACCEL_FILTER_ALPHA: f32 = 0.9;

/// Inertial estimator over a raw IMU driver
pub struct AttitudeEstimator {
    driver: Box<dyn ImuDriver>,
    bias: AttitudeBias,
    /// Filter state persists across reads and is never reset after start
    filtered_accel: [f32; 3],
    yaw_deg: f32,
    /// Set while a read-failure streak is in progress, so each streak is
    /// logged exactly once
    fault_active: bool,
}

impl AttitudeEstimator {
    pub fn new(driver: Box<dyn ImuDriver>) -> Self {
        Self {
            driver,
            bias: AttitudeBias::default(),
            filtered_accel: [0.0, 0.0, 0.0],
            yaw_deg: 0.0,
            fault_active: false,
        }
    }

    /// Estimate sensor bias from `sample_count` consecutive readings taken
    /// while the robot is known stationary.
    ///
    /// Invalid samples (read failure or NaN) are discarded. The
    /// accelerometer Z bias has 1.0 g subtracted to account for gravity.
    /// Zero valid samples leaves the bias at zero and logs a warning; the
    /// system continues uncompensated rather than refusing to start.
    pub fn calibrate(&mut self, sample_count: u32) {
        log::info!(
            "AttitudeEstimator: Calibrating over {} samples (robot must be stationary)",
            sample_count
        );

        let mut gyro_sum = [0.0f64; 3];
        let mut accel_sum = [0.0f64; 3];
        let mut valid: u32 = 0;

        for _ in 0..sample_count {
            let raw = match self.driver.read_raw() {
                Ok(raw) if !raw.has_nan() => raw,
                Ok(_) => continue,
                Err(_) => continue,
            };

            for axis in 0..3 {
                gyro_sum[axis] += raw.gyro[axis] as f64;
                accel_sum[axis] += raw.accel[axis] as f64;
            }
            valid += 1;
        }

        if valid == 0 {
            log::warn!(
                "AttitudeEstimator: Calibration produced no valid samples, \
                 continuing with zero bias (uncompensated)"
            );
            self.bias = AttitudeBias::default();
            return;
        }

        let n = valid as f64;
        let mut bias = AttitudeBias::default();
        for axis in 0..3 {
            bias.gyro[axis] = (gyro_sum[axis] / n) as f32;
            bias.accel[axis] = (accel_sum[axis] / n) as f32;
        }
        // Gravity sits on the Z axis while stationary and level
        bias.accel[2] -= 1.0;
        self.bias = bias;

        log::info!(
            "AttitudeEstimator: Calibration complete with {}/{} samples, gyro_bias={:?}, accel_bias={:?}",
            valid,
            sample_count,
            bias.gyro,
            bias.accel
        );
    }

    /// Read one bias-corrected sample and advance the yaw integral.
    ///
    /// `dt` is wall-clock seconds since the previous read. On transient
    /// failure a zeroed fallback sample is returned and the filter and yaw
    /// state are left untouched; the failure streak is logged once.
    pub fn read(&mut self, dt: f32) -> AttitudeSample {
        let raw = match self.driver.read_raw() {
            Ok(raw) if !raw.has_nan() => raw,
            Ok(_) | Err(_) => {
                if !self.fault_active {
                    log::warn!("AttitudeEstimator: IMU read failed, using fallback sample");
                    self.fault_active = true;
                }
                return AttitudeSample::zero();
            }
        };
        if self.fault_active {
            log::info!("AttitudeEstimator: IMU read recovered");
            self.fault_active = false;
        }

        let mut accel = [0.0f32; 3];
        let mut gyro = [0.0f32; 3];
        for axis in 0..3 {
            accel[axis] = raw.accel[axis] - self.bias.accel[axis];
            gyro[axis] = raw.gyro[axis] - self.bias.gyro[axis];
            self.filtered_accel[axis] = ACCEL_FILTER_ALPHA * self.filtered_accel[axis]
                + (1.0 - ACCEL_FILTER_ALPHA) * accel[axis];
        }

        if dt > 0.0 {
            self.yaw_deg += gyro[2] * dt;
        }

        AttitudeSample {
            accel,
            gyro,
            tilt: TiltAngles::from_accel(self.filtered_accel),
        }
    }

    /// Integrated yaw (degrees) since the last reset. Accumulates gyro
    /// drift; zeroed at the start of each straight-line or rotate maneuver.
    pub fn yaw(&self) -> f32 {
        self.yaw_deg
    }

    pub fn reset_yaw(&mut self) {
        self.yaw_deg = 0.0;
    }

    pub fn bias(&self) -> AttitudeBias {
        self.bias
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, Result};
    use crate::types::RawImuSample;
    use approx::assert_relative_eq;

    /// Scripted IMU that replays a queue of results
    struct ScriptedImu {
        samples: Vec<Result<RawImuSample>>,
    }

    impl ScriptedImu {
        fn constant(sample: RawImuSample, count: usize) -> Self {
            Self {
                samples: (0..count).map(|_| Ok(sample)).collect(),
            }
        }
    }

    impl ImuDriver for ScriptedImu {
        fn read_raw(&mut self) -> Result<RawImuSample> {
            if self.samples.is_empty() {
                return Err(Error::SensorRead("exhausted".to_string()));
            }
            self.samples.remove(0)
        }
    }

    fn stationary() -> RawImuSample {
        RawImuSample {
            accel: [0.0, 0.0, 1.0],
            gyro: [0.0, 0.0, 0.0],
        }
    }

    #[test]
    fn test_calibration_ideal_stationary_yields_zero_bias() {
        let imu = ScriptedImu::constant(stationary(), 1000);
        let mut est = AttitudeEstimator::new(Box::new(imu));
        est.calibrate(1000);

        let bias = est.bias();
        for axis in 0..3 {
            assert_relative_eq!(bias.gyro[axis], 0.0, epsilon = 1e-6);
            assert_relative_eq!(bias.accel[axis], 0.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_calibration_discards_invalid_samples() {
        let mut samples: Vec<Result<RawImuSample>> = Vec::new();
        for i in 0..100 {
            if i % 3 == 0 {
                samples.push(Err(Error::SensorRead("i2c timeout".to_string())));
            } else if i % 3 == 1 {
                samples.push(Ok(RawImuSample {
                    accel: [f32::NAN, 0.0, 1.0],
                    gyro: [0.0, 0.0, 0.0],
                }));
            } else {
                samples.push(Ok(RawImuSample {
                    accel: [0.1, -0.2, 1.3],
                    gyro: [1.0, 2.0, 3.0],
                }));
            }
        }
        let mut est = AttitudeEstimator::new(Box::new(ScriptedImu { samples }));
        est.calibrate(100);

        let bias = est.bias();
        assert_relative_eq!(bias.gyro[2], 3.0, epsilon = 1e-5);
        assert_relative_eq!(bias.accel[0], 0.1, epsilon = 1e-5);
        assert_relative_eq!(bias.accel[2], 0.3, epsilon = 1e-5);
    }

    #[test]
    fn test_calibration_all_invalid_defaults_to_zero() {
        let samples = (0..10)
            .map(|_| Err(Error::SensorRead("dead sensor".to_string())))
            .collect();
        let mut est = AttitudeEstimator::new(Box::new(ScriptedImu { samples }));
        est.calibrate(10);
        assert_eq!(est.bias(), AttitudeBias::default());
    }

    #[test]
    fn test_read_failure_returns_fallback() {
        let samples = vec![Err(Error::SensorRead("i2c timeout".to_string()))];
        let mut est = AttitudeEstimator::new(Box::new(ScriptedImu { samples }));
        assert_eq!(est.read(0.05), AttitudeSample::zero());
    }

    #[test]
    fn test_yaw_integration_and_reset() {
        let sample = RawImuSample {
            accel: [0.0, 0.0, 1.0],
            gyro: [0.0, 0.0, 10.0], // 10 deg/s about Z
        };
        let mut est = AttitudeEstimator::new(Box::new(ScriptedImu::constant(sample, 20)));

        for _ in 0..20 {
            est.read(0.05);
        }
        assert_relative_eq!(est.yaw(), 10.0, epsilon = 1e-4);

        est.reset_yaw();
        assert_relative_eq!(est.yaw(), 0.0);
    }

    #[test]
    fn test_low_pass_filter_smooths_tilt_step() {
        // Level for a while, then a sudden 30-degree roll. The filtered
        // tilt must lag the step and converge, not jump.
        let tipped = RawImuSample {
            accel: [0.0, 0.5, 0.866],
            gyro: [0.0, 0.0, 0.0],
        };
        let mut samples: Vec<Result<RawImuSample>> =
            (0..50).map(|_| Ok(stationary())).collect();
        samples.extend((0..200).map(|_| Ok(tipped)));
        let mut est = AttitudeEstimator::new(Box::new(ScriptedImu { samples }));

        for _ in 0..50 {
            est.read(0.05);
        }

        let first_after_step = est.read(0.05);
        assert!(first_after_step.tilt.roll < 10.0);

        let mut last = first_after_step;
        for _ in 0..199 {
            last = est.read(0.05);
        }
        assert_relative_eq!(last.tilt.roll, 30.0, epsilon = 0.5);
    }
}

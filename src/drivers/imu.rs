//! Inertial sensor driver trait

use crate::error::Result;
use crate::types::RawImuSample;

/// Raw IMU register reader
///
/// Returns accelerometer data in g and gyroscope data in deg/s, converted
/// from raw register counts but without bias correction. Bias handling and
/// filtering live in [`crate::attitude::AttitudeEstimator`].
pub trait ImuDriver: Send {
    /// Read one raw sample; transient I2C failures surface as errors and
    /// are recovered by the estimator
    fn read_raw(&mut self) -> Result<RawImuSample>;
}

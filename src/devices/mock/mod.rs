//! Mock device backend
//!
//! Simulates a stationary, level robot: the IMU reads gravity plus noise,
//! the barometer sits near sea level, and the motors record the last
//! command without moving anything. Used for development on machines
//! without the hardware and by the test suite.

mod motor;
mod sensors;

pub use motor::MockMotor;
pub use sensors::{MockBattery, MockEnvSensor, MockGpio, MockImu};

use crate::config::AppConfig;
use crate::devices::DeviceSet;

/// Assemble a full mock driver set
pub fn create_mock_device(config: &AppConfig) -> DeviceSet {
    DeviceSet {
        motor: Box::new(MockMotor::new(
            config.hardware.motor_polarity_left,
            config.hardware.motor_polarity_right,
        )),
        imu: Box::new(MockImu::new()),
        env: Box::new(MockEnvSensor::new()),
        battery: Box::new(MockBattery::new()),
        gpio: Box::new(MockGpio::new()),
    }
}

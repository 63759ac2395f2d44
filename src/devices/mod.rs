//! Device backends
//!
//! The control core only ever sees the driver traits; this module picks a
//! concrete backend from configuration. Hardware backends implement the
//! traits out of tree, the in-tree "mock" backend simulates a stationary
//! robot for development and CI.

#[cfg(feature = "mock")]
pub mod mock;

use crate::config::AppConfig;
use crate::drivers::{AuxGpio, BatteryDriver, EnvSensorDriver, ImuDriver, MotorDriver};
use crate::error::{Error, Result};

/// Full set of drivers for one device backend
pub struct DeviceSet {
    pub motor: Box<dyn MotorDriver>,
    pub imu: Box<dyn ImuDriver>,
    pub env: Box<dyn EnvSensorDriver>,
    pub battery: Box<dyn BatteryDriver>,
    pub gpio: Box<dyn AuxGpio>,
}

/// Create the driver set selected by `hardware.device_type`
pub fn create_device(config: &AppConfig) -> Result<DeviceSet> {
    match config.hardware.device_type.as_str() {
        #[cfg(feature = "mock")]
        "mock" => {
            log::info!("Devices: Using mock backend");
            Ok(mock::create_mock_device(config))
        }
        other => Err(Error::InitializationFailed(format!(
            "Unknown device type: {}",
            other
        ))),
    }
}

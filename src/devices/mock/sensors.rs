//! Mock sensor and GPIO drivers

use crate::drivers::{AuxGpio, BatteryDriver, EnvSensorDriver, ImuDriver};
use crate::error::Result;
use crate::types::{BatteryData, EnvironmentData, RawImuSample};
use rand::Rng;

/// Stationary, level IMU with gaussian-ish register noise
pub struct MockImu {
    accel_noise: f32,
    gyro_noise: f32,
}

impl MockImu {
    pub fn new() -> Self {
        // Magnitudes comparable to a real MEMS part at rest
        Self {
            accel_noise: 0.002,
            gyro_noise: 0.05,
        }
    }
}

impl Default for MockImu {
    fn default() -> Self {
        Self::new()
    }
}

impl ImuDriver for MockImu {
    fn read_raw(&mut self) -> Result<RawImuSample> {
        let mut rng = rand::thread_rng();
        let mut accel = [0.0, 0.0, 1.0];
        let mut gyro = [0.0f32; 3];
        for axis in 0..3 {
            accel[axis] += rng.gen_range(-self.accel_noise..self.accel_noise);
            gyro[axis] += rng.gen_range(-self.gyro_noise..self.gyro_noise);
        }
        Ok(RawImuSample { accel, gyro })
    }
}

/// Barometer near sea level with mild pressure jitter
pub struct MockEnvSensor {
    base_pressure: f32,
}

impl MockEnvSensor {
    pub fn new() -> Self {
        Self {
            base_pressure: 1013.25,
        }
    }
}

impl Default for MockEnvSensor {
    fn default() -> Self {
        Self::new()
    }
}

impl EnvSensorDriver for MockEnvSensor {
    fn read_environment(&mut self) -> Result<EnvironmentData> {
        let mut rng = rand::thread_rng();
        let pressure = self.base_pressure + rng.gen_range(-0.2..0.2);
        let temperature = 24.0 + rng.gen_range(-0.5..0.5);
        Ok(EnvironmentData::from_pressure(temperature, pressure))
    }
}

/// Healthy battery pack under light load
pub struct MockBattery;

impl MockBattery {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MockBattery {
    fn default() -> Self {
        Self::new()
    }
}

impl BatteryDriver for MockBattery {
    fn read_battery(&mut self) -> Result<BatteryData> {
        let mut rng = rand::thread_rng();
        Ok(BatteryData {
            voltage: 12.4 + rng.gen_range(-0.05..0.05),
            current: 0.8 + rng.gen_range(-0.1..0.1),
        })
    }
}

/// Records horn and headlight state
#[derive(Debug, Default)]
pub struct MockGpio {
    horn: bool,
    headlight: bool,
}

impl MockGpio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn horn(&self) -> bool {
        self.horn
    }

    pub fn headlight(&self) -> bool {
        self.headlight
    }
}

impl AuxGpio for MockGpio {
    fn set_horn(&mut self, on: bool) -> Result<()> {
        log::debug!("MockGpio: Horn {}", if on { "on" } else { "off" });
        self.horn = on;
        Ok(())
    }

    fn set_headlight(&mut self, on: bool) -> Result<()> {
        log::debug!("MockGpio: Headlight {}", if on { "on" } else { "off" });
        self.headlight = on;
        Ok(())
    }
}

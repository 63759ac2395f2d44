//! Environmental and battery telemetry types

use serde::{Deserialize, Serialize};

/// Barometric/environmental reading
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentData {
    /// Temperature in degrees Celsius
    pub temperature: f32,
    /// Barometric pressure in hPa
    pub pressure: f32,
    /// Altitude in meters, derived from pressure
    pub altitude: f32,
}

impl EnvironmentData {
    /// Derive altitude from pressure using the international barometric
    /// formula with a 1013.25 hPa sea-level reference.
    pub fn from_pressure(temperature: f32, pressure: f32) -> Self {
        let altitude = 44330.0 * (1.0 - (pressure / 1013.25).powf(1.0 / 5.255));
        Self {
            temperature,
            pressure,
            altitude,
        }
    }
}

/// Battery monitor reading
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BatteryData {
    /// Pack voltage in volts
    pub voltage: f32,
    /// Draw current in amps
    pub current: f32,
}

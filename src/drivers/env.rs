//! Environmental sensor driver trait

use crate::error::Result;
use crate::types::EnvironmentData;

/// Barometric/environmental sensor driver trait
pub trait EnvSensorDriver: Send {
    /// Read temperature, pressure, and derived altitude
    fn read_environment(&mut self) -> Result<EnvironmentData>;
}

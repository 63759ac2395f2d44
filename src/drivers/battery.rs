//! Battery monitor driver trait

use crate::error::Result;
use crate::types::BatteryData;

/// Battery voltage/current monitor driver trait
pub trait BatteryDriver: Send {
    /// Read pack voltage and draw current
    fn read_battery(&mut self) -> Result<BatteryData>;
}

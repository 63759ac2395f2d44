//! Motor driver trait

use crate::error::Result;
use crate::types::WheelSide;

/// Dual H-bridge motor controller driver trait
///
/// Speeds are signed PWM percentages in [-100, 100]; the sign encodes
/// direction, the magnitude the duty cycle. Implementations apply the
/// configured per-side polarity.
pub trait MotorDriver: Send {
    /// Set one wheel's signed PWM percentage
    fn set_wheel_pwm(&mut self, side: WheelSide, percent: f32) -> Result<()>;

    /// Full stop: zero both duty cycles and clear the direction pins
    fn stop_all(&mut self) -> Result<()>;

    /// Convenience: drive both wheels, routing (0, 0) to [`Self::stop_all`]
    fn set_wheels(&mut self, left: f32, right: f32) -> Result<()> {
        if left == 0.0 && right == 0.0 {
            return self.stop_all();
        }
        self.set_wheel_pwm(WheelSide::Left, left)?;
        self.set_wheel_pwm(WheelSide::Right, right)
    }
}

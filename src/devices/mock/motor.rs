//! Mock motor driver

use crate::drivers::MotorDriver;
use crate::error::Result;
use crate::types::WheelSide;
use parking_lot::Mutex;
use std::sync::Arc;

/// Records the last wheel command instead of driving hardware.
///
/// Polarity is applied exactly like a real H-bridge backend would, so
/// polarity wiring bugs are visible in tests.
#[derive(Clone)]
pub struct MockMotor {
    state: Arc<Mutex<MotorState>>,
    polarity_left: f32,
    polarity_right: f32,
}

#[derive(Debug, Default)]
struct MotorState {
    left: f32,
    right: f32,
    stopped: bool,
}

impl MockMotor {
    pub fn new(polarity_left: i8, polarity_right: i8) -> Self {
        Self {
            state: Arc::new(Mutex::new(MotorState {
                stopped: true,
                ..MotorState::default()
            })),
            polarity_left: polarity_left.signum() as f32,
            polarity_right: polarity_right.signum() as f32,
        }
    }

    /// Last commanded (left, right) PWM with polarity applied
    pub fn wheels(&self) -> (f32, f32) {
        let state = self.state.lock();
        (state.left, state.right)
    }

    pub fn is_stopped(&self) -> bool {
        self.state.lock().stopped
    }
}

impl MotorDriver for MockMotor {
    fn set_wheel_pwm(&mut self, side: WheelSide, percent: f32) -> Result<()> {
        let mut state = self.state.lock();
        match side {
            WheelSide::Left => state.left = percent * self.polarity_left,
            WheelSide::Right => state.right = percent * self.polarity_right,
        }
        state.stopped = false;
        Ok(())
    }

    fn stop_all(&mut self) -> Result<()> {
        let mut state = self.state.lock();
        state.left = 0.0;
        state.right = 0.0;
        state.stopped = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_polarity_applied_per_side() {
        let mut motor = MockMotor::new(1, -1);
        motor.set_wheels(30.0, 30.0).unwrap();
        assert_eq!(motor.wheels(), (30.0, -30.0));
    }

    #[test]
    fn test_zero_command_routes_to_stop() {
        let mut motor = MockMotor::new(1, 1);
        motor.set_wheels(30.0, 30.0).unwrap();
        assert!(!motor.is_stopped());

        motor.set_wheels(0.0, 0.0).unwrap();
        assert!(motor.is_stopped());
        assert_eq!(motor.wheels(), (0.0, 0.0));
    }
}

//! Parameterized PID controller
//!
//! One type instantiated per correction loop (wheel-sync, yaw-hold).
//! Anti-windup clamps the integral term to the output limits; the final
//! output is clamped again after summing the terms.

use crate::config::PidGains;

/// Single PID loop state
#[derive(Debug, Clone)]
pub struct PidController {
    kp: f32,
    ki: f32,
    kd: f32,
    setpoint: f32,
    output_limit: f32,
    integral: f32,
    prev_error: Option<f32>,
}

impl PidController {
    pub fn new(gains: PidGains) -> Self {
        Self {
            kp: gains.kp,
            ki: gains.ki,
            kd: gains.kd,
            setpoint: 0.0,
            output_limit: gains.output_limit.abs(),
            integral: 0.0,
            prev_error: None,
        }
    }

    /// Compute the correction for one process value.
    ///
    /// The error is `value - setpoint` (setpoint is 0 for both correction
    /// loops, so the correction carries the sign of the error). `dt` is
    /// wall-clock seconds since the previous call; a non-positive `dt`
    /// skips the integral and derivative contributions for this step.
    pub fn compute(&mut self, value: f32, dt: f32) -> f32 {
        let error = value - self.setpoint;

        let p = self.kp * error;

        if dt > 0.0 {
            self.integral += self.ki * error * dt;
            self.integral = self
                .integral
                .clamp(-self.output_limit, self.output_limit);
        }

        let d = match (self.prev_error, dt > 0.0) {
            (Some(prev), true) => self.kd * (error - prev) / dt,
            _ => 0.0,
        };
        self.prev_error = Some(error);

        (p + self.integral + d).clamp(-self.output_limit, self.output_limit)
    }

    /// Clear integral accumulation and derivative history.
    ///
    /// Called on every transition into Stopped/EmergencyStop and at the
    /// start of each new maneuver so stale windup never leaks forward.
    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.prev_error = None;
    }

    pub fn set_setpoint(&mut self, setpoint: f32) {
        self.setpoint = setpoint;
    }
}

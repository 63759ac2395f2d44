//! Motion state machine: intent plus PID corrections in, wheel PWM out
//!
//! Transitions are driven exclusively by the command dispatcher; the
//! control loop reads the current intent every tick and mixes in the
//! latest corrections. All outputs are clamped to [-100, 100] before they
//! reach the motor driver.
//!
//! Sign convention (single source of truth, covered by tests):
//!
//! | intent       | left wheel              | right wheel             |
//! |--------------|-------------------------|-------------------------|
//! | Forward      | `t - rc - yc`           | `t + rc + yc`           |
//! | Backward     | `-t - rc - yc`          | `-t + rc + yc`          |
//! | RotateLeft   | `-t`                    | `t`                     |
//! | RotateRight  | `t`                     | `-t`                    |
//! | TurnLeft     | `t*ratio - w*yc`        | `t + w*yc`              |
//! | TurnRight    | `t - w*yc`              | `t*ratio + w*yc`        |
//! | Stopped      | `0`                     | `0`                     |
//! | EmergencyStop| `0`                     | `0`                     |
//!
//! `t` = target speed, `rc` = wheel-sync correction, `yc` = yaw
//! correction, `ratio` = configured inner-wheel ratio, `w` = reduced yaw
//! weight for turns. In-place rotation deliberately ignores both
//! corrections: "no net drift" does not apply to a spin.

use super::intent::MotionIntent;

/// Yaw-correction weight during arcing turns, relative to straight motion
const TURN_YAW_WEIGHT: f32 = 0.5;

/// Latest outputs of the two correction loops
#[derive(Debug, Clone, Copy, Default)]
pub struct PidCorrections {
    /// Wheel-rate synchronization correction (percent PWM)
    pub wheel_sync: f32,
    /// Yaw-hold correction (percent PWM)
    pub yaw: f32,
}

/// Holds the current movement intent and converts it to wheel commands
#[derive(Debug)]
pub struct MotionStateMachine {
    intent: MotionIntent,
    target_speed: f32,
    estop_latched: bool,
    turn_inner_ratio: f32,
}

impl MotionStateMachine {
    pub fn new(turn_inner_ratio: f32) -> Self {
        Self {
            intent: MotionIntent::Stopped,
            target_speed: 0.0,
            estop_latched: false,
            turn_inner_ratio: turn_inner_ratio.clamp(0.0, 1.0),
        }
    }

    /// Request a transition. `target_speed` is a 0-100 percentage of max
    /// PWM.
    ///
    /// While the emergency-stop latch is set every request except another
    /// `EmergencyStop` is refused, so a queued stale command can never
    /// resume motion. Returns whether the request was applied.
    pub fn request(&mut self, intent: MotionIntent, target_speed: f32) -> bool {
        if intent == MotionIntent::EmergencyStop {
            if !self.estop_latched {
                log::warn!("MotionStateMachine: Emergency stop latched");
            }
            self.intent = MotionIntent::EmergencyStop;
            self.estop_latched = true;
            self.target_speed = 0.0;
            return true;
        }

        if self.estop_latched {
            log::warn!(
                "MotionStateMachine: Refusing '{}' while emergency stop is latched",
                intent
            );
            return false;
        }

        if intent != self.intent {
            log::info!(
                "MotionStateMachine: {} -> {} (target {:.0}%)",
                self.intent,
                intent,
                target_speed
            );
        }
        self.intent = intent;
        self.target_speed = target_speed.clamp(0.0, 100.0);
        true
    }

    /// Release the emergency-stop latch and return to `Stopped`. A no-op
    /// when the latch is not set.
    pub fn clear_emergency(&mut self) {
        if self.estop_latched {
            log::info!("MotionStateMachine: Emergency stop cleared");
            self.estop_latched = false;
            self.intent = MotionIntent::Stopped;
            self.target_speed = 0.0;
        }
    }

    pub fn intent(&self) -> MotionIntent {
        self.intent
    }

    pub fn target_speed(&self) -> f32 {
        self.target_speed
    }

    pub fn is_estop_latched(&self) -> bool {
        self.estop_latched
    }

    /// Mix intent and corrections into (left, right) wheel PWM, clamped to
    /// [-100, 100]
    pub fn wheel_outputs(&self, corrections: PidCorrections) -> (f32, f32) {
        let t = self.target_speed;
        let rc = corrections.wheel_sync;
        let yc = corrections.yaw;

        let (left, right) = match self.intent {
            MotionIntent::Stopped | MotionIntent::EmergencyStop => (0.0, 0.0),
            MotionIntent::Forward => (t - rc - yc, t + rc + yc),
            MotionIntent::Backward => (-t - rc - yc, -t + rc + yc),
            MotionIntent::RotateLeft => (-t, t),
            MotionIntent::RotateRight => (t, -t),
            MotionIntent::TurnLeft => (
                t * self.turn_inner_ratio - TURN_YAW_WEIGHT * yc,
                t + TURN_YAW_WEIGHT * yc,
            ),
            MotionIntent::TurnRight => (
                t - TURN_YAW_WEIGHT * yc,
                t * self.turn_inner_ratio + TURN_YAW_WEIGHT * yc,
            ),
        };

        (left.clamp(-100.0, 100.0), right.clamp(-100.0, 100.0))
    }
}

//! Movement intent and joystick sector mapping

/// Current movement intent, owned by [`super::MotionStateMachine`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionIntent {
    /// Initial/terminal rest state
    Stopped,
    Forward,
    Backward,
    /// In-place spin, counter-clockwise
    RotateLeft,
    /// In-place spin, clockwise
    RotateRight,
    /// Arcing turn, left wheel on the inside
    TurnLeft,
    /// Arcing turn, right wheel on the inside
    TurnRight,
    /// Terminal until explicitly cleared
    EmergencyStop,
}

impl MotionIntent {
    /// Map a 0-360 degree joystick angle to an intent via fixed angular
    /// sectors. Unmapped angles resolve to `Stopped`.
    ///
    /// Sector table (degrees): 80-100 forward, 260-280 backward,
    /// <=10 or >=350 turn-right, 170-190 turn-left, 10-80 rotate-right,
    /// 280-350 rotate-left.
    pub fn from_joystick_angle(angle: f32) -> Self {
        if !(0.0..=360.0).contains(&angle) {
            return MotionIntent::Stopped;
        }
        if (80.0..=100.0).contains(&angle) {
            MotionIntent::Forward
        } else if (260.0..=280.0).contains(&angle) {
            MotionIntent::Backward
        } else if angle <= 10.0 || angle >= 350.0 {
            MotionIntent::TurnRight
        } else if (170.0..=190.0).contains(&angle) {
            MotionIntent::TurnLeft
        } else if angle > 10.0 && angle < 80.0 {
            MotionIntent::RotateRight
        } else if angle > 280.0 && angle < 350.0 {
            MotionIntent::RotateLeft
        } else {
            MotionIntent::Stopped
        }
    }

    /// True for any state that drives the wheels
    pub fn is_moving(&self) -> bool {
        !matches!(self, MotionIntent::Stopped | MotionIntent::EmergencyStop)
    }

    /// True for straight-line motion where both correction loops apply
    pub fn is_straight_line(&self) -> bool {
        matches!(self, MotionIntent::Forward | MotionIntent::Backward)
    }

    /// Telemetry name
    pub fn name(&self) -> &'static str {
        match self {
            MotionIntent::Stopped => "stopped",
            MotionIntent::Forward => "forward",
            MotionIntent::Backward => "backward",
            MotionIntent::RotateLeft => "rotate_left",
            MotionIntent::RotateRight => "rotate_right",
            MotionIntent::TurnLeft => "turn_left",
            MotionIntent::TurnRight => "turn_right",
            MotionIntent::EmergencyStop => "emergency_stop",
        }
    }
}

impl std::fmt::Display for MotionIntent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

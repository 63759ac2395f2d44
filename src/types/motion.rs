//! Drivetrain side identifiers

use serde::{Deserialize, Serialize};

/// Wheel side for per-motor commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WheelSide {
    Left,
    Right,
}

impl std::fmt::Display for WheelSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WheelSide::Left => write!(f, "left"),
            WheelSide::Right => write!(f, "right"),
        }
    }
}

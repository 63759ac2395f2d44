//! Movement intent and wheel-output mixing

pub mod intent;
pub mod state;

pub use intent::MotionIntent;
pub use state::{MotionStateMachine, PidCorrections};

//! Auxiliary GPIO driver trait

use crate::error::Result;

/// Horn and headlight outputs, orthogonal to the motion state machine
pub trait AuxGpio: Send {
    fn set_horn(&mut self, on: bool) -> Result<()>;

    fn set_headlight(&mut self, on: bool) -> Result<()>;
}

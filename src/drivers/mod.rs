//! Hardware driver traits
//!
//! The control core consumes these interfaces; concrete backends live under
//! [`crate::devices`]. All sensor traits return `Result` so backends can
//! report transient faults, but callers recover locally with fallback
//! values — a failed read never propagates past the calling component.

pub mod battery;
pub mod env;
pub mod gpio;
pub mod imu;
pub mod motor;

pub use battery::BatteryDriver;
pub use env::EnvSensorDriver;
pub use gpio::AuxGpio;
pub use imu::ImuDriver;
pub use motor::MotorDriver;

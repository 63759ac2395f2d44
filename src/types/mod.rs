//! Core data types shared across modules

pub mod env;
pub mod imu;
pub mod motion;

pub use env::{BatteryData, EnvironmentData};
pub use imu::{AttitudeBias, AttitudeSample, RawImuSample, TiltAngles};
pub use motion::WheelSide;

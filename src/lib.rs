//! PrahariIO: drive-control daemon for a two-wheeled surveillance robot
//!
//! Turns quadrature encoder edges and raw IMU samples into closed-loop
//! differential drive. A fixed-rate control loop owns the motors, two PID
//! loops (wheel-rate sync and yaw hold) keep straight-line motion
//! straight, and a TCP command/telemetry pair connects the operator
//! console.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐   commands    ┌────────────┐  intent   ┌─────────────┐
//! │ CommandRecv ├──────────────▶│ Dispatcher ├──────────▶│ SharedState │
//! └─────────────┘               └────────────┘           └──────┬──────┘
//!        ▲ stop/estop fast path        │ calibration            │ 20 Hz
//!        │                             ▼ feedback               ▼
//! ┌──────┴──────┐               ┌────────────┐           ┌─────────────┐
//! │ TCP clients │◀──────────────┤ Telemetry  │           │ ControlLoop │
//! └─────────────┘   snapshots   └────────────┘           └─────────────┘
//! ```

pub mod attitude;
pub mod config;
pub mod control;
pub mod devices;
pub mod dispatch;
pub mod drivers;
pub mod encoder;
pub mod error;
pub mod motion;
pub mod odometry;
pub mod pid;
pub mod state;
pub mod streaming;
pub mod types;

pub use config::AppConfig;
pub use error::{Error, Result};

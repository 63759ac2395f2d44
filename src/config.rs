//! Configuration for the PrahariIO daemon
//!
//! Loads configuration from a TOML file. Calibration constants (encoder
//! resolution, wheel geometry, PID gains, motor polarity) are externally
//! supplied here and never computed by the core.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Top-level application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    pub hardware: HardwareConfig,
    pub robot: RobotConfig,
    pub pid: PidConfig,
    pub control: ControlConfig,
    pub streaming: StreamingConfig,
    pub logging: LoggingConfig,
}

/// Hardware configuration (device selection and motor wiring)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HardwareConfig {
    /// Device backend ("mock" for simulation, hardware backends implement
    /// the driver traits out of tree)
    pub device_type: String,
    /// Left motor polarity (+1 or -1, corrects wiring direction)
    pub motor_polarity_left: i8,
    /// Right motor polarity (+1 or -1)
    pub motor_polarity_right: i8,
}

/// Robot geometry and drive calibration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RobotConfig {
    /// Quadrature ticks per wheel revolution (CPR x gear ratio)
    pub ticks_per_revolution: u32,
    /// Wheel circumference in centimeters
    pub wheel_circumference_cm: f32,
    /// Circumference of the circle traced by the wheels when spinning in
    /// place (pi * wheelbase), in centimeters
    pub base_circumference_cm: f32,
    /// Default PWM percentage when a command omits speed
    pub base_pwm: f32,
    /// Inner-wheel speed ratio during arcing turns (0..1)
    pub turn_inner_ratio: f32,
}

/// Gains and output clamp for a single PID loop
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct PidGains {
    pub kp: f32,
    pub ki: f32,
    pub kd: f32,
    /// Symmetric output limit (percent PWM)
    pub output_limit: f32,
}

/// PID configuration per correction loop
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PidConfig {
    /// Wheel-rate synchronization loop (error = rpm_left - rpm_right,
    /// signed so the loop converges in both travel directions)
    pub wheel_sync: PidGains,
    /// Yaw-hold loop (error = integrated gyro-z since maneuver start)
    pub yaw_hold: PidGains,
}

/// Control loop and publishing cadence
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ControlConfig {
    /// Control loop frequency in Hz (historically 5-20)
    pub frequency_hz: u32,
    /// Sensor telemetry publish interval in seconds
    pub sensor_publish_interval_secs: f32,
    /// IMU calibration sample count collected at startup
    pub calibration_samples: u32,
}

/// TCP streaming configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StreamingConfig {
    /// TCP bind address for outbound telemetry and calibration feedback
    pub telemetry_address: String,
    /// TCP bind address for inbound commands
    pub command_address: String,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl AppConfig {
    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        Ok(config)
    }

}

impl Default for AppConfig {
    /// Calibrated values for the deployed two-wheeled chassis (Pololu 37D
    /// gearmotors: 64 CPR x 34:1). Production deployments should use a
    /// proper TOML configuration file.
    fn default() -> Self {
        Self {
            hardware: HardwareConfig {
                device_type: "mock".to_string(),
                motor_polarity_left: 1,
                motor_polarity_right: 1,
            },
            robot: RobotConfig {
                ticks_per_revolution: 2176,
                wheel_circumference_cm: 26.0,
                base_circumference_cm: 70.0,
                base_pwm: 30.0,
                turn_inner_ratio: 0.4,
            },
            pid: PidConfig {
                wheel_sync: PidGains {
                    kp: 0.1,
                    ki: 0.0,
                    kd: 0.0,
                    output_limit: 20.0,
                },
                yaw_hold: PidGains {
                    kp: 0.2,
                    ki: 0.0,
                    kd: 0.0,
                    output_limit: 15.0,
                },
            },
            control: ControlConfig {
                frequency_hz: 20,
                sensor_publish_interval_secs: 2.0,
                calibration_samples: 1000,
            },
            streaming: StreamingConfig {
                telemetry_address: "0.0.0.0:5555".to_string(),
                command_address: "0.0.0.0:5556".to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
        }
    }
}

impl RobotConfig {
    /// Ticks accumulated per wheel over one full in-place rotation of the
    /// chassis
    pub fn ticks_per_full_turn(&self) -> f32 {
        (self.base_circumference_cm / self.wheel_circumference_cm)
            * self.ticks_per_revolution as f32
    }

    /// Ticks per degree of in-place chassis rotation
    pub fn ticks_per_degree(&self) -> f32 {
        self.ticks_per_full_turn() / 360.0
    }

    /// Ticks per centimeter of straight-line travel
    pub fn ticks_per_cm(&self) -> f32 {
        self.ticks_per_revolution as f32 / self.wheel_circumference_cm
    }
}

impl ControlConfig {
    /// Control loop period derived from the configured frequency
    pub fn control_period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.frequency_hz.max(1) as f64)
    }

    /// Telemetry publish interval
    pub fn publish_interval(&self) -> Duration {
        Duration::from_secs_f32(self.sensor_publish_interval_secs.max(0.1))
    }
}

//! Wire message types
//!
//! All frames are JSON with an outer `topic` tag. Inbound frames carry
//! operator commands shaped exactly like the original console emits them:
//! locomotion `{action, type, angle, speed, value, distance}` and
//! calibration `{quantity}`. Outbound topics are `sensor_data` and
//! `calibration_feedback`.

use crate::odometry::OdometrySample;
use crate::types::{AttitudeSample, BatteryData, EnvironmentData};
use serde::{Deserialize, Serialize};

/// Inbound command frame, dispatched by topic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "topic", content = "payload", rename_all = "snake_case")]
pub enum InboundMessage {
    Locomotion(LocomotionCommand),
    Calibration(CalibrationRequest),
}

/// Locomotion command, dispatched by action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum LocomotionCommand {
    /// Movement request, further dispatched by `type`
    Move(MoveCommand),
    /// Normal stop; also aborts an in-flight maneuver
    Stop,
    /// Latching stop; motion is refused until `clear_emergency`
    EmergencyStop,
    /// Release the emergency-stop latch
    ClearEmergency,
    Horn { value: bool },
    Headlight { value: bool },
}

/// Movement payload variants under `action = "move"`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MoveCommand {
    /// Continuous joystick drive; the angle selects the movement sector
    Speed {
        angle: f32,
        /// PWM percentage; omitted means the configured base PWM
        #[serde(default, skip_serializing_if = "Option::is_none")]
        speed: Option<f32>,
    },
    /// Two-phase autonomous maneuver: rotate in place by `angle` degrees
    /// (positive clockwise), then drive straight for `distance` cm
    /// (negative means backward)
    AngledDistance {
        angle: f32,
        distance: f32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        speed: Option<f32>,
    },
}

/// Sensor calibration request; `quantity` names the target
/// (currently only "altitude" is supported)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationRequest {
    pub quantity: String,
}

/// Outbound frame, tagged by topic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "topic", content = "payload", rename_all = "snake_case")]
pub enum OutboundMessage {
    SensorData(SensorData),
    CalibrationFeedback(CalibrationFeedback),
}

/// Per-wheel telemetry block
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WheelTelemetry {
    pub rpm: f32,
    pub ticks: i64,
    pub distance_cm: f32,
}

/// Both wheels' telemetry
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EncoderTelemetry {
    pub left: WheelTelemetry,
    pub right: WheelTelemetry,
}

impl EncoderTelemetry {
    /// Assemble from an odometry sample and raw tick counts
    pub fn from_odometry(odometry: &OdometrySample, ticks: (i64, i64)) -> Self {
        Self {
            left: WheelTelemetry {
                rpm: odometry.rpm_left,
                ticks: ticks.0,
                distance_cm: odometry.distance_left_cm,
            },
            right: WheelTelemetry {
                rpm: odometry.rpm_right,
                ticks: ticks.1,
                distance_cm: odometry.distance_right_cm,
            },
        }
    }
}

/// Movement status block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovementStatus {
    pub intent: String,
    pub target_speed: f32,
    pub emergency_stop: bool,
}

/// Inertial telemetry block: bias-corrected sample plus integrated yaw
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImuTelemetry {
    pub accel: [f32; 3],
    pub gyro: [f32; 3],
    pub roll: f32,
    pub pitch: f32,
    pub yaw: f32,
}

impl ImuTelemetry {
    pub fn from_sample(sample: &AttitudeSample, yaw_deg: f32) -> Self {
        Self {
            accel: sample.accel,
            gyro: sample.gyro,
            roll: sample.tilt.roll,
            pitch: sample.tilt.pitch,
            yaw: yaw_deg,
        }
    }
}

/// Periodic sensor snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorData {
    /// Milliseconds since the Unix epoch
    pub timestamp: u64,
    pub imu: ImuTelemetry,
    pub encoders: EncoderTelemetry,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<EnvironmentData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub battery: Option<BatteryData>,
    pub movement: MovementStatus,
}

/// Result of a calibration request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalibrationFeedback {
    /// "success" or "failure"
    pub status: String,
    /// Averaged reference pressure in hPa, present on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_pressure: Option<f32>,
    /// Failure cause; echoes the requested quantity name when it is
    /// unsupported
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CalibrationFeedback {
    pub fn success(reference_pressure: f32) -> Self {
        Self {
            status: "success".to_string(),
            reference_pressure: Some(reference_pressure),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            status: "failure".to_string(),
            reference_pressure: None,
            error: Some(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_joystick_move() {
        let json = r#"{"topic":"locomotion","payload":{"action":"move","type":"speed","angle":90.0,"speed":45.0}}"#;
        let msg: InboundMessage = serde_json::from_str(json).unwrap();
        assert_eq!(
            msg,
            InboundMessage::Locomotion(LocomotionCommand::Move(MoveCommand::Speed {
                angle: 90.0,
                speed: Some(45.0),
            }))
        );
    }

    #[test]
    fn test_decode_move_without_speed() {
        let json = r#"{"topic":"locomotion","payload":{"action":"move","type":"speed","angle":270.0}}"#;
        let msg: InboundMessage = serde_json::from_str(json).unwrap();
        assert_eq!(
            msg,
            InboundMessage::Locomotion(LocomotionCommand::Move(MoveCommand::Speed {
                angle: 270.0,
                speed: None,
            }))
        );
    }

    #[test]
    fn test_decode_angled_distance() {
        let json = r#"{"topic":"locomotion","payload":{"action":"move","type":"angled_distance","angle":-90.0,"distance":100.0}}"#;
        let msg: InboundMessage = serde_json::from_str(json).unwrap();
        assert_eq!(
            msg,
            InboundMessage::Locomotion(LocomotionCommand::Move(MoveCommand::AngledDistance {
                angle: -90.0,
                distance: 100.0,
                speed: None,
            }))
        );
    }

    #[test]
    fn test_decode_calibration_request() {
        let json = r#"{"topic":"calibration","payload":{"quantity":"altitude"}}"#;
        let msg: InboundMessage = serde_json::from_str(json).unwrap();
        assert_eq!(
            msg,
            InboundMessage::Calibration(CalibrationRequest {
                quantity: "altitude".to_string(),
            })
        );
    }

    #[test]
    fn test_decode_rejects_unknown_action() {
        let json = r#"{"topic":"locomotion","payload":{"action":"teleport","angle":0.0}}"#;
        assert!(serde_json::from_str::<InboundMessage>(json).is_err());
    }

    #[test]
    fn test_feedback_encoding() {
        let ok = OutboundMessage::CalibrationFeedback(CalibrationFeedback::success(1012.3));
        let json = serde_json::to_string(&ok).unwrap();
        assert!(json.contains(r#""topic":"calibration_feedback""#));
        assert!(json.contains(r#""status":"success""#));
        assert!(json.contains(r#""referencePressure":1012.3"#));
        assert!(!json.contains("error"));

        let bad = OutboundMessage::CalibrationFeedback(CalibrationFeedback::failure("pitch"));
        let json = serde_json::to_string(&bad).unwrap();
        assert!(json.contains(r#""status":"failure""#));
        assert!(json.contains(r#""error":"pitch""#));
        assert!(!json.contains("referencePressure"));
    }

    #[test]
    fn test_horn_headlight_round_trip() {
        for cmd in [
            LocomotionCommand::Horn { value: true },
            LocomotionCommand::Headlight { value: false },
            LocomotionCommand::Stop,
            LocomotionCommand::EmergencyStop,
            LocomotionCommand::ClearEmergency,
        ] {
            let msg = InboundMessage::Locomotion(cmd.clone());
            let json = serde_json::to_string(&msg).unwrap();
            let back: InboundMessage = serde_json::from_str(&json).unwrap();
            assert_eq!(back, InboundMessage::Locomotion(cmd));
        }
    }

    #[test]
    fn test_stop_wire_shape() {
        let json = serde_json::to_string(&InboundMessage::Locomotion(LocomotionCommand::Stop))
            .unwrap();
        assert!(json.contains(r#""topic":"locomotion""#));
        assert!(json.contains(r#""action":"stop""#));
    }
}

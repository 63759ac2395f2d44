//! Command dispatcher
//!
//! Single consumer of the inbound command channel. Joystick moves, the
//! emergency-stop clear, auxiliary GPIO, and calibration requests are
//! applied immediately; the `angled_distance` move runs as a blocking
//! two-phase maneuver on this thread, polling the shared cancel flag so a
//! stop from the receiver aborts it within one poll interval.
//!
//! Stop and emergency-stop never reach this thread; the receiver applies
//! them on the shared state directly.

use crate::config::{AppConfig, RobotConfig};
use crate::drivers::{AuxGpio, EnvSensorDriver};
use crate::motion::MotionIntent;
use crate::state::SharedState;
use crate::streaming::messages::{
    CalibrationFeedback, CalibrationRequest, InboundMessage, LocomotionCommand, MoveCommand,
    OutboundMessage,
};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Encoder poll cadence while a maneuver phase is in progress
const MANEUVER_POLL: Duration = Duration::from_millis(20);

/// Give up on a maneuver phase that has not reached its tick target
const MANEUVER_PHASE_TIMEOUT: Duration = Duration::from_secs(30);

/// Delay between pressure samples during altitude calibration
const CALIBRATION_SAMPLE_DELAY: Duration = Duration::from_millis(100);

/// Pressure samples averaged into the altitude reference
const ALTITUDE_SAMPLES: u32 = 10;

/// Consumes inbound commands and drives the motion state machine
pub struct CommandDispatcher {
    state: Arc<SharedState>,
    robot: RobotConfig,
    gpio: Box<dyn AuxGpio>,
    env: Arc<Mutex<Box<dyn EnvSensorDriver>>>,
    feedback_tx: Sender<OutboundMessage>,
    rx: Receiver<InboundMessage>,
}

impl CommandDispatcher {
    pub fn new(
        config: &AppConfig,
        state: Arc<SharedState>,
        gpio: Box<dyn AuxGpio>,
        env: Arc<Mutex<Box<dyn EnvSensorDriver>>>,
        feedback_tx: Sender<OutboundMessage>,
        rx: Receiver<InboundMessage>,
    ) -> Self {
        Self {
            state,
            robot: config.robot.clone(),
            gpio,
            env,
            feedback_tx,
            rx,
        }
    }

    /// Dispatch loop; returns when the daemon shuts down or the command
    /// channel closes
    pub fn run(&mut self) {
        log::info!("CommandDispatcher: Started");
        while self.state.is_running() {
            match self.rx.recv_timeout(Duration::from_millis(100)) {
                Ok(msg) => self.handle(msg),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    log::info!("CommandDispatcher: Command channel closed");
                    break;
                }
            }
        }
        log::info!("CommandDispatcher: Stopped");
    }

    fn handle(&mut self, msg: InboundMessage) {
        match msg {
            InboundMessage::Locomotion(cmd) => self.handle_locomotion(cmd),
            InboundMessage::Calibration(req) => self.handle_calibration(req),
        }
    }

    fn handle_locomotion(&mut self, cmd: LocomotionCommand) {
        match cmd {
            LocomotionCommand::Move(MoveCommand::Speed { angle, speed }) => {
                let intent = MotionIntent::from_joystick_angle(angle);
                let speed = speed.unwrap_or(self.robot.base_pwm);
                self.state.motion.lock().request(intent, speed);
            }
            LocomotionCommand::Move(MoveCommand::AngledDistance {
                angle,
                distance,
                speed,
            }) => {
                let speed = speed.unwrap_or(self.robot.base_pwm);
                self.run_angled_distance(angle, distance, speed);
            }
            LocomotionCommand::ClearEmergency => {
                self.state.motion.lock().clear_emergency();
            }
            LocomotionCommand::Horn { value } => {
                if let Err(e) = self.gpio.set_horn(value) {
                    log::error!("CommandDispatcher: Horn GPIO failed: {}", e);
                }
            }
            LocomotionCommand::Headlight { value } => {
                if let Err(e) = self.gpio.set_headlight(value) {
                    log::error!("CommandDispatcher: Headlight GPIO failed: {}", e);
                }
            }
            // Handled in the receiver's fast path; tolerate a client that
            // bypasses it
            LocomotionCommand::Stop => {
                self.state.motion.lock().request(MotionIntent::Stopped, 0.0);
            }
            LocomotionCommand::EmergencyStop => {
                self.state
                    .motion
                    .lock()
                    .request(MotionIntent::EmergencyStop, 0.0);
            }
        }
    }

    /// Rotate in place by `angle` degrees (positive clockwise), then drive
    /// straight for `distance` centimeters (negative backward). Each phase
    /// completes when both wheels have accumulated the target tick count.
    fn run_angled_distance(&mut self, angle: f32, distance: f32, speed: f32) {
        if self.state.motion.lock().is_estop_latched() {
            log::warn!("CommandDispatcher: Refusing maneuver while emergency stop is latched");
            return;
        }
        log::info!(
            "CommandDispatcher: Maneuver: rotate {:.1} deg then travel {:.1} cm at {:.0}%",
            angle,
            distance,
            speed
        );
        self.state.clear_cancel();

        if angle != 0.0 {
            let intent = if angle > 0.0 {
                MotionIntent::RotateRight
            } else {
                MotionIntent::RotateLeft
            };
            let target = rotation_ticks(&self.robot, angle);
            if !self.run_phase(intent, target, speed) {
                self.finish_maneuver(false);
                return;
            }
        }

        if distance != 0.0 {
            let intent = if distance > 0.0 {
                MotionIntent::Forward
            } else {
                MotionIntent::Backward
            };
            let target = straight_ticks(&self.robot, distance);
            if !self.run_phase(intent, target, speed) {
                self.finish_maneuver(false);
                return;
            }
        }

        self.finish_maneuver(true);
    }

    /// Drive one maneuver phase until both wheels reach `target_ticks`.
    ///
    /// Returns false when cancelled, refused, timed out, or shut down.
    fn run_phase(&self, intent: MotionIntent, target_ticks: i64, speed: f32) -> bool {
        let (start_left, start_right) = self.state.encoders.ticks();
        if !self.state.motion.lock().request(intent, speed) {
            return false;
        }

        let deadline = Instant::now() + MANEUVER_PHASE_TIMEOUT;
        loop {
            thread::sleep(MANEUVER_POLL);
            if !self.state.is_running() || self.state.is_cancelled() {
                log::info!("CommandDispatcher: Maneuver phase '{}' cancelled", intent);
                return false;
            }

            let (left, right) = self.state.encoders.ticks();
            let delta_left = (left - start_left).abs();
            let delta_right = (right - start_right).abs();
            if delta_left >= target_ticks && delta_right >= target_ticks {
                log::debug!(
                    "CommandDispatcher: Phase '{}' complete ({}/{} ticks)",
                    intent,
                    delta_left.min(delta_right),
                    target_ticks
                );
                return true;
            }

            if Instant::now() >= deadline {
                log::warn!(
                    "CommandDispatcher: Phase '{}' timed out at {}/{} ticks",
                    intent,
                    delta_left.min(delta_right),
                    target_ticks
                );
                return false;
            }
        }
    }

    fn finish_maneuver(&self, completed: bool) {
        // A refused request here means an emergency stop arrived mid-phase;
        // the latch already holds the wheels at zero.
        self.state.motion.lock().request(MotionIntent::Stopped, 0.0);
        if completed {
            log::info!("CommandDispatcher: Maneuver complete");
        }
    }

    /// Average pressure readings into a new altitude reference
    fn handle_calibration(&mut self, req: CalibrationRequest) {
        if req.quantity != "altitude" {
            log::warn!(
                "CommandDispatcher: Unsupported calibration quantity '{}'",
                req.quantity
            );
            self.send_feedback(CalibrationFeedback::failure(format!(
                "unsupported quantity '{}'",
                req.quantity
            )));
            return;
        }

        let mut pressure_sum = 0.0f64;
        let mut valid: u32 = 0;
        for _ in 0..ALTITUDE_SAMPLES {
            match self.env.lock().read_environment() {
                Ok(data) => {
                    pressure_sum += data.pressure as f64;
                    valid += 1;
                }
                Err(e) => {
                    log::debug!("CommandDispatcher: Pressure sample failed: {}", e);
                }
            }
            thread::sleep(CALIBRATION_SAMPLE_DELAY);
        }

        if valid == 0 {
            log::warn!("CommandDispatcher: Altitude calibration produced no valid samples");
            self.send_feedback(CalibrationFeedback::failure("no valid pressure samples"));
            return;
        }

        let reference = (pressure_sum / valid as f64) as f32;
        log::info!(
            "CommandDispatcher: Altitude calibrated: reference pressure {:.2} hPa ({}/{} samples)",
            reference,
            valid,
            ALTITUDE_SAMPLES
        );
        self.send_feedback(CalibrationFeedback::success(reference));
    }

    fn send_feedback(&self, feedback: CalibrationFeedback) {
        if self
            .feedback_tx
            .send(OutboundMessage::CalibrationFeedback(feedback))
            .is_err()
        {
            log::warn!("CommandDispatcher: Feedback channel closed");
        }
    }
}

/// Per-wheel tick target for an in-place rotation of `angle` degrees
fn rotation_ticks(robot: &RobotConfig, angle: f32) -> i64 {
    (robot.ticks_per_degree() * angle.abs()).round() as i64
}

/// Per-wheel tick target for `distance` centimeters of straight travel
fn straight_ticks(robot: &RobotConfig, distance: f32) -> i64 {
    (robot.ticks_per_cm() * distance.abs()).round() as i64
}

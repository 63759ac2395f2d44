//! Fixed-rate control loop
//!
//! Owns the motor driver and the inertial estimator. Every tick it reads
//! the sensors, recomputes the correction loops for the current movement
//! intent, mixes the wheel outputs, and writes them to the motors. The
//! loop is the only writer of motor PWM, so a stop applied to the shared
//! state takes effect within one period.
//!
//! PID state and the yaw integral are reset on every intent transition
//! into motion, so each maneuver starts from a clean baseline.

use crate::attitude::AttitudeEstimator;
use crate::config::AppConfig;
use crate::drivers::MotorDriver;
use crate::motion::{MotionIntent, PidCorrections};
use crate::odometry::{OdometrySample, OdometryTracker};
use crate::pid::PidController;
use crate::state::{ControlSnapshot, SharedState};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

pub struct ControlLoop {
    state: Arc<SharedState>,
    motor: Box<dyn MotorDriver>,
    attitude: AttitudeEstimator,
    odometry: OdometryTracker,
    wheel_sync_pid: PidController,
    yaw_pid: PidController,
    period: Duration,
    last_intent: MotionIntent,
    last_overrun_log: Option<Instant>,
}

impl ControlLoop {
    pub fn new(
        config: &AppConfig,
        state: Arc<SharedState>,
        motor: Box<dyn MotorDriver>,
        attitude: AttitudeEstimator,
    ) -> Self {
        let odometry = OdometryTracker::new(&config.robot, Arc::clone(&state.encoders));
        Self {
            state,
            motor,
            attitude,
            odometry,
            wheel_sync_pid: PidController::new(config.pid.wheel_sync),
            yaw_pid: PidController::new(config.pid.yaw_hold),
            period: config.control.control_period(),
            last_intent: MotionIntent::Stopped,
            last_overrun_log: None,
        }
    }

    /// Run until shutdown, then stop the motors
    pub fn run(&mut self) {
        log::info!(
            "ControlLoop: Started at {:.0} Hz",
            1.0 / self.period.as_secs_f32()
        );

        let mut last_tick = Instant::now();
        while self.state.is_running() {
            let tick_start = Instant::now();
            let dt = tick_start.duration_since(last_tick).as_secs_f32();
            last_tick = tick_start;

            self.tick(dt);

            let elapsed = tick_start.elapsed();
            if elapsed > self.period {
                self.log_overrun(elapsed);
            } else {
                thread::sleep(self.period - elapsed);
            }
        }

        if let Err(e) = self.motor.stop_all() {
            log::error!("ControlLoop: Failed to stop motors at shutdown: {}", e);
        }
        log::info!("ControlLoop: Stopped");
    }

    /// One control period: sense, correct, mix, actuate, publish
    fn tick(&mut self, dt: f32) {
        let attitude = self.attitude.read(dt);
        let odometry = self.odometry.update(dt);

        let state = Arc::clone(&self.state);
        let (intent, outputs) = {
            let motion = state.motion.lock();
            let intent = motion.intent();

            if intent != self.last_intent {
                self.on_transition(intent);
            }

            let corrections = self.corrections_for(intent, &odometry, dt);
            (intent, motion.wheel_outputs(corrections))
        };
        self.last_intent = intent;

        if let Err(e) = self.motor.set_wheels(outputs.0, outputs.1) {
            log::error!("ControlLoop: Motor write failed: {}", e);
        }

        *self.state.snapshot.lock() = ControlSnapshot {
            attitude,
            yaw_deg: self.attitude.yaw(),
            odometry,
            ticks: self.state.encoders.ticks(),
        };
    }

    /// A new maneuver gets fresh correction state
    fn on_transition(&mut self, intent: MotionIntent) {
        log::debug!("ControlLoop: Intent changed to '{}'", intent);
        self.wheel_sync_pid.reset();
        self.yaw_pid.reset();
        if intent.is_moving() {
            self.attitude.reset_yaw();
        }
    }

    /// Corrections by intent category: straight-line motion gets both
    /// loops, arcing turns only yaw hold, in-place rotation neither.
    fn corrections_for(
        &mut self,
        intent: MotionIntent,
        odometry: &OdometrySample,
        dt: f32,
    ) -> PidCorrections {
        if intent.is_straight_line() {
            // Signed error: in reverse both RPMs are negative, so the wheel
            // running faster in reverse pulls the error negative and the
            // mixer slows it. An absolute-value error would flip the
            // feedback sign for Backward.
            let rpm_error = odometry.rpm_left - odometry.rpm_right;
            PidCorrections {
                wheel_sync: self.wheel_sync_pid.compute(rpm_error, dt),
                yaw: self.yaw_pid.compute(self.attitude.yaw(), dt),
            }
        } else if matches!(intent, MotionIntent::TurnLeft | MotionIntent::TurnRight) {
            PidCorrections {
                wheel_sync: 0.0,
                yaw: self.yaw_pid.compute(self.attitude.yaw(), dt),
            }
        } else {
            PidCorrections::default()
        }
    }

    fn log_overrun(&mut self, elapsed: Duration) {
        // Throttled to 1Hz; a loaded CPU would otherwise flood the log
        let should_log = self
            .last_overrun_log
            .map_or(true, |t| t.elapsed() >= Duration::from_secs(1));
        if should_log {
            log::warn!(
                "ControlLoop: Tick overran its period: {:.1}ms > {:.1}ms",
                elapsed.as_secs_f32() * 1000.0,
                self.period.as_secs_f32() * 1000.0
            );
            self.last_overrun_log = Some(Instant::now());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::ImuDriver;
    use crate::error::Result;
    use crate::types::{RawImuSample, WheelSide};
    use approx::assert_relative_eq;
    use parking_lot::Mutex as PlMutex;

    /// Motor stub that records the last wheel command
    #[derive(Clone)]
    struct RecordingMotor {
        wheels: Arc<PlMutex<(f32, f32)>>,
        stopped: Arc<PlMutex<bool>>,
    }

    impl RecordingMotor {
        fn new() -> Self {
            Self {
                wheels: Arc::new(PlMutex::new((0.0, 0.0))),
                stopped: Arc::new(PlMutex::new(false)),
            }
        }
    }

    impl MotorDriver for RecordingMotor {
        fn set_wheel_pwm(&mut self, side: WheelSide, percent: f32) -> Result<()> {
            let mut wheels = self.wheels.lock();
            match side {
                WheelSide::Left => wheels.0 = percent,
                WheelSide::Right => wheels.1 = percent,
            }
            *self.stopped.lock() = false;
            Ok(())
        }

        fn stop_all(&mut self) -> Result<()> {
            *self.wheels.lock() = (0.0, 0.0);
            *self.stopped.lock() = true;
            Ok(())
        }
    }

    /// IMU stub that always reads a constant sample
    struct ConstantImu {
        sample: RawImuSample,
    }

    impl ImuDriver for ConstantImu {
        fn read_raw(&mut self) -> Result<RawImuSample> {
            Ok(self.sample)
        }
    }

    fn control_loop(gyro_z: f32) -> (ControlLoop, Arc<SharedState>, RecordingMotor) {
        let config = AppConfig::default();
        let state = Arc::new(SharedState::new(config.robot.turn_inner_ratio));
        let motor = RecordingMotor::new();
        let attitude = AttitudeEstimator::new(Box::new(ConstantImu {
            sample: RawImuSample {
                accel: [0.0, 0.0, 1.0],
                gyro: [0.0, 0.0, gyro_z],
            },
        }));
        let ctl = ControlLoop::new(&config, Arc::clone(&state), Box::new(motor.clone()), attitude);
        (ctl, state, motor)
    }

    #[test]
    fn test_stopped_tick_routes_to_stop_all() {
        let (mut ctl, _state, motor) = control_loop(0.0);
        ctl.tick(0.05);
        assert!(*motor.stopped.lock());
        assert_eq!(*motor.wheels.lock(), (0.0, 0.0));
    }

    #[test]
    fn test_forward_with_encoder_imbalance_counter_steers() {
        let (mut ctl, state, motor) = control_loop(0.0);
        state.motion.lock().request(MotionIntent::Forward, 30.0);

        // Left wheel runs one full revolution ahead over the tick
        state.encoders.left.add_ticks(2176);
        ctl.tick(0.05);

        let (left, right) = *motor.wheels.lock();
        assert!(left < 30.0, "left should be slowed, got {}", left);
        assert!(right > 30.0, "right should be sped up, got {}", right);
    }

    #[test]
    fn test_backward_with_encoder_imbalance_counter_steers() {
        // In reverse the faster wheel has the larger negative RPM; its
        // commanded magnitude must drop, not grow.
        let (mut ctl, state, motor) = control_loop(0.0);
        state.motion.lock().request(MotionIntent::Backward, 30.0);

        state.encoders.left.add_ticks(-2176);
        ctl.tick(0.05);

        let (left, right) = *motor.wheels.lock();
        assert!(
            left.abs() < 30.0,
            "faster reverse wheel should be slowed, got {}",
            left
        );
        assert!(
            right.abs() > 30.0,
            "slower reverse wheel should be sped up, got {}",
            right
        );
    }

    #[test]
    fn test_yaw_drift_corrected_during_forward() {
        // Constant positive gyro-z accumulates yaw; the yaw-hold loop must
        // steer against it.
        let (mut ctl, state, motor) = control_loop(10.0);
        state.motion.lock().request(MotionIntent::Forward, 30.0);

        for _ in 0..10 {
            ctl.tick(0.05);
        }

        let (left, right) = *motor.wheels.lock();
        assert!(left < right, "expected counter-steer, got ({}, {})", left, right);
    }

    #[test]
    fn test_transition_resets_yaw_integral() {
        let (mut ctl, state, _motor) = control_loop(10.0);
        state.motion.lock().request(MotionIntent::Forward, 30.0);
        for _ in 0..10 {
            ctl.tick(0.05);
        }
        assert!(ctl.attitude.yaw() > 1.0);

        // Stop, then start a new maneuver; the integral must restart at 0
        state.motion.lock().request(MotionIntent::Stopped, 0.0);
        ctl.tick(0.05);
        state.motion.lock().request(MotionIntent::RotateLeft, 30.0);
        ctl.tick(0.05);
        assert!(ctl.attitude.yaw().abs() < 0.6);
    }

    #[test]
    fn test_rotation_gets_no_corrections() {
        let (mut ctl, state, motor) = control_loop(10.0);
        state.motion.lock().request(MotionIntent::RotateRight, 40.0);
        state.encoders.left.add_ticks(500);

        for _ in 0..5 {
            ctl.tick(0.05);
        }

        let (left, right) = *motor.wheels.lock();
        assert_relative_eq!(left, 40.0);
        assert_relative_eq!(right, -40.0);
    }

    #[test]
    fn test_snapshot_published_each_tick() {
        let (mut ctl, state, _motor) = control_loop(0.0);
        state.encoders.left.add_ticks(1088);
        ctl.tick(0.5);

        let snap = state.snapshot();
        assert_eq!(snap.ticks.0, 1088);
        assert_relative_eq!(snap.odometry.rpm_left, 60.0, epsilon = 1e-3);
    }
}

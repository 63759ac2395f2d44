//! Wheel odometry from quadrature tick counts
//!
//! Converts raw tick deltas into per-wheel RPM and cumulative distance at
//! the control-loop cadence. `dt` is measured wall-clock between calls,
//! never assumed constant.

use crate::config::RobotConfig;
use crate::encoder::EncoderPair;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Per-wheel RPM and cumulative distance, recomputed every control tick
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct OdometrySample {
    pub rpm_left: f32,
    pub rpm_right: f32,
    pub distance_left_cm: f32,
    pub distance_right_cm: f32,
}

/// Tracks wheel rates and travel distance from the shared encoder pair
pub struct OdometryTracker {
    encoders: Arc<EncoderPair>,
    ticks_per_rev: f32,
    wheel_circumference_cm: f32,
    last_ticks: (i64, i64),
    sample: OdometrySample,
    last_log: Option<Instant>,
}

impl OdometryTracker {
    pub fn new(config: &RobotConfig, encoders: Arc<EncoderPair>) -> Self {
        log::debug!(
            "OdometryTracker: Initialized with ticks_per_rev={}, wheel_circumference={:.1}cm",
            config.ticks_per_revolution,
            config.wheel_circumference_cm
        );

        Self {
            encoders,
            ticks_per_rev: config.ticks_per_revolution as f32,
            wheel_circumference_cm: config.wheel_circumference_cm,
            last_ticks: (0, 0),
            sample: OdometrySample::default(),
            last_log: None,
        }
    }

    /// Recompute RPM and distance from the tick deltas since the previous
    /// call. `dt <= 0` is a no-op that keeps the previous RPM values.
    pub fn update(&mut self, dt: f32) -> OdometrySample {
        if dt <= 0.0 {
            return self.sample;
        }

        let (left, right) = self.encoders.ticks();
        let delta_left = (left - self.last_ticks.0) as f32;
        let delta_right = (right - self.last_ticks.1) as f32;
        self.last_ticks = (left, right);

        self.sample.rpm_left = (delta_left / self.ticks_per_rev) * 60.0 / dt;
        self.sample.rpm_right = (delta_right / self.ticks_per_rev) * 60.0 / dt;
        self.sample.distance_left_cm =
            (left as f32 / self.ticks_per_rev) * self.wheel_circumference_cm;
        self.sample.distance_right_cm =
            (right as f32 / self.ticks_per_rev) * self.wheel_circumference_cm;

        // Throttled to 1Hz to keep the hot loop quiet
        let should_log = self
            .last_log
            .map_or(true, |t| t.elapsed() >= Duration::from_secs(1));
        if should_log && (delta_left != 0.0 || delta_right != 0.0) {
            log::debug!(
                "OdometryTracker: dL={} dR={} rpm=({:.1}, {:.1}) dist=({:.1}cm, {:.1}cm)",
                delta_left,
                delta_right,
                self.sample.rpm_left,
                self.sample.rpm_right,
                self.sample.distance_left_cm,
                self.sample.distance_right_cm
            );
            self.last_log = Some(Instant::now());
        }

        self.sample
    }

    /// Latest sample without recomputing
    pub fn sample(&self) -> OdometrySample {
        self.sample
    }

    /// Zero both encoders and the RPM/distance history. Called whenever a
    /// new maneuver begins.
    pub fn reset(&mut self) {
        log::debug!("OdometryTracker: Reset");
        self.encoders.reset();
        self.last_ticks = (0, 0);
        self.sample = OdometrySample::default();
    }
}

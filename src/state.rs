//! State shared between the control, dispatcher, and streaming threads
//!
//! One `Arc<SharedState>` is created at startup and handed to every
//! thread. Locks are scoped to single reads or writes; nothing holds a
//! lock across I/O or a sleep.

use crate::encoder::EncoderPair;
use crate::motion::MotionStateMachine;
use crate::odometry::OdometrySample;
use crate::types::AttitudeSample;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Sensor snapshot refreshed by the control loop every tick
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ControlSnapshot {
    pub attitude: AttitudeSample,
    /// Integrated yaw in degrees since the last maneuver start
    pub yaw_deg: f32,
    pub odometry: OdometrySample,
    /// Raw encoder tick counts (left, right)
    pub ticks: (i64, i64),
}

/// Cross-thread state hub
pub struct SharedState {
    /// Movement intent plus emergency-stop latch, written by the
    /// dispatcher and receiver, read by the control loop every tick
    pub motion: Mutex<MotionStateMachine>,
    /// Tick counters, incremented from encoder edge callbacks
    pub encoders: Arc<EncoderPair>,
    /// Latest control-loop sensor snapshot for telemetry
    pub snapshot: Mutex<ControlSnapshot>,
    /// Aborts any in-flight multi-phase maneuver
    cancel: AtomicBool,
    /// Cleared once at shutdown; every thread polls it
    running: AtomicBool,
}

impl SharedState {
    pub fn new(turn_inner_ratio: f32) -> Self {
        Self {
            motion: Mutex::new(MotionStateMachine::new(turn_inner_ratio)),
            encoders: Arc::new(EncoderPair::new()),
            snapshot: Mutex::new(ControlSnapshot::default()),
            cancel: AtomicBool::new(false),
            running: AtomicBool::new(true),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Begin shutdown. Also cancels any in-flight maneuver so the
    /// dispatcher unblocks promptly.
    pub fn shutdown(&self) {
        self.running.store(false, Ordering::SeqCst);
        self.cancel.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }

    /// Request cancellation of the current maneuver
    pub fn cancel_maneuver(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    /// Arm a new maneuver by clearing the cancel flag
    pub fn clear_cancel(&self) {
        self.cancel.store(false, Ordering::SeqCst);
    }

    /// Latest control-loop snapshot
    pub fn snapshot(&self) -> ControlSnapshot {
        *self.snapshot.lock()
    }
}

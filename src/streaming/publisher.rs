//! Telemetry publisher over TCP
//!
//! A dedicated thread owns the listener and broadcasts two kinds of
//! frames to every connected client: the periodic sensor snapshot, and
//! calibration feedback forwarded from the dispatcher over a channel.
//! Sensor reads that fail simply omit their block from the snapshot, so
//! telemetry degrades rather than stalls.

use crate::config::AppConfig;
use crate::drivers::{BatteryDriver, EnvSensorDriver};
use crate::error::Result;
use crate::state::SharedState;
use crate::streaming::messages::{
    EncoderTelemetry, ImuTelemetry, MovementStatus, OutboundMessage, SensorData,
};
use crate::streaming::wire;
use crossbeam_channel::Receiver;
use parking_lot::Mutex;
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Accept-poll cadence of the publisher loop
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Publisher thread handle
pub struct TelemetryPublisher {
    thread: Option<JoinHandle<()>>,
}

impl TelemetryPublisher {
    /// Bind the telemetry listener and spawn the publisher thread
    pub fn start(
        config: &AppConfig,
        state: Arc<SharedState>,
        env: Arc<Mutex<Box<dyn EnvSensorDriver>>>,
        battery: Box<dyn BatteryDriver>,
        feedback_rx: Receiver<OutboundMessage>,
    ) -> Result<Self> {
        let listener = TcpListener::bind(&config.streaming.telemetry_address)?;
        listener.set_nonblocking(true)?;
        log::info!(
            "TelemetryPublisher: Listening on {}",
            config.streaming.telemetry_address
        );

        let publish_interval = config.control.publish_interval();
        let thread = thread::Builder::new()
            .name("telemetry".to_string())
            .spawn(move || {
                publisher_loop(
                    listener,
                    state,
                    env,
                    battery,
                    feedback_rx,
                    publish_interval,
                );
            })?;

        Ok(Self {
            thread: Some(thread),
        })
    }

    /// Wait for the publisher thread to exit. Shutdown is signalled
    /// through [`SharedState::shutdown`].
    pub fn join(&mut self) {
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

fn publisher_loop(
    listener: TcpListener,
    state: Arc<SharedState>,
    env: Arc<Mutex<Box<dyn EnvSensorDriver>>>,
    mut battery: Box<dyn BatteryDriver>,
    feedback_rx: Receiver<OutboundMessage>,
    publish_interval: Duration,
) {
    let mut clients: Vec<TcpStream> = Vec::new();
    let mut last_publish: Option<Instant> = None;
    let mut published: u64 = 0;

    while state.is_running() {
        match listener.accept() {
            Ok((stream, addr)) => {
                // Writes must block; the accepted socket inherits the
                // listener's non-blocking mode on some platforms
                if let Err(e) = stream.set_nonblocking(false) {
                    log::warn!("TelemetryPublisher: Client {} setup failed: {}", addr, e);
                } else {
                    log::info!("TelemetryPublisher: Client connected: {}", addr);
                    clients.push(stream);
                }
            }
            Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {}
            Err(e) => {
                log::error!("TelemetryPublisher: Accept failed: {}", e);
            }
        }

        // Calibration feedback is forwarded as soon as it arrives
        while let Ok(msg) = feedback_rx.try_recv() {
            broadcast(&mut clients, &msg);
        }

        let due = last_publish.map_or(true, |t| t.elapsed() >= publish_interval);
        if due {
            let snapshot = build_snapshot(&state, &env, battery.as_mut());
            broadcast(&mut clients, &OutboundMessage::SensorData(snapshot));
            published += 1;
            last_publish = Some(Instant::now());
        }

        thread::sleep(POLL_INTERVAL);
    }

    log::info!(
        "TelemetryPublisher: Stopped ({} snapshots published)",
        published
    );
}

/// Assemble one sensor snapshot from the shared state and slow sensors
fn build_snapshot(
    state: &SharedState,
    env: &Mutex<Box<dyn EnvSensorDriver>>,
    battery: &mut dyn BatteryDriver,
) -> SensorData {
    let control = state.snapshot();
    let encoders = EncoderTelemetry::from_odometry(&control.odometry, control.ticks);

    let movement = {
        let motion = state.motion.lock();
        MovementStatus {
            intent: motion.intent().name().to_string(),
            target_speed: motion.target_speed(),
            emergency_stop: motion.is_estop_latched(),
        }
    };

    let environment = match env.lock().read_environment() {
        Ok(data) => Some(data),
        Err(e) => {
            log::debug!("TelemetryPublisher: Environment read failed: {}", e);
            None
        }
    };
    let battery = match battery.read_battery() {
        Ok(data) => Some(data),
        Err(e) => {
            log::debug!("TelemetryPublisher: Battery read failed: {}", e);
            None
        }
    };

    SensorData {
        timestamp: SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0),
        imu: ImuTelemetry::from_sample(&control.attitude, control.yaw_deg),
        encoders,
        environment,
        battery,
        movement,
    }
}

/// Send one frame to every client, dropping the ones that fail
fn broadcast(clients: &mut Vec<TcpStream>, msg: &OutboundMessage) {
    clients.retain_mut(|client| match wire::write_frame(client, msg) {
        Ok(()) => true,
        Err(e) => {
            if let Ok(addr) = client.peer_addr() {
                log::info!("TelemetryPublisher: Client {} disconnected: {}", addr, e);
            }
            false
        }
    });
}

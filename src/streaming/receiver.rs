//! TCP command receiver
//!
//! Accepts operator connections and decodes inbound command frames.
//! `stop` and `emergency_stop` are applied directly on the shared motion
//! state here, before the dispatcher ever sees them, so a stop is never
//! stuck behind a long-running maneuver in the dispatch queue. Everything
//! else is forwarded to the dispatcher over a channel.
//!
//! One client is served at a time; a malformed payload is logged and
//! dropped without closing the connection.

use crate::config::AppConfig;
use crate::error::{Error, Result};
use crate::motion::MotionIntent;
use crate::state::SharedState;
use crate::streaming::messages::{InboundMessage, LocomotionCommand};
use crate::streaming::wire;
use crossbeam_channel::Sender;
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Read timeout so the loop can poll the running flag between frames
const READ_TIMEOUT: Duration = Duration::from_millis(500);

/// Command receiver thread handle
pub struct CommandReceiver {
    thread: Option<JoinHandle<()>>,
}

impl CommandReceiver {
    /// Bind the command listener and spawn the receiver thread
    pub fn start(
        config: &AppConfig,
        state: Arc<SharedState>,
        dispatch_tx: Sender<InboundMessage>,
    ) -> Result<Self> {
        let listener = TcpListener::bind(&config.streaming.command_address)?;
        listener.set_nonblocking(true)?;
        log::info!(
            "CommandReceiver: Listening on {}",
            config.streaming.command_address
        );

        let thread = thread::Builder::new()
            .name("cmd-receiver".to_string())
            .spawn(move || {
                accept_loop(listener, state, dispatch_tx);
            })?;

        Ok(Self {
            thread: Some(thread),
        })
    }

    /// Wait for the receiver thread to exit
    pub fn join(&mut self) {
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

fn accept_loop(listener: TcpListener, state: Arc<SharedState>, dispatch_tx: Sender<InboundMessage>) {
    while state.is_running() {
        match listener.accept() {
            Ok((stream, addr)) => {
                log::info!("CommandReceiver: Client connected: {}", addr);
                if let Err(e) = serve_client(stream, &state, &dispatch_tx) {
                    log::warn!("CommandReceiver: Client {} dropped: {}", addr, e);
                } else {
                    log::info!("CommandReceiver: Client {} disconnected", addr);
                }
            }
            Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                thread::sleep(Duration::from_millis(100));
            }
            Err(e) => {
                log::error!("CommandReceiver: Accept failed: {}", e);
                thread::sleep(Duration::from_millis(100));
            }
        }
    }
    log::info!("CommandReceiver: Stopped");
}

fn serve_client(
    mut stream: TcpStream,
    state: &SharedState,
    dispatch_tx: &Sender<InboundMessage>,
) -> Result<()> {
    stream.set_nonblocking(false)?;
    stream.set_read_timeout(Some(READ_TIMEOUT))?;

    let mut buf = Vec::with_capacity(256);
    while state.is_running() {
        match wire::read_frame(&mut stream, &mut buf) {
            Ok(true) => {}
            Ok(false) => continue,
            Err(Error::Io(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof
                    || e.kind() == std::io::ErrorKind::ConnectionReset =>
            {
                return Ok(());
            }
            Err(e) => return Err(e),
        }

        let msg: InboundMessage = match wire::decode(&buf) {
            Ok(msg) => msg,
            Err(e) => {
                log::warn!("CommandReceiver: Dropping malformed command: {}", e);
                continue;
            }
        };
        log::debug!("CommandReceiver: Received {:?}", msg);

        if handle_fast_path(state, &msg) {
            continue;
        }
        if dispatch_tx.send(msg).is_err() {
            log::error!("CommandReceiver: Dispatcher channel closed");
            return Err(Error::ChannelClosed);
        }
    }
    Ok(())
}

/// Apply stop commands directly, bypassing the dispatch queue.
///
/// Returns whether the message was fully handled here.
fn handle_fast_path(state: &SharedState, msg: &InboundMessage) -> bool {
    let cmd = match msg {
        InboundMessage::Locomotion(cmd) => cmd,
        InboundMessage::Calibration(_) => return false,
    };
    match cmd {
        LocomotionCommand::Stop => {
            state.cancel_maneuver();
            state.motion.lock().request(MotionIntent::Stopped, 0.0);
            true
        }
        LocomotionCommand::EmergencyStop => {
            state.cancel_maneuver();
            state.motion.lock().request(MotionIntent::EmergencyStop, 0.0);
            true
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::streaming::messages::MoveCommand;

    #[test]
    fn test_stop_fast_path_applies_immediately() {
        let state = SharedState::new(0.4);
        state.motion.lock().request(MotionIntent::Forward, 30.0);

        let handled = handle_fast_path(
            &state,
            &InboundMessage::Locomotion(LocomotionCommand::Stop),
        );
        assert!(handled);
        assert_eq!(state.motion.lock().intent(), MotionIntent::Stopped);
        assert!(state.is_cancelled());
    }

    #[test]
    fn test_emergency_stop_fast_path_latches() {
        let state = SharedState::new(0.4);
        state.motion.lock().request(MotionIntent::Forward, 30.0);

        let handled = handle_fast_path(
            &state,
            &InboundMessage::Locomotion(LocomotionCommand::EmergencyStop),
        );
        assert!(handled);
        assert!(state.motion.lock().is_estop_latched());
    }

    #[test]
    fn test_other_commands_are_forwarded() {
        let state = SharedState::new(0.4);
        let msg = InboundMessage::Locomotion(LocomotionCommand::Move(MoveCommand::Speed {
            angle: 90.0,
            speed: None,
        }));
        assert!(!handle_fast_path(&state, &msg));

        let clear = InboundMessage::Locomotion(LocomotionCommand::ClearEmergency);
        assert!(!handle_fast_path(&state, &clear));
    }
}

//! TCP streaming: outbound telemetry and inbound commands

pub mod messages;
pub mod publisher;
pub mod receiver;
pub mod wire;

pub use messages::{InboundMessage, OutboundMessage};
pub use publisher::TelemetryPublisher;
pub use receiver::CommandReceiver;

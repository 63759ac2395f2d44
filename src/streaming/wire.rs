//! Length-prefixed JSON framing
//!
//! Every TCP frame, in both directions, is a 4-byte big-endian length
//! followed by a JSON payload:
//!
//! ```text
//! ┌──────────────────┬─────────────────────┐
//! │ Length (4 bytes) │ JSON payload        │
//! │ Big-endian u32   │ (variable size)     │
//! └──────────────────┴─────────────────────┘
//! ```
//!
//! Frames larger than 1MB are rejected before the payload is read. A
//! payload that fails to deserialize is logged and dropped by the caller;
//! the connection stays open.

use crate::error::{Error, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::io::{Read, Write};

/// Upper bound on a single frame's payload
pub const MAX_FRAME_BYTES: usize = 1024 * 1024;

/// Serialize `msg` and write it as one length-prefixed frame
pub fn write_frame<W: Write, T: Serialize>(writer: &mut W, msg: &T) -> Result<()> {
    let payload = serde_json::to_vec(msg).map_err(|e| Error::Serialization(e.to_string()))?;
    let len = payload.len() as u32;
    writer.write_all(&len.to_be_bytes())?;
    writer.write_all(&payload)?;
    writer.flush()?;
    Ok(())
}

/// Read one frame's payload into `buf`.
///
/// Returns `Ok(false)` on a read timeout so callers can poll a shutdown
/// flag between frames; any other I/O failure (including EOF) is an
/// error. `buf` is reused across calls to avoid per-frame allocation.
pub fn read_frame<R: Read>(reader: &mut R, buf: &mut Vec<u8>) -> Result<bool> {
    let mut len_buf = [0u8; 4];
    match reader.read_exact(&mut len_buf) {
        Ok(()) => {}
        Err(e)
            if e.kind() == std::io::ErrorKind::WouldBlock
                || e.kind() == std::io::ErrorKind::TimedOut =>
        {
            return Ok(false);
        }
        Err(e) => return Err(Error::Io(e)),
    }

    let len = u32::from_be_bytes(len_buf) as usize;
    if len > MAX_FRAME_BYTES {
        return Err(Error::Serialization(format!(
            "Frame too large: {} bytes",
            len
        )));
    }

    buf.clear();
    buf.resize(len, 0);
    reader.read_exact(buf)?;
    Ok(true)
}

/// Decode a frame payload
pub fn decode<T: DeserializeOwned>(payload: &[u8]) -> Result<T> {
    serde_json::from_slice(payload).map_err(|e| Error::Serialization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::streaming::messages::{InboundMessage, LocomotionCommand, MoveCommand};
    use std::io::Cursor;

    #[test]
    fn test_frame_round_trip() {
        let msg = InboundMessage::Locomotion(LocomotionCommand::Move(MoveCommand::Speed {
            angle: 90.0,
            speed: Some(30.0),
        }));

        let mut wire = Vec::new();
        write_frame(&mut wire, &msg).unwrap();

        // Prefix carries the payload length
        let len = u32::from_be_bytes(wire[..4].try_into().unwrap()) as usize;
        assert_eq!(len, wire.len() - 4);

        let mut cursor = Cursor::new(wire);
        let mut buf = Vec::new();
        assert!(read_frame(&mut cursor, &mut buf).unwrap());
        let decoded: InboundMessage = decode(&buf).unwrap();
        assert_eq!(decoded, msg);
    }

    #[test]
    fn test_multiple_frames_in_sequence() {
        let first = InboundMessage::Locomotion(LocomotionCommand::Stop);
        let second = InboundMessage::Locomotion(LocomotionCommand::EmergencyStop);

        let mut wire = Vec::new();
        write_frame(&mut wire, &first).unwrap();
        write_frame(&mut wire, &second).unwrap();

        let mut cursor = Cursor::new(wire);
        let mut buf = Vec::new();
        assert!(read_frame(&mut cursor, &mut buf).unwrap());
        assert_eq!(decode::<InboundMessage>(&buf).unwrap(), first);
        assert!(read_frame(&mut cursor, &mut buf).unwrap());
        assert_eq!(decode::<InboundMessage>(&buf).unwrap(), second);
    }

    #[test]
    fn test_oversized_frame_rejected() {
        let mut wire = Vec::new();
        wire.extend_from_slice(&((MAX_FRAME_BYTES as u32) + 1).to_be_bytes());

        let mut cursor = Cursor::new(wire);
        let mut buf = Vec::new();
        assert!(read_frame(&mut cursor, &mut buf).is_err());
    }

    #[test]
    fn test_truncated_payload_is_error() {
        let mut wire = Vec::new();
        wire.extend_from_slice(&100u32.to_be_bytes());
        wire.extend_from_slice(b"short");

        let mut cursor = Cursor::new(wire);
        let mut buf = Vec::new();
        assert!(read_frame(&mut cursor, &mut buf).is_err());
    }

    #[test]
    fn test_malformed_payload_fails_decode_only() {
        let mut wire = Vec::new();
        write_frame(&mut wire, &serde_json::json!({"topic": "unknown"})).unwrap();

        let mut cursor = Cursor::new(wire);
        let mut buf = Vec::new();
        assert!(read_frame(&mut cursor, &mut buf).unwrap());
        assert!(decode::<InboundMessage>(&buf).is_err());
    }
}

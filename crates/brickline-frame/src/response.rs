use bytes::Bytes;

use crate::opcode::{ReplyKind, SystemOpcode, SystemStatus};

/// Sequence id (2) + reply kind (1).
pub const REPLY_HEADER_SIZE: usize = 3;

/// System replies echo the opcode and add a status byte.
pub const SYSTEM_REPLY_HEADER_SIZE: usize = REPLY_HEADER_SIZE + 2;

/// A decoded reply from the brick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub sequence: u16,
    pub kind: ReplyKind,
    /// Echoed opcode, system replies only.
    pub system_opcode: Option<SystemOpcode>,
    /// Status byte, system replies only.
    pub status: Option<SystemStatus>,
    /// Global memory contents (direct) or trailing data (system).
    /// `None` when the reply kind is not recognized.
    pub payload: Option<Bytes>,
}

impl Response {
    /// True for a direct-ok reply, or a system-ok reply reporting success.
    pub fn is_success(&self) -> bool {
        match self.kind {
            ReplyKind::DirectOk => true,
            ReplyKind::SystemOk => self.status == Some(SystemStatus::Success),
            _ => false,
        }
    }

    /// Payload bytes, empty when absent.
    pub fn data(&self) -> &[u8] {
        self.payload.as_deref().unwrap_or_default()
    }
}

/// Decode one inbound frame (length prefix already stripped).
///
/// Returns `None` for frames too short to carry a header, and for sequence
/// id 0, which no command is ever sent with.
pub fn decode_response(frame: Bytes) -> Option<Response> {
    if frame.len() < REPLY_HEADER_SIZE {
        tracing::trace!(len = frame.len(), "discarding runt reply");
        return None;
    }
    let sequence = u16::from_le_bytes([frame[0], frame[1]]);
    if sequence == 0 {
        tracing::trace!("discarding reply with sequence 0");
        return None;
    }
    let kind = ReplyKind::from_code(frame[2]);

    let mut response = Response {
        sequence,
        kind,
        system_opcode: None,
        status: None,
        payload: None,
    };

    if kind.is_direct() {
        response.payload = Some(frame.slice(REPLY_HEADER_SIZE..));
    } else if kind.is_system() {
        response.system_opcode = frame.get(3).copied().and_then(SystemOpcode::from_code);
        response.status = frame.get(4).copied().and_then(SystemStatus::from_code);
        response.payload = Some(if frame.len() > SYSTEM_REPLY_HEADER_SIZE {
            frame.slice(SYSTEM_REPLY_HEADER_SIZE..)
        } else {
            Bytes::new()
        });
    }

    Some(response)
}

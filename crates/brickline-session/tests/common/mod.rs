//! Simulated brick shared by the session integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use brickline_session::POLL_REPLY_SIZE;
use brickline_transport::mock::{command_kind, command_sequence, MockTransport};
use bytes::Bytes;

const PORT_BLOCK: usize = 11;

#[derive(Debug)]
pub struct SimState {
    /// Global memory returned for poll rounds.
    pub poll_payload: Vec<u8>,
    /// Reply kind for poll rounds.
    pub poll_kind: u8,
    /// Swallow poll rounds without answering.
    pub mute_polls: bool,
    pub polls: usize,
    pub begin_status: u8,
    pub handle: u8,
    /// Status per continue-download chunk; Success once exhausted.
    pub chunk_statuses: VecDeque<u8>,
    /// Payload length of every continue-download received.
    pub chunks: Vec<usize>,
    /// Length announced by the last begin-download.
    pub announced: Option<u32>,
    /// Status for create-directory, delete-file and close-handle.
    pub op_status: u8,
}

impl Default for SimState {
    fn default() -> Self {
        let mut poll_payload = vec![0u8; POLL_REPLY_SIZE];
        for idx in 0..8 {
            // reads back as DeviceType::Unknown, matching a fresh session
            poll_payload[idx * PORT_BLOCK] = 0xFF;
        }
        Self {
            poll_payload,
            poll_kind: 0x02,
            mute_polls: false,
            polls: 0,
            begin_status: 0x00,
            handle: 3,
            chunk_statuses: VecDeque::new(),
            chunks: Vec::new(),
            announced: None,
            op_status: 0x00,
        }
    }
}

impl SimState {
    pub fn set_raw(&mut self, port_index: usize, value: i32) {
        let at = port_index * PORT_BLOCK + 6;
        self.poll_payload[at..at + 4].copy_from_slice(&value.to_le_bytes());
    }

    pub fn set_si(&mut self, port_index: usize, value: f32) {
        let at = port_index * PORT_BLOCK + 2;
        self.poll_payload[at..at + 4].copy_from_slice(&value.to_le_bytes());
    }
}

/// A brick that answers polls and file commands from [`SimState`].
#[derive(Clone, Default)]
pub struct SimBrick {
    state: Arc<Mutex<SimState>>,
}

impl SimBrick {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transport(&self) -> MockTransport {
        let state = Arc::clone(&self.state);
        MockTransport::with_responder(move |frame| {
            let mut state = state.lock().expect("sim state lock");
            respond(&mut state, frame)
        })
    }

    pub fn with<R>(&self, f: impl FnOnce(&mut SimState) -> R) -> R {
        f(&mut self.state.lock().expect("sim state lock"))
    }
}

fn respond(state: &mut SimState, frame: &[u8]) -> Vec<Bytes> {
    let Some(sequence) = command_sequence(frame) else {
        return Vec::new();
    };
    let [lo, hi] = sequence.to_le_bytes();

    match command_kind(frame) {
        Some(0x00) => {
            let global = frame[5] as usize | ((frame[6] as usize & 0x03) << 8);
            if global == POLL_REPLY_SIZE {
                state.polls += 1;
                if state.mute_polls {
                    return Vec::new();
                }
                let mut reply = vec![lo, hi, state.poll_kind];
                reply.extend_from_slice(&state.poll_payload);
                vec![Bytes::from(reply)]
            } else {
                let mut reply = vec![lo, hi, 0x02];
                reply.resize(3 + global, 0);
                vec![Bytes::from(reply)]
            }
        }
        Some(0x01) => {
            let opcode = frame[5];
            let reply = match opcode {
                0x92 => {
                    state.announced = Some(u32::from_le_bytes([
                        frame[6], frame[7], frame[8], frame[9],
                    ]));
                    vec![lo, hi, 0x03, opcode, state.begin_status, state.handle]
                }
                0x93 => {
                    state.chunks.push(frame.len() - 7);
                    let status = state.chunk_statuses.pop_front().unwrap_or(0x00);
                    let kind = if status == 0x00 || status == 0x08 { 0x03 } else { 0x05 };
                    vec![lo, hi, kind, opcode, status, state.handle]
                }
                _ => {
                    let kind = if state.op_status == 0x00 { 0x03 } else { 0x05 };
                    vec![lo, hi, kind, opcode, state.op_status]
                }
            };
            vec![Bytes::from(reply)]
        }
        _ => Vec::new(),
    }
}

/// Direct-ok reply carrying `payload` for `sequence`.
pub fn direct_reply(sequence: u16, payload: &[u8]) -> Bytes {
    let [lo, hi] = sequence.to_le_bytes();
    let mut reply = vec![lo, hi, 0x02];
    reply.extend_from_slice(payload);
    Bytes::from(reply)
}

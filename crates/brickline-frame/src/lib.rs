//! Command framing and reply decoding for the EV3 brick protocol.
//!
//! Commands are assembled with [`CommandBuilder`] into an immutable
//! [`Command`]; the sequence id is stamped in by [`Command::encode`] at send
//! time. Every outbound frame has the layout:
//! - A 2-byte little-endian length of everything that follows
//! - A 2-byte little-endian sequence id
//! - A 1-byte command kind
//! - For direct commands, 2 bytes packing the reply-buffer sizes
//!
//! Inbound replies are parsed by [`decode_response`].

pub mod command;
pub mod direct;
pub mod error;
pub mod opcode;
pub mod response;
pub mod sequence;
pub mod system;

pub use command::{Command, CommandBuilder, DIRECT_HEADER_SIZE, HEADER_SIZE};
pub use error::{FrameError, MemoryRegion, Result};
pub use opcode::{
    BrickButton, CommandKind, DeviceType, InputPort, LedPattern, Opcode, OutputPort, Polarity,
    ReplyKind, SystemOpcode, SystemStatus, LAYER, MAX_GLOBAL_SIZE, MAX_LOCAL_SIZE,
};
pub use response::{decode_response, Response};
pub use sequence::SequenceAllocator;

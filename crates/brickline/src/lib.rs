//! Host-side protocol engine for LEGO EV3 bricks.
//!
//! brickline frames direct and system commands, correlates replies by
//! sequence id over a streaming link, polls sensors and buttons for
//! changes, and uploads files to the brick's storage.
//!
//! # Crate Structure
//!
//! - [`transport`]: Duplex links to a brick (TCP, serial, scripted mock)
//! - [`frame`]: Command framing, reply decoding and the opcode registry
//! - [`session`]: Connected sessions with polling and file transfer (behind `session` feature)

/// Re-export transport types.
pub mod transport {
    pub use brickline_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use brickline_frame::*;
}

/// Re-export session types (requires `session` feature).
#[cfg(feature = "session")]
pub mod session {
    pub use brickline_session::*;
}

//! Session layer for one EV3 brick.
//!
//! A [`Brick`] owns a transport and, once connected, runs:
//! - A read loop that decodes inbound frames and hands each reply to the
//!   request waiting on its sequence id
//! - An optional poll task that queries every port and button on a fixed
//!   interval and publishes a [`ChangeSnapshot`] when something drifts
//!
//! Ad hoc commands, file uploads and polling share the link; outbound
//! writes are serialized and replies are matched by sequence id only.

pub mod config;
pub mod correlator;
pub mod error;
pub mod files;
mod link;
pub mod poller;
pub mod session;
pub mod state;

pub use config::{SessionConfig, DEFAULT_EVENT_BUFFER, DEFAULT_REQUEST_TIMEOUT};
pub use correlator::{PendingResponse, ResponseCorrelator};
pub use error::{Result, SessionError};
pub use files::CHUNK_SIZE;
pub use poller::{apply_poll_reply, poll_command, POLL_REPLY_SIZE, SI_TOLERANCE};
pub use session::{Brick, ChangeStream};
pub use state::{ButtonSet, ChangeSnapshot, DeviceState, Port};

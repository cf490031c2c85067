//! Duplex frame transports for talking to an EV3 brick.
//!
//! A transport opens a link and splits it into a [`FrameSource`] producing
//! one inbound protocol frame at a time and a [`FrameSink`] writing complete
//! command frames:
//! - TCP stream links ([`TcpTransport`])
//! - Serial links such as Bluetooth SPP ([`SerialTransport`], `serial` feature)
//! - An in-memory scripted brick ([`mock::MockTransport`], `mock` feature)
//!
//! This is the lowest layer of brickline. Everything else builds on the
//! [`Transport`] trait defined here.

pub mod codec;
pub mod error;
pub mod stream;
pub mod tcp;
pub mod traits;

#[cfg(feature = "serial")]
pub mod serial;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use codec::{decode_reply, BrickCodec, DEFAULT_MAX_FRAME, LENGTH_PREFIX_SIZE};
pub use error::{Result, TransportError};
pub use stream::{split_stream, StreamSink, StreamSource};
pub use tcp::{TcpTransport, DEFAULT_TCP_PORT};
pub use traits::{FrameSink, FrameSource, Transport};

#[cfg(feature = "serial")]
pub use serial::{SerialConfig, SerialSink, SerialSource, SerialTransport};

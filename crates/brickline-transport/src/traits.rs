use std::future::Future;

use bytes::Bytes;

use crate::error::Result;

/// Inbound half of an open link.
///
/// Each item is one logical protocol frame, starting at the sequence field.
/// Link-level length prefixes have already been stripped.
pub trait FrameSource: Send + 'static {
    /// Wait for the next inbound frame.
    ///
    /// Returns `Ok(None)` once the brick has closed the link.
    fn recv_frame(&mut self) -> impl Future<Output = Result<Option<Bytes>>> + Send;
}

/// Outbound half of an open link.
pub trait FrameSink: Send + 'static {
    /// Write one complete command frame and flush it.
    fn send_frame(&mut self, frame: &[u8]) -> impl Future<Output = Result<()>> + Send;
}

/// A duplex link to one brick.
///
/// `open` may be called again after both halves from a previous call have
/// been dropped, which is how a session reconnects.
pub trait Transport: Send + 'static {
    type Source: FrameSource;
    type Sink: FrameSink;

    /// Open the link and split it into independent read and write halves.
    fn open(&mut self) -> impl Future<Output = Result<(Self::Source, Self::Sink)>> + Send;

    /// Transport name for diagnostics.
    fn transport_name(&self) -> &'static str;
}

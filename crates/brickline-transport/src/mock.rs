//! In-memory scripted transport.
//!
//! A responder closure sees every outbound command frame and returns the
//! reply frames the simulated brick sends back. Tests can also push frames
//! or errors into the inbound stream at any time through a cloned handle.

use std::sync::{Arc, Mutex, MutexGuard};

use bytes::Bytes;
use tokio::sync::mpsc;
use tracing::trace;

use crate::error::{Result, TransportError};
use crate::traits::{FrameSink, FrameSource, Transport};

type Responder = Box<dyn FnMut(&[u8]) -> Vec<Bytes> + Send>;

/// Scripted transport. Clones share the same simulated brick.
#[derive(Clone, Default)]
pub struct MockTransport {
    shared: Arc<Mutex<MockState>>,
}

#[derive(Default)]
struct MockState {
    responder: Option<Responder>,
    inbound: Option<mpsc::UnboundedSender<Result<Bytes>>>,
    written: Vec<Bytes>,
    opens: usize,
    fail_writes: bool,
    missing: bool,
}

/// Read half of a mock link.
#[derive(Debug)]
pub struct MockSource {
    rx: mpsc::UnboundedReceiver<Result<Bytes>>,
}

/// Write half of a mock link.
pub struct MockSink {
    shared: Arc<Mutex<MockState>>,
}

impl MockTransport {
    /// A brick that never answers.
    pub fn new() -> Self {
        Self::default()
    }

    /// A brick that answers each command with whatever `responder` returns.
    ///
    /// The responder runs while the mock's state is locked and must not
    /// call back into the transport.
    pub fn with_responder<F>(responder: F) -> Self
    where
        F: FnMut(&[u8]) -> Vec<Bytes> + Send + 'static,
    {
        let transport = Self::new();
        transport.set_responder(responder);
        transport
    }

    /// Replace the responder.
    pub fn set_responder<F>(&self, responder: F)
    where
        F: FnMut(&[u8]) -> Vec<Bytes> + Send + 'static,
    {
        self.state().responder = Some(Box::new(responder));
    }

    /// Push a frame into the inbound stream. Returns false if no link is open.
    pub fn inject(&self, frame: impl Into<Bytes>) -> bool {
        self.push(Ok(frame.into()))
    }

    /// Push a read failure into the inbound stream.
    pub fn inject_error(&self, err: TransportError) -> bool {
        self.push(Err(err))
    }

    /// Simulate the brick closing the link.
    pub fn close(&self) {
        self.state().inbound = None;
    }

    /// Make subsequent writes fail with an I/O error.
    pub fn fail_writes(&self, fail: bool) {
        self.state().fail_writes = fail;
    }

    /// Make subsequent `open` calls fail with `DeviceNotFound`.
    pub fn set_missing(&self, missing: bool) {
        self.state().missing = missing;
    }

    /// Every command frame written so far, in order.
    pub fn written(&self) -> Vec<Bytes> {
        self.state().written.clone()
    }

    /// Number of successful `open` calls.
    pub fn open_count(&self) -> usize {
        self.state().opens
    }

    fn push(&self, item: Result<Bytes>) -> bool {
        match &self.state().inbound {
            Some(tx) => tx.send(item).is_ok(),
            None => false,
        }
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        lock(&self.shared)
    }
}

impl std::fmt::Debug for MockTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state();
        f.debug_struct("MockTransport")
            .field("opens", &state.opens)
            .field("written", &state.written.len())
            .finish()
    }
}

impl std::fmt::Debug for MockSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockSink").finish_non_exhaustive()
    }
}

impl Transport for MockTransport {
    type Source = MockSource;
    type Sink = MockSink;

    async fn open(&mut self) -> Result<(MockSource, MockSink)> {
        let mut state = self.state();
        if state.missing {
            return Err(TransportError::DeviceNotFound {
                endpoint: "mock".to_string(),
            });
        }
        let (tx, rx) = mpsc::unbounded_channel();
        state.inbound = Some(tx);
        state.opens += 1;
        drop(state);

        Ok((
            MockSource { rx },
            MockSink {
                shared: Arc::clone(&self.shared),
            },
        ))
    }

    fn transport_name(&self) -> &'static str {
        "mock"
    }
}

impl FrameSource for MockSource {
    async fn recv_frame(&mut self) -> Result<Option<Bytes>> {
        self.rx.recv().await.transpose()
    }
}

impl FrameSink for MockSink {
    async fn send_frame(&mut self, frame: &[u8]) -> Result<()> {
        let mut state = lock(&self.shared);
        if state.fail_writes {
            return Err(TransportError::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "mock write failure",
            )));
        }
        let Some(inbound) = state.inbound.clone() else {
            return Err(TransportError::NotOpen);
        };

        state.written.push(Bytes::copy_from_slice(frame));
        let replies = match state.responder.as_mut() {
            Some(responder) => responder(frame),
            None => Vec::new(),
        };
        drop(state);

        trace!(replies = replies.len(), "mock brick answered");
        for reply in replies {
            let _ = inbound.send(Ok(reply));
        }
        Ok(())
    }
}

fn lock(shared: &Mutex<MockState>) -> MutexGuard<'_, MockState> {
    shared.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Sequence id of an outbound command frame (bytes 2..4), if present.
pub fn command_sequence(frame: &[u8]) -> Option<u16> {
    frame.get(2..4).map(|b| u16::from_le_bytes([b[0], b[1]]))
}

/// Kind byte of an outbound command frame, if present.
pub fn command_kind(frame: &[u8]) -> Option<u8> {
    frame.get(4).copied()
}

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use brickline_frame::{decode_response, Command, Response, SequenceAllocator};
use brickline_transport::{FrameSink, FrameSource, TransportError};
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::correlator::ResponseCorrelator;
use crate::error::{Result, SessionError};
use crate::state::ChangeSnapshot;

pub(crate) type EventSender = mpsc::Sender<Result<ChangeSnapshot>>;

/// Per-connection state shared by the session, the read loop and the poller.
#[derive(Debug)]
pub(crate) struct Link<S> {
    sink: tokio::sync::Mutex<S>,
    sequence: Mutex<SequenceAllocator>,
    correlator: ResponseCorrelator,
    cancel: CancellationToken,
    failure: Mutex<Option<oneshot::Sender<SessionError>>>,
    request_timeout: Option<Duration>,
}

impl<S: FrameSink> Link<S> {
    /// `failure` carries the terminal transport error to the change stream.
    pub(crate) fn new(
        sink: S,
        request_timeout: Option<Duration>,
        failure: oneshot::Sender<SessionError>,
    ) -> Self {
        Self {
            sink: tokio::sync::Mutex::new(sink),
            sequence: Mutex::new(SequenceAllocator::new()),
            correlator: ResponseCorrelator::new(),
            cancel: CancellationToken::new(),
            failure: Mutex::new(Some(failure)),
            request_timeout,
        }
    }

    pub(crate) fn correlator(&self) -> &ResponseCorrelator {
        &self.correlator
    }

    pub(crate) fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Stop the background tasks and fail outstanding waiters.
    pub(crate) fn shutdown(&self) {
        self.cancel.cancel();
        self.correlator.close();
        // a clean shutdown ends the change stream without an error
        self.failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }

    /// Send one command; await its reply when the kind expects one.
    pub(crate) async fn send(&self, command: &Command) -> Result<Option<Response>> {
        if self.is_closed() {
            return Err(SessionError::Disconnected);
        }
        let sequence = self
            .sequence
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .next_id();
        let frame = command.encode(sequence)?;

        let pending = if command.kind().expects_reply() {
            Some(self.correlator.register(sequence)?)
        } else {
            None
        };

        {
            let mut sink = self.sink.lock().await;
            sink.send_frame(&frame).await?;
        }
        trace!(sequence, kind = ?command.kind(), len = frame.len(), "command sent");

        match pending {
            Some(pending) => pending.wait(self.request_timeout).await.map(Some),
            None => Ok(None),
        }
    }

    /// Report a terminal transport failure on the change stream, once.
    pub(crate) fn fail(&self, err: TransportError) {
        let failure = self
            .failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(failure) = failure {
            warn!(error = %err, "link failed");
            if failure.send(SessionError::Transport(err)).is_err() {
                debug!("change stream dropped; failure not delivered");
            }
        }
        self.shutdown();
    }
}

/// Feed inbound frames to the correlator until cancelled or the link drops.
pub(crate) async fn read_loop<R, S>(mut source: R, link: std::sync::Arc<Link<S>>)
where
    R: FrameSource,
    S: FrameSink,
{
    debug!("read loop started");
    loop {
        let frame = tokio::select! {
            _ = link.cancel_token().cancelled() => break,
            frame = source.recv_frame() => frame,
        };
        match frame {
            Ok(Some(frame)) => {
                if let Some(response) = decode_response(frame) {
                    link.correlator().dispatch(response);
                }
            }
            Ok(None) => {
                link.fail(TransportError::Closed);
                break;
            }
            Err(err) => {
                link.fail(err);
                break;
            }
        }
    }
    link.correlator().close();
    debug!("read loop stopped");
}

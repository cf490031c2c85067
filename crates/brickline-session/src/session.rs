use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll};
use std::time::Duration;

use brickline_frame::{direct, Command, InputPort, LedPattern, OutputPort, Response};
use brickline_transport::Transport;
use futures_core::Stream;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::SessionConfig;
use crate::error::{Result, SessionError};
use crate::link::{read_loop, Link};
use crate::poller::{poll_loop, safety_stop};
use crate::state::{ChangeSnapshot, DeviceState};

/// A session with one brick over transport `T`.
///
/// The session owns the transport and opens it on [`connect`](Self::connect).
/// While connected, a background read loop feeds replies to waiting
/// requests and, when polling is enabled, a poll task keeps the cached
/// [`DeviceState`] current and publishes [`ChangeSnapshot`]s.
pub struct Brick<T: Transport> {
    transport: T,
    config: SessionConfig,
    state: Arc<Mutex<DeviceState>>,
    link: Option<Arc<Link<T::Sink>>>,
    tasks: Vec<JoinHandle<()>>,
}

impl<T: Transport> Brick<T> {
    pub fn new(transport: T) -> Self {
        Self::with_config(transport, SessionConfig::default())
    }

    pub fn with_config(transport: T, config: SessionConfig) -> Self {
        Self {
            transport,
            config,
            state: Arc::new(Mutex::new(DeviceState::default())),
            link: None,
            tasks: Vec::new(),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// True while the link is open and has not failed.
    pub fn is_connected(&self) -> bool {
        self.link.as_ref().is_some_and(|link| !link.is_closed())
    }

    /// Last polled device state.
    pub fn state(&self) -> DeviceState {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Open the transport and start the background tasks.
    ///
    /// Polling runs every `interval`, first after one full interval; a zero
    /// interval disables it. The returned stream ends after
    /// [`disconnect`](Self::disconnect), or yields one transport error and
    /// then ends if the link fails.
    pub async fn connect(&mut self, interval: Duration) -> Result<ChangeStream> {
        if self.is_connected() {
            return Err(SessionError::AlreadyConnected);
        }
        if self.link.is_some() {
            // previous link failed; reap its tasks first
            self.disconnect().await?;
        }

        let name = self.transport.transport_name();
        let (source, sink) = self.transport.open().await?;
        info!(transport = name, ?interval, "connected to brick");

        let (failure_tx, failure_rx) = oneshot::channel();
        let link = Arc::new(Link::new(sink, self.config.request_timeout, failure_tx));
        let (events_tx, events_rx) = mpsc::channel(self.config.event_buffer.max(1));

        self.tasks
            .push(tokio::spawn(read_loop(source, Arc::clone(&link))));
        self.link = Some(Arc::clone(&link));

        if self.config.safety_stop {
            if let Err(err) = link.send(&safety_stop()?).await {
                self.disconnect().await?;
                return Err(err);
            }
        }

        if !interval.is_zero() {
            self.tasks.push(tokio::spawn(poll_loop(
                link,
                Arc::clone(&self.state),
                interval,
                self.config.clone(),
                events_tx,
            )));
        }

        Ok(ChangeStream {
            rx: events_rx,
            failure: Some(failure_rx),
        })
    }

    /// Stop polling and the read loop, then release the transport.
    ///
    /// Outstanding requests fail with `Disconnected`. Calling this on a
    /// session that is not connected is a no-op.
    pub async fn disconnect(&mut self) -> Result<()> {
        let Some(link) = self.link.take() else {
            return Ok(());
        };
        link.shutdown();
        for task in self.tasks.drain(..) {
            if let Err(err) = task.await {
                warn!(error = %err, "session task ended abnormally");
            }
        }
        debug!("disconnected from brick");
        Ok(())
    }

    /// Send a command. Reply kinds wait for and return the correlated
    /// response; no-reply kinds return `None` once written.
    pub async fn send(&self, command: &Command) -> Result<Option<Response>> {
        let link = self.link.as_ref().ok_or(SessionError::NotConnected)?;
        link.send(command).await
    }

    /// Send a command that must be answered, and require a success reply.
    pub async fn request(&self, command: &Command) -> Result<Response> {
        let response = self
            .send(command)
            .await?
            .ok_or(SessionError::MalformedReply("command kind expects no reply"))?;
        let kind = response.kind;
        if kind.is_error() || !(kind.is_direct() || kind.is_system()) {
            return Err(SessionError::UnexpectedReply(response.kind));
        }
        Ok(response)
    }

    pub async fn stop_motor(&self, ports: OutputPort, brake: bool) -> Result<()> {
        self.send(&direct::stop_motor(ports, brake)?).await.map(drop)
    }

    pub async fn turn_motor_at_power(&self, ports: OutputPort, power: i8) -> Result<()> {
        self.send(&direct::turn_motor_at_power(ports, power)?)
            .await
            .map(drop)
    }

    pub async fn turn_motor_at_speed(&self, ports: OutputPort, speed: i8) -> Result<()> {
        self.send(&direct::turn_motor_at_speed(ports, speed)?)
            .await
            .map(drop)
    }

    pub async fn play_tone(&self, volume: u8, frequency: u16, duration_ms: u16) -> Result<()> {
        self.send(&direct::play_tone(volume, frequency, duration_ms)?)
            .await
            .map(drop)
    }

    pub async fn set_led_pattern(&self, pattern: LedPattern) -> Result<()> {
        self.send(&direct::set_led_pattern(pattern)?).await.map(drop)
    }

    /// Read one SI value outside the poll cycle.
    pub async fn read_si(&self, port: InputPort, mode: u8) -> Result<f32> {
        let response = self.request(&direct::read_si(port, mode)?).await?;
        let bytes = response
            .data()
            .get(..4)
            .ok_or(SessionError::MalformedReply("SI reply shorter than 4 bytes"))?;
        Ok(f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }
}

impl<T: Transport> Drop for Brick<T> {
    fn drop(&mut self) {
        if let Some(link) = self.link.take() {
            link.shutdown();
        }
    }
}

impl<T: Transport + std::fmt::Debug> std::fmt::Debug for Brick<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Brick")
            .field("transport", &self.transport)
            .field("connected", &self.is_connected())
            .field("config", &self.config)
            .finish()
    }
}

/// Change snapshots published by the poller.
///
/// Usable directly through [`recv`](Self::recv) or as a [`Stream`]. A link
/// failure is yielded once, after any snapshots still buffered, and then
/// the stream ends.
#[derive(Debug)]
pub struct ChangeStream {
    rx: mpsc::Receiver<Result<ChangeSnapshot>>,
    failure: Option<oneshot::Receiver<SessionError>>,
}

impl ChangeStream {
    /// Next snapshot; `None` once the session has disconnected.
    pub async fn recv(&mut self) -> Option<Result<ChangeSnapshot>> {
        std::future::poll_fn(|cx| Pin::new(&mut *self).poll_next(cx)).await
    }
}

impl Stream for ChangeStream {
    type Item = Result<ChangeSnapshot>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = &mut *self;
        match this.rx.poll_recv(cx) {
            Poll::Ready(None) => {}
            ready_or_pending => return ready_or_pending,
        }
        // Snapshots drained; the failure slot resolves once the link fails or
        // shuts down.
        let Some(failure) = this.failure.as_mut() else {
            return Poll::Ready(None);
        };
        match Pin::new(failure).poll(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(result) => {
                this.failure = None;
                Poll::Ready(result.ok().map(Err))
            }
        }
    }
}

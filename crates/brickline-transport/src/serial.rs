use std::io::{ErrorKind, Read, Write};
use std::thread;
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use serialport::SerialPort;
use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

use crate::codec::{decode_reply, DEFAULT_MAX_FRAME};
use crate::error::{Result, TransportError};
use crate::traits::{FrameSink, FrameSource, Transport};

const READ_CHUNK_SIZE: usize = 1024;
const INBOUND_QUEUE_DEPTH: usize = 64;

/// Serial link settings.
#[derive(Debug, Clone)]
pub struct SerialConfig {
    /// Baud rate. Bluetooth SPP ignores it; USB CDC adapters may not.
    pub baud_rate: u32,
    /// Blocking read timeout; bounds how quickly the reader notices shutdown.
    pub read_timeout: Duration,
    /// Maximum inbound frame size.
    pub max_frame: usize,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            baud_rate: 115_200,
            read_timeout: Duration::from_millis(50),
            max_frame: DEFAULT_MAX_FRAME,
        }
    }
}

/// Serial transport (Bluetooth SPP such as `/dev/rfcomm0` or `COM4`).
///
/// The port is driven by blocking calls: a dedicated reader thread splits
/// inbound bytes into frames, and writes run on tokio's blocking pool.
#[derive(Debug, Clone)]
pub struct SerialTransport {
    path: String,
    config: SerialConfig,
}

impl SerialTransport {
    pub fn new(path: impl Into<String>) -> Self {
        Self::with_config(path, SerialConfig::default())
    }

    pub fn with_config(path: impl Into<String>, config: SerialConfig) -> Self {
        Self {
            path: path.into(),
            config,
        }
    }

    /// The serial device path.
    pub fn path(&self) -> &str {
        &self.path
    }
}

/// Read half of a serial link.
#[derive(Debug)]
pub struct SerialSource {
    rx: mpsc::Receiver<Result<Bytes>>,
}

/// Write half of a serial link.
pub struct SerialSink {
    port: Option<Box<dyn SerialPort>>,
}

impl std::fmt::Debug for SerialSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialSink")
            .field("open", &self.port.is_some())
            .finish()
    }
}

impl Transport for SerialTransport {
    type Source = SerialSource;
    type Sink = SerialSink;

    async fn open(&mut self) -> Result<(SerialSource, SerialSink)> {
        #[cfg(unix)]
        if !std::path::Path::new(&self.path).exists() {
            return Err(TransportError::DeviceNotFound {
                endpoint: self.path.clone(),
            });
        }

        let port = serialport::new(&self.path, self.config.baud_rate)
            .timeout(self.config.read_timeout)
            .open()
            .map_err(|err| map_open_error(&self.path, err))?;
        let reader = port.try_clone().map_err(std::io::Error::from)?;

        let (tx, rx) = mpsc::channel(INBOUND_QUEUE_DEPTH);
        let max_frame = self.config.max_frame;
        let path = self.path.clone();
        thread::Builder::new()
            .name("brickline-serial-rx".to_string())
            .spawn(move || read_loop(reader, tx, max_frame, &path))?;

        info!(path = %self.path, "opened serial link to brick");
        Ok((SerialSource { rx }, SerialSink { port: Some(port) }))
    }

    fn transport_name(&self) -> &'static str {
        "serial"
    }
}

impl FrameSource for SerialSource {
    async fn recv_frame(&mut self) -> Result<Option<Bytes>> {
        self.rx.recv().await.transpose()
    }
}

impl FrameSink for SerialSink {
    async fn send_frame(&mut self, frame: &[u8]) -> Result<()> {
        let mut port = self.port.take().ok_or(TransportError::NotOpen)?;
        let frame = frame.to_vec();
        let (port, result) = tokio::task::spawn_blocking(move || {
            let result = port.write_all(&frame).and_then(|()| port.flush());
            (port, result)
        })
        .await
        .map_err(|err| std::io::Error::other(err.to_string()))?;
        self.port = Some(port);
        result.map_err(TransportError::from)
    }
}

fn map_open_error(path: &str, err: serialport::Error) -> TransportError {
    match err.kind() {
        serialport::ErrorKind::NoDevice | serialport::ErrorKind::Io(ErrorKind::NotFound) => {
            TransportError::DeviceNotFound {
                endpoint: path.to_string(),
            }
        }
        _ => TransportError::Connect {
            endpoint: path.to_string(),
            source: err.into(),
        },
    }
}

fn read_loop(
    mut port: Box<dyn SerialPort>,
    tx: mpsc::Sender<Result<Bytes>>,
    max_frame: usize,
    path: &str,
) {
    let mut buf = BytesMut::with_capacity(READ_CHUNK_SIZE);
    let mut chunk = [0u8; READ_CHUNK_SIZE];

    while !tx.is_closed() {
        let read = match port.read(&mut chunk) {
            Ok(0) => {
                let _ = tx.blocking_send(Err(TransportError::Closed));
                break;
            }
            Ok(n) => n,
            Err(err) if err.kind() == ErrorKind::TimedOut => continue,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => {
                warn!(%path, %err, "serial read failed");
                let _ = tx.blocking_send(Err(TransportError::Io(err)));
                break;
            }
        };
        buf.extend_from_slice(&chunk[..read]);

        loop {
            match decode_reply(&mut buf, max_frame) {
                Ok(Some(frame)) => {
                    trace!(len = frame.len(), "serial frame received");
                    if tx.blocking_send(Ok(frame)).is_err() {
                        return;
                    }
                }
                Ok(None) => break,
                Err(err) => {
                    let _ = tx.blocking_send(Err(err));
                    return;
                }
            }
        }
    }

    debug!(%path, "serial reader stopped");
}

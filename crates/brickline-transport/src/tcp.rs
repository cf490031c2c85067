use tokio::net::TcpStream;
use tracing::{debug, info};

use crate::codec::BrickCodec;
use crate::error::{Result, TransportError};
use crate::stream::{split_stream, StreamSink, StreamSource};
use crate::traits::Transport;

/// Default TCP port the brick listens on once its WiFi link is unlocked.
pub const DEFAULT_TCP_PORT: u16 = 5555;

/// TCP stream transport.
///
/// Replies arrive length-prefixed, exactly as on the Bluetooth serial link.
/// Discovery and unlocking of the WiFi endpoint happen outside this type;
/// it only needs a reachable `host:port`.
#[derive(Debug, Clone)]
pub struct TcpTransport {
    endpoint: String,
    codec: BrickCodec,
}

impl TcpTransport {
    /// Create a transport for `endpoint` (`host:port`).
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self::with_codec(endpoint, BrickCodec::new())
    }

    /// Create a transport with explicit codec limits.
    pub fn with_codec(endpoint: impl Into<String>, codec: BrickCodec) -> Self {
        Self {
            endpoint: endpoint.into(),
            codec,
        }
    }

    /// The endpoint this transport connects to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Transport for TcpTransport {
    type Source = StreamSource<tokio::io::ReadHalf<TcpStream>>;
    type Sink = StreamSink<tokio::io::WriteHalf<TcpStream>>;

    async fn open(&mut self) -> Result<(Self::Source, Self::Sink)> {
        let addrs: Vec<_> = match tokio::net::lookup_host(self.endpoint.as_str()).await {
            Ok(addrs) => addrs.collect(),
            Err(err) => {
                debug!(endpoint = %self.endpoint, %err, "endpoint did not resolve");
                Vec::new()
            }
        };
        if addrs.is_empty() {
            return Err(TransportError::DeviceNotFound {
                endpoint: self.endpoint.clone(),
            });
        }

        let stream = TcpStream::connect(addrs.as_slice())
            .await
            .map_err(|source| TransportError::Connect {
                endpoint: self.endpoint.clone(),
                source,
            })?;
        stream.set_nodelay(true)?;

        info!(endpoint = %self.endpoint, "connected to brick over tcp");
        Ok(split_stream(stream, self.codec.clone()))
    }

    fn transport_name(&self) -> &'static str {
        "tcp"
    }
}

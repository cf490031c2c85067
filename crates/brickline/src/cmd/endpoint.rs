//! Transport selection from command-line flags.

use std::net::{IpAddr, SocketAddr};

use bytes::Bytes;
use brickline_session::{Brick, SessionConfig};
use brickline_transport::{
    FrameSink, FrameSource, Result, StreamSink, StreamSource, TcpTransport, Transport,
    DEFAULT_TCP_PORT,
};
#[cfg(feature = "serial")]
use brickline_transport::{SerialConfig, SerialSink, SerialSource, SerialTransport};
use tokio::io::{ReadHalf, WriteHalf};
use tokio::net::TcpStream;

use crate::cmd::{parse_duration, EndpointArgs};
use crate::exit::{CliError, CliResult, USAGE};

/// Whichever link the user asked for.
#[derive(Debug)]
pub enum EndpointTransport {
    Tcp(TcpTransport),
    #[cfg(feature = "serial")]
    Serial(SerialTransport),
}

pub enum EndpointSource {
    Tcp(StreamSource<ReadHalf<TcpStream>>),
    #[cfg(feature = "serial")]
    Serial(SerialSource),
}

pub enum EndpointSink {
    Tcp(StreamSink<WriteHalf<TcpStream>>),
    #[cfg(feature = "serial")]
    Serial(SerialSink),
}

impl Transport for EndpointTransport {
    type Source = EndpointSource;
    type Sink = EndpointSink;

    async fn open(&mut self) -> Result<(EndpointSource, EndpointSink)> {
        match self {
            EndpointTransport::Tcp(t) => {
                let (source, sink) = t.open().await?;
                Ok((EndpointSource::Tcp(source), EndpointSink::Tcp(sink)))
            }
            #[cfg(feature = "serial")]
            EndpointTransport::Serial(t) => {
                let (source, sink) = t.open().await?;
                Ok((EndpointSource::Serial(source), EndpointSink::Serial(sink)))
            }
        }
    }

    fn transport_name(&self) -> &'static str {
        match self {
            EndpointTransport::Tcp(t) => t.transport_name(),
            #[cfg(feature = "serial")]
            EndpointTransport::Serial(t) => t.transport_name(),
        }
    }
}

impl FrameSource for EndpointSource {
    async fn recv_frame(&mut self) -> Result<Option<Bytes>> {
        match self {
            EndpointSource::Tcp(s) => s.recv_frame().await,
            #[cfg(feature = "serial")]
            EndpointSource::Serial(s) => s.recv_frame().await,
        }
    }
}

impl FrameSink for EndpointSink {
    async fn send_frame(&mut self, frame: &[u8]) -> Result<()> {
        match self {
            EndpointSink::Tcp(s) => s.send_frame(frame).await,
            #[cfg(feature = "serial")]
            EndpointSink::Serial(s) => s.send_frame(frame).await,
        }
    }
}

impl EndpointArgs {
    /// Pick the transport named by `--tcp` or `--serial`.
    pub fn transport(&self) -> CliResult<EndpointTransport> {
        if let Some(addr) = &self.tcp {
            return Ok(EndpointTransport::Tcp(TcpTransport::new(
                with_default_port(addr),
            )));
        }
        if let Some(path) = &self.serial {
            return serial_transport(path, self.baud);
        }
        Err(CliError::new(
            USAGE,
            "no brick endpoint: pass --tcp ADDR or --serial PATH",
        ))
    }

    pub fn session_config(&self) -> CliResult<SessionConfig> {
        let timeout = parse_duration(&self.timeout)?;
        Ok(SessionConfig::default().with_request_timeout(Some(timeout)))
    }

    pub fn brick(&self) -> CliResult<Brick<EndpointTransport>> {
        Ok(Brick::with_config(self.transport()?, self.session_config()?))
    }
}

/// Append the brick's TCP port unless `addr` already names one.
fn with_default_port(addr: &str) -> String {
    if addr.parse::<SocketAddr>().is_ok() {
        return addr.to_string();
    }
    if let Ok(ip) = addr.trim_matches(&['[', ']'][..]).parse::<IpAddr>() {
        return SocketAddr::new(ip, DEFAULT_TCP_PORT).to_string();
    }
    let has_port = addr
        .rsplit_once(':')
        .is_some_and(|(host, port)| !host.is_empty() && port.parse::<u16>().is_ok());
    if has_port {
        addr.to_string()
    } else {
        format!("{addr}:{DEFAULT_TCP_PORT}")
    }
}

#[cfg(feature = "serial")]
fn serial_transport(path: &str, baud: u32) -> CliResult<EndpointTransport> {
    let config = SerialConfig {
        baud_rate: baud,
        ..SerialConfig::default()
    };
    Ok(EndpointTransport::Serial(SerialTransport::with_config(
        path, config,
    )))
}

#[cfg(not(feature = "serial"))]
fn serial_transport(_path: &str, _baud: u32) -> CliResult<EndpointTransport> {
    Err(CliError::new(
        USAGE,
        "serial support not compiled in (enable the `serial` feature)",
    ))
}

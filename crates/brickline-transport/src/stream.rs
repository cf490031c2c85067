use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite, ReadHalf, WriteHalf};
use tokio_util::codec::{FramedRead, FramedWrite};

use crate::codec::BrickCodec;
use crate::error::Result;
use crate::traits::{FrameSink, FrameSource};

/// Read half of a length-prefixed byte stream.
#[derive(Debug)]
pub struct StreamSource<R> {
    inner: FramedRead<R, BrickCodec>,
}

/// Write half of a length-prefixed byte stream.
#[derive(Debug)]
pub struct StreamSink<W> {
    inner: FramedWrite<W, BrickCodec>,
}

/// Split any async byte stream into frame halves.
pub fn split_stream<S>(
    stream: S,
    codec: BrickCodec,
) -> (StreamSource<ReadHalf<S>>, StreamSink<WriteHalf<S>>)
where
    S: AsyncRead + AsyncWrite,
{
    let (read, write) = tokio::io::split(stream);
    (
        StreamSource {
            inner: FramedRead::new(read, codec.clone()),
        },
        StreamSink {
            inner: FramedWrite::new(write, codec),
        },
    )
}

impl<R> FrameSource for StreamSource<R>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    async fn recv_frame(&mut self) -> Result<Option<Bytes>> {
        self.inner.next().await.transpose()
    }
}

impl<W> FrameSink for StreamSink<W>
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    async fn send_frame(&mut self, frame: &[u8]) -> Result<()> {
        self.inner.send(Bytes::copy_from_slice(frame)).await
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    use super::*;

    #[tokio::test]
    async fn frames_cross_a_duplex_pipe() {
        let (host, mut brick) = tokio::io::duplex(256);
        let (mut source, mut sink) = split_stream(host, BrickCodec::new());

        sink.send_frame(&[0x06, 0x00, 0x01, 0x00, 0x80, 0x00, 0x00])
            .await
            .unwrap();
        let mut written = [0u8; 7];
        brick.read_exact(&mut written).await.unwrap();
        assert_eq!(written, [0x06, 0x00, 0x01, 0x00, 0x80, 0x00, 0x00]);

        brick
            .write_all(&[0x04, 0x00, 0x01, 0x00, 0x02, 0x2A])
            .await
            .unwrap();
        let frame = source.recv_frame().await.unwrap().unwrap();
        assert_eq!(frame.as_ref(), &[0x01, 0x00, 0x02, 0x2A]);
    }

    #[tokio::test]
    async fn closed_stream_yields_none() {
        let (host, brick) = tokio::io::duplex(64);
        let (mut source, _sink) = split_stream(host, BrickCodec::new());
        drop(brick);
        assert!(source.recv_frame().await.unwrap().is_none());
    }
}

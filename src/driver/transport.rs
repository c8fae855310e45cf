//! TCP transport with per-read timeouts.
//!
//! Only transport reads and writes may block. Reads are gated by the
//! configured timeout; a timed-out read is fatal for the connection because
//! partial message state cannot be recovered.

use std::time::Duration;

use bytes::BytesMut;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::bolt::{BoltError, BoltResult};

pub(crate) struct Transport {
    stream: TcpStream,
    read_timeout: Duration,
}

impl Transport {
    /// Open a TCP connection. Nagle is disabled; Bolt frames are small and
    /// latency-sensitive.
    pub(crate) async fn connect(
        address: &str,
        connect_timeout: Duration,
        read_timeout: Duration,
    ) -> BoltResult<Self> {
        let stream = tokio::time::timeout(connect_timeout, TcpStream::connect(address))
            .await
            .map_err(|_| BoltError::Timeout)??;

        stream.set_nodelay(true)?;

        Ok(Self {
            stream,
            read_timeout,
        })
    }

    pub(crate) fn set_read_timeout(&mut self, timeout: Duration) {
        self.read_timeout = timeout;
    }

    pub(crate) fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    pub(crate) async fn write_all(&mut self, data: &[u8]) -> BoltResult<()> {
        self.stream.write_all(data).await?;
        self.stream.flush().await?;
        Ok(())
    }

    /// Read whatever is available into `buf`. Returns the number of bytes
    /// read; zero means the peer closed the connection.
    pub(crate) async fn read_buf(&mut self, buf: &mut BytesMut) -> BoltResult<usize> {
        let n = tokio::time::timeout(self.read_timeout, self.stream.read_buf(buf))
            .await
            .map_err(|_| BoltError::Timeout)??;
        Ok(n)
    }

    /// Read exactly `buf.len()` bytes (handshake reply).
    pub(crate) async fn read_exact(&mut self, buf: &mut [u8]) -> BoltResult<()> {
        tokio::time::timeout(self.read_timeout, self.stream.read_exact(buf))
            .await
            .map_err(|_| BoltError::Timeout)??;
        Ok(())
    }

    pub(crate) async fn shutdown(&mut self) -> BoltResult<()> {
        self.stream.shutdown().await?;
        Ok(())
    }
}

impl std::fmt::Debug for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transport")
            .field("peer", &self.stream.peer_addr().ok())
            .field("read_timeout", &self.read_timeout)
            .finish()
    }
}

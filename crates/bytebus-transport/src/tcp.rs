//! TCP stream transport.

use std::io::{ErrorKind, Read, Write};
use std::net::{TcpListener, TcpStream, ToSocketAddrs};

use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::traits::Transport;

/// A connected TCP stream serving the byte-at-a-time transport contract.
///
/// The stream runs in non-blocking mode; reads are buffered in chunks so the
/// node's poll loop doesn't pay one syscall per byte.
pub struct TcpTransport {
    stream: TcpStream,
    rx_buf: [u8; Self::READ_CHUNK],
    rx_len: usize,
    rx_pos: usize,
}

impl TcpTransport {
    const READ_CHUNK: usize = 4096;

    /// Connect to a remote endpoint.
    pub fn connect(addr: impl ToSocketAddrs + std::fmt::Debug) -> Result<Self> {
        let stream = TcpStream::connect(&addr).map_err(|source| TransportError::Connect {
            addr: format!("{addr:?}"),
            source,
        })?;
        debug!(addr = ?addr, "connected");
        Self::from_stream(stream)
    }

    /// Bind, accept a single connection, and wrap it.
    ///
    /// Blocks until a peer connects; the resulting transport is
    /// non-blocking.
    pub fn accept_one(addr: impl ToSocketAddrs + std::fmt::Debug) -> Result<Self> {
        let listener = TcpListener::bind(&addr).map_err(|source| TransportError::Bind {
            addr: format!("{addr:?}"),
            source,
        })?;
        info!(addr = ?addr, "listening");
        let (stream, peer) = listener.accept().map_err(TransportError::Accept)?;
        debug!(%peer, "accepted connection");
        Self::from_stream(stream)
    }

    /// Wrap an already-connected stream, switching it to non-blocking mode.
    pub fn from_stream(stream: TcpStream) -> Result<Self> {
        stream.set_nonblocking(true)?;
        stream.set_nodelay(true)?;
        Ok(Self {
            stream,
            rx_buf: [0; Self::READ_CHUNK],
            rx_len: 0,
            rx_pos: 0,
        })
    }

    /// Local address of the underlying stream.
    pub fn local_addr(&self) -> Result<std::net::SocketAddr> {
        Ok(self.stream.local_addr()?)
    }

    fn refill(&mut self) -> bool {
        loop {
            match self.stream.read(&mut self.rx_buf) {
                Ok(0) => return false, // peer closed
                Ok(n) => {
                    self.rx_len = n;
                    self.rx_pos = 0;
                    return true;
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => return false,
                Err(_) => return false,
            }
        }
    }
}

impl Transport for TcpTransport {
    fn read_byte(&mut self) -> Option<u8> {
        if self.rx_pos == self.rx_len && !self.refill() {
            return None;
        }
        let byte = self.rx_buf[self.rx_pos];
        self.rx_pos += 1;
        Some(byte)
    }

    fn write(&mut self, data: &[u8]) -> bool {
        let mut offset = 0;
        while offset < data.len() {
            match self.stream.write(&data[offset..]) {
                Ok(0) => return false,
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(_) => return false,
            }
        }
        true
    }
}

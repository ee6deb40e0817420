//! Lifecycle-owning TCP channel.

use std::io::{self, ErrorKind};
use std::net::TcpStream;

use crate::io::Timeout;
use crate::net::Endpoint;
use crate::trace::{debug, trace};
use crate::wire::{self, Payload, RecvError};

/// A client channel owning at most one TCP connection.
///
/// Constructed closed; [`connect`](Self::connect) opens it and records the
/// peer, [`close`](Self::close) releases it. All operations block the
/// calling thread. The channel assumes one logical owner: concurrent calls
/// on a single instance require external synchronization.
///
/// After a failed [`send`](Self::send), or a [`recv`](Self::recv) failure
/// other than [`RecvError::TimedOut`], the connection is unusable and must
/// be closed and re-established by the caller; there is no internal retry.
#[derive(Debug, Default)]
pub struct Channel {
    stream: Option<TcpStream>,
    peer: Option<Endpoint>,
    timed_out: bool,
    last_len: usize,
}

impl Channel {
    /// Creates a closed channel.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Connects to `host` (dotted-decimal or hostname) on `port`.
    ///
    /// An already-open channel is closed first, so repeated calls never leak
    /// a connection. Each resolved address is tried in order until one
    /// handshake succeeds. On failure the channel remains closed; any socket
    /// opened during the failed attempt is released before returning.
    ///
    /// # Errors
    ///
    /// Returns the resolution error, or the last handshake error when no
    /// candidate address accepts the connection.
    pub fn connect(&mut self, host: &str, port: u16) -> io::Result<()> {
        self.close();

        let mut last_err = None;
        for ep in Endpoint::resolve(host, port)? {
            match TcpStream::connect(ep.as_socket_addr()) {
                Ok(stream) => {
                    debug!(peer = %ep, "connected");
                    self.stream = Some(stream);
                    self.peer = Some(ep);
                    return Ok(());
                }
                Err(e) => last_err = Some(e),
            }
        }

        Err(last_err.unwrap_or_else(|| {
            io::Error::new(ErrorKind::AddrNotAvailable, "host resolved to no addresses")
        }))
    }

    /// Sends one framed payload.
    ///
    /// Blocks until the frame is fully handed to the OS or the connection
    /// fails; there is no timeout on the send path. Does not touch the
    /// timeout flag.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::NotConnected`] on a closed channel; any other
    /// error means the connection is unusable.
    pub fn send(&mut self, payload: Payload<'_>) -> io::Result<()> {
        let stream = self.stream.as_mut().ok_or_else(not_connected)?;
        wire::send_frame(stream, payload)
    }

    /// Receives one framed payload, bounded by `timeout`.
    ///
    /// With [`Timeout::Infinite`] the call waits as long as it takes for a
    /// frame or a connection failure. With a bounded timeout, readiness is
    /// polled first; expiry reports [`RecvError::TimedOut`] and leaves the
    /// connection open for a later attempt.
    ///
    /// Every call overwrites the [`timed_out`](Self::timed_out) flag; a
    /// successful call records the payload length in
    /// [`last_len`](Self::last_len).
    ///
    /// # Errors
    ///
    /// See [`RecvError`]; everything except `TimedOut` means the caller must
    /// close the channel.
    pub fn recv(&mut self, timeout: Timeout) -> Result<Vec<u8>, RecvError> {
        self.timed_out = false;
        let Some(stream) = self.stream.as_mut() else {
            return Err(RecvError::Io(not_connected()));
        };

        match wire::recv_frame(stream, timeout) {
            Ok(body) => {
                self.last_len = body.len();
                Ok(body)
            }
            Err(RecvError::TimedOut) => {
                trace!("receive window expired");
                self.timed_out = true;
                Err(RecvError::TimedOut)
            }
            Err(e) => Err(e),
        }
    }

    /// Closes the connection if open. Safe to call repeatedly.
    pub fn close(&mut self) {
        if let Some(stream) = self.stream.take() {
            debug!(peer = ?self.peer, "closing connection");
            drop(stream);
        }
        self.peer = None;
    }

    /// Whether the channel currently owns a connection.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    /// The peer recorded at connect time, while the channel is open.
    #[must_use]
    pub fn peer(&self) -> Option<Endpoint> {
        self.peer
    }

    /// Whether the most recent receive attempt expired its timeout window.
    ///
    /// Overwritten by every receive attempt; never changed by a send.
    #[must_use]
    pub fn timed_out(&self) -> bool {
        self.timed_out
    }

    /// Payload length of the most recently completed receive.
    #[must_use]
    pub fn last_len(&self) -> usize {
        self.last_len
    }

    /// Disables or enables Nagle's algorithm on the open connection.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::NotConnected`] on a closed channel, or the
    /// socket error.
    pub fn set_nodelay(&self, on: bool) -> io::Result<()> {
        self.stream.as_ref().ok_or_else(not_connected)?.set_nodelay(on)
    }

    /// Sets the socket's send buffer size.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::NotConnected`] on a closed channel, or the
    /// socket error.
    pub fn set_send_buffer_size(&self, size: usize) -> io::Result<()> {
        let stream = self.stream.as_ref().ok_or_else(not_connected)?;
        rustix::net::sockopt::set_socket_send_buffer_size(stream, size)?;
        Ok(())
    }

    /// Sets the socket's receive buffer size.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::NotConnected`] on a closed channel, or the
    /// socket error.
    pub fn set_recv_buffer_size(&self, size: usize) -> io::Result<()> {
        let stream = self.stream.as_ref().ok_or_else(not_connected)?;
        rustix::net::sockopt::set_socket_recv_buffer_size(stream, size)?;
        Ok(())
    }

    /// Gets the socket's send buffer size.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::NotConnected`] on a closed channel, or the
    /// socket error.
    pub fn send_buffer_size(&self) -> io::Result<usize> {
        let stream = self.stream.as_ref().ok_or_else(not_connected)?;
        Ok(rustix::net::sockopt::get_socket_send_buffer_size(stream)?)
    }

    /// Gets the socket's receive buffer size.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::NotConnected`] on a closed channel, or the
    /// socket error.
    pub fn recv_buffer_size(&self) -> io::Result<usize> {
        let stream = self.stream.as_ref().ok_or_else(not_connected)?;
        Ok(rustix::net::sockopt::get_socket_recv_buffer_size(stream)?)
    }
}

impl Drop for Channel {
    fn drop(&mut self) {
        self.close();
    }
}

fn not_connected() -> io::Error {
    io::Error::from(ErrorKind::NotConnected)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_channel_is_closed() {
        let channel = Channel::new();
        assert!(!channel.is_connected());
        assert_eq!(channel.peer(), None);
        assert!(!channel.timed_out());
        assert_eq!(channel.last_len(), 0);
    }

    #[test]
    fn close_is_idempotent_when_never_connected() {
        let mut channel = Channel::new();
        channel.close();
        channel.close();
        assert!(!channel.is_connected());
    }

    #[test]
    fn send_on_closed_channel() {
        let mut channel = Channel::new();
        let err = channel.send(Payload::Text("nope")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotConnected);
    }

    #[test]
    fn recv_on_closed_channel() {
        let mut channel = Channel::new();
        let err = channel.recv(Timeout::Infinite).unwrap_err();
        assert!(err.is_fatal());
        match err {
            RecvError::Io(e) => assert_eq!(e.kind(), ErrorKind::NotConnected),
            other => panic!("expected Io error, got {other:?}"),
        }
        assert!(!channel.timed_out());
    }

    #[test]
    fn sockopts_require_a_connection() {
        let channel = Channel::new();
        assert_eq!(
            channel.send_buffer_size().unwrap_err().kind(),
            ErrorKind::NotConnected
        );
        assert_eq!(
            channel.set_nodelay(true).unwrap_err().kind(),
            ErrorKind::NotConnected
        );
    }
}

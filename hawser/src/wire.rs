//! Frame convention for the byte stream.
//!
//! ## Wire format
//!
//! Every frame is a 4-byte big-endian length header followed by exactly that
//! many payload bytes:
//!
//! | Payload | Layout |
//! |---------|------------------------------|
//! | Text    | `[len:4][UTF-8 bytes:len]`   |
//! | Block   | `[len:4][raw bytes:len]`     |
//!
//! Text and block frames share one shape on the wire; the distinction is the
//! sender's API contract (length derived from the string vs. an explicit
//! byte count), and the receiver interprets the payload per its out-of-band
//! agreement with the sender. A zero-length block is a legal empty frame.
//!
//! [`send_frame`] and [`recv_frame`] operate on streams supplied by the
//! caller and never own them.

use std::io::{self, ErrorKind, Read, Write};
use std::os::fd::AsFd;

use thiserror::Error;

use crate::io::{Timeout, read_fully, wait_readable, write_fully};
use crate::trace::{trace, warn};

/// Length of the frame header in bytes.
pub const HEADER_LEN: usize = 4;

/// Largest payload either direction will carry.
///
/// A declared length above this is rejected before any allocation.
pub const MAX_FRAME_LEN: usize = 16 * 1024 * 1024;

/// One outbound message, tagged with its length convention.
#[derive(Debug, Clone, Copy)]
pub enum Payload<'a> {
    /// Length derived from the string itself; the bytes travel without a
    /// terminator.
    Text(&'a str),
    /// Explicit binary block of exactly these bytes.
    Block(&'a [u8]),
}

impl<'a> Payload<'a> {
    /// The bytes that will travel after the length header.
    #[must_use]
    pub fn as_bytes(&self) -> &'a [u8] {
        match self {
            Self::Text(s) => s.as_bytes(),
            Self::Block(b) => b,
        }
    }

    /// Payload length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    /// Whether the payload carries no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.as_bytes().is_empty()
    }
}

impl<'a> From<&'a str> for Payload<'a> {
    fn from(s: &'a str) -> Self {
        Self::Text(s)
    }
}

impl<'a> From<&'a [u8]> for Payload<'a> {
    fn from(b: &'a [u8]) -> Self {
        Self::Block(b)
    }
}

/// Errors from the receive path.
#[derive(Debug, Error)]
pub enum RecvError {
    /// No data became ready within the timeout window. The connection is
    /// untouched; a later receive may still succeed.
    #[error("timed out waiting for a frame")]
    TimedOut,
    /// The declared payload length exceeds [`MAX_FRAME_LEN`].
    #[error("declared frame length {len} exceeds the {max} byte limit")]
    TooLarge { len: usize, max: usize },
    /// The connection is unusable: peer closed, reset, or I/O failure. A
    /// peer that closes mid-frame surfaces here as [`ErrorKind::UnexpectedEof`];
    /// the partial payload is never delivered.
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl RecvError {
    /// Whether the connection must be considered unusable.
    ///
    /// Only expiry of the timeout window leaves the connection alive;
    /// everything else requires the caller to close and reconnect.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::TimedOut)
    }
}

/// Sends one frame: length header plus payload, written exactly.
///
/// Header and payload are assembled into a single buffer so the sink sees
/// one contiguous write sequence. Blocks until fully handed to the OS or
/// the sink fails; there is no timeout on the send path.
///
/// # Errors
///
/// Returns [`ErrorKind::InvalidInput`] if the payload exceeds
/// [`MAX_FRAME_LEN`], otherwise any error from the underlying writes, all of
/// which mean the connection is unusable.
pub fn send_frame<W: Write + ?Sized>(w: &mut W, payload: Payload<'_>) -> io::Result<()> {
    let body = payload.as_bytes();
    if body.len() > MAX_FRAME_LEN {
        return Err(io::Error::new(
            ErrorKind::InvalidInput,
            "payload exceeds the frame length limit",
        ));
    }

    let mut frame = Vec::with_capacity(HEADER_LEN + body.len());
    frame.extend_from_slice(&(body.len() as u32).to_be_bytes());
    frame.extend_from_slice(body);
    write_fully(w, &frame)?;
    trace!(len = body.len(), "frame sent");
    Ok(())
}

/// Receives one frame, optionally bounded by a readiness timeout.
///
/// With [`Timeout::Infinite`] the call blocks in the read until a frame
/// arrives or the connection fails. With a bounded timeout, descriptor
/// readiness is polled first; only once data is confirmed ready is the
/// frame drained (header, then exactly the declared payload) via the
/// unbounded exact-read loop.
///
/// # Errors
///
/// - [`RecvError::TimedOut`] - the window expired with no data; recoverable.
/// - [`RecvError::TooLarge`] - the declared length is over the limit. Fatal:
///   the header has already been consumed.
/// - [`RecvError::Io`] - readiness poll failure, read failure, or the peer
///   closing mid-frame. Fatal.
pub fn recv_frame<S>(stream: &mut S, timeout: Timeout) -> Result<Vec<u8>, RecvError>
where
    S: Read + AsFd,
{
    if let Timeout::Duration(_) = timeout {
        if !wait_readable(&*stream, timeout)? {
            return Err(RecvError::TimedOut);
        }
    }

    let mut header = [0u8; HEADER_LEN];
    read_fully(stream, &mut header)?;
    let len = u32::from_be_bytes(header) as usize;
    if len > MAX_FRAME_LEN {
        warn!(len, max = MAX_FRAME_LEN, "oversized frame rejected");
        return Err(RecvError::TooLarge {
            len,
            max: MAX_FRAME_LEN,
        });
    }

    let mut body = vec![0u8; len];
    read_fully(stream, &mut body)?;
    trace!(len, "frame received");
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;
    use std::os::unix::net::UnixStream;
    use std::time::Duration;

    #[test]
    fn header_layout() {
        let mut out = Vec::new();
        send_frame(&mut out, Payload::Text("ping")).unwrap();
        assert_eq!(out, [0, 0, 0, 4, b'p', b'i', b'n', b'g']);
    }

    #[test]
    fn block_frame_roundtrip() {
        let (mut a, mut b) = UnixStream::pair().unwrap();
        send_frame(&mut a, Payload::Block(b"hello")).unwrap();
        let body = recv_frame(&mut b, Timeout::Infinite).unwrap();
        assert_eq!(body, b"hello");
    }

    #[test]
    fn text_frame_roundtrip() {
        let (mut a, mut b) = UnixStream::pair().unwrap();
        send_frame(&mut a, Payload::from("no terminator travels")).unwrap();
        let body = recv_frame(&mut b, Timeout::from(Duration::from_secs(5))).unwrap();
        assert_eq!(body, b"no terminator travels");
    }

    #[test]
    fn empty_block_frame() {
        let (mut a, mut b) = UnixStream::pair().unwrap();
        send_frame(&mut a, Payload::Block(b"")).unwrap();
        let body = recv_frame(&mut b, Timeout::Infinite).unwrap();
        assert!(body.is_empty());
    }

    #[test]
    fn recv_times_out_on_silence() {
        let (_a, mut b) = UnixStream::pair().unwrap();
        let err = recv_frame(&mut b, Timeout::from(Duration::from_millis(50))).unwrap_err();
        assert!(matches!(err, RecvError::TimedOut));
        assert!(!err.is_fatal());
    }

    #[test]
    fn oversized_declared_length_rejected() {
        let (mut a, mut b) = UnixStream::pair().unwrap();
        let declared = (MAX_FRAME_LEN as u32 + 1).to_be_bytes();
        a.write_all(&declared).unwrap();
        let err = recv_frame(&mut b, Timeout::Infinite).unwrap_err();
        assert!(matches!(err, RecvError::TooLarge { .. }));
        assert!(err.is_fatal());
    }

    #[test]
    fn oversized_payload_not_sent() {
        let body = vec![0u8; MAX_FRAME_LEN + 1];
        let mut out = Vec::new();
        let err = send_frame(&mut out, Payload::Block(&body)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert!(out.is_empty());
    }

    #[test]
    fn partial_frame_is_fatal() {
        let (mut a, mut b) = UnixStream::pair().unwrap();
        // Declare ten bytes, deliver four, then close.
        a.write_all(&10u32.to_be_bytes()).unwrap();
        a.write_all(b"four").unwrap();
        drop(a);
        let err = recv_frame(&mut b, Timeout::Infinite).unwrap_err();
        match &err {
            RecvError::Io(e) => assert_eq!(e.kind(), ErrorKind::UnexpectedEof),
            other => panic!("expected Io error, got {other:?}"),
        }
        assert!(err.is_fatal());
    }
}

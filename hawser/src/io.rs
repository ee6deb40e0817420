//! Exact-transfer loops and bounded readiness waits.
//!
//! A single socket send or receive may move fewer bytes than requested.
//! [`write_fully`] and [`read_fully`] absorb those partial transfers: they
//! either move exactly the requested byte count or fail, never in between.
//! [`wait_readable`] bounds how long a caller waits for data without
//! consuming any, so a receive can time out while leaving the descriptor
//! usable.
//!
//! None of these own the stream or descriptor they operate on.

use std::io::{self, ErrorKind, Read, Write};
use std::os::fd::AsFd;
use std::time::Duration;

use minstant::Instant;
use rustix::event::{PollFd, PollFlags, poll};
use rustix::io::Errno;

/// Timeout specification for blocking operations.
#[derive(Debug, Clone, Copy)]
pub enum Timeout {
    /// Wait indefinitely.
    Infinite,
    /// Wait for at most the specified duration.
    Duration(Duration),
}

impl From<Duration> for Timeout {
    fn from(d: Duration) -> Self {
        Self::Duration(d)
    }
}

/// Writes all of `buf` into `w`, looping over partial transfers.
///
/// On success, exactly `buf.len()` bytes have been handed to the sink (for a
/// socket: transferred to the OS send buffer, not necessarily received by
/// the peer). Interrupted writes are retried transparently. There is no
/// timeout; the call blocks until fully written or the sink fails.
///
/// # Errors
///
/// Returns the sink's error if it reports the connection unusable, or
/// [`ErrorKind::WriteZero`] if it stops accepting bytes without an error.
pub fn write_fully<W: Write + ?Sized>(w: &mut W, buf: &[u8]) -> io::Result<()> {
    let mut sent = 0;
    while sent < buf.len() {
        match w.write(&buf[sent..]) {
            Ok(0) => {
                return Err(io::Error::new(
                    ErrorKind::WriteZero,
                    "sink accepted no bytes",
                ));
            }
            Ok(n) => sent += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

/// Fills all of `buf` from `r`, looping over partial transfers.
///
/// On success, exactly `buf.len()` bytes have been read. Interrupted reads
/// are retried transparently. There is no timeout at this level; pair with
/// [`wait_readable`] when the wait must be bounded.
///
/// # Errors
///
/// Returns the source's error if it reports the connection unusable, or
/// [`ErrorKind::UnexpectedEof`] if the peer closes before `buf` is full.
pub fn read_fully<R: Read + ?Sized>(r: &mut R, buf: &mut [u8]) -> io::Result<()> {
    let mut filled = 0;
    while filled < buf.len() {
        match r.read(&mut buf[filled..]) {
            Ok(0) => {
                return Err(io::Error::new(
                    ErrorKind::UnexpectedEof,
                    "peer closed before the requested bytes arrived",
                ));
            }
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

/// Waits until `fd` has data available to read, without consuming it.
///
/// Returns `Ok(true)` once a read would not block (data available, or the
/// peer has closed, so a subsequent read observes the EOF), `Ok(false)` if the
/// timeout expires first. Expiry does not disturb the descriptor; it remains
/// usable for a later attempt.
///
/// A signal-interrupted poll is retried against the remaining deadline
/// budget rather than reported as a failure.
///
/// # Errors
///
/// Returns an error if the poll itself fails or the descriptor is not an
/// open socket, in which case the connection must be considered unusable.
pub fn wait_readable<Fd: AsFd>(fd: Fd, timeout: Timeout) -> io::Result<bool> {
    let deadline = match timeout {
        Timeout::Infinite => None,
        Timeout::Duration(d) => Some(Instant::now() + d),
    };

    loop {
        let wait_ms = match deadline {
            None => -1,
            Some(dl) => match dl.checked_duration_since(Instant::now()) {
                Some(remaining) => poll_millis(remaining),
                None => return Ok(false),
            },
        };

        let mut fds = [PollFd::new(&fd, PollFlags::IN)];
        match poll(&mut fds, wait_ms) {
            // poll(2) may wake slightly early; the deadline check above
            // decides when the budget is actually spent.
            Ok(0) => {}
            Ok(_) => {
                if fds[0].revents().contains(PollFlags::NVAL) {
                    return Err(io::Error::new(
                        ErrorKind::InvalidInput,
                        "polled descriptor is not an open socket",
                    ));
                }
                return Ok(true);
            }
            Err(e) if e == Errno::INTR => {}
            Err(e) => return Err(e.into()),
        }
    }
}

/// Remaining budget as a `poll(2)` millisecond argument, rounded up so a
/// sub-millisecond remainder doesn't spin.
fn poll_millis(remaining: Duration) -> i32 {
    i32::try_from(remaining.as_nanos().div_ceil(1_000_000)).unwrap_or(i32::MAX)
}

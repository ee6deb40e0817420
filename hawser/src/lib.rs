//! Blocking framed TCP client channel.
//!
//! `hawser` wraps a single TCP connection behind a small synchronous API:
//! connect, send one length-prefixed frame, receive one frame with an
//! optional timeout bound, close. The delicate part is partial-I/O
//! resilience: "write N bytes" and "read N bytes" always complete fully or
//! fail, and a bounded receive that expires leaves the connection intact for
//! the next attempt.
//!
//! The building blocks are exposed on their own for use with externally
//! supplied sockets:
//!
//! - [`io::write_fully`] / [`io::read_fully`] - exact-transfer loops over
//!   any `Write`/`Read`.
//! - [`io::wait_readable`] - readiness poll bounded by a [`Timeout`],
//!   without consuming data.
//! - [`wire::send_frame`] / [`wire::recv_frame`] - one framed message in
//!   either direction on a stream the caller owns.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use hawser::{Channel, Payload, Timeout};
//!
//! let mut channel = Channel::new();
//! channel.connect("127.0.0.1", 9000)?;
//! channel.send(Payload::Text("ping"))?;
//! let reply = channel.recv(Timeout::from(Duration::from_secs(5)))?;
//! assert_eq!(channel.last_len(), reply.len());
//! channel.close();
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! One thread owns one [`Channel`]; all calls block until completion,
//! failure, or (for bounded receives) timeout expiry. Concurrent use of a
//! single channel requires external synchronization.

pub mod channel;
pub mod io;
pub mod net;
pub mod wire;

mod trace;

pub use channel::Channel;
pub use io::Timeout;
pub use net::Endpoint;
pub use trace::init_tracing;
pub use wire::{MAX_FRAME_LEN, Payload, RecvError};

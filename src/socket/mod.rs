//! Socket abstraction layer for TTL-limited probing
//!
//! A [`ProbeTransport`] owns the OS sockets used by one trace session. Raw
//! ICMP sockets deliver the full IPv4 datagram (header included), so every
//! [`Datagram`] handed upward still carries its IP header.

use std::io;
use std::net::{Ipv4Addr, SocketAddrV4};
use std::time::Instant;
use thiserror::Error;

pub mod factory;
pub mod icmp_v4;
pub mod udp;
pub mod utils;

/// Receive buffer size used for one read
pub const RECV_BUFFER_SIZE: usize = 1500;

/// One datagram read from the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Datagram {
    /// Raw bytes, starting with the IPv4 header
    pub bytes: Vec<u8>,
    /// Address of the sender
    pub from: Ipv4Addr,
    /// When the read completed
    pub received_at: Instant,
}

/// Errors surfaced by a transport
///
/// `Timeout`, `HostUnreachable` and `ConnectionRefused` are expected network
/// conditions; the probe dispatcher turns them into data. Everything else is
/// carried in `Io` and aborts the trace.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The deadline passed before the operation completed
    #[error("operation timed out")]
    Timeout,

    /// The OS reported EHOSTUNREACH
    #[error("destination host unreachable")]
    HostUnreachable,

    /// The OS reported ECONNREFUSED (ICMP port unreachable on a connected socket)
    #[error("connection refused")]
    ConnectionRefused,

    /// The transport was already closed
    #[error("transport is closed")]
    Closed,

    /// Any other OS error
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl TransportError {
    /// Classify an OS error into the transport taxonomy
    pub fn from_io(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => return TransportError::Timeout,
            io::ErrorKind::ConnectionRefused => return TransportError::ConnectionRefused,
            _ => {}
        }

        #[cfg(unix)]
        if err.raw_os_error() == Some(libc::EHOSTUNREACH) {
            return TransportError::HostUnreachable;
        }

        TransportError::Io(err)
    }

    /// True for the "destination answered with unreachable" conditions
    pub fn is_unreachable(&self) -> bool {
        matches!(
            self,
            TransportError::HostUnreachable | TransportError::ConnectionRefused
        )
    }
}

/// Transport used by the probe dispatcher
///
/// Implementations are exclusively owned by one trace session and are not
/// shared between threads. TTL and deadline are per-call state: callers set
/// both before every send.
pub trait ProbeTransport {
    /// Set the outbound IP TTL for subsequent sends
    fn set_ttl(&mut self, ttl: u8) -> Result<(), TransportError>;

    /// Set an absolute deadline for all following sends and receives
    fn set_deadline(&mut self, deadline: Instant) -> Result<(), TransportError>;

    /// Send one probe payload
    fn send_to(&mut self, payload: &[u8], target: SocketAddrV4) -> Result<(), TransportError>;

    /// Block until a datagram arrives or the deadline passes
    fn receive(&mut self, buffer_size: usize) -> Result<Datagram, TransportError>;

    /// Local port of the sending socket, when the transport has one
    fn local_port(&self) -> Option<u16> {
        None
    }

    /// Release the OS resources; calling it again is a no-op
    fn close(&mut self);
}

impl<T: ProbeTransport + ?Sized> ProbeTransport for Box<T> {
    fn set_ttl(&mut self, ttl: u8) -> Result<(), TransportError> {
        (**self).set_ttl(ttl)
    }

    fn set_deadline(&mut self, deadline: Instant) -> Result<(), TransportError> {
        (**self).set_deadline(deadline)
    }

    fn send_to(&mut self, payload: &[u8], target: SocketAddrV4) -> Result<(), TransportError> {
        (**self).send_to(payload, target)
    }

    fn receive(&mut self, buffer_size: usize) -> Result<Datagram, TransportError> {
        (**self).receive(buffer_size)
    }

    fn local_port(&self) -> Option<u16> {
        (**self).local_port()
    }

    fn close(&mut self) {
        (**self).close();
    }
}

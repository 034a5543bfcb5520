//! Raw IPv4 ICMP transport

use super::{Datagram, ProbeTransport, TransportError};
use socket2::Socket as Socket2;
use std::mem::MaybeUninit;
use std::net::SocketAddrV4;
use std::time::{Duration, Instant};
use tracing::trace;

/// Raw ICMP socket for IPv4
///
/// Reads return the full IP datagram. The socket is bound to all local
/// interfaces by the factory before it is wrapped.
pub struct RawIcmpV4Transport {
    socket: Option<Socket2>,
    deadline: Option<Instant>,
}

impl RawIcmpV4Transport {
    /// Wrap an already-bound raw ICMP socket
    pub fn new(socket: Socket2) -> Self {
        Self {
            socket: Some(socket),
            deadline: None,
        }
    }

    fn socket(&self) -> Result<&Socket2, TransportError> {
        self.socket.as_ref().ok_or(TransportError::Closed)
    }
}

impl ProbeTransport for RawIcmpV4Transport {
    fn set_ttl(&mut self, ttl: u8) -> Result<(), TransportError> {
        self.socket()?
            .set_ttl_v4(u32::from(ttl))
            .map_err(TransportError::Io)
    }

    fn set_deadline(&mut self, deadline: Instant) -> Result<(), TransportError> {
        self.socket()?;
        self.deadline = Some(deadline);
        Ok(())
    }

    fn send_to(&mut self, payload: &[u8], target: SocketAddrV4) -> Result<(), TransportError> {
        let socket = self.socket()?;
        apply_write_deadline(socket, self.deadline)?;
        socket
            .send_to(payload, &target.into())
            .map_err(TransportError::from_io)?;
        trace!(%target, len = payload.len(), "raw ICMP probe sent");
        Ok(())
    }

    fn receive(&mut self, buffer_size: usize) -> Result<Datagram, TransportError> {
        recv_until(self.socket()?, self.deadline, buffer_size)
    }

    fn close(&mut self) {
        if self.socket.take().is_some() {
            trace!("raw ICMP socket closed");
        }
    }
}

impl Drop for RawIcmpV4Transport {
    fn drop(&mut self) {
        self.close();
    }
}

/// Time left before `deadline`, or `Timeout` when it has passed
pub(crate) fn remaining(deadline: Option<Instant>) -> Result<Option<Duration>, TransportError> {
    match deadline {
        None => Ok(None),
        Some(deadline) => {
            let left = deadline.saturating_duration_since(Instant::now());
            if left.is_zero() {
                Err(TransportError::Timeout)
            } else {
                Ok(Some(left))
            }
        }
    }
}

pub(crate) fn apply_write_deadline(
    socket: &Socket2,
    deadline: Option<Instant>,
) -> Result<(), TransportError> {
    let left = remaining(deadline)?;
    socket.set_write_timeout(left).map_err(TransportError::Io)
}

/// Read one IPv4 datagram from `socket`, honouring the absolute deadline
pub(crate) fn recv_until(
    socket: &Socket2,
    deadline: Option<Instant>,
    buffer_size: usize,
) -> Result<Datagram, TransportError> {
    let mut recv_buf = vec![MaybeUninit::<u8>::uninit(); buffer_size];

    loop {
        let left = remaining(deadline)?;
        socket.set_read_timeout(left).map_err(TransportError::Io)?;

        let (size, sock_addr) = match socket.recv_from(&mut recv_buf) {
            Ok(read) => read,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(TransportError::from_io(e)),
        };
        let received_at = Instant::now();

        // Non-IPv4 senders cannot answer an IPv4 probe
        let Some(from) = sock_addr.as_socket_ipv4() else {
            continue;
        };

        // SAFETY: recv_from initialised the first `size` bytes
        let bytes = recv_buf[..size]
            .iter()
            .map(|b| unsafe { b.assume_init() })
            .collect();

        return Ok(Datagram {
            bytes,
            from: *from.ip(),
            received_at,
        });
    }
}

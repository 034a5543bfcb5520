//! UDP probing transport with a companion raw ICMP receiver

use super::icmp_v4::{apply_write_deadline, recv_until};
use super::{Datagram, ProbeTransport, TransportError};
use socket2::Socket as Socket2;
use std::net::SocketAddrV4;
use std::time::Instant;
use tracing::trace;

/// Traditional traceroute destination port
pub const UDP_BASE_PORT: u16 = 33434;

/// UDP sender paired with a raw ICMP socket
///
/// Probes leave through the UDP socket; Time Exceeded and Destination
/// Unreachable replies are read from the raw ICMP socket.
pub struct UdpWithIcmpTransport {
    udp_socket: Option<Socket2>,
    icmp_socket: Option<Socket2>,
    local_port: Option<u16>,
    deadline: Option<Instant>,
}

impl UdpWithIcmpTransport {
    /// Wrap a bound UDP socket and a bound raw ICMP socket
    pub fn new(udp_socket: Socket2, icmp_socket: Socket2) -> Self {
        let local_port = udp_socket
            .local_addr()
            .ok()
            .and_then(|addr| addr.as_socket_ipv4())
            .map(|addr| addr.port())
            .filter(|port| *port != 0);

        Self {
            udp_socket: Some(udp_socket),
            icmp_socket: Some(icmp_socket),
            local_port,
            deadline: None,
        }
    }

    fn udp(&self) -> Result<&Socket2, TransportError> {
        self.udp_socket.as_ref().ok_or(TransportError::Closed)
    }

    fn icmp(&self) -> Result<&Socket2, TransportError> {
        self.icmp_socket.as_ref().ok_or(TransportError::Closed)
    }
}

impl ProbeTransport for UdpWithIcmpTransport {
    fn set_ttl(&mut self, ttl: u8) -> Result<(), TransportError> {
        self.udp()?
            .set_ttl_v4(u32::from(ttl))
            .map_err(TransportError::Io)
    }

    fn set_deadline(&mut self, deadline: Instant) -> Result<(), TransportError> {
        self.udp()?;
        self.icmp()?;
        self.deadline = Some(deadline);
        Ok(())
    }

    fn send_to(&mut self, payload: &[u8], target: SocketAddrV4) -> Result<(), TransportError> {
        let udp = self.udp()?;
        apply_write_deadline(udp, self.deadline)?;
        udp.send_to(payload, &target.into())
            .map_err(TransportError::from_io)?;
        trace!(%target, len = payload.len(), "UDP probe sent");
        Ok(())
    }

    fn receive(&mut self, buffer_size: usize) -> Result<Datagram, TransportError> {
        recv_until(self.icmp()?, self.deadline, buffer_size)
    }

    fn local_port(&self) -> Option<u16> {
        self.local_port
    }

    fn close(&mut self) {
        let udp = self.udp_socket.take();
        let icmp = self.icmp_socket.take();
        if udp.is_some() || icmp.is_some() {
            trace!("UDP and ICMP sockets closed");
        }
    }
}

impl Drop for UdpWithIcmpTransport {
    fn drop(&mut self) {
        self.close();
    }
}

//! Factory for opening probe transports

use super::icmp_v4::RawIcmpV4Transport;
use super::udp::UdpWithIcmpTransport;
use super::utils::is_permission_error;
use crate::traceroute::TracerouteError;
use socket2::{Domain, Protocol, Socket, Type};
use std::net::{Ipv4Addr, SocketAddrV4};
use tracing::debug;

/// Socket flavours the transports are built from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SocketKind {
    RawIcmp,
    Udp,
}

impl SocketKind {
    fn description(self) -> &'static str {
        match self {
            SocketKind::RawIcmp => "raw ICMP",
            SocketKind::Udp => "UDP",
        }
    }
}

/// Create a socket of `kind` bound to all local interfaces
fn try_create_socket(kind: SocketKind) -> Result<Socket, std::io::Error> {
    let socket = match kind {
        SocketKind::RawIcmp => Socket::new(Domain::IPV4, Type::RAW, Some(Protocol::ICMPV4))?,
        SocketKind::Udp => Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?,
    };

    let bind_addr = SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 0);
    socket.bind(&bind_addr.into())?;
    Ok(socket)
}

fn open_error(kind: SocketKind, err: std::io::Error) -> TracerouteError {
    if is_permission_error(&err) {
        TracerouteError::InsufficientPermissions {
            required: "root or CAP_NET_RAW".to_string(),
            suggestion: "Run with sudo or grant the binary CAP_NET_RAW".to_string(),
        }
    } else {
        TracerouteError::SocketError(format!(
            "could not open {} socket: {}",
            kind.description(),
            err
        ))
    }
}

fn open(kind: SocketKind) -> Result<Socket, TracerouteError> {
    let socket = try_create_socket(kind).map_err(|e| open_error(kind, e))?;
    debug!(kind = kind.description(), "socket opened");
    Ok(socket)
}

/// Open the raw ICMP transport used by echo probing
pub fn open_icmp_transport() -> Result<RawIcmpV4Transport, TracerouteError> {
    Ok(RawIcmpV4Transport::new(open(SocketKind::RawIcmp)?))
}

/// Open the UDP sender and its raw ICMP receiver used by reachability probing
///
/// If the second socket fails, the first is dropped (and closed) before the
/// error is returned.
pub fn open_udp_transport() -> Result<UdpWithIcmpTransport, TracerouteError> {
    let udp_socket = open(SocketKind::Udp)?;
    let icmp_socket = open(SocketKind::RawIcmp)?;
    Ok(UdpWithIcmpTransport::new(udp_socket, icmp_socket))
}

//! Probing strategies
//!
//! A strategy knows how to encode a probe for one TTL and how to classify
//! what the raw ICMP socket reads back. The hop loop and the dispatcher are
//! shared; only these two decisions differ between echo and reachability
//! probing.

use crate::socket::{ProbeTransport, TransportError};
use crate::traceroute::codec::{self, CodecError, IcmpMessage};
use crate::traceroute::types::{ProbeKind, ProbeRequest};
use pnet::packet::icmp::IcmpTypes;
use std::net::{Ipv4Addr, SocketAddrV4};
use std::sync::atomic::{AtomicU16, Ordering};

/// Destination Unreachable code sent by a host with no listener on the port
const PORT_UNREACHABLE: u8 = 3;

static SESSION_COUNTER: AtomicU16 = AtomicU16::new(0);

/// Identifier for a new echo session
///
/// The first session in a process uses the process id masked to 16 bits;
/// every later session gets a different value.
pub fn next_session_identifier() -> u16 {
    let offset = SESSION_COUNTER.fetch_add(1, Ordering::Relaxed);
    (std::process::id() as u16).wrapping_add(offset)
}

/// Bytes to send and where to send them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundProbe {
    /// Wire payload
    pub payload: Vec<u8>,
    /// Destination address and port (port 0 for ICMP)
    pub target: SocketAddrV4,
}

/// What a received ICMP message means for the outstanding probe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Not a response to this probe; keep waiting
    Foreign,
    /// An intermediate router reported TTL expiry
    Hop,
    /// The destination answered the probe directly
    Arrived,
    /// The probe was answered with Destination Unreachable
    Unreachable,
    /// A response to this probe of an unexpected type
    Unexpected,
}

/// How a transport failure affects the outstanding probe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Record an empty slot and move on
    Timeout,
    /// Destination confirmed through the unreachable signal
    Unreachable,
    /// Abort the trace
    Fatal,
}

/// Strategy-specific half of the probe dispatcher
pub trait ProbeStrategy {
    /// Which strategy this is
    fn kind(&self) -> ProbeKind;

    /// Identifier used by every probe of a session on `transport`
    fn session_identifier<T: ProbeTransport + ?Sized>(&self, transport: &T) -> u16;

    /// Encode the probe for `request`
    fn encode_probe(
        &self,
        request: &ProbeRequest,
        destination: Ipv4Addr,
    ) -> Result<OutboundProbe, CodecError>;

    /// Classify a decoded message read while `request` was outstanding
    fn classify_response(
        &self,
        message: &IcmpMessage,
        request: &ProbeRequest,
        destination: Ipv4Addr,
    ) -> Classification;

    /// Classify a send or receive failure
    fn classify_failure(&self, err: &TransportError) -> FailureClass {
        match err {
            TransportError::Timeout => FailureClass::Timeout,
            e if e.is_unreachable() => FailureClass::Unreachable,
            _ => FailureClass::Fatal,
        }
    }
}

/// ICMP Echo Request probing
#[derive(Debug, Clone, Default)]
pub struct EchoStrategy {
    identifier: Option<u16>,
}

impl EchoStrategy {
    /// Echo probing with a per-session identifier
    pub fn new() -> Self {
        Self::default()
    }

    /// Echo probing with a pinned identifier
    pub fn with_identifier(identifier: u16) -> Self {
        Self {
            identifier: Some(identifier),
        }
    }

    /// Whether the quote inside an error message names this probe
    ///
    /// `None` when there is no parseable quote to check.
    fn quote_matches(
        message: &IcmpMessage,
        request: &ProbeRequest,
        destination: Ipv4Addr,
    ) -> Option<bool> {
        let quoted = message.quoted()?;
        Some(
            quoted.destination == destination
                && quoted.echo_request() == Some((request.identifier, request.sequence)),
        )
    }
}

impl ProbeStrategy for EchoStrategy {
    fn kind(&self) -> ProbeKind {
        ProbeKind::Echo
    }

    fn session_identifier<T: ProbeTransport + ?Sized>(&self, _transport: &T) -> u16 {
        self.identifier.unwrap_or_else(next_session_identifier)
    }

    fn encode_probe(
        &self,
        request: &ProbeRequest,
        destination: Ipv4Addr,
    ) -> Result<OutboundProbe, CodecError> {
        Ok(OutboundProbe {
            payload: codec::encode_echo_request(
                request.identifier,
                request.sequence,
                &request.payload,
            )?,
            target: SocketAddrV4::new(destination, 0),
        })
    }

    fn classify_response(
        &self,
        message: &IcmpMessage,
        request: &ProbeRequest,
        destination: Ipv4Addr,
    ) -> Classification {
        match message.icmp_type {
            IcmpTypes::EchoReply => {
                if message.echo_fields() == (request.identifier, request.sequence) {
                    Classification::Arrived
                } else {
                    Classification::Foreign
                }
            }
            IcmpTypes::EchoRequest => Classification::Foreign,
            IcmpTypes::TimeExceeded => match Self::quote_matches(message, request, destination) {
                Some(false) => Classification::Foreign,
                _ => Classification::Hop,
            },
            _ if message.is_error() => match Self::quote_matches(message, request, destination) {
                Some(false) => Classification::Foreign,
                _ => Classification::Unexpected,
            },
            _ => Classification::Unexpected,
        }
    }
}

/// UDP probing towards a closed port
#[derive(Debug, Clone)]
pub struct ReachabilityStrategy {
    port: u16,
}

impl ReachabilityStrategy {
    /// Reachability probing towards `port`
    pub fn new(port: u16) -> Self {
        Self { port }
    }

    /// Destination port of every probe
    pub fn port(&self) -> u16 {
        self.port
    }

    fn quote_matches(
        &self,
        message: &IcmpMessage,
        request: &ProbeRequest,
        destination: Ipv4Addr,
    ) -> Option<bool> {
        let quoted = message.quoted()?;
        let matches = match quoted.udp_ports() {
            Some((source_port, dest_port)) => {
                dest_port == self.port
                    && (request.identifier == 0 || source_port == request.identifier)
            }
            None => false,
        };
        Some(matches && quoted.destination == destination)
    }
}

impl Default for ReachabilityStrategy {
    fn default() -> Self {
        Self::new(crate::socket::udp::UDP_BASE_PORT)
    }
}

impl ProbeStrategy for ReachabilityStrategy {
    fn kind(&self) -> ProbeKind {
        ProbeKind::Reachability
    }

    /// The UDP source port; 0 disables source-port matching
    fn session_identifier<T: ProbeTransport + ?Sized>(&self, transport: &T) -> u16 {
        transport.local_port().unwrap_or(0)
    }

    fn encode_probe(
        &self,
        _request: &ProbeRequest,
        destination: Ipv4Addr,
    ) -> Result<OutboundProbe, CodecError> {
        Ok(OutboundProbe {
            payload: codec::encode_udp_probe(),
            target: SocketAddrV4::new(destination, self.port),
        })
    }

    fn classify_response(
        &self,
        message: &IcmpMessage,
        request: &ProbeRequest,
        destination: Ipv4Addr,
    ) -> Classification {
        let quote = self.quote_matches(message, request, destination);
        match message.icmp_type {
            IcmpTypes::TimeExceeded => match quote {
                Some(false) => Classification::Foreign,
                _ => Classification::Hop,
            },
            IcmpTypes::DestinationUnreachable => match quote {
                Some(false) => Classification::Foreign,
                // Port unreachable, or any code sent by the destination itself
                _ if message.code == PORT_UNREACHABLE || message.source == destination => {
                    Classification::Unreachable
                }
                _ => Classification::Unexpected,
            },
            _ if message.is_error() && quote != Some(false) => Classification::Unexpected,
            _ => Classification::Foreign,
        }
    }
}

//! Core types for traceroute operations

use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;
use std::time::Duration;

/// Default hop ceiling for echo probing
pub const ECHO_DEFAULT_MAX_HOPS: u8 = 30;
/// Default hop ceiling for reachability probing (the widest 8-bit TTL)
pub const REACHABILITY_DEFAULT_MAX_HOPS: u8 = u8::MAX;

/// Probing strategy
///
/// - **Echo**: ICMP Echo Request; the destination answers with Echo Reply
/// - **Reachability**: empty UDP datagram to a closed high port; the
///   destination answers with Port Unreachable
///
/// # Examples
///
/// ```
/// use hoptrace::ProbeKind;
///
/// assert_eq!(ProbeKind::Echo.default_max_hops(), 30);
/// assert_eq!(ProbeKind::Reachability.description(), "UDP");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ProbeKind {
    /// ICMP Echo Request probing
    #[default]
    Echo,
    /// UDP probing towards an unreachable port
    Reachability,
}

impl ProbeKind {
    /// Get a human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            ProbeKind::Echo => "ICMP",
            ProbeKind::Reachability => "UDP",
        }
    }

    /// Hop ceiling used when the configuration does not set one
    pub fn default_max_hops(&self) -> u8 {
        match self {
            ProbeKind::Echo => ECHO_DEFAULT_MAX_HOPS,
            ProbeKind::Reachability => REACHABILITY_DEFAULT_MAX_HOPS,
        }
    }
}

/// One probe, built fresh for each TTL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeRequest {
    /// Session identifier (ICMP identifier or UDP source port)
    pub identifier: u16,
    /// Sequence number, equal to the TTL
    pub sequence: u16,
    /// Time-to-live value
    pub ttl: u8,
    /// Probe payload
    pub payload: Vec<u8>,
}

impl ProbeRequest {
    /// Build the request for `ttl` with an empty payload
    pub fn new(identifier: u16, ttl: u8) -> Self {
        Self {
            identifier,
            sequence: u16::from(ttl),
            ttl,
            payload: Vec::new(),
        }
    }
}

/// A response read while a probe was outstanding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResponse {
    /// Address that sent the response
    pub from: Ipv4Addr,
    /// Raw ICMP type
    pub icmp_type: u8,
    /// Raw ICMP code
    pub code: u8,
    /// Round-trip time
    pub rtt: Duration,
    /// TTL of the probe that was outstanding
    pub ttl: u8,
}

/// Outcome for one TTL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HopResult {
    /// A hop (or the destination) answered
    Reached {
        /// Responding address
        addr: Ipv4Addr,
        /// Round-trip time
        rtt: Duration,
        /// Time-to-live value
        ttl: u8,
    },
    /// Nothing answered before the deadline
    Timeout {
        /// Time-to-live value
        ttl: u8,
    },
    /// Something answered with an unexpected message type
    Unclassified {
        /// Time-to-live value
        ttl: u8,
    },
}

impl HopResult {
    /// TTL this result belongs to
    pub fn ttl(&self) -> u8 {
        match self {
            HopResult::Reached { ttl, .. }
            | HopResult::Timeout { ttl }
            | HopResult::Unclassified { ttl } => *ttl,
        }
    }

    /// Responding address, if any
    pub fn addr(&self) -> Option<Ipv4Addr> {
        match self {
            HopResult::Reached { addr, .. } => Some(*addr),
            _ => None,
        }
    }

    /// Round-trip time, if any
    pub fn rtt(&self) -> Option<Duration> {
        match self {
            HopResult::Reached { rtt, .. } => Some(*rtt),
            _ => None,
        }
    }

    /// Get RTT in milliseconds
    pub fn rtt_ms(&self) -> Option<f64> {
        self.rtt().map(|d| d.as_secs_f64() * 1000.0)
    }

    /// Check if this hop is the destination
    pub fn is_destination(&self, destination: Ipv4Addr) -> bool {
        self.addr() == Some(destination)
    }
}

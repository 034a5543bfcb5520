//! Result types for traceroute operations

use crate::traceroute::error::TracerouteError;
use crate::traceroute::types::{HopResult, ProbeKind};
use std::net::Ipv4Addr;
use std::time::Duration;

/// How a trace ended
#[derive(Debug)]
pub enum TraceStatus {
    /// A hop at the destination address answered, or the destination
    /// signalled unreachable
    DestinationReached,
    /// Every TTL up to the ceiling was probed without reaching the destination
    HopsExhausted,
    /// The caller cancelled between TTLs
    Cancelled,
    /// A probe failed fatally; the hops before it are kept
    Failed(TracerouteError),
}

impl TraceStatus {
    /// Short lowercase label
    pub fn label(&self) -> &'static str {
        match self {
            TraceStatus::DestinationReached => "reached",
            TraceStatus::HopsExhausted => "exhausted",
            TraceStatus::Cancelled => "cancelled",
            TraceStatus::Failed(_) => "failed",
        }
    }
}

/// Result of a traceroute operation
///
/// Hops are in strictly increasing TTL order. A failed trace still carries
/// the hops collected before the failure.
///
/// # Examples
///
/// ```no_run
/// use hoptrace::{trace, TracerouteConfig};
/// use std::net::Ipv4Addr;
///
/// let result = trace(Ipv4Addr::new(8, 8, 8, 8), &TracerouteConfig::default())?;
///
/// println!("Reached destination: {}", result.destination_reached());
/// println!("Total hops: {}", result.hop_count());
///
/// for hop in &result.hops {
///     match hop.addr() {
///         Some(addr) => println!("Hop {}: {}", hop.ttl(), addr),
///         None => println!("Hop {}: *", hop.ttl()),
///     }
/// }
/// # Ok::<(), hoptrace::TracerouteError>(())
/// ```
#[derive(Debug)]
pub struct TracerouteResult {
    /// Destination that was traced
    pub destination: Ipv4Addr,
    /// Strategy used for probing
    pub strategy: ProbeKind,
    /// One entry per probed TTL
    pub hops: Vec<HopResult>,
    /// How the trace ended
    pub status: TraceStatus,
    /// Wall-clock duration of the hop loop
    pub total_duration: Duration,
}

impl TracerouteResult {
    /// Get the number of hops recorded
    pub fn hop_count(&self) -> usize {
        self.hops.len()
    }

    /// Whether the trace ended at the destination
    pub fn destination_reached(&self) -> bool {
        matches!(self.status, TraceStatus::DestinationReached)
    }

    /// The hop that answered from the destination address, if any
    pub fn destination_hop(&self) -> Option<&HopResult> {
        self.hops
            .iter()
            .find(|hop| hop.is_destination(self.destination))
    }

    /// Highest TTL recorded
    pub fn max_ttl(&self) -> Option<u8> {
        self.hops.iter().map(HopResult::ttl).max()
    }

    /// Check if a specific TTL had a response
    pub fn has_response_at_ttl(&self, ttl: u8) -> bool {
        self.hops
            .iter()
            .any(|h| h.ttl() == ttl && h.addr().is_some())
    }

    /// Calculate average RTT across all responding hops
    pub fn average_rtt_ms(&self) -> Option<f64> {
        let rtts: Vec<f64> = self.hops.iter().filter_map(HopResult::rtt_ms).collect();

        if rtts.is_empty() {
            None
        } else {
            Some(rtts.iter().sum::<f64>() / rtts.len() as f64)
        }
    }

    /// The fatal error, when the trace failed
    pub fn error(&self) -> Option<&TracerouteError> {
        match &self.status {
            TraceStatus::Failed(err) => Some(err),
            _ => None,
        }
    }

    /// Hops on success, the error on failure
    ///
    /// Cancelled and exhausted traces count as success.
    pub fn into_result(self) -> Result<Vec<HopResult>, TracerouteError> {
        match self.status {
            TraceStatus::Failed(err) => Err(err),
            _ => Ok(self.hops),
        }
    }
}

//! hoptrace - a sequential IPv4 traceroute
//!
//! Probes are sent one TTL at a time, either as ICMP Echo Requests or as
//! empty UDP datagrams towards a closed high port, and each hop's answer is
//! read from a raw ICMP socket. Both strategies share one hop loop.
//!
//! # Examples
//!
//! ```no_run
//! use hoptrace::{trace, TracerouteConfig};
//! use std::net::Ipv4Addr;
//!
//! let result = trace(Ipv4Addr::new(1, 1, 1, 1), &TracerouteConfig::default())?;
//! for hop in &result.hops {
//!     println!("{:?}", hop);
//! }
//! # Ok::<(), hoptrace::TracerouteError>(())
//! ```

pub mod dns;
pub mod socket;
pub mod traceroute;

// Re-export core types for library users
pub use dns::{create_default_resolver, resolve_ipv4, reverse_dns_lookup, ReverseDnsError};
pub use socket::{Datagram, ProbeTransport, TransportError};
pub use tokio_util::sync::CancellationToken;
pub use traceroute::{
    run_with_transport, trace, trace_with_sink, EchoStrategy, HopResult, HopSink, ProbeKind,
    ProbeStrategy, ReachabilityStrategy, TraceSession, TraceStatus, TracerouteConfig,
    TracerouteConfigBuilder, TracerouteEngine, TracerouteError, TracerouteResult,
};

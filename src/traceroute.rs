//! Core traceroute functionality

pub mod api;
pub mod codec;
pub mod config;
pub mod dispatcher;
pub mod engine;
pub mod error;
pub mod result;
pub mod session;
pub mod strategy;
pub mod types;

#[cfg(test)]
pub(crate) mod test_packets;

// Re-export commonly used types
pub use api::{run_with_transport, trace, trace_with_sink};
pub use codec::{CodecError, IcmpMessage, QuotedDatagram};
pub use config::{TracerouteConfig, TracerouteConfigBuilder};
pub use dispatcher::{dispatch, Dispatch};
pub use engine::{HopSink, TracerouteEngine};
pub use error::TracerouteError;
pub use result::{TraceStatus, TracerouteResult};
pub use session::TraceSession;
pub use strategy::{
    Classification, EchoStrategy, FailureClass, OutboundProbe, ProbeStrategy,
    ReachabilityStrategy,
};
pub use types::{HopResult, ProbeKind, ProbeRequest, ProbeResponse};

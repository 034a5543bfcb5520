//! Per-trace state: destination, limits, identifier and the owned transport

use crate::socket::ProbeTransport;
use crate::traceroute::config::TracerouteConfig;
use crate::traceroute::error::TracerouteError;
use crate::traceroute::strategy::ProbeStrategy;
use std::net::Ipv4Addr;
use std::time::Duration;
use tracing::debug;

/// One trace in progress
///
/// The session exclusively owns its transport and closes it when dropped,
/// whichever way the trace ends.
pub struct TraceSession<T: ProbeTransport> {
    destination: Ipv4Addr,
    probe_timeout: Duration,
    start_ttl: u8,
    max_hops: u8,
    identifier: u16,
    transport: T,
}

impl<T: ProbeTransport> TraceSession<T> {
    /// Create a session for `destination`, taking ownership of `transport`
    ///
    /// The transport is closed even when the configuration is rejected.
    pub fn new<S: ProbeStrategy>(
        destination: Ipv4Addr,
        config: &TracerouteConfig,
        strategy: &S,
        mut transport: T,
    ) -> Result<Self, TracerouteError> {
        if let Err(msg) = config.validate() {
            transport.close();
            return Err(TracerouteError::ConfigError(msg));
        }

        let identifier = strategy.session_identifier(&transport);
        debug!(
            %destination,
            strategy = strategy.kind().description(),
            identifier,
            "trace session opened"
        );

        Ok(Self {
            destination,
            probe_timeout: config.probe_timeout,
            start_ttl: config.start_ttl,
            max_hops: config.effective_max_hops(),
            identifier,
            transport,
        })
    }

    /// Destination being traced
    pub fn destination(&self) -> Ipv4Addr {
        self.destination
    }

    /// Per-probe timeout
    pub fn probe_timeout(&self) -> Duration {
        self.probe_timeout
    }

    /// First TTL probed
    pub fn start_ttl(&self) -> u8 {
        self.start_ttl
    }

    /// Last TTL probed
    pub fn max_hops(&self) -> u8 {
        self.max_hops
    }

    /// Identifier shared by every probe of this session
    pub fn identifier(&self) -> u16 {
        self.identifier
    }

    /// The owned transport
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Close the transport now instead of at drop
    pub fn close(&mut self) {
        self.transport.close();
    }
}

impl<T: ProbeTransport> Drop for TraceSession<T> {
    fn drop(&mut self) {
        self.transport.close();
    }
}

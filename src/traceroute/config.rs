//! Configuration types for traceroute operations

use crate::socket::udp::UDP_BASE_PORT;
use crate::traceroute::types::ProbeKind;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default per-probe timeout in milliseconds
pub const DEFAULT_PROBE_TIMEOUT_MS: u64 = 1000;

/// Configuration for a traceroute operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TracerouteConfig {
    /// Probing strategy (default: Echo)
    pub strategy: ProbeKind,
    /// Starting TTL value (default: 1)
    pub start_ttl: u8,
    /// Maximum number of hops; `None` uses the strategy's ceiling
    pub max_hops: Option<u8>,
    /// Timeout for individual probes (default: 1000ms)
    pub probe_timeout: Duration,
    /// Destination port for reachability probes (default: 33434)
    pub port: u16,
    /// Fixed echo identifier instead of a per-session one
    pub identifier: Option<u16>,
}

impl Default for TracerouteConfig {
    fn default() -> Self {
        Self {
            strategy: ProbeKind::Echo,
            start_ttl: 1,
            max_hops: None,
            probe_timeout: Duration::from_millis(DEFAULT_PROBE_TIMEOUT_MS),
            port: UDP_BASE_PORT,
            identifier: None,
        }
    }
}

impl TracerouteConfig {
    /// Create a new TracerouteConfig builder
    pub fn builder() -> TracerouteConfigBuilder {
        TracerouteConfigBuilder::new()
    }

    /// Hop ceiling in effect for this configuration
    pub fn effective_max_hops(&self) -> u8 {
        self.max_hops
            .unwrap_or_else(|| self.strategy.default_max_hops())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.start_ttl < 1 {
            return Err("start_ttl must be at least 1".to_string());
        }
        if self.effective_max_hops() < self.start_ttl {
            return Err("max_hops must be greater than or equal to start_ttl".to_string());
        }
        if self.probe_timeout.is_zero() {
            return Err("probe_timeout must be greater than 0".to_string());
        }
        if self.port == 0 {
            return Err("port must be greater than 0".to_string());
        }
        Ok(())
    }
}

/// Builder for TracerouteConfig
pub struct TracerouteConfigBuilder {
    config: TracerouteConfig,
}

impl TracerouteConfigBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self {
            config: TracerouteConfig::default(),
        }
    }

    /// Set the probing strategy
    pub fn strategy(mut self, strategy: ProbeKind) -> Self {
        self.config.strategy = strategy;
        self
    }

    /// Set the starting TTL value
    pub fn start_ttl(mut self, ttl: u8) -> Self {
        self.config.start_ttl = ttl;
        self
    }

    /// Set the maximum number of hops
    pub fn max_hops(mut self, hops: u8) -> Self {
        self.config.max_hops = Some(hops);
        self
    }

    /// Set the probe timeout
    pub fn probe_timeout(mut self, timeout: Duration) -> Self {
        self.config.probe_timeout = timeout;
        self
    }

    /// Set the destination port for reachability probes
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Pin the echo identifier
    pub fn identifier(mut self, identifier: u16) -> Self {
        self.config.identifier = Some(identifier);
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<TracerouteConfig, String> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for TracerouteConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

//! Reverse DNS lookup functionality

use hickory_resolver::config::ResolverConfig;
use hickory_resolver::name_server::TokioConnectionProvider;
use hickory_resolver::TokioResolver;
use std::net::{IpAddr, Ipv4Addr};

/// Error type for reverse DNS operations
#[derive(Debug, thiserror::Error)]
pub enum ReverseDnsError {
    /// DNS resolution failed
    #[error("DNS resolution failed: {0}")]
    ResolutionError(String),

    /// No PTR record found
    #[error("No PTR record found")]
    NotFound,
}

/// Perform reverse DNS lookup for a hop address
pub async fn reverse_dns_lookup(
    resolver: &TokioResolver,
    ip: Ipv4Addr,
) -> Result<String, ReverseDnsError> {
    let lookup = resolver
        .reverse_lookup(IpAddr::V4(ip))
        .await
        .map_err(|e| ReverseDnsError::ResolutionError(e.to_string()))?;

    lookup
        .iter()
        .next()
        .map(|name| trim_root(&name.to_string()))
        .ok_or(ReverseDnsError::NotFound)
}

fn trim_root(name: &str) -> String {
    name.strip_suffix('.').unwrap_or(name).to_string()
}

/// Create a default DNS resolver
pub fn create_default_resolver() -> TokioResolver {
    TokioResolver::builder_with_config(
        ResolverConfig::cloudflare(),
        TokioConnectionProvider::default(),
    )
    .build()
}

//! Forward resolution of trace targets to IPv4 addresses

use crate::dns::reverse::create_default_resolver;
use crate::traceroute::TracerouteError;
use hickory_resolver::TokioResolver;
use std::net::{IpAddr, Ipv4Addr};
use tracing::debug;

/// Resolve `host` to the IPv4 address that will be traced
///
/// Address literals are accepted without a lookup. A host that only has
/// IPv6 addresses fails with [`TracerouteError::Ipv6NotSupported`].
pub async fn resolve_ipv4(host: &str) -> Result<Ipv4Addr, TracerouteError> {
    if let Some(ip) = parse_literal(host)? {
        return Ok(ip);
    }

    let resolver = create_default_resolver();
    resolve_with(&resolver, host).await
}

/// Accept an IPv4 literal, reject an IPv6 literal, defer anything else
fn parse_literal(host: &str) -> Result<Option<Ipv4Addr>, TracerouteError> {
    match host.parse::<IpAddr>() {
        Ok(IpAddr::V4(ip)) => Ok(Some(ip)),
        Ok(IpAddr::V6(_)) => Err(TracerouteError::Ipv6NotSupported),
        Err(_) if host.trim().is_empty() => Err(TracerouteError::ResolutionError(
            "empty host name".to_string(),
        )),
        Err(_) => Ok(None),
    }
}

async fn resolve_with(resolver: &TokioResolver, host: &str) -> Result<Ipv4Addr, TracerouteError> {
    let v4_error = match resolver.ipv4_lookup(host).await {
        Ok(lookup) => {
            if let Some(record) = lookup.iter().next() {
                debug!(host, addr = %record.0, "resolved target");
                return Ok(record.0);
            }
            None
        }
        Err(e) => Some(e.to_string()),
    };

    if let Ok(lookup) = resolver.ipv6_lookup(host).await {
        if lookup.iter().next().is_some() {
            return Err(TracerouteError::Ipv6NotSupported);
        }
    }

    Err(TracerouteError::ResolutionError(match v4_error {
        Some(reason) => format!("{host}: {reason}"),
        None => format!("{host}: no IPv4 address"),
    }))
}

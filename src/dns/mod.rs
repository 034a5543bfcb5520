//! DNS functionality: forward resolution of trace targets and reverse lookups

pub mod resolve;
pub mod reverse;

pub use resolve::resolve_ipv4;
pub use reverse::{create_default_resolver, reverse_dns_lookup, ReverseDnsError};

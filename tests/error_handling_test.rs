//! Tests for structured error handling in the hoptrace library
//!
//! These tests verify that the library returns proper structured errors
//! that are easy for developers to handle programmatically.

use hoptrace::{ProbeKind, TracerouteConfig, TracerouteError};
use std::net::Ipv4Addr;
use std::time::Duration;

fn is_root() -> bool {
    hoptrace::socket::utils::is_root()
}

#[test]
fn test_insufficient_permissions_error() {
    // Only meaningful without root
    if is_root() {
        return;
    }

    let config = TracerouteConfig::builder().max_hops(1).build().unwrap();
    match hoptrace::trace(Ipv4Addr::LOCALHOST, &config) {
        Err(TracerouteError::InsufficientPermissions {
            required,
            suggestion,
        }) => {
            assert!(required.contains("root") || required.contains("CAP_NET_RAW"));
            assert!(!suggestion.is_empty());
        }
        // Unprivileged runs may still hold CAP_NET_RAW
        Ok(_) => {}
        Err(e) => panic!("Expected InsufficientPermissions error, got: {:?}", e),
    }
}

#[test]
fn test_invalid_config_is_rejected_before_sockets() {
    let config = TracerouteConfig {
        start_ttl: 12,
        max_hops: Some(3),
        ..TracerouteConfig::default()
    };

    match hoptrace::trace(Ipv4Addr::LOCALHOST, &config) {
        Err(TracerouteError::ConfigError(msg)) => {
            assert!(msg.contains("start_ttl"));
        }
        other => panic!("Expected ConfigError, got: {:?}", other.map(|r| r.status)),
    }
}

#[test]
fn test_zero_timeout_rejected_for_reachability() {
    let config = TracerouteConfig {
        strategy: ProbeKind::Reachability,
        probe_timeout: Duration::ZERO,
        ..TracerouteConfig::default()
    };

    let err = hoptrace::trace(Ipv4Addr::LOCALHOST, &config).unwrap_err();
    assert_eq!(err.code(), 2);
    assert!(err.is_setup_error());
}

#[tokio::test]
async fn test_ipv6_literal_not_supported() {
    let err = hoptrace::resolve_ipv4("2001:db8::1").await.unwrap_err();
    assert!(matches!(err, TracerouteError::Ipv6NotSupported));
    assert_eq!(err.code(), 1);
}

#[tokio::test]
async fn test_ipv4_literal_resolves_locally() {
    let ip = hoptrace::resolve_ipv4("198.51.100.20").await.unwrap();
    assert_eq!(ip, Ipv4Addr::new(198, 51, 100, 20));
}

#[test]
fn test_error_display_formatting() {
    let errors: Vec<TracerouteError> = vec![
        TracerouteError::InsufficientPermissions {
            required: "root or CAP_NET_RAW".to_string(),
            suggestion: "Run with sudo".to_string(),
        },
        TracerouteError::SocketError("Address already in use".to_string()),
        TracerouteError::ResolutionError("no.such.host: no IPv4 address".to_string()),
        TracerouteError::ConfigError("start_ttl must be at least 1".to_string()),
        TracerouteError::Ipv6NotSupported,
    ];

    for error in errors {
        let display = error.to_string();
        assert!(!display.is_empty());
        assert!(error.is_setup_error(), "{} should be a setup error", display);
    }
}

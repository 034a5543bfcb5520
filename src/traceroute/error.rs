//! Error types for traceroute operations

use crate::socket::TransportError;
use crate::traceroute::codec::CodecError;
use thiserror::Error;

/// Errors that can occur during traceroute operations
///
/// # Examples
///
/// ```
/// # use hoptrace::TracerouteError;
/// fn handle_error(err: TracerouteError) {
///     match err {
///         TracerouteError::InsufficientPermissions { required, suggestion } => {
///             eprintln!("Insufficient permissions: {}", required);
///             eprintln!("Try: {}", suggestion);
///         }
///         TracerouteError::ResolutionError(msg) => {
///             eprintln!("DNS resolution failed: {}", msg);
///         }
///         _ => eprintln!("Traceroute failed: {}", err),
///     }
/// }
/// ```
#[derive(Debug, Error)]
pub enum TracerouteError {
    /// Socket creation failed due to insufficient permissions
    ///
    /// This error provides structured information about what permissions
    /// are needed and how to obtain them.
    #[error("Insufficient permissions: {required}")]
    InsufficientPermissions {
        /// Description of required permissions (e.g., "root or CAP_NET_RAW")
        required: String,
        /// Suggested remedy (e.g., "Run with sudo")
        suggestion: String,
    },

    /// Socket creation failed for other reasons
    #[error("Failed to create socket: {0}")]
    SocketError(String),

    /// DNS resolution failed
    ///
    /// The target hostname could not be resolved to an IPv4 address.
    #[error("Failed to resolve host: {0}")]
    ResolutionError(String),

    /// IPv6 targets are not supported
    #[error("IPv6 targets are not supported")]
    Ipv6NotSupported,

    /// Invalid configuration provided
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// The outbound probe could not be encoded
    #[error("Failed to encode probe at TTL {ttl}: {source}")]
    EncodeError {
        /// TTL being probed
        ttl: u8,
        /// Underlying codec failure
        #[source]
        source: CodecError,
    },

    /// Failed to configure or send a probe
    #[error("Failed to send probe at TTL {ttl}: {source}")]
    ProbeSendError {
        /// TTL being probed
        ttl: u8,
        /// Underlying transport failure
        #[source]
        source: TransportError,
    },

    /// Reading the response failed for a reason other than timeout or unreachable
    #[error("Failed to receive response at TTL {ttl}: {source}")]
    ReceiveError {
        /// TTL being probed
        ttl: u8,
        /// Underlying transport failure
        #[source]
        source: TransportError,
    },

    /// A response was not a well-formed ICMP message
    #[error("Malformed response at TTL {ttl}: {source}")]
    MalformedMessage {
        /// TTL being probed
        ttl: u8,
        /// Underlying codec failure
        #[source]
        source: CodecError,
    },
}

impl TracerouteError {
    /// Stable numeric classification of the failure
    ///
    /// 1 resolution, 2 setup, 3 probe encoding, 4 send/receive I/O,
    /// 5 malformed response.
    pub fn code(&self) -> u8 {
        match self {
            TracerouteError::ResolutionError(_) | TracerouteError::Ipv6NotSupported => 1,
            TracerouteError::InsufficientPermissions { .. }
            | TracerouteError::SocketError(_)
            | TracerouteError::ConfigError(_) => 2,
            TracerouteError::EncodeError { .. } => 3,
            TracerouteError::ProbeSendError { .. } | TracerouteError::ReceiveError { .. } => 4,
            TracerouteError::MalformedMessage { .. } => 5,
        }
    }

    /// True for failures raised before any probe was sent
    pub fn is_setup_error(&self) -> bool {
        matches!(self.code(), 1 | 2)
    }
}

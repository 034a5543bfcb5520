//! High-level traceroute API
//!
//! These entry points open the OS sockets for the configured strategy, hand
//! them to a [`TraceSession`] and run the hop loop. They block the calling
//! thread for the whole trace; async callers should run them on a blocking
//! task.

use crate::socket::factory::{open_icmp_transport, open_udp_transport};
use crate::socket::ProbeTransport;
use crate::traceroute::config::TracerouteConfig;
use crate::traceroute::engine::{HopSink, TracerouteEngine};
use crate::traceroute::error::TracerouteError;
use crate::traceroute::result::TracerouteResult;
use crate::traceroute::session::TraceSession;
use crate::traceroute::strategy::{EchoStrategy, ProbeStrategy, ReachabilityStrategy};
use crate::traceroute::types::{HopResult, ProbeKind};
use std::net::Ipv4Addr;
use tokio_util::sync::CancellationToken;

/// Trace the path to `destination` with default settings for `config`
///
/// Setup failures (bad configuration, socket creation) are returned as
/// `Err`. Failures after the first probe was sent end up in
/// [`TracerouteResult::status`] together with the hops collected so far.
///
/// # Examples
///
/// ```no_run
/// use hoptrace::{trace, ProbeKind, TracerouteConfig};
/// use std::net::Ipv4Addr;
///
/// let config = TracerouteConfig::builder()
///     .strategy(ProbeKind::Reachability)
///     .max_hops(20)
///     .build()
///     .map_err(hoptrace::TracerouteError::ConfigError)?;
///
/// let result = trace(Ipv4Addr::new(1, 1, 1, 1), &config)?;
/// for hop in &result.hops {
///     println!("{:?}", hop);
/// }
/// # Ok::<(), hoptrace::TracerouteError>(())
/// ```
pub fn trace(
    destination: Ipv4Addr,
    config: &TracerouteConfig,
) -> Result<TracerouteResult, TracerouteError> {
    trace_with_sink(
        destination,
        config,
        &CancellationToken::new(),
        &mut |_: &HopResult| {},
    )
}

/// Trace the path to `destination`, streaming hops to `sink`
///
/// `cancel` is checked before each TTL; a cancelled trace returns the hops
/// recorded so far with status `Cancelled`.
pub fn trace_with_sink<K>(
    destination: Ipv4Addr,
    config: &TracerouteConfig,
    cancel: &CancellationToken,
    sink: &mut K,
) -> Result<TracerouteResult, TracerouteError>
where
    K: HopSink + ?Sized,
{
    config.validate().map_err(TracerouteError::ConfigError)?;

    match config.strategy {
        ProbeKind::Echo => {
            let strategy = match config.identifier {
                Some(identifier) => EchoStrategy::with_identifier(identifier),
                None => EchoStrategy::new(),
            };
            run_with_transport(
                strategy,
                open_icmp_transport()?,
                destination,
                config,
                cancel,
                sink,
            )
        }
        ProbeKind::Reachability => run_with_transport(
            ReachabilityStrategy::new(config.port),
            open_udp_transport()?,
            destination,
            config,
            cancel,
            sink,
        ),
    }
}

/// Run a trace over a caller-supplied transport
///
/// The transport is owned by the session and closed before this returns.
pub fn run_with_transport<S, T, K>(
    strategy: S,
    transport: T,
    destination: Ipv4Addr,
    config: &TracerouteConfig,
    cancel: &CancellationToken,
    sink: &mut K,
) -> Result<TracerouteResult, TracerouteError>
where
    S: ProbeStrategy,
    T: ProbeTransport,
    K: HopSink + ?Sized,
{
    let mut session = TraceSession::new(destination, config, &strategy, transport)?;
    let engine = TracerouteEngine::new(strategy);
    Ok(engine.run_with_sink(&mut session, cancel, sink))
}

//! Hop loop: TTL escalation shared by every probing strategy

use crate::socket::ProbeTransport;
use crate::traceroute::dispatcher::{dispatch, Dispatch};
use crate::traceroute::result::{TraceStatus, TracerouteResult};
use crate::traceroute::session::TraceSession;
use crate::traceroute::strategy::ProbeStrategy;
use crate::traceroute::types::{HopResult, ProbeRequest};
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Receives each hop as soon as it is known
pub trait HopSink {
    /// Called once per recorded hop, in TTL order
    fn on_hop(&mut self, hop: &HopResult);
}

impl<F: FnMut(&HopResult)> HopSink for F {
    fn on_hop(&mut self, hop: &HopResult) {
        self(hop);
    }
}

/// Traceroute engine
///
/// Probes one TTL at a time, from the session's start TTL up to its hop
/// ceiling, and stops at the first hop that answers from the destination.
pub struct TracerouteEngine<S: ProbeStrategy> {
    strategy: S,
}

impl<S: ProbeStrategy> TracerouteEngine<S> {
    /// Create a new traceroute engine
    pub fn new(strategy: S) -> Self {
        Self { strategy }
    }

    /// Strategy this engine probes with
    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    /// Run the hop loop to completion
    pub fn run<T: ProbeTransport>(
        &self,
        session: &mut TraceSession<T>,
        cancel: &CancellationToken,
    ) -> TracerouteResult {
        self.run_with_sink(session, cancel, &mut |_: &HopResult| {})
    }

    /// Run the hop loop, reporting every hop to `sink` as it is recorded
    pub fn run_with_sink<T, K>(
        &self,
        session: &mut TraceSession<T>,
        cancel: &CancellationToken,
        sink: &mut K,
    ) -> TracerouteResult
    where
        T: ProbeTransport,
        K: HopSink + ?Sized,
    {
        let start = Instant::now();
        let destination = session.destination();
        let timeout = session.probe_timeout();
        let identifier = session.identifier();
        let mut hops = Vec::new();
        let mut status = TraceStatus::HopsExhausted;

        info!(
            %destination,
            strategy = self.strategy.kind().description(),
            start_ttl = session.start_ttl(),
            max_hops = session.max_hops(),
            "starting trace"
        );

        for ttl in session.start_ttl()..=session.max_hops() {
            if cancel.is_cancelled() {
                debug!(ttl, "trace cancelled");
                status = TraceStatus::Cancelled;
                break;
            }

            let request = ProbeRequest::new(identifier, ttl);
            match dispatch(
                &self.strategy,
                session.transport_mut(),
                &request,
                destination,
                timeout,
            ) {
                Ok(Dispatch::Hop { result, arrived }) => {
                    let at_destination = arrived || result.is_destination(destination);
                    sink.on_hop(&result);
                    hops.push(result);
                    if at_destination {
                        status = TraceStatus::DestinationReached;
                        break;
                    }
                }
                Ok(Dispatch::Unreachable { from }) => {
                    debug!(ttl, ?from, "destination signalled unreachable");
                    status = TraceStatus::DestinationReached;
                    break;
                }
                Err(err) => {
                    warn!(ttl, error = %err, "trace aborted");
                    status = TraceStatus::Failed(err);
                    break;
                }
            }
        }

        let total_duration = start.elapsed();
        info!(
            %destination,
            hops = hops.len(),
            status = status.label(),
            elapsed_ms = total_duration.as_millis() as u64,
            "trace finished"
        );

        TracerouteResult {
            destination,
            strategy: self.strategy.kind(),
            hops,
            status,
            total_duration,
        }
    }
}

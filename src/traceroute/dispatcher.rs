//! Probe dispatcher: one probe, one TTL, one classified outcome

use crate::socket::{ProbeTransport, RECV_BUFFER_SIZE};
use crate::traceroute::codec;
use crate::traceroute::error::TracerouteError;
use crate::traceroute::strategy::{Classification, FailureClass, ProbeStrategy};
use crate::traceroute::types::{HopResult, ProbeRequest, ProbeResponse};
use std::net::Ipv4Addr;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// Outcome of dispatching one probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// A hop slot for this TTL
    Hop {
        /// Classified result
        result: HopResult,
        /// The destination itself answered
        arrived: bool,
    },
    /// The destination signalled unreachable; the trace is complete and no
    /// hop is recorded for this TTL
    Unreachable {
        /// Sender of the unreachable message, when one was read
        from: Option<Ipv4Addr>,
    },
}

/// Send `request` and wait up to `timeout` for the response that belongs to it
///
/// Responses the strategy marks as foreign are skipped without extending
/// the deadline.
pub fn dispatch<S, T>(
    strategy: &S,
    transport: &mut T,
    request: &ProbeRequest,
    destination: Ipv4Addr,
    timeout: Duration,
) -> Result<Dispatch, TracerouteError>
where
    S: ProbeStrategy,
    T: ProbeTransport + ?Sized,
{
    let ttl = request.ttl;

    transport
        .set_ttl(ttl)
        .map_err(|source| TracerouteError::ProbeSendError { ttl, source })?;

    let probe = strategy
        .encode_probe(request, destination)
        .map_err(|source| TracerouteError::EncodeError { ttl, source })?;

    let sent_at = Instant::now();
    transport
        .set_deadline(sent_at + timeout)
        .map_err(|source| TracerouteError::ProbeSendError { ttl, source })?;

    if let Err(err) = transport.send_to(&probe.payload, probe.target) {
        return match strategy.classify_failure(&err) {
            FailureClass::Timeout => {
                debug!(ttl, "send timed out");
                Ok(timeout_hop(ttl))
            }
            FailureClass::Unreachable => {
                debug!(ttl, error = %err, "send reported destination unreachable");
                Ok(Dispatch::Unreachable { from: None })
            }
            FailureClass::Fatal => Err(TracerouteError::ProbeSendError { ttl, source: err }),
        };
    }
    trace!(ttl, seq = request.sequence, target = %probe.target, "probe sent");

    loop {
        let datagram = match transport.receive(RECV_BUFFER_SIZE) {
            Ok(datagram) => datagram,
            Err(err) => {
                return match strategy.classify_failure(&err) {
                    FailureClass::Timeout => {
                        debug!(ttl, "no response before deadline");
                        Ok(timeout_hop(ttl))
                    }
                    FailureClass::Unreachable => {
                        debug!(ttl, error = %err, "receive reported destination unreachable");
                        Ok(Dispatch::Unreachable { from: None })
                    }
                    FailureClass::Fatal => {
                        Err(TracerouteError::ReceiveError { ttl, source: err })
                    }
                };
            }
        };

        let message = codec::decode(&datagram.bytes)
            .map_err(|source| TracerouteError::MalformedMessage { ttl, source })?;

        let response = ProbeResponse {
            from: datagram.from,
            icmp_type: message.icmp_type.0,
            code: message.code,
            rtt: datagram
                .received_at
                .saturating_duration_since(sent_at)
                .min(timeout),
            ttl,
        };

        let classification = strategy.classify_response(&message, request, destination);
        trace!(
            ttl,
            from = %response.from,
            icmp_type = response.icmp_type,
            code = response.code,
            ?classification,
            "response read"
        );

        let outcome = match classification {
            Classification::Foreign => continue,
            Classification::Hop => reached(&response, false),
            Classification::Arrived => reached(&response, true),
            Classification::Unreachable => Dispatch::Unreachable {
                from: Some(response.from),
            },
            Classification::Unexpected => Dispatch::Hop {
                result: HopResult::Unclassified { ttl },
                arrived: false,
            },
        };
        return Ok(outcome);
    }
}

fn timeout_hop(ttl: u8) -> Dispatch {
    Dispatch::Hop {
        result: HopResult::Timeout { ttl },
        arrived: false,
    }
}

fn reached(response: &ProbeResponse, arrived: bool) -> Dispatch {
    Dispatch::Hop {
        result: HopResult::Reached {
            addr: response.from,
            rtt: response.rtt,
            ttl: response.ttl,
        },
        arrived,
    }
}

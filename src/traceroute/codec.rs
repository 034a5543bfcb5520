//! ICMP/UDP probe encoding and ICMP response decoding
//!
//! Decoding accepts what a raw IPv4 ICMP socket hands back: the IPv4 header
//! followed by the ICMP message. Error messages (Time Exceeded, Destination
//! Unreachable, ...) quote the head of the datagram that triggered them; that
//! quote is exposed as a [`QuotedDatagram`] so probes can be matched.

use pnet::packet::icmp::echo_request::MutableEchoRequestPacket;
use pnet::packet::icmp::{IcmpCode, IcmpType, IcmpTypes};
use pnet::packet::ip::{IpNextHeaderProtocol, IpNextHeaderProtocols};
use pnet::packet::ipv4::Ipv4Packet;
use pnet::packet::Packet;
use pnet::util::checksum as pnet_checksum;
use std::net::Ipv4Addr;
use thiserror::Error;

/// ICMP header length in bytes (type, code, checksum, rest-of-header)
pub const ICMP_HEADER_LEN_BYTES: usize = 8;
/// IPv4 header minimum length in bytes
pub const IPV4_HEADER_MIN_LEN_BYTES: usize = 20;

/// Wire-format errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    /// Buffer shorter than the layer requires
    #[error("{layer} message too short: expected at least {expected} bytes, got {actual}")]
    TooShort {
        /// Layer being parsed
        layer: &'static str,
        /// Minimum length
        expected: usize,
        /// Actual length
        actual: usize,
    },

    /// IP version field is not 4
    #[error("not an IPv4 datagram (version {0})")]
    NotIpv4(u8),

    /// IHL field out of range for the buffer
    #[error("invalid IPv4 header length {0}")]
    BadHeaderLength(usize),

    /// Datagram does not carry ICMP
    #[error("datagram carries protocol {0}, not ICMP")]
    NotIcmp(u8),

    /// Outbound packet could not be built
    #[error("failed to build probe: {0}")]
    Encode(&'static str),
}

/// A decoded ICMP message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IcmpMessage {
    /// Source address from the enclosing IPv4 header
    pub source: Ipv4Addr,
    /// ICMP type
    pub icmp_type: IcmpType,
    /// ICMP code
    pub code: u8,
    /// Bytes 4..8 of the ICMP header (identifier/sequence for echo messages)
    pub rest_of_header: [u8; 4],
    /// Everything after the 8-byte header
    pub body: Vec<u8>,
}

impl IcmpMessage {
    /// Identifier and sequence number, read as echo fields
    pub fn echo_fields(&self) -> (u16, u16) {
        let [a, b, c, d] = self.rest_of_header;
        (u16::from_be_bytes([a, b]), u16::from_be_bytes([c, d]))
    }

    /// True for ICMP error messages, which quote the offending datagram
    pub fn is_error(&self) -> bool {
        matches!(
            self.icmp_type,
            IcmpTypes::DestinationUnreachable
                | IcmpTypes::SourceQuench
                | IcmpTypes::RedirectMessage
                | IcmpTypes::TimeExceeded
                | IcmpTypes::ParameterProblem
        )
    }

    /// The quoted original datagram carried by an error message
    ///
    /// `None` for non-error messages or when the quote is unparseable.
    pub fn quoted(&self) -> Option<QuotedDatagram> {
        if !self.is_error() {
            return None;
        }
        let (header, payload) = split_ipv4(&self.body).ok()?;
        let head_len = payload.len().min(ICMP_HEADER_LEN_BYTES);
        Some(QuotedDatagram {
            protocol: header.get_next_level_protocol(),
            destination: header.get_destination(),
            transport_head: payload[..head_len].to_vec(),
        })
    }
}

/// Head of the datagram quoted inside an ICMP error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuotedDatagram {
    /// Protocol of the original datagram
    pub protocol: IpNextHeaderProtocol,
    /// Destination of the original datagram
    pub destination: Ipv4Addr,
    /// Up to eight bytes of the original transport header
    pub transport_head: Vec<u8>,
}

impl QuotedDatagram {
    /// Identifier and sequence when the quote is a complete ICMP Echo Request header
    pub fn echo_request(&self) -> Option<(u16, u16)> {
        let head = &self.transport_head;
        if self.protocol != IpNextHeaderProtocols::Icmp
            || head.len() < ICMP_HEADER_LEN_BYTES
            || head[0] != IcmpTypes::EchoRequest.0
        {
            return None;
        }
        Some((
            u16::from_be_bytes([head[4], head[5]]),
            u16::from_be_bytes([head[6], head[7]]),
        ))
    }

    /// Source and destination ports when the quote is a UDP header
    pub fn udp_ports(&self) -> Option<(u16, u16)> {
        let head = &self.transport_head;
        if self.protocol != IpNextHeaderProtocols::Udp || head.len() < 4 {
            return None;
        }
        Some((
            u16::from_be_bytes([head[0], head[1]]),
            u16::from_be_bytes([head[2], head[3]]),
        ))
    }
}

/// Encode an ICMP Echo Request (type 8, code 0) with a valid checksum
pub fn encode_echo_request(
    identifier: u16,
    sequence: u16,
    payload: &[u8],
) -> Result<Vec<u8>, CodecError> {
    let mut buf = vec![0u8; MutableEchoRequestPacket::minimum_packet_size() + payload.len()];
    {
        let mut packet = MutableEchoRequestPacket::new(&mut buf)
            .ok_or(CodecError::Encode("echo request buffer too small"))?;
        packet.set_icmp_type(IcmpTypes::EchoRequest);
        packet.set_icmp_code(IcmpCode(0));
        packet.set_identifier(identifier);
        packet.set_sequence_number(sequence);
        packet.set_payload(payload);

        let checksum = pnet_checksum(packet.packet(), 1);
        packet.set_checksum(checksum);
    }
    Ok(buf)
}

/// Encode the payload of a UDP reachability probe (always empty)
pub fn encode_udp_probe() -> Vec<u8> {
    Vec::new()
}

/// Decode a raw-socket read (IPv4 header + ICMP message)
pub fn decode(datagram: &[u8]) -> Result<IcmpMessage, CodecError> {
    let (header, payload) = split_ipv4(datagram)?;
    let protocol = header.get_next_level_protocol();
    if protocol != IpNextHeaderProtocols::Icmp {
        return Err(CodecError::NotIcmp(protocol.0));
    }
    decode_icmp(header.get_source(), payload)
}

/// Decode a bare ICMP message whose IPv4 source is already known
pub fn decode_icmp(source: Ipv4Addr, bytes: &[u8]) -> Result<IcmpMessage, CodecError> {
    if bytes.len() < ICMP_HEADER_LEN_BYTES {
        return Err(CodecError::TooShort {
            layer: "ICMP",
            expected: ICMP_HEADER_LEN_BYTES,
            actual: bytes.len(),
        });
    }

    Ok(IcmpMessage {
        source,
        icmp_type: IcmpType(bytes[0]),
        code: bytes[1],
        rest_of_header: [bytes[4], bytes[5], bytes[6], bytes[7]],
        body: bytes[ICMP_HEADER_LEN_BYTES..].to_vec(),
    })
}

/// Split an IPv4 datagram into its parsed header and payload
fn split_ipv4(bytes: &[u8]) -> Result<(Ipv4Packet<'_>, &[u8]), CodecError> {
    let header = Ipv4Packet::new(bytes).ok_or(CodecError::TooShort {
        layer: "IPv4",
        expected: IPV4_HEADER_MIN_LEN_BYTES,
        actual: bytes.len(),
    })?;

    if header.get_version() != 4 {
        return Err(CodecError::NotIpv4(header.get_version()));
    }

    let header_len = usize::from(header.get_header_length()) * 4;
    if header_len < IPV4_HEADER_MIN_LEN_BYTES || header_len > bytes.len() {
        return Err(CodecError::BadHeaderLength(header_len));
    }

    // Trust total_length only when it fits the buffer
    let total_len = usize::from(header.get_total_length());
    let end = if (header_len..=bytes.len()).contains(&total_len) {
        total_len
    } else {
        bytes.len()
    };

    Ok((header, &bytes[header_len..end]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traceroute::test_packets::{echo_reply, ipv4_datagram, time_exceeded_for_echo};

    #[test]
    fn test_echo_request_wire_format() {
        let bytes = encode_echo_request(0x1234, 1, &[]).unwrap();
        // 0x0800 + 0x1234 + 0x0001 = 0x1a35, complemented
        assert_eq!(bytes, vec![8, 0, 0xe5, 0xca, 0x12, 0x34, 0x00, 0x01]);
    }

    #[test]
    fn test_echo_request_with_payload_checksums() {
        let bytes = encode_echo_request(7, 300, b"hoptrace").unwrap();
        assert_eq!(bytes.len(), 16);
        assert_eq!(&bytes[8..], b"hoptrace");
        let carried = u16::from_be_bytes([bytes[2], bytes[3]]);
        assert_eq!(pnet_checksum(&bytes, 1), carried);
    }

    #[test]
    fn test_udp_probe_is_empty() {
        assert!(encode_udp_probe().is_empty());
    }

    #[test]
    fn test_decode_echo_reply() {
        let from = Ipv4Addr::new(8, 8, 8, 8);
        let msg = decode(&echo_reply(from, 0xbeef, 5)).unwrap();
        assert_eq!(msg.source, from);
        assert_eq!(msg.icmp_type, IcmpTypes::EchoReply);
        assert_eq!(msg.echo_fields(), (0xbeef, 5));
        assert!(!msg.is_error());
        assert!(msg.quoted().is_none());
    }

    #[test]
    fn test_decode_time_exceeded_quotes_probe() {
        let router = Ipv4Addr::new(10, 0, 0, 1);
        let dest = Ipv4Addr::new(93, 184, 216, 34);
        let msg = decode(&time_exceeded_for_echo(router, dest, 0x4242, 3)).unwrap();

        assert_eq!(msg.icmp_type, IcmpTypes::TimeExceeded);
        let quoted = msg.quoted().unwrap();
        assert_eq!(quoted.destination, dest);
        assert_eq!(quoted.echo_request(), Some((0x4242, 3)));
        assert_eq!(quoted.udp_ports(), None);
    }

    #[test]
    fn test_decode_rejects_short_buffer() {
        let err = decode(&[0x45, 0x00]).unwrap_err();
        assert!(matches!(err, CodecError::TooShort { layer: "IPv4", .. }));
    }

    #[test]
    fn test_decode_rejects_truncated_icmp() {
        let datagram = ipv4_datagram(Ipv4Addr::new(1, 1, 1, 1), 1, &[0, 0, 0]);
        let err = decode(&datagram).unwrap_err();
        assert_eq!(
            err,
            CodecError::TooShort {
                layer: "ICMP",
                expected: 8,
                actual: 3
            }
        );
    }

    #[test]
    fn test_decode_rejects_non_ipv4() {
        let mut datagram = echo_reply(Ipv4Addr::new(1, 1, 1, 1), 1, 1);
        datagram[0] = 0x65;
        assert_eq!(decode(&datagram).unwrap_err(), CodecError::NotIpv4(6));
    }

    #[test]
    fn test_decode_rejects_bad_ihl() {
        let mut datagram = echo_reply(Ipv4Addr::new(1, 1, 1, 1), 1, 1);
        datagram[0] = 0x4f; // 60-byte header in a 28-byte datagram
        assert_eq!(decode(&datagram).unwrap_err(), CodecError::BadHeaderLength(60));
    }

    #[test]
    fn test_decode_rejects_non_icmp() {
        let datagram = ipv4_datagram(Ipv4Addr::new(1, 1, 1, 1), 17, &[0; 8]);
        assert_eq!(decode(&datagram).unwrap_err(), CodecError::NotIcmp(17));
    }

    #[test]
    fn test_quote_too_short_is_none() {
        let mut icmp = vec![11, 0, 0, 0, 0, 0, 0, 0];
        icmp.extend_from_slice(&[0x45, 0, 0]);
        let msg = decode_icmp(Ipv4Addr::new(10, 0, 0, 1), &icmp).unwrap();
        assert!(msg.is_error());
        assert!(msg.quoted().is_none());
    }
}

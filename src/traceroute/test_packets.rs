//! Builders for raw-socket datagrams used by unit tests

use pnet::util::checksum as pnet_checksum;
use std::net::Ipv4Addr;

/// Local address the fake datagrams are addressed to
pub const LOCAL: Ipv4Addr = Ipv4Addr::new(192, 168, 1, 100);

/// IPv4 header (no options) from `source` to [`LOCAL`] followed by `payload`
pub fn ipv4_datagram(source: Ipv4Addr, protocol: u8, payload: &[u8]) -> Vec<u8> {
    ipv4_between(source, LOCAL, protocol, payload)
}

fn ipv4_between(source: Ipv4Addr, destination: Ipv4Addr, protocol: u8, payload: &[u8]) -> Vec<u8> {
    let total_len = (20 + payload.len()) as u16;
    let mut bytes = vec![0x45, 0x00];
    bytes.extend_from_slice(&total_len.to_be_bytes());
    bytes.extend_from_slice(&[0, 0, 0, 0, 64, protocol, 0, 0]);
    bytes.extend_from_slice(&source.octets());
    bytes.extend_from_slice(&destination.octets());
    let checksum = pnet_checksum(&bytes, 5);
    bytes[10..12].copy_from_slice(&checksum.to_be_bytes());
    bytes.extend_from_slice(payload);
    bytes
}

fn icmp(icmp_type: u8, code: u8, rest: [u8; 4], body: &[u8]) -> Vec<u8> {
    let mut bytes = vec![icmp_type, code, 0, 0];
    bytes.extend_from_slice(&rest);
    bytes.extend_from_slice(body);
    let checksum = pnet_checksum(&bytes, 1);
    bytes[2..4].copy_from_slice(&checksum.to_be_bytes());
    bytes
}

fn echo_rest(identifier: u16, sequence: u16) -> [u8; 4] {
    let [a, b] = identifier.to_be_bytes();
    let [c, d] = sequence.to_be_bytes();
    [a, b, c, d]
}

/// Echo Reply from `from`
pub fn echo_reply(from: Ipv4Addr, identifier: u16, sequence: u16) -> Vec<u8> {
    ipv4_datagram(from, 1, &icmp(0, 0, echo_rest(identifier, sequence), &[]))
}

/// Our own Echo Request as seen on a loopback raw socket
pub fn echo_request(from: Ipv4Addr, identifier: u16, sequence: u16) -> Vec<u8> {
    ipv4_datagram(from, 1, &icmp(8, 0, echo_rest(identifier, sequence), &[]))
}

/// Time Exceeded from `router` quoting an Echo Request sent to `destination`
pub fn time_exceeded_for_echo(
    router: Ipv4Addr,
    destination: Ipv4Addr,
    identifier: u16,
    sequence: u16,
) -> Vec<u8> {
    let probe = icmp(8, 0, echo_rest(identifier, sequence), &[]);
    let quoted = ipv4_between(LOCAL, destination, 1, &probe);
    ipv4_datagram(router, 1, &icmp(11, 0, [0; 4], &quoted))
}

fn udp_quote(destination: Ipv4Addr, source_port: u16, dest_port: u16) -> Vec<u8> {
    let mut udp = Vec::with_capacity(8);
    udp.extend_from_slice(&source_port.to_be_bytes());
    udp.extend_from_slice(&dest_port.to_be_bytes());
    udp.extend_from_slice(&8u16.to_be_bytes());
    udp.extend_from_slice(&[0, 0]);
    ipv4_between(LOCAL, destination, 17, &udp)
}

/// Time Exceeded from `router` quoting a UDP probe
pub fn time_exceeded_for_udp(
    router: Ipv4Addr,
    destination: Ipv4Addr,
    source_port: u16,
    dest_port: u16,
) -> Vec<u8> {
    let quoted = udp_quote(destination, source_port, dest_port);
    ipv4_datagram(router, 1, &icmp(11, 0, [0; 4], &quoted))
}

/// Destination Unreachable (`code`) from `from` quoting a UDP probe
pub fn unreachable_for_udp(
    from: Ipv4Addr,
    destination: Ipv4Addr,
    source_port: u16,
    dest_port: u16,
    code: u8,
) -> Vec<u8> {
    let quoted = udp_quote(destination, source_port, dest_port);
    ipv4_datagram(from, 1, &icmp(3, code, [0; 4], &quoted))
}

/// Destination Unreachable from `from` quoting an Echo Request
pub fn unreachable_for_echo(
    from: Ipv4Addr,
    destination: Ipv4Addr,
    identifier: u16,
    sequence: u16,
) -> Vec<u8> {
    let probe = icmp(8, 0, echo_rest(identifier, sequence), &[]);
    let quoted = ipv4_between(LOCAL, destination, 1, &probe);
    ipv4_datagram(from, 1, &icmp(3, 1, [0; 4], &quoted))
}

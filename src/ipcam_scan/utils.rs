//! Address helpers shared by grouping, subnet validation and credential lookup

use std::net::Ipv4Addr;

/// Parse `a.b.c.d/p` into network address and prefix length
pub fn parse_cidr(cidr: &str) -> Option<(Ipv4Addr, u8)> {
    let (addr, prefix) = cidr.trim().split_once('/')?;
    let network: Ipv4Addr = addr.parse().ok()?;
    let prefix: u8 = match prefix.parse() {
        Ok(p) if p <= 32 => p,
        _ => return None,
    };
    Some((network, prefix))
}

/// Network mask for a prefix length
fn prefix_mask(prefix: u8) -> u32 {
    if prefix == 0 {
        0
    } else {
        !((1u64 << (32 - prefix as u32)) - 1) as u32
    }
}

/// Check if an IP address falls within a CIDR subnet
pub fn ip_in_cidr(ip: &str, cidr: &str) -> bool {
    let Some((network, prefix)) = parse_cidr(cidr) else {
        return false;
    };
    let Ok(device_ip) = ip.trim().parse::<Ipv4Addr>() else {
        return false;
    };
    let mask = prefix_mask(prefix);
    (u32::from(device_ip) & mask) == (u32::from(network) & mask)
}

/// Dotted quad as a 32-bit integer so that `.9` sorts before `.10`.
///
/// Octets are folded left to right (`acc * 256 + octet`). Malformed input
/// still yields a number: non-numeric octets count as 0.
pub fn ip_to_u32(ip: &str) -> u32 {
    ip.split('.').fold(0u32, |acc, octet| {
        acc.wrapping_mul(256)
            .wrapping_add(octet.trim().parse::<u32>().unwrap_or(0))
    })
}

//! Client address helpers shared by the network-aware plugins.

use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use thiserror::Error;

use crate::handler::HttpRequest;

/// Address of the immediate peer, inserted into request extensions by the
/// host before the chain runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeerAddr(pub IpAddr);

/// Returns the peer address recorded in `request`, if any.
pub fn peer_addr(request: &HttpRequest) -> Option<IpAddr> {
    request.extensions().get::<PeerAddr>().map(|peer| peer.0)
}

/// Parses an address that may carry a port (`1.2.3.4:80`, `[::1]:443`).
pub fn parse_ip(value: &str) -> Option<IpAddr> {
    let value = value.trim();
    value
        .parse::<IpAddr>()
        .ok()
        .or_else(|| value.parse::<SocketAddr>().ok().map(|addr| addr.ip()))
}

/// Reads the first address of a possibly comma-separated header.
pub fn header_ip(request: &HttpRequest, header: &str) -> Option<IpAddr> {
    let value = request.headers().get(header)?.to_str().ok()?;
    value.split(',').next().and_then(parse_ip)
}

/// Private, loopback and link-local ranges.
pub fn is_private(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => v4.is_private() || v4.is_loopback() || v4.is_link_local(),
        IpAddr::V6(v6) => {
            let first = v6.segments()[0];
            v6.is_loopback() || (first & 0xfe00) == 0xfc00 || (first & 0xffc0) == 0xfe80
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid IP address or CIDR range: {0:?}")]
pub struct InvalidIpRange(pub String);

/// A single address or CIDR block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IpRange {
    network: IpAddr,
    prefix: u8,
}

impl IpRange {
    pub fn contains(&self, ip: IpAddr) -> bool {
        match (self.network, ip) {
            (IpAddr::V4(net), IpAddr::V4(ip)) => {
                let mask = u32::MAX.checked_shl(32 - u32::from(self.prefix)).unwrap_or(0);
                u32::from(net) & mask == u32::from(ip) & mask
            }
            (IpAddr::V6(net), IpAddr::V6(ip)) => {
                let mask = u128::MAX.checked_shl(128 - u32::from(self.prefix)).unwrap_or(0);
                u128::from(net) & mask == u128::from(ip) & mask
            }
            _ => false,
        }
    }
}

impl FromStr for IpRange {
    type Err = InvalidIpRange;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidIpRange(s.to_string());
        let trimmed = s.trim();

        let (addr, prefix) = match trimmed.split_once('/') {
            Some((addr, prefix)) => (addr, Some(prefix)),
            None => (trimmed, None),
        };
        let network: IpAddr = addr.parse().map_err(|_| invalid())?;
        let max = if network.is_ipv4() { 32 } else { 128 };
        let prefix = match prefix {
            Some(prefix) => prefix.parse::<u8>().map_err(|_| invalid())?,
            None => max,
        };
        if prefix > max {
            return Err(invalid());
        }

        Ok(Self { network, prefix })
    }
}

impl fmt::Display for IpRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network, self.prefix)
    }
}

/// A list of ranges matched in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IpRangeSet(Vec<IpRange>);

impl IpRangeSet {
    /// Parses every entry; the first malformed one is reported.
    pub fn parse<S: AsRef<str>>(entries: &[S]) -> Result<Self, InvalidIpRange> {
        entries
            .iter()
            .map(|entry| entry.as_ref().parse())
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }

    pub fn contains(&self, ip: IpAddr) -> bool {
        self.0.iter().any(|range| range.contains(ip))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    #[test]
    fn test_cidr_contains() {
        let range: IpRange = "10.0.0.0/8".parse().unwrap();
        assert!(range.contains(ip("10.200.1.1")));
        assert!(!range.contains(ip("11.0.0.1")));
        assert!(!range.contains(ip("::1")));

        let v6: IpRange = "2001:db8::/32".parse().unwrap();
        assert!(v6.contains(ip("2001:db8:1::5")));
        assert!(!v6.contains(ip("2001:db9::1")));
    }

    #[test]
    fn test_single_address_and_zero_prefix() {
        let single: IpRange = " 192.0.2.7 ".parse().unwrap();
        assert!(single.contains(ip("192.0.2.7")));
        assert!(!single.contains(ip("192.0.2.8")));
        assert_eq!(single.to_string(), "192.0.2.7/32");

        let any: IpRange = "0.0.0.0/0".parse().unwrap();
        assert!(any.contains(ip("203.0.113.9")));
    }

    #[test]
    fn test_invalid_ranges() {
        assert!("10.0.0.0/33".parse::<IpRange>().is_err());
        assert!("not-an-ip".parse::<IpRange>().is_err());
        assert!("::/129".parse::<IpRange>().is_err());
        assert_eq!(
            IpRangeSet::parse(&["10.0.0.0/8", "bogus"]).unwrap_err(),
            InvalidIpRange("bogus".to_string())
        );
    }

    #[test]
    fn test_parse_ip_with_port() {
        assert_eq!(parse_ip(" 1.2.3.4:8080"), Some(ip("1.2.3.4")));
        assert_eq!(parse_ip("[::1]:443"), Some(ip("::1")));
        assert_eq!(parse_ip("unknown"), None);
    }

    #[test]
    fn test_private_ranges() {
        assert!(is_private(ip("192.168.1.1")));
        assert!(is_private(ip("127.0.0.1")));
        assert!(is_private(ip("fd00::1")));
        assert!(is_private(ip("fe80::1")));
        assert!(!is_private(ip("8.8.8.8")));
        assert!(!is_private(ip("2001:4860::8888")));
    }
}

//! # Range Algebra
//!
//! Pure helpers over IPv4 network descriptors: expanding a CIDR block into its
//! inclusive address span, deciding subsumption between two blocks, and
//! parsing the `a.b.c.d/p` notation handed out by range providers.

use std::net::Ipv4Addr;

use pnet::ipnetwork::Ipv4Network;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RangeError {
    #[error("missing prefix length in '{0}'")]
    MissingPrefix(String),
    #[error("invalid IPv4 address in '{0}'")]
    InvalidAddress(String),
    #[error("invalid prefix length in '{0}'")]
    InvalidPrefix(String),
}

/// Inclusive span of IPv4 addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ipv4Range {
    pub start_addr: Ipv4Addr,
    pub end_addr: Ipv4Addr,
}

impl Ipv4Range {
    pub fn new(start_addr: Ipv4Addr, end_addr: Ipv4Addr) -> Self {
        Self {
            start_addr,
            end_addr,
        }
    }

    /// Ascending, lazy walk over every address in the span.
    ///
    /// Backed by a `u32` inclusive range, so a span ending at
    /// `255.255.255.255` stops there instead of wrapping to `0.0.0.0`.
    pub fn to_iter(&self) -> impl Iterator<Item = Ipv4Addr> + Send + use<> {
        let start: u32 = self.start_addr.into();
        let end: u32 = self.end_addr.into();
        (start..=end).map(Ipv4Addr::from)
    }

    pub fn address_count(&self) -> u64 {
        let start: u32 = self.start_addr.into();
        let end: u32 = self.end_addr.into();
        u64::from(end.saturating_sub(start)) + 1
    }

    pub fn contains_addr(&self, addr: Ipv4Addr) -> bool {
        self.start_addr <= addr && addr <= self.end_addr
    }
}

/// First and last address of `network`.
///
/// The last address is the base with every bit outside the prefix forced to 1.
pub fn expand(network: &Ipv4Network) -> Ipv4Range {
    let base: u32 = u32::from(network.network());
    // A /32 has no host bits; `checked_shr` covers the shift-by-32 case.
    let host_mask: u32 = u32::MAX
        .checked_shr(u32::from(network.prefix()))
        .unwrap_or(0);

    Ipv4Range::new(Ipv4Addr::from(base), Ipv4Addr::from(base | host_mask))
}

/// Returns `true` when `inner` lies wholly inside `outer`.
///
/// `outer` must be equal or less specific, and the base of `inner` must fall
/// within the span of `outer`.
pub fn contains(outer: &Ipv4Network, inner: &Ipv4Network) -> bool {
    outer.prefix() <= inner.prefix() && expand(outer).contains_addr(inner.network())
}

/// Parses `a.b.c.d/p` into a canonical network.
///
/// The prefix is mandatory. Host bits in the base are cleared, so
/// `10.0.0.5/8` becomes `10.0.0.0/8`.
pub fn parse_cidr(s: &str) -> Result<Ipv4Network, RangeError> {
    let s = s.trim();
    let Some((ip_str, prefix_str)) = s.split_once('/') else {
        return Err(RangeError::MissingPrefix(s.to_string()));
    };

    let ip: Ipv4Addr = ip_str
        .parse()
        .map_err(|_| RangeError::InvalidAddress(s.to_string()))?;

    let prefix: u8 = prefix_str
        .parse()
        .map_err(|_| RangeError::InvalidPrefix(s.to_string()))?;

    canonical(ip, prefix).ok_or_else(|| RangeError::InvalidPrefix(s.to_string()))
}

/// Builds a network with host bits cleared, or `None` if `prefix > 32`.
pub fn canonical(ip: Ipv4Addr, prefix: u8) -> Option<Ipv4Network> {
    let network = Ipv4Network::new(ip, prefix).ok()?;
    Ipv4Network::new(network.network(), prefix).ok()
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝

#[cfg(test)]
mod tests {
    use super::*;

    fn net(s: &str) -> Ipv4Network {
        parse_cidr(s).unwrap()
    }

    #[test]
    fn expand_basic_24() {
        let range = expand(&net("192.168.0.0/24"));
        assert_eq!(range.start_addr, Ipv4Addr::new(192, 168, 0, 0));
        assert_eq!(range.end_addr, Ipv4Addr::new(192, 168, 0, 255));
    }

    #[test]
    fn expand_23_spans_two_blocks() {
        let range = expand(&net("192.168.2.0/23"));
        assert_eq!(range.start_addr, Ipv4Addr::new(192, 168, 2, 0));
        assert_eq!(range.end_addr, Ipv4Addr::new(192, 168, 3, 255));
    }

    #[test]
    fn expand_prefix_32_single_host() {
        let ip = Ipv4Addr::new(203, 0, 113, 7);
        let range = expand(&net("203.0.113.7/32"));
        assert_eq!(range.start_addr, ip);
        assert_eq!(range.end_addr, ip);
        assert_eq!(range.address_count(), 1);
    }

    #[test]
    fn expand_prefix_0_whole_space() {
        let range = expand(&net("0.0.0.0/0"));
        assert_eq!(range.start_addr, Ipv4Addr::UNSPECIFIED);
        assert_eq!(range.end_addr, Ipv4Addr::BROADCAST);
        assert_eq!(range.address_count(), 1 << 32);
    }

    #[test]
    fn contains_known_cases() {
        assert!(contains(&net("10.0.0.0/8"), &net("10.0.0.0/16")));
        assert!(!contains(&net("10.0.0.0/16"), &net("10.0.0.0/8")));
        assert!(!contains(&net("192.168.1.0/24"), &net("192.168.2.0/24")));
        assert!(!contains(&net("192.168.2.0/24"), &net("192.168.1.0/24")));
        assert!(!contains(&net("192.168.1.0/32"), &net("192.168.1.0/31")));
        assert!(!contains(&net("192.168.2.0/23"), &net("192.168.1.0/24")));
    }

    #[test]
    fn contains_degenerate_cases() {
        let host = net("10.1.2.3/32");
        assert!(contains(&host, &host));
        assert!(!contains(&host, &net("10.1.2.4/32")));

        let parent = net("192.168.2.0/23");
        assert!(contains(&parent, &net("192.168.2.0/24")));
        assert!(contains(&parent, &net("192.168.3.0/24")));
    }

    #[test]
    fn contains_implies_span_inclusion() {
        let nets: Vec<Ipv4Network> = [
            "0.0.0.0/0",
            "10.0.0.0/8",
            "10.0.0.0/16",
            "10.128.0.0/9",
            "10.200.3.0/24",
            "10.200.3.128/25",
            "10.200.3.255/32",
            "192.168.2.0/23",
            "192.168.3.0/24",
        ]
        .iter()
        .map(|s| net(s))
        .collect();

        for a in &nets {
            for b in &nets {
                if contains(a, b) {
                    let outer = expand(a);
                    let inner = expand(b);
                    assert!(outer.contains_addr(inner.start_addr), "{a} / {b}");
                    assert!(outer.contains_addr(inner.end_addr), "{a} / {b}");
                }
            }
        }
    }

    #[test]
    fn parse_cidr_normalises_host_bits() {
        let network = net("10.0.0.5/8");
        assert_eq!(network.network(), Ipv4Addr::new(10, 0, 0, 0));
        assert_eq!(network.ip(), Ipv4Addr::new(10, 0, 0, 0));
        assert_eq!(network.prefix(), 8);
    }

    #[test]
    fn parse_cidr_rejects_malformed() {
        assert!(matches!(parse_cidr("10.0.0.0"), Err(RangeError::MissingPrefix(_))));
        assert!(matches!(parse_cidr("999.1.2.3/24"), Err(RangeError::InvalidAddress(_))));
        assert!(matches!(parse_cidr("10.0.0.0/33"), Err(RangeError::InvalidPrefix(_))));
        assert!(matches!(parse_cidr("10.0.0.0/x"), Err(RangeError::InvalidPrefix(_))));
        assert!(parse_cidr("2001:db8::/32").is_err());
        assert!(parse_cidr("").is_err());
    }

    #[test]
    fn iter_stops_at_top_of_space() {
        let range = expand(&net("255.255.255.252/30"));
        let addrs: Vec<Ipv4Addr> = range.to_iter().collect();
        assert_eq!(addrs.len(), 4);
        assert_eq!(addrs.last(), Some(&Ipv4Addr::BROADCAST));
    }

    #[test]
    fn iter_does_not_borrow_the_range() {
        fn assert_owned<T: Send + 'static>(_: &T) {}

        let iter = {
            let range: Ipv4Range = expand(&net("10.0.0.0/30"));
            range.to_iter()
        };
        assert_owned(&iter);
        assert_eq!(iter.last(), Some(Ipv4Addr::new(10, 0, 0, 3)));
    }
}

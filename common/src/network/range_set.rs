//! # Range Set
//!
//! Collection of IPv4 networks reduced by subsumption. Insertion resolves
//! against the first related member only, which keeps resolution order-stable
//! for provider output. Built once from a provider's raw CIDR tokens, then
//! consumed as a lazy address stream by the scan pipeline.

use std::net::Ipv4Addr;

use pnet::ipnetwork::Ipv4Network;
use tracing::debug;

use crate::network::range::{self, contains, expand};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RangeSet {
    networks: Vec<Ipv4Network>,
}

impl RangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves raw CIDR tokens in input order.
    ///
    /// Tokens that fail to parse are skipped.
    pub fn from_cidrs<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::new();
        for token in tokens {
            let token = token.as_ref();
            match range::parse_cidr(token) {
                Ok(network) => {
                    set.insert(network);
                }
                Err(e) => debug!("Skipping range descriptor: {e}"),
            }
        }
        set
    }

    /// Inserts `network` while keeping the set minimal.
    ///
    /// The first existing member that contains `network` rejects it; otherwise
    /// the first member contained by `network` is replaced in place. If neither
    /// happens the network is appended. Returns `true` if the set changed.
    pub fn insert(&mut self, network: Ipv4Network) -> bool {
        for existing in self.networks.iter_mut() {
            if contains(existing, &network) {
                return false;
            }
            if contains(&network, existing) {
                *existing = network;
                return true;
            }
        }
        self.networks.push(network);
        true
    }

    pub fn len(&self) -> usize {
        self.networks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.networks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Ipv4Network> {
        self.networks.iter()
    }

    /// Number of addresses the set will enumerate.
    pub fn total_addresses(&self) -> u64 {
        self.networks
            .iter()
            .map(|network| expand(network).address_count())
            .sum()
    }

    /// Every address of every member, range by range, ascending within each.
    pub fn addresses(&self) -> impl Iterator<Item = Ipv4Addr> + '_ {
        self.networks
            .iter()
            .flat_map(|network| expand(network).to_iter())
    }

    /// Owning version of [`RangeSet::addresses`] that can be moved into a task.
    pub fn into_addresses(self) -> impl Iterator<Item = Ipv4Addr> + Send + 'static {
        self.networks
            .into_iter()
            .flat_map(|network| expand(&network).to_iter())
    }
}

impl FromIterator<Ipv4Network> for RangeSet {
    fn from_iter<T: IntoIterator<Item = Ipv4Network>>(iter: T) -> Self {
        let mut set = Self::new();
        for network in iter {
            set.insert(network);
        }
        set
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝

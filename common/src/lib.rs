//! Shared building blocks for `edgefind`: IPv4 range algebra, the minimal
//! [`network::RangeSet`] and the per-run [`config::Config`].

pub mod config;
pub mod network;

//! Scanning engine for `edgefind`.
//!
//! * [`provider`] turns an AS number into a [`edgefind_common::network::RangeSet`].
//! * [`network`] holds the two probes: a TCP liveness check and the
//!   `/cdn-cgi/trace` fingerprint.
//! * [`pipeline`] runs both probes over every enumerated address with a
//!   bounded worker pool per stage.

pub mod network;
pub mod pipeline;
pub mod probe;
pub mod provider;

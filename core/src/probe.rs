use std::net::Ipv4Addr;

use async_trait::async_trait;

/// A single pass/fail check run against one address.
///
/// Implementations swallow their own errors: anything that goes wrong while
/// probing simply means the address does not pass.
#[async_trait]
pub trait Probe: Send + Sync + 'static {
    async fn probe(&self, addr: Ipv4Addr) -> bool;
}

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use async_trait::async_trait;
use edgefind_common::config::Config;
use socket2::SockRef;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::trace;

use crate::probe::Probe;

/// TCP connect check: an address is alive if the handshake completes in time.
#[derive(Debug, Clone, Copy)]
pub struct LivenessProbe {
    port: u16,
    timeout: Duration,
}

impl LivenessProbe {
    pub fn new(port: u16, timeout: Duration) -> Self {
        Self { port, timeout }
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self::new(cfg.port, cfg.liveness_timeout)
    }
}

#[async_trait]
impl Probe for LivenessProbe {
    async fn probe(&self, addr: Ipv4Addr) -> bool {
        is_port_open(addr, self.port, self.timeout).await
    }
}

/// Single connection attempt, no retry. Refusals and timeouts both count as closed.
pub async fn is_port_open(addr: Ipv4Addr, port: u16, probe_timeout: Duration) -> bool {
    let socket_addr: SocketAddr = SocketAddr::new(IpAddr::V4(addr), port);

    match timeout(probe_timeout, TcpStream::connect(socket_addr)).await {
        Ok(Ok(stream)) => {
            abort(stream);
            true
        }
        Ok(Err(e)) => {
            trace!("{socket_addr} refused: {e}");
            false
        }
        Err(_elapsed) => {
            trace!("{socket_addr} timed out");
            false
        }
    }
}

/// Closes with `SO_LINGER = 0` so the kernel resets instead of lingering.
fn abort(stream: TcpStream) {
    if let Err(e) = SockRef::from(&stream).set_linger(Some(Duration::ZERO)) {
        trace!("failed to set linger: {e}");
    }
    drop(stream);
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝

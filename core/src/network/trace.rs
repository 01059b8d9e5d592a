//! # Trace Fingerprint
//!
//! Confirms that a live host is a reverse proxy serving a given origin.
//!
//! The probe opens TLS to the host with the origin's name as SNI, asks for
//! `/cdn-cgi/trace` with the same name in the `Host` header and looks for the
//! `h=<name>` line near the start of the body. Proxies that front the origin
//! echo the requested host there; anything else (wrong certificate, plain TCP
//! service, redirect page, different body) does not match.

use std::error::Error as StdError;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::pin::pin;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use edgefind_common::config::Config;
use futures::{Stream, StreamExt};
use reqwest::redirect::Policy;
use reqwest::{Certificate, Client, ClientBuilder};
use thiserror::Error;
use tracing::trace;

use crate::probe::Probe;

pub const TRACE_PATH: &str = "/cdn-cgi/trace";
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:83.0) Gecko/20100101 Firefox/93.0";

/// Bytes read on top of the server name. `fl=...\nh=<name>` fits inside.
const WINDOW_SLACK: usize = 20;

#[derive(Debug, Error)]
pub enum TraceError {
    #[error("failed to build HTTP client")]
    Client(#[source] reqwest::Error),
    #[error("trace request failed")]
    Request(#[source] reqwest::Error),
    #[error("failed reading trace body")]
    Body(#[source] Box<dyn StdError + Send + Sync>),
    #[error("trace body ended after {received} of {expected} bytes")]
    ShortRead { received: usize, expected: usize },
}

/// Per-run settings shared by every fingerprint probe.
#[derive(Debug, Clone)]
pub struct FingerprintConfig {
    pub server_name: String,
    pub port: u16,
    pub timeout: Duration,
    pub user_agent: String,
    /// Trusted in addition to the bundled web PKI roots.
    pub root_certificate: Option<Certificate>,
}

impl FingerprintConfig {
    pub fn new(server_name: impl Into<String>, port: u16, timeout: Duration) -> Self {
        Self {
            server_name: server_name.into(),
            port,
            timeout,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            root_certificate: None,
        }
    }

    pub fn with_root_certificate(mut self, cert: Certificate) -> Self {
        self.root_certificate = Some(cert);
        self
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self::new(cfg.server_name.clone(), cfg.port, cfg.fingerprint_timeout)
    }

    /// Number of body bytes inspected.
    pub fn window_len(&self) -> usize {
        WINDOW_SLACK + self.server_name.len()
    }

    /// Never carries a port, so `Host` is always the bare server name. The
    /// port travels with the resolver override instead.
    pub fn url(&self) -> String {
        format!("https://{}{TRACE_PATH}", self.server_name)
    }
}

#[derive(Debug, Clone)]
pub struct FingerprintProbe {
    config: Arc<FingerprintConfig>,
}

impl FingerprintProbe {
    pub fn new(config: Arc<FingerprintConfig>) -> Self {
        Self { config }
    }

    /// Runs one trace request against `addr`.
    ///
    /// The client is pinned to `addr:port` through a resolver override, so SNI,
    /// certificate validation and `Host` all use the configured server name.
    /// Redirects are not followed and no connection is kept for reuse.
    pub async fn check(&self, addr: Ipv4Addr) -> Result<bool, TraceError> {
        let cfg: &FingerprintConfig = &self.config;
        let target: SocketAddr = SocketAddr::new(IpAddr::V4(addr), cfg.port);

        let mut builder: ClientBuilder = Client::builder()
            .redirect(Policy::none())
            .pool_max_idle_per_host(0)
            .connect_timeout(cfg.timeout)
            .timeout(cfg.timeout)
            .user_agent(cfg.user_agent.as_str())
            .resolve(&cfg.server_name, target);
        if let Some(cert) = &cfg.root_certificate {
            builder = builder.add_root_certificate(cert.clone());
        }
        let client: Client = builder.build().map_err(TraceError::Client)?;

        let response = client
            .get(cfg.url())
            .send()
            .await
            .map_err(TraceError::Request)?;

        trace!("{addr} answered {}", response.status());

        // Dropping the stream mid-body discards the rest of the response.
        let window: Vec<u8> = read_window(response.bytes_stream(), cfg.window_len()).await?;
        Ok(matches_trace(&window, &cfg.server_name))
    }
}

#[async_trait]
impl Probe for FingerprintProbe {
    async fn probe(&self, addr: Ipv4Addr) -> bool {
        match self.check(addr).await {
            Ok(matched) => matched,
            Err(e) => {
                trace!("{addr} fingerprint failed: {e}");
                false
            }
        }
    }
}

/// Reads exactly `len` bytes from a chunked body.
///
/// Stops as soon as the window is full. A body that ends first is a short read.
pub async fn read_window<S, B, E>(body: S, len: usize) -> Result<Vec<u8>, TraceError>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: StdError + Send + Sync + 'static,
{
    let mut body = pin!(body);
    let mut window: Vec<u8> = Vec::with_capacity(len);

    while window.len() < len {
        match body.next().await {
            Some(Ok(chunk)) => {
                let chunk: &[u8] = chunk.as_ref();
                let take: usize = (len - window.len()).min(chunk.len());
                window.extend_from_slice(&chunk[..take]);
            }
            Some(Err(e)) => return Err(TraceError::Body(Box::new(e))),
            None => {
                return Err(TraceError::ShortRead {
                    received: window.len(),
                    expected: len,
                });
            }
        }
    }

    Ok(window)
}

/// `true` if `window` holds the `h=<server_name>` trace line.
pub fn matches_trace(window: &[u8], server_name: &str) -> bool {
    let marker: Vec<u8> = format!("h={server_name}").into_bytes();
    window
        .windows(marker.len())
        .any(|candidate| candidate == marker.as_slice())
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝

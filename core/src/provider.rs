//! # Range Providers
//!
//! Sources that map an autonomous system number to the IPv4 blocks it
//! announces. Providers only hand back raw CIDR tokens; [`resolve_asn`] turns
//! them into a minimal [`RangeSet`], silently dropping tokens that do not parse.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use edgefind_common::network::RangeSet;
use reqwest::Client;
use thiserror::Error;
use tracing::info;

mod ipip;
mod ipverse;

pub use ipip::IpipProvider;
pub use ipverse::IpverseProvider;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("failed to build HTTP client")]
    Client(#[source] reqwest::Error),
    #[error("HTTP error fetching {0}")]
    Http(String, #[source] reqwest::Error),
    #[error("{url} answered with status {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },
}

/// Looks up the raw CIDR tokens announced by an AS.
#[async_trait]
pub trait RangeProvider: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    async fn fetch(&self, asn: u32) -> Result<Vec<String>, ProviderError>;
}

/// Fetches the ranges of `asn` and reduces them to a minimal set.
pub async fn resolve_asn(
    provider: &dyn RangeProvider,
    asn: u32,
) -> Result<RangeSet, ProviderError> {
    let tokens: Vec<String> = provider.fetch(asn).await?;
    let ranges: RangeSet = RangeSet::from_cidrs(&tokens);

    info!(
        "{} listed {} ranges for AS{asn}, {} after merging",
        provider.name(),
        tokens.len(),
        ranges.len()
    );
    Ok(ranges)
}

/// Selects one of the built-in providers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProviderKind {
    /// Aggregated per-AS lists published by the ipverse project.
    #[default]
    Ipverse,
    /// The AS page of the ipip.net WHOIS site.
    Ipip,
}

impl ProviderKind {
    pub fn build(self) -> Result<Box<dyn RangeProvider>, ProviderError> {
        let client: Client = http_client()?;
        let provider: Box<dyn RangeProvider> = match self {
            ProviderKind::Ipverse => Box::new(IpverseProvider::new(client)),
            ProviderKind::Ipip => Box::new(IpipProvider::new(client)),
        };
        Ok(provider)
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ipverse" => Ok(ProviderKind::Ipverse),
            "ipip" => Ok(ProviderKind::Ipip),
            other => Err(format!("unknown provider '{other}' (expected ipverse or ipip)")),
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderKind::Ipverse => f.write_str("ipverse"),
            ProviderKind::Ipip => f.write_str("ipip"),
        }
    }
}

/// Client used for provider lookups: long timeouts, no pooled connections.
pub fn http_client() -> Result<Client, ProviderError> {
    Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .connect_timeout(CONNECT_TIMEOUT)
        .pool_max_idle_per_host(0)
        .build()
        .map_err(ProviderError::Client)
}

/// GETs `url` and returns the body as text. Non-success statuses are errors.
async fn fetch_text(client: &Client, url: &str) -> Result<String, ProviderError> {
    info!("Fetching {url}");
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| ProviderError::Http(url.to_string(), e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(ProviderError::Status {
            url: url.to_string(),
            status,
        });
    }

    response
        .text()
        .await
        .map_err(|e| ProviderError::Http(url.to_string(), e))
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝

use async_trait::async_trait;
use reqwest::Client;

use super::{ProviderError, RangeProvider, fetch_text};

const IPVERSE_BASE_URL: &str = "https://raw.githubusercontent.com/ipverse/asn-ip/master/as";

/// Plain-text aggregated prefix lists, one CIDR per line.
pub struct IpverseProvider {
    client: Client,
    base_url: String,
}

impl IpverseProvider {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            base_url: IPVERSE_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn url(&self, asn: u32) -> String {
        format!(
            "{}/{asn}/ipv4-aggregated.txt",
            self.base_url.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl RangeProvider for IpverseProvider {
    fn name(&self) -> &'static str {
        "ipverse"
    }

    async fn fetch(&self, asn: u32) -> Result<Vec<String>, ProviderError> {
        let body: String = fetch_text(&self.client, &self.url(asn)).await?;
        Ok(split_lines(&body))
    }
}

fn split_lines(body: &str) -> Vec<String> {
    body.lines().map(str::to_string).collect()
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝

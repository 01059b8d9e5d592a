use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;

use super::{ProviderError, RangeProvider, fetch_text};

const IPIP_BASE_URL: &str = "http://whois.ipip.net";
static CIDR_CELL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r">(\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3}/\d{1,3})<")
        .expect("CIDR cell pattern is valid")
});

/// Scrapes the prefix table of the ipip.net AS page.
pub struct IpipProvider {
    client: Client,
    base_url: String,
}

impl IpipProvider {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            base_url: IPIP_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn url(&self, asn: u32) -> String {
        format!("{}/AS{asn}", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl RangeProvider for IpipProvider {
    fn name(&self) -> &'static str {
        "ipip"
    }

    async fn fetch(&self, asn: u32) -> Result<Vec<String>, ProviderError> {
        let page: String = fetch_text(&self.client, &self.url(asn)).await?;
        Ok(extract_cidrs(&page))
    }
}

/// Pulls every `a.b.c.d/p` that sits alone between two HTML tags.
fn extract_cidrs(page: &str) -> Vec<String> {
    CIDR_CELL
        .captures_iter(page)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .collect()
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝

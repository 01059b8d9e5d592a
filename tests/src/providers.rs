#![cfg(test)]
use edgefind_core::provider::{self, IpipProvider, IpverseProvider, ProviderError, RangeProvider};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const IPVERSE_BODY: &str = "\
# AS64500 aggregated
10.0.0.0/16
10.0.0.0/8\r
192.0.2.0/24
not-a-range
198.51.100.7/24
";

const IPIP_PAGE: &str = r#"<html><body><table>
<tr><td><a href="/AS64500/203.0.113.0/24">203.0.113.0/24</a></td></tr>
<tr><td><a href="/AS64500/203.0.113.128/25">203.0.113.128/25</a></td></tr>
<tr><td><a href="/AS64500/198.18.0.0/15">198.18.0.0/15</a></td></tr>
</table></body></html>"#;

fn cidrs(provider_ranges: &edgefind_common::network::RangeSet) -> Vec<String> {
    provider_ranges.iter().map(|n| n.to_string()).collect()
}

#[tokio::test]
async fn ipverse_list_is_fetched_and_merged() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/as/64500/ipv4-aggregated.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string(IPVERSE_BODY))
        .mount(&server)
        .await;

    let provider = IpverseProvider::new(provider::http_client().unwrap())
        .with_base_url(format!("{}/as", server.uri()));
    let ranges = provider::resolve_asn(&provider, 64500).await.unwrap();

    assert_eq!(cidrs(&ranges), vec!["10.0.0.0/8", "192.0.2.0/24", "198.51.100.0/24"]);
}

#[tokio::test]
async fn ipip_page_is_scraped_and_merged() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/AS64500"))
        .respond_with(ResponseTemplate::new(200).set_body_string(IPIP_PAGE))
        .mount(&server)
        .await;

    let provider = IpipProvider::new(provider::http_client().unwrap()).with_base_url(server.uri());
    let tokens = provider.fetch(64500).await.unwrap();
    assert_eq!(tokens.len(), 3);

    let ranges = provider::resolve_asn(&provider, 64500).await.unwrap();
    assert_eq!(cidrs(&ranges), vec!["203.0.113.0/24", "198.18.0.0/15"]);
}

#[tokio::test]
async fn missing_asn_is_a_fatal_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404).set_body_string("404: Not Found"))
        .mount(&server)
        .await;

    let provider = IpverseProvider::new(provider::http_client().unwrap()).with_base_url(server.uri());
    let err = provider::resolve_asn(&provider, 1).await.unwrap_err();

    assert!(matches!(err, ProviderError::Status { .. }), "{err}");
}

#[tokio::test]
async fn unreachable_provider_is_a_fatal_error() {
    // Bind then release a port so nothing is listening on it.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let uri: String = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let provider = IpipProvider::new(provider::http_client().unwrap()).with_base_url(uri);
    let err = provider.fetch(64500).await.unwrap_err();

    assert!(matches!(err, ProviderError::Http(..)), "{err}");
}

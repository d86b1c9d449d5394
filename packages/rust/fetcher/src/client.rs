//! HTTP page fetcher.
//!
//! Issues a single GET per call with a browser-style user agent and a short
//! timeout, then reduces the page to its visible paragraph text. No retries.

use std::net::IpAddr;
use std::time::Duration;

use reqwest::redirect::Policy;
use reqwest::{Client, ClientBuilder};
use tracing::{debug, instrument, warn};
use url::Url;

use clariq_shared::{ClariqError, FetchConfig, Result};

use crate::extract::extract_paragraph_text;

/// Maximum number of redirects followed per request.
const MAX_REDIRECTS: usize = 5;

// ---------------------------------------------------------------------------
// ContentFetcher
// ---------------------------------------------------------------------------

/// Fetches a web page and returns its paragraph text.
#[derive(Debug, Clone)]
pub struct ContentFetcher {
    client: Client,
    /// Allow loopback/private targets (local mock servers, intranet use).
    allow_private_hosts: bool,
}

impl ContentFetcher {
    /// Create a fetcher from the `[fetch]` config section.
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = client_builder(config)
            .build()
            .map_err(|e| ClariqError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            allow_private_hosts: config.allow_private_hosts,
        })
    }

    /// GET `url` and return the joined text of its paragraphs.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn fetch(&self, url: &Url) -> Result<String> {
        if !self.allow_private_hosts && is_ssrf_target(url) {
            warn!("SSRF protection: blocked");
            return Err(ClariqError::validation(format!(
                "{url}: refusing to fetch a local or private address"
            )));
        }

        debug!("fetching page");

        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| ClariqError::Network(format!("{url}: {e}")))?;

        // Error pages still carry readable text.
        let status = response.status();
        if !status.is_success() {
            warn!(%status, "non-success status, extracting body anyway");
        }

        let body = response
            .text()
            .await
            .map_err(|e| ClariqError::Network(format!("{url}: body read failed: {e}")))?;

        let text = extract_paragraph_text(&body);
        debug!(
            body_len = body.len(),
            text_len = text.len(),
            "page text extracted"
        );
        Ok(text)
    }
}

/// Client settings shared by every fetcher built from `config`.
fn client_builder(config: &FetchConfig) -> ClientBuilder {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .redirect(redirect_policy(config.allow_private_hosts))
        .timeout(Duration::from_secs(config.timeout_secs))
}

// ---------------------------------------------------------------------------
// SSRF protection
// ---------------------------------------------------------------------------

/// Follow at most [`MAX_REDIRECTS`] hops, re-checking every hop target.
fn redirect_policy(allow_private_hosts: bool) -> Policy {
    Policy::custom(move |attempt| {
        if attempt.previous().len() > MAX_REDIRECTS {
            attempt.error("too many redirects")
        } else if !allow_private_hosts && is_ssrf_target(attempt.url()) {
            let message = format!(
                "redirect to {} refused: local or private address",
                attempt.url()
            );
            warn!("SSRF protection: redirect blocked");
            attempt.error(message)
        } else {
            attempt.follow()
        }
    })
}

/// Check if a URL targets a potentially dangerous resource.
pub(crate) fn is_ssrf_target(url: &Url) -> bool {
    // Block non-HTTP schemes
    match url.scheme() {
        "http" | "https" => {}
        _ => return true,
    }

    match url.host() {
        Some(url::Host::Ipv4(v4)) => is_private_ip(&IpAddr::V4(v4)),
        Some(url::Host::Ipv6(v6)) => is_private_ip(&IpAddr::V6(v6)),
        Some(url::Host::Domain(host)) => {
            host == "localhost"
                || host.ends_with(".localhost")
                || host.ends_with(".local")
                || host.ends_with(".internal")
        }
        None => true,
    }
}

/// Check if an IP is in a private/reserved range.
fn is_private_ip(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            v4.is_loopback()
                || v4.is_private()
                || v4.is_link_local()
                || v4.is_broadcast()
                || v4.is_unspecified()
                // 100.64.0.0/10 (Carrier-grade NAT)
                || (v4.octets()[0] == 100 && (v4.octets()[1] & 0xC0) == 64)
                // 192.0.0.0/24
                || (v4.octets()[0] == 192 && v4.octets()[1] == 0 && v4.octets()[2] == 0)
        }
        IpAddr::V6(v6) => v6.is_loopback() || v6.is_unspecified(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local_config() -> FetchConfig {
        FetchConfig {
            allow_private_hosts: true,
            ..FetchConfig::default()
        }
    }

    fn test_fetcher() -> ContentFetcher {
        ContentFetcher::new(&local_config()).expect("build fetcher")
    }

    /// A guarded fetcher that resolves `docs.example.com` to the mock server,
    /// so the first hop passes the SSRF check.
    fn public_alias_fetcher(server: &wiremock::MockServer) -> ContentFetcher {
        let client = client_builder(&FetchConfig::default())
            .resolve("docs.example.com", *server.address())
            .build()
            .expect("build client");
        ContentFetcher {
            client,
            allow_private_hosts: false,
        }
    }

    #[test]
    fn ssrf_protection_blocks_file() {
        let url = Url::parse("file:///etc/passwd").unwrap();
        assert!(is_ssrf_target(&url));
    }

    #[test]
    fn ssrf_protection_blocks_private_ip() {
        for raw in [
            "http://192.168.1.1/admin",
            "http://10.0.0.1/",
            "http://127.0.0.1:8080/",
            "http://[::1]:3000/",
        ] {
            let url = Url::parse(raw).unwrap();
            assert!(is_ssrf_target(&url), "{raw} should be blocked");
        }
    }

    #[test]
    fn ssrf_protection_allows_public() {
        let url = Url::parse("https://docs.example.com/page").unwrap();
        assert!(!is_ssrf_target(&url));
    }

    #[test]
    fn ssrf_blocks_localhost() {
        let url = Url::parse("http://localhost:3000/api").unwrap();
        assert!(is_ssrf_target(&url));
    }

    #[tokio::test]
    async fn default_fetcher_refuses_private_targets() {
        let fetcher = ContentFetcher::new(&FetchConfig::default()).unwrap();
        let url = Url::parse("http://127.0.0.1:9/").unwrap();
        let err = fetcher.fetch(&url).await.unwrap_err();
        assert!(err.to_string().contains("private address"));
    }

    #[tokio::test]
    async fn fetch_extracts_paragraphs_from_mock_server() {
        let server = wiremock::MockServer::start().await;

        let page = r#"<html><head><title>Docs</title>
            <script>var analytics = true;</script></head>
            <body>
                <nav><a href="/">Home</a></nav>
                <p>Rust is a systems programming language.</p>
                <p>   </p>
                <p>It guarantees memory safety.</p>
            </body></html>"#;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/docs"))
            .and(wiremock::matchers::header("user-agent", "Mozilla/5.0"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string(page))
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/docs", server.uri())).unwrap();
        let text = test_fetcher().fetch(&url).await.expect("fetch page");
        assert_eq!(
            text,
            "Rust is a systems programming language. It guarantees memory safety."
        );
    }

    #[tokio::test]
    async fn error_status_pages_still_yield_text() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::path("/gone"))
            .respond_with(
                wiremock::ResponseTemplate::new(404).set_body_string("<p>Page not found.</p>"),
            )
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/gone", server.uri())).unwrap();
        let text = test_fetcher().fetch(&url).await.expect("404 body is still read");
        assert_eq!(text, "Page not found.");
    }

    #[tokio::test]
    async fn redirect_to_loopback_is_refused() {
        let server = wiremock::MockServer::start().await;
        let port = server.address().port();

        wiremock::Mock::given(wiremock::matchers::path("/start"))
            .respond_with(
                wiremock::ResponseTemplate::new(302)
                    .insert_header("location", format!("http://127.0.0.1:{port}/secret")),
            )
            .mount(&server)
            .await;
        wiremock::Mock::given(wiremock::matchers::path("/secret"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string("<p>secret</p>"))
            .expect(0)
            .mount(&server)
            .await;

        let url = Url::parse(&format!("http://docs.example.com:{port}/start")).unwrap();
        let err = public_alias_fetcher(&server).fetch(&url).await.unwrap_err();
        assert!(matches!(err, ClariqError::Network(_)));
    }

    #[tokio::test]
    async fn redirect_between_public_hosts_is_followed() {
        let server = wiremock::MockServer::start().await;
        let port = server.address().port();

        wiremock::Mock::given(wiremock::matchers::path("/old"))
            .respond_with(
                wiremock::ResponseTemplate::new(301)
                    .insert_header("location", format!("http://docs.example.com:{port}/new")),
            )
            .mount(&server)
            .await;
        wiremock::Mock::given(wiremock::matchers::path("/new"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string("<p>Moved here.</p>"))
            .mount(&server)
            .await;

        let url = Url::parse(&format!("http://docs.example.com:{port}/old")).unwrap();
        let text = public_alias_fetcher(&server).fetch(&url).await.expect("follow redirect");
        assert_eq!(text, "Moved here.");
    }

    #[tokio::test]
    async fn fetch_times_out() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::path("/slow"))
            .respond_with(
                wiremock::ResponseTemplate::new(200)
                    .set_body_string("<p>late</p>")
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let config = FetchConfig {
            timeout_secs: 1,
            ..local_config()
        };
        let fetcher = ContentFetcher::new(&config).unwrap();
        let url = Url::parse(&format!("{}/slow", server.uri())).unwrap();
        let err = fetcher.fetch(&url).await.unwrap_err();
        assert!(matches!(err, ClariqError::Network(_)));
    }
}

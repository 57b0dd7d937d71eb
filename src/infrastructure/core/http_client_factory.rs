use anyhow::{Context, Result};
use reqwest::Client;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use std::time::Duration;
use url::Url;

pub struct HttpClientFactory;

impl HttpClientFactory {
    /// Creates a new HTTP client with retry middleware
    pub fn create_client() -> ClientWithMiddleware {
        Self::create_client_with(Duration::from_secs(30), 3)
    }

    /// Exponential backoff over transient failures, bounded per-request timeout.
    pub fn create_client_with(timeout: Duration, max_retries: u32) -> ClientWithMiddleware {
        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(max_retries);

        // Some market data endpoints reject requests without a user agent
        let client = Client::builder()
            .user_agent(concat!("stackcast/", env!("CARGO_PKG_VERSION")))
            .pool_max_idle_per_host(2)
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| Client::new());

        ClientBuilder::new(client)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build()
    }
}

/// Joins `path` onto `base_url` and appends percent-encoded query parameters.
///
/// reqwest-middleware's request builder has no `.query()`, so the URL is
/// built up front.
pub fn build_url_with_query<K, V>(base_url: &str, path: &str, params: &[(K, V)]) -> Result<Url>
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let base = Url::parse(base_url).with_context(|| format!("Invalid base URL: {}", base_url))?;
    let mut url = base
        .join(path)
        .with_context(|| format!("Invalid URL path: {}", path))?;

    if !params.is_empty() {
        let mut pairs = url.query_pairs_mut();
        for (k, v) in params {
            pairs.append_pair(k.as_ref(), v.as_ref());
        }
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_values_are_encoded() {
        let url = build_url_with_query(
            "https://query1.finance.yahoo.com",
            "/v8/finance/chart/EURUSD=X",
            &[("interval", "1d"), ("range", "5y")],
        )
        .unwrap();

        assert_eq!(url.path(), "/v8/finance/chart/EURUSD=X");
        assert_eq!(url.query(), Some("interval=1d&range=5y"));
    }

    #[test]
    fn test_invalid_base_url_is_error() {
        let empty: [(&str, &str); 0] = [];
        assert!(build_url_with_query("not a url", "/x", &empty).is_err());
    }
}

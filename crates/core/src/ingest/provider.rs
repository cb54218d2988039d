use crate::config::Settings;
use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::StatusCode;
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Raw vendor response. Status handling and body decoding are left to the caller so that
/// "not found", "wrong shape" and "empty" stay distinguishable.
#[derive(Debug, Clone)]
pub struct VendorResponse {
    pub status: StatusCode,
    pub body: String,
}

#[async_trait::async_trait]
pub trait VendorTransport: Send + Sync {
    fn vendor_name(&self) -> &'static str;

    /// GET `{base}/{segments...}`. Errors only on transport failure.
    async fn get(&self, segments: &[&str]) -> Result<VendorResponse>;
}

#[derive(Debug, Clone)]
pub struct QuiverHttpClient {
    http: reqwest::Client,
    base_url: reqwest::Url,
    api_key: String,
}

impl QuiverHttpClient {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let api_key = settings.require_quiver_api_key()?.to_string();

        let timeout_secs = std::env::var("QUIVER_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        Self::new(&settings.quiver_base_url, api_key, Duration::from_secs(timeout_secs))
    }

    pub fn new(base_url: &str, api_key: String, timeout: Duration) -> Result<Self> {
        let base_url = reqwest::Url::parse(base_url)
            .with_context(|| format!("invalid vendor base url: {base_url}"))?;
        anyhow::ensure!(
            !base_url.cannot_be_a_base(),
            "vendor base url cannot be a base: {base_url}"
        );

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build vendor http client")?;

        Ok(Self {
            http,
            base_url,
            api_key,
        })
    }

    fn url(&self, segments: &[&str]) -> Result<reqwest::Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("vendor base url cannot be a base"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Token {}", self.api_key))
                .context("QUIVER_API_KEY is not a valid header value")?,
        );
        Ok(headers)
    }
}

#[async_trait::async_trait]
impl VendorTransport for QuiverHttpClient {
    fn vendor_name(&self) -> &'static str {
        "quiver"
    }

    async fn get(&self, segments: &[&str]) -> Result<VendorResponse> {
        let url = self.url(segments)?;
        let headers = self.headers()?;

        let res = self
            .http
            .get(url.clone())
            .headers(headers)
            .send()
            .await
            .with_context(|| format!("vendor request failed: {url}"))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .with_context(|| format!("failed to read vendor response: {url}"))?;

        Ok(VendorResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> QuiverHttpClient {
        QuiverHttpClient::new(base, "secret".to_string(), Duration::from_secs(1)).unwrap()
    }

    #[test]
    fn builds_urls_under_base_path() {
        let c = client("https://api.quiverquant.com/beta");
        assert_eq!(
            c.url(&["companies"]).unwrap().as_str(),
            "https://api.quiverquant.com/beta/companies"
        );

        let c = client("https://api.quiverquant.com/beta/");
        assert_eq!(
            c.url(&["historical", "twitter", "AAPL"]).unwrap().as_str(),
            "https://api.quiverquant.com/beta/historical/twitter/AAPL"
        );
    }

    #[test]
    fn escapes_ticker_segments() {
        let c = client("https://api.quiverquant.com/beta");
        assert_eq!(
            c.url(&["historical", "twitter", "A/B C"]).unwrap().as_str(),
            "https://api.quiverquant.com/beta/historical/twitter/A%2FB%20C"
        );
    }

    #[test]
    fn sends_token_auth_header() {
        let headers = client("https://api.quiverquant.com/beta").headers().unwrap();
        assert_eq!(headers.get(AUTHORIZATION).unwrap(), "Token secret");
        assert_eq!(headers.get(ACCEPT).unwrap(), "application/json");
    }

    #[test]
    fn rejects_non_base_urls() {
        assert!(QuiverHttpClient::new("mailto:x@y.z", "k".into(), Duration::from_secs(1)).is_err());
    }
}

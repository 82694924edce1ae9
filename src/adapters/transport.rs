//! HTTP transport seam for the upstream ranking API.
//!
//! The fetch client only needs "GET this URL with these credentials"; keeping
//! that behind a trait lets the retry and caching logic run against a scripted
//! transport in tests.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, RETRY_AFTER};
use reqwest::Client;
use std::time::Duration;
use url::Url;

use crate::error::{FetchErrorKind, LeaderboardError, Result};

/// Status, `retry-after` header and body of one upstream response
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub retry_after: Option<String>,
    pub body: String,
}

impl TransportResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            retry_after: None,
            body: body.into(),
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            retry_after: None,
            body: String::new(),
        }
    }

    pub fn with_retry_after(mut self, value: impl Into<String>) -> Self {
        self.retry_after = Some(value.into());
        self
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// `retry-after` in milliseconds. Only the delta-seconds form is honoured.
    pub fn retry_after_ms(&self) -> Option<u64> {
        let secs = self.retry_after.as_deref()?.trim().parse::<f64>().ok()?;
        if secs.is_finite() && secs >= 0.0 {
            Some((secs * 1000.0).round() as u64)
        } else {
            None
        }
    }
}

#[async_trait]
pub trait UpstreamTransport: Send + Sync {
    /// Issue one authenticated GET. Transport-level failures (connect,
    /// timeout) are errors; any HTTP status is a response.
    async fn get(
        &self,
        url: &Url,
        api_key: &str,
    ) -> std::result::Result<TransportResponse, FetchErrorKind>;
}

/// Production transport backed by `reqwest`
#[derive(Clone)]
pub struct ReqwestTransport {
    http: Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .user_agent("wagerboard/0.1")
            .timeout(timeout)
            .build()
            .map_err(|e| {
                LeaderboardError::Internal(format!("failed to build upstream HTTP client: {}", e))
            })?;

        Ok(Self { http })
    }
}

#[async_trait]
impl UpstreamTransport for ReqwestTransport {
    async fn get(
        &self,
        url: &Url,
        api_key: &str,
    ) -> std::result::Result<TransportResponse, FetchErrorKind> {
        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static("api-key"),
            HeaderValue::from_str(api_key)
                .map_err(|e| FetchErrorKind::Malformed(format!("invalid api-key header: {}", e)))?,
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let resp = self.http.get(url.clone()).headers(headers).send().await?;
        let status = resp.status().as_u16();
        let retry_after = resp
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = resp.text().await?;

        Ok(TransportResponse {
            status,
            retry_after,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_after_parsing() {
        assert_eq!(
            TransportResponse::status(429)
                .with_retry_after("3")
                .retry_after_ms(),
            Some(3000)
        );
        assert_eq!(
            TransportResponse::status(503)
                .with_retry_after(" 1.5 ")
                .retry_after_ms(),
            Some(1500)
        );
        assert_eq!(
            TransportResponse::status(503)
                .with_retry_after("Wed, 21 Oct 2015 07:28:00 GMT")
                .retry_after_ms(),
            None
        );
        assert_eq!(TransportResponse::status(503).retry_after_ms(), None);
    }
}

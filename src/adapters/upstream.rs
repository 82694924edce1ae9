//! Upstream ranking API client.
//!
//! Two output shapes share one endpoint: `fetch_raw` returns the records as the
//! API sent them and retries 429/5xx with exponential backoff, `fetch_ranked`
//! normalizes them into [`PlayerRecord`]s and fails fast. Both consult a TTL
//! cache first and both degrade to an empty vector on failure.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rand::Rng;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use super::response_cache::ResponseCache;
use super::transport::{ReqwestTransport, UpstreamTransport};
use crate::config::UpstreamConfig;
use crate::domain::PlayerRecord;
use crate::error::{FetchErrorKind, Result};
use crate::services::RankedSource;

/// Which output shape a cache entry holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputShape {
    Raw,
    Ranked,
}

impl OutputShape {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Raw => "raw",
            Self::Ranked => "ranked",
        }
    }
}

pub struct FetchClient {
    config: UpstreamConfig,
    transport: Arc<dyn UpstreamTransport>,
    raw_cache: ResponseCache<Vec<Value>>,
    ranked_cache: ResponseCache<Vec<PlayerRecord>>,
}

impl FetchClient {
    /// Client backed by the production `reqwest` transport.
    pub fn new(config: UpstreamConfig) -> Result<Self> {
        let transport = ReqwestTransport::new(config.timeout())?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    pub fn with_transport(config: UpstreamConfig, transport: Arc<dyn UpstreamTransport>) -> Self {
        let ttl = config.cache_ttl();
        Self {
            config,
            transport,
            raw_cache: ResponseCache::new(ttl),
            ranked_cache: ResponseCache::new(ttl),
        }
    }

    /// Raw upstream records; empty when no data is available this cycle.
    pub async fn fetch_raw(&self) -> Vec<Value> {
        match self.try_fetch_raw().await {
            Ok(records) => records,
            Err(e) => {
                warn!("Raw upstream fetch returned no data: {}", e);
                Vec::new()
            }
        }
    }

    /// Normalized records; empty when no data is available this cycle.
    pub async fn fetch_ranked(&self) -> Vec<PlayerRecord> {
        match self.try_fetch_ranked().await {
            Ok(records) => records,
            Err(e) => {
                warn!("Ranked upstream fetch returned no data: {}", e);
                Vec::new()
            }
        }
    }

    pub async fn try_fetch_raw(&self) -> std::result::Result<Vec<Value>, FetchErrorKind> {
        let (api_key, code) = self.credentials()?;
        let key = self.cache_key(code, OutputShape::Raw)?;

        self.raw_cache
            .get_or_try_fill(&key, || async {
                let url = self.request_url(code, Some(Utc::now()))?;
                self.request_with_retry(&url, api_key).await
            })
            .await
    }

    pub async fn try_fetch_ranked(&self) -> std::result::Result<Vec<PlayerRecord>, FetchErrorKind> {
        let (api_key, code) = self.credentials()?;
        let key = self.cache_key(code, OutputShape::Ranked)?;

        self.ranked_cache
            .get_or_try_fill(&key, || async {
                let url = self.request_url(code, Some(Utc::now()))?;
                let raw = self.request_once(&url, api_key).await?;
                Ok::<_, FetchErrorKind>(normalize_records(&raw))
            })
            .await
    }

    fn credentials(&self) -> std::result::Result<(&str, &str), FetchErrorKind> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty());
        let code = self
            .config
            .partner_code
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty());

        match (api_key, code) {
            (Some(api_key), Some(code)) => Ok((api_key, code)),
            _ => Err(FetchErrorKind::MissingCredentials),
        }
    }

    /// `{base}?code&gt&lt&by&sort&take&skip`. `upper` is omitted when `None`.
    fn request_url(
        &self,
        code: &str,
        upper: Option<DateTime<Utc>>,
    ) -> std::result::Result<Url, FetchErrorKind> {
        let mut params: Vec<(&str, String)> = vec![
            ("code", code.to_string()),
            ("gt", self.config.since.clone()),
        ];
        if let Some(upper) = upper {
            params.push(("lt", upper.to_rfc3339_opts(SecondsFormat::Millis, true)));
        }
        params.push(("by", self.config.metric.clone()));
        params.push(("sort", self.config.sort.clone()));
        params.push(("take", self.config.page_size.to_string()));
        params.push(("skip", self.config.offset.to_string()));

        Url::parse_with_params(&self.config.base_url, &params)
            .map_err(|e| FetchErrorKind::Malformed(format!("invalid upstream URL: {}", e)))
    }

    /// The resolved URL without the moving `lt` bound, tagged with the shape.
    fn cache_key(
        &self,
        code: &str,
        shape: OutputShape,
    ) -> std::result::Result<String, FetchErrorKind> {
        let url = self.request_url(code, None)?;
        Ok(format!("{}#{}", url, shape.as_str()))
    }

    async fn request_once(
        &self,
        url: &Url,
        api_key: &str,
    ) -> std::result::Result<Vec<Value>, FetchErrorKind> {
        let resp = self.transport.get(url, api_key).await?;
        if !resp.is_success() {
            return Err(FetchErrorKind::from_status(resp.status, resp.retry_after_ms()));
        }
        parse_records(&resp.body)
    }

    async fn request_with_retry(
        &self,
        url: &Url,
        api_key: &str,
    ) -> std::result::Result<Vec<Value>, FetchErrorKind> {
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt: u32 = 0;

        loop {
            match self.request_once(url, api_key).await {
                Ok(records) => {
                    if attempt > 0 {
                        debug!("Upstream fetch succeeded after {} retries", attempt);
                    }
                    return Ok(records);
                }
                Err(e) if e.is_retryable() && attempt + 1 < max_attempts => {
                    let delay = backoff_delay(
                        attempt,
                        e.retry_after_ms(),
                        self.config.backoff_base_ms,
                        self.config.backoff_cap_ms,
                        jitter(self.config.jitter_max_ms),
                    );
                    warn!(
                        "Upstream fetch failed (attempt {}/{}): {}; retrying in {:?}",
                        attempt + 1,
                        max_attempts,
                        e,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[async_trait]
impl RankedSource for FetchClient {
    async fn fetch_ranked(&self) -> Vec<PlayerRecord> {
        FetchClient::fetch_ranked(self).await
    }
}

/// Delay before retrying after the `attempt`-th (0-based) failure:
/// `min(cap, base * 2^attempt)`, or the server's `retry-after`, plus jitter.
pub fn backoff_delay(
    attempt: u32,
    retry_after_ms: Option<u64>,
    base_ms: u64,
    cap_ms: u64,
    jitter_ms: u64,
) -> Duration {
    let exp = base_ms
        .saturating_mul(2u64.saturating_pow(attempt))
        .min(cap_ms);
    let delay = retry_after_ms.unwrap_or(exp);
    Duration::from_millis(delay.saturating_add(jitter_ms))
}

fn jitter(max_ms: u64) -> u64 {
    if max_ms == 0 {
        return 0;
    }
    rand::thread_rng().gen_range(0..=max_ms)
}

/// Accept either a bare array or `{ "data": [...] }`.
fn parse_records(body: &str) -> std::result::Result<Vec<Value>, FetchErrorKind> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| FetchErrorKind::Malformed(format!("invalid JSON body: {}", e)))?;

    match value {
        Value::Array(items) => Ok(items),
        Value::Object(mut obj) => match obj.remove("data") {
            Some(Value::Array(items)) => Ok(items),
            _ => Err(FetchErrorKind::Malformed(
                "object body without a `data` array".to_string(),
            )),
        },
        _ => Err(FetchErrorKind::Malformed(
            "body is neither an array nor an object".to_string(),
        )),
    }
}

/// Map raw upstream records onto [`PlayerRecord`]s.
///
/// - `id`: `uuid` → `id` → positional index
/// - `name`: `name` → `username` → `"Player {n}"` (1-based)
/// - `avatar`: `avatar` → `avatarUrl` → `image`
/// - `points`: `wagered` → `wager` → `points` → 0, numeric strings accepted
pub fn normalize_records(raw: &[Value]) -> Vec<PlayerRecord> {
    raw.iter()
        .enumerate()
        .map(|(idx, record)| {
            let id = first_string(record, &["uuid", "id"]).unwrap_or_else(|| idx.to_string());
            let name = first_string(record, &["name", "username"])
                .unwrap_or_else(|| format!("Player {}", idx + 1));
            let avatar = first_string(record, &["avatar", "avatarUrl", "image"]);
            let points = ["wagered", "wager", "points"]
                .iter()
                .find_map(|field| record.get(*field).filter(|v| !v.is_null()))
                .map(coerce_points)
                .unwrap_or(0.0);

            PlayerRecord {
                id,
                name,
                avatar,
                points,
            }
        })
        .collect()
}

fn first_string(record: &Value, fields: &[&str]) -> Option<String> {
    fields.iter().find_map(|field| match record.get(*field)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn coerce_points(value: &Value) -> f64 {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    };
    match parsed {
        Some(p) if p.is_finite() && p > 0.0 => p,
        _ => 0.0,
    }
}

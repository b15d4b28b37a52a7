use anyhow::{Context, Result};
use http::header::{HeaderMap, HeaderValue, USER_AGENT};
use http::StatusCode;
use serde::de::DeserializeOwned;
use std::fmt;
use std::time::Duration;
use tokio_retry::{strategy::ExponentialBackoff, RetryIf};

use super::cache::DiskCache;
use crate::config::ApiConfig;

/// Failures talking to hh.ru, classified so callers can pick an exit code
#[derive(Debug)]
pub enum ApiError {
    Unauthorized,
    Forbidden(String),
    NotFound(String),
    RateLimited,
    Status(u16, String),
    Network(String),
    /// The response arrived but its body could not be read
    Body(String),
    Decode(String),
}

impl ApiError {
    /// Worth retrying: transport failures, throttling and server errors
    pub fn is_transient(&self) -> bool {
        match self {
            ApiError::Network(_) | ApiError::Body(_) | ApiError::RateLimited => true,
            ApiError::Status(code, _) => *code >= 500,
            _ => false,
        }
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, ApiError::Unauthorized | ApiError::Forbidden(_))
    }

    /// Safe to retry a write: the request never reached hh.ru. Once a
    /// response arrives the write may have been applied.
    pub fn is_retryable_write(&self) -> bool {
        matches!(self, ApiError::Network(_))
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Unauthorized => write!(
                f,
                "Authentication failed. Your hh.ru token may be invalid or expired."
            ),
            ApiError::Forbidden(msg) => write!(f, "Access denied by hh.ru: {}", msg),
            ApiError::NotFound(path) => write!(f, "Not found on hh.ru: {}", path),
            ApiError::RateLimited => write!(
                f,
                "hh.ru rate limit exceeded. Wait a few minutes and try again."
            ),
            ApiError::Status(code, msg) => write!(f, "hh.ru API error ({}): {}", code, msg),
            ApiError::Network(msg) => write!(f, "Network error: {}", msg),
            ApiError::Body(msg) => write!(f, "Failed to read hh.ru response: {}", msg),
            ApiError::Decode(msg) => write!(f, "Unexpected response from hh.ru: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

/// Map a non-success status and its body to an ApiError.
/// hh.ru error bodies carry a `description` and an `errors` list.
pub fn classify_status(status: StatusCode, path: &str, body: &str) -> ApiError {
    let detail = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("description")
                .and_then(|d| d.as_str().map(str::to_string))
                .or_else(|| {
                    v.get("errors")
                        .and_then(|e| e.as_array())
                        .and_then(|errors| errors.first())
                        .and_then(|e| e.get("value").or_else(|| e.get("type")))
                        .and_then(|d| d.as_str().map(str::to_string))
                })
        })
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown").to_string());

    match status {
        StatusCode::UNAUTHORIZED => ApiError::Unauthorized,
        StatusCode::FORBIDDEN => ApiError::Forbidden(detail),
        StatusCode::NOT_FOUND => ApiError::NotFound(path.to_string()),
        StatusCode::TOO_MANY_REQUESTS => ApiError::RateLimited,
        other => ApiError::Status(other.as_u16(), detail),
    }
}

/// Authenticated hh.ru API client with optional GET response caching
#[derive(Clone)]
pub struct HhClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
    cache: Option<DiskCache>,
}

impl HhClient {
    pub fn new(token: &str, api: &ApiConfig, cache: Option<DiskCache>) -> Result<Self> {
        let agent = HeaderValue::from_str(&api.user_agent)
            .with_context(|| format!("Invalid api.user_agent '{}'", api.user_agent))?;

        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, agent.clone());
        headers.insert("HH-User-Agent", agent);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http,
            base_url: api.base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            cache,
        })
    }

    pub(crate) fn url(&self, path: &str, query: &[(&str, String)]) -> Result<reqwest::Url> {
        let raw = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        reqwest::Url::parse_with_params(&raw, query)
            .with_context(|| format!("Invalid API url '{}'", raw))
    }

    fn retry_strategy() -> impl Iterator<Item = Duration> {
        // Exponential backoff with 3 attempts
        ExponentialBackoff::from_millis(100)
            .max_delay(Duration::from_secs(5))
            .take(3)
    }

    /// GET a JSON resource, serving from cache when possible
    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        self.get(path, query, true).await
    }

    /// GET a JSON resource, always from the network (for data that changes
    /// between runs, such as negotiations)
    pub(crate) async fn get_json_fresh<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        self.get(path, query, false).await
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        cached: bool,
    ) -> Result<T> {
        let url = self.url(path, query)?;
        let key = url.to_string();
        let cache = self.cache.as_ref().filter(|_| cached);

        if let Some(body) = cache.and_then(|c| c.get(&key)) {
            tracing::debug!(url = %key, "cache hit");
            return decode(&body, path);
        }

        let body = RetryIf::spawn(
            Self::retry_strategy(),
            || async {
                tracing::debug!(url = %key, "GET");
                let response = self
                    .http
                    .get(url.clone())
                    .bearer_auth(&self.token)
                    .send()
                    .await
                    .map_err(|e| ApiError::Network(e.to_string()))?;
                read_body(response, path).await
            },
            |e: &ApiError| e.is_transient(),
        )
        .await?;

        if let Some(cache) = cache {
            cache.put(&key, &body);
        }

        decode(&body, path)
    }

    /// POST a JSON body. Returns the parsed response body, or None when hh.ru
    /// answers with an empty body (201/204).
    pub(crate) async fn post_json(
        &self,
        path: &str,
        payload: &serde_json::Value,
    ) -> Result<Option<serde_json::Value>> {
        let url = self.url(path, &[])?;

        // Writes are not idempotent, so only failed sends are retried
        let body = RetryIf::spawn(
            Self::retry_strategy(),
            || async {
                tracing::debug!(url = %url, "POST");
                let response = self
                    .http
                    .post(url.clone())
                    .bearer_auth(&self.token)
                    .json(payload)
                    .send()
                    .await
                    .map_err(|e| ApiError::Network(e.to_string()))?;
                read_body(response, path).await
            },
            |e: &ApiError| e.is_retryable_write(),
        )
        .await?;

        if body.trim().is_empty() {
            Ok(None)
        } else {
            decode(&body, path).map(Some)
        }
    }
}

async fn read_body(response: reqwest::Response, path: &str) -> Result<String, ApiError> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| ApiError::Body(e.to_string()))?;

    if status.is_success() {
        Ok(body)
    } else {
        Err(classify_status(status, path, &body))
    }
}

fn decode<T: DeserializeOwned>(body: &str, path: &str) -> Result<T> {
    serde_json::from_str(body)
        .map_err(|e| ApiError::Decode(format!("{}: {}", path, e)))
        .map_err(anyhow::Error::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base_url: &str) -> HhClient {
        let api = ApiConfig {
            base_url: base_url.to_string(),
            ..ApiConfig::default()
        };
        HhClient::new("token", &api, None).unwrap()
    }

    #[test]
    fn test_url_building() {
        let client = client("https://api.hh.ru/");
        let url = client
            .url(
                "/resumes",
                &[("text", "rust developer".to_string()), ("page", "2".to_string())],
            )
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.hh.ru/resumes?text=rust+developer&page=2"
        );
    }

    #[test]
    fn test_invalid_user_agent_rejected() {
        let api = ApiConfig {
            user_agent: "bad\nagent".to_string(),
            ..ApiConfig::default()
        };
        assert!(HhClient::new("token", &api, None).is_err());
    }

    #[test]
    fn test_classify_status() {
        assert!(matches!(
            classify_status(StatusCode::UNAUTHORIZED, "/resumes", ""),
            ApiError::Unauthorized
        ));
        assert!(matches!(
            classify_status(StatusCode::NOT_FOUND, "/resumes/x", ""),
            ApiError::NotFound(p) if p == "/resumes/x"
        ));
        assert!(classify_status(StatusCode::TOO_MANY_REQUESTS, "/", "").is_transient());
        assert!(classify_status(StatusCode::BAD_GATEWAY, "/", "").is_transient());
        assert!(!classify_status(StatusCode::BAD_REQUEST, "/", "").is_transient());
    }

    #[test]
    fn test_error_description_is_extracted() {
        let body = r#"{"description":"Forbidden","errors":[{"type":"forbidden","value":"no_paid_access"}]}"#;
        match classify_status(StatusCode::FORBIDDEN, "/resumes", body) {
            ApiError::Forbidden(msg) => assert_eq!(msg, "Forbidden"),
            other => panic!("unexpected {:?}", other),
        }

        let body = r#"{"errors":[{"type":"bad_argument","value":"salary_from"}]}"#;
        match classify_status(StatusCode::BAD_REQUEST, "/resumes", body) {
            ApiError::Status(400, msg) => assert_eq!(msg, "salary_from"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_writes_retry_only_unsent_requests() {
        assert!(ApiError::Network("connection refused".to_string()).is_retryable_write());
        assert!(!ApiError::Body("connection reset".to_string()).is_retryable_write());
        assert!(!ApiError::Status(502, "Bad Gateway".to_string()).is_retryable_write());
        assert!(!ApiError::RateLimited.is_retryable_write());

        // Reads may be retried after a broken body
        assert!(ApiError::Body("connection reset".to_string()).is_transient());
    }

    #[test]
    fn test_auth_errors() {
        assert!(ApiError::Unauthorized.is_auth());
        assert!(ApiError::Forbidden("x".to_string()).is_auth());
        assert!(!ApiError::RateLimited.is_auth());
    }
}

//! Thin reqwest wrapper bound to the orchestrator base URL.
//!
//! Every view in the original client carried its own ad-hoc `fetch` calls;
//! here they are factored into one place that owns URL joining, timeouts,
//! and normalization of the backend's `detail` error payload.

use crate::config::NetworkConfig;
use crate::error::{CortexError, Result};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use url::Url;

/// HTTP client for the orchestrator API.
pub struct HttpClient {
    client: Client,
    base_url: Url,
}

impl HttpClient {
    /// Create a client for the given base URL.
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)?;
        let client = Client::builder()
            .timeout(NetworkConfig::REQUEST_TIMEOUT)
            .user_agent(NetworkConfig::USER_AGENT)
            .build()
            .map_err(|e| CortexError::Network {
                message: format!("Failed to create HTTP client: {}", e),
                source: Some(e),
            })?;
        Ok(Self { client, base_url })
    }

    /// Create a client from `CORTEX_API_URL`, falling back to the default
    /// local backend address.
    pub fn from_env() -> Result<Self> {
        let base = std::env::var(NetworkConfig::BASE_URL_ENV)
            .unwrap_or_else(|_| NetworkConfig::DEFAULT_BASE_URL.to_string());
        Self::new(&base)
    }

    /// The configured base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| CortexError::InvalidUrl(format!("{}: {}", path, e)))
    }

    /// GET a JSON body, with query-string parameters.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        let url = self.endpoint(path)?;
        let response = self.client.get(url).query(query).send().await?;
        let response = Self::check_status(response).await?;
        Ok(response.json().await?)
    }

    /// POST a JSON body and parse a JSON response.
    pub async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        self.post_json_with_timeout(path, body, NetworkConfig::REQUEST_TIMEOUT)
            .await
    }

    /// POST with a per-request timeout override (query answers wait on a
    /// remote LLM and outlive the default timeout).
    pub async fn post_json_with_timeout<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        timeout: Duration,
    ) -> Result<T> {
        let url = self.endpoint(path)?;
        let response = self
            .client
            .post(url)
            .timeout(timeout)
            .json(body)
            .send()
            .await?;
        let response = Self::check_status(response).await?;
        Ok(response.json().await?)
    }

    /// POST without a body and parse a JSON response (clone, backup).
    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.endpoint(path)?;
        let response = self.client.post(url).send().await?;
        let response = Self::check_status(response).await?;
        Ok(response.json().await?)
    }

    /// POST a JSON body, discarding the response payload.
    pub async fn post_unit<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<()> {
        let url = self.endpoint(path)?;
        let response = self.client.post(url).json(body).send().await?;
        Self::check_status(response).await?;
        Ok(())
    }

    /// DELETE, discarding the response payload.
    pub async fn delete(&self, path: &str) -> Result<()> {
        let url = self.endpoint(path)?;
        let response = self.client.delete(url).send().await?;
        Self::check_status(response).await?;
        Ok(())
    }

    /// GET an absolute URL as raw bytes. Used by the document loader, whose
    /// targets may live on a different host than the API.
    pub async fn get_bytes_absolute(&self, url: &str) -> Result<bytes::Bytes> {
        let url = Url::parse(url).map_err(|e| CortexError::InvalidUrl(format!("{}: {}", url, e)))?;
        let response = self.client.get(url).send().await?;
        let response = Self::check_status(response).await?;
        Ok(response.bytes().await?)
    }

    async fn check_status(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(CortexError::Backend {
            status: status.as_u16(),
            detail: normalize_detail(status, &body),
        })
    }
}

/// Normalize a backend error body to a displayable string.
///
/// FastAPI reports errors as `{"detail": ...}` where `detail` may be a
/// string, an object, or a validation array. Anything unparseable falls
/// back to the raw body or the status line.
pub fn normalize_detail(status: StatusCode, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        if let Some(detail) = value.get("detail") {
            match detail {
                serde_json::Value::String(s) => return s.clone(),
                serde_json::Value::Null => {}
                other => return other.to_string(),
            }
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        trimmed.to_string()
    }
}

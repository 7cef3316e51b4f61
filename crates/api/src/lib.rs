//! HTTP client for pagewire remote endpoints.
//!
//! This module provides a lightweight client for the JSON-envelope endpoints
//! that back task re-runs, field reloads, and content replacement. It focuses
//! on:
//!
//! - Constructing an HTTP client with sensible defaults
//! - Validating the configured base URL for safety
//! - Posting a JSON payload and decoding the `{data, results, error}` envelope
//!
//! The primary entry point is [`PageClient`]. Create an instance via
//! [`PageClient::new`], then call [`PageClient::fetch_json`].

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use pagewire_types::Envelope;
use pagewire_util::join_url_params;
use reqwest::{Client, Url, header};
use serde_json::Value;
use tracing::debug;

/// Hostnames allowed to use plain HTTP for local development.
const LOCALHOST_DOMAINS: &[&str] = &["localhost", "127.0.0.1"];

/// Thin wrapper around a configured `reqwest::Client` for envelope endpoints.
///
/// The client pre-configures default headers, a request timeout, and a
/// consistent User-Agent, and resolves request paths against a validated
/// base URL.
#[derive(Debug, Clone)]
pub struct PageClient {
    pub base_url: String,
    pub http: Client,
    pub user_agent: String,
}

impl PageClient {
    /// Construct a [`PageClient`] against a validated base URL.
    ///
    /// Non-localhost hosts must use HTTPS; `localhost` and `127.0.0.1` may
    /// use plain HTTP.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        validate_base_url(&base_url)?;

        let mut default_headers = header::HeaderMap::new();
        default_headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));

        let http = Client::builder()
            .default_headers(default_headers)
            .timeout(Duration::from_secs(30))
            .build()
            .context("build http client")?;

        Ok(Self {
            base_url,
            http,
            user_agent: format!("pagewire/0.1; {}", std::env::consts::OS),
        })
    }

    /// POST `payload` to `url` (resolved against the base URL when relative,
    /// with `params` appended) and decode the response envelope.
    ///
    /// A non-2xx status is an error even before envelope inspection; an
    /// envelope with `data != "ok"` is returned as-is for the caller to
    /// classify, matching the convention that the envelope is the universal
    /// failure signal.
    pub async fn fetch_json(&self, url: &str, params: &str, payload: &Value) -> Result<Envelope> {
        let target = self.absolute_url(&join_url_params(url, params));
        debug!(%target, "posting interaction payload");

        let response = self
            .http
            .post(&target)
            .header(header::USER_AGENT, &self.user_agent)
            .json(payload)
            .send()
            .await
            .with_context(|| format!("network error calling {target}"))?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(anyhow!("HTTP {} from {}: {}", status.as_u16(), target, body));
        }

        serde_json::from_str::<Envelope>(&body)
            .with_context(|| format!("invalid response envelope from {target}"))
    }

    fn absolute_url(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") {
            url.to_string()
        } else {
            format!("{}/{}", self.base_url, url.trim_start_matches('/'))
        }
    }
}

/// Validate that a base URL is acceptable for use by the client.
///
/// Rules: the URL must parse, carry a host, and use HTTPS unless the host is
/// a localhost domain.
fn validate_base_url(base_url: &str) -> Result<()> {
    let parsed = Url::parse(base_url).with_context(|| format!("invalid base url: {base_url}"))?;
    let host = parsed
        .host_str()
        .ok_or_else(|| anyhow!("base url has no host: {base_url}"))?;

    let local = LOCALHOST_DOMAINS.contains(&host);
    if !local && parsed.scheme() != "https" {
        return Err(anyhow!("non-localhost base url must use https: {base_url}"));
    }
    Ok(())
}

//! Query API transport with retries.
//!
//! Everything above this layer sees either a successful raw XML body or a
//! terminal [`ServiceError`]; transient failures are retried here with
//! exponential backoff before they reach the decoders.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::Client;
use std::collections::BTreeMap;
use std::time::Duration;

use crate::config::{Ec2Config, RetryConfig, RetryMode};
use crate::error::{Ec2Result, ServiceError};

/// Characters left unescaped in Query API parameters (RFC 3986 unreserved).
const QUERY_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Sends one Query API action and returns the raw response body.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    async fn call(&self, action: &str, params: &BTreeMap<String, String>) -> Ec2Result<Bytes>;
}

/// HTTP transport: form-encoded POST to the configured endpoint.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: Client,
    endpoint: String,
    api_version: String,
    retry_config: RetryConfig,
    user_agent: String,
}

impl HttpTransport {
    pub fn new(config: &Ec2Config) -> Ec2Result<Self> {
        config
            .validate()
            .map_err(|msg| ServiceError::new("InvalidConfiguration", &msg, 0))?;

        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .pool_max_idle_per_host(10)
            .build()?;

        Ok(Self {
            http,
            endpoint: config.endpoint(),
            api_version: config.api_version.clone(),
            retry_config: config.retry.clone(),
            user_agent: config.user_agent.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// POST with retry on transient failures. The last attempt's error is
    /// returned once `max_attempts` is used up.
    async fn execute_with_retry(&self, action: &str, body: &str) -> Ec2Result<Bytes> {
        let max_attempts = self.retry_config.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            let error = match self.execute(body).await {
                Ok((status, bytes)) if (200..300).contains(&status) => return Ok(bytes),
                Ok((status, bytes)) => {
                    ServiceError::parse_xml_error(status, &String::from_utf8_lossy(&bytes))
                }
                Err(e) => e,
            }
            .with_action(action);

            attempt += 1;
            if !error.retryable || attempt >= max_attempts {
                return Err(error.into());
            }

            let delay = self.calculate_backoff(attempt - 1);
            log::warn!(
                "EC2 {} retryable error (attempt {}/{}): {} - retrying in {}ms",
                action,
                attempt,
                max_attempts,
                error.code,
                delay
            );
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
    }

    async fn execute(&self, body: &str) -> Result<(u16, Bytes), ServiceError> {
        let resp = self
            .http
            .post(&self.endpoint)
            .header(
                "content-type",
                "application/x-www-form-urlencoded; charset=utf-8",
            )
            .header("user-agent", &self.user_agent)
            .body(body.to_string())
            .send()
            .await?;

        let status = resp.status().as_u16();
        let request_id = resp
            .headers()
            .get("x-amzn-requestid")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = resp.bytes().await?;

        if !(200..300).contains(&status) {
            if let Some(id) = request_id {
                log::debug!("EC2 request {} returned HTTP {}", id, status);
            }
        }
        Ok((status, bytes))
    }

    /// Exponential backoff, optionally with full jitter.
    fn calculate_backoff(&self, attempt: u32) -> u64 {
        let base = self.retry_config.initial_backoff_ms;
        let max = self.retry_config.max_backoff_ms;
        let exponential = base.saturating_mul(2u64.saturating_pow(attempt));
        let capped = exponential.min(max);

        match self.retry_config.mode {
            RetryMode::Standard => {
                use rand::Rng;
                rand::thread_rng().gen_range(0..=capped)
            }
            RetryMode::Fixed => capped,
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn call(&self, action: &str, params: &BTreeMap<String, String>) -> Ec2Result<Bytes> {
        let mut all = build_query_params(action, &self.api_version);
        all.extend(params.iter().map(|(k, v)| (k.clone(), v.clone())));
        let body = encode_form(&all);
        log::debug!("EC2 {} -> {}", action, self.endpoint);
        self.execute_with_retry(action, &body).await
    }
}

/// Parameters every Query API request carries.
pub fn build_query_params(action: &str, version: &str) -> BTreeMap<String, String> {
    let mut params = BTreeMap::new();
    params.insert("Action".to_string(), action.to_string());
    params.insert("Version".to_string(), version.to_string());
    params.insert(
        "Timestamp".to_string(),
        Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string(),
    );
    params
}

/// Add `Name.1`, `Name.2`, … for a list argument.
pub fn add_indexed_params(params: &mut BTreeMap<String, String>, name: &str, values: &[String]) {
    for (i, value) in values.iter().enumerate() {
        params.insert(format!("{}.{}", name, i + 1), value.clone());
    }
}

/// `k=v&k=v` with RFC 3986 percent-encoding, in key order.
pub fn encode_form(params: &BTreeMap<String, String>) -> String {
    params
        .iter()
        .map(|(k, v)| {
            format!(
                "{}={}",
                utf8_percent_encode(k, QUERY_ENCODE_SET),
                utf8_percent_encode(v, QUERY_ENCODE_SET)
            )
        })
        .collect::<Vec<_>>()
        .join("&")
}

//! Endpoint, region and retry configuration for the EC2 client.

use serde::{Deserialize, Serialize};

/// Query API version the decoders are written against.
pub const DEFAULT_API_VERSION: &str = "2008-12-01";

/// Environment variable holding an endpoint override.
pub const ENV_ENDPOINT: &str = "EC2_URL";
/// Environment variable holding the region name.
pub const ENV_REGION: &str = "EC2_REGION";

// ── Regions ─────────────────────────────────────────────────────────────

/// Region configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Ec2Region {
    /// Region code (e.g., "us-east-1").
    pub name: String,
}

impl Ec2Region {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }

    /// The regional endpoint: `https://ec2.{region}.amazonaws.com`, with the
    /// `.com.cn` suffix for China partitions.
    pub fn endpoint(&self) -> String {
        if self.name.starts_with("cn-") {
            format!("https://ec2.{}.amazonaws.com.cn", self.name)
        } else {
            format!("https://ec2.{}.amazonaws.com", self.name)
        }
    }
}

impl Default for Ec2Region {
    fn default() -> Self {
        Self {
            name: "us-east-1".to_string(),
        }
    }
}

// ── Retry Configuration ─────────────────────────────────────────────────

/// Retry configuration for the transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts including the first one (default: 3).
    pub max_attempts: u32,
    pub mode: RetryMode,
    /// Initial backoff duration in milliseconds (default: 500).
    pub initial_backoff_ms: u64,
    /// Maximum backoff duration in milliseconds (default: 20_000).
    pub max_backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            mode: RetryMode::Standard,
            initial_backoff_ms: 500,
            max_backoff_ms: 20_000,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RetryMode {
    /// Exponential backoff with full jitter.
    Standard,
    /// Exponential backoff without jitter.
    Fixed,
}

// ── Client Config ───────────────────────────────────────────────────────

/// Everything the HTTP transport needs to reach an endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ec2Config {
    pub region: Ec2Region,
    /// Custom endpoint URL (Eucalyptus, LocalStack, a private cloud, …).
    pub endpoint_url: Option<String>,
    pub api_version: String,
    pub retry: RetryConfig,
    /// Request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Connect timeout in seconds.
    pub connect_timeout_secs: u64,
    pub user_agent: String,
}

impl Default for Ec2Config {
    fn default() -> Self {
        Self {
            region: Ec2Region::default(),
            endpoint_url: None,
            api_version: DEFAULT_API_VERSION.to_string(),
            retry: RetryConfig::default(),
            request_timeout_secs: 30,
            connect_timeout_secs: 10,
            user_agent: format!("sorng-ec2/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl Ec2Config {
    /// Defaults overridden by `EC2_URL` / `EC2_REGION` when set.
    pub fn from_environment() -> Self {
        let mut config = Self::default();
        if let Ok(region) = std::env::var(ENV_REGION) {
            if !region.trim().is_empty() {
                config.region = Ec2Region::new(region.trim());
            }
        }
        if let Ok(url) = std::env::var(ENV_ENDPOINT) {
            if !url.trim().is_empty() {
                config.endpoint_url = Some(url.trim().to_string());
            }
        }
        config
    }

    pub fn with_endpoint(mut self, url: &str) -> Self {
        self.endpoint_url = Some(url.to_string());
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// The endpoint requests are posted to.
    pub fn endpoint(&self) -> String {
        match self.endpoint_url {
            Some(ref url) => url.clone(),
            None => self.region.endpoint(),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.region.name.trim().is_empty() {
            return Err("Region is required".to_string());
        }
        if self.api_version.trim().is_empty() {
            return Err("API version is required".to_string());
        }
        if self.retry.max_attempts == 0 {
            return Err("Retry max_attempts must be at least 1".to_string());
        }
        if let Some(ref endpoint) = self.endpoint_url {
            let parsed = url::Url::parse(endpoint)
                .map_err(|e| format!("Invalid endpoint URL '{}': {}", endpoint, e))?;
            if parsed.scheme() != "http" && parsed.scheme() != "https" {
                return Err(format!(
                    "Endpoint URL '{}' must use http or https",
                    endpoint
                ));
            }
        }
        Ok(())
    }
}

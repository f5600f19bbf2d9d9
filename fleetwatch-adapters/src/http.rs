//! HTTP probes for health endpoints and JSON stats endpoints.
//!
//! Two kinds of readings are supported:
//!
//! - **Health**: a GET request whose status decides up/down. A refused
//!   connection counts as down, since a stopped server refuses connections.
//! - **Stats**: a numeric field of a JSON document, addressed by a JSON
//!   pointer (RFC 6901), e.g. `/connections/active`.
//!
//! ## Example
//!
//! ```rust,no_run
//! use fleetwatch_adapters::http::HttpProbe;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let probe = HttpProbe::builder()
//!         .timeout(Duration::from_secs(5))
//!         .build()?;
//!
//!     let up = probe.is_up("http://localhost:8080/health", None).await?;
//!     let active = probe
//!         .json_value("http://localhost:8080/stats", "/connections/active")
//!         .await?;
//!
//!     println!("up={} active={}", up, active);
//!     Ok(())
//! }
//! ```

use std::time::Duration;

use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use crate::AdapterError;

/// Default timeout for every HTTP request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Probe for HTTP health and stats endpoints.
#[derive(Debug, Clone)]
pub struct HttpProbe {
    client: Client,
    timeout: Duration,
}

impl HttpProbe {
    /// Create a new builder for configuring the probe.
    pub fn builder() -> HttpProbeBuilder {
        HttpProbeBuilder::default()
    }

    /// The per-request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns whether the endpoint is up.
    ///
    /// Up means the status equals `expect_status`, or is any 2xx when no
    /// status is expected. Only a refused connection reads as down; name
    /// resolution failures, timeouts and other transport failures are errors.
    pub async fn is_up(&self, url: &str, expect_status: Option<u16>) -> Result<bool, AdapterError> {
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(err) if is_connection_refused(&err) => {
                debug!(url, error = %err, "connection refused, treating endpoint as down");
                return Ok(false);
            }
            Err(err) => return Err(err.into()),
        };

        let status = response.status();
        let up = match expect_status {
            Some(expected) => status.as_u16() == expected,
            None => status.is_success(),
        };
        debug!(url, status = status.as_u16(), up, "health probe finished");
        Ok(up)
    }

    /// Fetch a JSON document and read the number at `pointer`.
    pub async fn json_value(&self, url: &str, pointer: &str) -> Result<f64, AdapterError> {
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(AdapterError::Http(format!(
                "API returned status {}",
                response.status()
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| AdapterError::Parse(e.to_string()))?;

        extract_number(&body, pointer)
    }
}

/// Whether the innermost I/O error behind a request failure is a refused
/// connection.
fn is_connection_refused(err: &reqwest::Error) -> bool {
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        if let Some(io) = cause.downcast_ref::<std::io::Error>() {
            if io.kind() == std::io::ErrorKind::ConnectionRefused {
                return true;
            }
        }
        source = cause.source();
    }
    false
}

/// Builder for [`HttpProbe`].
#[derive(Debug, Default)]
pub struct HttpProbeBuilder {
    timeout: Option<Duration>,
    user_agent: Option<String>,
    no_proxy: bool,
}

impl HttpProbeBuilder {
    /// Set the request timeout (default: 10 seconds).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the User-Agent header (default: `fleetwatch/<version>`).
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Bypass any proxy configured through the environment.
    pub fn no_proxy(mut self) -> Self {
        self.no_proxy = true;
        self
    }

    /// Build the probe.
    pub fn build(self) -> Result<HttpProbe, AdapterError> {
        let timeout = self.timeout.unwrap_or(DEFAULT_TIMEOUT);
        let user_agent = self
            .user_agent
            .unwrap_or_else(|| format!("fleetwatch/{}", env!("CARGO_PKG_VERSION")));

        let mut builder = Client::builder().timeout(timeout).user_agent(user_agent);
        if self.no_proxy {
            builder = builder.no_proxy();
        }

        let client = builder
            .build()
            .map_err(|e| AdapterError::Http(format!("failed to build HTTP client: {}", e)))?;

        Ok(HttpProbe { client, timeout })
    }
}

/// Read the number at a JSON pointer.
///
/// Numeric strings (as some stats endpoints emit) and booleans (`1`/`0`) are
/// accepted as well.
pub fn extract_number(body: &Value, pointer: &str) -> Result<f64, AdapterError> {
    let value = body
        .pointer(pointer)
        .ok_or_else(|| AdapterError::Parse(format!("no value at pointer '{}'", pointer)))?;

    match value {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| AdapterError::Parse(format!("'{}' is not representable as f64", n))),
        Value::String(s) => s.trim().parse::<f64>().map_err(|_| {
            AdapterError::Parse(format!("value at '{}' is not numeric: {:?}", pointer, s))
        }),
        Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        other => Err(AdapterError::Parse(format!(
            "value at '{}' is not numeric: {}",
            pointer, other
        ))),
    }
}

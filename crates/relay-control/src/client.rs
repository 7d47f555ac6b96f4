//! Relay control HTTP client.

use crate::error::RelayError;
use crate::types::*;
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use urlencoding::encode;

/// Control operations the relay exposes.
///
/// Every call is a remote call and may fail with [`RelayError::Unavailable`].
#[async_trait]
pub trait RelayControl: Send + Sync {
    /// Create the inbound. Fails with `Rejected` if the tag already exists.
    async fn configure_inbound(&self, inbound: &InboundSpec) -> Result<(), RelayError>;

    /// Remove an inbound. Fails with `NotFound` if the tag is unknown.
    async fn remove_inbound(&self, tag: &str) -> Result<(), RelayError>;

    /// Add a user entry to the inbound. The relay rejects duplicate keys.
    async fn activate_credential(
        &self,
        tag: &str,
        correlation_key: &str,
        secret: &str,
    ) -> Result<(), RelayError>;

    /// Remove a user entry. Removing an unknown key succeeds.
    async fn deactivate_credential(&self, tag: &str, correlation_key: &str)
        -> Result<(), RelayError>;

    /// Read every counter matching `pattern`. With `reset` the relay zeroes
    /// each returned counter as part of the same read.
    async fn query_counters(&self, pattern: &str, reset: bool)
        -> Result<Vec<CounterStat>, RelayError>;
}

/// Client for the relay control gateway.
#[derive(Clone, Debug)]
pub struct HttpRelayClient {
    client: Client,
    base_url: String,
}

impl HttpRelayClient {
    /// Create a client without probing the endpoint.
    pub fn new(base_url: impl Into<String>, request_timeout: Duration) -> Result<Self, RelayError> {
        let client = Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| RelayError::Unavailable(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Create a client and wait up to `connect_timeout` for the relay to answer.
    pub async fn connect(
        base_url: impl Into<String>,
        connect_timeout: Duration,
        request_timeout: Duration,
    ) -> Result<Self, RelayError> {
        let relay = Self::new(base_url, request_timeout)?;

        let health = relay
            .client
            .get(format!("{}/health", relay.base_url))
            .timeout(connect_timeout)
            .send()
            .await?;

        if !health.status().is_success() {
            return Err(RelayError::Unavailable(format!(
                "health check returned HTTP {}",
                health.status()
            )));
        }

        info!("Connected to relay control at {}", relay.base_url);
        Ok(relay)
    }

    /// Get the configured endpoint.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Check if the relay answers its health check.
    pub async fn health_check(&self) -> bool {
        self.client
            .get(format!("{}/health", self.base_url))
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }

    async fn check(&self, response: Response) -> Result<Response, RelayError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&text)
            .map(|b| b.error)
            .ok()
            .filter(|m| !m.is_empty())
            .unwrap_or(text);

        if status.is_server_error() {
            warn!("Relay returned {}: {}", status, message);
            return Err(RelayError::Unavailable(format!("HTTP {}: {}", status, message)));
        }
        if status == StatusCode::NOT_FOUND {
            return Err(RelayError::NotFound(message));
        }

        Err(RelayError::Rejected {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl RelayControl for HttpRelayClient {
    #[instrument(skip(self))]
    async fn configure_inbound(&self, inbound: &InboundSpec) -> Result<(), RelayError> {
        let request = ConfigureInboundRequest::vmess_ws(inbound);
        let response = self
            .client
            .put(format!("{}/v1/inbounds/{}", self.base_url, encode(&inbound.tag)))
            .json(&request)
            .send()
            .await?;
        self.check(response).await?;

        info!(
            "Configured inbound {} (port={}, path={})",
            inbound.tag, inbound.port, inbound.path
        );
        Ok(())
    }

    #[instrument(skip(self))]
    async fn remove_inbound(&self, tag: &str) -> Result<(), RelayError> {
        let response = self
            .client
            .delete(format!("{}/v1/inbounds/{}", self.base_url, encode(tag)))
            .send()
            .await?;
        self.check(response).await?;

        info!("Removed inbound {}", tag);
        Ok(())
    }

    #[instrument(skip(self, secret))]
    async fn activate_credential(
        &self,
        tag: &str,
        correlation_key: &str,
        secret: &str,
    ) -> Result<(), RelayError> {
        let request = AddUserRequest {
            email: correlation_key.to_string(),
            secret: secret.to_string(),
            level: 0,
            alter_id: 0,
        };
        let response = self
            .client
            .post(format!("{}/v1/inbounds/{}/users", self.base_url, encode(tag)))
            .json(&request)
            .send()
            .await?;
        self.check(response).await?;

        debug!("Activated {} on {}", correlation_key, tag);
        Ok(())
    }

    #[instrument(skip(self))]
    async fn deactivate_credential(
        &self,
        tag: &str,
        correlation_key: &str,
    ) -> Result<(), RelayError> {
        let response = self
            .client
            .delete(format!(
                "{}/v1/inbounds/{}/users/{}",
                self.base_url,
                encode(tag),
                encode(correlation_key)
            ))
            .send()
            .await?;

        match self.check(response).await {
            Ok(_) | Err(RelayError::NotFound(_)) => {
                debug!("Deactivated {} on {}", correlation_key, tag);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    #[instrument(skip(self))]
    async fn query_counters(
        &self,
        pattern: &str,
        reset: bool,
    ) -> Result<Vec<CounterStat>, RelayError> {
        let request = QueryStatsRequest {
            pattern: pattern.to_string(),
            reset,
        };
        let response = self
            .client
            .post(format!("{}/v1/stats/query", self.base_url))
            .json(&request)
            .send()
            .await?;
        let response = self.check(response).await?;

        let body = response.text().await?;
        let parsed: QueryStatsResponse = serde_json::from_str(&body)?;
        let stats: Vec<CounterStat> = parsed.stat.into_iter().flatten().collect();

        debug!("Queried {} counters (pattern={:?}, reset={})", stats.len(), pattern, reset);
        Ok(stats)
    }
}

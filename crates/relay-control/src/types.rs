//! Relay control API types.

use serde::{Deserialize, Serialize};

/// Listening endpoint that carries every user credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundSpec {
    pub tag: String,
    pub port: u16,
    /// Websocket path the inbound accepts upgrades on.
    pub path: String,
}

/// Create-inbound request body.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigureInboundRequest {
    pub port: u16,
    pub listen: String,
    pub protocol: String,
    pub transport: String,
    pub path: String,
    pub sniffing: Vec<String>,
}

impl ConfigureInboundRequest {
    /// Loopback vmess-over-websocket inbound with http/tls sniffing.
    pub fn vmess_ws(spec: &InboundSpec) -> Self {
        Self {
            port: spec.port,
            listen: "127.0.0.1".into(),
            protocol: "vmess".into(),
            transport: "websocket".into(),
            path: spec.path.clone(),
            sniffing: vec!["http".into(), "tls".into()],
        }
    }
}

/// Add-user request body.
#[derive(Debug, Clone, Serialize)]
pub struct AddUserRequest {
    pub email: String,
    pub secret: String,
    pub level: u32,
    pub alter_id: u32,
}

/// Stats query request body.
#[derive(Debug, Clone, Serialize)]
pub struct QueryStatsRequest {
    pub pattern: String,
    pub reset: bool,
}

/// Stats query response.
#[derive(Debug, Clone, Deserialize)]
pub struct QueryStatsResponse {
    #[serde(default)]
    pub stat: Vec<Option<CounterStat>>,
}

/// A named counter as reported by the relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterStat {
    pub name: String,
    /// Byte count. The relay reports signed values; negative ones never occur
    /// in practice and are clamped to zero on read.
    #[serde(deserialize_with = "non_negative")]
    pub value: u64,
}

impl CounterStat {
    pub fn new(name: impl Into<String>, value: u64) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

fn non_negative<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = i64::deserialize(deserializer)?;
    Ok(value.max(0) as u64)
}

/// Error body returned by the gateway.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: String,
}

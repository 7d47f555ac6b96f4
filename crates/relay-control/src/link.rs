//! Share-link rendering and relay naming conventions.

use base64::{engine::general_purpose::STANDARD, Engine};
use serde::Serialize;

/// Separator between the inbound tag and the credential id in a user key.
const KEY_SEPARATOR: char = '-';

/// Relay-visible user key ("email") for a credential on an inbound.
pub fn correlation_key(inbound_tag: &str, credential_id: &str) -> String {
    format!("{}{}{}", inbound_tag, KEY_SEPARATOR, credential_id)
}

/// Prefix every user key on `inbound_tag` starts with.
pub fn correlation_prefix(inbound_tag: &str) -> String {
    format!("{}{}", inbound_tag, KEY_SEPARATOR)
}

/// Counter pattern selecting the per-user counters of one inbound.
pub fn user_counter_pattern(inbound_tag: &str) -> String {
    format!("user>>>{}", correlation_prefix(inbound_tag))
}

/// Counter pattern selecting inbound-level aggregate counters.
pub fn inbound_counter_pattern() -> &'static str {
    "inbound>>>"
}

/// Client-facing endpoint settings used to render share links.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRenderer {
    /// Public domain, also used as SNI and websocket host.
    pub domain: String,
    /// Port clients connect to (usually the TLS front, 443).
    pub client_port: u16,
    pub path: String,
}

#[derive(Serialize)]
struct VmessShare<'a> {
    v: &'a str,
    ps: String,
    add: &'a str,
    port: String,
    id: &'a str,
    aid: &'a str,
    scy: &'a str,
    net: &'a str,
    #[serde(rename = "type")]
    kind: &'a str,
    host: &'a str,
    path: &'a str,
    tls: &'a str,
    sni: &'a str,
}

impl LinkRenderer {
    pub fn new(domain: impl Into<String>, client_port: u16, path: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            client_port,
            path: path.into(),
        }
    }

    /// Profile name shown in client apps: `{domain}_{first six of the id}`.
    pub fn profile_name(&self, credential_id: &str) -> String {
        let short = credential_id.get(..6).unwrap_or("123456");
        format!("{}_{}", self.domain, short)
    }

    /// `vmess://` share link carrying `secret` as the user id.
    pub fn link(&self, credential_id: &str, secret: &str) -> String {
        let share = VmessShare {
            v: "2",
            ps: self.profile_name(credential_id),
            add: &self.domain,
            port: self.client_port.to_string(),
            id: secret,
            aid: "0",
            scy: "auto",
            net: "ws",
            kind: "",
            host: &self.domain,
            path: &self.path,
            tls: "tls",
            sni: &self.domain,
        };

        // Serializing a struct of strings cannot fail.
        let json = serde_json::to_vec(&share).unwrap_or_default();
        format!("vmess://{}", STANDARD.encode(json))
    }

    /// Manual-setup description for clients that cannot import links.
    pub fn settings_text(&self, secret: &str) -> String {
        format!(
            "Protocol: vmess\n\
             Address: {domain}\n\
             SNI: {domain}\n\
             Port: <code>{port}</code>\n\
             User ID: <code>{secret}</code>\n\
             Security: tls\n\
             Transport: ws\n\
             Path: <code>{path}</code>",
            domain = self.domain,
            port = self.client_port,
            secret = secret,
            path = self.path,
        )
    }
}

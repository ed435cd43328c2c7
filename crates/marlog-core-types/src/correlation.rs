//! Correlation types for request tracking
//!
//! A `RequestId` ties every record emitted while serving one request
//! together. `RequestMeta` carries the ambient request facts a host
//! application binds to its logger (method, uri, peer, inbound ids).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a single request or operation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(String);

impl RequestId {
    /// Generate a new random RequestId using UUIDv7
    pub fn new() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    /// Get the string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Create from an existing string (for deserialization)
    pub fn from_string(s: String) -> Self {
        Self(s)
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ambient metadata of the request currently being served
///
/// Every field is optional; a CLI process or background job simply binds
/// nothing. `request_id_header` holds the inbound `X-Request-ID` (or
/// `X-Correlation-ID`) value when the peer supplied one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(rename = "ua", skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(skip)]
    pub request_id_header: Option<String>,
}

impl RequestMeta {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn with_ip(mut self, ip: impl Into<String>) -> Self {
        self.ip = Some(ip.into());
        self
    }

    pub fn with_user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Record the inbound correlation header value
    ///
    /// Empty values are ignored so that a blank header never wins over a
    /// generated id.
    pub fn with_request_id_header(mut self, value: impl Into<String>) -> Self {
        let value = value.into();
        if !value.trim().is_empty() {
            self.request_id_header = Some(value);
        }
        self
    }

    /// True when no request field is populated
    pub fn is_empty(&self) -> bool {
        self.method.is_none()
            && self.uri.is_none()
            && self.host.is_none()
            && self.ip.is_none()
            && self.user_agent.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_id_generation() {
        let id1 = RequestId::new();
        let id2 = RequestId::new();

        assert_ne!(id1, id2);
        assert!(!id1.as_str().is_empty());
    }

    #[test]
    fn test_request_id_display() {
        let id = RequestId::new();
        assert_eq!(format!("{}", id), id.as_str());
    }

    #[test]
    fn test_request_meta_builder() {
        let meta = RequestMeta::new()
            .with_method("POST")
            .with_uri("/login")
            .with_request_id_header("abc-123");

        assert_eq!(meta.method.as_deref(), Some("POST"));
        assert_eq!(meta.request_id_header.as_deref(), Some("abc-123"));
        assert!(!meta.is_empty());
    }

    #[test]
    fn test_blank_header_ignored() {
        let meta = RequestMeta::new().with_request_id_header("   ");
        assert!(meta.request_id_header.is_none());
        assert!(meta.is_empty());
    }

    #[test]
    fn test_request_meta_serialization_uses_short_ua_key() {
        let meta = RequestMeta::new().with_user_agent("curl/8.0");
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["ua"], "curl/8.0");
        assert!(json.get("method").is_none());
    }
}

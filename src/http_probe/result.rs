use std::net::IpAddr;

use serde::Serialize;

use super::endpoint::Scheme;

/// Outcome of probing one (endpoint, IP) pair. Failures are carried in `error`
/// rather than returned, so every probe produces exactly one of these.
#[derive(Debug, Clone, Serialize)]
pub struct ProbeResult {
    pub uri: String,
    pub ip: IpAddr,
    pub scheme: Scheme,
    pub http_status: Option<u16>,
    pub cert_days_remaining: Option<i64>,
    /// Seconds spent on the HTTP exchange.
    pub http_time: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProbeResult {
    pub fn new(uri: impl Into<String>, ip: IpAddr, scheme: Scheme) -> Self {
        Self {
            uri: uri.into(),
            ip,
            scheme,
            http_status: None,
            cert_days_remaining: None,
            http_time: 0.0,
            error: None,
        }
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

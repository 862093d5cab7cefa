use thiserror::Error;

/// Failure of a single unit of probing work.
///
/// Each variant is captured at the boundary of the task that produced it and turned
/// into report data; none of them ever aborts a sibling task or the coordinator.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// The input could not be turned into an http(s) URL, even after defaulting the scheme.
    #[error("malformed input '{input}': {reason}")]
    MalformedInput { input: String, reason: String },

    /// TCP connect failed or timed out.
    #[error("connect to {address} failed: {reason}")]
    Connect { address: String, reason: String },

    /// TLS handshake failed after a successful connect, or no usable leaf certificate.
    #[error("TLS handshake with {hostname} at {address} failed: {reason}")]
    Handshake {
        hostname: String,
        address: String,
        reason: String,
    },

    /// The HTTP exchange itself failed or timed out.
    #[error("request to {url} failed: {reason}")]
    Request { url: String, reason: String },
}

/// Startup failures: everything that happens before the first probe is scheduled.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read url list {path}")]
    ReadFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to fetch url list from {url}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("invalid url list YAML in {origin}")]
    Yaml {
        origin: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid DNS host '{host}'")]
    DnsHost {
        host: String,
        #[source]
        source: std::net::AddrParseError,
    },

    #[error("failed to load system resolver configuration")]
    SystemResolver(#[from] trust_dns_resolver::error::ResolveError),

    #[error("failed to build TLS connector")]
    Tls(#[from] native_tls::Error),
}

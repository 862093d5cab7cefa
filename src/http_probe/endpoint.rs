use std::fmt;
use std::future::Future;
use std::net::IpAddr;

use serde::Serialize;
use trust_dns_resolver::TokioAsyncResolver;
use url::{Host, Url};

use crate::error::ProbeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    Http,
    Https,
}

impl Scheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One input URL after normalisation. Built once per input, read-only afterwards.
#[derive(Debug, Clone)]
pub struct Endpoint {
    /// The input exactly as supplied, used on every report line.
    pub original_input: String,
    /// The input with `https://` prepended when it carried no scheme.
    pub normalized_url: String,
    pub url: Url,
    pub scheme: Scheme,
    /// Host with a non-default port appended, e.g. `example.com:8443`.
    pub hostname: String,
    /// Empty when the lookup failed.
    pub resolved_ips: Vec<IpAddr>,
}

impl Endpoint {
    /// Parses a raw input without touching the network.
    ///
    /// Inputs without a `scheme://` prefix are treated as https, never http.
    /// Only http and https URLs with a host are accepted.
    pub fn parse(raw_input: &str) -> Result<Endpoint, ProbeError> {
        let malformed = |reason: String| ProbeError::MalformedInput {
            input: raw_input.to_string(),
            reason,
        };

        let trimmed = raw_input.trim();
        if trimmed.is_empty() {
            return Err(malformed("empty input".to_string()));
        }

        let normalized_url = if has_scheme(trimmed) {
            trimmed.to_string()
        } else {
            format!("https://{trimmed}")
        };

        let url = Url::parse(&normalized_url).map_err(|e| malformed(e.to_string()))?;

        let scheme = match url.scheme() {
            "http" => Scheme::Http,
            "https" => Scheme::Https,
            other => return Err(malformed(format!("unsupported scheme '{other}'"))),
        };

        let host = url
            .host_str()
            .ok_or_else(|| malformed("missing host".to_string()))?;
        let hostname = match url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };

        Ok(Endpoint {
            original_input: raw_input.to_string(),
            normalized_url,
            scheme,
            hostname,
            url,
            resolved_ips: Vec::new(),
        })
    }

    /// Host without port or IPv6 brackets: what DNS is asked for and what SNI carries.
    pub fn server_name(&self) -> &str {
        self.url
            .host_str()
            .unwrap_or_default()
            .trim_start_matches('[')
            .trim_end_matches(']')
    }
}

/// True when `input` starts with `scheme://`. A `://` that only appears after the
/// first `/`, `?` or `#` belongs to the path, query or fragment.
fn has_scheme(input: &str) -> bool {
    match input.find("://") {
        Some(end) => !input[..end].contains(['/', '?', '#']),
        None => false,
    }
}

/// Forward (A/AAAA) address lookup.
pub trait Lookup: Send + Sync + 'static {
    /// Returns the addresses in resolver order. A failed lookup yields an empty list.
    fn lookup_ips(&self, host: &str) -> impl Future<Output = Vec<IpAddr>> + Send;
}

impl Lookup for TokioAsyncResolver {
    async fn lookup_ips(&self, host: &str) -> Vec<IpAddr> {
        match self.lookup_ip(host).await {
            Ok(lookup) => lookup.iter().collect(),
            Err(e) => {
                log::debug!("DNS lookup for {host} failed: {e}");
                Vec::new()
            }
        }
    }
}

/// Parses `raw_input` and resolves its host.
///
/// A lookup that finds nothing is not an error: the endpoint comes back with no
/// addresses and the caller reports it as unresolved. IP-literal hosts skip DNS.
pub async fn resolve<L: Lookup>(lookup: &L, raw_input: &str) -> Result<Endpoint, ProbeError> {
    let mut endpoint = Endpoint::parse(raw_input)?;

    endpoint.resolved_ips = match endpoint.url.host() {
        Some(Host::Ipv4(ip)) => vec![IpAddr::V4(ip)],
        Some(Host::Ipv6(ip)) => vec![IpAddr::V6(ip)],
        Some(Host::Domain(domain)) => lookup.lookup_ips(domain).await,
        None => Vec::new(),
    };

    Ok(endpoint)
}


#[cfg(test)]
mod tests {
    use super::test_support::StaticLookup;
    use super::*;

    #[test]
    fn missing_scheme_defaults_to_https() {
        let endpoint = Endpoint::parse("example.com").expect("valid input");
        assert_eq!(endpoint.scheme, Scheme::Https);
        assert_eq!(endpoint.normalized_url, "https://example.com");
        assert_eq!(endpoint.hostname, "example.com");
        assert_eq!(endpoint.original_input, "example.com");
    }

    #[test]
    fn scheme_separator_in_path_or_query_still_defaults_to_https() {
        let endpoint =
            Endpoint::parse("example.com/login?next=https://example.com/").expect("valid input");
        assert_eq!(endpoint.scheme, Scheme::Https);
        assert_eq!(
            endpoint.normalized_url,
            "https://example.com/login?next=https://example.com/"
        );
        assert_eq!(endpoint.hostname, "example.com");

        let endpoint = Endpoint::parse("example.com/r/http://x").expect("valid input");
        assert_eq!(endpoint.normalized_url, "https://example.com/r/http://x");
        assert_eq!(endpoint.server_name(), "example.com");

        let endpoint = Endpoint::parse("example.com#frag://x").expect("valid input");
        assert_eq!(endpoint.scheme, Scheme::Https);
    }

    #[test]
    fn explicit_http_is_kept() {
        let endpoint = Endpoint::parse("http://example.com/health").expect("valid input");
        assert_eq!(endpoint.scheme, Scheme::Http);
        assert_eq!(endpoint.normalized_url, "http://example.com/health");
    }

    #[test]
    fn non_default_port_stays_in_hostname() {
        let endpoint = Endpoint::parse("example.com:8443").expect("valid input");
        assert_eq!(endpoint.scheme, Scheme::Https);
        assert_eq!(endpoint.hostname, "example.com:8443");
        assert_eq!(endpoint.server_name(), "example.com");

        let endpoint = Endpoint::parse("https://example.com:443").expect("valid input");
        assert_eq!(endpoint.hostname, "example.com");
    }

    #[test]
    fn ipv6_server_name_has_no_brackets() {
        let endpoint = Endpoint::parse("http://[::1]:8080/").expect("valid input");
        assert_eq!(endpoint.hostname, "[::1]:8080");
        assert_eq!(endpoint.server_name(), "::1");
    }

    #[test]
    fn rejects_unparseable_and_foreign_inputs() {
        for input in ["", "   ", "https://exa mple.com", "ftp://example.com", "https://"] {
            match Endpoint::parse(input) {
                Err(ProbeError::MalformedInput { input: reported, .. }) => {
                    assert_eq!(reported, input)
                }
                other => panic!("expected malformed input for {input:?}, got {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn resolve_uses_lookup_for_domains() {
        let lookup = StaticLookup::default().with("example.org", &["93.184.216.34", "2606:2800::1"]);
        let endpoint = resolve(&lookup, "example.org").await.expect("valid input");
        assert_eq!(
            endpoint.resolved_ips,
            vec![
                "93.184.216.34".parse::<IpAddr>().unwrap(),
                "2606:2800::1".parse::<IpAddr>().unwrap()
            ]
        );
    }

    #[tokio::test]
    async fn resolve_failure_is_an_empty_endpoint() {
        let lookup = StaticLookup::default();
        let endpoint = resolve(&lookup, "nowhere.invalid").await.expect("valid input");
        assert!(endpoint.resolved_ips.is_empty());
        assert_eq!(endpoint.hostname, "nowhere.invalid");
    }

    #[tokio::test]
    async fn ip_literal_skips_lookup() {
        let lookup = StaticLookup::default();
        let endpoint = resolve(&lookup, "http://127.0.0.1:8080").await.expect("valid input");
        assert_eq!(endpoint.resolved_ips, vec!["127.0.0.1".parse::<IpAddr>().unwrap()]);
    }
}

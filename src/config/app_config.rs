use std::path::PathBuf;
use std::{net::IpAddr, time::Duration};

use clap::Parser;
use tokio_native_tls::TlsConnector as TokioTlsConnector;
use trust_dns_resolver::{
    TokioAsyncResolver,
    config::{NameServerConfig, NameServerConfigGroup, Protocol, ResolverConfig, ResolverOpts},
};

use super::url_list::UrlList;
use crate::error::ConfigError;
use crate::report::OutputFormat;

/// Probe every resolved IP of each URL for its HTTP status and TLS certificate expiry.
#[derive(Debug, Parser)]
#[command(version, about)]
pub struct Args {
    /// Load the url list from a YAML file with a `urls` key
    #[arg(long, env = "DATAFILE")]
    pub datafile: Option<PathBuf>,

    /// Load the url list from a YAML document served at this URL
    #[arg(long, env = "DATAURL")]
    pub dataurl: Option<String>,

    /// Additional URLs to probe, appended after the loaded lists
    pub urls: Vec<String>,

    /// Comma separated nameserver IPs; the system resolver configuration is used when empty
    #[arg(long, env = "DNS_HOSTS", value_delimiter = ',')]
    pub dns_hosts: Vec<String>,

    /// Connect, handshake and request timeout in seconds
    #[arg(long, env = "PROBE_TIMEOUT", default_value_t = 5)]
    pub timeout: u64,

    /// Maximum number of probes in flight, 0 for unbounded
    #[arg(long, env = "MAX_IN_FLIGHT", default_value_t = 0)]
    pub max_in_flight: usize,

    /// Output format for probe results
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Accept invalid certificates on the HTTP request (expiry is always read unverified)
    #[arg(long)]
    pub insecure: bool,
}

pub struct AppConfig {
    pub urls: Vec<String>,
    pub dns_hosts: Vec<String>,
    pub timeout: Duration,
    pub max_in_flight: usize,
    pub format: OutputFormat,
    pub insecure: bool,
}

/// Builds the run configuration from parsed arguments.
///
/// The url list is the file list, then the remote list, then positional URLs, in that
/// order. Either source failing to load is fatal: there is nothing sensible to probe.
pub async fn load_config(args: Args) -> Result<AppConfig, ConfigError> {
    let timeout = Duration::from_secs(args.timeout);
    let mut urls = Vec::new();

    if let Some(path) = &args.datafile {
        let list = UrlList::from_file(path)?;
        log::info!("Loaded {} urls from {}", list.urls.len(), path.display());
        urls.extend(list.urls);
    }

    if let Some(dataurl) = &args.dataurl {
        let list = UrlList::from_url(dataurl, timeout).await?;
        log::info!("Loaded {} urls from {}", list.urls.len(), dataurl);
        urls.extend(list.urls);
    }

    urls.extend(args.urls);

    let dns_hosts: Vec<String> = args
        .dns_hosts
        .iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    if dns_hosts.is_empty() {
        log::info!("Using system DNS configuration");
    } else {
        log::info!("Using DNS hosts: {:?}", dns_hosts);
    }

    Ok(AppConfig {
        urls,
        dns_hosts,
        timeout,
        max_in_flight: args.max_in_flight,
        format: args.format,
        insecure: args.insecure,
    })
}

/// Setup a TLS connector that accepts invalid certificates and mismatched hostnames,
/// so the certificate inspector can read the expiry of any chain.
pub fn setup_tls_connector() -> Result<TokioTlsConnector, ConfigError> {
    let mut builder = native_tls::TlsConnector::builder();
    builder.danger_accept_invalid_certs(true);
    builder.danger_accept_invalid_hostnames(true);
    let connector = builder.build()?;
    Ok(TokioTlsConnector::from(connector))
}

/// Setup a DNS resolver.
///
/// With no `dns_hosts` the system configuration (`/etc/resolv.conf` and friends) is
/// used. Otherwise the given nameservers are queried over TCP with 2 attempts each.
/// No lookup timeout is set beyond the resolver's own default.
pub fn setup_resolver(dns_hosts: &[String]) -> Result<TokioAsyncResolver, ConfigError> {
    if dns_hosts.is_empty() {
        return Ok(TokioAsyncResolver::tokio_from_system_conf()?);
    }

    let mut opts = ResolverOpts::default();
    opts.attempts = 2;
    opts.cache_size = 1024;

    let mut name_servers = NameServerConfigGroup::new();

    for host in dns_hosts {
        let ip: IpAddr = host.parse().map_err(|source| ConfigError::DnsHost {
            host: host.clone(),
            source,
        })?;
        name_servers.push(NameServerConfig {
            socket_addr: (ip, 53).into(),
            protocol: Protocol::Tcp,
            tls_dns_name: None,
            trust_negative_responses: false,
            bind_addr: None,
        });
    }

    let resolver_config = ResolverConfig::from_parts(None, vec![], name_servers);
    Ok(TokioAsyncResolver::tokio(resolver_config, opts))
}

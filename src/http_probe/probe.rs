use std::net::{IpAddr, SocketAddr};
use std::time::{Duration, Instant};

use reqwest::{Client, redirect};
use tokio_native_tls::TlsConnector as TokioTlsConnector;

use super::cert::TLS_PORT;
use super::prelude::*;
use super::report;

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Probes a single resolved address of an endpoint.
///
/// Cheap to clone: the TLS connector is reference counted and an HTTP client is built
/// per probe, because the address override is part of the client.
#[derive(Clone)]
pub struct Prober {
    connector: TokioTlsConnector,
    timeout: Duration,
    accept_invalid_certs: bool,
    cert_port: u16,
}

impl Prober {
    pub fn new(connector: TokioTlsConnector, timeout: Duration) -> Self {
        Self {
            connector,
            timeout,
            accept_invalid_certs: false,
            cert_port: TLS_PORT,
        }
    }

    /// Also skip certificate verification on the HTTP request itself. The certificate
    /// inspector never verifies, regardless of this setting.
    pub fn accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    /// Port the certificate is read from on each address, `TLS_PORT` unless set.
    pub fn cert_port(mut self, port: u16) -> Self {
        self.cert_port = port;
        self
    }

    /// A client whose DNS for the endpoint's host answers with `ip` only.
    ///
    /// The request URL keeps the hostname, so the Host header and TLS SNI are those of
    /// the endpoint while the socket goes to `ip`. Port 0 in the override makes the
    /// connector use the URL's port. Proxies are bypassed so the address is really hit.
    fn client_for(&self, endpoint: &Endpoint, ip: IpAddr) -> reqwest::Result<Client> {
        Client::builder()
            .timeout(self.timeout)
            .connect_timeout(self.timeout)
            .redirect(redirect::Policy::none())
            .no_proxy()
            .resolve(endpoint.server_name(), SocketAddr::new(ip, 0))
            .danger_accept_invalid_certs(self.accept_invalid_certs)
            .user_agent(USER_AGENT)
            .build()
    }

    /// GETs the endpoint through `ip`, then for https reads the certificate served at
    /// the same address. Always returns a result; failures land in `error`.
    ///
    /// The certificate is only inspected after a successful request, and a failed
    /// inspection keeps the HTTP status that was already obtained.
    pub async fn probe(&self, endpoint: &Endpoint, ip: IpAddr) -> ProbeResult {
        let mut result = ProbeResult::new(endpoint.original_input.clone(), ip, endpoint.scheme);

        let client = match self.client_for(endpoint, ip) {
            Ok(client) => client,
            Err(e) => {
                let err = ProbeError::Request {
                    url: endpoint.normalized_url.clone(),
                    reason: report(&e),
                };
                return result.with_error(err.to_string());
            }
        };

        let start = Instant::now();
        let response = client.get(endpoint.url.clone()).send().await;
        result.http_time = start.elapsed().as_secs_f64();

        match response {
            Ok(response) => result.http_status = Some(response.status().as_u16()),
            Err(e) => {
                let err = self.request_error(endpoint, ip, &e);
                log::debug!("{} via {ip}: {err}", endpoint.original_input);
                return result.with_error(err.to_string());
            }
        }

        if endpoint.scheme == Scheme::Https {
            let cert_addr = SocketAddr::new(ip, self.cert_port);
            match inspect_certificate(
                &self.connector,
                endpoint.server_name(),
                cert_addr,
                self.timeout,
            )
            .await
            {
                Ok(days) => result.cert_days_remaining = Some(days),
                Err(e) => {
                    log::debug!("{} via {ip}: {e}", endpoint.original_input);
                    result.error = Some(e.to_string());
                }
            }
        }

        result
    }

    fn request_error(&self, endpoint: &Endpoint, ip: IpAddr, e: &reqwest::Error) -> ProbeError {
        if e.is_connect() {
            let port = endpoint.url.port_or_known_default().unwrap_or_default();
            ProbeError::Connect {
                address: SocketAddr::new(ip, port).to_string(),
                reason: report(e),
            }
        } else if e.is_timeout() {
            ProbeError::Request {
                url: endpoint.normalized_url.clone(),
                reason: format!("timed out after {:?}", self.timeout),
            }
        } else {
            ProbeError::Request {
                url: endpoint.normalized_url.clone(),
                reason: report(e),
            }
        }
    }
}

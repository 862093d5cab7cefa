use std::net::SocketAddr;
use std::time::Duration;

use chrono::Utc;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_native_tls::TlsConnector as TokioTlsConnector;
use x509_parser::parse_x509_certificate;

use super::report;
use crate::error::ProbeError;

pub const TLS_PORT: u16 = 443;

const SECONDS_PER_HOUR: f64 = 3600.0;
const HOURS_PER_DAY: f64 = 24.0;

/// Reads the leaf certificate served at `socket_addr` for `hostname` and returns the
/// days left until it expires (negative once expired).
///
/// The prober passes the resolved IP with `TLS_PORT` by default. The handshake presents `hostname` as
/// SNI but is pinned to that address. The connector is expected to skip trust
/// validation (see `setup_tls_connector`), so an untrusted or mismatched chain still
/// yields its expiry. Both connect and handshake are bounded by `timeout_duration`;
/// there is a single attempt.
pub async fn inspect_certificate(
    connector: &TokioTlsConnector,
    hostname: &str,
    socket_addr: SocketAddr,
    timeout_duration: Duration,
) -> Result<i64, ProbeError> {
    let address = socket_addr.to_string();

    let stream = match timeout(timeout_duration, TcpStream::connect(socket_addr)).await {
        Ok(Ok(stream)) => stream,
        Ok(Err(e)) => {
            return Err(ProbeError::Connect {
                address,
                reason: e.to_string(),
            });
        }
        Err(_) => {
            return Err(ProbeError::Connect {
                address,
                reason: format!("timed out after {timeout_duration:?}"),
            });
        }
    };

    let handshake_failed = |reason: String| ProbeError::Handshake {
        hostname: hostname.to_string(),
        address: address.clone(),
        reason,
    };

    // Dropping `tls_stream` on any return below closes the session and the socket.
    let tls_stream = match timeout(timeout_duration, connector.connect(hostname, stream)).await {
        Ok(Ok(tls_stream)) => tls_stream,
        Ok(Err(e)) => return Err(handshake_failed(report(&e))),
        Err(_) => {
            return Err(handshake_failed(format!(
                "timed out after {timeout_duration:?}"
            )));
        }
    };

    let cert = tls_stream
        .get_ref()
        .peer_certificate()
        .map_err(|e| handshake_failed(e.to_string()))?
        .ok_or_else(|| handshake_failed("server sent no certificate".to_string()))?;
    let cert_der = cert
        .to_der()
        .map_err(|e| handshake_failed(e.to_string()))?;

    let not_after = not_after_timestamp(&cert_der).map_err(handshake_failed)?;

    Ok(days_remaining(not_after, Utc::now().timestamp()))
}

/// `NotAfter` of a DER certificate as a unix timestamp.
pub(crate) fn not_after_timestamp(cert_der: &[u8]) -> Result<i64, String> {
    let (_, parsed) =
        parse_x509_certificate(cert_der).map_err(|e| format!("invalid leaf certificate: {e}"))?;
    Ok(parsed.validity().not_after.timestamp())
}

/// Days until `not_after`, both given as unix timestamps.
///
/// Computed as `-round(hours_since_expiry / 24)`. Rounding is `f64::round`, i.e. to
/// the nearest day with ties away from zero: 2.5 days left reports 3, 2.5 days past
/// reports -3.
pub fn days_remaining(not_after: i64, now: i64) -> i64 {
    let hours_since_expiry = (now - not_after) as f64 / SECONDS_PER_HOUR;
    -((hours_since_expiry / HOURS_PER_DAY).round() as i64)
}

//! Request inspection.
//!
//! Pulls the client address, host, origin and cookies out of a request
//! header for the session guard.

use pingora::http::RequestHeader;
use std::net::IpAddr;

/// Resolves the caller's address. With `trust_forwarded` the right-most
/// `X-Forwarded-For` entry, the one appended by the trusted front proxy,
/// wins over the socket peer. Earlier entries are client-controlled.
#[must_use]
pub fn resolve_client_ip(
    req: &RequestHeader,
    peer_ip: Option<IpAddr>,
    trust_forwarded: bool,
) -> Option<IpAddr> {
    if trust_forwarded
        && let Some(ip) = req
            .headers
            .get_all("X-Forwarded-For")
            .iter()
            .next_back()
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.rsplit(',').next())
            .and_then(|v| v.trim().parse().ok())
    {
        return Some(ip);
    }
    peer_ip
}

/// `Host` header, falling back to the URI authority.
#[must_use]
pub fn request_host(req: &RequestHeader) -> Option<String> {
    req.headers
        .get("Host")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .map(str::to_string)
        .or_else(|| req.uri.authority().map(|a| a.as_str().to_string()))
}

/// Scheme and host for absolute redirects. Empty without a host, which
/// turns redirects into path-only `Location` values.
#[must_use]
pub fn request_origin(
    req: &RequestHeader,
    host: &str,
    default_scheme: &str,
    trust_forwarded: bool,
) -> String {
    if host.is_empty() {
        return String::new();
    }

    let forwarded = trust_forwarded
        .then(|| {
            req.headers
                .get("X-Forwarded-Proto")
                .and_then(|v| v.to_str().ok())
                .map(|v| v.trim().to_ascii_lowercase())
        })
        .flatten()
        .filter(|scheme| scheme == "http" || scheme == "https");

    let scheme = forwarded.as_deref().unwrap_or(default_scheme);
    format!("{scheme}://{host}")
}

/// All `Cookie` headers joined into one, as HTTP/2 clients may split them.
#[must_use]
pub fn cookie_header(req: &RequestHeader) -> Option<String> {
    let parts: Vec<&str> = req
        .headers
        .get_all("Cookie")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .collect();

    (!parts.is_empty()).then(|| parts.join("; "))
}

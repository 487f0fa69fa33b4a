//! Request handlers, grouped by resource.

pub mod auth;
pub mod devices;
pub mod events;
pub mod health;
pub mod locations;

use std::net::{IpAddr, SocketAddr};

use axum::http::HeaderMap;

/// Best-effort origin IP of a request.
///
/// The field uplink terminates behind a carrier-grade NAT proxy, so the
/// first `X-Forwarded-For` entry is preferred over the socket peer when
/// present and parseable.
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> Option<IpAddr> {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .and_then(|v| v.trim().parse::<IpAddr>().ok());

    forwarded.or_else(|| peer.map(|addr| addr.ip()))
}

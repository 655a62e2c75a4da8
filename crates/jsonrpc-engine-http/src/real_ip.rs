//! Client address resolution behind proxies

use std::net::IpAddr;

use async_trait::async_trait;
use http::HeaderMap;
use http::request::Parts;
use tracing::debug;

use jsonrpc_engine::{GlobalMiddleware, JsonRpcErrorObject, RequestContext};

const X_FORWARDED_FOR: &str = "x-forwarded-for";
const X_REAL_IP: &str = "x-real-ip";

/// Address of the calling client, kept in the request extensions.
///
/// The HTTP handler stores the socket peer here; [`RealIp`] replaces it with
/// the address reported by a reverse proxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientAddr(pub IpAddr);

impl ClientAddr {
    pub fn from_parts(parts: &Parts) -> Option<IpAddr> {
        parts.extensions.get::<ClientAddr>().map(|addr| addr.0)
    }

    /// Client address as seen by a handler
    pub fn from_context(ctx: &RequestContext) -> Option<IpAddr> {
        Self::from_parts(ctx.transport())
    }
}

/// Global middleware that rewrites [`ClientAddr`] from `X-Forwarded-For`
/// or `X-Real-IP`.
///
/// The first public address in `X-Forwarded-For` wins; private, loopback
/// and link-local hops are skipped. `X-Real-IP` is used when no public
/// forwarded address exists. Without either header the peer address is
/// left untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct RealIp;

#[async_trait]
impl GlobalMiddleware for RealIp {
    async fn before_dispatch(&self, parts: &mut Parts) -> Result<(), JsonRpcErrorObject> {
        if let Some(ip) = real_ip(&parts.headers) {
            debug!(client = %ip, "client address from proxy headers");
            parts.extensions.insert(ClientAddr(ip));
        }
        Ok(())
    }
}

/// Resolve the client address reported by proxy headers
pub fn real_ip(headers: &HeaderMap) -> Option<IpAddr> {
    let forwarded = headers
        .get_all(X_FORWARDED_FOR)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .filter_map(|hop| hop.trim().parse::<IpAddr>().ok())
        .find(|ip| !is_private(ip));

    forwarded.or_else(|| {
        headers
            .get(X_REAL_IP)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse().ok())
    })
}

fn is_private(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            v4.is_private() || v4.is_loopback() || v4.is_link_local() || v4.is_unspecified()
        }
        IpAddr::V6(v6) => {
            v6.is_loopback()
                || v6.is_unspecified()
                || v6.is_unique_local()
                || v6.is_unicast_link_local()
        }
    }
}

//! Access guard for internal routes.
//!
//! The proxy in front of the gateway reports the client address in
//! `X-Real-IP`. Internal routes only answer clients inside the configured
//! trusted subnet; with no subnet configured they answer nobody.

use crate::error::{AppError, Result};
use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use ipnet::IpNet;
use std::net::IpAddr;

pub const REAL_IP_HEADER: &str = "x-real-ip";

fn real_ip(headers: &HeaderMap) -> Option<IpAddr> {
    headers
        .get(REAL_IP_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse().ok())
}

/// Whether `headers` name a client inside `subnet`.
pub fn is_trusted(subnet: Option<&IpNet>, headers: &HeaderMap) -> bool {
    match (subnet, real_ip(headers)) {
        (Some(subnet), Some(ip)) => subnet.contains(&ip),
        _ => false,
    }
}

/// Middleware rejecting clients outside the trusted subnet with `403`.
pub async fn require_trusted_subnet(
    State(subnet): State<Option<IpNet>>,
    request: Request,
    next: Next,
) -> Result<Response> {
    if !is_trusted(subnet.as_ref(), request.headers()) {
        return Err(AppError::Forbidden(format!(
            "{} is not in the trusted subnet",
            request.uri().path()
        )));
    }
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(ip: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(REAL_IP_HEADER, HeaderValue::from_static(ip));
        headers
    }

    #[test]
    fn addresses_inside_subnet_are_trusted() {
        let subnet: IpNet = "192.168.1.0/24".parse().unwrap();

        assert!(is_trusted(Some(&subnet), &headers("192.168.1.17")));
        assert!(!is_trusted(Some(&subnet), &headers("192.168.2.17")));
        assert!(!is_trusted(Some(&subnet), &headers("not-an-ip")));
        assert!(!is_trusted(Some(&subnet), &HeaderMap::new()));
    }

    #[test]
    fn ipv6_subnets_are_supported() {
        let subnet: IpNet = "fd00::/8".parse().unwrap();

        assert!(is_trusted(Some(&subnet), &headers("fd12::1")));
        assert!(!is_trusted(Some(&subnet), &headers("10.0.0.1")));
    }

    #[test]
    fn nothing_is_trusted_without_subnet() {
        assert!(!is_trusted(None, &headers("127.0.0.1")));
    }
}

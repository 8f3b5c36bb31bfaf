//! Client address resolution behind reverse proxies
//!
//! `X-Forwarded-For` is read right to left: the last `trusted_proxy_count` entries were
//! appended by our own proxies, and the leftmost of those is the address the outermost
//! proxy saw, i.e. the client. Entries further left came from the client and are ignored.
//! With no trusted proxies the forwarding headers are ignored and the socket peer is used.

use axum::extract::{ConnectInfo, Request};
use axum::http::HeaderMap;
use std::net::{IpAddr, SocketAddr};

/// Best-effort client IP for a request, or `"unknown"`.
pub fn client_ip(request: &Request, trusted_proxy_count: usize) -> String {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    resolve_client_ip(request.headers(), peer, trusted_proxy_count)
        .map(|ip| ip.to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

pub fn resolve_client_ip(
    headers: &HeaderMap,
    peer: Option<SocketAddr>,
    trusted_proxy_count: usize,
) -> Option<IpAddr> {
    if trusted_proxy_count == 0 {
        return peer.map(|addr| addr.ip());
    }

    header_str(headers, "x-forwarded-for")
        .and_then(|chain| from_forwarded_chain(chain, trusted_proxy_count))
        .or_else(|| header_str(headers, "x-real-ip").and_then(|v| v.trim().parse().ok()))
        .or_else(|| peer.map(|addr| addr.ip()))
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|h| h.to_str().ok())
}

fn from_forwarded_chain(chain: &str, trusted_proxy_count: usize) -> Option<IpAddr> {
    let hops: Vec<&str> = chain
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    // Fewer hops than trusted proxies means the chain did not pass through all of them.
    let index = hops.len().checked_sub(trusted_proxy_count)?;
    hops.get(index)?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn xff(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_str(value).unwrap());
        headers
    }

    fn ip(s: &str) -> Option<IpAddr> {
        Some(s.parse().unwrap())
    }

    #[test]
    fn test_client_is_the_hop_appended_by_the_outermost_proxy() {
        assert_eq!(resolve_client_ip(&xff("203.0.113.9"), None, 1), ip("203.0.113.9"));
        assert_eq!(
            resolve_client_ip(&xff("10.9.1.2, 198.51.100.7"), None, 1),
            ip("198.51.100.7")
        );
        assert_eq!(
            resolve_client_ip(&xff("198.51.100.1, 203.0.113.9, 10.0.0.1"), None, 2),
            ip("203.0.113.9")
        );
    }

    #[test]
    fn test_forged_left_hops_do_not_change_the_client() {
        for forged in ["1.1.1.1", "10.0.0.5, 8.8.8.8", "garbage"] {
            let chain = format!("{}, 198.51.100.7", forged);
            assert_eq!(resolve_client_ip(&xff(&chain), None, 1), ip("198.51.100.7"));
        }
    }

    #[test]
    fn test_short_chain_falls_back() {
        let peer: SocketAddr = "192.0.2.10:5000".parse().unwrap();
        assert_eq!(
            resolve_client_ip(&xff("203.0.113.9"), Some(peer), 2),
            ip("192.0.2.10")
        );
    }

    #[test]
    fn test_no_trusted_proxies_uses_socket_peer_only() {
        let peer: SocketAddr = "192.0.2.10:5000".parse().unwrap();
        let mut headers = xff("203.0.113.9");
        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.3"));
        assert_eq!(resolve_client_ip(&headers, Some(peer), 0), ip("192.0.2.10"));
        assert_eq!(resolve_client_ip(&headers, None, 0), None);
    }

    #[test]
    fn test_fallbacks() {
        let mut headers = xff("not-an-ip");
        headers.insert("x-real-ip", HeaderValue::from_static("192.0.2.4"));
        assert_eq!(resolve_client_ip(&headers, None, 1), ip("192.0.2.4"));

        let peer: SocketAddr = "127.0.0.1:4000".parse().unwrap();
        assert_eq!(resolve_client_ip(&HeaderMap::new(), Some(peer), 1), ip("127.0.0.1"));
        assert_eq!(resolve_client_ip(&HeaderMap::new(), None, 1), None);
    }
}

//! Outbound host checks for fetches against tenant-supplied domains.
//!
//! A host is refused when its name is an internal one, or when any address it resolves to
//! is private, loopback, link-local or otherwise not publicly routable.

use std::net::{IpAddr, Ipv6Addr};
use tokio::net::lookup_host;

const INTERNAL_SUFFIXES: &[&str] = &[".local", ".internal", ".corp", ".localhost", ".home.arpa"];

/// Rejects `host` unless it names a public machine. Resolves the name so a public-looking
/// domain pointing at an internal address is refused too.
pub async fn ensure_public_host(host: &str, port: u16) -> Result<(), String> {
    let host = host.trim().trim_end_matches('.').to_ascii_lowercase();
    if host.is_empty() {
        return Err("Host must not be empty".to_string());
    }

    if let Ok(ip) = host.parse::<IpAddr>() {
        return ensure_public_addrs(&[ip]);
    }

    if is_internal_name(&host) {
        return Err(format!("Internal hostname '{}' is not allowed", host));
    }

    let resolved: Vec<IpAddr> = match lookup_host((host.as_str(), port)).await {
        Ok(addrs) => addrs.map(|addr| addr.ip()).collect(),
        Err(e) => {
            tracing::warn!(host = %host, error = %e, "DNS resolution failed for outbound check");
            return Err(format!("Hostname '{}' could not be resolved", host));
        }
    };
    if resolved.is_empty() {
        return Err(format!("Hostname '{}' has no addresses", host));
    }
    ensure_public_addrs(&resolved)
}

pub fn ensure_public_addrs(addrs: &[IpAddr]) -> Result<(), String> {
    match addrs.iter().find(|ip| is_private_ip(ip)) {
        Some(ip) => Err(format!("Host resolves to a private or internal address: {}", ip)),
        None => Ok(()),
    }
}

fn is_internal_name(host: &str) -> bool {
    host == "localhost"
        || !host.contains('.')
        || INTERNAL_SUFFIXES.iter().any(|suffix| host.ends_with(suffix))
}

fn is_private_ip(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(ipv4) => {
            let octets = ipv4.octets();
            ipv4.is_private()
                || ipv4.is_loopback()
                || ipv4.is_link_local()
                || ipv4.is_multicast()
                || ipv4.is_broadcast()
                || ipv4.is_unspecified()
                || octets[0] == 0
                // 100.64.0.0/10 carrier-grade NAT
                || (octets[0] == 100 && (octets[1] & 0xc0) == 64)
        }
        IpAddr::V6(ipv6) => {
            if let Some(ipv4) = ipv6.to_ipv4_mapped() {
                return is_private_ip(&IpAddr::V4(ipv4));
            }
            ipv6.is_loopback()
                || ipv6.is_unspecified()
                || ipv6.is_multicast()
                || is_ipv6_link_local(ipv6)
                || is_ipv6_unique_local(ipv6)
        }
    }
}

fn is_ipv6_link_local(ip: &Ipv6Addr) -> bool {
    ip.segments()[0] & 0xffc0 == 0xfe80
}

fn is_ipv6_unique_local(ip: &Ipv6Addr) -> bool {
    ip.segments()[0] & 0xfe00 == 0xfc00
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    #[tokio::test]
    async fn test_rejects_internal_hostnames_without_lookup() {
        for host in [
            "metadata.google.internal",
            "printer.local",
            "api.corp",
            "localhost",
            "intranet",
        ] {
            assert!(ensure_public_host(host, 443).await.is_err(), "{} accepted", host);
        }
    }

    #[tokio::test]
    async fn test_rejects_private_ip_literals() {
        for host in ["127.0.0.1", "10.0.0.1", "169.254.169.254", "::1", "::ffff:192.168.1.1"] {
            assert!(ensure_public_host(host, 443).await.is_err(), "{} accepted", host);
        }
    }

    #[test]
    fn test_any_private_resolution_rejects_the_host() {
        assert!(ensure_public_addrs(&[addr("93.184.216.34")]).is_ok());
        assert!(ensure_public_addrs(&[addr("93.184.216.34"), addr("127.0.0.1")]).is_err());
        assert!(ensure_public_addrs(&[addr("fe80::1")]).is_err());
        assert!(ensure_public_addrs(&[addr("fd00::1")]).is_err());
        assert!(ensure_public_addrs(&[addr("100.64.0.1")]).is_err());
    }

    #[tokio::test]
    async fn test_public_ip_literal_passes() {
        assert!(ensure_public_host("8.8.8.8", 443).await.is_ok());
    }
}

//! System DNS resolver using getaddrinfo.
//!
//! Respects the operating system's resolver configuration (/etc/hosts,
//! /etc/resolv.conf, nsswitch).

use super::{Addrs, Name, Resolve};
use crate::base::context::IoResultExt;
use crate::base::neterror::NetError;
use std::{
    io,
    net::{Ipv4Addr, Ipv6Addr, SocketAddr, SocketAddrV4, SocketAddrV6, ToSocketAddrs},
};

/// System DNS resolver wrapping the standard library's `ToSocketAddrs`.
///
/// Resolution blocks the calling thread.
#[derive(Clone, Debug, Default)]
pub struct GaiResolver;

impl GaiResolver {
    /// Creates a new `GaiResolver`.
    pub fn new() -> Self {
        Self
    }
}

impl Resolve for GaiResolver {
    fn resolve(&self, name: &Name) -> Result<Addrs, NetError> {
        let host = name.as_str();
        tracing::debug!(host = %host, "resolving via getaddrinfo");

        let addrs: Vec<SocketAddr> = (host, 0u16)
            .to_socket_addrs()
            .dns_context(host)?
            .collect();

        if addrs.is_empty() {
            return Err(NetError::dns_failed(
                host,
                io::Error::new(
                    io::ErrorKind::NotFound,
                    "No addresses returned by getaddrinfo",
                ),
            ));
        }

        tracing::debug!(domain = %host, count = addrs.len(), "DNS resolution complete");
        Ok(Box::new(addrs.into_iter()))
    }
}

/// Utility for parsing IP address strings directly.
///
/// Bypasses DNS resolution if the host is already an IP address.
#[derive(Debug)]
pub struct SocketAddrs {
    addrs: Vec<SocketAddr>,
}

impl SocketAddrs {
    /// Creates a new `SocketAddrs` from a vector.
    pub fn new(addrs: Vec<SocketAddr>) -> Self {
        Self { addrs }
    }

    /// Attempts to parse a host string as an IP address.
    ///
    /// Returns `Some` if the host is a valid IPv4 or IPv6 address,
    /// `None` if it's a hostname that requires DNS resolution.
    pub fn try_parse(host: &str, port: u16) -> Option<Self> {
        if let Ok(addr) = host.parse::<Ipv4Addr>() {
            return Some(Self {
                addrs: vec![SocketAddr::V4(SocketAddrV4::new(addr, port))],
            });
        }

        if let Ok(addr) = host.parse::<Ipv6Addr>() {
            return Some(Self {
                addrs: vec![SocketAddr::V6(SocketAddrV6::new(addr, port, 0, 0))],
            });
        }

        None
    }

    /// Re-targets every address at `port`.
    pub fn with_port(addrs: impl Iterator<Item = SocketAddr>, port: u16) -> Self {
        Self {
            addrs: addrs
                .map(|mut addr| {
                    addr.set_port(port);
                    addr
                })
                .collect(),
        }
    }

    /// Returns true if no addresses are available.
    pub fn is_empty(&self) -> bool {
        self.addrs.is_empty()
    }

    /// Returns the number of addresses.
    pub fn len(&self) -> usize {
        self.addrs.len()
    }
}

impl IntoIterator for SocketAddrs {
    type Item = SocketAddr;
    type IntoIter = std::vec::IntoIter<SocketAddr>;

    fn into_iter(self) -> Self::IntoIter {
        self.addrs.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::IpAddr;

    #[test]
    fn test_socket_addrs_try_parse_ipv4() {
        let addrs = SocketAddrs::try_parse("127.0.0.1", 8080).unwrap();
        assert_eq!(addrs.len(), 1);
        assert_eq!(
            addrs.addrs[0],
            SocketAddr::new(IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)), 8080)
        );
    }

    #[test]
    fn test_socket_addrs_try_parse_ipv6() {
        let addrs = SocketAddrs::try_parse("::1", 443).unwrap();
        assert_eq!(addrs.len(), 1);
        assert!(addrs.addrs[0].is_ipv6());
    }

    #[test]
    fn test_socket_addrs_try_parse_hostname() {
        assert!(SocketAddrs::try_parse("example.com", 80).is_none());
    }

    #[test]
    fn test_with_port() {
        let resolved = vec![
            SocketAddr::new(IpAddr::V4(Ipv4Addr::new(1, 2, 3, 4)), 0),
            SocketAddr::new(IpAddr::V6(Ipv6Addr::LOCALHOST), 0),
        ];
        let addrs = SocketAddrs::with_port(resolved.into_iter(), 443);
        assert!(addrs.into_iter().all(|a| a.port() == 443));
    }

    #[test]
    fn test_gai_resolver_localhost() {
        let resolver = GaiResolver::new();
        let addrs: Vec<_> = resolver.resolve(&Name::new("localhost")).unwrap().collect();
        assert!(!addrs.is_empty());
    }

    #[test]
    fn test_gai_resolver_failure() {
        let resolver = GaiResolver::new();
        let err = resolver
            .resolve(&Name::new("does-not-exist.invalid"))
            .err()
            .unwrap();
        assert!(matches!(err, NetError::NameNotResolvedFor { .. }));
    }
}

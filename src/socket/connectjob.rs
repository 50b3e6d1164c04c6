use crate::base::neterror::NetError;
use crate::dns::{DnsCache, GaiResolver, Name, Resolve, SocketAddrs};
use crate::socket::stream::StreamSocket;
use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;

/// Manages the connection process: cache lookup -> DNS -> connect each
/// candidate in turn. Roughly equivalent to net::ConnectJob.
#[derive(Clone)]
pub struct ConnectJob {
    resolver: Arc<dyn Resolve>,
    cache: Option<DnsCache>,
}

impl Default for ConnectJob {
    fn default() -> Self {
        Self::new(Arc::new(GaiResolver::new()))
    }
}

impl ConnectJob {
    pub fn new(resolver: Arc<dyn Resolve>) -> Self {
        Self {
            resolver,
            cache: None,
        }
    }

    /// Remember addresses that accept a connection in `cache`.
    pub fn with_cache(mut self, cache: DnsCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn cache(&self) -> Option<&DnsCache> {
        self.cache.as_ref()
    }

    /// Open `socket` against `host:port`. `server_name` is handed to the
    /// socket for certificate verification; it differs from `host` only when
    /// dialing a proxy.
    ///
    /// A cached address that no longer accepts connections is evicted and
    /// resolution starts over. Candidates that refuse are skipped; TLS and
    /// tunnel failures end the attempt.
    pub fn connect<S: StreamSocket + ?Sized>(
        &self,
        socket: &mut S,
        host: &str,
        port: u16,
        server_name: &str,
    ) -> Result<SocketAddr, NetError> {
        if let Some(cache) = &self.cache {
            if let Some(addr) = cache.get(host, port) {
                match socket.open(addr, server_name) {
                    Ok(()) => {
                        tracing::debug!(host = %host, addr = %addr, "connected via DNS cache");
                        return Ok(addr);
                    }
                    Err(e) if ends_attempt(&e) => return Err(e),
                    Err(e) => {
                        tracing::debug!(host = %host, addr = %addr, error = %e, "cached address failed, resolving again");
                        cache.remove(host, port);
                    }
                }
            }
        }

        let candidates = match SocketAddrs::try_parse(host, port) {
            Some(addrs) => addrs,
            None => SocketAddrs::with_port(self.resolver.resolve(&Name::from(host))?, port),
        };
        if candidates.is_empty() {
            return Err(NetError::NameNotResolved);
        }

        let mut last_error = None;
        for addr in candidates {
            match socket.open(addr, server_name) {
                Ok(()) => {
                    if let Some(cache) = &self.cache {
                        cache.insert(host, port, addr);
                    }
                    return Ok(addr);
                }
                Err(e) if ends_attempt(&e) => return Err(e),
                Err(e) => {
                    tracing::debug!(host = %host, addr = %addr, error = %e, "connect attempt failed");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or(NetError::ConnectionFailed))
    }
}

/// Failures that another address would not fix.
fn ends_attempt(error: &NetError) -> bool {
    matches!(
        error,
        NetError::SslHandshakeFailed { .. }
            | NetError::SslProtocolError
            | NetError::SslVersionUnsupported
            | NetError::CertificateLoadFailed(_)
            | NetError::RevocationListLoadFailed(_)
            | NetError::FileRead { .. }
            | NetError::TunnelConnectionFailed
    )
}

impl fmt::Debug for ConnectJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectJob")
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

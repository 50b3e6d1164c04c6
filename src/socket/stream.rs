//! Transport capability shared by plaintext and TLS sockets.
//!
//! Every transport implements the full interface. Options that only make
//! sense for TLS have default implementations that log a warning and do
//! nothing, so the request engine can apply its settings uniformly without
//! knowing which transport it was handed.
//!
//! Based on Chromium's `StreamSocket` interface, reduced to blocking I/O.

use crate::base::neterror::NetError;
use crate::http::options::Timeout;
use crate::socket::proxy::ProxyTunnel;
use crate::socket::tls::{CertificateFile, RevocationLists, SslProtocol, VerifyPeer};
use std::fmt;
use std::io::{Read, Write};
use std::net::SocketAddr;
use std::path::Path;

/// A blocking, connection-oriented transport.
///
/// `Read` returning `Ok(0)` means the peer closed the connection.
pub trait StreamSocket: Read + Write + Send + fmt::Debug {
    /// Connect to `addr`. `host` is the server name the caller asked for; TLS
    /// transports verify the peer certificate against it.
    ///
    /// A failure to reach `addr` lets the caller move on to the next
    /// candidate address. TLS handshake and tunnel failures are final.
    fn open(&mut self, addr: SocketAddr, host: &str) -> Result<(), NetError>;

    /// Drop the connection. Closing an unopened socket is a no-op.
    fn close(&mut self);

    fn is_connected(&self) -> bool;

    /// Apply a read/write timeout. An unset timeout clears it.
    fn set_timeout(&mut self, timeout: Timeout) -> Result<(), NetError>;

    /// Whether this transport encrypts the stream.
    fn is_secure(&self) -> bool {
        false
    }

    fn set_certificate_file(&mut self, certificate: CertificateFile) {
        tracing::warn!(path = ?certificate.path(), "client certificate ignored on plaintext transport");
    }

    fn set_ca_bundle(&mut self, bundle: &Path) {
        tracing::warn!(path = ?bundle, "CA bundle ignored on plaintext transport");
    }

    fn set_revocation_lists(&mut self, lists: RevocationLists) {
        tracing::warn!(path = ?lists.path(), "revocation lists ignored on plaintext transport");
    }

    fn set_ssl_protocol(&mut self, protocol: SslProtocol) {
        tracing::warn!(?protocol, "SSL protocol ignored on plaintext transport");
    }

    fn set_verify_peer(&mut self, verify: VerifyPeer) {
        tracing::warn!(verify = verify.is_enabled(), "peer verification ignored on plaintext transport");
    }

    /// Restrict the handshake to an OpenSSL-style cipher list.
    fn set_cipher_list(&mut self, ciphers: &str) {
        tracing::warn!(ciphers, "cipher list ignored on plaintext transport");
    }

    /// Open a `CONNECT` tunnel through the proxy before any TLS handshake.
    fn set_tunnel(&mut self, tunnel: ProxyTunnel) {
        tracing::warn!(target = %tunnel.target(), "tunnel ignored on plaintext transport");
    }
}

impl<S: StreamSocket + ?Sized> StreamSocket for Box<S> {
    fn open(&mut self, addr: SocketAddr, host: &str) -> Result<(), NetError> {
        (**self).open(addr, host)
    }

    fn close(&mut self) {
        (**self).close()
    }

    fn is_connected(&self) -> bool {
        (**self).is_connected()
    }

    fn set_timeout(&mut self, timeout: Timeout) -> Result<(), NetError> {
        (**self).set_timeout(timeout)
    }

    fn is_secure(&self) -> bool {
        (**self).is_secure()
    }

    fn set_certificate_file(&mut self, certificate: CertificateFile) {
        (**self).set_certificate_file(certificate)
    }

    fn set_ca_bundle(&mut self, bundle: &Path) {
        (**self).set_ca_bundle(bundle)
    }

    fn set_revocation_lists(&mut self, lists: RevocationLists) {
        (**self).set_revocation_lists(lists)
    }

    fn set_ssl_protocol(&mut self, protocol: SslProtocol) {
        (**self).set_ssl_protocol(protocol)
    }

    fn set_verify_peer(&mut self, verify: VerifyPeer) {
        (**self).set_verify_peer(verify)
    }

    fn set_cipher_list(&mut self, ciphers: &str) {
        (**self).set_cipher_list(ciphers)
    }

    fn set_tunnel(&mut self, tunnel: ProxyTunnel) {
        (**self).set_tunnel(tunnel)
    }
}

/// A boxed transport picked at runtime by URL scheme.
pub type BoxedSocket = Box<dyn StreamSocket>;

//! TLS transport layered over the plaintext socket, backed by BoringSSL.

use crate::base::neterror::NetError;
use crate::http::options::Timeout;
use crate::socket::proxy::ProxyTunnel;
use crate::socket::stream::StreamSocket;
use crate::socket::tcp::TcpSocket;
use boring::ssl::{SslConnector, SslMethod, SslStream};
use boring::x509::verify::X509CheckFlags;
use once_cell::sync::Lazy;
use std::io::{self, Read, Write};
use std::net::SocketAddr;
use std::path::Path;

pub mod options;

pub use self::options::{
    CertificateFile, CertificateFormat, RevocationLists, SslProtocol, TlsOptions,
    TlsOptionsBuilder, VerifyPeer, DEFAULT_CIPHER_LIST,
};

/// Process-wide library initialisation. Forced on first TLS socket
/// construction; BoringSSL keeps no global state needing teardown.
static LIBRARY_INIT: Lazy<()> = Lazy::new(|| {
    boring_sys::init();
    tracing::debug!("BoringSSL initialised");
});

/// Check if SNI should be set for this host.
/// Per RFC 6066, SNI MUST NOT be set for raw IP addresses.
pub fn should_set_sni(host: &str) -> bool {
    host.trim_start_matches('[')
        .trim_end_matches(']')
        .parse::<std::net::IpAddr>()
        .is_err()
}

#[derive(Debug, Default)]
enum Inner {
    #[default]
    Closed,
    Secure(SslStream<TcpSocket>),
}

/// TLS client socket. Connects a [`TcpSocket`], optionally tunnels through an
/// HTTP proxy, then performs the handshake and verifies the peer.
#[derive(Debug)]
pub struct TlsSocket {
    inner: Inner,
    options: TlsOptions,
    tunnel: Option<ProxyTunnel>,
    timeout: Timeout,
}

impl Default for TlsSocket {
    fn default() -> Self {
        Self::new()
    }
}

impl TlsSocket {
    pub fn new() -> Self {
        Self::with_options(TlsOptions::default())
    }

    pub fn with_options(options: TlsOptions) -> Self {
        Lazy::force(&LIBRARY_INIT);
        Self {
            inner: Inner::Closed,
            options,
            tunnel: None,
            timeout: Timeout::default(),
        }
    }

    pub fn options(&self) -> &TlsOptions {
        &self.options
    }

    fn connector(&self) -> Result<SslConnector, NetError> {
        let mut builder =
            SslConnector::builder(SslMethod::tls()).map_err(|_| NetError::SslProtocolError)?;
        self.options.apply_to_builder(&mut builder)?;
        Ok(builder.build())
    }

    fn handshake(&self, tcp: TcpSocket, host: &str) -> Result<SslStream<TcpSocket>, NetError> {
        let connector = self.connector()?;
        let mut config = connector
            .configure()
            .map_err(|_| NetError::SslProtocolError)?;

        if self.options.verify_peer.is_enabled() {
            config
                .param_mut()
                .set_hostflags(X509CheckFlags::NO_PARTIAL_WILDCARDS);
        } else {
            config.set_verify_hostname(false);
        }
        config.set_use_server_name_indication(should_set_sni(host));

        config
            .connect(host, tcp)
            .map_err(|e| NetError::SslHandshakeFailed {
                host: host.to_string(),
                reason: e.to_string(),
            })
    }

    fn stream_mut(&mut self) -> io::Result<&mut SslStream<TcpSocket>> {
        match &mut self.inner {
            Inner::Secure(stream) => Ok(stream),
            Inner::Closed => Err(io::Error::from(io::ErrorKind::NotConnected)),
        }
    }
}

impl StreamSocket for TlsSocket {
    fn open(&mut self, addr: SocketAddr, host: &str) -> Result<(), NetError> {
        self.close();

        let mut tcp = TcpSocket::new();
        tcp.set_timeout(self.timeout)?;
        tcp.open(addr, host)?;

        let server_name = match &self.tunnel {
            Some(tunnel) => {
                tunnel.establish(&mut tcp)?;
                tunnel.host().to_string()
            }
            None => host.to_string(),
        };

        let stream = self.handshake(tcp, &server_name)?;
        tracing::debug!(
            host = %server_name,
            version = stream.ssl().version_str(),
            "TLS handshake complete"
        );
        self.inner = Inner::Secure(stream);
        Ok(())
    }

    fn close(&mut self) {
        if let Inner::Secure(mut stream) = std::mem::take(&mut self.inner) {
            let _ = stream.shutdown();
            stream.get_mut().close();
        }
    }

    fn is_connected(&self) -> bool {
        matches!(self.inner, Inner::Secure(_))
    }

    fn set_timeout(&mut self, timeout: Timeout) -> Result<(), NetError> {
        self.timeout = timeout;
        match &mut self.inner {
            Inner::Secure(stream) => stream.get_mut().set_timeout(timeout),
            Inner::Closed => Ok(()),
        }
    }

    fn is_secure(&self) -> bool {
        true
    }

    fn set_certificate_file(&mut self, certificate: CertificateFile) {
        self.options.certificate = Some(certificate);
    }

    fn set_ca_bundle(&mut self, bundle: &Path) {
        self.options.ca_bundle = Some(bundle.to_path_buf());
    }

    fn set_revocation_lists(&mut self, lists: RevocationLists) {
        self.options.revocation_lists = Some(lists);
    }

    fn set_ssl_protocol(&mut self, protocol: SslProtocol) {
        self.options.protocol = protocol;
    }

    fn set_verify_peer(&mut self, verify: VerifyPeer) {
        self.options.verify_peer = verify;
    }

    fn set_cipher_list(&mut self, ciphers: &str) {
        self.options.cipher_list = ciphers.to_string();
    }

    fn set_tunnel(&mut self, tunnel: ProxyTunnel) {
        self.tunnel = Some(tunnel);
    }
}

impl Read for TlsSocket {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.stream_mut()?.read(buf)
    }
}

impl Write for TlsSocket {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.stream_mut()?.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        match &mut self.inner {
            Inner::Secure(stream) => stream.flush(),
            Inner::Closed => Ok(()),
        }
    }
}

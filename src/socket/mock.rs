//! Scripted transport for exercising framing and the request engine
//! without real sockets.

use crate::base::neterror::NetError;
use crate::http::options::Timeout;
use crate::socket::proxy::ProxyTunnel;
use crate::socket::stream::StreamSocket;
use crate::socket::tls::{CertificateFile, RevocationLists, SslProtocol, VerifyPeer};
use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Replays canned read chunks and records writes plus every capability call.
#[derive(Debug, Default)]
pub struct MockSocket {
    chunks: VecDeque<Vec<u8>>,
    written: Arc<Mutex<Vec<u8>>>,
    events: Arc<Mutex<Vec<String>>>,
    refuse: Vec<SocketAddr>,
    write_limit: Option<usize>,
    secure: bool,
    connected: bool,
}

impl MockSocket {
    pub fn with_chunks(chunks: Vec<Vec<u8>>) -> Self {
        Self {
            chunks: chunks.into(),
            ..Self::default()
        }
    }

    /// Pretend to be a TLS transport: TLS setters are recorded, not warned.
    pub fn secure(mut self) -> Self {
        self.secure = true;
        self
    }

    /// Fail `open` for this address.
    pub fn refuse(mut self, addr: SocketAddr) -> Self {
        self.refuse.push(addr);
        self
    }

    /// Share the write log and event log with the test.
    pub fn shared(mut self, written: Arc<Mutex<Vec<u8>>>, events: Arc<Mutex<Vec<String>>>) -> Self {
        self.written = written;
        self.events = events;
        self
    }

    /// Accept at most `limit` bytes in total, then report zero-length writes.
    pub fn limit_writes(&mut self, limit: usize) {
        self.write_limit = Some(limit);
    }

    pub fn written(&self) -> Vec<u8> {
        self.written.lock().unwrap().clone()
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    fn record(&self, event: String) {
        self.events.lock().unwrap().push(event);
    }
}

impl StreamSocket for MockSocket {
    fn open(&mut self, addr: SocketAddr, host: &str) -> Result<(), NetError> {
        self.record(format!("open {addr} {host}"));
        if self.refuse.contains(&addr) {
            return Err(NetError::connection_failed_to(
                host,
                addr.port(),
                io::Error::from(io::ErrorKind::ConnectionRefused),
            ));
        }
        self.connected = true;
        Ok(())
    }

    fn close(&mut self) {
        if self.connected {
            self.record("close".to_string());
        }
        self.connected = false;
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn set_timeout(&mut self, timeout: Timeout) -> Result<(), NetError> {
        self.record(format!("timeout {}", timeout.as_millis()));
        Ok(())
    }

    fn is_secure(&self) -> bool {
        self.secure
    }

    fn set_certificate_file(&mut self, certificate: CertificateFile) {
        self.record(format!("certificate {}", certificate.path().display()));
    }

    fn set_ca_bundle(&mut self, bundle: &Path) {
        self.record(format!("ca_bundle {}", bundle.display()));
    }

    fn set_revocation_lists(&mut self, lists: RevocationLists) {
        self.record(format!("crl {}", lists.path().display()));
    }

    fn set_ssl_protocol(&mut self, protocol: SslProtocol) {
        self.record(format!("protocol {protocol:?}"));
    }

    fn set_verify_peer(&mut self, verify: VerifyPeer) {
        self.record(format!("verify_peer {}", verify.is_enabled()));
    }

    fn set_cipher_list(&mut self, ciphers: &str) {
        self.record(format!("ciphers {ciphers}"));
    }

    fn set_tunnel(&mut self, tunnel: ProxyTunnel) {
        self.record(format!("tunnel {}", tunnel.target()));
    }
}

impl Read for MockSocket {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let Some(chunk) = self.chunks.front_mut() else {
            return Ok(0);
        };
        let n = chunk.len().min(buf.len());
        buf[..n].copy_from_slice(&chunk[..n]);
        chunk.drain(..n);
        if chunk.is_empty() {
            self.chunks.pop_front();
        }
        Ok(n)
    }
}

impl Write for MockSocket {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut written = self.written.lock().unwrap();
        let n = match self.write_limit {
            Some(limit) => buf.len().min(limit.saturating_sub(written.len())),
            None => buf.len(),
        };
        written.extend_from_slice(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

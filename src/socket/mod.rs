//! Socket and connection management.
//!
//! Blocking transports mirroring Chromium's `net/socket/`:
//! - [`stream`]: the `StreamSocket` capability trait
//! - [`tcp`]: plaintext transport
//! - [`tls`]: TLS transport and configuration with BoringSSL
//! - [`connection`]: buffered HTTP/1.1 framing over any transport
//! - [`connectjob`]: cache → DNS → connect each candidate
//! - [`proxy`]: HTTP proxy settings and `CONNECT` tunnels

pub mod connection;
pub mod connectjob;
#[cfg(test)]
pub(crate) mod mock;
pub mod proxy;
pub mod stream;
pub mod tcp;
pub mod tls;

pub use connection::Connection;
pub use connectjob::ConnectJob;
pub use proxy::{ProxySettings, ProxyTunnel};
pub use stream::{BoxedSocket, StreamSocket};
pub use tcp::TcpSocket;
pub use tls::TlsSocket;

use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised by the request engine and its collaborators.
///
/// HTTP error statuses (4xx/5xx) are never errors: they come back as a
/// [`Response`](crate::http::response::Response). Only configuration,
/// resolution, transport and TLS failures surface here.
#[derive(Debug, Error, Clone)]
pub enum NetError {
    // Connection Errors
    #[error("Connection closed (TCP FIN)")]
    ConnectionClosed,
    #[error("Connection reset (TCP RST)")]
    ConnectionReset,
    #[error("Connection refused")]
    ConnectionRefused,
    #[error("Connection failed")]
    ConnectionFailed,
    #[error("Connection to {host}:{port} failed: {source}")]
    ConnectionFailedTo {
        host: String,
        port: u16,
        #[source]
        source: Arc<io::Error>,
    },
    #[error("Name not resolved")]
    NameNotResolved,
    #[error("Failed to resolve {domain}: {source}")]
    NameNotResolvedFor {
        domain: String,
        #[source]
        source: Arc<io::Error>,
    },
    #[error("Socket not connected")]
    SocketNotConnected,
    #[error("Tunnel connection failed")]
    TunnelConnectionFailed,
    #[error("Connection timed out")]
    ConnectionTimedOut,
    #[error("Partial write: sent {sent} of {expected} bytes")]
    PartialWrite { sent: usize, expected: usize },
    #[error("Failed to set socket option")]
    SocketOptionFailed,
    #[error("Failed to read {path:?}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: Arc<io::Error>,
    },

    // TLS Errors
    #[error("SSL protocol error")]
    SslProtocolError,
    #[error("SSL handshake with {host} failed: {reason}")]
    SslHandshakeFailed { host: String, reason: String },
    #[error("SSL protocol version unsupported")]
    SslVersionUnsupported,
    #[error("Failed to load certificate {0:?}")]
    CertificateLoadFailed(PathBuf),
    #[error("Failed to load revocation list {0:?}")]
    RevocationListLoadFailed(PathBuf),

    // URL Errors
    #[error("Invalid URL")]
    InvalidUrl,
    #[error("Relative URL {0:?} where an absolute URL is required")]
    RelativeUrl(String),
    #[error("Unknown URL scheme {0:?}")]
    UnknownUrlScheme(String),

    // HTTP Errors
    #[error("Empty response")]
    EmptyResponse,
    #[error("Invalid chunked encoding")]
    InvalidChunkedEncoding,
    #[error("Incomplete chunked encoding")]
    IncompleteChunkedEncoding,
    #[error("Content length mismatch")]
    ContentLengthMismatch,
    #[error("Response headers too big")]
    ResponseHeadersTooBig,
    #[error("Invalid authentication challenge")]
    InvalidAuthChallenge,
    #[error("Unsupported digest algorithm {0:?}")]
    UnsupportedDigestAlgorithm(String),

    // Pool Errors
    #[error("Request task failed: {0}")]
    TaskFailed(String),

    #[error("Unknown error: {0}")]
    Unknown(i32),
}

impl NetError {
    /// Numeric code in the style of Chromium's `net_error_list.h`.
    pub fn as_i32(&self) -> i32 {
        match self {
            NetError::ConnectionClosed => -100,
            NetError::ConnectionReset => -101,
            NetError::ConnectionRefused => -102,
            NetError::ConnectionFailed | NetError::ConnectionFailedTo { .. } => -104,
            NetError::NameNotResolved | NetError::NameNotResolvedFor { .. } => -105,
            NetError::SslProtocolError => -107,
            NetError::TunnelConnectionFailed => -111,
            NetError::SocketNotConnected => -112,
            NetError::SslVersionUnsupported => -113,
            NetError::ConnectionTimedOut => -118,
            NetError::SslHandshakeFailed { .. } => -148,
            NetError::CertificateLoadFailed(_) => -205,
            NetError::RevocationListLoadFailed(_) => -206,
            NetError::InvalidUrl => -300,
            NetError::UnknownUrlScheme(_) => -302,
            NetError::EmptyResponse => -324,
            NetError::ResponseHeadersTooBig => -325,
            NetError::InvalidChunkedEncoding => -321,
            NetError::IncompleteChunkedEncoding => -355,
            NetError::ContentLengthMismatch => -354,
            NetError::InvalidAuthChallenge => -338,
            NetError::UnsupportedDigestAlgorithm(_) => -339,

            // Codes outside Chromium's list
            NetError::RelativeUrl(_) => -10001,
            NetError::PartialWrite { .. } => -10002,
            NetError::SocketOptionFailed => -10003,
            NetError::FileRead { .. } => -10004,
            NetError::TaskFailed(_) => -10005,

            NetError::Unknown(code) => *code,
        }
    }

    /// Whether this error happened before any network I/O took place.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            NetError::InvalidUrl | NetError::RelativeUrl(_) | NetError::UnknownUrlScheme(_)
        )
    }

    pub(crate) fn connection_failed_to(host: &str, port: u16, source: io::Error) -> Self {
        match source.kind() {
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => NetError::ConnectionTimedOut,
            _ => NetError::ConnectionFailedTo {
                host: host.to_string(),
                port,
                source: Arc::new(source),
            },
        }
    }

    pub(crate) fn dns_failed(domain: &str, source: io::Error) -> Self {
        NetError::NameNotResolvedFor {
            domain: domain.to_string(),
            source: Arc::new(source),
        }
    }

    /// Map a socket-level read/write failure.
    pub(crate) fn from_socket_io(err: &io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => NetError::ConnectionTimedOut,
            io::ErrorKind::ConnectionReset => NetError::ConnectionReset,
            io::ErrorKind::ConnectionRefused => NetError::ConnectionRefused,
            io::ErrorKind::NotConnected => NetError::SocketNotConnected,
            io::ErrorKind::BrokenPipe | io::ErrorKind::UnexpectedEof => NetError::ConnectionClosed,
            _ => NetError::ConnectionFailed,
        }
    }
}

impl From<i32> for NetError {
    /// Rebuilds payload-free variants; codes of variants with payloads map to
    /// their closest payload-free sibling or to `Unknown`.
    fn from(code: i32) -> Self {
        match code {
            -100 => NetError::ConnectionClosed,
            -101 => NetError::ConnectionReset,
            -102 => NetError::ConnectionRefused,
            -104 => NetError::ConnectionFailed,
            -105 => NetError::NameNotResolved,
            -107 => NetError::SslProtocolError,
            -111 => NetError::TunnelConnectionFailed,
            -112 => NetError::SocketNotConnected,
            -113 => NetError::SslVersionUnsupported,
            -118 => NetError::ConnectionTimedOut,
            -300 => NetError::InvalidUrl,
            -321 => NetError::InvalidChunkedEncoding,
            -324 => NetError::EmptyResponse,
            -325 => NetError::ResponseHeadersTooBig,
            -338 => NetError::InvalidAuthChallenge,
            -354 => NetError::ContentLengthMismatch,
            -355 => NetError::IncompleteChunkedEncoding,
            -10003 => NetError::SocketOptionFailed,
            _ => NetError::Unknown(code),
        }
    }
}

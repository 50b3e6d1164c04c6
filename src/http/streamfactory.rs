use crate::base::neterror::NetError;
use crate::socket::stream::BoxedSocket;
use crate::socket::tcp::TcpSocket;
use crate::socket::tls::TlsSocket;

/// Creates a fresh, unopened transport for a URL scheme.
pub trait StreamFactory: Send + Sync {
    fn create_socket(&self, scheme: &str) -> Result<BoxedSocket, NetError>;
}

/// `http` → [`TcpSocket`], `https` → [`TlsSocket`]; anything else is
/// [`NetError::UnknownUrlScheme`].
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpStreamFactory;

impl StreamFactory for HttpStreamFactory {
    fn create_socket(&self, scheme: &str) -> Result<BoxedSocket, NetError> {
        match scheme.to_ascii_lowercase().as_str() {
            "http" => Ok(Box::new(TcpSocket::new())),
            "https" => Ok(Box::new(TlsSocket::new())),
            _ => Err(NetError::UnknownUrlScheme(scheme.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheme_dispatch() {
        let factory = HttpStreamFactory;
        assert!(!factory.create_socket("http").unwrap().is_secure());
        assert!(factory.create_socket("HTTPS").unwrap().is_secure());
        assert!(matches!(
            factory.create_socket("ftp"),
            Err(NetError::UnknownUrlScheme(scheme)) if scheme == "ftp"
        ));
    }
}

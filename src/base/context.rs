//! Ergonomic error context helpers.
//!
//! Extension traits that turn `io::Error`s into context-rich `NetError`
//! variants naming the host or domain involved.

use crate::base::neterror::NetError;
use std::io;

/// Extension trait for adding context to IO Results.
pub trait IoResultExt<T> {
    /// Add connection context to an IO error.
    ///
    /// # Example
    /// ```ignore
    /// use latticenet::base::context::IoResultExt;
    ///
    /// let stream = TcpStream::connect(addr).connection_context("example.com", 443)?;
    /// // Error: "Connection to example.com:443 failed: connection refused"
    /// ```
    fn connection_context(self, host: &str, port: u16) -> Result<T, NetError>;

    /// Add DNS resolution context to an IO error.
    fn dns_context(self, domain: &str) -> Result<T, NetError>;

    /// Add file context to an IO error.
    fn file_context(self, path: &std::path::Path) -> Result<T, NetError>;
}

impl<T> IoResultExt<T> for Result<T, io::Error> {
    fn connection_context(self, host: &str, port: u16) -> Result<T, NetError> {
        self.map_err(|e| NetError::connection_failed_to(host, port, e))
    }

    fn dns_context(self, domain: &str) -> Result<T, NetError> {
        self.map_err(|e| NetError::dns_failed(domain, e))
    }

    fn file_context(self, path: &std::path::Path) -> Result<T, NetError> {
        self.map_err(|e| NetError::FileRead {
            path: path.to_path_buf(),
            source: std::sync::Arc::new(e),
        })
    }
}

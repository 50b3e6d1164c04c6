//! Plaintext transport over a blocking `TcpStream`.

use crate::base::context::IoResultExt;
use crate::base::neterror::NetError;
use crate::http::options::Timeout;
use crate::socket::stream::StreamSocket;
use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream};

#[derive(Debug, Default)]
pub struct TcpSocket {
    stream: Option<TcpStream>,
    timeout: Timeout,
}

impl TcpSocket {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.stream.as_ref().and_then(|s| s.peer_addr().ok())
    }

    fn stream_mut(&mut self) -> io::Result<&mut TcpStream> {
        self.stream
            .as_mut()
            .ok_or_else(|| io::Error::from(io::ErrorKind::NotConnected))
    }

    fn apply_timeout(stream: &TcpStream, timeout: Timeout) -> Result<(), NetError> {
        stream
            .set_read_timeout(timeout.duration())
            .and_then(|_| stream.set_write_timeout(timeout.duration()))
            .map_err(|_| NetError::SocketOptionFailed)
    }
}

impl StreamSocket for TcpSocket {
    fn open(&mut self, addr: SocketAddr, host: &str) -> Result<(), NetError> {
        self.close();

        let stream = match self.timeout.duration() {
            Some(limit) => TcpStream::connect_timeout(&addr, limit),
            None => TcpStream::connect(addr),
        }
        .connection_context(host, addr.port())?;

        if let Err(e) = stream.set_nodelay(true) {
            tracing::debug!(error = %e, "failed to set TCP_NODELAY");
        }
        if self.timeout.is_set() {
            Self::apply_timeout(&stream, self.timeout)?;
        }

        tracing::debug!(host = %host, addr = %addr, "TCP connection established");
        self.stream = Some(stream);
        Ok(())
    }

    fn close(&mut self) {
        if let Some(stream) = self.stream.take() {
            let _ = stream.shutdown(Shutdown::Both);
        }
    }

    fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    fn set_timeout(&mut self, timeout: Timeout) -> Result<(), NetError> {
        self.timeout = timeout;
        match &self.stream {
            Some(stream) => Self::apply_timeout(stream, timeout),
            None => Ok(()),
        }
    }
}

impl Read for TcpSocket {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.stream_mut()?.read(buf)
    }
}

impl Write for TcpSocket {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.stream_mut()?.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.stream.as_mut() {
            Some(stream) => stream.flush(),
            None => Ok(()),
        }
    }
}

//! Buffered HTTP/1.1 framing over a [`StreamSocket`](crate::socket::StreamSocket)
//! or any other byte stream.
//!
//! Reads land in a growable buffer; the framing helpers carve header blocks,
//! chunks and fixed-length bodies out of it. Bytes read past the end of one
//! message stay buffered for the next.

use crate::base::neterror::NetError;
use bytes::{Bytes, BytesMut};
use std::io::{self, Read, Write};

/// Size of each read from the socket.
const READ_CHUNK: usize = 8 * 1024;

/// Upper bound on a response header block.
pub const MAX_HEADER_BYTES: usize = 256 * 1024;

/// Largest single chunk accepted from a chunked body.
pub const MAX_CHUNK_BYTES: usize = 64 * 1024 * 1024;

const CRLF: &[u8] = b"\r\n";
const HEADER_END: &[u8] = b"\r\n\r\n";

#[derive(Debug)]
pub struct Connection<S> {
    socket: S,
    buf: BytesMut,
    peer_closed: bool,
    bytes_sent: u64,
    bytes_received: u64,
}

impl<S: Read + Write> Connection<S> {
    pub fn new(socket: S) -> Self {
        Self {
            socket,
            buf: BytesMut::with_capacity(READ_CHUNK),
            peer_closed: false,
            bytes_sent: 0,
            bytes_received: 0,
        }
    }

    pub fn socket(&self) -> &S {
        &self.socket
    }

    pub fn socket_mut(&mut self) -> &mut S {
        &mut self.socket
    }

    pub fn into_inner(self) -> S {
        self.socket
    }

    /// Whether the peer has closed its side of the connection.
    pub fn is_peer_closed(&self) -> bool {
        self.peer_closed
    }

    pub fn bytes_sent(&self) -> u64 {
        self.bytes_sent
    }

    pub fn bytes_received(&self) -> u64 {
        self.bytes_received
    }

    /// Forget buffered bytes and the closed flag, for a freshly opened socket.
    pub fn reset(&mut self) {
        self.buf.clear();
        self.peer_closed = false;
    }

    /// Write the whole message. A socket that stops accepting bytes midway
    /// fails with [`NetError::PartialWrite`].
    pub fn write_all(&mut self, data: &[u8]) -> Result<(), NetError> {
        let mut sent = 0;
        while sent < data.len() {
            match self.socket.write(&data[sent..]) {
                Ok(0) => {
                    return Err(NetError::PartialWrite {
                        sent,
                        expected: data.len(),
                    })
                }
                Ok(n) => sent += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    tracing::debug!(error = %e, sent, expected = data.len(), "write failed");
                    return Err(NetError::from_socket_io(&e));
                }
            }
        }
        self.socket
            .flush()
            .map_err(|e| NetError::from_socket_io(&e))?;
        self.bytes_sent += sent as u64;
        Ok(())
    }

    /// Pull one read's worth of bytes into the buffer. Returns 0 once the
    /// peer has closed.
    fn fill(&mut self) -> Result<usize, NetError> {
        if self.peer_closed {
            return Ok(0);
        }
        let mut chunk = [0u8; READ_CHUNK];
        loop {
            match self.socket.read(&mut chunk) {
                Ok(0) => {
                    self.peer_closed = true;
                    return Ok(0);
                }
                Ok(n) => {
                    self.buf.extend_from_slice(&chunk[..n]);
                    self.bytes_received += n as u64;
                    return Ok(n);
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                // TLS peers that skip close_notify surface as an unexpected EOF.
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                    self.peer_closed = true;
                    return Ok(0);
                }
                Err(e) => return Err(NetError::from_socket_io(&e)),
            }
        }
    }

    /// Read through the blank line ending the header block and return the
    /// block, terminator excluded.
    ///
    /// A peer that closes before the terminator yields whatever it sent; one
    /// that sent nothing at all yields [`NetError::EmptyResponse`].
    pub fn read_headers(&mut self) -> Result<Bytes, NetError> {
        let mut searched = 0;
        loop {
            if let Some(pos) = find(&self.buf[searched..], HEADER_END) {
                let end = searched + pos;
                let block = self.buf.split_to(end + HEADER_END.len());
                return Ok(block.freeze().slice(..end));
            }
            if self.buf.len() > MAX_HEADER_BYTES {
                return Err(NetError::ResponseHeadersTooBig);
            }
            searched = self.buf.len().saturating_sub(HEADER_END.len() - 1);
            if self.fill()? == 0 {
                if self.buf.is_empty() {
                    return Err(NetError::EmptyResponse);
                }
                return Ok(self.buf.split().freeze());
            }
        }
    }

    /// Read one CRLF-terminated line, terminator excluded. `None` when the
    /// peer closed before a full line arrived.
    fn read_line(&mut self) -> Result<Option<Bytes>, NetError> {
        let mut searched = 0;
        loop {
            if let Some(pos) = find(&self.buf[searched..], CRLF) {
                let end = searched + pos;
                let line = self.buf.split_to(end + CRLF.len());
                return Ok(Some(line.freeze().slice(..end)));
            }
            searched = self.buf.len().saturating_sub(1);
            if self.fill()? == 0 {
                return Ok(None);
            }
        }
    }

    /// Read exactly `len` body bytes.
    pub fn read_exact(&mut self, len: usize) -> Result<Bytes, NetError> {
        while self.buf.len() < len {
            if self.fill()? == 0 {
                tracing::debug!(expected = len, got = self.buf.len(), "body truncated");
                return Err(NetError::ContentLengthMismatch);
            }
        }
        Ok(self.buf.split_to(len).freeze())
    }

    /// Read until the peer closes the connection.
    pub fn read_to_close(&mut self) -> Result<Bytes, NetError> {
        while self.fill()? > 0 {}
        Ok(self.buf.split().freeze())
    }

    /// Decode a chunked body: hex size lines, each followed by that many bytes
    /// and a CRLF, until a zero-size chunk. Trailer lines are discarded.
    pub fn read_chunked(&mut self) -> Result<Bytes, NetError> {
        let mut body = BytesMut::new();
        loop {
            let line = self
                .read_line()?
                .ok_or(NetError::IncompleteChunkedEncoding)?;
            let size = parse_chunk_size(&line)?;

            if size == 0 {
                // Trailers end at an empty line; a peer may also just close.
                while let Some(trailer) = self.read_line()? {
                    if trailer.is_empty() {
                        break;
                    }
                }
                return Ok(body.freeze());
            }

            let framed = size
                .checked_add(CRLF.len())
                .ok_or(NetError::InvalidChunkedEncoding)?;
            while self.buf.len() < framed {
                if self.fill()? == 0 {
                    return Err(NetError::IncompleteChunkedEncoding);
                }
            }
            body.extend_from_slice(&self.buf.split_to(size));
            if &self.buf[..CRLF.len()] != CRLF {
                return Err(NetError::InvalidChunkedEncoding);
            }
            let _ = self.buf.split_to(CRLF.len());
        }
    }
}

fn parse_chunk_size(line: &[u8]) -> Result<usize, NetError> {
    let text = std::str::from_utf8(line).map_err(|_| NetError::InvalidChunkedEncoding)?;
    // Drop chunk extensions (`1a;name=value`).
    let digits = text.split(';').next().unwrap_or_default().trim();
    let size = usize::from_str_radix(digits, 16).map_err(|_| NetError::InvalidChunkedEncoding)?;
    if size > MAX_CHUNK_BYTES {
        return Err(NetError::InvalidChunkedEncoding);
    }
    Ok(size)
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

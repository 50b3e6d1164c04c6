//! One HTTP/1.1 request message and its exchange over a connection.

use crate::base::neterror::NetError;
use crate::http::header::Header;
use crate::http::multipart::Multipart;
use crate::http::parameters::Parameters;
use crate::http::requestbody::RequestBody;
use crate::http::response::Response;
use crate::http::url::Url;
use crate::socket::connection::Connection;
use bytes::{BufMut, Bytes, BytesMut};
use http::Method;
use std::io::{Read, Write};

/// Default `User-Agent`.
pub const USER_AGENT: &str = concat!("latticenet/", env!("CARGO_PKG_VERSION"));

const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

/// Everything a request message is built from.
#[derive(Debug, Clone, Copy)]
pub struct MessageParts<'a> {
    pub method: &'a Method,
    pub url: &'a Url,
    pub headers: &'a Header,
    pub parameters: &'a Parameters,
    pub multipart: Option<&'a Multipart>,
    pub body: &'a RequestBody,
    /// Write the target in absolute form, for a forward proxy.
    pub absolute_form: bool,
}

/// A serialized-ready request: request line, headers with defaults filled
/// in, and the body.
#[derive(Debug, Clone)]
pub struct HttpTransaction {
    method: Method,
    uri: String,
    target: String,
    headers: Header,
    body: Bytes,
}

impl HttpTransaction {
    /// Build the message.
    ///
    /// The body is the raw body if one is set, else the form-encoded
    /// parameters of a POST, else the multipart payload. Parameters that do
    /// not become the body are appended to the target as a query string.
    pub fn build(parts: MessageParts<'_>) -> Result<Self, NetError> {
        let params_as_body = *parts.method == Method::POST
            && parts.body.is_empty()
            && !parts.parameters.is_empty();

        let mut uri = parts.url.request_target().to_string();
        if !params_as_body && !parts.parameters.is_empty() {
            if uri.contains('?') {
                uri.push('&');
                uri.push_str(&parts.parameters.post());
            } else {
                uri.push_str(&parts.parameters.get());
            }
        }

        let target = if parts.absolute_form {
            format!("{}://{}{}", parts.url.service(), parts.url.host(), uri)
        } else {
            uri.clone()
        };

        let mut headers = parts.headers.clone();
        let body = if !parts.body.is_empty() {
            Bytes::copy_from_slice(parts.body.as_bytes())
        } else if params_as_body {
            headers.insert_default("Content-Type", FORM_URLENCODED);
            Bytes::from(parts.parameters.post())
        } else if let Some(multipart) = parts.multipart.filter(|m| !m.is_empty()) {
            headers.insert_default("Content-Type", multipart.content_type());
            multipart.to_body()?
        } else {
            Bytes::new()
        };

        if !parts.url.is_relative() {
            headers.insert_default("Host", parts.url.host());
        }
        headers.insert_default("User-Agent", USER_AGENT);
        headers.insert_default("Connection", "keep-alive");
        headers.insert_default("Accept", "*/*");
        if !body.is_empty() {
            headers.insert_default("Content-Length", body.len().to_string());
        }

        Ok(Self {
            method: parts.method.clone(),
            uri,
            target,
            headers,
            body,
        })
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Origin-form target (`/path?query`), as used by digest authentication.
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Target as written on the request line.
    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn headers(&self) -> &Header {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut Header {
        &mut self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// The full wire form: request line, headers, blank line, body.
    pub fn to_bytes(&self) -> Bytes {
        let mut head = format!("{} {} HTTP/1.1\r\n", self.method, self.target);
        self.headers.write_to(&mut head);
        head.push_str("\r\n");

        let mut out = BytesMut::with_capacity(head.len() + self.body.len());
        out.put_slice(head.as_bytes());
        out.put_slice(&self.body);
        out.freeze()
    }

    /// Write the message to `conn`.
    pub fn write_to<S: Read + Write>(&self, conn: &mut Connection<S>) -> Result<(), NetError> {
        conn.write_all(&self.to_bytes())?;
        tracing::debug!(method = %self.method, target = %self.target, "request sent");
        Ok(())
    }

    /// Read the response to this message from `conn`.
    pub fn read_response<S: Read + Write>(
        &self,
        conn: &mut Connection<S>,
    ) -> Result<Response, NetError> {
        Response::read_from(conn, &self.method)
    }
}

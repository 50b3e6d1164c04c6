use crate::base::neterror::NetError;
use crate::http::url::Url;
use std::fmt;
use std::io::{Read, Write};
use zeroize::Zeroizing;

/// Largest `CONNECT` reply accepted before giving up on the proxy.
const MAX_TUNNEL_REPLY: usize = 8 * 1024;

/// An HTTP forward proxy.
///
/// Plain `http` targets are requested from the proxy in absolute form;
/// `https` targets are tunnelled with `CONNECT`.
#[derive(Clone)]
pub struct ProxySettings {
    /// Proxy URL (e.g., `http://proxy.com:8080`)
    url: Url,
    /// Proxy username for authentication
    username: Option<String>,
    /// Proxy password (zeroized on drop)
    password: Option<Zeroizing<String>>,
}

impl ProxySettings {
    /// Create proxy settings from a URL. Only `http://` proxies are supported.
    pub fn new(url: impl Into<Url>) -> Result<Self, NetError> {
        let url = url.into();
        if url.is_relative() {
            return Err(NetError::RelativeUrl(url.to_string()));
        }
        if !url.service().eq_ignore_ascii_case("http") {
            return Err(NetError::UnknownUrlScheme(url.service().to_string()));
        }
        Ok(Self {
            url,
            username: None,
            password: None,
        })
    }

    /// Add authentication credentials.
    pub fn with_auth(mut self, user: &str, pass: &str) -> Self {
        self.username = Some(user.to_string());
        self.password = Some(Zeroizing::new(pass.to_string()));
        self
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Get proxy host and port.
    pub fn host_port(&self) -> (&str, u16) {
        (self.url.hostname(), self.url.port())
    }

    /// Check if this proxy requires authentication.
    pub fn requires_auth(&self) -> bool {
        self.username.is_some() && self.password.is_some()
    }

    /// Get `Proxy-Authorization` header value for HTTP proxies.
    pub fn get_auth_header(&self) -> Option<String> {
        if let (Some(u), Some(p)) = (&self.username, &self.password) {
            use base64::{engine::general_purpose, Engine as _};
            let creds = Zeroizing::new(format!("{}:{}", u, p.as_str()));
            let encoded = general_purpose::STANDARD.encode(creds.as_bytes());
            Some(format!("Basic {}", encoded))
        } else {
            None
        }
    }

    /// Tunnel description for reaching `host:port` through this proxy.
    pub fn tunnel_to(&self, host: &str, port: u16) -> ProxyTunnel {
        ProxyTunnel {
            host: host.to_string(),
            port,
            authorization: self.get_auth_header(),
        }
    }
}

impl fmt::Debug for ProxySettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxySettings")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// A pending `CONNECT host:port` exchange with a proxy.
#[derive(Clone)]
pub struct ProxyTunnel {
    host: String,
    port: u16,
    authorization: Option<String>,
}

impl ProxyTunnel {
    /// The origin host the tunnel leads to.
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// `host:port`, bracketing IPv6 literals.
    pub fn target(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    /// Build the `CONNECT` request.
    pub fn request(&self) -> String {
        let target = self.target();
        let mut request = format!("CONNECT {target} HTTP/1.1\r\nHost: {target}\r\n");
        if let Some(auth) = &self.authorization {
            request.push_str(&format!("Proxy-Authorization: {auth}\r\n"));
        }
        request.push_str("\r\n");
        request
    }

    /// Send `CONNECT` over an open connection to the proxy and wait for a 2xx.
    ///
    /// The reply is consumed byte by byte so nothing beyond its header block
    /// is taken from the stream before the TLS handshake starts.
    pub fn establish<S: Read + Write>(&self, stream: &mut S) -> Result<(), NetError> {
        tracing::debug!(target = %self.target(), "establishing CONNECT tunnel");
        stream
            .write_all(self.request().as_bytes())
            .map_err(|e| NetError::from_socket_io(&e))?;
        stream.flush().map_err(|e| NetError::from_socket_io(&e))?;

        let mut reply = Vec::with_capacity(256);
        let mut byte = [0u8; 1];
        while !reply.ends_with(b"\r\n\r\n") {
            if reply.len() >= MAX_TUNNEL_REPLY {
                return Err(NetError::ResponseHeadersTooBig);
            }
            match stream.read(&mut byte) {
                Ok(0) => return Err(NetError::TunnelConnectionFailed),
                Ok(_) => reply.push(byte[0]),
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(NetError::from_socket_io(&e)),
            }
        }

        let status_line = reply.split(|&b| b == b'\n').next().unwrap_or_default();
        let status = std::str::from_utf8(status_line)
            .ok()
            .and_then(|line| line.split_whitespace().nth(1))
            .and_then(|code| code.parse::<u16>().ok());

        match status {
            Some(code) if (200..300).contains(&code) => Ok(()),
            other => {
                tracing::warn!(status = ?other, target = %self.target(), "proxy refused tunnel");
                Err(NetError::TunnelConnectionFailed)
            }
        }
    }
}

impl fmt::Debug for ProxyTunnel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyTunnel")
            .field("target", &self.target())
            .field("authorized", &self.authorization.is_some())
            .finish()
    }
}

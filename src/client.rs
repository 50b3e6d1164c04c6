//! Fluent request construction.
//!
//! # Example
//!
//! ```rust,no_run
//! use latticenet::client;
//! use std::time::Duration;
//!
//! let response = client::get("http://example.com/search")
//!     .param("q", "rust")
//!     .header("Accept", "text/html")
//!     .timeout(Duration::from_secs(10))
//!     .redirects(5)
//!     .send()?;
//! println!("{} {}", response.status_code(), response.text());
//! # Ok::<(), latticenet::base::neterror::NetError>(())
//! ```

use crate::base::neterror::NetError;
use crate::dns::{DnsCache, Resolve};
use crate::http::auth::{Authentication, Digest};
use crate::http::cookies::Cookies;
use crate::http::header::Header;
use crate::http::multipart::Multipart;
use crate::http::options::{Redirects, Timeout};
use crate::http::parameters::Parameters;
use crate::http::requestbody::RequestBody;
use crate::http::response::Response;
use crate::http::streamfactory::StreamFactory;
use crate::http::url::Url;
use crate::socket::proxy::ProxySettings;
use crate::socket::tls::{CertificateFile, RevocationLists, SslProtocol, TlsOptions};
use crate::urlrequest::request::Request;
use http::Method;
use std::path::PathBuf;
use std::sync::Arc;

/// Builder for a single request.
///
/// Configuration errors (a relative URL, an invalid proxy) are held until
/// [`build`](Self::build) or [`send`](Self::send).
#[must_use]
#[derive(Debug)]
pub struct RequestBuilder {
    request: Result<Request, NetError>,
}

impl RequestBuilder {
    /// Start building a request with a custom method.
    pub fn new(method: Method, url: impl Into<Url>) -> Self {
        Self {
            request: Request::new(method, url),
        }
    }

    /// Continue from an existing request.
    pub fn from_request(request: Request) -> Self {
        Self {
            request: Ok(request),
        }
    }

    fn with(mut self, f: impl FnOnce(&mut Request)) -> Self {
        if let Ok(request) = self.request.as_mut() {
            f(request);
        }
        self
    }

    /// Set a header, replacing an earlier value.
    pub fn header(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let (name, value) = (name.into(), value.into());
        self.with(|r| r.set_header(name, value))
    }

    /// Replace all custom headers.
    pub fn headers(self, headers: Header) -> Self {
        self.with(|r| r.set_headers(headers))
    }

    /// Add one query/form parameter.
    pub fn param(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let (key, value) = (key.into(), value.into());
        self.with(|r| {
            let mut parameters = r.parameters().clone();
            parameters.add(key, value);
            r.set_parameters(parameters);
        })
    }

    /// Replace the parameters. They form the body of a POST without another
    /// body, and the query string otherwise.
    pub fn parameters(self, parameters: Parameters) -> Self {
        self.with(|r| r.set_parameters(parameters))
    }

    /// Basic authentication.
    pub fn basic_auth(self, username: impl Into<String>, password: impl Into<String>) -> Self {
        let auth = Authentication::new(username, password);
        self.with(|r| r.set_auth(auth))
    }

    /// Credentials for answering a digest challenge.
    pub fn digest_auth(self, username: impl Into<String>, password: impl Into<String>) -> Self {
        let digest = Digest::new(username, password);
        self.with(|r| r.set_digest(digest))
    }

    pub fn cookies(self, cookies: Cookies) -> Self {
        self.with(|r| r.set_cookies(cookies))
    }

    pub fn cookie(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let (name, value) = (name.into(), value.into());
        self.with(|r| {
            let mut cookies = r.cookies().clone();
            cookies.insert(name, value);
            r.set_cookies(cookies);
        })
    }

    pub fn multipart(self, multipart: Multipart) -> Self {
        self.with(|r| r.set_multipart(multipart))
    }

    /// Set the raw body. A GET or HEAD with a non-empty body becomes a POST;
    /// other methods are kept.
    pub fn body(self, body: impl Into<RequestBody>) -> Self {
        let body = body.into();
        self.with(|r| set_body_keeping_method(r, body))
    }

    /// Set a JSON body. Serialization failures leave the body unset.
    #[cfg(feature = "json")]
    pub fn json<T: serde::Serialize + ?Sized>(self, json: &T) -> Self {
        match serde_json::to_vec(json) {
            Ok(bytes) => self.with(|r| {
                r.set_header("Content-Type", "application/json");
                set_body_keeping_method(r, bytes.into());
            }),
            Err(e) => {
                tracing::warn!(error = %e, "failed to serialize JSON body");
                self
            }
        }
    }

    /// Route through an HTTP proxy.
    pub fn proxy(mut self, url: impl Into<Url>) -> Self {
        match ProxySettings::new(url) {
            Ok(proxy) => self.with(|r| r.set_proxy(proxy)),
            Err(e) => {
                self.request = Err(e);
                self
            }
        }
    }

    /// Route through an HTTP proxy with prepared settings.
    pub fn proxy_settings(self, proxy: ProxySettings) -> Self {
        self.with(|r| r.set_proxy(proxy))
    }

    /// Per-socket read/write timeout.
    pub fn timeout(self, timeout: impl Into<Timeout>) -> Self {
        let timeout = timeout.into();
        self.with(|r| r.set_timeout(timeout))
    }

    /// Redirect budget. None are followed unless this is set.
    pub fn redirects(self, redirects: i64) -> Self {
        self.with(|r| r.set_redirects(Redirects::new(redirects)))
    }

    pub fn tls_options(self, tls: TlsOptions) -> Self {
        self.with(|r| r.set_tls_options(tls))
    }

    pub fn certificate_file(self, certificate: impl Into<CertificateFile>) -> Self {
        let certificate = certificate.into();
        self.with(|r| r.set_certificate_file(certificate))
    }

    pub fn ca_bundle(self, bundle: impl Into<PathBuf>) -> Self {
        let bundle = bundle.into();
        self.with(|r| r.set_ca_bundle(bundle))
    }

    pub fn revocation_lists(self, lists: impl Into<RevocationLists>) -> Self {
        let lists = lists.into();
        self.with(|r| r.set_revocation_lists(lists))
    }

    pub fn ssl_protocol(self, protocol: SslProtocol) -> Self {
        self.with(|r| r.set_ssl_protocol(protocol))
    }

    /// Toggle peer certificate and hostname verification (on by default).
    pub fn verify_peer(self, verify: bool) -> Self {
        self.with(|r| r.set_verify_peer(verify))
    }

    pub fn resolver(self, resolver: Arc<dyn Resolve>) -> Self {
        self.with(|r| r.set_resolver(resolver))
    }

    pub fn dns_cache(self, cache: DnsCache) -> Self {
        self.with(|r| r.set_dns_cache(cache))
    }

    /// Finish configuration without sending.
    pub fn build(self) -> Result<Request, NetError> {
        self.request
    }

    /// Send the request and wait for the final response.
    pub fn send(self) -> Result<Response, NetError> {
        self.request?.exec()
    }

    /// Send over transports created by `factory`.
    pub fn send_with(self, factory: &dyn StreamFactory) -> Result<Response, NetError> {
        self.request?.exec_with(factory)
    }
}

fn set_body_keeping_method(request: &mut Request, body: RequestBody) {
    let method = request.method().clone();
    request.set_body(body);
    if method != Method::GET && method != Method::HEAD {
        request.set_method(method);
    }
}

/// Start building a GET request.
pub fn get(url: impl Into<Url>) -> RequestBuilder {
    RequestBuilder::new(Method::GET, url)
}

/// Start building a HEAD request.
pub fn head(url: impl Into<Url>) -> RequestBuilder {
    RequestBuilder::new(Method::HEAD, url)
}

/// Start building a POST request.
pub fn post(url: impl Into<Url>) -> RequestBuilder {
    RequestBuilder::new(Method::POST, url)
}

/// Start building a PUT request.
pub fn put(url: impl Into<Url>) -> RequestBuilder {
    RequestBuilder::new(Method::PUT, url)
}

/// Start building a PATCH request.
pub fn patch(url: impl Into<Url>) -> RequestBuilder {
    RequestBuilder::new(Method::PATCH, url)
}

/// Start building a DELETE request.
pub fn delete(url: impl Into<Url>) -> RequestBuilder {
    RequestBuilder::new(Method::DELETE, url)
}

/// Start building an OPTIONS request.
pub fn options(url: impl Into<Url>) -> RequestBuilder {
    RequestBuilder::new(Method::OPTIONS, url)
}

/// Start building a TRACE request.
pub fn trace(url: impl Into<Url>) -> RequestBuilder {
    RequestBuilder::new(Method::TRACE, url)
}

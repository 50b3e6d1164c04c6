use crate::base::neterror::NetError;
use crate::dns::{DnsCache, GaiResolver, Resolve};
use crate::http::auth::{Authentication, Digest};
use crate::http::cookies::Cookies;
use crate::http::header::Header;
use crate::http::multipart::Multipart;
use crate::http::options::{Redirects, Timeout};
use crate::http::parameters::Parameters;
use crate::http::requestbody::RequestBody;
use crate::http::response::Response;
use crate::http::streamfactory::{HttpStreamFactory, StreamFactory};
use crate::http::url::Url;
use crate::socket::proxy::ProxySettings;
use crate::socket::tls::{CertificateFile, RevocationLists, SslProtocol, TlsOptions, VerifyPeer};
use crate::urlrequest::job::HttpJob;
use http::Method;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// All options of one logical request.
///
/// Setters copy their value in; [`exec`](Self::exec) runs the request,
/// following redirects and answering a digest challenge as configured, and
/// leaves the options untouched so the same request can be sent again.
#[derive(Clone)]
pub struct Request {
    method: Method,
    url: Url,
    parameters: Parameters,
    headers: Header,
    auth: Authentication,
    digest: Digest,
    cookies: Cookies,
    multipart: Option<Multipart>,
    body: RequestBody,
    proxy: Option<ProxySettings>,
    timeout: Timeout,
    redirects: Redirects,
    tls: TlsOptions,
    resolver: Arc<dyn Resolve>,
    dns_cache: Option<DnsCache>,
}

impl Default for Request {
    fn default() -> Self {
        Self {
            method: Method::GET,
            url: Url::default(),
            parameters: Parameters::new(),
            headers: Header::new(),
            auth: Authentication::default(),
            digest: Digest::default(),
            cookies: Cookies::new(),
            multipart: None,
            body: RequestBody::Empty,
            proxy: None,
            timeout: Timeout::default(),
            redirects: Redirects::default(),
            tls: TlsOptions::default(),
            resolver: Arc::new(GaiResolver::new()),
            dns_cache: None,
        }
    }
}

impl Request {
    /// A `method` request to `url`. Fails for relative URLs.
    pub fn new(method: Method, url: impl Into<Url>) -> Result<Self, NetError> {
        let mut request = Self {
            method,
            ..Self::default()
        };
        request.set_url(url)?;
        Ok(request)
    }

    /// Set the target. Only absolute URLs are accepted.
    pub fn set_url(&mut self, url: impl Into<Url>) -> Result<(), NetError> {
        let url = url.into();
        if url.is_relative() {
            return Err(NetError::RelativeUrl(url.to_string()));
        }
        self.url = url;
        Ok(())
    }

    pub fn set_method(&mut self, method: Method) {
        self.method = method;
    }

    pub fn set_parameters(&mut self, parameters: Parameters) {
        self.parameters = parameters;
    }

    /// Replace the custom headers.
    pub fn set_headers(&mut self, headers: Header) {
        self.headers = headers;
    }

    /// Set one custom header, replacing an earlier value.
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.insert(name, value);
    }

    /// Basic credentials, sent as `Authorization: Basic …` unless an
    /// `Authorization` header is set explicitly.
    pub fn set_auth(&mut self, auth: Authentication) {
        self.auth = auth;
    }

    /// Credentials used to answer a `401` digest challenge.
    pub fn set_digest(&mut self, digest: Digest) {
        self.digest = digest;
    }

    pub fn set_cookies(&mut self, cookies: Cookies) {
        self.cookies = cookies;
    }

    pub fn set_multipart(&mut self, multipart: Multipart) {
        self.multipart = Some(multipart);
    }

    /// Raw request body. Setting a non-empty body turns the request into a
    /// POST.
    pub fn set_body(&mut self, body: impl Into<RequestBody>) {
        self.body = body.into();
        if !self.body.is_empty() {
            self.method = Method::POST;
        }
    }

    pub fn set_proxy(&mut self, proxy: ProxySettings) {
        self.proxy = Some(proxy);
    }

    pub fn set_timeout(&mut self, timeout: impl Into<Timeout>) {
        self.timeout = timeout.into();
    }

    /// How many redirects may be followed. Zero (the default) follows none.
    pub fn set_redirects(&mut self, redirects: impl Into<Redirects>) {
        self.redirects = redirects.into();
    }

    pub fn set_tls_options(&mut self, tls: TlsOptions) {
        self.tls = tls;
    }

    pub fn set_certificate_file(&mut self, certificate: impl Into<CertificateFile>) {
        self.tls.certificate = Some(certificate.into());
    }

    pub fn set_ca_bundle(&mut self, bundle: impl Into<PathBuf>) {
        self.tls.ca_bundle = Some(bundle.into());
    }

    pub fn set_revocation_lists(&mut self, lists: impl Into<RevocationLists>) {
        self.tls.revocation_lists = Some(lists.into());
    }

    pub fn set_ssl_protocol(&mut self, protocol: SslProtocol) {
        self.tls.protocol = protocol;
    }

    pub fn set_verify_peer(&mut self, verify: impl Into<VerifyPeer>) {
        self.tls.verify_peer = verify.into();
    }

    pub fn set_resolver(&mut self, resolver: Arc<dyn Resolve>) {
        self.resolver = resolver;
    }

    /// Share a DNS cache with other requests.
    pub fn set_dns_cache(&mut self, cache: DnsCache) {
        self.dns_cache = Some(cache);
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    pub fn headers(&self) -> &Header {
        &self.headers
    }

    pub fn auth(&self) -> &Authentication {
        &self.auth
    }

    pub fn digest(&self) -> &Digest {
        &self.digest
    }

    pub fn cookies(&self) -> &Cookies {
        &self.cookies
    }

    pub fn multipart(&self) -> Option<&Multipart> {
        self.multipart.as_ref()
    }

    pub fn body(&self) -> &RequestBody {
        &self.body
    }

    pub fn proxy(&self) -> Option<&ProxySettings> {
        self.proxy.as_ref()
    }

    pub fn timeout(&self) -> Timeout {
        self.timeout
    }

    pub fn redirects(&self) -> Redirects {
        self.redirects
    }

    pub fn tls_options(&self) -> &TlsOptions {
        &self.tls
    }

    pub fn verify_peer(&self) -> VerifyPeer {
        self.tls.verify_peer
    }

    pub fn resolver(&self) -> &Arc<dyn Resolve> {
        &self.resolver
    }

    pub fn dns_cache(&self) -> Option<&DnsCache> {
        self.dns_cache.as_ref()
    }

    /// Run the request and return the final response.
    ///
    /// HTTP error statuses are returned as responses; only configuration,
    /// connection, TLS and framing failures are errors.
    pub fn exec(&self) -> Result<Response, NetError> {
        self.exec_with(&HttpStreamFactory)
    }

    /// Run the request over transports created by `factory`.
    pub fn exec_with(&self, factory: &dyn StreamFactory) -> Result<Response, NetError> {
        HttpJob::new(self.clone(), factory).run()
    }

    // The engine's working copy changes as redirects are followed.
    pub(crate) fn url_mut(&mut self) -> &mut Url {
        &mut self.url
    }

    /// Drop everything a body could be built from (303 handling).
    pub(crate) fn clear_body(&mut self) {
        self.parameters = Parameters::new();
        self.multipart = None;
        self.body = RequestBody::Empty;
        self.headers.remove("Content-Type");
        self.headers.remove("Content-Length");
    }

    pub(crate) fn take_redirect(&mut self) -> bool {
        self.redirects.take()
    }
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("headers", &self.headers)
            .field("proxy", &self.proxy)
            .field("timeout", &self.timeout)
            .field("redirects", &self.redirects)
            .field("tls", &self.tls)
            .finish_non_exhaustive()
    }
}

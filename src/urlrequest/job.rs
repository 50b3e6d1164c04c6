use crate::base::loadstate::LoadState;
use crate::base::neterror::NetError;
use crate::http::digestauth::DigestChallenge;
use crate::http::response::Response;
use crate::http::streamfactory::StreamFactory;
use crate::http::transaction::{HttpTransaction, MessageParts};
use crate::http::url::Url;
use crate::socket::connection::Connection;
use crate::socket::connectjob::ConnectJob;
use crate::socket::stream::{BoxedSocket, StreamSocket};
use crate::socket::tls::{SslProtocol, DEFAULT_CIPHER_LIST};
use crate::urlrequest::request::Request;
use http::Method;

/// Drives one request through open → send → receive, then either finishes,
/// follows a redirect, or answers a digest challenge once.
pub struct HttpJob<'f> {
    request: Request,
    factory: &'f dyn StreamFactory,
    connect_job: ConnectJob,
    state: LoadState,
    connection: Option<Connection<BoxedSocket>>,
    transaction: Option<HttpTransaction>,
    response: Option<Response>,
    challenge: Option<DigestChallenge>,
    auth_retried: bool,
    redirects_followed: usize,
}

impl<'f> HttpJob<'f> {
    pub fn new(request: Request, factory: &'f dyn StreamFactory) -> Self {
        let mut connect_job = ConnectJob::new(request.resolver().clone());
        if let Some(cache) = request.dns_cache() {
            connect_job = connect_job.with_cache(cache.clone());
        }
        Self {
            request,
            factory,
            connect_job,
            state: LoadState::Unopened,
            connection: None,
            transaction: None,
            response: None,
            challenge: None,
            auth_retried: false,
            redirects_followed: 0,
        }
    }

    /// Get the current load state (for progress reporting).
    pub fn load_state(&self) -> LoadState {
        self.state
    }

    pub fn redirects_followed(&self) -> usize {
        self.redirects_followed
    }

    /// Run to completion and return the final response.
    pub fn run(mut self) -> Result<Response, NetError> {
        let result = self.do_loop();
        self.close();
        result?;

        let mut response = self.response.take().ok_or(NetError::EmptyResponse)?;
        response.set_url(self.request.url().clone());
        Ok(response)
    }

    fn do_loop(&mut self) -> Result<(), NetError> {
        loop {
            tracing::trace!(state = ?self.state, url = %self.request.url(), "http job step");
            self.state = match self.state {
                LoadState::Unopened => self.do_open()?,
                LoadState::Opened => self.do_send()?,
                LoadState::Sent => self.do_read_response()?,
                LoadState::AwaitingResponse => self.do_classify()?,
                LoadState::Redirecting => self.do_redirect()?,
                LoadState::RetryingAuth => self.do_retry_auth()?,
                LoadState::Done => return Ok(()),
            };
        }
    }

    /// Create a transport for the URL scheme, apply TLS options and the
    /// timeout, then connect to the origin (or the proxy). The timeout bounds
    /// the connect and any TLS handshake as well as later reads and writes.
    fn do_open(&mut self) -> Result<LoadState, NetError> {
        let url = self.request.url();
        if url.is_relative() {
            return Err(NetError::RelativeUrl(url.to_string()));
        }
        let mut socket = self.factory.create_socket(url.scheme())?;
        self.apply_tls_options(&mut socket);
        socket.set_timeout(self.request.timeout())?;

        let origin_host = url.hostname().to_string();
        let origin_port = url.port();
        let (host, port) = match self.request.proxy() {
            Some(proxy) => {
                if socket.is_secure() {
                    socket.set_tunnel(proxy.tunnel_to(&origin_host, origin_port));
                }
                let (host, port) = proxy.host_port();
                (host.to_string(), port)
            }
            None => (origin_host.clone(), origin_port),
        };

        let addr = self
            .connect_job
            .connect(&mut socket, &host, port, &origin_host)?;
        tracing::debug!(host = %origin_host, addr = %addr, secure = socket.is_secure(), "connected");

        self.connection = Some(Connection::new(socket));
        Ok(LoadState::Opened)
    }

    /// TLS options are only pushed when they differ from the defaults, so a
    /// plaintext transport warns only about settings the caller asked for.
    fn apply_tls_options(&self, socket: &mut BoxedSocket) {
        let tls = self.request.tls_options();
        if let Some(certificate) = &tls.certificate {
            socket.set_certificate_file(certificate.clone());
        }
        if let Some(bundle) = &tls.ca_bundle {
            socket.set_ca_bundle(bundle);
        }
        if let Some(lists) = &tls.revocation_lists {
            socket.set_revocation_lists(lists.clone());
        }
        if tls.protocol != SslProtocol::default() {
            socket.set_ssl_protocol(tls.protocol);
        }
        if !tls.verify_peer.is_enabled() {
            socket.set_verify_peer(tls.verify_peer);
        }
        if tls.cipher_list != DEFAULT_CIPHER_LIST {
            socket.set_cipher_list(&tls.cipher_list);
        }
    }

    fn do_send(&mut self) -> Result<LoadState, NetError> {
        let mut transaction = self.build_transaction()?;

        if let Some(challenge) = self.challenge.as_mut() {
            let authorization = challenge.authorization(
                transaction.method().as_str(),
                transaction.uri(),
                self.request.digest().credentials(),
                transaction.body(),
            )?;
            transaction
                .headers_mut()
                .insert("Authorization", authorization);
        }

        let conn = self
            .connection
            .as_mut()
            .ok_or(NetError::SocketNotConnected)?;
        transaction.write_to(conn)?;
        self.transaction = Some(transaction);
        Ok(LoadState::Sent)
    }

    fn build_transaction(&self) -> Result<HttpTransaction, NetError> {
        let request = &self.request;
        let absolute_form = request.proxy().is_some()
            && request.url().scheme().eq_ignore_ascii_case("http");

        let mut headers = request.headers().clone();
        if request.auth().is_set() {
            headers.insert_default("Authorization", request.auth().basic());
        }
        if !request.cookies().is_empty() {
            headers.insert_default("Cookie", request.cookies().encode());
        }
        if absolute_form {
            if let Some(auth) = request.proxy().and_then(|p| p.get_auth_header()) {
                headers.insert_default("Proxy-Authorization", auth);
            }
        }

        HttpTransaction::build(MessageParts {
            method: request.method(),
            url: request.url(),
            headers: &headers,
            parameters: request.parameters(),
            multipart: request.multipart(),
            body: request.body(),
            absolute_form,
        })
    }

    fn do_read_response(&mut self) -> Result<LoadState, NetError> {
        let transaction = self
            .transaction
            .as_ref()
            .ok_or(NetError::SocketNotConnected)?;
        let conn = self
            .connection
            .as_mut()
            .ok_or(NetError::SocketNotConnected)?;
        let response = transaction.read_response(conn)?;
        tracing::debug!(
            status = response.status_code(),
            url = %self.request.url(),
            "response received"
        );
        self.response = Some(response);
        Ok(LoadState::AwaitingResponse)
    }

    fn do_classify(&mut self) -> Result<LoadState, NetError> {
        let response = self.response.as_ref().ok_or(NetError::EmptyResponse)?;

        // The digest retry is single-shot: whatever comes back is final.
        if self.auth_retried {
            return Ok(LoadState::Done);
        }

        if response.unauthorized() && self.request.digest().is_set() {
            let header = response.header("www-authenticate").unwrap_or_default();
            return match find_digest_challenge(header).map(DigestChallenge::parse_challenge) {
                Some(Ok(challenge)) => {
                    tracing::debug!(realm = challenge.realm(), "answering digest challenge");
                    self.challenge = Some(challenge);
                    Ok(LoadState::RetryingAuth)
                }
                Some(Err(e)) => {
                    tracing::warn!(error = %e, "unusable digest challenge");
                    Ok(LoadState::Done)
                }
                None => {
                    tracing::warn!("401 without a digest challenge");
                    Ok(LoadState::Done)
                }
            };
        }

        if response.redirect_method(self.request.method()).is_none() {
            return Ok(LoadState::Done);
        }
        if response.location().is_none() {
            tracing::debug!(status = response.status_code(), "redirect without Location");
            return Ok(LoadState::Done);
        }
        if !self.request.take_redirect() {
            tracing::debug!(status = response.status_code(), "redirect budget exhausted");
            return Ok(LoadState::Done);
        }
        Ok(LoadState::Redirecting)
    }

    fn do_redirect(&mut self) -> Result<LoadState, NetError> {
        let response = self.response.as_ref().ok_or(NetError::EmptyResponse)?;
        let location = response.location().unwrap_or_default().trim().to_string();
        let next_method = response
            .redirect_method(self.request.method())
            .unwrap_or(Method::GET);
        let mut reconnect =
            response.closes_connection() || self.request.headers().close_connection();

        let current = self.request.url().clone();
        let target = resolve_location(&current, &location);
        if !target.scheme().eq_ignore_ascii_case(current.scheme())
            || !target.host().eq_ignore_ascii_case(current.host())
        {
            reconnect = true;
        }

        tracing::debug!(
            from = %current,
            to = %target,
            status = response.status_code(),
            reconnect,
            "following redirect"
        );

        if next_method != *self.request.method() {
            self.request.set_method(next_method);
            self.request.clear_body();
        }
        *self.request.url_mut() = target;
        self.redirects_followed += 1;
        self.transaction = None;

        Ok(self.next_exchange(reconnect))
    }

    fn do_retry_auth(&mut self) -> Result<LoadState, NetError> {
        self.auth_retried = true;
        let response = self.response.as_ref().ok_or(NetError::EmptyResponse)?;
        let reconnect = response.closes_connection() || self.request.headers().close_connection();
        self.transaction = None;
        Ok(self.next_exchange(reconnect))
    }

    /// Keep the connection for the next exchange unless it must be replaced.
    fn next_exchange(&mut self, reconnect: bool) -> LoadState {
        let reusable = self
            .connection
            .as_ref()
            .is_some_and(|conn| conn.socket().is_connected() && !conn.is_peer_closed());
        if reconnect || !reusable {
            self.close();
            LoadState::Unopened
        } else {
            LoadState::Opened
        }
    }

    fn close(&mut self) {
        if let Some(mut conn) = self.connection.take() {
            conn.socket_mut().close();
        }
    }
}

/// Resolve a `Location` value against the URL that produced it.
///
/// Absolute locations replace the URL; `//host/…` keeps the scheme;
/// `/path` replaces path and query; `?query` replaces the query; anything
/// else replaces the last path segment.
fn resolve_location(current: &Url, location: &str) -> Url {
    if let Some(rest) = location.strip_prefix("//") {
        return Url::new(format!("{}://{}", current.scheme(), rest));
    }
    if has_scheme(location) {
        return Url::new(location);
    }

    let mut next = current.clone();
    if location.starts_with('/') {
        next.set_path(location);
    } else if location.starts_with('?') {
        let path = current.path();
        let base = path.split('?').next().unwrap_or(path);
        next.set_path(&format!("{base}{location}"));
    } else {
        next.set_file(location);
    }
    next
}

/// `scheme://` before any path character.
fn has_scheme(location: &str) -> bool {
    match location.find("://") {
        Some(idx) => !location[..idx].contains(['/', '?', '#']),
        None => false,
    }
}

/// The digest challenge inside a possibly multi-scheme `WWW-Authenticate`.
fn find_digest_challenge(header: &str) -> Option<&str> {
    let lower = header.to_ascii_lowercase();
    let mut from = 0;
    while let Some(idx) = lower[from..].find("digest") {
        let start = from + idx;
        let at_token_start = start == 0
            || matches!(lower.as_bytes()[start - 1], b' ' | b',' | b'\t');
        let followed_by_space = lower.as_bytes().get(start + 6) == Some(&b' ');
        if at_token_start && followed_by_space {
            return Some(&header[start..]);
        }
        from = start + 6;
    }
    None
}

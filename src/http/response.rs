//! HTTP/1.1 response model and parser.
//!
//! A [`Response`] is built once from a connection and never changes after.
//! Every header lands in [`Response::headers`]; `Set-Cookie` values are
//! additionally split into [`Response::cookies`], `Transfer-Encoding` into
//! [`TransferEncoding`] flags and `Content-Type` into a [`MimeType`] plus
//! charset.

use crate::base::neterror::NetError;
use crate::http::cookies::Cookies;
use crate::http::header::Header;
use crate::http::url::Url;
use crate::socket::connection::Connection;
use bytes::Bytes;
use http::{Method, StatusCode, Version};
use std::fmt;
use std::io::{Cursor, Read, Write};
use std::ops::{BitOr, BitOrAssign};

/// Flag set parsed from `Transfer-Encoding`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TransferEncoding(u8);

impl TransferEncoding {
    pub const NONE: Self = Self(0);
    pub const CHUNKED: Self = Self(1);
    pub const COMPRESS: Self = Self(2);
    pub const DEFLATE: Self = Self(4);
    pub const GZIP: Self = Self(8);
    pub const IDENTITY: Self = Self(16);

    /// Parse a comma-separated coding list, case-insensitively. Unknown
    /// codings are ignored.
    pub fn parse(value: &str) -> Self {
        value
            .split(',')
            .map(|coding| match coding.trim().to_ascii_lowercase().as_str() {
                "chunked" => Self::CHUNKED,
                "compress" | "x-compress" => Self::COMPRESS,
                "deflate" => Self::DEFLATE,
                "gzip" | "x-gzip" => Self::GZIP,
                "identity" => Self::IDENTITY,
                _ => Self::NONE,
            })
            .fold(Self::NONE, |acc, flag| acc | flag)
    }

    pub fn bits(&self) -> u8 {
        self.0
    }

    pub fn contains(&self, other: Self) -> bool {
        self.0 & other.0 == other.0 && other.0 != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Whether the body must be read with the chunked algorithm: any coding
    /// other than a lone `identity`.
    pub fn is_chunked_body(&self) -> bool {
        !self.is_empty() && *self != Self::IDENTITY
    }
}

impl BitOr for TransferEncoding {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for TransferEncoding {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// Primary media type of a `Content-Type` (RFC 2045 §5.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentKind {
    Application,
    Audio,
    Image,
    Message,
    Multipart,
    Text,
    Video,
    /// An `x-` extension or any unregistered type.
    XToken,
}

impl ContentKind {
    pub fn parse(token: &str) -> Self {
        match token.trim().to_ascii_lowercase().as_str() {
            "application" => ContentKind::Application,
            "audio" => ContentKind::Audio,
            "image" => ContentKind::Image,
            "message" => ContentKind::Message,
            "multipart" => ContentKind::Multipart,
            "text" => ContentKind::Text,
            "video" => ContentKind::Video,
            _ => ContentKind::XToken,
        }
    }
}

/// `type/subtype` from a `Content-Type` header.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MimeType {
    kind: ContentKind,
    type_name: String,
    subtype: String,
}

impl MimeType {
    /// Parse the media type portion of a `Content-Type` value (parameters
    /// after `;` are ignored). `None` for an empty value.
    pub fn parse(value: &str) -> Option<Self> {
        let essence = value.split(';').next()?.trim();
        if essence.is_empty() {
            return None;
        }
        let (type_name, subtype) = essence.split_once('/').unwrap_or((essence, ""));
        Some(Self {
            kind: ContentKind::parse(type_name),
            type_name: type_name.trim().to_ascii_lowercase(),
            subtype: subtype.trim().to_ascii_lowercase(),
        })
    }

    pub fn kind(&self) -> ContentKind {
        self.kind
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn subtype(&self) -> &str {
        &self.subtype
    }
}

impl fmt::Display for MimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.type_name, self.subtype)
    }
}

/// Extract `charset=` from a `Content-Type` value, unquoted.
fn parse_charset(value: &str) -> Option<String> {
    value.split(';').skip(1).find_map(|param| {
        let (name, val) = param.split_once('=')?;
        name.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| val.trim().trim_matches('"').to_string())
            .filter(|charset| !charset.is_empty())
    })
}

/// A parsed HTTP response.
#[derive(Debug, Clone, Default)]
pub struct Response {
    status: Option<StatusCode>,
    version: Version,
    reason: String,
    headers: Header,
    cookies: Cookies,
    transfer_encoding: TransferEncoding,
    mime: Option<MimeType>,
    charset: Option<String>,
    body: Bytes,
    close_delimited: bool,
    url: Option<Url>,
}

impl Response {
    /// Read one response from `conn`.
    ///
    /// The body is framed by, in order of preference: chunked transfer coding
    /// (any `Transfer-Encoding` other than a lone `identity`), then
    /// `Content-Length`, then connection close. Responses to `HEAD` and
    /// `1xx`/`204`/`304` responses carry no body.
    pub fn read_from<S: Read + Write>(
        conn: &mut Connection<S>,
        method: &Method,
    ) -> Result<Self, NetError> {
        let head = conn.read_headers()?;
        let mut response = Self::parse_head(&head)?;

        response.body = if response.is_bodiless(method) {
            Bytes::new()
        } else if response.transfer_encoding.is_chunked_body() {
            conn.read_chunked()?
        } else if let Some(len) = response.headers.content_length() {
            conn.read_exact(len)?
        } else {
            response.close_delimited = true;
            conn.read_to_close()?
        };

        tracing::debug!(
            status = response.status_code(),
            body_len = response.body.len(),
            chunked = response.transfer_encoding.is_chunked_body(),
            "response parsed"
        );
        Ok(response)
    }

    /// Parse a complete response held in memory, as if read from a socket
    /// that closes after the last byte.
    pub fn from_bytes(raw: &[u8], method: &Method) -> Result<Self, NetError> {
        let mut conn = Connection::new(Cursor::new(raw.to_vec()));
        Self::read_from(&mut conn, method)
    }

    /// Parse the status line and header block (without the blank line).
    pub fn parse_head(block: &[u8]) -> Result<Self, NetError> {
        let text = String::from_utf8_lossy(block);
        let mut lines = text.split('\n').map(|line| line.trim_end_matches('\r'));

        let status_line = lines.next().unwrap_or_default();
        if status_line.trim().is_empty() {
            return Err(NetError::EmptyResponse);
        }

        let mut response = Self::default();
        let mut parts = status_line.splitn(3, ' ');
        response.version = match parts.next() {
            Some("HTTP/1.0") => Version::HTTP_10,
            _ => Version::HTTP_11,
        };
        response.status = Some(
            parts
                .next()
                .and_then(|code| code.trim().parse::<u16>().ok())
                .and_then(|code| StatusCode::from_u16(code).ok())
                .unwrap_or(StatusCode::OK),
        );
        response.reason = parts.next().unwrap_or_default().trim().to_string();

        for line in lines {
            let Some((name, value)) = line.split_once(':') else {
                continue;
            };
            let name = name.trim();
            let value = value.trim();
            if name.is_empty() {
                continue;
            }

            match name.to_ascii_lowercase().as_str() {
                "set-cookie" => {
                    response.cookies.add_set_cookie(value);
                    continue;
                }
                "transfer-encoding" => {
                    response.transfer_encoding |= TransferEncoding::parse(value);
                }
                "content-type" => {
                    response.mime = MimeType::parse(value);
                    response.charset = parse_charset(value);
                }
                _ => {}
            }
            response.headers.append(name, value);
        }

        Ok(response)
    }

    fn is_bodiless(&self, method: &Method) -> bool {
        let code = self.status_code();
        *method == Method::HEAD
            || (100..200).contains(&code)
            || code == StatusCode::NO_CONTENT.as_u16()
            || code == StatusCode::NOT_MODIFIED.as_u16()
    }

    pub(crate) fn set_url(&mut self, url: Url) {
        self.url = Some(url);
    }

    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    /// Numeric status, 0 for an empty response.
    pub fn status_code(&self) -> u16 {
        self.status.map_or(0, |status| status.as_u16())
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn headers(&self) -> &Header {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    pub fn cookies(&self) -> &Cookies {
        &self.cookies
    }

    pub fn transfer_encoding(&self) -> TransferEncoding {
        self.transfer_encoding
    }

    pub fn mime(&self) -> Option<&MimeType> {
        self.mime.as_ref()
    }

    pub fn charset(&self) -> Option<&str> {
        self.charset.as_deref()
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn into_body(self) -> Bytes {
        self.body
    }

    /// The URL this response was finally fetched from, after redirects.
    pub fn url(&self) -> Option<&Url> {
        self.url.as_ref()
    }

    /// Body decoded as UTF-8, invalid sequences replaced.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    #[cfg(feature = "json")]
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_slice(&self.body)
    }

    /// 2xx.
    pub fn ok(&self) -> bool {
        self.status.is_some_and(|status| status.is_success())
    }

    pub fn unauthorized(&self) -> bool {
        self.status == Some(StatusCode::UNAUTHORIZED)
    }

    /// The method to follow this response's `Location` with, if it is a
    /// redirect that `method` may follow.
    ///
    /// 301, 302, 307 and 308 are only followed for `GET` and `HEAD`; 303 is
    /// always followed, as `GET`.
    pub fn redirect_method(&self, method: &Method) -> Option<Method> {
        match self.status?.as_u16() {
            303 => Some(Method::GET),
            301 | 302 | 307 | 308 if *method == Method::GET || *method == Method::HEAD => {
                Some(method.clone())
            }
            _ => None,
        }
    }

    pub fn location(&self) -> Option<&str> {
        self.headers.get("location")
    }

    pub fn is_json(&self) -> bool {
        self.mime
            .as_ref()
            .is_some_and(|mime| mime.subtype == "json" || mime.subtype.ends_with("+json"))
    }

    pub fn is_xml(&self) -> bool {
        self.mime
            .as_ref()
            .is_some_and(|mime| mime.subtype == "xml" || mime.subtype.ends_with("+xml"))
    }

    pub fn is_chunked(&self) -> bool {
        self.transfer_encoding.contains(TransferEncoding::CHUNKED)
    }

    pub fn content_encoding(&self) -> Option<&str> {
        self.headers.get("content-encoding")
    }

    /// Whether anything at all was parsed.
    pub fn has_content(&self) -> bool {
        self.status.is_some()
            || !self.headers.is_empty()
            || !self.cookies.is_empty()
            || !self.transfer_encoding.is_empty()
            || self.charset.is_some()
            || !self.body.is_empty()
    }

    /// Whether the connection cannot carry another request: the server said
    /// `Connection: close`, the body ran to connection close, or an HTTP/1.0
    /// peer did not ask for keep-alive.
    pub fn closes_connection(&self) -> bool {
        if self.headers.close_connection() || self.close_delimited {
            return true;
        }
        self.version == Version::HTTP_10
            && !self
                .headers
                .connection()
                .is_some_and(|value| value.eq_ignore_ascii_case("keep-alive"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> Response {
        Response::from_bytes(raw.as_bytes(), &Method::GET).unwrap()
    }

    #[test]
    fn test_content_length_body() {
        let response = parse("HTTP/1.1 200 OK\r\nContent-Length: 5\r\n\r\nhello");
        assert_eq!(response.status(), Some(StatusCode::OK));
        assert_eq!(response.reason(), "OK");
        assert_eq!(response.text(), "hello");
        assert!(response.ok());
        assert!(!response.closes_connection());
    }

    #[test]
    fn test_chunked_body() {
        let response =
            parse("HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n5\r\nhello\r\n0\r\n\r\n");
        assert_eq!(response.text(), "hello");
        assert!(response.is_chunked());
    }

    #[test]
    fn test_close_delimited_body() {
        let response = parse("HTTP/1.1 200 OK\r\nX-Test: 1\r\n\r\nworld");
        assert_eq!(response.text(), "world");
        assert!(response.closes_connection());
    }

    #[test]
    fn test_identity_uses_content_length() {
        let response = parse(
            "HTTP/1.1 200 OK\r\nTransfer-Encoding: identity\r\nContent-Length: 3\r\n\r\nabcdef",
        );
        assert_eq!(response.text(), "abc");
        assert_eq!(response.transfer_encoding(), TransferEncoding::IDENTITY);
    }

    #[test]
    fn test_transfer_encoding_flags() {
        let flags = TransferEncoding::parse("gzip, Chunked");
        assert!(flags.contains(TransferEncoding::GZIP));
        assert!(flags.contains(TransferEncoding::CHUNKED));
        assert!(!flags.contains(TransferEncoding::DEFLATE));
        assert_eq!(flags.bits(), 9);
        assert!(flags.is_chunked_body());
        assert!(!TransferEncoding::IDENTITY.is_chunked_body());
        assert!(!TransferEncoding::NONE.is_chunked_body());
    }

    #[test]
    fn test_unparseable_status_defaults_to_200() {
        let response = parse("ICY abc Whatever\r\nContent-Length: 0\r\n\r\n");
        assert_eq!(response.status_code(), 200);
    }

    #[test]
    fn test_empty_response() {
        let err = Response::from_bytes(b"", &Method::GET).unwrap_err();
        assert!(matches!(err, NetError::EmptyResponse));
    }

    #[test]
    fn test_cookies_and_headers() {
        let response = parse(
            "HTTP/1.1 200 OK\r\n\
             Set-Cookie: session=abc123; Path=/; HttpOnly\r\n\
             set-cookie: theme=dark\r\n\
             X-Custom:   padded value  \r\n\
             Content-Length: 0\r\n\r\n",
        );
        assert_eq!(response.cookies().get("session"), Some("abc123"));
        assert_eq!(response.cookies().get("theme"), Some("dark"));
        assert_eq!(response.header("x-custom"), Some("padded value"));
        assert!(!response.headers().contains("set-cookie"));
    }

    #[test]
    fn test_repeated_headers_joined() {
        let response = parse("HTTP/1.1 200 OK\r\nVia: a\r\nvia: b\r\nContent-Length: 0\r\n\r\n");
        assert_eq!(response.header("Via"), Some("a, b"));
    }

    #[test]
    fn test_mime_and_charset() {
        let response = parse(
            "HTTP/1.1 200 OK\r\nContent-Type: Application/JSON; charset=\"UTF-8\"\r\nContent-Length: 2\r\n\r\n{}",
        );
        let mime = response.mime().unwrap();
        assert_eq!(mime.kind(), ContentKind::Application);
        assert_eq!(mime.subtype(), "json");
        assert_eq!(mime.to_string(), "application/json");
        assert_eq!(response.charset(), Some("UTF-8"));
        assert!(response.is_json());
        assert!(!response.is_xml());
    }

    #[test]
    fn test_content_kinds() {
        assert_eq!(ContentKind::parse("text"), ContentKind::Text);
        assert_eq!(ContentKind::parse("IMAGE"), ContentKind::Image);
        assert_eq!(ContentKind::parse("x-world"), ContentKind::XToken);
        assert!(MimeType::parse("").is_none());
        assert_eq!(
            MimeType::parse("application/atom+xml").unwrap().subtype(),
            "atom+xml"
        );
    }

    #[test]
    fn test_head_has_no_body() {
        let raw = b"HTTP/1.1 200 OK\r\nContent-Length: 1000\r\n\r\n";
        let response = Response::from_bytes(raw, &Method::HEAD).unwrap();
        assert!(response.body().is_empty());
        assert_eq!(response.headers().content_length(), Some(1000));
    }

    #[test]
    fn test_no_content_has_no_body() {
        let response = parse("HTTP/1.1 204 No Content\r\n\r\n");
        assert!(response.body().is_empty());
        assert!(!response.closes_connection());
    }

    #[test]
    fn test_redirect_method() {
        let found = parse("HTTP/1.1 302 Found\r\nLocation: /next\r\nContent-Length: 0\r\n\r\n");
        assert_eq!(found.redirect_method(&Method::GET), Some(Method::GET));
        assert_eq!(found.redirect_method(&Method::HEAD), Some(Method::HEAD));
        assert_eq!(found.redirect_method(&Method::POST), None);
        assert_eq!(found.location(), Some("/next"));

        let see_other = parse("HTTP/1.1 303 See Other\r\nContent-Length: 0\r\n\r\n");
        assert_eq!(see_other.redirect_method(&Method::POST), Some(Method::GET));

        let ok = parse("HTTP/1.1 200 OK\r\nLocation: /elsewhere\r\nContent-Length: 0\r\n\r\n");
        for method in [Method::GET, Method::HEAD, Method::POST, Method::PUT] {
            assert_eq!(ok.redirect_method(&method), None);
        }
    }

    #[test]
    fn test_unauthorized() {
        let response = parse("HTTP/1.1 401 Unauthorized\r\nContent-Length: 0\r\n\r\n");
        assert!(response.unauthorized());
        assert!(!response.ok());
    }

    #[test]
    fn test_http10_closes_by_default() {
        let response = parse("HTTP/1.0 200 OK\r\nContent-Length: 0\r\n\r\n");
        assert!(response.closes_connection());

        let keep = parse("HTTP/1.0 200 OK\r\nConnection: Keep-Alive\r\nContent-Length: 0\r\n\r\n");
        assert!(!keep.closes_connection());
    }

    #[test]
    fn test_has_content() {
        assert!(!Response::default().has_content());
        assert!(parse("HTTP/1.1 200 OK\r\nContent-Length: 0\r\n\r\n").has_content());
    }

    #[cfg(feature = "json")]
    #[test]
    fn test_json_body() {
        #[derive(serde::Deserialize)]
        struct Greeting {
            hello: String,
        }
        let response = parse(
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 17\r\n\r\n{\"hello\":\"world\"}",
        );
        let greeting: Greeting = response.json().unwrap();
        assert_eq!(greeting.hello, "world");
    }
}

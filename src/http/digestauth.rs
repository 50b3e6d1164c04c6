//! HTTP Digest Authentication (RFC 2617).
//!
//! Parses `WWW-Authenticate: Digest ...` challenges and answers them with an
//! `Authorization` header value.
//!
//! ## Supported Features
//! - MD5, MD5-sess and SHA (SHA-1) algorithms
//! - qop=auth and qop=auth-int
//! - Nonce count tracking (`nc`), one client nonce per challenge

use crate::base::neterror::NetError;
use crate::http::auth::Authentication;
use boring::hash::{hash, MessageDigest};
use once_cell::unsync::OnceCell;
use std::fmt::Write;

/// Digest authentication algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DigestAlgorithm {
    /// MD5, also used when the challenge names no algorithm
    #[default]
    Md5,
    /// MD5-sess (session-based)
    Md5Sess,
    /// SHA-1
    Sha1,
}

impl DigestAlgorithm {
    /// Parse algorithm from header value.
    fn parse(s: &str) -> Result<Self, NetError> {
        match s.to_ascii_lowercase().as_str() {
            "md5" => Ok(Self::Md5),
            "md5-sess" => Ok(Self::Md5Sess),
            "sha" | "sha1" | "sha-1" => Ok(Self::Sha1),
            _ => Err(NetError::UnsupportedDigestAlgorithm(s.to_string())),
        }
    }

    /// Get the algorithm name for the Authorization header.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Md5 => "MD5",
            Self::Md5Sess => "MD5-sess",
            Self::Sha1 => "SHA",
        }
    }

    fn message_digest(&self) -> MessageDigest {
        match self {
            Self::Md5 | Self::Md5Sess => MessageDigest::md5(),
            Self::Sha1 => MessageDigest::sha1(),
        }
    }

    fn is_session(&self) -> bool {
        matches!(self, Self::Md5Sess)
    }
}

/// Quality of protection chosen for a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Qop {
    /// Authentication only
    Auth,
    /// Authentication with integrity
    AuthInt,
}

impl Qop {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Auth => "auth",
            Self::AuthInt => "auth-int",
        }
    }
}

/// A parsed digest challenge plus the client state needed to answer it.
///
/// The client nonce is generated on first use and then reused for the
/// lifetime of the challenge; the nonce count grows by one per
/// [`authorization`](Self::authorization) call.
#[derive(Debug, Clone)]
pub struct DigestChallenge {
    realm: String,
    nonce: String,
    opaque: Option<String>,
    qop: Vec<String>,
    algorithm: DigestAlgorithm,
    /// Whether the server named the algorithm (echoed back only then)
    algorithm_named: bool,
    stale: bool,
    cnonce: OnceCell<String>,
    nonce_count: u32,
}

impl DigestChallenge {
    /// Parse a challenge, with or without the leading `Digest` scheme token.
    ///
    /// # Example
    /// ```ignore
    /// let challenge = DigestChallenge::parse_challenge(
    ///     r#"Digest realm="test", nonce="abc123", qop="auth", algorithm=MD5"#
    /// )?;
    /// ```
    pub fn parse_challenge(header: &str) -> Result<Self, NetError> {
        let header = header.trim();
        let params = match header.split_once(char::is_whitespace) {
            Some((scheme, rest)) if scheme.eq_ignore_ascii_case("digest") => rest,
            _ if header
                .get(..6)
                .is_some_and(|s| s.eq_ignore_ascii_case("digest")) =>
            {
                return Err(NetError::InvalidAuthChallenge)
            }
            _ => header,
        };

        let mut challenge = Self {
            realm: String::new(),
            nonce: String::new(),
            opaque: None,
            qop: Vec::new(),
            algorithm: DigestAlgorithm::default(),
            algorithm_named: false,
            stale: false,
            cnonce: OnceCell::new(),
            nonce_count: 0,
        };

        for part in split_challenge(params) {
            let (key, value) = parse_param(part)?;
            match key.to_ascii_lowercase().as_str() {
                "realm" => challenge.realm = value.to_string(),
                "nonce" => challenge.nonce = value.to_string(),
                "opaque" => challenge.opaque = Some(value.to_string()),
                "algorithm" => {
                    challenge.algorithm = DigestAlgorithm::parse(value)?;
                    challenge.algorithm_named = true;
                }
                "qop" => {
                    challenge.qop = value
                        .split(',')
                        .map(|q| q.trim().to_ascii_lowercase())
                        .filter(|q| !q.is_empty())
                        .collect();
                }
                "stale" => challenge.stale = value.eq_ignore_ascii_case("true"),
                _ => {}
            }
        }

        if challenge.nonce.is_empty() {
            return Err(NetError::InvalidAuthChallenge);
        }

        Ok(challenge)
    }

    pub fn realm(&self) -> &str {
        &self.realm
    }

    pub fn nonce(&self) -> &str {
        &self.nonce
    }

    pub fn opaque(&self) -> Option<&str> {
        self.opaque.as_deref()
    }

    pub fn algorithm(&self) -> DigestAlgorithm {
        self.algorithm
    }

    /// The qop values the server offered.
    pub fn qop(&self) -> &[String] {
        &self.qop
    }

    /// The server offered `qop=auth`.
    pub fn auth(&self) -> bool {
        self.qop.iter().any(|q| q == "auth")
    }

    /// The server offered `qop=auth-int`.
    pub fn auth_int(&self) -> bool {
        self.qop.iter().any(|q| q == "auth-int")
    }

    /// Check if this challenge indicates stale credentials (nonce expired).
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    /// The client nonce, generated once per challenge.
    pub fn cnonce(&self) -> &str {
        self.cnonce.get_or_init(generate_cnonce)
    }

    pub fn nonce_count(&self) -> u32 {
        self.nonce_count
    }

    /// The current nonce count as eight hex digits.
    pub fn nc(&self) -> String {
        format!("{:08x}", self.nonce_count)
    }

    fn selected_qop(&self) -> Option<Qop> {
        if self.auth() {
            Some(Qop::Auth)
        } else if self.auth_int() {
            Some(Qop::AuthInt)
        } else {
            None
        }
    }

    /// Compute the `response` digest for the current nonce count.
    ///
    /// `body` only contributes under `qop=auth-int`.
    pub fn compute_response(
        &self,
        method: &str,
        uri: &str,
        credentials: &Authentication,
        body: &[u8],
    ) -> Result<String, NetError> {
        let md = self.algorithm.message_digest();

        // HA1 = H(user:realm:password)
        let a1 = format!(
            "{}:{}:{}",
            credentials.username(),
            self.realm,
            credentials.password()
        );
        let mut ha1 = hex_digest(md, a1.as_bytes())?;

        // For session algorithms: HA1 = H(H(user:realm:pass):nonce:cnonce)
        if self.algorithm.is_session() {
            let sess = format!("{}:{}:{}", ha1, self.nonce, self.cnonce());
            ha1 = hex_digest(md, sess.as_bytes())?;
        }

        // HA2 = H(method:uri) or H(method:uri:H(body))
        let qop = self.selected_qop();
        let a2 = match qop {
            Some(Qop::AuthInt) => format!("{}:{}:{}", method, uri, hex_digest(md, body)?),
            _ => format!("{}:{}", method, uri),
        };
        let ha2 = hex_digest(md, a2.as_bytes())?;

        let response = match qop {
            Some(qop) => format!(
                "{}:{}:{}:{}:{}:{}",
                ha1,
                self.nonce,
                self.nc(),
                self.cnonce(),
                qop.as_str(),
                ha2
            ),
            None => format!("{}:{}:{}", ha1, self.nonce, ha2),
        };

        hex_digest(md, response.as_bytes())
    }

    /// Bump the nonce count and build the `Authorization` header value.
    pub fn authorization(
        &mut self,
        method: &str,
        uri: &str,
        credentials: &Authentication,
        body: &[u8],
    ) -> Result<String, NetError> {
        self.nonce_count += 1;
        let response = self.compute_response(method, uri, credentials, body)?;

        let mut auth = format!(
            "Digest username=\"{}\", realm=\"{}\", nonce=\"{}\", uri=\"{}\", response=\"{}\"",
            credentials.username(),
            self.realm,
            self.nonce,
            uri,
            response
        );

        if let Some(qop) = self.selected_qop() {
            let _ = write!(
                auth,
                ", qop={}, nc={}, cnonce=\"{}\"",
                qop.as_str(),
                self.nc(),
                self.cnonce()
            );
        }

        if let Some(ref opaque) = self.opaque {
            let _ = write!(auth, ", opaque=\"{}\"", opaque);
        }

        if self.algorithm_named {
            let _ = write!(auth, ", algorithm={}", self.algorithm.as_str());
        }

        Ok(auth)
    }

    #[cfg(test)]
    fn with_cnonce(self, cnonce: &str) -> Self {
        let _ = self.cnonce.set(cnonce.to_string());
        self
    }
}

/// Split challenge into individual parameters, honouring quoted commas.
fn split_challenge(header: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut in_quotes = false;

    for (i, c) in header.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                let part = header[start..i].trim();
                if !part.is_empty() {
                    parts.push(part);
                }
                start = i + 1;
            }
            _ => {}
        }
    }

    let part = header[start..].trim();
    if !part.is_empty() {
        parts.push(part);
    }

    parts
}

/// Parse a single key=value or key="value" parameter.
fn parse_param(param: &str) -> Result<(&str, &str), NetError> {
    let (key, value) = param
        .split_once('=')
        .ok_or(NetError::InvalidAuthChallenge)?;
    let mut value = value.trim();

    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        value = &value[1..value.len() - 1];
    }

    Ok((key.trim(), value))
}

/// Lowercase hex of `data` hashed with `md`.
pub(crate) fn hex_digest(md: MessageDigest, data: &[u8]) -> Result<String, NetError> {
    let digest = hash(md, data).map_err(|_| NetError::SslProtocolError)?;
    Ok(to_hex(&digest))
}

pub(crate) fn to_hex(bytes: &[u8]) -> String {
    let mut hex = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        let _ = write!(hex, "{:02x}", byte);
    }
    hex
}

/// 8 random bytes as hex.
fn generate_cnonce() -> String {
    let mut bytes = [0u8; 8];
    if boring::rand::rand_bytes(&mut bytes).is_err() {
        use std::time::{SystemTime, UNIX_EPOCH};
        let seed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos() as u64;
        bytes = seed.to_be_bytes();
    }
    to_hex(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RFC_CHALLENGE: &str = r#"Digest realm="testrealm@host.com", qop="auth,auth-int", nonce="dcd98b7102dd2f0e8b11d0f600bfb0c093", opaque="5ccc069c403ebaf9f0171e9517f40e41""#;

    #[test]
    fn test_parse_challenge() {
        let challenge = DigestChallenge::parse_challenge(RFC_CHALLENGE).unwrap();

        assert_eq!(challenge.realm(), "testrealm@host.com");
        assert_eq!(challenge.nonce(), "dcd98b7102dd2f0e8b11d0f600bfb0c093");
        assert_eq!(challenge.opaque(), Some("5ccc069c403ebaf9f0171e9517f40e41"));
        assert!(challenge.auth());
        assert!(challenge.auth_int());
        assert_eq!(challenge.algorithm(), DigestAlgorithm::Md5);
    }

    #[test]
    fn test_parse_without_scheme() {
        let challenge = DigestChallenge::parse_challenge(r#"realm="r", nonce="n""#).unwrap();
        assert_eq!(challenge.realm(), "r");
        assert!(challenge.qop().is_empty());
    }

    #[test]
    fn test_parse_algorithms() {
        let sha = DigestChallenge::parse_challenge(r#"Digest nonce="n", algorithm=SHA"#).unwrap();
        assert_eq!(sha.algorithm(), DigestAlgorithm::Sha1);
        let sess =
            DigestChallenge::parse_challenge(r#"Digest nonce="n", algorithm="md5-sess""#).unwrap();
        assert_eq!(sess.algorithm(), DigestAlgorithm::Md5Sess);
    }

    #[test]
    fn test_unknown_algorithm_fails() {
        let err = DigestChallenge::parse_challenge(r#"Digest nonce="n", algorithm=SHA-512-256"#)
            .unwrap_err();
        assert!(matches!(err, NetError::UnsupportedDigestAlgorithm(_)));
    }

    #[test]
    fn test_missing_nonce_fails() {
        assert!(DigestChallenge::parse_challenge(r#"Digest realm="test""#).is_err());
    }

    #[test]
    fn test_quoted_commas() {
        let challenge =
            DigestChallenge::parse_challenge(r#"Digest realm="a, b", nonce="n""#).unwrap();
        assert_eq!(challenge.realm(), "a, b");
    }

    #[test]
    fn test_rfc2617_response() {
        // RFC 2617 section 3.5
        let mut challenge = DigestChallenge::parse_challenge(RFC_CHALLENGE)
            .unwrap()
            .with_cnonce("0a4f113b");
        let credentials = Authentication::new("Mufasa", "Circle Of Life");

        let header = challenge
            .authorization("GET", "/dir/index.html", &credentials, b"")
            .unwrap();

        assert!(header.starts_with("Digest username=\"Mufasa\""));
        assert!(header.contains("response=\"6629fae49393a05397450978507c4ef1\""));
        assert!(header.contains("qop=auth, nc=00000001, cnonce=\"0a4f113b\""));
        assert!(header.contains("opaque=\"5ccc069c403ebaf9f0171e9517f40e41\""));
        assert!(!header.contains("algorithm="));
    }

    #[test]
    fn test_response_is_deterministic() {
        let challenge = DigestChallenge::parse_challenge(RFC_CHALLENGE).unwrap();
        let credentials = Authentication::new("user", "pass");

        let first = challenge
            .compute_response("GET", "/a", &credentials, b"")
            .unwrap();
        let second = challenge
            .compute_response("GET", "/a", &credentials, b"")
            .unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_cnonce_memoized() {
        let challenge = DigestChallenge::parse_challenge(RFC_CHALLENGE).unwrap();
        let first = challenge.cnonce().to_string();
        assert_eq!(first.len(), 16);
        assert_eq!(challenge.cnonce(), first);
    }

    #[test]
    fn test_nonce_count_increments() {
        let mut challenge = DigestChallenge::parse_challenge(RFC_CHALLENGE).unwrap();
        let credentials = Authentication::new("user", "pass");

        let first = challenge.authorization("GET", "/", &credentials, b"").unwrap();
        let second = challenge.authorization("GET", "/", &credentials, b"").unwrap();

        assert!(first.contains("nc=00000001"));
        assert!(second.contains("nc=00000002"));
        assert_ne!(first, second);
    }

    #[test]
    fn test_no_qop_response() {
        let mut challenge =
            DigestChallenge::parse_challenge(r#"Digest realm="r", nonce="n", algorithm=MD5"#)
                .unwrap();
        let header = challenge
            .authorization("GET", "/", &Authentication::new("u", "p"), b"")
            .unwrap();
        assert!(!header.contains("qop="));
        assert!(header.ends_with(", algorithm=MD5"));
    }

    #[test]
    fn test_auth_int_hashes_body() {
        let challenge =
            DigestChallenge::parse_challenge(r#"Digest realm="r", nonce="n", qop="auth-int""#)
                .unwrap()
                .with_cnonce("c");
        let credentials = Authentication::new("u", "p");
        let a = challenge
            .compute_response("POST", "/", &credentials, b"one")
            .unwrap();
        let b = challenge
            .compute_response("POST", "/", &credentials, b"two")
            .unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_sha1_length() {
        let challenge =
            DigestChallenge::parse_challenge(r#"Digest realm="r", nonce="n", algorithm=SHA"#)
                .unwrap();
        let response = challenge
            .compute_response("GET", "/", &Authentication::new("u", "p"), b"")
            .unwrap();
        assert_eq!(response.len(), 40);
    }
}

//! Basic and digest credentials.

use base64::{engine::general_purpose, Engine as _};
use std::fmt;
use zeroize::Zeroizing;

/// Username and password pair.
///
/// The password is zeroized on drop and hidden from `Debug` output.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Authentication {
    username: String,
    password: Zeroizing<String>,
}

impl Authentication {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: Zeroizing::new(password.into()),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    /// Both username and password are non-empty.
    pub fn is_set(&self) -> bool {
        !self.username.is_empty() && !self.password.is_empty()
    }

    /// `username:password`.
    pub fn to_credentials(&self) -> Zeroizing<String> {
        Zeroizing::new(format!("{}:{}", self.username, self.password.as_str()))
    }

    /// `Authorization` header value for the Basic scheme.
    pub fn basic(&self) -> String {
        let encoded = general_purpose::STANDARD.encode(self.to_credentials().as_bytes());
        format!("Basic {}", encoded)
    }
}

impl fmt::Debug for Authentication {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Authentication")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Credentials answered to a `WWW-Authenticate: Digest` challenge.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Digest(Authentication);

impl Digest {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self(Authentication::new(username, password))
    }

    pub fn credentials(&self) -> &Authentication {
        &self.0
    }

    pub fn is_set(&self) -> bool {
        self.0.is_set()
    }
}

impl From<Authentication> for Digest {
    fn from(auth: Authentication) -> Self {
        Self(auth)
    }
}

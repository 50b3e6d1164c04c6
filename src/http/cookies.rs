//! Cookies sent with a request or parsed from `Set-Cookie`.

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};

/// Octets RFC 6265 does not allow in a cookie name or value.
const COOKIE_OCTETS: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b',')
    .add(b';')
    .add(b'\\')
    .add(b'%');

/// Name → value cookie map, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cookies {
    entries: Vec<(String, String)>,
}

impl Cookies {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `name`, replacing any earlier value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Parse one `Set-Cookie` value and store its name and value.
    ///
    /// Attributes after the first `;` are dropped.
    pub fn add_set_cookie(&mut self, line: &str) {
        let pair = line.split(';').next().unwrap_or_default();
        let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
        let name = name.trim();
        if !name.is_empty() {
            self.insert(name, value.trim());
        }
    }

    /// `Cookie` header value: `a=1; b=2`.
    ///
    /// RFC 2109 version-1 values (wrapped in double quotes) go out verbatim.
    pub fn encode(&self) -> String {
        self.entries
            .iter()
            .map(|(name, value)| {
                let name = utf8_percent_encode(name, COOKIE_OCTETS);
                if is_quoted(value) {
                    format!("{name}={value}")
                } else {
                    format!("{name}={}", utf8_percent_encode(value, COOKIE_OCTETS))
                }
            })
            .collect::<Vec<_>>()
            .join("; ")
    }
}

fn is_quoted(value: &str) -> bool {
    value.len() >= 2 && value.starts_with('"') && value.ends_with('"')
}

impl<N: Into<String>, V: Into<String>> FromIterator<(N, V)> for Cookies {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        let mut cookies = Cookies::new();
        for (name, value) in iter {
            cookies.insert(name, value);
        }
        cookies
    }
}

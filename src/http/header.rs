//! Case-insensitive, insertion-ordered header map.

use std::fmt::{self, Write};

/// Header map that preserves insertion order and the caller's spelling of
/// names while matching them ASCII case-insensitively.
///
/// `insert` overwrites in place: the header keeps its original position and
/// spelling and takes the new value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Header {
    entries: Vec<(String, String)>,
}

impl Header {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `name` to `value`, replacing any existing value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.position(&name) {
            Some(idx) => self.entries[idx].1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Add `value` to `name`, joining repeated headers with `, `.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.position(&name) {
            Some(idx) => {
                let existing = &mut self.entries[idx].1;
                if !existing.is_empty() {
                    existing.push_str(", ");
                }
                existing.push_str(&value);
            }
            None => self.entries.push((name, value)),
        }
    }

    /// Set `name` only if it is not already present.
    pub fn insert_default(&mut self, name: &str, value: impl Into<String>) {
        if !self.contains(name) {
            self.entries.push((name.to_string(), value.into()));
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.position(name).map(|idx| self.entries[idx].1.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.position(name).map(|idx| self.entries.remove(idx).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn host(&self) -> Option<&str> {
        self.get("Host")
    }

    pub fn user_agent(&self) -> Option<&str> {
        self.get("User-Agent")
    }

    pub fn accept(&self) -> Option<&str> {
        self.get("Accept")
    }

    pub fn authorization(&self) -> Option<&str> {
        self.get("Authorization")
    }

    pub fn cookie(&self) -> Option<&str> {
        self.get("Cookie")
    }

    pub fn connection(&self) -> Option<&str> {
        self.get("Connection")
    }

    pub fn content_type(&self) -> Option<&str> {
        self.get("Content-Type")
    }

    pub fn content_length(&self) -> Option<usize> {
        self.get("Content-Length")
            .and_then(|v| v.trim().parse().ok())
    }

    /// `Connection: close` was requested.
    pub fn close_connection(&self) -> bool {
        self.connection()
            .is_some_and(|v| v.trim().eq_ignore_ascii_case("close"))
    }

    /// Write the wire form: `Name: value\r\n`, or `Name;\r\n` for an empty value.
    pub fn write_to(&self, out: &mut String) {
        for (name, value) in &self.entries {
            // `write!` into a String cannot fail
            let _ = if value.is_empty() {
                write!(out, "{name};\r\n")
            } else {
                write!(out, "{name}: {value}\r\n")
            };
        }
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|(n, _)| n.eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        self.write_to(&mut out);
        f.write_str(&out)
    }
}

impl<N: Into<String>, V: Into<String>> FromIterator<(N, V)> for Header {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        let mut header = Header::new();
        header.extend(iter);
        header
    }
}

impl<N: Into<String>, V: Into<String>> Extend<(N, V)> for Header {
    fn extend<I: IntoIterator<Item = (N, V)>>(&mut self, iter: I) {
        for (name, value) in iter {
            self.insert(name, value);
        }
    }
}

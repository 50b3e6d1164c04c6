//! String-backed request URL.
//!
//! [`Url`] keeps the URL as a single string and derives its components on
//! demand. Setters rewrite the string in place and leave every other
//! component untouched, which is what redirect handling needs: a relative
//! `Location` swaps the path and nothing else.
//!
//! A URL is *relative* when it is empty or starts with `/`. Anything else is
//! absolute; an absolute URL without `scheme://` is treated as `http`.

use std::fmt;

const SCHEME_SEPARATOR: &str = "://";

/// A request target such as `https://example.com:8443/dir/file?x=1`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Url {
    raw: String,
}

impl Url {
    /// Wraps `raw`, converting a non-ASCII host to its punycode form.
    pub fn new(raw: impl Into<String>) -> Self {
        let mut url = Self { raw: raw.into() };
        url.normalize();
        url
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Empty or starting with `/`.
    pub fn is_relative(&self) -> bool {
        self.raw.is_empty() || self.raw.starts_with('/')
    }

    /// The scheme, `http` when none is written. Empty for relative URLs.
    pub fn service(&self) -> &str {
        if self.is_relative() {
            return "";
        }
        match self.raw.find(SCHEME_SEPARATOR) {
            Some(idx) => &self.raw[..idx],
            None => "http",
        }
    }

    /// Alias of [`service`](Self::service).
    pub fn scheme(&self) -> &str {
        self.service()
    }

    /// The authority, including an explicit port (`example.com:8080`).
    pub fn host(&self) -> &str {
        match self.authority_range() {
            Some((start, end)) => &self.raw[start..end],
            None => "",
        }
    }

    /// The host name alone, without port or IPv6 brackets.
    pub fn hostname(&self) -> &str {
        split_authority(self.host()).0
    }

    /// The explicit port, if one is written.
    pub fn explicit_port(&self) -> Option<u16> {
        split_authority(self.host())
            .1
            .and_then(|port| port.parse().ok())
    }

    /// The explicit port, else the scheme default (443 for https, 80 otherwise).
    pub fn port(&self) -> u16 {
        self.explicit_port().unwrap_or_else(|| default_port(self.service()))
    }

    /// The path including any query, `/` when absent.
    pub fn path(&self) -> &str {
        if self.is_relative() {
            return &self.raw;
        }
        match self.authority_range() {
            Some((_, end)) if end < self.raw.len() => &self.raw[end..],
            _ => "/",
        }
    }

    /// The path and query as sent on the request line. A `#fragment` never
    /// leaves the client.
    pub fn request_target(&self) -> &str {
        let path = self.path();
        let target = path.find('#').map_or(path, |idx| &path[..idx]);
        if target.is_empty() {
            "/"
        } else {
            target
        }
    }

    /// The path up to and including its last `/`.
    pub fn directory(&self) -> &str {
        let path = strip_query(self.path());
        match path.rfind('/') {
            Some(idx) => &path[..=idx],
            None => "/",
        }
    }

    /// The last path segment, without the query.
    pub fn file(&self) -> &str {
        let path = strip_query(self.path());
        match path.rfind('/') {
            Some(idx) => &path[idx + 1..],
            None => path,
        }
    }

    /// The query string without its leading `?`.
    pub fn query(&self) -> Option<&str> {
        let path = self.path();
        path.find('?').map(|idx| &path[idx + 1..])
    }

    pub fn set_service(&mut self, service: &str) {
        if self.is_relative() {
            return;
        }
        match self.raw.find(SCHEME_SEPARATOR) {
            Some(idx) => self.raw.replace_range(..idx, service),
            None => self.raw.insert_str(0, &format!("{service}{SCHEME_SEPARATOR}")),
        }
    }

    /// Replaces the authority. A relative URL becomes absolute under `host`.
    pub fn set_host(&mut self, host: &str) {
        match self.authority_range() {
            Some((start, end)) => self.raw.replace_range(start..end, host),
            None => self.raw.insert_str(0, host),
        }
        self.normalize();
    }

    /// Replaces path and query. A missing leading `/` is added.
    pub fn set_path(&mut self, path: &str) {
        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{path}")
        };
        match self.authority_range() {
            Some((_, end)) => self.raw.replace_range(end.., &path),
            None => self.raw = path,
        }
    }

    /// Replaces the directory, keeping the file name and query.
    pub fn set_directory(&mut self, directory: &str) {
        let rest = &self.path()[self.directory().len()..];
        let mut path = String::with_capacity(directory.len() + rest.len() + 2);
        if !directory.starts_with('/') {
            path.push('/');
        }
        path.push_str(directory);
        if !path.ends_with('/') {
            path.push('/');
        }
        path.push_str(rest);
        self.set_path(&path);
    }

    /// Replaces the file name and query, keeping the directory.
    pub fn set_file(&mut self, file: &str) {
        let path = format!("{}{}", self.directory(), file);
        self.set_path(&path);
    }

    /// Byte range of the authority within the backing string.
    fn authority_range(&self) -> Option<(usize, usize)> {
        if self.is_relative() {
            return None;
        }
        let start = self
            .raw
            .find(SCHEME_SEPARATOR)
            .map_or(0, |idx| idx + SCHEME_SEPARATOR.len());
        let end = self.raw[start..]
            .find(['/', '?', '#'])
            .map_or(self.raw.len(), |idx| start + idx);
        Some((start, end))
    }

    fn normalize(&mut self) {
        let Some((start, end)) = self.authority_range() else {
            return;
        };
        // `http://host?x=1` carries an implicit root path
        if self.raw[end..].starts_with(['?', '#']) {
            self.raw.insert(end, '/');
        }
        let hostname = split_authority(&self.raw[start..end]).0;
        if hostname.is_ascii() {
            return;
        }
        if let Ok(url::Host::Domain(ascii)) = url::Host::parse(hostname) {
            let offset = self.raw[start..end].find(hostname).unwrap_or(0);
            let range = start + offset..start + offset + hostname.len();
            self.raw.replace_range(range, &ascii);
        }
    }
}

/// Splits `host[:port]` and `[v6]:port` authorities.
fn split_authority(authority: &str) -> (&str, Option<&str>) {
    if let Some(rest) = authority.strip_prefix('[') {
        return match rest.find(']') {
            Some(idx) => (&rest[..idx], rest[idx + 1..].strip_prefix(':')),
            None => (authority, None),
        };
    }
    match authority.rfind(':') {
        Some(idx) => (&authority[..idx], Some(&authority[idx + 1..])),
        None => (authority, None),
    }
}

fn strip_query(path: &str) -> &str {
    path.find(['?', '#']).map_or(path, |idx| &path[..idx])
}

pub(crate) fn default_port(service: &str) -> u16 {
    if service.eq_ignore_ascii_case("https") {
        443
    } else {
        80
    }
}

impl fmt::Display for Url {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl From<&str> for Url {
    fn from(value: &str) -> Self {
        Url::new(value)
    }
}

impl From<String> for Url {
    fn from(value: String) -> Self {
        Url::new(value)
    }
}

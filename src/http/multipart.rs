//! Multipart form data support.
//!
//! RFC 2046 multipart/form-data encoding for file uploads. Each part is
//! either read from disk when the body is built or taken from an in-memory
//! buffer.
//!
//! # Example
//! ```ignore
//! use latticenet::http::multipart::{Multipart, Part};
//!
//! let form = Multipart::new()
//!     .part(Part::file("report.pdf"))
//!     .part(Part::buffer("notes.txt", "remember the milk"));
//!
//! let body = form.to_body()?;
//! ```

use crate::base::context::IoResultExt;
use crate::base::neterror::NetError;
use crate::http::digestauth::{hex_digest, to_hex};
use boring::hash::MessageDigest;
use bytes::{BufMut, Bytes, BytesMut};
use std::borrow::Cow;
use std::path::{Path, PathBuf};

/// A multipart body: ordered parts under one random boundary.
#[derive(Debug, Clone)]
pub struct Multipart {
    boundary: String,
    parts: Vec<Part>,
}

impl Default for Multipart {
    fn default() -> Self {
        Self::new()
    }
}

impl Multipart {
    /// Create a new empty form with a fresh boundary.
    pub fn new() -> Self {
        Self {
            boundary: generate_boundary(),
            parts: Vec::new(),
        }
    }

    /// Get the boundary string.
    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// Add a part.
    pub fn part(mut self, part: Part) -> Self {
        self.parts.push(part);
        self
    }

    pub fn push(&mut self, part: Part) {
        self.parts.push(part);
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Get the Content-Type header value.
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    /// Serialize every part, reading file-backed parts from disk.
    pub fn to_body(&self) -> Result<Bytes, NetError> {
        if self.parts.is_empty() {
            return Ok(Bytes::new());
        }

        let mut output = BytesMut::new();

        for part in &self.parts {
            output.put_slice(b"--");
            output.put_slice(self.boundary.as_bytes());
            output.put_slice(b"\r\n");

            output.put_slice(part.format_headers().as_bytes());
            output.put_slice(b"\r\n\r\n");

            output.put_slice(&part.data()?);
            output.put_slice(b"\r\n");
        }

        output.put_slice(b"--");
        output.put_slice(self.boundary.as_bytes());
        output.put_slice(b"--\r\n");

        Ok(output.freeze())
    }
}

#[derive(Debug, Clone)]
enum Source {
    File(PathBuf),
    Buffer(Bytes),
}

/// One part of a multipart body.
#[derive(Debug, Clone)]
pub struct Part {
    source: Source,
    file_name: String,
    content_type: Option<String>,
}

impl Part {
    /// A part whose contents are read from `path` when the body is built.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            content_type: detect_content_type(&file_name).map(str::to_string),
            source: Source::File(path),
            file_name,
        }
    }

    /// An in-memory part presented to the server as `file_name`.
    pub fn buffer(file_name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        let file_name = file_name.into();
        Self {
            content_type: detect_content_type(&file_name).map(str::to_string),
            source: Source::Buffer(data.into()),
            file_name,
        }
    }

    /// Override the detected content type.
    pub fn content_type<S: Into<String>>(mut self, mime: S) -> Self {
        self.content_type = Some(mime.into());
        self
    }

    /// The form field name: the file name without its extension.
    pub fn name(&self) -> &str {
        Path::new(&self.file_name)
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or(&self.file_name)
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn mime(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    fn data(&self) -> Result<Bytes, NetError> {
        match &self.source {
            Source::Buffer(data) => Ok(data.clone()),
            Source::File(path) => std::fs::read(path).file_context(path).map(Bytes::from),
        }
    }

    /// Format the part headers.
    fn format_headers(&self) -> String {
        let mut header = format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"",
            escape_quotes(self.name()),
            escape_quotes(&self.file_name)
        );

        if let Some(ref mime) = self.content_type {
            header.push_str(&format!("\r\nContent-Type: {}", mime));
        }

        header
    }
}

/// MIME type for a file name, by extension.
pub fn detect_content_type(file_name: &str) -> Option<&'static str> {
    let extension = Path::new(file_name).extension()?.to_str()?.to_ascii_lowercase();
    let mime = match extension.as_str() {
        // text
        "css" => "text/css",
        "csv" => "text/csv",
        "html" | "htm" => "text/html",
        "md" => "text/markdown",
        "tbt" | "tsv" => "text/tab-separated-values",
        "txt" => "text/plain",
        "vcard" => "text/vcard",

        // application
        "gz" | "gzip" => "application/gzip",
        "doc" | "dot" => "application/msword",
        "http" => "application/http",
        "js" => "application/javascript",
        "json" | "jsn" => "application/json",
        "mp4" => "application/mp4",
        "mpeg4" => "application/mpeg4",
        "ogg" => "application/ogg",
        "pdf" => "application/pdf",
        "rtf" => "application/rtf",
        "sql" => "application/sql",
        "xml" => "application/xml",
        "zip" => "application/zip",

        // office documents
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "dotx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.template",
        "docm" | "dotm" => "application/vnd.ms-word.document.macroEnabled.12",
        "xls" | "xlt" | "xla" => "application/vnd.ms-excel",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "xltx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.template",
        "xlsm" => "application/vnd.ms-excel.sheet.macroEnabled.12",
        "xlsb" => "application/vnd.ms-excel.sheet.binary.macroEnabled.12",
        "ppt" | "pot" | "pps" | "ppa" => "application/vnd.ms-powerpoint",
        "pptx" => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        "potx" => "application/vnd.openxmlformats-officedocument.presentationml.template",
        "ppsx" => "application/vnd.openxmlformats-officedocument.presentationml.slideshow",

        // images
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        _ => return None,
    };
    Some(mime)
}

/// Escape quotes and backslashes in a string.
fn escape_quotes(s: &str) -> Cow<'_, str> {
    if s.contains('"') || s.contains('\\') || s.contains('\r') || s.contains('\n') {
        Cow::Owned(
            s.replace('\\', "\\\\")
                .replace('"', "\\\"")
                .replace('\r', "\\r")
                .replace('\n', "\\n"),
        )
    } else {
        Cow::Borrowed(s)
    }
}

/// SHA-1 hex of 8 random bytes.
fn generate_boundary() -> String {
    let mut seed = [0u8; 8];
    if boring::rand::rand_bytes(&mut seed).is_err() {
        use std::time::{SystemTime, UNIX_EPOCH};
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos() as u64;
        seed = (nanos ^ u64::from(std::process::id())).to_be_bytes();
    }
    hex_digest(MessageDigest::sha1(), &seed).unwrap_or_else(|_| to_hex(&seed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_form() {
        let form = Multipart::new();
        assert!(form.is_empty());
        assert!(form.to_body().unwrap().is_empty());
    }

    #[test]
    fn test_buffer_part() {
        let form = Multipart::new().part(Part::buffer("notes.txt", "file data"));
        let body = form.to_body().unwrap();
        let body_str = String::from_utf8_lossy(&body);

        assert!(body_str.starts_with(&format!("--{}\r\n", form.boundary())));
        assert!(body_str.contains("name=\"notes\"; filename=\"notes.txt\""));
        assert!(body_str.contains("Content-Type: text/plain\r\n\r\nfile data\r\n"));
        assert!(body_str.ends_with(&format!("--{}--\r\n", form.boundary())));
    }

    #[test]
    fn test_file_part() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("upload.json");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(b"{\"a\":1}").unwrap();

        let part = Part::file(&path);
        assert_eq!(part.name(), "upload");
        assert_eq!(part.file_name(), "upload.json");
        assert_eq!(part.mime(), Some("application/json"));

        let body = Multipart::new().part(part).to_body().unwrap();
        assert!(String::from_utf8_lossy(&body).contains("{\"a\":1}"));
    }

    #[test]
    fn test_missing_file_errors() {
        let form = Multipart::new().part(Part::file("/definitely/not/here.bin"));
        assert!(matches!(form.to_body(), Err(NetError::FileRead { .. })));
    }

    #[test]
    fn test_unknown_extension_has_no_content_type() {
        let part = Part::buffer("blob.xyz", "x");
        assert_eq!(part.mime(), None);
        assert!(!part.format_headers().contains("Content-Type"));

        let part = part.content_type("application/octet-stream");
        assert!(part.format_headers().contains("Content-Type: application/octet-stream"));
    }

    #[test]
    fn test_boundary() {
        let a = Multipart::new();
        let b = Multipart::new();
        assert_eq!(a.boundary().len(), 40);
        assert_ne!(a.boundary(), b.boundary());
        assert_eq!(
            a.content_type(),
            format!("multipart/form-data; boundary={}", a.boundary())
        );
    }

    #[test]
    fn test_detect_content_type() {
        assert_eq!(detect_content_type("a.CSV"), Some("text/csv"));
        assert_eq!(detect_content_type("archive.tar.gz"), Some("application/gzip"));
        assert_eq!(detect_content_type("README"), None);
    }

    #[test]
    fn test_escape_quotes() {
        assert_eq!(escape_quotes("normal"), "normal");
        assert_eq!(escape_quotes("with\"quote"), "with\\\"quote");
        assert_eq!(escape_quotes("with\\slash"), "with\\\\slash");
    }

    #[test]
    fn test_multiple_parts_in_order() {
        let form = Multipart::new()
            .part(Part::buffer("first.txt", "one"))
            .part(Part::buffer("second.txt", "two"));
        let body = form.to_body().unwrap();
        let body_str = String::from_utf8_lossy(&body);

        let first = body_str.find("first.txt").unwrap();
        let second = body_str.find("second.txt").unwrap();
        assert!(first < second);
        assert_eq!(body_str.matches(form.boundary()).count(), 3);
    }
}

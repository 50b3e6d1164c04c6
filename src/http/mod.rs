//! HTTP message model, response parsing and the wire exchange.

pub mod auth;
pub mod cookies;
pub mod digestauth;
pub mod header;
pub mod multipart;
pub mod options;
pub mod parameters;
pub mod requestbody;
pub mod response;
pub mod streamfactory;
pub mod transaction;
pub mod url;

// Re-exports for convenience
pub use self::auth::{Authentication, Digest};
pub use self::cookies::Cookies;
pub use self::digestauth::{DigestAlgorithm, DigestChallenge};
pub use self::header::Header;
pub use self::multipart::{Multipart, Part};
pub use self::options::{Redirects, Timeout};
pub use self::parameters::Parameters;
pub use self::requestbody::RequestBody;
pub use self::response::{ContentKind, MimeType, Response, TransferEncoding};
pub use self::streamfactory::{HttpStreamFactory, StreamFactory};
pub use self::transaction::HttpTransaction;
pub use self::url::Url;
pub use ::http::{Method, StatusCode};

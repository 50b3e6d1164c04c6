//! # latticenet
//!
//! A blocking HTTP/1.1 and HTTPS client library.
//!
//! `latticenet` opens a connection for a URL, writes the request, parses
//! the raw response and, when asked to, follows redirects and answers
//! digest authentication challenges until a final response arrives.
//!
//! ## Features
//!
//! - **Message model**: URLs, parameters, ordered headers, cookies, Basic and
//!   Digest credentials, multipart bodies
//! - **TLS**: BoringSSL with client certificates (PEM, DER, PKCS#8, PKCS#12),
//!   CA bundles, revocation lists and a protocol selector
//! - **Proxies**: absolute-form requests for `http`, `CONNECT` tunnels for `https`
//! - **DNS**: pluggable resolvers and a shareable address cache
//! - **Pool**: run a batch of requests on worker threads and collect results
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use latticenet::client;
//!
//! let response = client::get("https://example.com")
//!     .redirects(5)
//!     .send()?;
//! println!("Status: {}", response.status_code());
//! # Ok::<(), latticenet::base::neterror::NetError>(())
//! ```
//!
//! ## Modules
//!
//! - [`base`] - Error definitions and engine states
//! - [`client`] - Fluent request builder
//! - [`dns`] - Name resolution and the address cache
//! - [`http`] - Message model, response parsing and the wire exchange
//! - [`pool`] - Concurrent batches of requests
//! - [`socket`] - Plaintext and TLS transports, proxies, framing
//! - [`urlrequest`] - Request options and the redirect/authentication engine

pub mod base;
pub mod client;
pub mod dns;
pub mod http;
pub mod pool;
pub mod socket;
pub mod urlrequest;

pub use crate::base::neterror::NetError;
pub use crate::http::response::Response;
pub use crate::urlrequest::request::Request;

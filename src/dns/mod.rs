//! DNS Resolution Module
//!
//! Pluggable, blocking DNS resolution:
//! - System resolver (getaddrinfo)
//! - Hostname-to-IP override mechanism
//! - A shareable cache of addresses that accepted a connection
//!
//! # Example
//!
//! ```rust,ignore
//! use latticenet::dns::{GaiResolver, Name, Resolve};
//!
//! let resolver = GaiResolver::new();
//! for addr in resolver.resolve(&Name::new("example.com"))? {
//!     println!("Resolved: {}", addr);
//! }
//! ```

mod cache;
mod gai;
mod resolve;

pub use cache::DnsCache;
pub use gai::{GaiResolver, SocketAddrs};
pub use resolve::{Addrs, DnsResolverWithOverrides, Name, Resolve};

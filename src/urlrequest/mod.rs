//! Request options and the engine that runs them.

pub mod job;
pub mod request;

pub use self::job::HttpJob;
pub use self::request::Request;

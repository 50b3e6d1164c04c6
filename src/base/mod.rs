//! Base types and error handling.
//!
//! - [`NetError`](neterror::NetError): error kinds with Chromium-style numeric codes
//! - [`LoadState`](loadstate::LoadState): request engine states

pub mod context;
pub mod loadstate;
pub mod neterror;

#[cfg(test)]
mod tests;

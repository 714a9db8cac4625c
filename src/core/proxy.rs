//! Guarding proxy.
//!
//! Pingora service that evaluates the session guard for each request and
//! forwards allowed requests to the application backend.

pub mod headers;
pub mod request;
pub mod response;
pub mod service;

pub use service::{App, GuardProxy, RequestCtx};

//! Library definitions.
//!
//! Exports the session guard, the encrypted-cookie session store, and the
//! proxy service guarding the admin and user applications.

pub mod config;
pub mod core;
pub mod security;

#[cfg(any(test, feature = "testing"))]
pub mod test_utils;
pub use config::{Config, GuardError, Result};
pub use crate::core::guard::{
    GuardOutcome, GuardPolicy, GuardRequest, RouteFilter, RoutingDecision, SessionGuard,
};
pub use crate::core::middleware::{
    AdminIdentity, Session, SessionEnvelope, SessionKind, SessionStore, UserIdentity,
};
pub use crate::core::proxy::{App, GuardProxy};
pub use security::crypto::CookieCrypto;

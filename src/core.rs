//! Core system components.
//!
//! Contains the session guard, session middleware, and proxy plumbing.

pub mod guard;
pub mod middleware;
pub mod proxy;

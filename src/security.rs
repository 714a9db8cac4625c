//! Security enforcement modules.
//!
//! Provides cryptographic utilities for session cookies.

pub mod crypto;

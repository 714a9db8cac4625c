//! Cryptographic utilities.
//!
//! Provides session cookie encryption and verification.

pub mod cookie;
pub use cookie::{CookieCrypto, MIN_SECRET_LEN};

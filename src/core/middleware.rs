//! Middleware components.
//!
//! Session model and the encrypted-cookie session store.

mod session;
mod store;

pub use session::{
    AdminIdentity, Session, SessionEnvelope, SessionKind, UserIdentity, find_cookie,
    format_clear_cookie, format_set_cookie, unix_now,
};
pub use store::{SessionStore, host_name};

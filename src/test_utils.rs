//! Test utilities and shared configuration.
//!
//! This module provides common helpers for unit and integration tests,
//! reducing duplication across the codebase.

#[cfg(any(test, feature = "testing"))]
use crate::config::{AppConfig, Config, CookieProfile};
#[cfg(any(test, feature = "testing"))]
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
#[cfg(any(test, feature = "testing"))]
use std::sync::Arc;

/// Creates a standard configuration for testing purposes.
///
/// This configuration has:
/// - Admin on 8080, user site on 8090
/// - `admin.eco.test` as the only admin host
/// - Non-secure cookies with default names and TTLs
#[cfg(any(test, feature = "testing"))]
#[must_use]
pub fn create_test_config() -> Arc<Config> {
    Arc::new(Config {
        admin: AppConfig {
            listen_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 8080),
            backend_url: "http://127.0.0.1:3000".to_string(),
        },
        user: AppConfig {
            listen_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 8090),
            backend_url: "http://127.0.0.1:3001".to_string(),
        },
        session_secret: "0000000000000000000000000000000000000000000000000000000000000000"
            .to_string(),
        session_cookie: CookieProfile {
            name: "eco_session".to_string(),
            ttl_secs: 86_400,
        },
        admin_session_cookie: CookieProfile {
            name: "eco_admin_session".to_string(),
            ttl_secs: 604_800,
        },
        admin_hosts: vec!["admin.eco.test".to_string()],
        cookie_secure: false,
        trust_forwarded_for: false,
        public_scheme: "http".to_string(),
        log_format: "pretty".to_string(),
        coop_policy: "same-origin".to_string(),
    })
}

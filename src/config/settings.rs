//! Configuration settings.
//!
//! Defines the main `Config` struct and environment variable loading logic.

use std::env;
use std::net::SocketAddr;
use std::sync::Arc;

fn get_env(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| panic!("{key} must be set in environment"))
}

fn get_env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn get_env_bool_or(key: &str, default: bool) -> bool {
    env::var(key)
        .map(|v| v.to_lowercase() == "true" || v == "1")
        .unwrap_or(default)
}

fn get_env_u64_or(key: &str, default: u64) -> u64 {
    env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

fn get_env_addr_or(key: &str, default: &str) -> SocketAddr {
    get_env_or(key, default)
        .parse()
        .unwrap_or_else(|_| panic!("{key} must be a valid socket address"))
}

/// Name and lifetime of one kind of session cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieProfile {
    /// Cookie name.
    pub name: String,
    /// Seconds after issue at which the session is no longer accepted.
    pub ttl_secs: u64,
}

/// Listener and backend of one guarded application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Address the guard listens on for this application.
    pub listen_addr: SocketAddr,
    /// Backend URL requests are forwarded to.
    pub backend_url: String,
}

/// Application configuration loaded from environment.
#[derive(Debug, Clone)]
pub struct Config {
    /// Admin dashboard.
    pub admin: AppConfig,
    /// Public/user site.
    pub user: AppConfig,
    /// Secret the session cookie keys are derived from.
    pub session_secret: String,
    /// Cookie used by standard hosts.
    pub session_cookie: CookieProfile,
    /// Cookie used by admin hosts.
    pub admin_session_cookie: CookieProfile,
    /// Host names (no port, lowercase) that use the admin cookie profile.
    pub admin_hosts: Vec<String>,
    /// Whether session cookies carry the `Secure` attribute.
    pub cookie_secure: bool,
    /// Take client IP and scheme from `X-Forwarded-For` / `X-Forwarded-Proto`.
    pub trust_forwarded_for: bool,
    /// Scheme used to build absolute redirect URLs.
    pub public_scheme: String,
    /// Logging format: "json" or "pretty".
    pub log_format: String,
    /// Cross-Origin-Opener-Policy value, or "off".
    pub coop_policy: String,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// # Panics
    ///
    /// Panics if any of the following environment variables are missing or invalid:
    /// - `ADMIN_LISTEN_ADDR` / `USER_LISTEN_ADDR` (must be valid socket addresses)
    /// - `ADMIN_BACKEND_URL` (must be set)
    /// - `USER_BACKEND_URL` (must be set)
    /// - `SESSION_SECRET` (must be set)
    #[must_use]
    pub fn from_env() -> Arc<Self> {
        let admin = AppConfig {
            listen_addr: get_env_addr_or("ADMIN_LISTEN_ADDR", "0.0.0.0:8080"),
            backend_url: get_env("ADMIN_BACKEND_URL"),
        };
        let user = AppConfig {
            listen_addr: get_env_addr_or("USER_LISTEN_ADDR", "0.0.0.0:8090"),
            backend_url: get_env("USER_BACKEND_URL"),
        };
        let session_cookie = CookieProfile {
            name: get_env_or("ECO_SESSION_COOKIE", "eco_session"),
            ttl_secs: get_env_u64_or("ECO_SESSION_TTL_SECS", 86_400),
        };
        let admin_session_cookie = CookieProfile {
            name: get_env_or("ECO_ADMIN_SESSION_COOKIE", "eco_admin_session"),
            ttl_secs: get_env_u64_or("ECO_ADMIN_SESSION_TTL_SECS", 604_800),
        };

        Arc::new(Self {
            admin,
            user,
            session_secret: get_env("SESSION_SECRET"),
            session_cookie,
            admin_session_cookie,
            admin_hosts: parse_host_list(&get_env_or("ADMIN_HOSTS", "")),
            cookie_secure: get_env_bool_or("COOKIE_SECURE", true),
            trust_forwarded_for: get_env_bool_or("TRUST_FORWARDED_FOR", false),
            public_scheme: get_env_or("PUBLIC_SCHEME", "http").to_lowercase(),
            log_format: get_env_or("LOG_FORMAT", "json"),
            coop_policy: get_env_or("COOP_POLICY", "same-origin"),
        })
    }
}

fn parse_host_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_ascii_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_parse_host_list() {
        assert_eq!(
            parse_host_list(" Admin.Example.com, ,admin.local "),
            vec!["admin.example.com".to_string(), "admin.local".to_string()]
        );
        assert!(parse_host_list("").is_empty());
    }

    #[test]
    fn test_helpers_defaults() {
        let _guard = ENV_LOCK
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        unsafe {
            env::remove_var("ECOGUARD_TEST_MISSING");
        }
        assert_eq!(get_env_or("ECOGUARD_TEST_MISSING", "default"), "default");
        assert_eq!(get_env_u64_or("ECOGUARD_TEST_MISSING", 100), 100);
        assert!(get_env_bool_or("ECOGUARD_TEST_MISSING", true));
        assert!(!get_env_bool_or("ECOGUARD_TEST_MISSING", false));
    }

    #[test]
    fn test_helpers_parsing() {
        let _guard = ENV_LOCK
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        unsafe {
            env::set_var("ECOGUARD_TEST_BOOL", "false");
            assert!(!get_env_bool_or("ECOGUARD_TEST_BOOL", true));

            env::set_var("ECOGUARD_TEST_BOOL", "1");
            assert!(get_env_bool_or("ECOGUARD_TEST_BOOL", false));

            env::set_var("ECOGUARD_TEST_U64", "not-a-number");
            assert_eq!(get_env_u64_or("ECOGUARD_TEST_U64", 7), 7);
        }
    }

    #[test]
    #[should_panic(expected = "ECOGUARD_TEST_REQ must be set")]
    fn test_get_env_panic() {
        let _guard = ENV_LOCK
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        unsafe {
            env::remove_var("ECOGUARD_TEST_REQ");
        }
        get_env("ECOGUARD_TEST_REQ");
    }

    #[test]
    fn test_config_from_env_defaults() {
        let _guard = ENV_LOCK
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        unsafe {
            env::remove_var("ADMIN_LISTEN_ADDR");
            env::remove_var("ECO_SESSION_COOKIE");
            env::remove_var("ECO_ADMIN_SESSION_TTL_SECS");
            env::remove_var("COOKIE_SECURE");
            env::remove_var("PUBLIC_SCHEME");
            env::set_var("USER_LISTEN_ADDR", "127.0.0.1:9191");
            env::set_var("ADMIN_BACKEND_URL", "http://127.0.0.1:3000");
            env::set_var("USER_BACKEND_URL", "http://127.0.0.1:3001");
            env::set_var("SESSION_SECRET", "0123456789abcdef0123456789abcdef");
            env::set_var("ADMIN_HOSTS", "admin.eco.test");
        }

        let config = Config::from_env();
        assert_eq!(config.admin.listen_addr.port(), 8080);
        assert_eq!(config.user.listen_addr.port(), 9191);
        assert_eq!(config.session_cookie.name, "eco_session");
        assert_eq!(config.admin_session_cookie.ttl_secs, 604_800);
        assert_eq!(config.admin_hosts, vec!["admin.eco.test".to_string()]);
        assert!(config.cookie_secure);
        assert_eq!(config.public_scheme, "http");
    }
}

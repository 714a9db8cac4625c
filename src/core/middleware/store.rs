//! Encrypted-cookie session store.
//!
//! Decodes a request's `Cookie` header into a [`Session`] and encodes
//! mutations back into `Set-Cookie` headers. Admin hosts get their own,
//! longer-lived cookie; every other host uses the standard one.

use crate::config::{Config, CookieProfile, GuardError, Result};
use crate::core::middleware::session::{
    Session, SessionEnvelope, find_cookie, format_clear_cookie, format_set_cookie,
};
use crate::security::crypto::CookieCrypto;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct SessionStore {
    crypto: CookieCrypto,
    standard: CookieProfile,
    admin: CookieProfile,
    admin_hosts: Vec<String>,
    secure: bool,
}

impl SessionStore {
    /// Builds the store from configuration.
    ///
    /// # Errors
    ///
    /// Returns `GuardError::Config` for a short secret, an empty cookie name,
    /// a zero TTL, or both profiles sharing one cookie name.
    pub fn new(config: &Config) -> Result<Self> {
        let crypto = CookieCrypto::new(&config.session_secret)?;

        for profile in [&config.session_cookie, &config.admin_session_cookie] {
            validate_profile(profile)?;
        }
        if config.session_cookie.name == config.admin_session_cookie.name {
            return Err(GuardError::Config(format!(
                "standard and admin session cookies must differ (both '{}')",
                config.session_cookie.name
            )));
        }

        if config.admin_hosts.is_empty() {
            warn!(
                cookie = %config.session_cookie.name,
                "ADMIN_HOSTS is empty; admin app shares the standard session cookie"
            );
        }

        Ok(Self {
            crypto,
            standard: config.session_cookie.clone(),
            admin: config.admin_session_cookie.clone(),
            admin_hosts: config.admin_hosts.clone(),
            secure: config.cookie_secure,
        })
    }

    /// Cookie profile serving `host`.
    #[must_use]
    pub fn profile_for(&self, host: &str) -> &CookieProfile {
        let name = host_name(host);
        if self
            .admin_hosts
            .iter()
            .any(|h| h.eq_ignore_ascii_case(name))
        {
            &self.admin
        } else {
            &self.standard
        }
    }

    /// Decodes the session for `host`. A missing, undecryptable, malformed
    /// or expired cookie yields [`Session::Anonymous`]. Values are sealed to
    /// their cookie name, so one profile's cookie never opens under another.
    #[must_use]
    pub fn decode(&self, cookie_header: Option<&str>, host: &str) -> Session {
        let profile = self.profile_for(host);
        let Some(value) = cookie_header.and_then(|h| find_cookie(h, &profile.name)) else {
            return Session::Anonymous;
        };

        let envelope = self
            .crypto
            .decrypt(value, profile.name.as_bytes())
            .and_then(|plain| SessionEnvelope::from_bytes(&plain, profile.ttl_secs));

        envelope.map_or_else(
            || {
                debug!(cookie = %profile.name, host = %host, "Rejected session cookie");
                Session::Anonymous
            },
            |e| e.session,
        )
    }

    /// Seals `session` into a fresh `Set-Cookie` header for `host`,
    /// restarting its lifetime. Used by login procedures.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be serialized or encrypted.
    pub fn issue(&self, session: &Session, host: &str) -> Result<String> {
        self.encode(&SessionEnvelope::new(session.clone()), host)
    }

    /// Re-seals an envelope, keeping its issue time. Anonymous sessions are
    /// persisted as a cleared cookie.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be serialized or encrypted.
    pub fn encode(&self, envelope: &SessionEnvelope, host: &str) -> Result<String> {
        if envelope.session.is_anonymous() {
            return Ok(self.clear(host));
        }

        let profile = self.profile_for(host);
        let value = self
            .crypto
            .encrypt(&envelope.to_bytes()?, profile.name.as_bytes())?;
        Ok(format_set_cookie(
            &profile.name,
            &value,
            profile.ttl_secs,
            self.secure,
        ))
    }

    /// `Set-Cookie` header removing the session cookie for `host`.
    #[must_use]
    pub fn clear(&self, host: &str) -> String {
        format_clear_cookie(&self.profile_for(host).name, self.secure)
    }
}

fn validate_profile(profile: &CookieProfile) -> Result<()> {
    if profile.name.is_empty() || profile.name.contains([';', '=', ' ', ',']) {
        return Err(GuardError::Config(format!(
            "invalid session cookie name '{}'",
            profile.name
        )));
    }
    if profile.ttl_secs == 0 {
        return Err(GuardError::Config(format!(
            "session cookie '{}' must have a non-zero TTL",
            profile.name
        )));
    }
    Ok(())
}

/// Host name without port; IPv6 literals keep their brackets.
#[must_use]
pub fn host_name(host: &str) -> &str {
    if host.starts_with('[') {
        return host.find(']').map_or(host, |end| &host[..=end]);
    }
    host.rsplit_once(':').map_or(host, |(name, _)| name)
}

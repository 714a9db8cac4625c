//! Session guard.
//!
//! Decides per request whether to continue to the requested page or to
//! redirect to the login or home route, and destroys sessions whose bound
//! IP address no longer matches the caller.

pub mod filter;

pub use filter::{RouteFilter, canonical_path};

use crate::core::middleware::{Session, SessionKind, SessionStore};
use std::net::IpAddr;
use std::sync::Arc;
use tracing::{debug, warn};

pub const LOGIN_PATH: &str = "/login";

/// Routing rules of one guarded application.
#[derive(Debug, Clone)]
pub struct GuardPolicy {
    /// Session kind this application authenticates.
    pub kind: SessionKind,
    /// Where authenticated visitors of the login page are sent.
    pub home: String,
    /// Paths open to anonymous visitors.
    pub public_paths: Vec<String>,
    /// Paths the guard runs for.
    pub filter: RouteFilter,
}

impl GuardPolicy {
    #[must_use]
    pub fn admin() -> Self {
        Self {
            kind: SessionKind::Admin,
            home: "/".to_string(),
            public_paths: Vec::new(),
            filter: RouteFilter::admin(),
        }
    }

    #[must_use]
    pub fn user() -> Self {
        Self {
            kind: SessionKind::User,
            home: "/user".to_string(),
            public_paths: vec!["/".to_string()],
            filter: RouteFilter::user(),
        }
    }
}

/// The parts of an HTTP request the guard looks at.
#[derive(Debug, Clone, Copy)]
pub struct GuardRequest<'a> {
    pub path: &'a str,
    /// `Host` header value, port included.
    pub host: &'a str,
    /// Scheme and host redirects are built from, e.g. `https://eco.example`.
    pub origin: &'a str,
    pub client_ip: Option<IpAddr>,
    pub cookie_header: Option<&'a str>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutingDecision {
    Continue,
    /// Absolute URL to send the client to.
    Redirect(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardOutcome {
    pub decision: RoutingDecision,
    /// Session mutation to persist on whatever response goes out.
    pub set_cookie: Option<String>,
    /// Session state the decision was made on.
    pub session: Session,
}

impl GuardOutcome {
    #[must_use]
    pub fn invalidated(&self) -> bool {
        self.set_cookie.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct SessionGuard {
    store: Arc<SessionStore>,
    policy: GuardPolicy,
}

impl SessionGuard {
    #[must_use]
    pub const fn new(store: Arc<SessionStore>, policy: GuardPolicy) -> Self {
        Self { store, policy }
    }

    #[must_use]
    pub const fn policy(&self) -> &GuardPolicy {
        &self.policy
    }

    #[must_use]
    pub const fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    /// Whether `path` is covered by this guard's route filter, judged on its
    /// canonical form. Paths without one are always covered.
    #[must_use]
    pub fn applies_to(&self, path: &str) -> bool {
        canonical_path(path).is_none_or(|p| self.policy.filter.matches(&p))
    }

    /// Evaluates one request. Never fails: unreadable cookies are anonymous.
    #[must_use]
    pub fn evaluate(&self, req: &GuardRequest<'_>) -> GuardOutcome {
        let mut session = self.store.decode(req.cookie_header, req.host);
        let mut set_cookie = None;

        if session.is_bound_elsewhere(req.client_ip) {
            warn!(
                identity = session.identity_id().unwrap_or(""),
                kind = session.kind().map_or("", SessionKind::as_str),
                bound_ip = ?session.bound_ip(),
                client_ip = ?req.client_ip,
                action = "DESTROY",
                "Session IP mismatch"
            );
            session.destroy();
            set_cookie = Some(self.store.clear(req.host));
        }

        let decision = match self.redirect_target(req.path, &session) {
            Some(target) => {
                debug!(path = %req.path, target = %target, "Guard redirect");
                RoutingDecision::Redirect(format!("{}{target}", req.origin))
            }
            None => RoutingDecision::Continue,
        };

        GuardOutcome {
            decision,
            set_cookie,
            session,
        }
    }

    fn redirect_target(&self, path: &str, session: &Session) -> Option<&str> {
        let authenticated = session.authenticated_as(self.policy.kind).is_some();

        if path.starts_with(LOGIN_PATH) {
            return authenticated.then_some(self.policy.home.as_str());
        }

        if authenticated || self.policy.public_paths.iter().any(|p| p == path) {
            None
        } else {
            Some(LOGIN_PATH)
        }
    }
}

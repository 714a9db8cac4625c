//! Proxy service logic.
//!
//! Runs the session guard in front of one application and forwards the
//! requests it lets through to that application's backend.

use crate::config::{AppConfig, Config};
use crate::core::guard::{
    GuardPolicy, GuardRequest, RoutingDecision, SessionGuard, canonical_path,
};
use crate::core::middleware::SessionStore;
use crate::core::proxy::headers::inject_security_headers;
use crate::core::proxy::request::{
    cookie_header, request_host, request_origin, resolve_client_ip,
};
use crate::core::proxy::response::{serve_redirect, serve_text};
use async_trait::async_trait;
use pingora::Result;
use pingora::http::{RequestHeader, ResponseHeader};
use pingora::proxy::{ProxyHttp, Session};
use pingora::upstreams::peer::HttpPeer;
use std::net::IpAddr;
use std::sync::Arc;
use tracing::{debug, warn};

/// The two guarded applications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum App {
    Admin,
    User,
}

impl App {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::User => "user",
        }
    }

    #[must_use]
    pub fn policy(self) -> GuardPolicy {
        match self {
            Self::Admin => GuardPolicy::admin(),
            Self::User => GuardPolicy::user(),
        }
    }

    #[must_use]
    pub const fn settings(self, config: &Config) -> &AppConfig {
        match self {
            Self::Admin => &config.admin,
            Self::User => &config.user,
        }
    }
}

/// Context for a single request.
#[derive(Debug, Default)]
pub struct RequestCtx {
    pub client_ip: Option<IpAddr>,
    pub guarded: bool,
    pub set_session_cookie: Option<String>,
}

/// Guarding proxy implementing `ProxyHttp`.
pub struct GuardProxy {
    app: App,
    config: Arc<Config>,
    backend_addr: String,
    guard: SessionGuard,
}

impl GuardProxy {
    /// Creates the proxy for `app`, sharing `store` with the other one.
    #[must_use]
    pub fn new(app: App, config: Arc<Config>, store: Arc<SessionStore>) -> Self {
        let backend_addr = backend_addr(&app.settings(&config).backend_url).to_string();
        let guard = SessionGuard::new(store, app.policy());
        Self {
            app,
            config,
            backend_addr,
            guard,
        }
    }

    #[must_use]
    pub const fn app(&self) -> App {
        self.app
    }

    fn peer_ip(session: &Session) -> Option<IpAddr> {
        session.client_addr().and_then(|addr| {
            if let pingora::protocols::l4::socket::SocketAddr::Inet(inet) = addr {
                Some(inet.ip())
            } else {
                None
            }
        })
    }

    /// Headers forwarded upstream carry the address the guard checked, so
    /// the application's login binds sessions to the same one.
    fn rewrite_upstream_request(&self, req: &mut RequestHeader, ctx: &RequestCtx) -> Result<()> {
        if !self.config.trust_forwarded_for {
            req.remove_header("X-Forwarded-For");
            req.remove_header("X-Forwarded-Proto");
        }
        match ctx.client_ip {
            Some(ip) => {
                req.insert_header("X-Real-IP", ip.to_string())?;
            }
            None => {
                req.remove_header("X-Real-IP");
            }
        }
        Ok(())
    }

    fn finish_response(&self, resp: &mut ResponseHeader, ctx: &mut RequestCtx) -> Result<()> {
        if let Some(cookie) = ctx.set_session_cookie.take() {
            resp.append_header("Set-Cookie", cookie)?;
        }
        if ctx.guarded {
            inject_security_headers(resp, &self.config)?;
        }
        Ok(())
    }
}

fn backend_addr(url: &str) -> &str {
    url.strip_prefix("http://")
        .or_else(|| url.strip_prefix("https://"))
        .unwrap_or(url)
        .trim_end_matches('/')
}

#[async_trait]
impl ProxyHttp for GuardProxy {
    type CTX = RequestCtx;

    fn new_ctx(&self) -> Self::CTX {
        RequestCtx::default()
    }

    async fn request_filter(&self, session: &mut Session, ctx: &mut Self::CTX) -> Result<bool> {
        let peer_ip = Self::peer_ip(session);
        let req = session.req_header();
        let raw_path = req.uri.path();

        if raw_path == "/health" && peer_ip.is_some_and(|ip| ip.is_loopback()) {
            return serve_text(session, 200, "OK").await;
        }

        // Backends resolve dot segments and escapes themselves.
        let path = match canonical_path(raw_path) {
            Some(path) if path == raw_path => path,
            _ => {
                debug!(app = self.app.name(), http_path = %raw_path, "Rejected non-canonical path");
                return serve_text(session, 400, "Bad Request").await;
            }
        };

        ctx.client_ip = resolve_client_ip(req, peer_ip, self.config.trust_forwarded_for);

        if !self.guard.applies_to(&path) {
            return Ok(false);
        }
        ctx.guarded = true;

        let host = request_host(req).unwrap_or_default();
        let origin = request_origin(
            req,
            &host,
            &self.config.public_scheme,
            self.config.trust_forwarded_for,
        );
        let cookies = cookie_header(req);

        let outcome = self.guard.evaluate(&GuardRequest {
            path: &path,
            host: &host,
            origin: &origin,
            client_ip: ctx.client_ip,
            cookie_header: cookies.as_deref(),
        });

        match outcome.decision {
            RoutingDecision::Redirect(location) => {
                serve_redirect(
                    session,
                    &self.config,
                    &location,
                    outcome.set_cookie.as_deref(),
                )
                .await
            }
            RoutingDecision::Continue => {
                ctx.set_session_cookie = outcome.set_cookie;
                Ok(false)
            }
        }
    }

    async fn upstream_peer(
        &self,
        _session: &mut Session,
        _ctx: &mut Self::CTX,
    ) -> Result<Box<HttpPeer>> {
        Ok(Box::new(HttpPeer::new(
            self.backend_addr.as_str(),
            false,
            String::new(),
        )))
    }

    async fn upstream_request_filter(
        &self,
        _session: &mut Session,
        upstream_request: &mut RequestHeader,
        ctx: &mut Self::CTX,
    ) -> Result<()> {
        self.rewrite_upstream_request(upstream_request, ctx)
    }

    async fn response_filter(
        &self,
        _session: &mut Session,
        upstream_response: &mut ResponseHeader,
        ctx: &mut Self::CTX,
    ) -> Result<()> {
        self.finish_response(upstream_response, ctx)
    }

    async fn logging(
        &self,
        session: &mut Session,
        _e: Option<&pingora::Error>,
        ctx: &mut Self::CTX,
    ) {
        let status = session.response_written().map_or(0, |r| r.status.as_u16());
        let path = session.req_header().uri.path();

        debug!(
            app = self.app.name(),
            http_path = %path,
            status = status,
            guarded = ctx.guarded,
            "Request completed"
        );

        if status >= 500 {
            warn!(app = self.app.name(), status = status, http_path = %path, "Request error");
        }
    }
}

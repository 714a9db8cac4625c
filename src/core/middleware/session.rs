//! Session model.
//!
//! A session is either anonymous or bound to exactly one principal kind
//! (`user` or `admin`). It travels as JSON inside an encrypted cookie,
//! wrapped in an envelope carrying the issue time for passive expiry.

use crate::config::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::net::IpAddr;
use std::time::{SystemTime, UNIX_EPOCH};

/// Principal kinds. Each guarded application gates on exactly one of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionKind {
    User,
    Admin,
}

impl SessionKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserIdentity {
    pub id: String,
    /// Address observed at login.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<IpAddr>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub permissions: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminIdentity {
    pub id: String,
    /// Address observed at login.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<IpAddr>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub permissions: BTreeSet<String>,
    /// Managed site currently selected in the dashboard.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_site: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Session {
    #[default]
    Anonymous,
    User(UserIdentity),
    Admin(AdminIdentity),
}

impl Session {
    #[must_use]
    pub const fn kind(&self) -> Option<SessionKind> {
        match self {
            Self::Anonymous => None,
            Self::User(_) => Some(SessionKind::User),
            Self::Admin(_) => Some(SessionKind::Admin),
        }
    }

    /// Identity id, if the session carries a non-empty one.
    #[must_use]
    pub fn identity_id(&self) -> Option<&str> {
        let id = match self {
            Self::Anonymous => return None,
            Self::User(u) => u.id.as_str(),
            Self::Admin(a) => a.id.as_str(),
        };
        (!id.is_empty()).then_some(id)
    }

    /// Identity id when the session is authenticated as `kind`.
    #[must_use]
    pub fn authenticated_as(&self, kind: SessionKind) -> Option<&str> {
        if self.kind() == Some(kind) {
            self.identity_id()
        } else {
            None
        }
    }

    #[must_use]
    pub const fn bound_ip(&self) -> Option<IpAddr> {
        match self {
            Self::Anonymous => None,
            Self::User(u) => u.ip_address,
            Self::Admin(a) => a.ip_address,
        }
    }

    /// True when the session is bound to an address other than `client_ip`.
    /// An unknown client address never matches a bound session.
    #[must_use]
    pub fn is_bound_elsewhere(&self, client_ip: Option<IpAddr>) -> bool {
        match (self.bound_ip(), client_ip) {
            (None, _) => false,
            (Some(_), None) => true,
            (Some(bound), Some(client)) => bound.to_canonical() != client.to_canonical(),
        }
    }

    #[must_use]
    pub fn permissions(&self) -> Option<&BTreeSet<String>> {
        match self {
            Self::Anonymous => None,
            Self::User(u) => Some(&u.permissions),
            Self::Admin(a) => Some(&a.permissions),
        }
    }

    #[must_use]
    pub fn selected_site(&self) -> Option<&str> {
        match self {
            Self::Admin(a) => a.selected_site.as_deref(),
            Self::Anonymous | Self::User(_) => None,
        }
    }

    /// Switches the active managed site. Only admin sessions carry one;
    /// returns `false` for any other kind.
    pub fn select_site(&mut self, site: impl Into<String>) -> bool {
        match self {
            Self::Admin(a) => {
                a.selected_site = Some(site.into());
                true
            }
            Self::Anonymous | Self::User(_) => false,
        }
    }

    /// Drops the principal, leaving an anonymous session.
    pub fn destroy(&mut self) {
        *self = Self::Anonymous;
    }

    #[must_use]
    pub const fn is_anonymous(&self) -> bool {
        matches!(self, Self::Anonymous)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionEnvelope {
    pub issued_at: u64,
    pub session: Session,
}

impl SessionEnvelope {
    #[must_use]
    pub fn new(session: Session) -> Self {
        Self {
            issued_at: unix_now(),
            session,
        }
    }

    /// Serializes the envelope into JSON bytes.
    ///
    /// # Errors
    ///
    /// Returns `GuardError::Encoding` if serialization fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Deserializes an envelope, rejecting it once `ttl_secs` have passed
    /// since issue.
    #[must_use]
    pub fn from_bytes(data: &[u8], ttl_secs: u64) -> Option<Self> {
        let envelope: Self = serde_json::from_slice(data).ok()?;
        if unix_now().saturating_sub(envelope.issued_at) > ttl_secs {
            return None;
        }
        Some(envelope)
    }
}

#[must_use]
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[must_use]
pub fn format_set_cookie(name: &str, value: &str, max_age: u64, secure: bool) -> String {
    let secure_flag = if secure { "; Secure" } else { "" };
    format!("{name}={value}; HttpOnly{secure_flag}; SameSite=Lax; Path=/; Max-Age={max_age}")
}

#[must_use]
pub fn format_clear_cookie(name: &str, secure: bool) -> String {
    let secure_flag = if secure { "; Secure" } else { "" };
    format!(
        "{name}=; HttpOnly{secure_flag}; SameSite=Lax; Path=/; Max-Age=0; \
         Expires=Thu, 01 Jan 1970 00:00:00 GMT"
    )
}

/// Finds the value of cookie `name` in a `Cookie` request header.
#[must_use]
pub fn find_cookie<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    header.split(';').find_map(|pair| {
        let (k, v) = pair.trim().split_once('=')?;
        (k == name).then_some(v)
    })
}

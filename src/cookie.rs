//! `Set-Cookie` values.
//!
//! Only what the session subsystem emits: name, value, path, domain and an
//! absolute expiry. Request-side parsing lives on [`Request::cookie`](crate::Request::cookie).

use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// 9999-12-31 23:59:59 UTC, the last instant an HTTP date can express.
pub(crate) fn latest_date() -> SystemTime {
    UNIX_EPOCH + Duration::from_secs(253_402_300_799)
}

/// A cookie to be sent to the client.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub path: Option<String>,
    pub domain: Option<String>,
    pub expires: Option<SystemTime>,
}

impl Cookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            path: None,
            domain: None,
            expires: None,
        }
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Sets the domain; an empty domain is left out of the header.
    pub fn domain(mut self, domain: Option<&str>) -> Self {
        self.domain = domain.filter(|d| !d.is_empty()).map(str::to_owned);
        self
    }

    pub fn expires(mut self, at: SystemTime) -> Self {
        self.expires = Some(at);
        self
    }

    /// Turns the cookie into a deletion: empty value, expiry at the epoch.
    pub fn into_removal(mut self) -> Self {
        self.value.clear();
        self.expires = Some(UNIX_EPOCH);
        self
    }

    /// True when the cookie tells the client to forget it.
    pub fn is_removal(&self) -> bool {
        self.value.is_empty() && self.expires.is_some_and(|at| at <= UNIX_EPOCH)
    }
}

/// Formats the `Set-Cookie` header value.
impl fmt::Display for Cookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.value)?;
        if let Some(path) = &self.path {
            write!(f, "; Path={path}")?;
        }
        if let Some(domain) = &self.domain {
            write!(f, "; Domain={domain}")?;
        }
        if let Some(at) = self.expires {
            let at = at.clamp(UNIX_EPOCH, latest_date());
            write!(f, "; Expires={}", httpdate::fmt_http_date(at))?;
        }
        Ok(())
    }
}

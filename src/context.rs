//! Per-request state handed to middleware and handlers.

use crate::cookie::Cookie;
use crate::error::Error;
use crate::pattern::Params;
use crate::request::Request;
use crate::response::Response;
use crate::session::{COOKIE_NAME, Session, Sessions};

/// Everything one request carries through its middleware chain.
///
/// A context is created for each dispatch and dropped with it; nothing in it
/// is shared with other requests.
pub struct Context {
    request: Request,
    params: Params,
    session: Option<Session>,
    sessions: Option<Sessions>,
    cookies: Vec<Cookie>,
}

impl Context {
    pub fn new(request: Request) -> Self {
        Self {
            request,
            params: Params::new(),
            session: None,
            sessions: None,
            cookies: Vec::new(),
        }
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    /// A path variable captured by the route template.
    ///
    /// For `/users/<id:int>`, `ctx.param("id")` on `/users/42` is `Some("42")`.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub(crate) fn set_params(&mut self, params: Params) {
        self.params = params;
    }

    /// The session attached by [`SessionLayer`](crate::session::SessionLayer), if any.
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn session_mut(&mut self) -> Option<&mut Session> {
        self.session.as_mut()
    }

    /// Queues a `Set-Cookie` header on the response.
    pub fn set_cookie(&mut self, cookie: Cookie) {
        self.cookies.push(cookie);
    }

    /// Cookies queued so far.
    pub fn cookies(&self) -> &[Cookie] {
        &self.cookies
    }

    /// Starts a session for `user`, replacing (and expiring) any current one,
    /// and sets the session cookie.
    ///
    /// Fails with [`Error::SessionsDisabled`] on routes without a
    /// [`SessionLayer`](crate::session::SessionLayer), or with the cache's error.
    pub fn start_session(&mut self, user: &str) -> Result<&mut Session, Error> {
        let sessions = self.sessions.clone().ok_or(Error::SessionsDisabled)?;
        if let Some(mut old) = self.session.take() {
            old.expire()?;
        }
        let session = sessions.start(user)?;
        let cookie = self.session_cookie(&session);
        self.set_cookie(cookie);
        Ok(self.session.insert(session))
    }

    /// Expires the current session and clears its cookie. No-op without one.
    pub fn end_session(&mut self) -> Result<(), Error> {
        let Some(mut session) = self.session.take() else {
            return Ok(());
        };
        session.expire()?;
        let cookie = self.removal_cookie();
        self.set_cookie(cookie);
        Ok(())
    }

    pub(crate) fn attach_sessions(&mut self, sessions: Sessions) {
        self.sessions = Some(sessions);
    }

    pub(crate) fn attach_session(&mut self, session: Session) {
        self.session = Some(session);
    }

    /// The `SID` cookie for `session`: root path, request host, session expiry.
    pub(crate) fn session_cookie(&self, session: &Session) -> Cookie {
        Cookie::new(COOKIE_NAME, session.key())
            .path("/")
            .domain(self.request.host())
            .expires(session.expires_at())
    }

    pub(crate) fn removal_cookie(&self) -> Cookie {
        Cookie::new(COOKIE_NAME, "")
            .path("/")
            .domain(self.request.host())
            .into_removal()
    }

    /// Writes queued cookies onto the response.
    pub(crate) fn finish(self, mut response: Response) -> Response {
        for cookie in self.cookies {
            response.append_header("set-cookie", cookie.to_string());
        }
        response
    }
}

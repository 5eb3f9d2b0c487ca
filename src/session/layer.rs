//! The session middleware.

use super::{COOKIE_NAME, Lookup, Sessions};
use crate::context::Context;
use crate::middleware::{Middleware, Next};
use crate::response::{IntoResponse, Response};

/// Attaches the session named by the `SID` cookie to the request.
///
/// - valid session: attached; reissues the cookie when the session was renewed
/// - expired, unknown or malformed token: no session; the cookie is cleared
/// - cache failure: the chain stops with `500 Internal Server Error`, so an
///   outage is never mistaken for a logged-out user
///
/// It also makes [`Context::start_session`] available to everything inside it.
#[derive(Clone, Debug)]
pub struct SessionLayer {
    sessions: Sessions,
}

impl SessionLayer {
    pub fn new(sessions: Sessions) -> Self {
        Self { sessions }
    }
}

impl Middleware for SessionLayer {
    fn handle(&self, ctx: &mut Context, next: Next<'_>) -> Response {
        ctx.attach_sessions(self.sessions.clone());

        let token = ctx.request().cookie(COOKIE_NAME).filter(|t| !t.is_empty());
        if let Some(token) = token.map(str::to_owned) {
            match self.sessions.lookup(&token) {
                Ok(Lookup::Active(session)) => ctx.attach_session(session),
                Ok(Lookup::Renewed(session)) => {
                    let cookie = ctx.session_cookie(&session);
                    ctx.set_cookie(cookie);
                    ctx.attach_session(session);
                }
                Ok(Lookup::Expired | Lookup::Missing) => {
                    let cookie = ctx.removal_cookie();
                    ctx.set_cookie(cookie);
                }
                Err(e) => return e.into_response(),
            }
        }

        next.run(ctx)
    }
}

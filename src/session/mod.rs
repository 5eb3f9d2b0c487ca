//! Cookie-addressed server-side sessions.
//!
//! # Lifecycle
//!
//! ```text
//! (no session) ──start──▶ active ──end / found expired──▶ expired
//!                          │  ▲
//!                          └──┘ renewed when inside the renewal window
//! ```
//!
//! A session lives in a [`SessionCache`]; a [`Session`] value is a handle
//! onto that entry. Every mutation is written through to the cache before it
//! returns, so there is never unsaved state.
//!
//! [`SessionLayer`] is the middleware that reads the `SID` cookie, attaches
//! the session to the request [`Context`](crate::Context) and renews or clears
//! the cookie. Handlers start and end sessions with
//! [`Context::start_session`](crate::Context::start_session) and
//! [`Context::end_session`](crate::Context::end_session).
//!
//! # Renewal
//!
//! A session expires `duration` after it was started or last renewed. When a
//! request arrives during the final `renewal_window` of that lifetime, the
//! expiry is pushed to `now + duration` and the cookie reissued. Earlier
//! requests leave it untouched; later ones find it expired.
//!
//! The window is measured back from the expiry, not forward from it: a
//! session is never renewed once `duration` has passed, so "renew when more
//! than `duration + renewal_window` has elapsed" never applies here.
//!
//! # Concurrent handles
//!
//! Each request holds its own copy of a session. Writes after the session
//! started go through [`SessionCache::replace`], so once any request ends a
//! session, updates through older handles fail with
//! [`Error::SessionEnded`](crate::Error::SessionEnded) instead of restoring it.

mod cache;
mod id;
mod layer;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use tracing::{debug, warn};

use crate::cookie::latest_date;
use crate::error::Error;

pub use cache::{MemorySessionCache, SessionCache, SessionRecord};
pub use id::{ParseSessionIdError, SessionId};
pub use layer::SessionLayer;

/// Name of the cookie carrying the session id.
pub const COOKIE_NAME: &str = "SID";

/// Value key under which [`Sessions::start`] records the user.
pub const USER_KEY: &str = "user";

/// Session lifetime tunables.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SessionPolicy {
    /// How long a session lives after being started or renewed.
    pub duration: Duration,
    /// How close to expiry a request must be to renew the session.
    pub renewal_window: Duration,
}

impl SessionPolicy {
    pub fn new(duration: Duration, renewal_window: Duration) -> Self {
        Self { duration, renewal_window }
    }

    /// `now + duration`, capped at the latest date a cookie can carry.
    fn expiry_from(&self, now: SystemTime) -> SystemTime {
        now.checked_add(self.duration)
            .map_or(latest_date(), |at| at.min(latest_date()))
    }

    fn renews_at(&self, expires_at: SystemTime) -> SystemTime {
        expires_at
            .checked_sub(self.renewal_window)
            .unwrap_or(SystemTime::UNIX_EPOCH)
    }
}

/// 72 hours, renewed in the last 12.
impl Default for SessionPolicy {
    fn default() -> Self {
        Self {
            duration: Duration::from_secs(72 * 60 * 60),
            renewal_window: Duration::from_secs(12 * 60 * 60),
        }
    }
}

type Clock = Arc<dyn Fn() -> SystemTime + Send + Sync>;

/// The session subsystem: a cache, a policy and a clock.
///
/// Cheap to clone; clones share the cache.
///
/// ```rust
/// use std::sync::Arc;
/// use sprig::session::{MemorySessionCache, SessionPolicy, Sessions};
///
/// let sessions = Sessions::new(Arc::new(MemorySessionCache::new()), SessionPolicy::default());
/// let session = sessions.start("ada").unwrap();
/// assert_eq!(session.get("user"), Some("ada"));
/// ```
#[derive(Clone)]
pub struct Sessions {
    cache: Arc<dyn SessionCache>,
    policy: SessionPolicy,
    clock: Clock,
}

/// Result of looking a token up.
#[derive(Debug)]
pub enum Lookup {
    /// Valid and outside the renewal window.
    Active(Session),
    /// Valid; its expiry was just extended and persisted.
    Renewed(Session),
    /// Found but past its expiry; it has been deleted.
    Expired,
    /// Malformed token or no such session.
    Missing,
}

impl Sessions {
    pub fn new(cache: Arc<dyn SessionCache>, policy: SessionPolicy) -> Self {
        Self { cache, policy, clock: Arc::new(SystemTime::now) }
    }

    /// Replaces the wall clock, for deterministic expiry.
    pub fn with_clock(mut self, clock: impl Fn() -> SystemTime + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn policy(&self) -> SessionPolicy {
        self.policy
    }

    pub fn now(&self) -> SystemTime {
        (self.clock)()
    }

    /// Creates and stores a fresh session for `user`.
    pub fn start(&self, user: &str) -> Result<Session, Error> {
        let session = Session {
            id: SessionId::generate(),
            record: SessionRecord {
                values: HashMap::from([(USER_KEY.to_owned(), user.to_owned())]),
                expires_at: self.policy.expiry_from(self.now()),
            },
            owner: self.clone(),
        };
        self.cache.store(&session.id, &session.record)?;
        debug!(session = %session.id, "session started");
        Ok(session)
    }

    /// Resolves a cookie token.
    ///
    /// Malformed and unknown tokens are [`Lookup::Missing`]; only a failing
    /// cache is an error. An expired session is reported as
    /// [`Lookup::Expired`] even when deleting it fails, since its expiry
    /// alone keeps it from being used again.
    pub fn lookup(&self, token: &str) -> Result<Lookup, Error> {
        let Ok(id) = token.parse::<SessionId>() else {
            return Ok(Lookup::Missing);
        };
        let Some(record) = self.cache.retrieve(&id)? else {
            return Ok(Lookup::Missing);
        };
        let mut session = Session { id, record, owner: self.clone() };
        let now = self.now();

        if session.is_expired_at(now) {
            if let Err(e) = self.cache.delete(&id) {
                warn!(session = %id, error = %e, "failed to delete expired session");
            }
            debug!(session = %id, "session expired");
            return Ok(Lookup::Expired);
        }
        if now >= self.policy.renews_at(session.record.expires_at) {
            session.record.expires_at = self.policy.expiry_from(now);
            if !self.cache.replace(&id, &session.record)? {
                return Ok(Lookup::Missing);
            }
            debug!(session = %id, "session renewed");
            return Ok(Lookup::Renewed(session));
        }
        Ok(Lookup::Active(session))
    }

    /// Fetches a session without applying expiry or renewal.
    pub fn get(&self, id: &SessionId) -> Result<Option<Session>, Error> {
        let record = self.cache.retrieve(id)?;
        Ok(record.map(|record| Session { id: *id, record, owner: self.clone() }))
    }
}

impl fmt::Debug for Sessions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sessions").field("policy", &self.policy).finish_non_exhaustive()
    }
}

/// A handle onto one cached session.
pub struct Session {
    id: SessionId,
    record: SessionRecord,
    owner: Sessions,
}

impl Session {
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// The cookie value for this session.
    pub fn key(&self) -> String {
        self.id.to_string()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.record.values.get(key).map(String::as_str)
    }

    pub fn values(&self) -> &HashMap<String, String> {
        &self.record.values
    }

    /// The user recorded when the session was started.
    pub fn user(&self) -> Option<&str> {
        self.get(USER_KEY)
    }

    pub fn expires_at(&self) -> SystemTime {
        self.record.expires_at
    }

    pub fn is_expired_at(&self, now: SystemTime) -> bool {
        now >= self.record.expires_at
    }

    /// Sets `key` and writes the session to the cache.
    pub fn update(&mut self, key: &str, value: &str) -> Result<(), Error> {
        self.record.values.insert(key.to_owned(), value.to_owned());
        self.store()
    }

    /// Removes `key` and writes the session to the cache.
    pub fn remove(&mut self, key: &str) -> Result<Option<String>, Error> {
        let old = self.record.values.remove(key);
        self.store()?;
        Ok(old)
    }

    /// Writes the session to the cache. Fails with [`Error::SessionEnded`]
    /// when the session has been expired or deleted in the meantime.
    pub fn store(&self) -> Result<(), Error> {
        if self.owner.cache.replace(&self.id, &self.record)? {
            Ok(())
        } else {
            Err(Error::SessionEnded)
        }
    }

    /// Marks the session expired now and deletes it from the cache.
    pub fn expire(&mut self) -> Result<(), Error> {
        self.record.expires_at = self.owner.now();
        self.owner.cache.delete(&self.id)?;
        Ok(())
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("values", &self.record.values)
            .field("expires_at", &self.record.expires_at)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::error::CacheError;

    const HOUR: Duration = Duration::from_secs(60 * 60);

    struct Fixture {
        cache: Arc<MemorySessionCache>,
        now: Arc<Mutex<SystemTime>>,
        sessions: Sessions,
    }

    fn fixture() -> Fixture {
        let cache = Arc::new(MemorySessionCache::new());
        let now = Arc::new(Mutex::new(SystemTime::UNIX_EPOCH + 1000 * HOUR));
        let clock = Arc::clone(&now);
        let sessions = Sessions::new(cache.clone(), SessionPolicy::new(72 * HOUR, 12 * HOUR))
            .with_clock(move || *clock.lock().unwrap());
        Fixture { cache, now, sessions }
    }

    impl Fixture {
        fn advance(&self, by: Duration) {
            *self.now.lock().unwrap() += by;
        }
    }

    #[test]
    fn start_persists_user_and_expiry() {
        let fx = fixture();
        let started = fx.sessions.now();
        let session = fx.sessions.start("ada").unwrap();

        assert_eq!(session.user(), Some("ada"));
        assert_eq!(session.expires_at(), started + 72 * HOUR);
        let stored = fx.cache.retrieve(&session.id()).unwrap().unwrap();
        assert_eq!(stored.values[USER_KEY], "ada");
    }

    #[test]
    fn updates_write_through() {
        let fx = fixture();
        let mut session = fx.sessions.start("ada").unwrap();
        session.update("theme", "dark").unwrap();

        let reloaded = fx.sessions.get(&session.id()).unwrap().unwrap();
        assert_eq!(reloaded.get("theme"), Some("dark"));

        assert_eq!(session.remove("theme").unwrap().as_deref(), Some("dark"));
        let reloaded = fx.sessions.get(&session.id()).unwrap().unwrap();
        assert_eq!(reloaded.get("theme"), None);
    }

    #[test]
    fn untouched_before_renewal_window() {
        let fx = fixture();
        let session = fx.sessions.start("ada").unwrap();
        let original = session.expires_at();

        // 1h, 24h, 48h and 59h after the start.
        for step in [1u32, 23, 24, 11] {
            fx.advance(step * HOUR);
            match fx.sessions.lookup(&session.key()).unwrap() {
                Lookup::Active(found) => assert_eq!(found.expires_at(), original),
                other => panic!("expected active session, got {other:?}"),
            }
        }
    }

    #[test]
    fn renewed_inside_window() {
        let fx = fixture();
        let session = fx.sessions.start("ada").unwrap();

        fx.advance(61 * HOUR);
        let renewed = match fx.sessions.lookup(&session.key()).unwrap() {
            Lookup::Renewed(found) => found,
            other => panic!("expected renewal, got {other:?}"),
        };
        let now = fx.sessions.now();
        assert_eq!(renewed.expires_at(), now + 72 * HOUR);
        assert_eq!(fx.cache.retrieve(&session.id()).unwrap().unwrap().expires_at, now + 72 * HOUR);

        fx.advance(HOUR);
        assert!(matches!(fx.sessions.lookup(&session.key()).unwrap(), Lookup::Active(_)));
    }

    #[test]
    fn expired_sessions_are_deleted() {
        let fx = fixture();
        let session = fx.sessions.start("ada").unwrap();

        fx.advance(72 * HOUR);
        assert!(matches!(fx.sessions.lookup(&session.key()).unwrap(), Lookup::Expired));
        assert!(fx.cache.is_empty());
        assert!(matches!(fx.sessions.lookup(&session.key()).unwrap(), Lookup::Missing));
    }

    #[test]
    fn expire_invalidates() {
        let fx = fixture();
        let mut session = fx.sessions.start("ada").unwrap();

        session.expire().unwrap();

        assert!(session.is_expired_at(fx.sessions.now()));
        assert!(fx.sessions.get(&session.id()).unwrap().is_none());
        assert!(matches!(fx.sessions.lookup(&session.key()).unwrap(), Lookup::Missing));
    }

    #[test]
    fn bad_tokens_are_missing() {
        let fx = fixture();
        assert!(matches!(fx.sessions.lookup("forged").unwrap(), Lookup::Missing));
        let unknown = SessionId::generate().to_string();
        assert!(matches!(fx.sessions.lookup(&unknown).unwrap(), Lookup::Missing));
    }

    #[test]
    fn stale_handles_cannot_restore_an_ended_session() {
        let fx = fixture();
        let key = fx.sessions.start("ada").unwrap().key();
        let Lookup::Active(mut a) = fx.sessions.lookup(&key).unwrap() else { panic!("expected active") };
        let Lookup::Active(mut b) = fx.sessions.lookup(&key).unwrap() else { panic!("expected active") };

        b.expire().unwrap();

        assert!(matches!(a.update("theme", "dark"), Err(Error::SessionEnded)));
        assert!(matches!(a.remove("user"), Err(Error::SessionEnded)));
        assert!(fx.cache.is_empty());
        assert!(matches!(fx.sessions.lookup(&key).unwrap(), Lookup::Missing));
    }

    #[test]
    fn updates_after_own_expire_fail() {
        let fx = fixture();
        let mut session = fx.sessions.start("ada").unwrap();
        session.expire().unwrap();
        assert!(matches!(session.store(), Err(Error::SessionEnded)));
        assert!(fx.cache.is_empty());
    }

    #[test]
    fn past_lifetime_plus_window_is_expired_not_renewed() {
        let fx = fixture();
        let session = fx.sessions.start("ada").unwrap();

        fx.advance(72 * HOUR + 12 * HOUR + HOUR);
        assert!(matches!(fx.sessions.lookup(&session.key()).unwrap(), Lookup::Expired));
    }

    #[test]
    fn huge_durations_are_capped() {
        let sessions = Sessions::new(
            Arc::new(MemorySessionCache::new()),
            SessionPolicy::new(Duration::MAX, Duration::from_secs(1)),
        );
        let session = sessions.start("ada").unwrap();
        assert_eq!(session.expires_at(), latest_date());
        assert!(matches!(sessions.lookup(&session.key()).unwrap(), Lookup::Active(_)));
    }

    /// Memory cache whose deletes always fail.
    #[derive(Default)]
    struct UndeletableCache(MemorySessionCache);

    impl SessionCache for UndeletableCache {
        fn retrieve(&self, id: &SessionId) -> Result<Option<SessionRecord>, CacheError> {
            self.0.retrieve(id)
        }
        fn store(&self, id: &SessionId, record: &SessionRecord) -> Result<(), CacheError> {
            self.0.store(id, record)
        }
        fn delete(&self, _: &SessionId) -> Result<(), CacheError> {
            Err(CacheError::new("read-only replica"))
        }
    }

    #[test]
    fn expiry_is_reported_even_if_delete_fails() {
        let now = Arc::new(Mutex::new(SystemTime::UNIX_EPOCH + 1000 * HOUR));
        let clock = Arc::clone(&now);
        let sessions = Sessions::new(Arc::new(UndeletableCache::default()), SessionPolicy::default())
            .with_clock(move || *clock.lock().unwrap());
        let session = sessions.start("ada").unwrap();

        *now.lock().unwrap() += 72 * HOUR;
        assert!(matches!(sessions.lookup(&session.key()).unwrap(), Lookup::Expired));
    }

    struct BrokenCache;

    impl SessionCache for BrokenCache {
        fn retrieve(&self, _: &SessionId) -> Result<Option<SessionRecord>, CacheError> {
            Err(CacheError::new("backend down"))
        }
        fn store(&self, _: &SessionId, _: &SessionRecord) -> Result<(), CacheError> {
            Err(CacheError::new("backend down"))
        }
        fn delete(&self, _: &SessionId) -> Result<(), CacheError> {
            Err(CacheError::new("backend down"))
        }
    }

    #[test]
    fn cache_failures_surface() {
        let sessions = Sessions::new(Arc::new(BrokenCache), SessionPolicy::default());
        assert!(matches!(sessions.start("ada"), Err(Error::SessionCache(_))));
        let token = SessionId::generate().to_string();
        assert!(matches!(sessions.lookup(&token), Err(Error::SessionCache(_))));
    }
}

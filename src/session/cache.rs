//! Session storage.

use std::collections::HashMap;
use std::time::SystemTime;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use super::SessionId;
use crate::error::CacheError;

/// What a cache persists for one session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub values: HashMap<String, String>,
    pub expires_at: SystemTime,
}

/// Pluggable session storage keyed by [`SessionId`].
///
/// Implementations are shared by every request thread and must make each
/// operation atomic for its key. A missing session is `Ok(None)`, not an
/// error.
pub trait SessionCache: Send + Sync {
    fn retrieve(&self, id: &SessionId) -> Result<Option<SessionRecord>, CacheError>;
    /// Inserts or overwrites. Used when a session is started.
    fn store(&self, id: &SessionId, record: &SessionRecord) -> Result<(), CacheError>;
    fn delete(&self, id: &SessionId) -> Result<(), CacheError>;

    /// Overwrites an existing entry and returns `false`, writing nothing,
    /// when there is none. Every write-through after a session started goes
    /// here, so a handle to a deleted session cannot bring it back.
    ///
    /// The default is a retrieve followed by a store; backends that can make
    /// the check and the write one operation should override it.
    fn replace(&self, id: &SessionId, record: &SessionRecord) -> Result<bool, CacheError> {
        if self.retrieve(id)?.is_none() {
            return Ok(false);
        }
        self.store(id, record)?;
        Ok(true)
    }
}

/// In-process session storage. Sessions are lost when the process exits.
#[derive(Debug, Default)]
pub struct MemorySessionCache {
    sessions: RwLock<HashMap<SessionId, SessionRecord>>,
}

impl MemorySessionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}

impl SessionCache for MemorySessionCache {
    fn retrieve(&self, id: &SessionId) -> Result<Option<SessionRecord>, CacheError> {
        Ok(self.sessions.read().get(id).cloned())
    }

    fn store(&self, id: &SessionId, record: &SessionRecord) -> Result<(), CacheError> {
        self.sessions.write().insert(*id, record.clone());
        Ok(())
    }

    fn delete(&self, id: &SessionId) -> Result<(), CacheError> {
        self.sessions.write().remove(id);
        Ok(())
    }

    fn replace(&self, id: &SessionId, record: &SessionRecord) -> Result<bool, CacheError> {
        match self.sessions.write().get_mut(id) {
            Some(entry) => {
                *entry = record.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_retrieve_delete() {
        let cache = MemorySessionCache::new();
        let id = SessionId::generate();
        let record = SessionRecord {
            values: HashMap::from([("user".to_owned(), "ada".to_owned())]),
            expires_at: SystemTime::UNIX_EPOCH,
        };

        assert_eq!(cache.retrieve(&id).unwrap(), None);
        cache.store(&id, &record).unwrap();
        assert_eq!(cache.retrieve(&id).unwrap(), Some(record));
        assert_eq!(cache.len(), 1);
        cache.delete(&id).unwrap();
        assert_eq!(cache.retrieve(&id).unwrap(), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn replace_never_resurrects() {
        let cache = MemorySessionCache::new();
        let id = SessionId::generate();
        let mut record = SessionRecord { values: HashMap::new(), expires_at: SystemTime::UNIX_EPOCH };

        assert!(!cache.replace(&id, &record).unwrap());
        assert!(cache.is_empty());

        cache.store(&id, &record).unwrap();
        record.values.insert("theme".to_owned(), "dark".to_owned());
        assert!(cache.replace(&id, &record).unwrap());
        assert_eq!(cache.retrieve(&id).unwrap(), Some(record.clone()));

        cache.delete(&id).unwrap();
        assert!(!cache.replace(&id, &record).unwrap());
        assert_eq!(cache.retrieve(&id).unwrap(), None);
    }

    #[test]
    fn records_serialise() {
        let record = SessionRecord {
            values: HashMap::from([("k".to_owned(), "v".to_owned())]),
            expires_at: SystemTime::UNIX_EPOCH,
        };
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(serde_json::from_str::<SessionRecord>(&json).unwrap(), record);
    }
}

//! Unified error type.

/// The error type returned by sprig's fallible operations.
///
/// Routing misses are not errors: an unmatched path or an unsupported method
/// is an ordinary [`Outcome`](crate::Outcome). This type surfaces
/// configuration mistakes, session-storage failures and I/O.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("config: {0}")]
    Config(#[from] serde_json::Error),

    #[error("invalid bind address `{address}`: {source}")]
    Address {
        address: String,
        source: std::net::AddrParseError,
    },

    #[error("invalid route `{template}`: {source}")]
    Pattern {
        template: String,
        source: regex::Error,
    },

    /// A segment written as `<...>` that is not `<name:int|string|path>`.
    #[error("invalid route `{template}`: malformed variable `{segment}`")]
    InvalidVariable { template: String, segment: String },

    #[error("invalid route `{template}`: variable `{name}` appears more than once")]
    DuplicateVariable { template: String, name: String },

    #[error("session cache: {0}")]
    SessionCache(#[from] CacheError),

    /// `start_session` was called on a context that no session middleware
    /// has visited.
    #[error("sessions are not enabled for this route")]
    SessionsDisabled,

    /// The session was expired or deleted, possibly by another request,
    /// after this handle was obtained.
    #[error("session has ended")]
    SessionEnded,
}

/// Failure reported by a [`SessionCache`](crate::session::SessionCache)
/// backend.
///
/// A missing session is not a `CacheError`; backends return `Ok(None)`.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct CacheError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

impl CacheError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into(), source: None }
    }

    /// Wraps a backend error (connection failure, serialisation error, …).
    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self { message: message.into(), source: Some(Box::new(source)) }
    }
}

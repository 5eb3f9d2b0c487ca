//! Path-prefixed groups of endpoints.

use std::fmt;
use std::sync::Arc;

use crate::endpoint::Endpoint;
use crate::middleware::{Middleware, SharedMiddleware};

/// Endpoints and middleware mounted together under one prefix.
///
/// A blueprint cannot dispatch on its own. [`Application::blueprint`]
/// binds each endpoint to `root + prefix + endpoint path`, wrapped in
/// application, then blueprint, then endpoint middleware.
///
/// [`Application::blueprint`]: crate::Application::blueprint
///
/// ```rust
/// use sprig::{Blueprint, Context, Endpoint, Methods};
///
/// let admin = Blueprint::new("/admin")
///     .register(Endpoint::new("/stats", Methods::GET, |_: &mut Context| "stats"));
/// ```
#[derive(Clone)]
pub struct Blueprint {
    pub(crate) prefix: String,
    pub(crate) endpoints: Vec<Endpoint>,
    pub(crate) middleware: Vec<SharedMiddleware>,
}

impl Blueprint {
    pub fn new(prefix: &str) -> Self {
        Self { prefix: prefix.to_owned(), endpoints: Vec::new(), middleware: Vec::new() }
    }

    pub fn register(mut self, endpoint: Endpoint) -> Self {
        self.endpoints.push(endpoint);
        self
    }

    /// Registers the endpoint `generator` builds.
    pub fn register_with(self, generator: impl FnOnce() -> Endpoint) -> Self {
        self.register(generator())
    }

    /// Adds blueprint middleware, run after earlier blueprint middleware on
    /// every endpoint of this blueprint.
    pub fn middleware(mut self, middleware: impl Middleware) -> Self {
        self.middleware.push(Arc::new(middleware));
        self
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn endpoints(&self) -> &[Endpoint] {
        &self.endpoints
    }
}

impl fmt::Debug for Blueprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Blueprint")
            .field("prefix", &self.prefix)
            .field("endpoints", &self.endpoints)
            .field("middleware", &self.middleware.len())
            .finish()
    }
}

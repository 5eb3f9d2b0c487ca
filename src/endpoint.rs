//! Route registrations staged before they are bound to an application.

use std::fmt;
use std::sync::Arc;

use crate::handler::{BoxedHandler, Handler};
use crate::method::Methods;
use crate::middleware::{Middleware, SharedMiddleware};

/// A path template, the methods it accepts, its own middleware and its
/// terminal handler.
///
/// ```rust
/// use sprig::{Application, Context, Endpoint, Methods, middleware::Trace};
///
/// fn show_file(ctx: &mut Context) -> String {
///     format!("file {}", ctx.param("filepath").unwrap_or_default())
/// }
///
/// let files = Endpoint::new("/files/<filepath:path>", Methods::GET, show_file)
///     .middleware(Trace);
///
/// let app = Application::new("Sample App", "/", "0.0.0.0:7070").register(files);
/// ```
#[derive(Clone)]
pub struct Endpoint {
    pub(crate) path: String,
    pub(crate) methods: Methods,
    pub(crate) middleware: Vec<SharedMiddleware>,
    pub(crate) handler: BoxedHandler,
}

impl Endpoint {
    pub fn new(path: &str, methods: impl Into<Methods>, handler: impl Handler) -> Self {
        Self {
            path: path.to_owned(),
            methods: methods.into(),
            middleware: Vec::new(),
            handler: handler.into_boxed_handler(),
        }
    }

    /// Adds endpoint middleware. It runs inside application and blueprint
    /// middleware and after earlier endpoint middleware.
    pub fn middleware(mut self, middleware: impl Middleware) -> Self {
        self.middleware.push(Arc::new(middleware));
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn methods(&self) -> Methods {
        self.methods
    }
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("path", &self.path)
            .field("methods", &self.methods)
            .field("middleware", &self.middleware.len())
            .finish_non_exhaustive()
    }
}

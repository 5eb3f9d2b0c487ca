//! Middleware layer.
//!
//! A middleware wraps everything inside it: it receives the request
//! [`Context`] and a [`Next`] that runs the rest of the chain. It may act
//! before calling `next.run(ctx)`, after it, both, or not call it at all to
//! short-circuit (authentication rejects, cached responses, …).
//!
//! # Ordering
//!
//! A route's chain is application middleware, then blueprint middleware, then
//! endpoint middleware, each in the order it was added. The first one added
//! to the application is the outermost: it sees the request first and the
//! response last.
//!
//! ```text
//! app M1 → blueprint M2 → endpoint M3 → handler → M3 → M2 → M1
//! ```
//!
//! The chain is composed once, when the route is registered.
//!
//! # Failures
//!
//! A panic in the handler or any inner middleware unwinds through every
//! middleware already entered; code written after `next.run(ctx)` does not
//! run. Middleware that must always clean up should hold a guard whose `Drop`
//! does the work, or wrap the call in [`CatchPanic`].
//!
//! ```rust
//! use sprig::middleware::{self, Next};
//! use sprig::{Context, Response, StatusCode};
//!
//! let require_token = middleware::from_fn(|ctx: &mut Context, next: Next<'_>| {
//!     if ctx.request().header("authorization").is_none() {
//!         return Response::status(StatusCode::UNAUTHORIZED);
//!     }
//!     next.run(ctx)
//! });
//! ```

mod catch_panic;
mod trace;

use std::sync::Arc;

use crate::context::Context;
use crate::handler::{BoxedHandler, ErasedHandler};
use crate::response::Response;

pub use catch_panic::CatchPanic;
pub use trace::Trace;

/// Cross-cutting behaviour wrapped around a handler.
pub trait Middleware: Send + Sync + 'static {
    fn handle(&self, ctx: &mut Context, next: Next<'_>) -> Response;
}

pub(crate) type SharedMiddleware = Arc<dyn Middleware>;

/// The rest of the chain below the current middleware.
///
/// Consumed by [`run`](Next::run), so it can be invoked at most once.
pub struct Next<'a> {
    layers: &'a [SharedMiddleware],
    handler: &'a (dyn ErasedHandler + Send + Sync),
}

impl Next<'_> {
    /// Runs the next middleware, or the handler when none remain.
    pub fn run(self, ctx: &mut Context) -> Response {
        match self.layers.split_first() {
            Some((layer, rest)) => layer.handle(ctx, Next { layers: rest, handler: self.handler }),
            None => self.handler.call(ctx),
        }
    }
}

/// Middleware built from a function or closure. See [`from_fn`].
pub struct FromFn<F>(F);

/// Wraps `f` as a [`Middleware`].
///
/// ```rust
/// use sprig::middleware::{self, Next};
/// use sprig::{Context, Response};
///
/// fn server_header(ctx: &mut Context, next: Next<'_>) -> Response {
///     let mut res = next.run(ctx);
///     res.append_header("server", "sprig");
///     res
/// }
///
/// let layer = middleware::from_fn(server_header);
/// ```
pub fn from_fn<F>(f: F) -> FromFn<F>
where
    F: Fn(&mut Context, Next<'_>) -> Response + Send + Sync + 'static,
{
    FromFn(f)
}

impl<F> Middleware for FromFn<F>
where
    F: Fn(&mut Context, Next<'_>) -> Response + Send + Sync + 'static,
{
    fn handle(&self, ctx: &mut Context, next: Next<'_>) -> Response {
        (self.0)(ctx, next)
    }
}

/// A handler wrapped in its middleware, outermost first.
struct Chain {
    layers: Box<[SharedMiddleware]>,
    handler: BoxedHandler,
}

impl ErasedHandler for Chain {
    fn call(&self, ctx: &mut Context) -> Response {
        Next { layers: &self.layers, handler: &*self.handler }.run(ctx)
    }
}

/// Wraps `handler` in `layers`. `layers[0]` runs first.
pub(crate) fn compose(layers: Vec<SharedMiddleware>, handler: BoxedHandler) -> BoxedHandler {
    if layers.is_empty() {
        return handler;
    }
    Arc::new(Chain { layers: layers.into_boxed_slice(), handler })
}

//! Handler trait and type erasure.
//!
//! # How handlers are stored
//!
//! Routes hold handlers of different concrete types in one table, so each
//! handler is boxed behind [`ErasedHandler`]:
//!
//! ```text
//! fn show(ctx: &mut Context) -> Response { … }    ← user writes this
//!        ↓ app.get("/users/<id:int>", show)
//! show.into_boxed_handler()                        ← Handler blanket impl
//!        ↓
//! Arc::new(FnHandler(show))                        ← stored as BoxedHandler
//!        ↓ wrapped by the route's middleware chain at registration
//! chain.call(&mut ctx)  at request time            ← one vtable dispatch per layer
//! ```
//!
//! Handlers are plain synchronous functions. Each request runs on its own
//! worker thread, so a handler may block without stalling other requests.

use std::sync::Arc;

use crate::context::Context;
use crate::response::{IntoResponse, Response};

/// Internal dispatch interface.
///
/// `#[doc(hidden)] pub` because it appears in the public `Handler` trait.
#[doc(hidden)]
pub trait ErasedHandler {
    fn call(&self, ctx: &mut Context) -> Response;
}

/// A type-erased handler shared across concurrent requests.
#[doc(hidden)]
pub type BoxedHandler = Arc<dyn ErasedHandler + Send + Sync + 'static>;

/// Implemented for every valid terminal handler.
///
/// You never implement this yourself. It is satisfied by any function or
/// closure with the signature:
///
/// ```text
/// fn name(ctx: &mut Context) -> impl IntoResponse
/// ```
///
/// Closures need their argument annotated (`|ctx: &mut Context| …`) so the
/// compiler infers a signature that works for every borrow.
pub trait Handler: private::Sealed + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_handler(self) -> BoxedHandler;
}

mod private {
    pub trait Sealed {}
}

impl<F, R> private::Sealed for F
where
    F: Fn(&mut Context) -> R + Send + Sync + 'static,
    R: IntoResponse,
{
}

impl<F, R> Handler for F
where
    F: Fn(&mut Context) -> R + Send + Sync + 'static,
    R: IntoResponse,
{
    fn into_boxed_handler(self) -> BoxedHandler {
        Arc::new(FnHandler(self))
    }
}

/// Bridges a concrete handler `F` to the trait-object world.
struct FnHandler<F>(F);

impl<F, R> ErasedHandler for FnHandler<F>
where
    F: Fn(&mut Context) -> R,
    R: IntoResponse,
{
    fn call(&self, ctx: &mut Context) -> Response {
        (self.0)(ctx).into_response()
    }
}

//! Converts a panicking chain into a `500`.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use http::StatusCode;
use tracing::error;

use super::{Middleware, Next};
use crate::context::Context;
use crate::response::Response;

/// Catches a panic raised anywhere inside it and answers
/// `500 Internal Server Error` instead.
///
/// Register it as the outermost application middleware. Session cookies set
/// before the panic are still sent.
#[derive(Clone, Copy, Debug, Default)]
pub struct CatchPanic;

impl Middleware for CatchPanic {
    fn handle(&self, ctx: &mut Context, next: Next<'_>) -> Response {
        match panic::catch_unwind(AssertUnwindSafe(|| next.run(ctx))) {
            Ok(response) => response,
            Err(payload) => {
                error!(
                    path = %ctx.request().path(),
                    panic = panic_message(payload.as_ref()),
                    "handler panicked",
                );
                Response::status(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "non-string panic payload"
    }
}

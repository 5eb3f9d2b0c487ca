//! Per-request tracing span.

use std::time::Instant;

use tracing::{field, info, info_span};

use super::{Middleware, Next};
use crate::context::Context;
use crate::response::Response;

/// Opens a `request` span with `method` and `path`, and logs the status and
/// latency when the inner chain returns.
///
/// Add it first so the span covers every other middleware.
#[derive(Clone, Copy, Debug, Default)]
pub struct Trace;

impl Middleware for Trace {
    fn handle(&self, ctx: &mut Context, next: Next<'_>) -> Response {
        let span = info_span!(
            "request",
            method = %ctx.request().method(),
            path = %ctx.request().path(),
            status = field::Empty,
        );
        let _entered = span.enter();
        let started = Instant::now();

        let response = next.run(ctx);

        span.record("status", response.status_code().as_u16());
        info!(latency_us = started.elapsed().as_micros() as u64, "request completed");
        response
    }
}

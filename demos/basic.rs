//! Minimal sprig example: a login session, a blueprint and a custom 404.
//!
//! Run with:
//!   RUST_LOG=info cargo run --example basic
//!
//! Try:
//!   curl -i -X POST http://localhost:7070/shop/login/ada
//!   curl -b 'SID=<value from above>' http://localhost:7070/shop/me
//!   curl http://localhost:7070/shop/items/42
//!   curl http://localhost:7070/shop/static/css/site.css
//!   curl -i -X POST http://localhost:7070/shop/items/42

use std::sync::Arc;

use serde_json::json;
use sprig::middleware::{self, CatchPanic, Next, Trace};
use sprig::session::{MemorySessionCache, SessionLayer, SessionPolicy, Sessions};
use sprig::{Application, Blueprint, Context, Endpoint, Error, Methods, Response, StatusCode};

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt::init();

    let sessions = Sessions::new(Arc::new(MemorySessionCache::new()), SessionPolicy::default());

    let items = Blueprint::new("/items")
        .middleware(middleware::from_fn(require_session))
        .register(Endpoint::new("/<id:int>", Methods::GET, get_item));

    let assets = Blueprint::new("/static")
        .register(Endpoint::new("/<filepath:path>", Methods::GET, asset));

    Application::new("basic", "/shop", "0.0.0.0:7070")
        .middleware(Trace)
        .middleware(CatchPanic)
        .middleware(SessionLayer::new(sessions))
        .post("/login/<user:string>", login)
        .post("/logout", logout)
        .get("/me", me)
        .blueprint(items)
        .blueprint(assets)
        .not_found(|ctx: &mut Context| {
            Response::builder()
                .status(StatusCode::NOT_FOUND)
                .text(format!("no page at {}\n", ctx.request().path()))
        })
        .run()
        .await
}

fn login(ctx: &mut Context) -> Result<StatusCode, Error> {
    let user = ctx.param("user").unwrap_or_default().to_owned();
    ctx.start_session(&user)?;
    Ok(StatusCode::NO_CONTENT)
}

fn logout(ctx: &mut Context) -> Result<StatusCode, Error> {
    ctx.end_session()?;
    Ok(StatusCode::NO_CONTENT)
}

fn me(ctx: &mut Context) -> Response {
    let Some(session) = ctx.session() else {
        return Response::status(StatusCode::UNAUTHORIZED);
    };
    let body = json!({ "session": session.key(), "user": session.user() });
    Response::json(body.to_string().into_bytes())
}

// Anonymous requests never reach the handler.
fn require_session(ctx: &mut Context, next: Next<'_>) -> Response {
    if ctx.session().is_none() {
        return Response::status(StatusCode::UNAUTHORIZED);
    }
    next.run(ctx)
}

fn get_item(ctx: &mut Context) -> Response {
    let id = ctx.param("id").unwrap_or_default();
    Response::json(json!({ "id": id, "name": "widget" }).to_string().into_bytes())
}

fn asset(ctx: &mut Context) -> String {
    format!("would serve {}\n", ctx.param("filepath").unwrap_or_default())
}

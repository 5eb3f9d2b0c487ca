//! # sprig
//!
//! An embeddable HTTP dispatch engine: typed path templates, an ordered
//! route table, three-scope middleware chains and cookie sessions.
//!
//! ## Routing
//!
//! Templates are literal segments and typed variables, `<name:int>`,
//! `<name:string>` or `<name:path>`, compiled to anchored regular
//! expressions at registration. Routes are tried in registration order; the
//! first whose path matches decides the outcome, so when that route does not
//! accept the method the request is not passed on to later routes.
//!
//! ## Middleware
//!
//! Application, then blueprint, then endpoint middleware wrap each handler,
//! composed once at registration. See [`middleware`].
//!
//! ## Sessions
//!
//! [`session::SessionLayer`] resolves the `SID` cookie against a pluggable
//! [`session::SessionCache`] with sliding expiry. See [`session`].
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use sprig::session::{MemorySessionCache, SessionLayer, SessionPolicy, Sessions};
//! use sprig::{Application, Blueprint, Context, Endpoint, Methods, StatusCode, middleware};
//!
//! fn login(ctx: &mut Context) -> Result<StatusCode, sprig::Error> {
//!     ctx.start_session("ada")?;
//!     Ok(StatusCode::NO_CONTENT)
//! }
//!
//! fn file(ctx: &mut Context) -> String {
//!     format!("serving {}", ctx.param("filepath").unwrap_or_default())
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), sprig::Error> {
//!     let sessions = Sessions::new(Arc::new(MemorySessionCache::new()), SessionPolicy::default());
//!
//!     let files = Blueprint::new("/files")
//!         .register(Endpoint::new("/<filepath:path>", Methods::GET, file));
//!
//!     Application::new("demo", "/", "0.0.0.0:7070")
//!         .middleware(middleware::Trace)
//!         .middleware(SessionLayer::new(sessions))
//!         .post("/login", login)
//!         .blueprint(files)
//!         .run()
//!         .await
//! }
//! ```

mod app;
mod blueprint;
mod config;
mod context;
mod cookie;
mod endpoint;
mod error;
mod handler;
mod method;
mod pattern;
mod request;
mod response;
mod route;
mod server;

pub mod middleware;
pub mod session;

pub use app::Application;
pub use blueprint::Blueprint;
pub use config::Config;
pub use context::Context;
pub use cookie::Cookie;
pub use endpoint::Endpoint;
pub use error::{CacheError, Error};
pub use handler::Handler;
pub use http::StatusCode;
pub use method::{Method, Methods};
pub use pattern::{Kind, Params, PathPattern, Segment};
pub use request::Request;
pub use response::{IntoResponse, Response, ResponseBuilder};
pub use route::{Outcome, Route, RouteTable};
pub use server::Server;

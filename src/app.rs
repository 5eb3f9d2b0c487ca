//! The application: configuration, middleware and the route table.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::blueprint::Blueprint;
use crate::config::Config;
use crate::context::Context;
use crate::endpoint::Endpoint;
use crate::error::Error;
use crate::handler::{BoxedHandler, ErasedHandler, Handler};
use crate::method::Methods;
use crate::middleware::{self, Middleware, SharedMiddleware};
use crate::pattern::PathPattern;
use crate::request::Request;
use crate::response::Response;
use crate::route::{Outcome, Resolution, Route, RouteTable};
use crate::server::Server;

/// The top-level registry requests are dispatched through.
///
/// Build it once at startup: add application middleware, then register
/// endpoints and blueprints. Each registration composes the route's
/// middleware chain immediately, so application middleware added after a
/// route does not wrap that route.
///
/// Routes are matched in registration order; register the more specific of
/// two overlapping templates first.
///
/// ```rust
/// use sprig::{Application, Context, Request, StatusCode};
///
/// let app = Application::new("shop", "/api", "0.0.0.0:7070")
///     .get("/user/<userid:int>", |ctx: &mut Context| {
///         format!("user {}", ctx.param("userid").unwrap_or_default())
///     });
///
/// let res = app.handle(Request::new("GET", "/api/user/7"));
/// assert_eq!(res.status_code(), StatusCode::OK);
/// assert_eq!(res.body(), b"user 7");
/// ```
pub struct Application {
    config: Config,
    middleware: Vec<SharedMiddleware>,
    routes: RouteTable,
    not_found: Option<BoxedHandler>,
}

impl Application {
    pub fn new(name: &str, root: &str, bind_location: &str) -> Self {
        Self::from_config(Config::new(name, root, bind_location))
    }

    pub fn from_config(config: Config) -> Self {
        Self {
            config,
            middleware: Vec::new(),
            routes: RouteTable::default(),
            not_found: None,
        }
    }

    /// Reads a JSON [`Config`]. An error here should abort startup.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        Config::from_json_file(path).map(Self::from_config)
    }

    pub fn config(&self) -> &Config { &self.config }
    pub fn name(&self) -> &str { &self.config.name }
    pub fn root(&self) -> &str { &self.config.root }
    pub fn bind_location(&self) -> &str { &self.config.bind_location }
    pub fn routes(&self) -> &RouteTable { &self.routes }

    /// Adds application middleware, outermost first.
    pub fn middleware(mut self, middleware: impl Middleware) -> Self {
        if !self.routes.is_empty() {
            warn!(
                routes = self.routes.len(),
                "application middleware added after routes; existing routes are not wrapped"
            );
        }
        self.middleware.push(Arc::new(middleware));
        self
    }

    /// Registers an endpoint under the application root.
    ///
    /// # Panics
    ///
    /// Panics if the endpoint's template is malformed. Use
    /// [`try_register`](Self::try_register) to handle the error instead.
    pub fn register(mut self, endpoint: Endpoint) -> Self {
        if let Err(e) = self.try_register(endpoint) {
            panic!("{e}");
        }
        self
    }

    /// Registers the endpoint `generator` builds.
    pub fn register_with(self, generator: impl FnOnce() -> Endpoint) -> Self {
        self.register(generator())
    }

    /// Registers every endpoint of `blueprint` under `root + prefix`.
    ///
    /// # Panics
    ///
    /// Panics if any template is malformed. See
    /// [`try_blueprint`](Self::try_blueprint).
    pub fn blueprint(mut self, blueprint: Blueprint) -> Self {
        if let Err(e) = self.try_blueprint(blueprint) {
            panic!("{e}");
        }
        self
    }

    /// Registers `handler` for `methods` on `path` with no endpoint middleware.
    pub fn route(self, methods: impl Into<Methods>, path: &str, handler: impl Handler) -> Self {
        self.register(Endpoint::new(path, methods, handler))
    }

    pub fn get(self, path: &str, handler: impl Handler) -> Self {
        self.route(Methods::GET, path, handler)
    }

    pub fn post(self, path: &str, handler: impl Handler) -> Self {
        self.route(Methods::POST, path, handler)
    }

    pub fn put(self, path: &str, handler: impl Handler) -> Self {
        self.route(Methods::PUT, path, handler)
    }

    pub fn delete(self, path: &str, handler: impl Handler) -> Self {
        self.route(Methods::DELETE, path, handler)
    }

    /// Replaces the default `404` for unmatched requests, including a path
    /// match whose method is not accepted. It runs without middleware.
    pub fn not_found(mut self, handler: impl Handler) -> Self {
        self.not_found = Some(handler.into_boxed_handler());
        self
    }

    pub fn try_register(&mut self, endpoint: Endpoint) -> Result<(), Error> {
        let root = self.config.root.clone();
        self.bind(&[root.as_str()], &[], endpoint)
    }

    pub fn try_blueprint(&mut self, blueprint: Blueprint) -> Result<(), Error> {
        let root = self.config.root.clone();
        for endpoint in blueprint.endpoints {
            self.bind(&[root.as_str(), blueprint.prefix.as_str()], &blueprint.middleware, endpoint)?;
        }
        Ok(())
    }

    fn bind(
        &mut self,
        prefixes: &[&str],
        scoped: &[SharedMiddleware],
        endpoint: Endpoint,
    ) -> Result<(), Error> {
        let mut parts = prefixes.to_vec();
        parts.push(&endpoint.path);
        let template = join(&parts);
        let pattern = PathPattern::compile(&template)?;

        let layers: Vec<SharedMiddleware> = self.middleware.iter()
            .chain(scoped)
            .chain(&endpoint.middleware)
            .cloned()
            .collect();
        debug!(
            template = %template,
            pattern = pattern.as_str(),
            methods = ?endpoint.methods,
            middleware = layers.len(),
            "route registered"
        );
        let handler = middleware::compose(layers, endpoint.handler);
        self.routes.push(Route::new(pattern, endpoint.methods, handler));
        Ok(())
    }

    /// Routes `request`, runs the matched chain or the not-found handler, and
    /// reports which happened.
    pub fn dispatch(&self, request: Request) -> (Response, Outcome<'_>) {
        let method = request.known_method();
        let mut ctx = Context::new(request);

        let (response, outcome) = match self.routes.resolve(method, ctx.request().path()) {
            Resolution::Found { route, params } => {
                ctx.set_params(params);
                let response = route.handler().call(&mut ctx);
                (response, Outcome::Matched { template: route.template() })
            }
            Resolution::MethodNotAllowed(route) => {
                debug!(
                    method = ctx.request().method(),
                    template = route.template(),
                    "method not accepted by matching route"
                );
                let outcome = Outcome::MethodNotAllowed {
                    template: route.template(),
                    allowed: route.methods(),
                };
                (self.fallback(&mut ctx), outcome)
            }
            Resolution::NotFound => {
                debug!(
                    method = ctx.request().method(),
                    path = ctx.request().path(),
                    "no route matched"
                );
                (self.fallback(&mut ctx), Outcome::NotFound)
            }
        };
        (ctx.finish(response), outcome)
    }

    /// [`dispatch`](Self::dispatch) without the outcome.
    pub fn handle(&self, request: Request) -> Response {
        self.dispatch(request).0
    }

    fn fallback(&self, ctx: &mut Context) -> Response {
        match &self.not_found {
            Some(handler) => handler.call(ctx),
            None => Response::not_found(),
        }
    }

    /// Serves on the configured bind location until SIGTERM or Ctrl-C.
    pub async fn run(self) -> Result<(), Error> {
        Server::bind(&self.config.bind_location)?.serve(self).await
    }
}

/// Joins path pieces with single slashes. The result starts with `/` and
/// ends with `/` only when the last piece does.
pub(crate) fn join(parts: &[&str]) -> String {
    let mut out = String::from("/");
    for segment in parts.iter().flat_map(|p| p.split('/')).filter(|s| !s.is_empty()) {
        if !out.ends_with('/') {
            out.push('/');
        }
        out.push_str(segment);
    }
    if parts.last().is_some_and(|p| p.ends_with('/')) && !out.ends_with('/') {
        out.push('/');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_paths() {
        assert_eq!(join(&["/", "/user/<id:int>"]), "/user/<id:int>");
        assert_eq!(join(&["/somewebapp/", "/user/<id:int>"]), "/somewebapp/user/<id:int>");
        assert_eq!(join(&["/", "/blueprint-test", "/fs/<f:path>"]), "/blueprint-test/fs/<f:path>");
        assert_eq!(join(&["/", "/test/"]), "/test/");
        assert_eq!(join(&["/", "/"]), "/");
        assert_eq!(join(&["", ""]), "/");
        assert_eq!(join(&["api", "v1//items"]), "/api/v1/items");
    }

    #[test]
    fn registration_compiles_under_root() {
        let app = Application::new("t", "/app", "127.0.0.1:0")
            .get("/a/<n:int>", |_: &mut Context| "a")
            .blueprint(Blueprint::new("/bp").register(Endpoint::new("/b/", Methods::POST, |_: &mut Context| "b")));
        let templates: Vec<_> = app.routes().iter().map(Route::template).collect();
        assert_eq!(templates, ["/app/a/<n:int>", "/app/bp/b/"]);
    }

    #[test]
    fn malformed_templates_are_registration_errors() {
        let mut app = Application::new("t", "/", "127.0.0.1:0");
        let err = app
            .try_register(Endpoint::new("/x/<y:float>", Methods::GET, |_: &mut Context| "x"))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidVariable { .. }));
        assert!(app.routes().is_empty());
    }

    #[test]
    #[should_panic(expected = "malformed variable")]
    fn builder_registration_panics_on_malformed_templates() {
        let _ = Application::new("t", "/", "127.0.0.1:0").get("/<bad:type>", |_: &mut Context| "x");
    }

    #[test]
    fn config_accessors() {
        let app = Application::new("Test Application", "/", "0.0.0.0:7070");
        assert_eq!(app.name(), "Test Application");
        assert_eq!(app.root(), "/");
        assert_eq!(app.bind_location(), "0.0.0.0:7070");
    }
}

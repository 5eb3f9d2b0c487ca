//! The route table and the dispatch scan.
//!
//! Routes are tried in registration order and the first whose pattern
//! matches the path decides the outcome. There is no specificity ranking:
//! when two templates overlap, whichever was registered first wins.
//!
//! If that first path match does not accept the request method, the scan
//! stops there. A later route that would accept both is never consulted.

use std::fmt;

use crate::handler::BoxedHandler;
use crate::method::{Method, Methods};
use crate::pattern::{Params, PathPattern};

/// A compiled template, its accepted methods and its fully wrapped handler.
pub struct Route {
    pattern: PathPattern,
    methods: Methods,
    handler: BoxedHandler,
}

impl Route {
    pub(crate) fn new(pattern: PathPattern, methods: Methods, handler: BoxedHandler) -> Self {
        Self { pattern, methods, handler }
    }

    pub fn template(&self) -> &str {
        self.pattern.template()
    }

    pub fn pattern(&self) -> &PathPattern {
        &self.pattern
    }

    pub fn methods(&self) -> Methods {
        self.methods
    }

    pub(crate) fn handler(&self) -> &BoxedHandler {
        &self.handler
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("template", &self.template())
            .field("methods", &self.methods)
            .finish_non_exhaustive()
    }
}

/// How a request was resolved.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Outcome<'a> {
    /// A route matched path and method; its handler ran.
    Matched { template: &'a str },
    /// The first route matching the path does not accept the method.
    MethodNotAllowed { template: &'a str, allowed: Methods },
    /// No route matched the path, or the method is not one sprig knows.
    NotFound,
}

pub(crate) enum Resolution<'a> {
    Found { route: &'a Route, params: Params },
    MethodNotAllowed(&'a Route),
    NotFound,
}

/// Routes in registration order.
#[derive(Default)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    pub(crate) fn push(&mut self, route: Route) {
        self.routes.push(route);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Route> {
        self.routes.iter()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub(crate) fn resolve(&self, method: Option<Method>, path: &str) -> Resolution<'_> {
        // An unparseable method fails every route's method gate, so nothing
        // can match and it is not reported as a method mismatch.
        let Some(method) = method else {
            return Resolution::NotFound;
        };
        for route in &self.routes {
            let Some(params) = route.pattern.captures(path) else {
                continue;
            };
            if route.methods.contains(method) {
                return Resolution::Found { route, params };
            }
            return Resolution::MethodNotAllowed(route);
        }
        Resolution::NotFound
    }
}

impl fmt::Debug for RouteTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.routes).finish()
    }
}

//! Route tree construction.
//!
//! # Responsibilities
//! - Hold the ordered tree of structural segments and method leaves
//! - Attach middleware to tree nodes
//! - Derive a dispatcher from a finished tree
//!
//! # Design Decisions
//! - Entries are an explicit tagged variant; consumers switch on the tag
//! - Leaves are keyed by method token, children by segment name
//! - A `$` prefix marks a dynamic segment bound at request time
//! - Duplicate path+method combinations are not checked; the first wins

use std::fmt;
use std::sync::Arc;

use crate::http::Dispatcher;
use crate::middleware::Middleware;
use crate::routing::method::Method;
use crate::routing::route::{Handler, Route};

/// Marker prefix of a dynamic segment.
pub const DYNAMIC_MARKER: char = '$';

/// Binding name of a dynamic segment (`$id` → `id`), or `None` for a static one.
pub fn dynamic_name(segment: &str) -> Option<&str> {
    segment.strip_prefix(DYNAMIC_MARKER)
}

/// One named entry of a [`Router`].
#[derive(Clone)]
pub enum Entry {
    Route(Arc<Route>),
    /// Bare handler: a route with no schemas and no description.
    Handler(Arc<dyn Handler>),
    Router(Arc<Router>),
}

impl fmt::Debug for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entry::Route(route) => f.debug_tuple("Route").field(route).finish(),
            Entry::Handler(_) => f.write_str("Handler"),
            Entry::Router(router) => f.debug_tuple("Router").field(router).finish(),
        }
    }
}

/// A method leaf resolved from an [`Entry`].
#[derive(Clone)]
pub struct Leaf {
    pub handler: Arc<dyn Handler>,
    pub route: Option<Arc<Route>>,
}

#[derive(Clone, Default)]
pub struct Router {
    entries: Vec<(String, Entry)>,
    middleware: Vec<Arc<dyn Middleware>>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(mut self, method: Method, route: Route) -> Self {
        self.entries
            .push((method.as_str().to_string(), Entry::Route(Arc::new(route))));
        self
    }

    pub fn get(self, route: Route) -> Self {
        self.route(Method::Get, route)
    }

    pub fn post(self, route: Route) -> Self {
        self.route(Method::Post, route)
    }

    pub fn put(self, route: Route) -> Self {
        self.route(Method::Put, route)
    }

    pub fn patch(self, route: Route) -> Self {
        self.route(Method::Patch, route)
    }

    pub fn delete(self, route: Route) -> Self {
        self.route(Method::Delete, route)
    }

    /// Bare handler under a method token.
    pub fn handler<H: Handler>(mut self, method: Method, handler: H) -> Self {
        self.entries
            .push((method.as_str().to_string(), Entry::Handler(Arc::new(handler))));
        self
    }

    /// Nest a sub-router under `segment` (`"users"`, `"$id"`, ...).
    pub fn nest(mut self, segment: impl Into<String>, router: Router) -> Self {
        self.entries
            .push((segment.into(), Entry::Router(Arc::new(router))));
        self
    }

    /// Attach middleware to this node. It wraps every leaf below it, after
    /// any middleware attached to ancestors.
    pub fn layer<M: Middleware>(mut self, middleware: M) -> Self {
        self.middleware.push(Arc::new(middleware));
        self
    }

    pub fn layer_arc(mut self, middleware: Arc<dyn Middleware>) -> Self {
        self.middleware.push(middleware);
        self
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &Entry)> {
        self.entries.iter().map(|(name, entry)| (name.as_str(), entry))
    }

    pub fn middleware(&self) -> &[Arc<dyn Middleware>] {
        &self.middleware
    }

    /// Leaf registered under `method` at this node.
    pub fn leaf(&self, method: Method) -> Option<Leaf> {
        self.entries().find_map(|(name, entry)| {
            if name != method.as_str() {
                return None;
            }
            match entry {
                Entry::Route(route) => Some(Leaf {
                    handler: Arc::clone(route.handler()),
                    route: Some(Arc::clone(route)),
                }),
                Entry::Handler(handler) => Some(Leaf {
                    handler: Arc::clone(handler),
                    route: None,
                }),
                Entry::Router(_) => None,
            }
        })
    }

    /// Child router for one decoded path component. Static children win over
    /// dynamic ones; the returned name is the binding for a dynamic match.
    pub fn child(&self, component: &str) -> Option<(&Router, Option<&str>)> {
        let children = || {
            self.entries.iter().filter_map(|(name, entry)| match entry {
                Entry::Router(router) => Some((name.as_str(), router.as_ref())),
                _ => None,
            })
        };

        children()
            .find(|(name, _)| dynamic_name(name).is_none() && *name == component)
            .map(|(_, router)| (router, None))
            .or_else(|| {
                children()
                    .find_map(|(name, router)| dynamic_name(name).map(|binding| (router, Some(binding))))
            })
    }

    /// Freeze the tree into a dispatcher.
    pub fn into_dispatcher(self) -> Dispatcher {
        Dispatcher::new(self)
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("entries", &self.entries)
            .field("middleware", &self.middleware.len())
            .finish()
    }
}

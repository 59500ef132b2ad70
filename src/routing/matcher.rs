//! Path resolution against the route tree.
//!
//! ```text
//! "/users/a%2Fb"  →  ["users", "a/b"]
//!     root.child("users")           static
//!     users.child("a/b")            dynamic "$id" → id = "a/b"
//!     node.leaf(Get)                method token
//! ```
//!
//! Middleware is collected root first, so a parent's chain always wraps a
//! child's.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::middleware::Middleware;
use crate::routing::method::Method;
use crate::routing::router::{Leaf, Router};

/// Successful resolution of method + path.
#[derive(Clone)]
pub struct RouteMatch {
    pub leaf: Leaf,
    /// Dynamic bindings, marker stripped, values decoded.
    pub params: BTreeMap<String, String>,
    /// Middleware from root to the matched node, outer first.
    pub middleware: Vec<Arc<dyn Middleware>>,
    /// Matched tree path with dynamic segments as written (`/users/$id`).
    pub pattern: String,
}

/// Split a raw path into decoded components. Empty components (leading,
/// trailing or doubled slashes) are dropped. `None` if a component is not
/// valid percent-encoded UTF-8.
pub fn split_path(path: &str) -> Option<Vec<String>> {
    path.split('/')
        .filter(|component| !component.is_empty())
        .map(|component| {
            urlencoding::decode(component)
                .ok()
                .map(|decoded| decoded.into_owned())
        })
        .collect()
}

/// Resolve `method` + raw `path` to a leaf.
pub fn resolve(root: &Router, method: Method, path: &str) -> Option<RouteMatch> {
    let components = split_path(path)?;

    let mut node = root;
    let mut params = BTreeMap::new();
    let mut middleware: Vec<Arc<dyn Middleware>> = root.middleware().to_vec();
    let mut pattern = String::new();

    for component in components {
        let (child, binding) = node.child(&component)?;
        pattern.push('/');
        match binding {
            Some(name) => {
                pattern.push(super::router::DYNAMIC_MARKER);
                pattern.push_str(name);
                params.insert(name.to_string(), component);
            }
            None => pattern.push_str(&component),
        }
        middleware.extend(child.middleware().iter().cloned());
        node = child;
    }

    let leaf = node.leaf(method)?;
    if pattern.is_empty() {
        pattern.push('/');
    }

    Some(RouteMatch {
        leaf,
        params,
        middleware,
        pattern,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    use crate::context::Context;
    use crate::error::HandlerError;
    use crate::middleware::{from_fn, Next};
    use crate::routing::route::Route;

    async fn ok(_ctx: Context) -> Result<serde_json::Value, HandlerError> {
        Ok(json!("ok"))
    }

    fn tree() -> Router {
        Router::new().nest(
            "users",
            Router::new()
                .get(Route::new(ok).describe("list"))
                .nest("me", Router::new().get(Route::new(ok).describe("me")))
                .nest(
                    "$id",
                    Router::new()
                        .get(Route::new(ok).describe("by id"))
                        .nest("posts", Router::new().handler(Method::Get, ok)),
                ),
        )
    }

    fn description(found: &RouteMatch) -> Option<&str> {
        found.leaf.route.as_deref().and_then(Route::description)
    }

    #[test]
    fn split_drops_empty_components_and_decodes() {
        assert_eq!(split_path("/a//b/").unwrap(), vec!["a", "b"]);
        assert_eq!(split_path("/a%2Fb/c%20d").unwrap(), vec!["a/b", "c d"]);
        assert!(split_path("/").unwrap().is_empty());
        assert!(split_path("/%FF").is_none());
    }

    #[test]
    fn static_segment_matches() {
        let found = resolve(&tree(), Method::Get, "/users").unwrap();
        assert_eq!(description(&found), Some("list"));
        assert!(found.params.is_empty());
        assert_eq!(found.pattern, "/users");
    }

    #[test]
    fn dynamic_segment_binds_decoded_value() {
        let found = resolve(&tree(), Method::Get, "/users/a%2Fb").unwrap();
        assert_eq!(description(&found), Some("by id"));
        assert_eq!(found.params.get("id").map(String::as_str), Some("a/b"));
        assert_eq!(found.pattern, "/users/$id");
    }

    #[test]
    fn static_sibling_wins_over_dynamic() {
        let found = resolve(&tree(), Method::Get, "/users/me").unwrap();
        assert_eq!(description(&found), Some("me"));
        assert!(found.params.is_empty());
    }

    #[test]
    fn bare_handler_leaf_has_no_route() {
        let found = resolve(&tree(), Method::Get, "/users/42/posts").unwrap();
        assert!(found.leaf.route.is_none());
        assert_eq!(found.params.get("id").map(String::as_str), Some("42"));
    }

    #[test]
    fn missing_method_or_path_is_none() {
        assert!(resolve(&tree(), Method::Post, "/users").is_none());
        assert!(resolve(&tree(), Method::Get, "/nope").is_none());
        assert!(resolve(&tree(), Method::Get, "/").is_none());
        assert!(resolve(&tree(), Method::Get, "/users/1/posts/2").is_none());
    }

    #[test]
    fn method_token_is_not_a_path_segment() {
        let found = resolve(&tree(), Method::Get, "/users/get").unwrap();
        assert_eq!(found.params.get("id").map(String::as_str), Some("get"));
    }

    #[test]
    fn middleware_collected_parent_first() {
        let noop = || {
            from_fn(|ctx: Context, next: Next| async move { next.run(ctx).await })
        };
        let root = Router::new()
            .layer(noop())
            .nest("a", Router::new().layer(noop()).layer(noop()).get(Route::new(ok)));

        let found = resolve(&root, Method::Get, "/a").unwrap();
        assert_eq!(found.middleware.len(), 3);
        assert!(resolve(&root, Method::Get, "/b").is_none());
    }
}

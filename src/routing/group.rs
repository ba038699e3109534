//! Route groups: a shared prefix plus shared middleware.
//!
//! A group borrows its router mutably and registers straight into the
//! router's table. Nested groups concatenate prefixes and accumulate the
//! parent's middleware before their own. No deduplication is done.

use axum::http::Method;

use super::handler::{Handler, Middleware};
use super::router::Router;
use super::table::{normalize_path, normalize_prefix, RouteError};

/// A prefix- and middleware-scoped view of a [`Router`].
#[derive(Debug)]
pub struct Group<'r> {
    router: &'r mut Router,
    prefix: String,
    middlewares: Vec<Middleware>,
}

impl<'r> Group<'r> {
    pub(crate) fn new(router: &'r mut Router, prefix: String, middlewares: Vec<Middleware>) -> Self {
        Self {
            router,
            prefix,
            middlewares,
        }
    }

    /// The accumulated prefix of this group.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Add middleware to every route registered through this group from now on.
    pub fn use_middleware(&mut self, middleware: Middleware) -> &mut Self {
        self.middlewares.push(middleware);
        self
    }

    /// Open a nested group. It inherits this group's prefix and middleware.
    pub fn group(&mut self, prefix: &str) -> Group<'_> {
        self.group_with(prefix, Vec::new())
    }

    /// Open a nested group with extra middleware after the inherited set.
    pub fn group_with(&mut self, prefix: &str, middlewares: Vec<Middleware>) -> Group<'_> {
        let mut inherited = self.middlewares.clone();
        inherited.extend(middlewares);
        Group {
            prefix: format!("{}{}", self.prefix, normalize_prefix(prefix)),
            middlewares: inherited,
            router: &mut *self.router,
        }
    }

    /// Register `prefix + path`. The route's middleware is `middlewares`
    /// followed by the group's accumulated middleware.
    pub fn try_handle(
        &mut self,
        method: Option<Method>,
        path: &str,
        handler: Handler,
        middlewares: Vec<Middleware>,
    ) -> Result<&mut Self, RouteError> {
        let pattern = self.join(path);
        let mut all = middlewares;
        all.extend(self.middlewares.iter().cloned());
        self.router.try_handle(method, &pattern, handler, all)?;
        Ok(self)
    }

    /// Register a route, panicking on a duplicate (method, pattern) pair.
    pub fn handle(
        &mut self,
        method: Option<Method>,
        path: &str,
        handler: Handler,
        middlewares: Vec<Middleware>,
    ) -> &mut Self {
        if let Err(err) = self.try_handle(method, path, handler, middlewares) {
            panic!("{err}");
        }
        self
    }

    pub fn any(&mut self, path: &str, handler: Handler) -> &mut Self {
        self.handle(None, path, handler, Vec::new())
    }

    pub fn get(&mut self, path: &str, handler: Handler) -> &mut Self {
        self.handle(Some(Method::GET), path, handler, Vec::new())
    }

    pub fn head(&mut self, path: &str, handler: Handler) -> &mut Self {
        self.handle(Some(Method::HEAD), path, handler, Vec::new())
    }

    pub fn post(&mut self, path: &str, handler: Handler) -> &mut Self {
        self.handle(Some(Method::POST), path, handler, Vec::new())
    }

    pub fn put(&mut self, path: &str, handler: Handler) -> &mut Self {
        self.handle(Some(Method::PUT), path, handler, Vec::new())
    }

    pub fn patch(&mut self, path: &str, handler: Handler) -> &mut Self {
        self.handle(Some(Method::PATCH), path, handler, Vec::new())
    }

    pub fn delete(&mut self, path: &str, handler: Handler) -> &mut Self {
        self.handle(Some(Method::DELETE), path, handler, Vec::new())
    }

    pub fn options(&mut self, path: &str, handler: Handler) -> &mut Self {
        self.handle(Some(Method::OPTIONS), path, handler, Vec::new())
    }

    // An empty path registers the group root itself.
    fn join(&self, path: &str) -> String {
        if path.is_empty() {
            normalize_path(&self.prefix)
        } else {
            format!("{}{}", self.prefix, normalize_path(path))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use std::sync::{Arc, Mutex};

    use crate::routing::handler::Request;
    use crate::routing::params::PathParamsExt;

    fn noop() -> Handler {
        Handler::new(|_req| async { "" })
    }

    fn paths(router: &Router) -> Vec<String> {
        router.routes().into_iter().map(|r| r.path).collect()
    }

    #[test]
    fn test_group_prefixes() {
        let mut router = Router::new();
        {
            let mut api = router.group("api/");
            api.get("/users", noop()).get("", noop());
            let mut v1 = api.group("/v1");
            v1.get("/users", noop()).post("orders", noop());
        }
        router.get("/", noop());

        assert_eq!(
            paths(&router),
            ["/", "/api", "/api/users", "/api/v1/orders", "/api/v1/users"]
        );
    }

    #[test]
    #[should_panic(expected = "already registered")]
    fn test_group_duplicate_panics() {
        let mut router = Router::new();
        router.get("/api/users", noop());
        router.group("/api").get("/users", noop());
    }

    #[tokio::test]
    async fn test_nested_group_middleware() {
        let log: Arc<Mutex<Vec<&'static str>>> = Arc::default();
        let tag = |name: &'static str| {
            let log = log.clone();
            Middleware::from_fn(move |req, next: Handler| {
                let log = log.clone();
                async move {
                    log.lock().unwrap().push(name);
                    next.invoke(req).await
                }
            })
        };

        let mut router = Router::new();
        {
            let mut api = router.group("/api");
            api.use_middleware(tag("api"));
            let mut v1 = api.group("/v1");
            v1.use_middleware(tag("v1"));
            v1.handle(
                Some(Method::GET),
                "/users/:uid",
                Handler::new(|req: Request| async move {
                    req.path_param("uid").unwrap_or_default().to_string()
                }),
                vec![tag("route")],
            );
        }

        let req = axum::http::Request::builder()
            .uri("/api/v1/users/9")
            .body(Body::empty())
            .unwrap();
        let res = router.into_dispatcher().dispatch(req).await;
        let body = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();

        assert_eq!(&body[..], b"9");
        assert_eq!(*log.lock().unwrap(), ["route", "api", "v1"]);
    }

    #[test]
    fn test_sibling_groups_do_not_share_middleware() {
        let mut router = Router::new();
        {
            let mut admin = router.group("/admin");
            admin.use_middleware(Middleware::new(|h| h));
            admin.get("/a", noop());
        }
        router.group("/public").get("/b", noop());

        let dispatcher = router.into_dispatcher();
        let admin = dispatcher.resolve(&Method::GET, "/admin/a").unwrap();
        let public = dispatcher.resolve(&Method::GET, "/public/b").unwrap();
        assert_eq!(admin.route.middlewares().len(), 1);
        assert!(public.route.middlewares().is_empty());
    }

    #[test]
    fn test_group_with_middleware() {
        let mark = Middleware::new(|h| h);
        let mut router = Router::new();
        {
            let mut api = router.group_with("/api", vec![mark.clone()]);
            api.get("/a", noop());
            api.group_with("/v2", vec![mark.clone(), mark]).get("/b", noop());
        }

        let dispatcher = router.into_dispatcher();
        let a = dispatcher.resolve(&Method::GET, "/api/a").unwrap();
        let b = dispatcher.resolve(&Method::GET, "/api/v2/b").unwrap();
        assert_eq!(a.route.middlewares().len(), 1);
        assert_eq!(b.route.middlewares().len(), 3);
    }
}

//! Route registration and dispatch.
//!
//! # Responsibilities
//! - Collect routes, router-level middleware and a not-found handler
//! - Freeze the collected state into an immutable [`Dispatcher`]
//! - Strip the router prefix, resolve the route, attach path parameters,
//!   invoke exactly one handler chain per request
//!
//! # Design Decisions
//! - Registration and serving are separate types: a `Dispatcher` cannot gain
//!   routes, so it is shared across workers without locks
//! - Each route's full chain is composed once when freezing; router-level
//!   middleware is outermost, route-local middleware innermost
//! - Handler panics are not caught here; install `middleware::recovery`

use std::convert::Infallible;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::http::Method;
use percent_encoding::percent_decode_str;
use serde::Serialize;
use tokio::net::TcpListener;
use tower::Service;

use super::group::Group;
use super::handler::{chain, Handler, Middleware, Request, Response, ResponseFuture};
use super::params;
use super::table::{method_label, normalize_prefix, RouteError, RouteMatch, RouteTable};
use crate::config::RouterConfig;
use crate::http::{middleware, response, HttpServer};
use crate::lifecycle::{signals, Shutdown};

/// Method order used by the route listing. Unknown methods sort last.
const METHOD_ORDER: [Method; 9] = [
    Method::GET,
    Method::HEAD,
    Method::POST,
    Method::PUT,
    Method::PATCH,
    Method::DELETE,
    Method::CONNECT,
    Method::OPTIONS,
    Method::TRACE,
];

/// One line of the route listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteInfo {
    /// Method name, `ANY` for method-agnostic routes.
    pub method: String,
    /// Full path pattern including the router prefix.
    pub path: String,
}

/// Registration-phase router.
///
/// ```ignore
/// let mut router = Router::new();
/// router
///     .get("/users", Handler::new(list_users))
///     .get("/users/:uid", Handler::new(show_user));
/// router.serve("127.0.0.1:8080").await?;
/// ```
#[derive(Debug, Default)]
pub struct Router {
    prefix: String,
    table: RouteTable,
    middlewares: Vec<Middleware>,
    not_found: Option<Handler>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// A router with panic recovery and request tracing installed.
    pub fn with_defaults() -> Self {
        let mut router = Self::new();
        router
            .use_middleware(middleware::recovery())
            .use_middleware(middleware::trace());
        router
    }

    /// A router whose prefix and router-level middleware come from config.
    pub fn from_config(config: &RouterConfig) -> Self {
        let mut router = Self::new();
        router.prefix(&config.routing.prefix);

        let mw = &config.middleware;
        if mw.recovery {
            router.use_middleware(middleware::recovery());
        }
        if mw.trace {
            router.use_middleware(middleware::trace());
        }
        if mw.timing {
            router.use_middleware(middleware::timing());
        }
        if let Some(cors) = &mw.cors {
            router.use_middleware(middleware::cors(cors.clone()));
        }
        if let Some(limit) = config.limits.max_in_flight {
            router.use_middleware(middleware::max_in_flight(limit));
        }
        router
    }

    /// Mount every route under `prefix`. Requests outside it are not found.
    pub fn prefix(&mut self, prefix: &str) -> &mut Self {
        self.prefix = normalize_prefix(prefix);
        self
    }

    /// Append router-level middleware; earlier calls wrap later ones.
    pub fn use_middleware(&mut self, middleware: Middleware) -> &mut Self {
        self.middlewares.push(middleware);
        self
    }

    /// Handler for requests no route matches.
    pub fn not_found(&mut self, handler: Handler) -> &mut Self {
        self.not_found = Some(handler);
        self
    }

    /// Register a route. `method == None` accepts every method.
    pub fn try_handle(
        &mut self,
        method: Option<Method>,
        pattern: &str,
        handler: Handler,
        middlewares: Vec<Middleware>,
    ) -> Result<&mut Self, RouteError> {
        let route = self.table.insert(method, pattern, handler, middlewares)?;
        tracing::debug!(
            method = method_label(route.method()),
            pattern = route.pattern().as_str(),
            regex = route.pattern().regex_str(),
            "Route registered"
        );
        Ok(self)
    }

    /// Register a route, panicking on a duplicate (method, pattern) pair.
    pub fn handle(
        &mut self,
        method: Option<Method>,
        pattern: &str,
        handler: Handler,
        middlewares: Vec<Middleware>,
    ) -> &mut Self {
        if let Err(err) = self.try_handle(method, pattern, handler, middlewares) {
            panic!("{err}");
        }
        self
    }

    pub fn any(&mut self, pattern: &str, handler: Handler) -> &mut Self {
        self.handle(None, pattern, handler, Vec::new())
    }

    pub fn get(&mut self, pattern: &str, handler: Handler) -> &mut Self {
        self.handle(Some(Method::GET), pattern, handler, Vec::new())
    }

    pub fn head(&mut self, pattern: &str, handler: Handler) -> &mut Self {
        self.handle(Some(Method::HEAD), pattern, handler, Vec::new())
    }

    pub fn post(&mut self, pattern: &str, handler: Handler) -> &mut Self {
        self.handle(Some(Method::POST), pattern, handler, Vec::new())
    }

    pub fn put(&mut self, pattern: &str, handler: Handler) -> &mut Self {
        self.handle(Some(Method::PUT), pattern, handler, Vec::new())
    }

    pub fn patch(&mut self, pattern: &str, handler: Handler) -> &mut Self {
        self.handle(Some(Method::PATCH), pattern, handler, Vec::new())
    }

    pub fn delete(&mut self, pattern: &str, handler: Handler) -> &mut Self {
        self.handle(Some(Method::DELETE), pattern, handler, Vec::new())
    }

    pub fn options(&mut self, pattern: &str, handler: Handler) -> &mut Self {
        self.handle(Some(Method::OPTIONS), pattern, handler, Vec::new())
    }

    /// Open a route group under `prefix`.
    pub fn group(&mut self, prefix: &str) -> Group<'_> {
        self.group_with(prefix, Vec::new())
    }

    /// Open a route group under `prefix` whose routes all carry `middlewares`.
    pub fn group_with(&mut self, prefix: &str, middlewares: Vec<Middleware>) -> Group<'_> {
        Group::new(self, normalize_prefix(prefix), middlewares)
    }

    /// Registered routes sorted by path, then method.
    pub fn routes(&self) -> Vec<RouteInfo> {
        list_routes(&self.prefix, &self.table)
    }

    /// Freeze the router. Every route's handler chain is composed here.
    pub fn into_dispatcher(self) -> Dispatcher {
        let router_middlewares: Vec<Option<Middleware>> =
            self.middlewares.into_iter().map(Some).collect();
        let chains = self
            .table
            .iter()
            .map(|route| {
                let local = chain(
                    route.handler().clone(),
                    route.middlewares().iter().cloned().map(Some),
                );
                chain(local, router_middlewares.iter().cloned())
            })
            .collect();

        tracing::info!(
            routes = self.table.len(),
            prefix = %self.prefix,
            "Routing table frozen"
        );

        Dispatcher {
            inner: Arc::new(DispatcherInner {
                prefix: self.prefix,
                table: self.table,
                chains,
                not_found: self.not_found,
            }),
        }
    }

    /// Bind `addr` and serve until Ctrl+C, using default server settings.
    pub async fn serve(self, addr: &str) -> std::io::Result<()> {
        let listener = TcpListener::bind(addr).await?;
        let shutdown = Shutdown::new();
        let server = HttpServer::new(self.into_dispatcher(), &RouterConfig::default());
        let stop = shutdown.subscribe();

        tokio::spawn(async move { signals::ctrl_c(&shutdown).await });
        server.run(listener, stop).await
    }
}

impl fmt::Display for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "---")?;
        for info in self.routes() {
            writeln!(f, "{} {}", info.method, info.path)?;
        }
        writeln!(f, "---")
    }
}

struct DispatcherInner {
    prefix: String,
    table: RouteTable,
    chains: Vec<Handler>,
    not_found: Option<Handler>,
}

/// Immutable request dispatcher; cheap to clone.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<DispatcherInner>,
}

impl Dispatcher {
    /// Resolve a request line without invoking anything.
    ///
    /// `path` is the raw URI path; it is percent-decoded before the prefix
    /// is stripped. A path that does not decode to UTF-8 matches nothing.
    pub fn resolve(&self, method: &Method, path: &str) -> Option<RouteMatch<'_>> {
        let decoded = percent_decode_str(path).decode_utf8().ok()?;
        let path = strip_prefix(&self.inner.prefix, &decoded)?;
        self.inner.table.lookup(method, path)
    }

    /// Dispatch one request to its handler chain or the not-found handler.
    pub fn dispatch(&self, mut req: Request) -> ResponseFuture {
        let resolved = self
            .resolve(req.method(), req.uri().path())
            .map(|m| (m.index, m.params));

        match resolved {
            Some((index, params)) => {
                if !params.is_empty() {
                    params::attach(&mut req, params);
                }
                self.inner.chains[index].invoke(req)
            }
            None => {
                tracing::debug!(
                    method = %req.method(),
                    path = %req.uri().path(),
                    "No route matched"
                );
                match &self.inner.not_found {
                    Some(handler) => handler.invoke(req),
                    None => Box::pin(async { response::not_found() }) as ResponseFuture,
                }
            }
        }
    }

    pub fn routes(&self) -> Vec<RouteInfo> {
        list_routes(&self.inner.prefix, &self.inner.table)
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("prefix", &self.inner.prefix)
            .field("routes", &self.inner.table.len())
            .finish()
    }
}

impl Service<Request> for Dispatcher {
    type Response = Response;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Response, Infallible>> + Send + 'static>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let fut = self.dispatch(req);
        Box::pin(async move { Ok(fut.await) })
    }
}

/// Remove the router prefix. A path equal to the prefix maps to `/`.
fn strip_prefix<'p>(prefix: &str, path: &'p str) -> Option<&'p str> {
    let rest = path.strip_prefix(prefix)?;
    Some(if rest.is_empty() { "/" } else { rest })
}

fn method_rank(method: Option<&Method>) -> usize {
    match method {
        None => 0,
        Some(m) => METHOD_ORDER
            .iter()
            .position(|known| known == m)
            .map_or(METHOD_ORDER.len() + 1, |i| i + 1),
    }
}

fn list_routes(prefix: &str, table: &RouteTable) -> Vec<RouteInfo> {
    let mut routes: Vec<_> = table
        .iter()
        .map(|r| (r.pattern().as_str(), method_rank(r.method()), r.method()))
        .collect();
    routes.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));
    routes
        .into_iter()
        .map(|(pattern, _, method)| RouteInfo {
            method: method_label(method).to_string(),
            path: format!("{prefix}{pattern}"),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::params::PathParamsExt;
    use axum::body::Body;
    use axum::http::StatusCode;
    use std::sync::Mutex;

    fn text(body: &'static str) -> Handler {
        Handler::new(move |_req| async move { body })
    }

    fn request(method: Method, path: &str) -> Request {
        axum::http::Request::builder()
            .method(method)
            .uri(path)
            .body(Body::empty())
            .unwrap()
    }

    async fn body_of(res: Response) -> String {
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    #[should_panic(expected = "already registered")]
    fn test_duplicate_panics() {
        let mut router = Router::new();
        router.get("/users", text("a")).get("/users", text("b"));
    }

    #[test]
    fn test_try_handle_reports_duplicate() {
        let mut router = Router::new();
        router.get("/users", text("a"));
        let err = router
            .try_handle(Some(Method::GET), "/users", text("b"), Vec::new())
            .unwrap_err();
        assert!(matches!(err, RouteError::Duplicate { .. }));
    }

    #[test]
    fn test_listing_order() {
        let mut router = Router::new();
        router
            .delete("/b", text(""))
            .get("/b", text(""))
            .any("/b", text(""))
            .handle(Some(Method::from_bytes(b"PURGE").unwrap()), "/b", text(""), Vec::new())
            .handle(Some(Method::TRACE), "/a", text(""), Vec::new())
            .head("/b", text(""));
        router.prefix("/api/");

        let listed: Vec<String> = router
            .routes()
            .into_iter()
            .map(|r| format!("{} {}", r.method, r.path))
            .collect();
        assert_eq!(
            listed,
            [
                "TRACE /api/a",
                "ANY /api/b",
                "GET /api/b",
                "HEAD /api/b",
                "DELETE /api/b",
                "PURGE /api/b",
            ]
        );
        assert_eq!(router.routes(), router.routes());
    }

    #[test]
    fn test_display_listing() {
        let mut router = Router::new();
        router.get("/x", text("")).any("/y", text(""));
        assert_eq!(router.to_string(), "---\nGET /x\nANY /y\n---\n");
    }

    #[test]
    fn test_strip_prefix() {
        assert_eq!(strip_prefix("", "/a"), Some("/a"));
        assert_eq!(strip_prefix("/api", "/api/a"), Some("/a"));
        assert_eq!(strip_prefix("/api", "/api"), Some("/"));
        assert_eq!(strip_prefix("/api", "/other"), None);
    }

    #[tokio::test]
    async fn test_dispatch_with_prefix() {
        let mut router = Router::new();
        router.prefix("/api").get("/users", text("users"));
        let dispatcher = router.into_dispatcher();

        let res = dispatcher.dispatch(request(Method::GET, "/api/users")).await;
        assert_eq!(body_of(res).await, "users");

        let res = dispatcher.dispatch(request(Method::GET, "/users")).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);

        let res = dispatcher.dispatch(request(Method::GET, "/apiusers")).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_dispatch_decodes_path() {
        let mut router = Router::new();
        router
            .prefix("/my files")
            .get("/hello world", text("hello"))
            .get(
                "/static/*filename",
                Handler::new(|req: Request| async move {
                    req.path_param("filename").unwrap_or_default().to_string()
                }),
            );
        let dispatcher = router.into_dispatcher();

        let res = dispatcher
            .dispatch(request(Method::GET, "/my%20files/hello%20world"))
            .await;
        assert_eq!(body_of(res).await, "hello");

        let res = dispatcher
            .dispatch(request(Method::GET, "/my%20files/static/my%20file.png"))
            .await;
        assert_eq!(body_of(res).await, "my file.png");

        assert!(dispatcher.resolve(&Method::GET, "/my%20files/hello%FFworld").is_none());
    }

    #[tokio::test]
    async fn test_default_not_found() {
        let dispatcher = Router::new().into_dispatcher();
        let res = dispatcher.dispatch(request(Method::GET, "/missing")).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_of(res).await, "Not Found");
    }

    #[tokio::test]
    async fn test_custom_not_found() {
        let mut router = Router::new();
        router.not_found(Handler::new(|_req| async {
            (StatusCode::NOT_FOUND, "nothing here")
        }));
        let res = router
            .into_dispatcher()
            .dispatch(request(Method::GET, "/missing"))
            .await;
        assert_eq!(body_of(res).await, "nothing here");
    }

    #[tokio::test]
    async fn test_router_middleware_wraps_route_middleware() {
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
        router.handle(
            Some(Method::GET),
            "/x",
            text("x"),
            vec![tag("route-1"), tag("route-2")],
        );
        router.use_middleware(tag("router"));
        router
            .into_dispatcher()
            .dispatch(request(Method::GET, "/x"))
            .await;

        assert_eq!(*log.lock().unwrap(), ["router", "route-1", "route-2"]);
    }
}

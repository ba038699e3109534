//! Handler contract and middleware composition.
//!
//! # Responsibilities
//! - Define the type-erased async handler every route resolves to
//! - Define middleware as a handler-to-handler transformation
//! - Compose middleware around a terminal handler (onion order)
//! - Bridge to tower: handlers are services, tower layers are middleware
//!
//! # Design Decisions
//! - Handlers are `Arc`-backed so cloning into a chain is a refcount bump
//! - User code runs inside the returned future, never when the future is
//!   created, so panics surface while polling (see `middleware::recovery`)
//! - The builder holds no state: composing twice yields equivalent handlers

use std::convert::Infallible;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::response::IntoResponse;
use tower::{Layer, Service, ServiceExt};

/// Request type seen by handlers and middleware.
pub type Request = axum::http::Request<Body>;

/// Response type produced by handlers and middleware.
pub type Response = axum::response::Response;

/// Boxed future returned by [`Handler::invoke`].
pub type ResponseFuture = Pin<Box<dyn Future<Output = Response> + Send + 'static>>;

type HandlerFn = dyn Fn(Request) -> ResponseFuture + Send + Sync;
type MiddlewareFn = dyn Fn(Handler) -> Handler + Send + Sync;

/// A type-erased async request handler.
#[derive(Clone)]
pub struct Handler {
    inner: Arc<HandlerFn>,
}

impl Handler {
    /// Wrap an async function or closure.
    ///
    /// ```ignore
    /// let hello = Handler::new(|_req| async { "hello" });
    /// ```
    pub fn new<F, Fut, R>(f: F) -> Self
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoResponse,
    {
        let f = Arc::new(f);
        Self {
            inner: Arc::new(move |req: Request| {
                let f = Arc::clone(&f);
                Box::pin(async move { f(req).await.into_response() }) as ResponseFuture
            }),
        }
    }

    /// Invoke the handler. The returned future owns everything it needs.
    pub fn invoke(&self, req: Request) -> ResponseFuture {
        (self.inner)(req)
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler").finish_non_exhaustive()
    }
}

impl Service<Request> for Handler {
    type Response = Response;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Response, Infallible>> + Send + 'static>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let fut = self.invoke(req);
        Box::pin(async move { Ok(fut.await) })
    }
}

/// A function transforming one handler into another.
#[derive(Clone)]
pub struct Middleware {
    inner: Arc<MiddlewareFn>,
}

impl Middleware {
    /// Build a middleware from a raw `Handler -> Handler` function.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(Handler) -> Handler + Send + Sync + 'static,
    {
        Self { inner: Arc::new(f) }
    }

    /// Build an "around" middleware: `f` receives the request and the next
    /// handler in the chain and decides whether and how to call it.
    pub fn from_fn<F, Fut, R>(f: F) -> Self
    where
        F: Fn(Request, Handler) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoResponse,
    {
        let f = Arc::new(f);
        Self::new(move |next| {
            let f = Arc::clone(&f);
            Handler::new(move |req| f(req, next.clone()))
        })
    }

    /// Adapt an infallible tower layer, e.g. one from `tower-http`.
    pub fn from_layer<L>(layer: L) -> Self
    where
        L: Layer<Handler> + Send + Sync + 'static,
        L::Service: Service<Request, Response = Response, Error = Infallible>
            + Clone
            + Send
            + Sync
            + 'static,
        <L::Service as Service<Request>>::Future: Send + 'static,
    {
        Self::new(move |next| {
            let service = layer.layer(next);
            Handler::new(move |req| {
                let service = service.clone();
                async move {
                    match service.oneshot(req).await {
                        Ok(res) => res,
                        Err(never) => match never {},
                    }
                }
            })
        })
    }

    /// Wrap `handler` with this middleware.
    pub fn wrap(&self, handler: Handler) -> Handler {
        (self.inner)(handler)
    }
}

impl fmt::Debug for Middleware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Middleware").finish_non_exhaustive()
    }
}

/// Compose `middlewares` around `handler`.
///
/// The first middleware ends up outermost: `chain(h, [m1, m2, m3])` behaves
/// as `m1(m2(m3(h)))`. `None` slots are skipped.
pub fn chain<I>(handler: Handler, middlewares: I) -> Handler
where
    I: IntoIterator<Item = Option<Middleware>>,
    I::IntoIter: DoubleEndedIterator,
{
    middlewares
        .into_iter()
        .rev()
        .flatten()
        .fold(handler, |inner, middleware| middleware.wrap(inner))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, StatusCode};
    use std::sync::Mutex;
    use tower_http::set_header::SetResponseHeaderLayer;

    type Log = Arc<Mutex<Vec<String>>>;

    fn logging(name: &'static str, log: Log) -> Middleware {
        Middleware::from_fn(move |req, next: Handler| {
            let log = log.clone();
            async move {
                log.lock().unwrap().push(format!("{name} before"));
                let res = next.invoke(req).await;
                log.lock().unwrap().push(format!("{name} after"));
                res
            }
        })
    }

    fn terminal(log: Log) -> Handler {
        Handler::new(move |_req| {
            let log = log.clone();
            async move {
                log.lock().unwrap().push("handler".to_string());
                "done"
            }
        })
    }

    fn empty_request() -> Request {
        axum::http::Request::builder().uri("/").body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_chain_onion_order() {
        let log: Log = Arc::default();
        let h = chain(
            terminal(log.clone()),
            [Some(logging("m1", log.clone())), Some(logging("m2", log.clone()))],
        );

        let res = h.invoke(empty_request()).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(
            *log.lock().unwrap(),
            vec!["m1 before", "m2 before", "handler", "m2 after", "m1 after"]
        );
    }

    #[tokio::test]
    async fn test_chain_skips_empty_slots() {
        let log: Log = Arc::default();
        let h = chain(
            terminal(log.clone()),
            [None, Some(logging("only", log.clone())), None],
        );

        h.invoke(empty_request()).await;
        assert_eq!(
            *log.lock().unwrap(),
            vec!["only before", "handler", "only after"]
        );
    }

    #[tokio::test]
    async fn test_chain_is_repeatable() {
        let log: Log = Arc::default();
        let mws = vec![Some(logging("m", log.clone()))];
        let a = chain(terminal(log.clone()), mws.clone());
        let b = chain(terminal(log.clone()), mws);

        a.invoke(empty_request()).await;
        let first: Vec<String> = log.lock().unwrap().drain(..).collect();
        b.invoke(empty_request()).await;
        let second: Vec<String> = log.lock().unwrap().drain(..).collect();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_handler_not_run_until_polled() {
        let log: Log = Arc::default();
        let fut = terminal(log.clone()).invoke(empty_request());
        assert!(log.lock().unwrap().is_empty());
        fut.await;
        assert_eq!(log.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_middleware_from_tower_layer() {
        let layer = SetResponseHeaderLayer::overriding(
            axum::http::header::SERVER,
            HeaderValue::from_static("route-dispatch"),
        );
        let h = chain(
            Handler::new(|_req| async { "ok" }),
            [Some(Middleware::from_layer(layer))],
        );

        let res = h.invoke(empty_request()).await;
        assert_eq!(res.headers()["server"], "route-dispatch");
    }

    #[tokio::test]
    async fn test_handler_as_service() {
        let h = Handler::new(|_req| async { StatusCode::ACCEPTED });
        let res = h.oneshot(empty_request()).await.unwrap();
        assert_eq!(res.status(), StatusCode::ACCEPTED);
    }
}

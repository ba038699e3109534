//! Request admission: method allow-lists and HTTP Basic authentication.

use std::collections::HashMap;
use std::sync::Arc;

use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::response::IntoResponse;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::routing::{Handler, Middleware, Request};

/// Answer `405 Method Not Allowed` unless the method is listed.
pub fn allowed_methods<I>(methods: I) -> Middleware
where
    I: IntoIterator<Item = Method>,
{
    let methods: Arc<[Method]> = methods.into_iter().collect();
    Middleware::from_fn(move |req: Request, next: Handler| {
        let allowed = methods.contains(req.method());
        async move {
            if allowed {
                next.invoke(req).await
            } else {
                StatusCode::METHOD_NOT_ALLOWED.into_response()
            }
        }
    })
}

/// HTTP Basic authentication against a fixed set of credentials.
pub fn basic_auth<I, U, P>(credentials: I, realm: impl Into<String>) -> Middleware
where
    I: IntoIterator<Item = (U, P)>,
    U: Into<String>,
    P: Into<String>,
{
    let credentials: HashMap<String, String> = credentials
        .into_iter()
        .map(|(u, p)| (u.into(), p.into()))
        .collect();
    basic_auth_with(
        move |user, pass| credentials.get(user).is_some_and(|p| p == pass),
        realm,
    )
}

/// HTTP Basic authentication with a custom verifier.
pub fn basic_auth_with<F>(verify: F, realm: impl Into<String>) -> Middleware
where
    F: Fn(&str, &str) -> bool + Send + Sync + 'static,
{
    let verify = Arc::new(verify);
    let challenge = HeaderValue::from_str(&format!("Basic realm={:?}", realm.into()))
        .unwrap_or_else(|_| HeaderValue::from_static("Basic"));
    Middleware::from_fn(move |req: Request, next: Handler| {
        let authorized = credentials(&req).is_some_and(|(user, pass)| verify(&user, &pass));
        let challenge = challenge.clone();
        async move {
            if authorized {
                return next.invoke(req).await;
            }
            tracing::debug!(path = %req.uri().path(), "Basic authentication failed");
            (
                StatusCode::UNAUTHORIZED,
                [(header::WWW_AUTHENTICATE, challenge)],
            )
                .into_response()
        }
    })
}

/// Decode `Authorization: Basic <base64(user:pass)>`.
fn credentials(req: &Request) -> Option<(String, String)> {
    let value = req.headers().get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, encoded) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (user, pass) = decoded.split_once(':')?;
    Some((user.to_string(), pass.to_string()))
}

//! Cross-origin resource sharing headers.

use std::sync::Arc;

use axum::http::header::{self, HeaderMap, HeaderName, HeaderValue};
use axum::http::{Method, StatusCode};
use axum::response::IntoResponse;
use serde::{Deserialize, Serialize};

use crate::routing::{Handler, Middleware, Request};

/// CORS policy. Empty lists omit the corresponding header.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsOptions {
    pub allow_origins: Vec<String>,
    pub allow_methods: Vec<String>,
    pub allow_headers: Vec<String>,
    pub expose_headers: Vec<String>,
    pub allow_credentials: bool,
}

impl Default for CorsOptions {
    fn default() -> Self {
        Self {
            allow_origins: vec!["*".to_string()],
            allow_methods: vec!["*".to_string()],
            allow_headers: vec!["*".to_string()],
            expose_headers: Vec::new(),
            allow_credentials: false,
        }
    }
}

impl CorsOptions {
    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        let lists = [
            (header::ACCESS_CONTROL_ALLOW_ORIGIN, &self.allow_origins),
            (header::ACCESS_CONTROL_ALLOW_METHODS, &self.allow_methods),
            (header::ACCESS_CONTROL_ALLOW_HEADERS, &self.allow_headers),
            (header::ACCESS_CONTROL_EXPOSE_HEADERS, &self.expose_headers),
        ];
        for (name, values) in lists {
            insert_joined(&mut headers, name, values);
        }
        if self.allow_credentials {
            headers.insert(
                header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
                HeaderValue::from_static("true"),
            );
        }
        headers
    }
}

fn insert_joined(headers: &mut HeaderMap, name: HeaderName, values: &[String]) {
    if values.is_empty() {
        return;
    }
    match HeaderValue::from_str(&values.join(",")) {
        Ok(value) => {
            headers.insert(name, value);
        }
        Err(e) => tracing::warn!(header = %name, error = %e, "Skipping invalid CORS header"),
    }
}

/// Add CORS headers to every response; answer `OPTIONS` with `204`
/// without calling the handler.
pub fn cors(options: CorsOptions) -> Middleware {
    let headers = Arc::new(options.headers());
    Middleware::from_fn(move |req: Request, next: Handler| {
        let headers = Arc::clone(&headers);
        async move {
            let mut res = if req.method() == Method::OPTIONS {
                StatusCode::NO_CONTENT.into_response()
            } else {
                next.invoke(req).await
            };
            for (name, value) in headers.iter() {
                res.headers_mut().insert(name.clone(), value.clone());
            }
            res
        }
    })
}

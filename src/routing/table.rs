//! Route storage and lookup.
//!
//! # Lookup Order
//! 1. Literal routes for the exact method, by path (hash lookup)
//! 2. Literal routes registered for any method, by path
//! 3. Every route in specificity order; first structural match whose method
//!    accepts the request wins
//!
//! # Design Decisions
//! - Specificity order: fewer segments first, then shorter pattern text,
//!   then registration order (stable insert)
//! - Only capture-free patterns enter the hash index; a concrete request path
//!   can never equal a pattern that still contains `:name` or `*name`
//! - Duplicate (method, pattern) pairs are rejected at insert time

use std::collections::{HashMap, HashSet};

use axum::http::Method;
use thiserror::Error;

use super::handler::{Handler, Middleware};
use super::params::PathParams;
use super::pattern::Pattern;

/// Registration failure.
#[derive(Debug, Error)]
pub enum RouteError {
    #[error("route \"{method} {pattern}\" is already registered")]
    Duplicate { method: String, pattern: String },

    #[error("route pattern \"{pattern}\" does not compile: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// One registered endpoint.
#[derive(Debug)]
pub struct Route {
    method: Option<Method>,
    pattern: Pattern,
    handler: Handler,
    middlewares: Vec<Middleware>,
}

impl Route {
    /// `None` means the route accepts any method.
    pub fn method(&self) -> Option<&Method> {
        self.method.as_ref()
    }

    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    pub fn handler(&self) -> &Handler {
        &self.handler
    }

    /// Route-local middleware, outermost first.
    pub fn middlewares(&self) -> &[Middleware] {
        &self.middlewares
    }

    pub fn accepts(&self, method: &Method) -> bool {
        self.method.as_ref().map_or(true, |m| m == method)
    }
}

/// A successful lookup.
#[derive(Debug)]
pub struct RouteMatch<'a> {
    pub route: &'a Route,
    /// Captured parameters; empty for literal routes.
    pub params: PathParams,
    pub(crate) index: usize,
}

#[derive(Debug, PartialEq, Eq, Hash)]
struct RouteKey {
    method: Option<Method>,
    pattern: String,
}

/// Owns every registered route.
#[derive(Debug, Default)]
pub struct RouteTable {
    routes: Vec<Route>,
    keys: HashSet<RouteKey>,
    literal: HashMap<Option<Method>, HashMap<String, usize>>,
    ordered: Vec<usize>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a route. `pattern` is normalized to start with `/`.
    pub fn insert(
        &mut self,
        method: Option<Method>,
        pattern: &str,
        handler: Handler,
        middlewares: Vec<Middleware>,
    ) -> Result<&Route, RouteError> {
        let pattern = normalize_path(pattern);
        let key = RouteKey {
            method: method.clone(),
            pattern: pattern.clone(),
        };
        if self.keys.contains(&key) {
            return Err(RouteError::Duplicate {
                method: method_label(method.as_ref()).to_string(),
                pattern,
            });
        }

        let compiled = Pattern::compile(&pattern).map_err(|source| RouteError::InvalidPattern {
            pattern: pattern.clone(),
            source,
        })?;

        let index = self.routes.len();
        if compiled.is_literal() {
            self.literal
                .entry(method.clone())
                .or_default()
                .insert(pattern.clone(), index);
        }
        let rank = sort_key(&compiled);
        let position = self
            .ordered
            .partition_point(|&i| sort_key(&self.routes[i].pattern) <= rank);
        self.ordered.insert(position, index);
        self.keys.insert(key);
        self.routes.push(Route {
            method,
            pattern: compiled,
            handler,
            middlewares,
        });

        Ok(&self.routes[index])
    }

    /// Resolve `method` and `path` to a route.
    pub fn lookup(&self, method: &Method, path: &str) -> Option<RouteMatch<'_>> {
        let literal_hit = self
            .literal_index(Some(method), path)
            .or_else(|| self.literal_index(None, path));
        if let Some(index) = literal_hit {
            return Some(RouteMatch {
                route: &self.routes[index],
                params: PathParams::default(),
                index,
            });
        }

        self.ordered.iter().find_map(|&index| {
            let route = &self.routes[index];
            if !route.accepts(method) {
                return None;
            }
            route.pattern.captures(path).map(|params| RouteMatch {
                route,
                params,
                index,
            })
        })
    }

    /// Routes in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Route> {
        self.routes.iter()
    }

    /// Routes in the order the fallback scan tries them.
    pub fn iter_ordered(&self) -> impl Iterator<Item = &Route> {
        self.ordered.iter().map(|&i| &self.routes[i])
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    fn literal_index(&self, method: Option<&Method>, path: &str) -> Option<usize> {
        self.literal
            .get(&method.cloned())
            .and_then(|paths| paths.get(path))
            .copied()
    }
}

fn sort_key(pattern: &Pattern) -> (usize, usize) {
    (pattern.segment_count(), pattern.as_str().len())
}

/// Label used in listings and errors; `ANY` for method-agnostic routes.
pub(crate) fn method_label(method: Option<&Method>) -> &str {
    method.map_or("ANY", Method::as_str)
}

/// `""` becomes `/`; a missing leading `/` is added.
pub(crate) fn normalize_path(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}

/// Trailing `/` removed, leading `/` added; empty stays empty.
pub(crate) fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim_end_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        normalize_path(trimmed)
    }
}

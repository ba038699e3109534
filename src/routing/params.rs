//! Path parameters extracted by the dispatcher.
//!
//! Parameters travel in the request's extensions under a private key type, so
//! nothing outside this module can overwrite them. Read them back through
//! [`PathParamsExt`]; a request without parameters reads as an empty map.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use axum::http::Request;
use thiserror::Error;

/// Immutable mapping from capture name to captured text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams(Arc<HashMap<String, String>>);

impl PathParams {
    pub fn new(params: HashMap<String, String>) -> Self {
        Self(Arc::new(params))
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Parse a parameter into any `FromStr` type.
    pub fn parse<T>(&self, name: &str) -> Result<T, ParamError>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        let value = self.get(name).ok_or_else(|| ParamError::Missing {
            name: name.to_string(),
        })?;
        value.parse().map_err(|e: T::Err| ParamError::Invalid {
            name: name.to_string(),
            value: value.to_string(),
            reason: e.to_string(),
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, String)> for PathParams {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Error reading a typed path parameter.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParamError {
    #[error("path parameter \"{name}\" is missing")]
    Missing { name: String },

    #[error("path parameter \"{name}\" = \"{value}\" is invalid: {reason}")]
    Invalid {
        name: String,
        value: String,
        reason: String,
    },
}

#[derive(Clone)]
struct ParamsSlot(PathParams);

/// Attach `params` to `req`. Only the dispatcher calls this.
pub(crate) fn attach<B>(req: &mut Request<B>, params: PathParams) {
    req.extensions_mut().insert(ParamsSlot(params));
}

/// Read access to the path parameters of a dispatched request.
pub trait PathParamsExt {
    /// All parameters; empty when the route declared no captures.
    fn path_params(&self) -> PathParams;

    /// A single parameter by name.
    fn path_param(&self, name: &str) -> Option<&str>;
}

impl<B> PathParamsExt for Request<B> {
    fn path_params(&self) -> PathParams {
        self.extensions()
            .get::<ParamsSlot>()
            .map(|slot| slot.0.clone())
            .unwrap_or_default()
    }

    fn path_param(&self, name: &str) -> Option<&str> {
        self.extensions().get::<ParamsSlot>()?.0.get(name)
    }
}

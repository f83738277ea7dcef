//! Error taxonomy for building, dispatching and formatting
//!
//! Build and format errors are returned from the call that caused them.
//! Dispatch outcomes (found / not allowed / not found) are not errors; only
//! internal faults surface as [`DispatchError`].

use std::collections::BTreeSet;

use thiserror::Error;

use crate::method::Method;

/// A method token outside the supported enumeration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid HTTP method '{0}'")]
pub struct InvalidMethod(pub String);

/// Errors raised while registering or compiling routes
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("invalid HTTP method '{method}' for path '{path}'")]
    InvalidMethod { path: String, method: String },

    #[error("route for path '{path}' must allow at least one HTTP method")]
    EmptyMethods { path: String },

    #[error("cannot have multiple routes with the same name '{name}'")]
    DuplicateRouteName { name: String },

    #[error("duplicate placeholder names in path '{path}': {}", .names.join(", "))]
    DuplicatePlaceholder { path: String, names: Vec<String> },

    #[error("invalid regular expression '{pattern}' in path '{path}': {reason}")]
    InvalidPattern {
        path: String,
        pattern: String,
        reason: String,
    },

    #[error("uneven number of [ and ] characters in path '{path}'")]
    UnbalancedBrackets { path: String },

    #[error("invalid handler for path '{path}': {reason}")]
    InvalidHandler { path: String, reason: String },

    #[error("route '{name}' duplicates route '{existing}' for {method} '{path}'")]
    DuplicateRoute {
        method: Method,
        path: String,
        name: String,
        existing: String,
    },
}

/// Internal faults detected while dispatching
///
/// These never describe a routine miss. They indicate a bad method token or
/// a route table that lets one request reach several routes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error(transparent)]
    InvalidMethod(#[from] InvalidMethod),

    #[error("{method} '{path}' matches more than one route: {}", .routes.join(", "))]
    AmbiguousMatch {
        method: Method,
        path: String,
        routes: Vec<String>,
    },
}

/// Outcome-as-error view used by [`crate::Dispatcher::route`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoutingError {
    #[error("the path '{path}' did not match any defined route")]
    NotFound { path: String },

    #[error("the method {method} is not allowed for '{path}', allowed: {}", join_methods(.allowed))]
    MethodNotAllowed {
        method: Method,
        path: String,
        allowed: BTreeSet<Method>,
    },

    #[error(transparent)]
    Fault(#[from] DispatchError),
}

/// Errors raised by reverse URL generation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("undefined route '{name}'")]
    UnknownRoute { name: String },

    #[error("missing parameters for route '{name}': {}", .missing.join(", "))]
    MissingParameters { name: String, missing: Vec<String> },

    #[error("unexpected parameters for route '{name}': {}", .unexpected.join(", "))]
    UnexpectedParameters {
        name: String,
        unexpected: Vec<String>,
    },
}

/// Errors raised while encoding, decoding or storing a route table
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("failed to encode route table: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("failed to decode route table: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("route table store failed: {0}")]
    Store(#[from] anyhow::Error),
}

fn join_methods(methods: &BTreeSet<Method>) -> String {
    methods
        .iter()
        .map(Method::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// HTTP request methods accepted by the router
///
/// Tokens are case-sensitive and limited to this fixed set. `PURGE` is
/// non-standard but accepted for cache-invalidation endpoints.
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::InvalidMethod;

/// A request method token
///
/// Ordering follows declaration order, so sets of methods (as returned in
/// `MethodNotAllowed`) iterate in the canonical order below.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Head,
    Post,
    Put,
    Delete,
    Connect,
    Options,
    Trace,
    Patch,
    Purge,
}

impl Method {
    /// All methods in canonical order
    pub const ALL: [Method; 10] = [
        Method::Get,
        Method::Head,
        Method::Post,
        Method::Put,
        Method::Delete,
        Method::Connect,
        Method::Options,
        Method::Trace,
        Method::Patch,
        Method::Purge,
    ];

    /// Returns the wire token for this method
    ///
    /// # Examples
    ///
    /// ```
    /// use pathway_router::Method;
    ///
    /// assert_eq!(Method::Patch.as_str(), "PATCH");
    /// ```
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Connect => "CONNECT",
            Method::Options => "OPTIONS",
            Method::Trace => "TRACE",
            Method::Patch => "PATCH",
            Method::Purge => "PURGE",
        }
    }
}

impl FromStr for Method {
    type Err = InvalidMethod;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        Method::ALL
            .iter()
            .copied()
            .find(|method| method.as_str() == token)
            .ok_or_else(|| InvalidMethod(token.to_string()))
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//! Request dispatch over a compiled route table
//!
//! Lookup order for one method: the static map first, then the trie for the
//! request's component count. A miss is followed by HEAD to GET fallback and
//! by probing the other methods to build the allowed set.

use std::collections::{BTreeSet, HashMap};

use tracing::trace;

use crate::compiler::{Node, NodeId, RouteRef, RouteTable};
use crate::error::{DispatchError, FormatError, RoutingError};
use crate::handler::Handler;
use crate::method::Method;
use crate::path::split_segments;
use crate::route::{format_route, ParsedPath, Segment};

/// Outcome of a dispatch
#[derive(Debug, Clone, PartialEq)]
pub enum MatchResult<'a> {
    Found(RouteMatch<'a>),
    /// The path exists under other methods, listed in canonical order
    MethodNotAllowed(BTreeSet<Method>),
    NotFound,
}

impl<'a> MatchResult<'a> {
    pub fn is_found(&self) -> bool {
        matches!(self, MatchResult::Found(_))
    }

    pub fn found(self) -> Option<RouteMatch<'a>> {
        match self {
            MatchResult::Found(found) => Some(found),
            _ => None,
        }
    }
}

/// A matched route with its extracted parameters
#[derive(Debug, Clone, PartialEq)]
pub struct RouteMatch<'a> {
    /// Method of the request, HEAD even when served by a GET route
    pub method: Method,
    pub handler: &'a Handler,
    /// Unencoded parameter values by placeholder name
    pub params: HashMap<String, String>,
    pub name: &'a str,
    path: String,
    variant: &'a ParsedPath,
}

impl<'a> RouteMatch<'a> {
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// Canonical unencoded path: `/` plus the request's components, with the
    /// matched pattern's trailing slash policy
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Canonical encoded URL built from the matched pattern and parameters
    pub fn url(&self) -> String {
        let values: Vec<&str> = self
            .variant
            .parameter_names()
            .iter()
            .map(|name| self.param(name).unwrap_or(""))
            .collect();
        self.variant.format().render(&values)
    }
}

/// Immutable request router
///
/// Safe to share between threads; dispatch only reads the table.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    table: RouteTable,
    names: HashMap<String, usize>,
}

type Captures<'p> = Vec<Vec<&'p str>>;

impl Dispatcher {
    pub fn new(table: RouteTable) -> Self {
        let names = table
            .routes
            .iter()
            .enumerate()
            .map(|(index, route)| (route.id.clone(), index))
            .collect();

        Self { table, names }
    }

    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    pub fn into_table(self) -> RouteTable {
        self.table
    }

    /// Dispatches a request
    ///
    /// # Examples
    ///
    /// ```
    /// use pathway_router::{Method, MatchResult, RouteCollector};
    ///
    /// let mut routes = RouteCollector::new();
    /// routes.post("/login", "auth.login", None).unwrap();
    /// let dispatcher = routes.compile().unwrap();
    ///
    /// match dispatcher.dispatch("GET", "/login").unwrap() {
    ///     MatchResult::MethodNotAllowed(allowed) => {
    ///         assert_eq!(allowed.into_iter().collect::<Vec<_>>(), vec![Method::Post]);
    ///     }
    ///     other => panic!("unexpected {:?}", other),
    /// }
    /// ```
    pub fn dispatch(&self, method: &str, path: &str) -> Result<MatchResult<'_>, DispatchError> {
        let method: Method = method.parse()?;
        let segments = split_segments(path);
        let mut captures = vec![Vec::new(); segments.len()];

        if let Some(found) = self.find(method, path, &segments, &mut captures)? {
            if let Some(matched) = self.build_match(method, found, &segments, &captures) {
                return Ok(MatchResult::Found(matched));
            }
        }

        self.dispatch_miss(method, path, &segments)
    }

    /// Dispatches a request, reporting misses as errors
    pub fn route(&self, method: &str, path: &str) -> Result<RouteMatch<'_>, RoutingError> {
        let parsed: Method = method.parse().map_err(DispatchError::from)?;

        match self.dispatch(method, path)? {
            MatchResult::Found(found) => Ok(found),
            MatchResult::MethodNotAllowed(allowed) => Err(RoutingError::MethodNotAllowed {
                method: parsed,
                path: path.to_string(),
                allowed,
            }),
            MatchResult::NotFound => Err(RoutingError::NotFound {
                path: path.to_string(),
            }),
        }
    }

    /// Formats the URL of a named route
    ///
    /// # Examples
    ///
    /// ```
    /// use pathway_router::RouteCollector;
    /// use std::collections::HashMap;
    ///
    /// let mut routes = RouteCollector::new();
    /// routes.get("/files/{name}", "files.show", Some("file")).unwrap();
    /// let dispatcher = routes.compile().unwrap();
    ///
    /// let params: HashMap<String, String> =
    ///     [("name".to_string(), "a b.txt".to_string())].into_iter().collect();
    /// assert_eq!(dispatcher.format_url("file", &params).unwrap(), "/files/a%20b.txt");
    /// ```
    pub fn format_url(&self, name: &str, params: &HashMap<String, String>) -> Result<String, FormatError> {
        let index = self
            .names
            .get(name)
            .ok_or_else(|| FormatError::UnknownRoute {
                name: name.to_string(),
            })?;

        format_route(name, &self.table.routes[*index].variants, params)
    }

    /// Formats the URL of a named route from borrowed pairs
    pub fn format_url_with(&self, name: &str, params: &[(&str, &str)]) -> Result<String, FormatError> {
        let params: HashMap<String, String> = params
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        self.format_url(name, &params)
    }

    fn dispatch_miss(&self, method: Method, path: &str, segments: &[&str]) -> Result<MatchResult<'_>, DispatchError> {
        let mut captures = vec![Vec::new(); segments.len()];

        if method == Method::Head {
            if let Some(found) = self.find(Method::Get, path, segments, &mut captures)? {
                if let Some(matched) = self.build_match(method, found, segments, &captures) {
                    trace!(path, "serving HEAD from GET route");
                    return Ok(MatchResult::Found(matched));
                }
            }
        }

        let mut allowed = BTreeSet::new();

        for candidate in Method::ALL {
            // GET already failed for a HEAD request
            if candidate == method || (method == Method::Head && candidate == Method::Get) {
                continue;
            }

            if self.find(candidate, path, segments, &mut captures)?.is_some() {
                allowed.insert(candidate);
                if candidate == Method::Get {
                    allowed.insert(Method::Head);
                }
            }
        }

        if allowed.is_empty() {
            Ok(MatchResult::NotFound)
        } else {
            Ok(MatchResult::MethodNotAllowed(allowed))
        }
    }

    /// Looks up one method, leaving captured values in `captures`
    fn find<'p>(
        &self,
        method: Method,
        path: &str,
        segments: &[&'p str],
        captures: &mut Captures<'p>,
    ) -> Result<Option<RouteRef>, DispatchError> {
        let Some(table) = self.table.methods.get(&method) else {
            return Ok(None);
        };

        if let Some(routes) = table.static_paths.get(&segments.join("/")) {
            return self.resolve(method, path, routes);
        }

        let Some(root) = table.roots.get(&segments.len()) else {
            return Ok(None);
        };

        match self.walk(*root, segments, captures) {
            Some(routes) => self.resolve(method, path, routes),
            None => Ok(None),
        }
    }

    fn resolve(&self, method: Method, path: &str, routes: &[RouteRef]) -> Result<Option<RouteRef>, DispatchError> {
        match routes {
            [] => Ok(None),
            [single] => Ok(self.table.route(*single).map(|_| *single)),
            many => Err(DispatchError::AmbiguousMatch {
                method,
                path: path.to_string(),
                routes: many
                    .iter()
                    .filter_map(|reference| self.table.routes.get(reference.route))
                    .map(|route| route.id.clone())
                    .collect(),
            }),
        }
    }

    /// Depth-first walk; literal branches first, then regex branches, then
    /// the placeholder fallback
    fn walk<'p>(&self, id: NodeId, segments: &[&'p str], captures: &mut Captures<'p>) -> Option<&[RouteRef]> {
        match self.table.node(id)? {
            Node::Result { routes } if routes.is_empty() => None,
            Node::Result { routes } => Some(routes.as_slice()),
            Node::Literal {
                depth,
                branches,
                default,
            } => {
                let component = *segments.get(*depth)?;
                if let Some(child) = branches.get(component) {
                    if let Some(found) = self.walk(*child, segments, captures) {
                        return Some(found);
                    }
                }
                default.and_then(|next| self.walk(next, segments, captures))
            }
            Node::Pattern {
                depth,
                matchers,
                default,
            } => {
                let component = *segments.get(*depth)?;
                if let Some((child, values)) = matchers.iter().find_map(|matcher| matcher.find(component)) {
                    if let Some(slot) = captures.get_mut(*depth) {
                        *slot = values;
                    }
                    if let Some(found) = self.walk(child, segments, captures) {
                        return Some(found);
                    }
                }
                default.and_then(|next| self.walk(next, segments, captures))
            }
        }
    }

    fn build_match(
        &self,
        method: Method,
        found: RouteRef,
        segments: &[&str],
        captures: &Captures<'_>,
    ) -> Option<RouteMatch<'_>> {
        let (route, variant) = self.table.route(found)?;

        let mut params = HashMap::new();

        for (depth, segment) in variant.segments().iter().enumerate() {
            match segment {
                Segment::Literal(_) => {}
                Segment::Placeholder(name) => {
                    if let Some(value) = segments.get(depth) {
                        params.insert(name.clone(), value.to_string());
                    }
                }
                Segment::Compound(compound) => {
                    let values = captures.get(depth).map(Vec::as_slice).unwrap_or_default();
                    for (name, value) in compound.names.iter().zip(values) {
                        params.insert(name.clone(), value.to_string());
                    }
                }
            }
        }

        Some(RouteMatch {
            method,
            handler: &route.handler,
            params,
            name: &route.id,
            path: variant.canonical_path(segments),
            variant,
        })
    }
}

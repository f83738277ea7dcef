//! Route registration
//!
//! [`RouteCollector`] validates every route as it is added, so mistakes in a
//! pattern surface at the call that introduced them. Compilation turns the
//! collected routes into an immutable [`Dispatcher`].

use std::collections::HashSet;

use serde::Serialize;
use tracing::{debug, warn};

use crate::cache::{self, TableStore};
use crate::compiler::Compiler;
use crate::config::RouterConfig;
use crate::dispatcher::Dispatcher;
use crate::error::BuildError;
use crate::handler::Handler;
use crate::method::Method;
use crate::path::expand_optional;
use crate::route::{parse_path, ParsedPath};

/// A validated route waiting to be compiled
#[derive(Debug, Clone, PartialEq)]
pub struct CollectedRoute {
    methods: Vec<Method>,
    path: String,
    handler: Handler,
    name: Option<String>,
    variants: Vec<ParsedPath>,
}

impl CollectedRoute {
    /// Allowed methods in canonical order, without duplicates
    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    /// The pattern as registered, including optional sections
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn handler(&self) -> &Handler {
        &self.handler
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Concrete patterns produced by expanding optional sections
    pub fn variants(&self) -> &[ParsedPath] {
        &self.variants
    }
}

/// Collects routes for compilation
///
/// # Examples
///
/// ```
/// use pathway_router::RouteCollector;
///
/// let mut routes = RouteCollector::new();
/// routes
///     .get("/users/{id:\\d+}", "users.show", Some("user"))?
///     .post("/users", "users.create", None)?;
///
/// let dispatcher = routes.compile()?;
/// let found = dispatcher.route("GET", "/users/42")?;
/// assert_eq!(found.param("id"), Some("42"));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct RouteCollector {
    routes: Vec<CollectedRoute>,
    names: HashSet<String>,
}

impl RouteCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a route
    ///
    /// Method tokens are validated against the supported set and
    /// deduplicated. The handler must serialize to plain data. Optional
    /// sections are expanded and every resulting pattern is parsed.
    pub fn add_route<M, H>(
        &mut self,
        methods: &[M],
        path: &str,
        handler: H,
        name: Option<&str>,
    ) -> Result<&mut Self, BuildError>
    where
        M: AsRef<str>,
        H: Serialize,
    {
        let mut parsed = Vec::with_capacity(methods.len());
        for token in methods {
            let method = token
                .as_ref()
                .parse::<Method>()
                .map_err(|e| BuildError::InvalidMethod {
                    path: path.to_string(),
                    method: e.0,
                })?;
            parsed.push(method);
        }

        parsed.sort();
        parsed.dedup();

        if parsed.is_empty() {
            return Err(BuildError::EmptyMethods {
                path: path.to_string(),
            });
        }

        if let Some(name) = name {
            if self.names.contains(name) {
                return Err(BuildError::DuplicateRouteName {
                    name: name.to_string(),
                });
            }
        }

        let handler = Handler::new(handler).map_err(|e| BuildError::InvalidHandler {
            path: path.to_string(),
            reason: e.to_string(),
        })?;

        let variants = expand_optional(path)?
            .iter()
            .map(|variant| parse_path(variant))
            .collect::<Result<Vec<_>, _>>()?;

        debug!(
            path,
            methods = ?parsed,
            variants = variants.len(),
            "registered route"
        );

        if let Some(name) = name {
            self.names.insert(name.to_string());
        }

        self.routes.push(CollectedRoute {
            methods: parsed,
            path: path.to_string(),
            handler,
            name: name.map(str::to_string),
            variants,
        });

        Ok(self)
    }

    pub fn get<H: Serialize>(&mut self, path: &str, handler: H, name: Option<&str>) -> Result<&mut Self, BuildError> {
        self.add_route(&[Method::Get.as_str()], path, handler, name)
    }

    pub fn head<H: Serialize>(&mut self, path: &str, handler: H, name: Option<&str>) -> Result<&mut Self, BuildError> {
        self.add_route(&[Method::Head.as_str()], path, handler, name)
    }

    pub fn post<H: Serialize>(&mut self, path: &str, handler: H, name: Option<&str>) -> Result<&mut Self, BuildError> {
        self.add_route(&[Method::Post.as_str()], path, handler, name)
    }

    pub fn put<H: Serialize>(&mut self, path: &str, handler: H, name: Option<&str>) -> Result<&mut Self, BuildError> {
        self.add_route(&[Method::Put.as_str()], path, handler, name)
    }

    pub fn patch<H: Serialize>(&mut self, path: &str, handler: H, name: Option<&str>) -> Result<&mut Self, BuildError> {
        self.add_route(&[Method::Patch.as_str()], path, handler, name)
    }

    pub fn delete<H: Serialize>(&mut self, path: &str, handler: H, name: Option<&str>) -> Result<&mut Self, BuildError> {
        self.add_route(&[Method::Delete.as_str()], path, handler, name)
    }

    pub fn options<H: Serialize>(&mut self, path: &str, handler: H, name: Option<&str>) -> Result<&mut Self, BuildError> {
        self.add_route(&[Method::Options.as_str()], path, handler, name)
    }

    /// Routes in registration order
    pub fn routes(&self) -> &[CollectedRoute] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Compiles with the default configuration
    pub fn compile(&self) -> Result<Dispatcher, BuildError> {
        self.compile_with(&RouterConfig::default())
    }

    pub fn compile_with(&self, config: &RouterConfig) -> Result<Dispatcher, BuildError> {
        let table = Compiler::new(config).compile(&self.routes)?;
        Ok(Dispatcher::new(table))
    }

    /// Compiles, reusing a stored table when the route set is unchanged
    ///
    /// Store and decode failures are logged and fall back to compiling; only
    /// build errors are returned.
    pub fn compile_cached(&self, config: &RouterConfig, store: &dyn TableStore) -> Result<Dispatcher, BuildError> {
        let key = match cache::fingerprint(self, config) {
            Ok(key) => key,
            Err(e) => {
                warn!(error = %e, "cannot fingerprint routes, compiling without cache");
                return self.compile_with(config);
            }
        };

        match store.load(&key) {
            Ok(Some(bytes)) => match cache::decode(&bytes) {
                Ok(table) => {
                    debug!(fingerprint = %key, store = store.name(), "loaded cached route table");
                    return Ok(Dispatcher::new(table));
                }
                Err(e) => warn!(fingerprint = %key, error = %e, "discarding unreadable cached route table"),
            },
            Ok(None) => debug!(fingerprint = %key, store = store.name(), "no cached route table"),
            Err(e) => warn!(fingerprint = %key, error = %e, "route table store failed to load"),
        }

        let dispatcher = self.compile_with(config)?;

        match cache::encode(dispatcher.table()) {
            Ok(bytes) => {
                if let Err(e) = store.save(&key, &bytes) {
                    warn!(fingerprint = %key, error = %e, "route table store failed to save");
                }
            }
            Err(e) => warn!(fingerprint = %key, error = %e, "cannot encode route table"),
        }

        Ok(dispatcher)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryStore;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_methods_are_canonical_and_deduplicated() {
        let mut collector = RouteCollector::new();
        collector
            .add_route(&["POST", "GET", "POST"], "/x", "h", None)
            .unwrap();
        assert_eq!(collector.routes()[0].methods(), &[Method::Get, Method::Post]);
    }

    #[test]
    fn test_invalid_method() {
        let mut collector = RouteCollector::new();
        assert_eq!(
            collector
                .add_route(&["GET", "NOT_A_HTTP_METHOD"], "/x", "h", None)
                .unwrap_err(),
            BuildError::InvalidMethod {
                path: "/x".to_string(),
                method: "NOT_A_HTTP_METHOD".to_string(),
            }
        );
        assert!(collector.is_empty());
    }

    #[test]
    fn test_empty_methods() {
        let mut collector = RouteCollector::new();
        let none: [&str; 0] = [];
        assert!(matches!(
            collector.add_route(&none, "/x", "h", None),
            Err(BuildError::EmptyMethods { .. })
        ));
    }

    #[test]
    fn test_duplicate_name_fails_immediately() {
        let mut collector = RouteCollector::new();
        collector.get("/a", "a", Some("same")).unwrap();
        assert_eq!(
            collector.get("/b", "b", Some("same")).unwrap_err(),
            BuildError::DuplicateRouteName {
                name: "same".to_string()
            }
        );
        assert_eq!(collector.len(), 1);
    }

    #[test]
    fn test_failed_route_does_not_reserve_name() {
        let mut collector = RouteCollector::new();
        assert!(collector.get("/{a}/{a}", "a", Some("pair")).is_err());
        assert!(collector.get("/{a}/{b}", "a", Some("pair")).is_ok());
    }

    #[test]
    fn test_invalid_handler() {
        #[derive(Serialize)]
        struct Controller {
            action: &'static str,
        }

        let mut collector = RouteCollector::new();
        assert!(matches!(
            collector.get("/x", Controller { action: "index" }, None),
            Err(BuildError::InvalidHandler { .. })
        ));
    }

    #[test]
    fn test_optional_sections_become_variants() {
        let mut collector = RouteCollector::new();
        collector.get("/archive[/{year}]", "archive", None).unwrap();
        assert_eq!(collector.routes()[0].variants().len(), 2);
        assert_eq!(collector.routes()[0].path(), "/archive[/{year}]");
    }

    #[test]
    fn test_compile_cached_reuses_stored_table() {
        let mut collector = RouteCollector::new();
        collector.get("/users/{id}", "users.show", Some("user")).unwrap();

        let store = MemoryStore::new();
        let config = RouterConfig::default();

        let first = collector.compile_cached(&config, &store).unwrap();
        assert_eq!(store.len(), 1);

        let second = collector.compile_cached(&config, &store).unwrap();
        assert_eq!(first.table(), second.table());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_compile_cached_ignores_corrupt_entry() {
        let mut collector = RouteCollector::new();
        collector.get("/", "home", None).unwrap();

        let store = MemoryStore::new();
        let config = RouterConfig::default();
        let key = cache::fingerprint(&collector, &config).unwrap();
        store.save(&key, b"{broken").unwrap();

        let dispatcher = collector.compile_cached(&config, &store).unwrap();
        assert!(dispatcher.route("GET", "/").is_ok());
        assert_ne!(store.load(&key).unwrap(), Some(b"{broken".to_vec()));
    }
}

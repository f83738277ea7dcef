//! # Pathway Router
//!
//! An HTTP request router that compiles a set of route patterns into a
//! prefix trie and resolves `(method, path)` pairs against it, with support for:
//! - Static routes (`/about`)
//! - Placeholders (`/users/{id}`)
//! - Constrained placeholders (`/users/{id:\d+}`)
//! - Compound segments (`/files/{name}.{ext:txt|md}`)
//! - Optional sections (`/archive[/{year}[/{month}]]`)
//! - Reverse URL generation for named routes
//!
//! ## Matching
//!
//! For each method, fully literal patterns live in a hash map; everything
//! else lives in one trie per component count. At every depth the walk
//! prefers, in order:
//! - a literal component equal to the request's
//! - the first regex branch (in registration order) that matches
//! - an unconstrained placeholder
//!
//! and backtracks to the next choice when the deeper walk finds nothing.
//! Sibling regex branches are folded into combined expressions that are
//! split automatically when they outgrow the engine's size limit.
//!
//! ## Path Handling
//!
//! Empty components are ignored on both sides: `/a//b/` requests the same
//! route as `/a/b`. Matched routes report a canonical path whose trailing
//! slash follows the pattern they matched.
//!
//! ## Example
//!
//! ```
//! use pathway_router::RouteCollector;
//!
//! let mut routes = RouteCollector::new();
//! routes.get("/", "home", Some("home")).unwrap();
//! routes.get("/users/{id:\\d+}", "users.show", Some("user")).unwrap();
//! routes.add_route(&["GET", "POST"], "/users/{id:\\d+}/edit", "users.edit", None).unwrap();
//!
//! let dispatcher = routes.compile().unwrap();
//!
//! let found = dispatcher.route("GET", "/users/123").unwrap();
//! assert_eq!(found.param("id"), Some("123"));
//! assert_eq!(found.handler.as_str(), Some("users.show"));
//!
//! let url = dispatcher.format_url_with("user", &[("id", "7")]).unwrap();
//! assert_eq!(url, "/users/7");
//! ```

// ============================================================================
// Module Declarations
// ============================================================================

pub mod cache;
pub mod collector;
pub mod compiler;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod handler;
pub mod method;
pub mod path;
pub mod route;

// Re-export public types
pub use cache::{FileStore, MemoryStore, TableStore};
pub use collector::{CollectedRoute, RouteCollector};
pub use compiler::{Compiler, RouteTable};
pub use config::{CacheConfig, RouterConfig};
pub use dispatcher::{Dispatcher, MatchResult, RouteMatch};
pub use error::{BuildError, CacheError, DispatchError, FormatError, InvalidMethod, RoutingError};
pub use handler::{Handler, NotPlainData};
pub use method::Method;

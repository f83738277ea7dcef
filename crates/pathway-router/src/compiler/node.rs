//! Compiled route table
//!
//! The table is plain data: every node lives in one arena and children are
//! referenced by index, so the whole structure can be encoded, decoded and
//! shared read-only between threads.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::combiner::CombinedPattern;
use crate::handler::Handler;
use crate::method::Method;
use crate::route::ParsedPath;

/// Index of a node in [`RouteTable::nodes`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub usize);

/// Reference to one concrete variant of a compiled route
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RouteRef {
    pub route: usize,
    pub variant: usize,
}

/// A trie node
///
/// Literal and pattern nodes examine the component at `depth`. When their own
/// branches produce no result the walk falls through to `default`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node {
    /// Exact-text branches for one component
    Literal {
        depth: usize,
        branches: BTreeMap<String, NodeId>,
        default: Option<NodeId>,
    },
    /// Regex branches for one component, tried in registration order
    Pattern {
        depth: usize,
        matchers: Vec<CombinedPattern>,
        default: Option<NodeId>,
    },
    /// Terminal node; more than one route here is an ambiguity
    Result { routes: Vec<RouteRef> },
}

/// Lookup structures for one method
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MethodTable {
    /// Fully literal patterns keyed by components joined with `/`
    pub static_paths: BTreeMap<String, Vec<RouteRef>>,
    /// Trie roots keyed by component count
    pub roots: BTreeMap<usize, NodeId>,
}

/// A registered route after identifier assignment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledRoute {
    pub id: String,
    pub path: String,
    pub methods: Vec<Method>,
    pub handler: Handler,
    pub variants: Vec<ParsedPath>,
}

/// Immutable output of compilation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteTable {
    pub routes: Vec<CompiledRoute>,
    pub methods: BTreeMap<Method, MethodTable>,
    pub nodes: Vec<Node>,
}

impl RouteTable {
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn route(&self, reference: RouteRef) -> Option<(&CompiledRoute, &ParsedPath)> {
        let route = self.routes.get(reference.route)?;
        let variant = route.variants.get(reference.variant)?;
        Some((route, variant))
    }

    /// Number of combined expressions held by pattern nodes
    pub fn combined_pattern_count(&self) -> usize {
        self.nodes
            .iter()
            .map(|node| match node {
                Node::Pattern { matchers, .. } => matchers.len(),
                _ => 0,
            })
            .sum()
    }
}

//! Route table compilation
//!
//! Compilation runs in two passes. Routes are first inserted into a draft
//! trie (one per method and component count) that merges shared prefixes.
//! The drafts are then emitted depth-first into the final node arena, at
//! which point sibling regex branches are folded into combined expressions.

pub mod combiner;
pub mod node;

use std::collections::{BTreeMap, HashSet};

use tracing::debug;

pub use combiner::{CombinedPattern, PatternCombiner};
pub use node::{CompiledRoute, MethodTable, Node, NodeId, RouteRef, RouteTable};

use crate::collector::CollectedRoute;
use crate::config::RouterConfig;
use crate::error::BuildError;
use crate::method::Method;
use crate::route::{CompoundSegment, Segment};

/// Compiles collected routes into a [`RouteTable`]
#[derive(Debug, Clone, Copy)]
pub struct Compiler {
    combiner: PatternCombiner,
}

impl Compiler {
    pub fn new(config: &RouterConfig) -> Self {
        Self {
            combiner: PatternCombiner::new(config.regex_size_limit),
        }
    }

    pub fn compile(&self, routes: &[CollectedRoute]) -> Result<RouteTable, BuildError> {
        let identifiers = assign_identifiers(routes)?;

        let compiled: Vec<CompiledRoute> = routes
            .iter()
            .zip(identifiers)
            .map(|(route, id)| CompiledRoute {
                id,
                path: route.path().to_string(),
                methods: route.methods().to_vec(),
                handler: route.handler().clone(),
                variants: route.variants().to_vec(),
            })
            .collect();

        let mut drafts = DraftTrie::default();
        let mut statics: BTreeMap<Method, BTreeMap<String, Vec<RouteRef>>> = BTreeMap::new();
        let mut roots: BTreeMap<Method, BTreeMap<usize, usize>> = BTreeMap::new();

        for (index, route) in compiled.iter().enumerate() {
            for method in dispatch_methods(&route.methods) {
                for (variant_index, variant) in route.variants.iter().enumerate() {
                    let target = RouteRef {
                        route: index,
                        variant: variant_index,
                    };

                    let slot = if variant.is_static() {
                        statics
                            .entry(method)
                            .or_default()
                            .entry(variant.static_key())
                            .or_default()
                    } else {
                        let root = *roots
                            .entry(method)
                            .or_default()
                            .entry(variant.segments().len())
                            .or_insert_with(|| drafts.add());
                        let leaf = drafts.insert(root, variant.segments(), &route.path);
                        &mut drafts.nodes[leaf].routes
                    };

                    if let Some(existing) = slot.first() {
                        return Err(BuildError::DuplicateRoute {
                            method,
                            path: route.path.clone(),
                            name: route.id.clone(),
                            existing: compiled[existing.route].id.clone(),
                        });
                    }

                    slot.push(target);
                }
            }
        }

        let mut emitter = Emitter {
            drafts: drafts.nodes,
            nodes: Vec::new(),
            combiner: self.combiner,
        };

        let mut methods: BTreeMap<Method, MethodTable> = BTreeMap::new();

        for (method, static_paths) in statics {
            methods.entry(method).or_default().static_paths = static_paths;
        }

        for (method, method_roots) in roots {
            for (count, root) in method_roots {
                let node = emitter.emit(root, 0)?;
                methods.entry(method).or_default().roots.insert(count, node);
            }
        }

        let table = RouteTable {
            routes: compiled,
            methods,
            nodes: emitter.nodes,
        };

        debug!(
            routes = table.routes.len(),
            nodes = table.nodes.len(),
            combined_patterns = table.combined_pattern_count(),
            "compiled route table"
        );

        Ok(table)
    }
}

/// Methods a route is inserted under
///
/// HEAD is left out when GET is also allowed since HEAD requests fall back
/// to GET at dispatch time.
fn dispatch_methods(methods: &[Method]) -> impl Iterator<Item = Method> + '_ {
    let has_get = methods.contains(&Method::Get);
    methods
        .iter()
        .copied()
        .filter(move |method| !(has_get && *method == Method::Head))
}

/// Assigns an identifier to every route
///
/// Declared names are kept. Unnamed routes receive `a`, `b`, ..., `z`, `aa`,
/// `ab`, ... in registration order, skipping any declared name.
pub fn assign_identifiers(routes: &[CollectedRoute]) -> Result<Vec<String>, BuildError> {
    let mut reserved = HashSet::new();
    for name in routes.iter().filter_map(CollectedRoute::name) {
        if !reserved.insert(name) {
            return Err(BuildError::DuplicateRouteName {
                name: name.to_string(),
            });
        }
    }

    let mut sequence = IdentifierSequence::default();

    Ok(routes
        .iter()
        .map(|route| match route.name() {
            Some(name) => name.to_string(),
            None => sequence.next_free(&reserved),
        })
        .collect())
}

/// Generator for `a`, `b`, ..., `z`, `aa`, ...
struct IdentifierSequence {
    next: String,
}

impl Default for IdentifierSequence {
    fn default() -> Self {
        Self {
            next: "a".to_string(),
        }
    }
}

impl IdentifierSequence {
    fn next_free(&mut self, reserved: &HashSet<&str>) -> String {
        loop {
            let candidate = std::mem::take(&mut self.next);
            self.next = increment(&candidate);
            if !reserved.contains(candidate.as_str()) {
                return candidate;
            }
        }
    }
}

fn increment(identifier: &str) -> String {
    let mut letters: Vec<u8> = identifier.bytes().collect();

    let carried = letters.iter_mut().rev().all(|letter| {
        if *letter == b'z' {
            *letter = b'a';
            true
        } else {
            *letter += 1;
            false
        }
    });

    if carried {
        letters.insert(0, b'a');
    }

    String::from_utf8_lossy(&letters).into_owned()
}

#[derive(Debug, Default)]
struct DraftNode {
    literals: BTreeMap<String, usize>,
    patterns: Vec<DraftPattern>,
    placeholder: Option<usize>,
    routes: Vec<RouteRef>,
}

#[derive(Debug)]
struct DraftPattern {
    body: String,
    segment: CompoundSegment,
    child: usize,
    path: String,
}

#[derive(Debug, Default)]
struct DraftTrie {
    nodes: Vec<DraftNode>,
}

impl DraftTrie {
    fn add(&mut self) -> usize {
        self.nodes.push(DraftNode::default());
        self.nodes.len() - 1
    }

    /// Walks or extends the trie along `segments`, returning the leaf
    fn insert(&mut self, root: usize, segments: &[Segment], path: &str) -> usize {
        let mut current = root;

        for segment in segments {
            current = match segment {
                Segment::Literal(text) => match self.nodes[current].literals.get(text) {
                    Some(&child) => child,
                    None => {
                        let child = self.add();
                        self.nodes[current].literals.insert(text.clone(), child);
                        child
                    }
                },
                Segment::Placeholder(_) => match self.nodes[current].placeholder {
                    Some(child) => child,
                    None => {
                        let child = self.add();
                        self.nodes[current].placeholder = Some(child);
                        child
                    }
                },
                Segment::Compound(compound) => {
                    let body = compound.body();
                    let existing = self.nodes[current]
                        .patterns
                        .iter()
                        .find(|pattern| pattern.body == body)
                        .map(|pattern| pattern.child);

                    match existing {
                        Some(child) => child,
                        None => {
                            let child = self.add();
                            self.nodes[current].patterns.push(DraftPattern {
                                body,
                                segment: compound.clone(),
                                child,
                                path: path.to_string(),
                            });
                            child
                        }
                    }
                }
            };
        }

        current
    }
}

/// Moves draft nodes into the final arena
struct Emitter {
    drafts: Vec<DraftNode>,
    nodes: Vec<Node>,
    combiner: PatternCombiner,
}

impl Emitter {
    fn push(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    fn emit(&mut self, draft: usize, depth: usize) -> Result<NodeId, BuildError> {
        let node = std::mem::take(&mut self.drafts[draft]);

        if !node.routes.is_empty() {
            return Ok(self.push(Node::Result { routes: node.routes }));
        }

        let placeholder = match node.placeholder {
            Some(child) => Some(self.emit(child, depth + 1)?),
            None => None,
        };

        let pattern = if node.patterns.is_empty() {
            placeholder
        } else {
            let mut children = Vec::with_capacity(node.patterns.len());
            for pattern in &node.patterns {
                children.push(self.emit(pattern.child, depth + 1)?);
            }

            let branches: Vec<(&CompoundSegment, NodeId)> = node
                .patterns
                .iter()
                .map(|pattern| &pattern.segment)
                .zip(children)
                .collect();

            let matchers = self.combiner.combine(&branches).map_err(|rejected| {
                BuildError::InvalidPattern {
                    path: node.patterns[rejected.index].path.clone(),
                    pattern: rejected.source,
                    reason: rejected.error.to_string(),
                }
            })?;

            Some(self.push(Node::Pattern {
                depth,
                matchers,
                default: placeholder,
            }))
        };

        if node.literals.is_empty() {
            return Ok(match pattern {
                Some(id) => id,
                None => self.push(Node::Result { routes: Vec::new() }),
            });
        }

        let mut branches = BTreeMap::new();
        for (text, child) in node.literals {
            branches.insert(text, self.emit(child, depth + 1)?);
        }

        Ok(self.push(Node::Literal {
            depth,
            branches,
            default: pattern,
        }))
    }
}

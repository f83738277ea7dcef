//! Combined regular expressions for sibling pattern branches
//!
//! All regex branches below one trie node are folded into as few expressions
//! as the engine accepts. Branch `k` is wrapped in a tag group `__t{k}` and its
//! captures are renamed `__b{k}_{i}`; after a match the first tag group that
//! participated identifies the winning branch. When appending a branch makes
//! the expression exceed the configured size limit, the expression is closed
//! and a new one starts with that branch.

use regex::{Captures, Regex, RegexBuilder};
use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::node::NodeId;
use crate::route::CompoundSegment;

/// Size limit used when recompiling expressions from an encoded table
///
/// Expressions in a table were accepted at compile time under the configured
/// limit, which is never larger than this.
pub const DECODE_SIZE_LIMIT: usize = 256 * (1 << 20);

/// A compiled expression that encodes as its source text
#[derive(Debug, Clone)]
pub struct CompiledRegex(Regex);

impl CompiledRegex {
    pub fn build(source: &str, size_limit: usize) -> Result<Self, regex::Error> {
        RegexBuilder::new(source)
            .size_limit(size_limit)
            .build()
            .map(CompiledRegex)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    fn group_index(&self, name: &str) -> Option<usize> {
        self.0
            .capture_names()
            .position(|group| group == Some(name))
    }
}

impl PartialEq for CompiledRegex {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Serialize for CompiledRegex {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for CompiledRegex {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let source = String::deserialize(deserializer)?;
        CompiledRegex::build(&source, DECODE_SIZE_LIMIT).map_err(de::Error::custom)
    }
}

/// One alternative of a combined expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Branch {
    /// Group index of the tag, absent for a single-branch expression
    pub tag: Option<usize>,
    /// Group indexes of the branch captures, in placeholder order
    pub captures: Vec<usize>,
    pub child: NodeId,
}

/// A compiled alternation over one or more sibling branches
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinedPattern {
    regex: CompiledRegex,
    branches: Vec<Branch>,
}

impl CombinedPattern {
    pub fn source(&self) -> &str {
        self.regex.as_str()
    }

    pub fn branches(&self) -> &[Branch] {
        &self.branches
    }

    /// Matches one component, returning the winning branch's child and its
    /// captured values
    pub fn find<'t>(&self, component: &'t str) -> Option<(NodeId, Vec<&'t str>)> {
        let captures = self.regex.0.captures(component)?;

        let branch = match self.branches.as_slice() {
            [single] => single,
            branches => branches
                .iter()
                .find(|branch| branch.tag.map_or(false, |tag| captures.get(tag).is_some()))?,
        };

        Some((branch.child, values(&captures, &branch.captures)))
    }
}

fn values<'t>(captures: &Captures<'t>, groups: &[usize]) -> Vec<&'t str> {
    groups
        .iter()
        .map(|group| captures.get(*group).map_or("", |m| m.as_str()))
        .collect()
}

/// A branch the engine refused even on its own
#[derive(Debug)]
pub struct Rejected {
    pub index: usize,
    pub source: String,
    pub error: regex::Error,
}

/// Folds sibling branches into combined expressions
#[derive(Debug, Clone, Copy)]
pub struct PatternCombiner {
    size_limit: usize,
}

impl PatternCombiner {
    pub fn new(size_limit: usize) -> Self {
        Self { size_limit }
    }

    /// Combines branches in order, splitting wherever the engine rejects a merge
    pub fn combine(&self, branches: &[(&CompoundSegment, NodeId)]) -> Result<Vec<CombinedPattern>, Rejected> {
        let mut expressions = Vec::new();
        let mut current: Option<CombinedPattern> = None;
        let mut start = 0;

        for end in 1..=branches.len() {
            match self.build(&branches[start..end]) {
                Ok(pattern) => current = Some(pattern),
                Err(error) => {
                    let Some(done) = current.take() else {
                        return Err(self.reject(branches, end - 1, error));
                    };

                    debug!(
                        branches = done.branches.len(),
                        size_limit = self.size_limit,
                        "combined pattern full, starting a new expression"
                    );

                    expressions.push(done);
                    start = end - 1;

                    let single = self
                        .build(&branches[start..end])
                        .map_err(|error| self.reject(branches, start, error))?;
                    current = Some(single);
                }
            }
        }

        if let Some(last) = current {
            expressions.push(last);
        }

        Ok(expressions)
    }

    fn reject(&self, branches: &[(&CompoundSegment, NodeId)], index: usize, error: regex::Error) -> Rejected {
        Rejected {
            index,
            source: branches[index].0.anchored(),
            error,
        }
    }

    fn build(&self, branches: &[(&CompoundSegment, NodeId)]) -> Result<CombinedPattern, regex::Error> {
        if let [(segment, child)] = branches {
            let regex = CompiledRegex::build(&segment.anchored(), self.size_limit)?;
            let captures = (0..segment.names.len())
                .filter_map(|i| regex.group_index(&format!("__p{}", i)))
                .collect();

            return Ok(CombinedPattern {
                regex,
                branches: vec![Branch {
                    tag: None,
                    captures,
                    child: *child,
                }],
            });
        }

        let alternatives: Vec<String> = branches
            .iter()
            .enumerate()
            .map(|(k, (segment, _))| {
                format!(
                    "(?P<__t{}>{})",
                    k,
                    segment.render(|i| format!("__b{}_{}", k, i))
                )
            })
            .collect();

        let regex = CompiledRegex::build(&format!("^(?:{})$", alternatives.join("|")), self.size_limit)?;

        let tagged = branches
            .iter()
            .enumerate()
            .map(|(k, (segment, child))| Branch {
                tag: regex.group_index(&format!("__t{}", k)),
                captures: (0..segment.names.len())
                    .filter_map(|i| regex.group_index(&format!("__b{}_{}", k, i)))
                    .collect(),
                child: *child,
            })
            .collect();

        Ok(CombinedPattern {
            regex,
            branches: tagged,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::{classify_segment, Segment};
    use pretty_assertions::assert_eq;

    fn compound(text: &str) -> CompoundSegment {
        match classify_segment(text) {
            Segment::Compound(compound) => compound,
            other => panic!("expected compound segment, got {:?}", other),
        }
    }

    #[test]
    fn test_single_branch_has_no_tag() {
        let segment = compound("{id:\\d+}");
        let combined = PatternCombiner::new(1 << 20)
            .combine(&[(&segment, NodeId(3))])
            .unwrap();

        assert_eq!(combined.len(), 1);
        assert_eq!(combined[0].source(), "^(?:(?P<__p0>\\d+))$");
        assert_eq!(combined[0].find("42"), Some((NodeId(3), vec!["42"])));
        assert_eq!(combined[0].find("x"), None);
    }

    #[test]
    fn test_first_matching_branch_wins() {
        let digits = compound("{id:\\d+}");
        let hex = compound("{id:[\\da-f]+}");
        let combined = PatternCombiner::new(1 << 20)
            .combine(&[(&digits, NodeId(1)), (&hex, NodeId(2))])
            .unwrap();

        assert_eq!(combined.len(), 1);
        assert_eq!(combined[0].find("123"), Some((NodeId(1), vec!["123"])));
        assert_eq!(combined[0].find("12a"), Some((NodeId(2), vec!["12a"])));
        assert_eq!(combined[0].find("xyz"), None);
    }

    #[test]
    fn test_captures_per_branch() {
        let file = compound("{name}.{ext:txt|md}");
        let version = compound("v{major:\\d+}");
        let combined = PatternCombiner::new(1 << 20)
            .combine(&[(&file, NodeId(1)), (&version, NodeId(2))])
            .unwrap();

        assert_eq!(combined[0].find("notes.md"), Some((NodeId(1), vec!["notes", "md"])));
        assert_eq!(combined[0].find("v12"), Some((NodeId(2), vec!["12"])));
    }

    #[test]
    fn test_small_limit_splits_expressions() {
        let segments: Vec<CompoundSegment> = (0..80)
            .map(|i| compound(&format!("k{}-{{id:[0-9]+}}", i)))
            .collect();
        let branches: Vec<(&CompoundSegment, NodeId)> = segments
            .iter()
            .enumerate()
            .map(|(i, segment)| (segment, NodeId(i)))
            .collect();

        let combined = PatternCombiner::new(8 * 1024).combine(&branches).unwrap();

        assert!(combined.len() > 1);
        assert_eq!(
            combined.iter().map(|c| c.branches().len()).sum::<usize>(),
            80
        );
        for (i, _) in segments.iter().enumerate() {
            let component = format!("k{}-7", i);
            let found = combined.iter().find_map(|c| c.find(&component));
            assert_eq!(found, Some((NodeId(i), vec!["7"])));
        }
    }

    #[test]
    fn test_encodes_as_source() {
        let segment = compound("{id:\\d+}");
        let combined = PatternCombiner::new(1 << 20)
            .combine(&[(&segment, NodeId(0))])
            .unwrap();

        let encoded = serde_json::to_string(&combined[0]).unwrap();
        let decoded: CombinedPattern = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, combined[0]);
        assert_eq!(decoded.find("9"), Some((NodeId(0), vec!["9"])));
    }
}

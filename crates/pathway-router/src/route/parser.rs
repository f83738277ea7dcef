/// Route pattern parsing
///
/// Pure functional parser that turns one concrete pattern (no optional
/// sections) into typed segments, the ordered placeholder names, the slash
/// policy and a reverse URL template.

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::format::FormatTemplate;
use super::pattern::{classify_segment, PatternPart, Segment};
use crate::error::BuildError;
use crate::path::{join_segments, split_segments};

/// Internal state accumulator for fold-based parsing
///
/// All mutations are local to the fold accumulator. Each builder method
/// returns the modified Self, enabling chaining.
#[derive(Default)]
struct ParseState {
    segments: Vec<Segment>,
    names: Vec<String>,
    duplicates: Vec<String>,
    format: FormatTemplate,
}

impl ParseState {
    fn with_name(mut self, name: &str) -> Self {
        if self.names.iter().any(|existing| existing == name) {
            if !self.duplicates.iter().any(|dup| dup == name) {
                self.duplicates.push(name.to_string());
            }
        } else {
            self.names.push(name.to_string());
        }
        self
    }

    fn with_segment(mut self, segment: Segment) -> Self {
        self.format.push_raw("/");

        let mut state = match &segment {
            Segment::Literal(text) => {
                self.format.push_literal(text);
                self
            }
            Segment::Placeholder(name) => {
                self.format.push_param(self.names.len());
                self.with_name(name)
            }
            Segment::Compound(compound) => {
                let mut names = compound.names.iter();
                let mut state = self;
                for part in &compound.parts {
                    match part {
                        PatternPart::Literal(text) => state.format.push_literal(text),
                        PatternPart::Capture(_) => {
                            state.format.push_param(state.names.len());
                            if let Some(name) = names.next() {
                                state = state.with_name(name);
                            }
                        }
                    }
                }
                state
            }
        };

        state.segments.push(segment);
        state
    }
}

/// A parsed concrete route pattern
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedPath {
    segments: Vec<Segment>,
    names: Vec<String>,
    trailing_slash: bool,
    format: FormatTemplate,
}

impl ParsedPath {
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Placeholder names in order of appearance
    pub fn parameter_names(&self) -> &[String] {
        &self.names
    }

    /// True when the canonical form ends with `/`
    pub fn has_trailing_slash(&self) -> bool {
        self.trailing_slash
    }

    pub fn format(&self) -> &FormatTemplate {
        &self.format
    }

    /// True when every segment is literal text
    pub fn is_static(&self) -> bool {
        self.segments.iter().all(Segment::is_literal)
    }

    /// Key used by the static route map: literal components joined by `/`
    pub fn static_key(&self) -> String {
        self.segments
            .iter()
            .filter_map(|segment| match segment {
                Segment::Literal(text) => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Canonical unencoded path for the given request components
    pub fn canonical_path(&self, components: &[&str]) -> String {
        join_segments(components, self.trailing_slash)
    }
}

/// Parses a concrete pattern
///
/// # Examples
///
/// ```
/// use pathway_router::route::parser::parse_path;
///
/// let parsed = parse_path("/users/{id:\\d+}/").unwrap();
/// assert_eq!(parsed.parameter_names(), &["id".to_string()]);
/// assert!(parsed.has_trailing_slash());
/// assert!(!parsed.is_static());
/// ```
pub fn parse_path(path: &str) -> Result<ParsedPath, BuildError> {
    let components = split_segments(path);
    let trailing_slash = !components.is_empty() && path.ends_with('/');

    let mut state = components
        .iter()
        .map(|component| classify_segment(component))
        .try_fold(ParseState::default(), |state, segment| {
            validate_segment(path, &segment)?;
            Ok::<_, BuildError>(state.with_segment(segment))
        })?;

    if !state.duplicates.is_empty() {
        return Err(BuildError::DuplicatePlaceholder {
            path: path.to_string(),
            names: state.duplicates,
        });
    }

    if state.segments.is_empty() || trailing_slash {
        state.format.push_raw("/");
    }

    Ok(ParsedPath {
        segments: state.segments,
        names: state.names,
        trailing_slash,
        format: state.format,
    })
}

/// Checks that every explicit pattern, and the segment as a whole, compiles
fn validate_segment(path: &str, segment: &Segment) -> Result<(), BuildError> {
    let Segment::Compound(compound) = segment else {
        return Ok(());
    };

    for part in &compound.parts {
        if let PatternPart::Capture(pattern) = part {
            Regex::new(pattern).map_err(|e| invalid_pattern(path, pattern, e))?;
        }
    }

    let anchored = compound.anchored();
    Regex::new(&anchored).map_err(|e| invalid_pattern(path, &anchored, e))?;

    Ok(())
}

fn invalid_pattern(path: &str, pattern: &str, error: regex::Error) -> BuildError {
    BuildError::InvalidPattern {
        path: path.to_string(),
        pattern: pattern.to_string(),
        reason: error.to_string(),
    }
}

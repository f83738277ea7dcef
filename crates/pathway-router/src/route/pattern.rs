/// Placeholder scanning and segment classification
///
/// Pure functions that turn one path component of a route pattern into a typed
/// segment: a literal, a whole-component placeholder, or a compound segment
/// that needs a regular expression to match.

use serde::{Deserialize, Serialize};

/// Pattern used by a placeholder without an explicit constraint
pub const DEFAULT_PATTERN: &str = ".+";

/// A `{name}` or `{name:pattern}` token found inside a path component
///
/// Offsets are byte offsets into the scanned text; `start` points at the
/// opening brace and `len` covers the whole token including both braces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaceholderToken<'a> {
    pub name: &'a str,
    pub pattern: Option<&'a str>,
    pub start: usize,
    pub len: usize,
}

impl<'a> PlaceholderToken<'a> {
    /// Byte offset just past the closing brace
    pub fn end(&self) -> usize {
        self.start + self.len
    }

    /// Returns the pattern the placeholder matches
    pub fn effective_pattern(&self) -> &'a str {
        self.pattern.unwrap_or(DEFAULT_PATTERN)
    }

    /// True when the placeholder matches any single path component
    pub fn is_unconstrained(&self) -> bool {
        self.effective_pattern() == DEFAULT_PATTERN
    }
}

/// Scans a placeholder token starting at byte offset `start`
///
/// Names are one or more ASCII letters, digits or underscores. Explicit
/// patterns may contain balanced nested braces (`{id:\d{2,3}}`) and must not
/// be empty. Returns `None` when the text at `start` is not a valid token.
///
/// # Examples
///
/// ```
/// use pathway_router::route::pattern::scan_placeholder;
///
/// let token = scan_placeholder("{id:\\d{2,3}}/rest", 0).unwrap();
/// assert_eq!(token.name, "id");
/// assert_eq!(token.pattern, Some("\\d{2,3}"));
/// assert_eq!(token.end(), 12);
///
/// assert!(scan_placeholder("{}", 0).is_none());
/// assert!(scan_placeholder("{id:}", 0).is_none());
/// ```
pub fn scan_placeholder(text: &str, start: usize) -> Option<PlaceholderToken<'_>> {
    let bytes = text.as_bytes();
    if bytes.get(start) != Some(&b'{') {
        return None;
    }

    let name_start = start + 1;
    let name_end = bytes[name_start..]
        .iter()
        .position(|b| !(b.is_ascii_alphanumeric() || *b == b'_'))
        .map_or(bytes.len(), |offset| name_start + offset);

    if name_end == name_start {
        return None;
    }

    let name = &text[name_start..name_end];

    match bytes.get(name_end) {
        Some(b'}') => Some(PlaceholderToken {
            name,
            pattern: None,
            start,
            len: name_end + 1 - start,
        }),
        Some(b':') => {
            let pattern_start = name_end + 1;
            let mut depth = 0usize;

            for (offset, byte) in bytes[pattern_start..].iter().enumerate() {
                match byte {
                    b'{' => depth += 1,
                    b'}' if depth == 0 => {
                        let pattern_end = pattern_start + offset;
                        if pattern_end == pattern_start {
                            return None;
                        }
                        return Some(PlaceholderToken {
                            name,
                            pattern: Some(&text[pattern_start..pattern_end]),
                            start,
                            len: pattern_end + 1 - start,
                        });
                    }
                    b'}' => depth -= 1,
                    _ => {}
                }
            }

            None
        }
        _ => None,
    }
}

/// Finds every placeholder token in a path component, left to right
///
/// Braces that do not start a valid token are treated as literal text.
pub fn find_placeholders(segment: &str) -> Vec<PlaceholderToken<'_>> {
    let mut tokens = Vec::new();
    let mut index = 0;

    while let Some(offset) = segment[index..].find('{') {
        let start = index + offset;
        match scan_placeholder(segment, start) {
            Some(token) => {
                index = token.end();
                tokens.push(token);
            }
            None => index = start + 1,
        }
    }

    tokens
}

/// One piece of a compound segment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum PatternPart {
    /// Text matched verbatim
    Literal(String),
    /// A capture constrained by the given regular expression body
    Capture(String),
}

/// A path component mixing literal text and placeholders, or holding a
/// constrained placeholder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompoundSegment {
    pub names: Vec<String>,
    pub parts: Vec<PatternPart>,
}

impl CompoundSegment {
    /// Renders the unanchored regex body, naming capture `i` with `group(i)`
    ///
    /// Literal text is escaped; capture bodies are inserted unchanged.
    pub fn render<F>(&self, mut group: F) -> String
    where
        F: FnMut(usize) -> String,
    {
        let mut body = String::new();
        let mut capture = 0;

        for part in &self.parts {
            match part {
                PatternPart::Literal(text) => body.push_str(&regex::escape(text)),
                PatternPart::Capture(pattern) => {
                    body.push_str("(?P<");
                    body.push_str(&group(capture));
                    body.push('>');
                    body.push_str(pattern);
                    body.push(')');
                    capture += 1;
                }
            }
        }

        body
    }

    /// Regex body with positional group names
    ///
    /// Two segments with the same body match the same components and can
    /// share a trie branch even when their placeholder names differ.
    pub fn body(&self) -> String {
        self.render(|i| format!("__p{}", i))
    }

    /// Fully anchored expression matching exactly one component
    pub fn anchored(&self) -> String {
        format!("^(?:{})$", self.body())
    }
}

/// Typed classification of one path component
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Segment {
    /// Plain text, matched by string equality
    Literal(String),
    /// An unconstrained placeholder spanning the whole component
    Placeholder(String),
    /// Anything else: matched with a regular expression
    Compound(CompoundSegment),
}

impl Segment {
    /// Placeholder names declared by this segment, in order
    pub fn names(&self) -> Vec<&str> {
        match self {
            Segment::Literal(_) => Vec::new(),
            Segment::Placeholder(name) => vec![name.as_str()],
            Segment::Compound(compound) => compound.names.iter().map(String::as_str).collect(),
        }
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, Segment::Literal(_))
    }
}

/// Classifies a non-empty path component
///
/// # Examples
///
/// ```
/// use pathway_router::route::pattern::{classify_segment, Segment};
///
/// assert_eq!(classify_segment("about"), Segment::Literal("about".to_string()));
/// assert_eq!(classify_segment("{id}"), Segment::Placeholder("id".to_string()));
/// assert!(matches!(classify_segment("{id:\\d+}"), Segment::Compound(_)));
/// assert!(matches!(classify_segment("post-{slug}"), Segment::Compound(_)));
/// ```
pub fn classify_segment(segment: &str) -> Segment {
    let tokens = find_placeholders(segment);

    match tokens.as_slice() {
        [] => Segment::Literal(segment.to_string()),
        [token] if token.start == 0 && token.len == segment.len() && token.is_unconstrained() => {
            Segment::Placeholder(token.name.to_string())
        }
        _ => Segment::Compound(compound_from_tokens(segment, &tokens)),
    }
}

fn compound_from_tokens(segment: &str, tokens: &[PlaceholderToken<'_>]) -> CompoundSegment {
    let mut parts = Vec::new();
    let mut names = Vec::new();
    let mut cursor = 0;

    for token in tokens {
        if token.start > cursor {
            parts.push(PatternPart::Literal(segment[cursor..token.start].to_string()));
        }
        parts.push(PatternPart::Capture(token.effective_pattern().to_string()));
        names.push(token.name.to_string());
        cursor = token.end();
    }

    if cursor < segment.len() {
        parts.push(PatternPart::Literal(segment[cursor..].to_string()));
    }

    CompoundSegment { names, parts }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_classify_static() {
        assert_eq!(classify_segment("about"), Segment::Literal("about".to_string()));
    }

    #[test]
    fn test_classify_placeholder() {
        assert_eq!(classify_segment("{id}"), Segment::Placeholder("id".to_string()));
    }

    #[test]
    fn test_classify_explicit_default_pattern_is_placeholder() {
        assert_eq!(classify_segment("{id:.+}"), Segment::Placeholder("id".to_string()));
    }

    #[test]
    fn test_classify_constrained() {
        assert_eq!(
            classify_segment("{id:\\d+}"),
            Segment::Compound(CompoundSegment {
                names: vec!["id".to_string()],
                parts: vec![PatternPart::Capture("\\d+".to_string())],
            })
        );
    }

    #[test]
    fn test_classify_mixed() {
        let segment = classify_segment("{name}.{ext:txt|md}");
        let Segment::Compound(compound) = segment else {
            panic!("expected compound segment");
        };
        assert_eq!(compound.names, vec!["name", "ext"]);
        assert_eq!(
            compound.parts,
            vec![
                PatternPart::Capture(".+".to_string()),
                PatternPart::Literal(".".to_string()),
                PatternPart::Capture("txt|md".to_string()),
            ]
        );
        assert_eq!(compound.body(), "(?P<__p0>.+)\\.(?P<__p1>txt|md)");
    }

    #[test]
    fn test_invalid_braces_are_literal() {
        assert_eq!(classify_segment("{}"), Segment::Literal("{}".to_string()));
        assert_eq!(classify_segment("a{b-c}"), Segment::Literal("a{b-c}".to_string()));
    }

    #[test]
    fn test_nested_braces_in_pattern() {
        let tokens = find_placeholders("x{year:\\d{4}}-{month:\\d{1,2}}");
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].pattern, Some("\\d{4}"));
        assert_eq!(tokens[1].name, "month");
        assert_eq!(tokens[1].pattern, Some("\\d{1,2}"));
    }

    #[test]
    fn test_unterminated_token() {
        assert!(scan_placeholder("{id:\\d{2}", 0).is_none());
        assert!(scan_placeholder("{id", 0).is_none());
    }

    #[test]
    fn test_anchored_expression() {
        let Segment::Compound(compound) = classify_segment("v{major:\\d+}") else {
            panic!("expected compound segment");
        };
        assert_eq!(compound.anchored(), "^(?:v(?P<__p0>\\d+))$");
    }
}

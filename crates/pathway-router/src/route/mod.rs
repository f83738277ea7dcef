/// Route pattern module
///
/// Contains pure functional components for turning route patterns into typed
/// segments and reverse URL templates:
/// - `pattern`: placeholder scanning and segment classification
/// - `parser`: whole-pattern parsing and validation
/// - `format`: reverse URL templates

pub mod format;
pub mod parser;
pub mod pattern;

// Re-export commonly used types
pub use format::{format_route, FormatTemplate};
pub use parser::{parse_path, ParsedPath};
pub use pattern::{classify_segment, CompoundSegment, PatternPart, Segment};

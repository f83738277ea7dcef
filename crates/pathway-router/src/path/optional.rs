//! Optional path sections
//!
//! A pattern such as `/archive[/{year}[/{month}]]` describes several concrete
//! patterns, one per include/omit choice of every bracketed section. Brackets
//! inside placeholder tokens (`{id:[a-f]+}`) are part of the token and never
//! open a section.

use std::collections::HashSet;

use crate::error::BuildError;
use crate::path::normalize;
use crate::route::pattern::scan_placeholder;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    Open,
    Close,
    End,
}

/// Splits the pattern into literal runs separated by section brackets
struct Tokenizer<'a> {
    path: &'a str,
    position: usize,
}

impl<'a> Tokenizer<'a> {
    fn new(path: &'a str) -> Self {
        Self { path, position: 0 }
    }

    /// Returns the text up to the next bracket and the bracket itself
    fn next_token(&mut self) -> (&'a str, Token) {
        let start = self.position;
        let bytes = self.path.as_bytes();
        let mut index = start;

        while index < bytes.len() {
            match bytes[index] {
                b'{' => match scan_placeholder(self.path, index) {
                    Some(token) => index = token.end(),
                    None => index += 1,
                },
                b'[' => {
                    self.position = index + 1;
                    return (&self.path[start..index], Token::Open);
                }
                b']' => {
                    self.position = index + 1;
                    return (&self.path[start..index], Token::Close);
                }
                _ => index += 1,
            }
        }

        self.position = bytes.len();
        (&self.path[start..], Token::End)
    }
}

/// Expands every optional section of `path` into concrete patterns
///
/// Expansions are ordered with omitted sections first and deduplicated by
/// their non-empty components, keeping the first spelling seen.
///
/// # Examples
///
/// ```
/// use pathway_router::path::expand_optional;
///
/// let paths = expand_optional("/a[/b]/c").unwrap();
/// assert_eq!(paths, vec!["/a/c", "/a/b/c"]);
///
/// let paths = expand_optional("/users/{id:[0-9]+}").unwrap();
/// assert_eq!(paths, vec!["/users/{id:[0-9]+}"]);
/// ```
pub fn expand_optional(path: &str) -> Result<Vec<String>, BuildError> {
    if !path.contains('[') && !path.contains(']') {
        return Ok(vec![path.to_string()]);
    }

    let mut tokenizer = Tokenizer::new(path);
    let forks = parse_forks(&mut tokenizer, true, path)?;

    Ok(deduplicate(forks))
}

fn parse_forks(tokenizer: &mut Tokenizer<'_>, top: bool, path: &str) -> Result<Vec<String>, BuildError> {
    let mut paths = vec![String::new()];

    loop {
        let (text, token) = tokenizer.next_token();

        if !text.is_empty() {
            for existing in &mut paths {
                existing.push_str(text);
            }
        }

        match token {
            Token::Open => {
                let sections: Vec<String> = parse_forks(tokenizer, false, path)?
                    .into_iter()
                    .filter(|section| !section.is_empty())
                    .collect();

                let included: Vec<String> = paths
                    .iter()
                    .flat_map(|old| sections.iter().map(move |new| format!("{}{}", old, new)))
                    .collect();

                paths.extend(included);
            }
            Token::Close if top => return Err(unbalanced(path)),
            Token::Close => return Ok(paths),
            Token::End if top => return Ok(paths),
            Token::End => return Err(unbalanced(path)),
        }
    }
}

fn deduplicate(paths: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();

    paths
        .into_iter()
        .filter(|path| seen.insert(normalize(path)))
        .collect()
}

fn unbalanced(path: &str) -> BuildError {
    BuildError::UnbalancedBrackets {
        path: path.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_no_brackets_is_identity() {
        assert_eq!(expand_optional("/path/{id}/").unwrap(), vec!["/path/{id}/"]);
    }

    #[test]
    fn test_single_section() {
        assert_eq!(expand_optional("/a[/b]/c").unwrap(), vec!["/a/c", "/a/b/c"]);
    }

    #[test]
    fn test_nested_sections() {
        assert_eq!(
            expand_optional("/archive[/{year}[/{month}]]").unwrap(),
            vec!["/archive", "/archive/{year}", "/archive/{year}/{month}"]
        );
    }

    #[test]
    fn test_sibling_sections() {
        assert_eq!(
            expand_optional("/a[/b][/c]").unwrap(),
            vec!["/a", "/a/b", "/a/c", "/a/b/c"]
        );
    }

    #[test]
    fn test_duplicates_collapse_to_first_form() {
        // "/a/" and "/a//" normalize to the same components
        assert_eq!(expand_optional("/a/[/]").unwrap(), vec!["/a/"]);
    }

    #[test]
    fn test_empty_section_is_ignored() {
        assert_eq!(expand_optional("/a[]").unwrap(), vec!["/a"]);
    }

    #[test]
    fn test_brackets_inside_placeholder_are_not_sections() {
        assert_eq!(
            expand_optional("/path/{id:[a-f]+}[/edit]").unwrap(),
            vec!["/path/{id:[a-f]+}", "/path/{id:[a-f]+}/edit"]
        );
    }

    #[test]
    fn test_unbalanced_open() {
        assert_eq!(
            expand_optional("/a[/b").unwrap_err(),
            BuildError::UnbalancedBrackets {
                path: "/a[/b".to_string()
            }
        );
    }

    #[test]
    fn test_unbalanced_close() {
        assert!(matches!(
            expand_optional("/a]/b"),
            Err(BuildError::UnbalancedBrackets { .. })
        ));
    }
}

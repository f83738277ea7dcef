/// Path utilities for splitting and canonical joining
///
/// All functions are **pure**: given same input, always produce same output with no side effects.
pub mod optional;

pub use optional::expand_optional;

/// Splits a path into its non-empty components
///
/// Leading, trailing and repeated separators produce no components, so
/// `""`, `"/"` and `"//"` all split into nothing.
///
/// # Examples
///
/// ```
/// use pathway_router::path::split_segments;
///
/// assert_eq!(split_segments("/path/to//route/"), vec!["path", "to", "route"]);
/// assert!(split_segments("/").is_empty());
/// ```
pub fn split_segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// Joins components into a canonical path
///
/// The root is always `/`. Other paths start with `/` and end with `/` only
/// when `trailing_slash` is set.
///
/// # Examples
///
/// ```
/// use pathway_router::path::join_segments;
///
/// assert_eq!(join_segments(&["users", "42"], false), "/users/42");
/// assert_eq!(join_segments(&["users", "42"], true), "/users/42/");
/// assert_eq!(join_segments::<&str>(&[], true), "/");
/// ```
pub fn join_segments<S: AsRef<str>>(segments: &[S], trailing_slash: bool) -> String {
    if segments.is_empty() {
        return "/".to_string();
    }

    let mut path = String::new();
    for segment in segments {
        path.push('/');
        path.push_str(segment.as_ref());
    }

    if trailing_slash {
        path.push('/');
    }

    path
}

/// Normalizes a path to its sequence of non-empty components joined by `/`
///
/// Two patterns with the same normalized form describe the same route.
pub fn normalize(path: &str) -> String {
    split_segments(path).join("/")
}

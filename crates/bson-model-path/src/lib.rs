//! Document paths for bson-model.
//!
//! A [`Path`] addresses a node inside a document tree as a chain of object
//! keys and array indices from the root. Paths key the pending operators of
//! an update document and render as MongoDB dot-notation field paths.
//!
//! # Example
//!
//! ```
//! use bson_model_path::{path, parse_field_path, Path};
//!
//! let p = Path::root().key("items").index(3).key("name");
//! assert_eq!(p.to_field_path(), "items.3.name");
//! assert_eq!(p, path!("items", 3usize, "name"));
//! assert_eq!(parse_field_path("items.3.name").unwrap(), p);
//! ```

use thiserror::Error;

pub mod types;
pub use types::{Path, Segment};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("root path has no parent")]
    NoParent,
    #[error("empty segment at position {0}")]
    EmptySegment(usize),
}

/// Builds a [`Path`] from a list of segments.
///
/// String-like arguments become keys, `usize` arguments become indices.
#[macro_export]
macro_rules! path {
    () => {
        $crate::Path::root()
    };
    ($($seg:expr),+ $(,)?) => {
        $crate::Path::from_segments(vec![$($crate::Segment::from($seg)),+])
    };
}

/// Formats segments as a dot-joined field path.
///
/// Returns an empty string for the root path.
///
/// # Example
///
/// ```
/// use bson_model_path::{format_field_path, Segment};
///
/// assert_eq!(format_field_path(&[]), "");
/// assert_eq!(format_field_path(&[Segment::key("a"), Segment::index(0)]), "a.0");
/// ```
pub fn format_field_path(segments: &[Segment]) -> String {
    let mut out = String::new();
    for (i, segment) in segments.iter().enumerate() {
        if i > 0 {
            out.push('.');
        }
        match segment {
            Segment::Key(k) => out.push_str(k),
            Segment::Index(idx) => out.push_str(&idx.to_string()),
        }
    }
    out
}

/// Parses a dot-joined field path.
///
/// Components that are valid array indices (see [`is_valid_index`]) become
/// [`Segment::Index`]; everything else becomes [`Segment::Key`]. An empty
/// input is the root path.
///
/// # Errors
///
/// Returns [`PathError::EmptySegment`] for inputs such as `"a..b"` or `"a."`.
pub fn parse_field_path(field_path: &str) -> Result<Path, PathError> {
    if field_path.is_empty() {
        return Ok(Path::root());
    }
    let mut segments = Vec::new();
    for (pos, component) in field_path.split('.').enumerate() {
        if component.is_empty() {
            return Err(PathError::EmptySegment(pos));
        }
        if is_valid_index(component) {
            if let Ok(idx) = component.parse::<usize>() {
                segments.push(Segment::Index(idx));
                continue;
            }
        }
        segments.push(Segment::Key(component.to_string()));
    }
    Ok(Path::from_segments(segments))
}

/// Check if `parent` is a strict prefix of `child`.
///
/// # Example
///
/// ```
/// use bson_model_path::{is_child, path};
///
/// assert!(is_child(&path!("a"), &path!("a", "b")));
/// assert!(!is_child(&path!("a", "b"), &path!("a")));
/// assert!(!is_child(&path!("a"), &path!("a")));
/// ```
pub fn is_child(parent: &Path, child: &Path) -> bool {
    parent.len() < child.len() && child.starts_with(parent)
}

/// Get the parent of a path.
///
/// # Errors
///
/// Returns [`PathError::NoParent`] for the root path.
pub fn parent(path: &Path) -> Result<Path, PathError> {
    path.parent().ok_or(PathError::NoParent)
}

/// Check if a string represents a canonical non-negative array index.
///
/// # Example
///
/// ```
/// use bson_model_path::is_valid_index;
///
/// assert!(is_valid_index("0"));
/// assert!(is_valid_index("123"));
/// assert!(!is_valid_index("01"));
/// assert!(!is_valid_index("-1"));
/// assert!(!is_valid_index("abc"));
/// ```
pub fn is_valid_index(index: &str) -> bool {
    if index.is_empty() {
        return false;
    }
    let bytes = index.as_bytes();
    if bytes.len() > 1 && bytes[0] == b'0' {
        return false;
    }
    bytes.iter().all(|b| b.is_ascii_digit())
}

/// Check if a string can be one key segment of a dot-notation field path.
///
/// Empty keys, keys containing `.` and keys starting with `$` would be
/// read back as a different path (or as an operator) once joined.
///
/// # Example
///
/// ```
/// use bson_model_path::is_valid_key;
///
/// assert!(is_valid_key("name"));
/// assert!(is_valid_key("a$b"));
/// assert!(!is_valid_key(""));
/// assert!(!is_valid_key("a.b"));
/// assert!(!is_valid_key("$inc"));
/// ```
pub fn is_valid_key(key: &str) -> bool {
    !key.is_empty() && !key.starts_with('$') && !key.contains(['.', '\0'])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_root() {
        assert_eq!(parse_field_path("").unwrap(), Path::root());
    }

    #[test]
    fn parse_rejects_empty_component() {
        assert_eq!(parse_field_path("a..b"), Err(PathError::EmptySegment(1)));
        assert_eq!(parse_field_path("a."), Err(PathError::EmptySegment(1)));
    }

    #[test]
    fn leading_zero_stays_a_key() {
        let p = parse_field_path("m.007").unwrap();
        assert_eq!(p.segments()[1], Segment::key("007"));
    }

    #[test]
    fn parent_of_root_is_error() {
        assert_eq!(parent(&Path::root()), Err(PathError::NoParent));
        assert_eq!(parent(&path!("a", "b")).unwrap(), path!("a"));
    }
}

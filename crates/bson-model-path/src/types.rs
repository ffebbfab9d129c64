//! Type definitions for document paths.

use std::fmt;
use std::sync::Arc;

/// A step in a document path.
///
/// Either an object key or an array index.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Segment {
    /// Object field access.
    Key(String),
    /// Array element access.
    Index(usize),
}

impl Segment {
    #[inline]
    pub fn key(k: impl Into<String>) -> Self {
        Segment::Key(k.into())
    }

    #[inline]
    pub fn index(i: usize) -> Self {
        Segment::Index(i)
    }

    #[inline]
    pub fn as_key(&self) -> Option<&str> {
        match self {
            Segment::Key(k) => Some(k),
            Segment::Index(_) => None,
        }
    }

    #[inline]
    pub fn as_index(&self) -> Option<usize> {
        match self {
            Segment::Key(_) => None,
            Segment::Index(i) => Some(*i),
        }
    }

    /// Returns the segment as it appears in a dot-notation field path.
    pub fn to_field_name(&self) -> String {
        match self {
            Segment::Key(k) => k.clone(),
            Segment::Index(i) => i.to_string(),
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Key(k) => f.write_str(k),
            Segment::Index(i) => write!(f, "{i}"),
        }
    }
}

impl From<String> for Segment {
    fn from(s: String) -> Self {
        Segment::Key(s)
    }
}

impl From<&str> for Segment {
    fn from(s: &str) -> Self {
        Segment::Key(s.to_owned())
    }
}

impl From<&String> for Segment {
    fn from(s: &String) -> Self {
        Segment::Key(s.clone())
    }
}

impl From<usize> for Segment {
    fn from(i: usize) -> Self {
        Segment::Index(i)
    }
}

/// An immutable location inside a document tree.
///
/// Cloning is cheap (shared segment storage); [`Path::child`] returns a new
/// path and never modifies the receiver. Equality, ordering and hashing are
/// structural, so paths can key maps of pending update operators.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Path(Arc<[Segment]>);

impl Path {
    /// The empty path addressing the document root.
    #[inline]
    pub fn root() -> Self {
        Self(Arc::from(Vec::new()))
    }

    pub fn from_segments(segments: Vec<Segment>) -> Self {
        Self(Arc::from(segments))
    }

    /// Returns a new path with `segment` appended.
    pub fn child(&self, segment: impl Into<Segment>) -> Self {
        let mut segments = Vec::with_capacity(self.0.len() + 1);
        segments.extend_from_slice(&self.0);
        segments.push(segment.into());
        Self(Arc::from(segments))
    }

    #[inline]
    pub fn key(&self, k: impl Into<String>) -> Self {
        self.child(Segment::Key(k.into()))
    }

    #[inline]
    pub fn index(&self, i: usize) -> Self {
        self.child(Segment::Index(i))
    }

    /// Concatenates `other` onto this path.
    pub fn join(&self, other: &Path) -> Self {
        if other.is_root() {
            return self.clone();
        }
        if self.is_root() {
            return other.clone();
        }
        let mut segments = Vec::with_capacity(self.0.len() + other.0.len());
        segments.extend_from_slice(&self.0);
        segments.extend_from_slice(&other.0);
        Self(Arc::from(segments))
    }

    #[inline]
    pub fn segments(&self) -> &[Segment] {
        &self.0
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[inline]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    #[inline]
    pub fn last(&self) -> Option<&Segment> {
        self.0.last()
    }

    /// Returns the parent path, or `None` for the root.
    pub fn parent(&self) -> Option<Path> {
        if self.0.is_empty() {
            return None;
        }
        Some(Self(Arc::from(&self.0[..self.0.len() - 1])))
    }

    pub fn starts_with(&self, prefix: &Path) -> bool {
        self.0.starts_with(&prefix.0)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Segment> {
        self.0.iter()
    }

    /// Dot-joined MongoDB field path, e.g. `items.3.name`.
    ///
    /// The root path formats as the empty string.
    pub fn to_field_path(&self) -> String {
        crate::format_field_path(&self.0)
    }
}

impl Default for Path {
    fn default() -> Self {
        Self::root()
    }
}

impl fmt::Debug for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Path({:?})", self.to_field_path())
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            f.write_str("<root>")
        } else {
            f.write_str(&self.to_field_path())
        }
    }
}

impl From<Vec<Segment>> for Path {
    fn from(segments: Vec<Segment>) -> Self {
        Self::from_segments(segments)
    }
}

impl FromIterator<Segment> for Path {
    fn from_iter<I: IntoIterator<Item = Segment>>(iter: I) -> Self {
        Self::from_segments(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Path {
    type Item = &'a Segment;
    type IntoIter = std::slice::Iter<'a, Segment>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn child_does_not_modify_receiver() {
        let base = Path::root().key("wallet");
        let child = base.key("coins");
        assert_eq!(base.len(), 1);
        assert_eq!(child.len(), 2);
        assert_eq!(child.parent(), Some(base));
    }

    #[test]
    fn structural_equality_and_hash() {
        use std::collections::HashSet;
        let a = Path::root().key("items").index(2);
        let b = Path::from_segments(vec![Segment::key("items"), Segment::index(2)]);
        assert_eq!(a, b);
        let mut set = HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
    }

    #[test]
    fn display_root_and_nested() {
        assert_eq!(Path::root().to_string(), "<root>");
        assert_eq!(Path::root().key("a").index(0).to_string(), "a.0");
    }

    #[test]
    fn join_with_root_is_identity() {
        let p = Path::root().key("x");
        assert_eq!(p.join(&Path::root()), p);
        assert_eq!(Path::root().join(&p), p);
    }
}

//! Document tree nodes.
//!
//! A [`Node`] is a scalar leaf, an [`ObjectNode`] or an [`ArrayNode`]. Every
//! container exclusively owns its children and carries the change record
//! for its direct children. There are no parent pointers: mutations go
//! through [`NodeMut`](crate::NodeMut), which walks down from the root and
//! notifies each ancestor on the way back up.
//!
//! The public surface of nodes is read-only; tracked mutation is only
//! reachable through a cursor so that no write can skip the ancestors.

mod array;
mod object;

pub use array::ArrayNode;
pub use object::ObjectNode;

use bson_model_pack::{Binary, DateTime, Decimal128, ObjectId};
use bson_model_path::{Path, Segment};

use crate::config::DiffOptions;
use crate::error::AccessError;
use crate::scalar::Scalar;
use crate::update::UpdateBuilder;

#[derive(Debug, Clone)]
pub enum Node {
    Scalar(Scalar),
    Object(ObjectNode),
    Array(ArrayNode),
}

impl Node {
    pub fn null() -> Self {
        Node::Scalar(Scalar::Null)
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Node::Scalar(s) => s.type_name(),
            Node::Object(_) => "object",
            Node::Array(_) => "array",
        }
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Node::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectNode> {
        match self {
            Node::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&ArrayNode> {
        match self {
            Node::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Returns the direct child addressed by `segment`.
    ///
    /// Error paths are relative to this node.
    pub fn get(&self, segment: &Segment) -> Result<&Node, AccessError> {
        match (self, segment) {
            (Node::Object(o), Segment::Key(k)) => o.get(k).ok_or_else(|| AccessError::NotFound {
                path: Path::root().key(k.as_str()),
            }),
            (Node::Array(a), Segment::Index(i)) => {
                a.get(*i).ok_or(AccessError::IndexOutOfRange {
                    path: Path::root(),
                    index: *i,
                    len: a.len(),
                })
            }
            (Node::Object(_), Segment::Index(_)) | (Node::Array(_), Segment::Key(_)) => {
                Err(AccessError::NotFound {
                    path: Path::root().child(segment.clone()),
                })
            }
            (Node::Scalar(s), _) => Err(AccessError::NotAContainer {
                path: Path::root(),
                found: s.type_name(),
            }),
        }
    }

    /// Returns the descendant at `path`; error paths are relative to this node.
    pub fn at(&self, path: &Path) -> Result<&Node, AccessError> {
        let mut cur = self;
        for (depth, segment) in path.iter().enumerate() {
            cur = cur.get(segment).map_err(|e| {
                e.with_prefix(&Path::from_segments(path.segments()[..depth].to_vec()))
            })?;
        }
        Ok(cur)
    }

    pub fn has_changes(&self) -> bool {
        match self {
            Node::Scalar(_) => false,
            Node::Object(o) => o.has_changes(),
            Node::Array(a) => a.has_changes(),
        }
    }

    /// Clears every change record in the subtree; values are untouched.
    pub fn reset_changes(&mut self) {
        match self {
            Node::Scalar(_) => {}
            Node::Object(o) => o.reset_changes(),
            Node::Array(a) => a.reset_changes(),
        }
    }

    /// Copies the value with empty change records.
    pub fn deep_copy(&self) -> Node {
        match self {
            Node::Scalar(s) => Node::Scalar(s.clone()),
            Node::Object(o) => Node::Object(o.deep_copy()),
            Node::Array(a) => Node::Array(a.deep_copy()),
        }
    }

    /// Appends the operators describing this subtree's changes under `base`.
    pub fn collect_changes(&self, base: &Path, opts: &DiffOptions, out: &mut UpdateBuilder) {
        match self {
            Node::Scalar(_) => {}
            Node::Object(o) => o.collect_changes(base, opts, out),
            Node::Array(a) => a.collect_changes(base, opts, out),
        }
    }

    pub(crate) fn sync_child(&mut self, segment: &Segment) {
        match (self, segment) {
            (Node::Object(o), Segment::Key(k)) => o.sync_child(k),
            (Node::Array(a), Segment::Index(i)) => a.sync_child(*i),
            _ => {}
        }
    }
}

/// Values only: change records are ignored, object keys compare in order.
impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Node::Scalar(a), Node::Scalar(b)) => a == b,
            (Node::Object(a), Node::Object(b)) => a == b,
            (Node::Array(a), Node::Array(b)) => a == b,
            _ => false,
        }
    }
}

macro_rules! node_from_scalar {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Node {
                fn from(v: $ty) -> Self {
                    Node::Scalar(Scalar::from(v))
                }
            }
        )*
    };
}

node_from_scalar!(bool, i32, i64, f64, &str, String, Binary, DateTime, ObjectId, Decimal128);

impl From<Scalar> for Node {
    fn from(s: Scalar) -> Self {
        Node::Scalar(s)
    }
}

impl<T: Into<Scalar>> From<Option<T>> for Node {
    fn from(v: Option<T>) -> Self {
        Node::Scalar(Scalar::from(v))
    }
}

impl From<ObjectNode> for Node {
    fn from(o: ObjectNode) -> Self {
        Node::Object(o)
    }
}

impl From<ArrayNode> for Node {
    fn from(a: ArrayNode) -> Self {
        Node::Array(a)
    }
}

impl From<Vec<Node>> for Node {
    fn from(items: Vec<Node>) -> Self {
        Node::Array(ArrayNode::from_items(items))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson_model_path::path;

    fn sample() -> Node {
        Node::Object(
            ObjectNode::new()
                .with("name", "a")
                .with("tags", vec![Node::from("x"), Node::from("y")]),
        )
    }

    #[test]
    fn at_walks_objects_and_arrays() {
        let n = sample();
        assert_eq!(n.at(&path!("tags", 1usize)).unwrap(), &Node::from("y"));
        assert_eq!(n.at(&Path::root()).unwrap(), &n);
    }

    #[test]
    fn at_reports_full_relative_paths() {
        let n = sample();
        assert_eq!(
            n.at(&path!("tags", 5usize)),
            Err(AccessError::IndexOutOfRange {
                path: path!("tags"),
                index: 5,
                len: 2
            })
        );
        assert_eq!(
            n.at(&path!("missing")),
            Err(AccessError::NotFound {
                path: path!("missing")
            })
        );
        assert_eq!(
            n.at(&path!("name", "x")),
            Err(AccessError::NotAContainer {
                path: path!("name"),
                found: "string"
            })
        );
    }

    #[test]
    fn equality_is_order_sensitive() {
        let a = Node::Object(ObjectNode::new().with("x", 1).with("y", 2));
        let b = Node::Object(ObjectNode::new().with("y", 2).with("x", 1));
        assert_ne!(a, b);
        assert_eq!(a, a.deep_copy());
    }
}

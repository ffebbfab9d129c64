//! Tracked mutation.
//!
//! [`NodeMut`] addresses one location of a document body. Every write walks
//! down from the body along the path, type-checks the new value against the
//! declared shape, applies it in the target container (which records the
//! change), then lets each ancestor refresh its record of the child on the
//! way back up. Ancestors therefore never hold a stale dirty state and
//! nodes need no parent pointers.
//!
//! Error paths are always relative to the document body.

use bson_model_path::{Path, Segment};

use crate::error::{AccessError, ModelError, StateError};
use crate::node::{ArrayNode, Node, ObjectNode};
use crate::schema::{validate_key, DocumentSchema, Shape, ANY};

pub(crate) enum ContainerMut<'b> {
    Object(&'b mut ObjectNode),
    Array(&'b mut ArrayNode),
}

impl<'b> ContainerMut<'b> {
    /// The scalar's type name when `node` is not a container.
    fn of(node: &'b mut Node) -> Result<Self, &'static str> {
        match node {
            Node::Object(o) => Ok(ContainerMut::Object(o)),
            Node::Array(a) => Ok(ContainerMut::Array(a)),
            Node::Scalar(s) => Err(s.type_name()),
        }
    }

    fn type_name(&self) -> &'static str {
        match self {
            ContainerMut::Object(_) => "object",
            ContainerMut::Array(_) => "array",
        }
    }
}

fn prefixed(err: ModelError, prefix: &Path) -> ModelError {
    match err {
        ModelError::Access(e) => ModelError::Access(e.with_prefix(prefix)),
        other => other,
    }
}

/// Walks `segments` down from `container` and runs `f` on the container
/// they address, then re-syncs every container passed on the way down.
fn walk<R, F>(
    container: ContainerMut<'_>,
    shape: &Shape,
    segments: &[Segment],
    f: F,
) -> Result<R, ModelError>
where
    F: FnOnce(ContainerMut<'_>, &Shape) -> Result<R, ModelError>,
{
    let Some((seg, rest)) = segments.split_first() else {
        return f(container, shape);
    };
    let here = Path::root().child(seg.clone());
    let child_shape = shape.resolve(seg).unwrap_or(&ANY);
    match (container, seg) {
        (ContainerMut::Object(obj), Segment::Key(key)) => {
            validate_key(key)?;
            let result = match obj.get_mut(key) {
                None => Err(AccessError::NotFound { path: here.clone() }.into()),
                Some(child) => match ContainerMut::of(child) {
                    Ok(c) => walk(c, child_shape, rest, f).map_err(|e| prefixed(e, &here)),
                    Err(found) => Err(AccessError::NotAContainer { path: here, found }.into()),
                },
            };
            obj.sync_child(key);
            result
        }
        (ContainerMut::Array(arr), Segment::Index(index)) => {
            let len = arr.len();
            let result = match arr.get_mut(*index) {
                None => Err(AccessError::IndexOutOfRange {
                    path: Path::root(),
                    index: *index,
                    len,
                }
                .into()),
                Some(child) => match ContainerMut::of(child) {
                    Ok(c) => walk(c, child_shape, rest, f).map_err(|e| prefixed(e, &here)),
                    Err(found) => Err(AccessError::NotAContainer { path: here, found }.into()),
                },
            };
            arr.sync_child(*index);
            result
        }
        _ => Err(AccessError::NotFound { path: here }.into()),
    }
}

/// Coerces and checks `value` for the child at `seg`; error paths are
/// relative to the container.
fn prepare(shape: &Shape, seg: &Segment, value: Node) -> Result<Node, AccessError> {
    let value = shape.coerce(value);
    shape
        .check(&value)
        .map_err(|e| e.with_prefix(&Path::root().child(seg.clone())))?;
    Ok(value)
}

fn expect_array<'c>(container: ContainerMut<'c>) -> Result<&'c mut ArrayNode, ModelError> {
    match container {
        ContainerMut::Array(arr) => Ok(arr),
        other => Err(AccessError::TypeMismatch {
            path: Path::root(),
            expected: "array".to_owned(),
            found: other.type_name(),
        }
        .into()),
    }
}

fn set_in(
    container: ContainerMut<'_>,
    shape: &Shape,
    seg: &Segment,
    value: Node,
) -> Result<bool, ModelError> {
    match (container, seg) {
        (ContainerMut::Object(obj), Segment::Key(key)) => {
            match shape.map_key() {
                Some(map_key) => map_key.validate(key)?,
                None => validate_key(key)?,
            }
            let field_shape = match shape.resolve(seg) {
                Some(s) => s,
                None if obj.contains_key(key) => &ANY,
                None => {
                    return Err(AccessError::UndeclaredField {
                        path: Path::root().key(key.as_str()),
                    }
                    .into())
                }
            };
            let value = prepare(field_shape, seg, value)?;
            Ok(obj.set_field(key, value))
        }
        (ContainerMut::Array(arr), Segment::Index(index)) => {
            let value = prepare(shape.resolve(seg).unwrap_or(&ANY), seg, value)?;
            Ok(arr.set_at(*index, value)?)
        }
        _ => Err(AccessError::NotFound {
            path: Path::root().child(seg.clone()),
        }
        .into()),
    }
}

fn remove_in(container: ContainerMut<'_>, seg: &Segment) -> Result<bool, ModelError> {
    match (container, seg) {
        (ContainerMut::Object(obj), Segment::Key(key)) => {
            validate_key(key)?;
            Ok(obj.remove_field(key))
        }
        (ContainerMut::Array(arr), Segment::Index(index)) => {
            arr.remove_at(*index)?;
            Ok(true)
        }
        _ => Err(AccessError::NotFound {
            path: Path::root().child(seg.clone()),
        }
        .into()),
    }
}

/// Read-only lookup of `path` in a document body.
pub(crate) fn lookup<'b>(body: &'b ObjectNode, path: &Path) -> Result<&'b Node, AccessError> {
    let Some((first, rest)) = path.segments().split_first() else {
        return Err(AccessError::RootTarget);
    };
    let here = Path::root().child(first.clone());
    let node = match first {
        Segment::Key(key) => body.get(key),
        Segment::Index(_) => None,
    }
    .ok_or_else(|| AccessError::NotFound { path: here.clone() })?;
    node.at(&Path::from_segments(rest.to_vec()))
        .map_err(|e| e.with_prefix(&here))
}

/// Cursor over one location of a document body.
///
/// Obtained from [`RootModel::at`](crate::RootModel::at) or
/// [`RootModel::field`](crate::RootModel::field).
pub struct NodeMut<'a> {
    body: &'a mut ObjectNode,
    schema: &'a DocumentSchema,
    path: Path,
}

impl<'a> NodeMut<'a> {
    pub(crate) fn new(body: &'a mut ObjectNode, schema: &'a DocumentSchema, path: Path) -> Self {
        Self { body, schema, path }
    }

    /// Moves the cursor to a child of the current location.
    pub fn at(mut self, segment: impl Into<Segment>) -> Self {
        self.path = self.path.child(segment);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self) -> Result<&Node, AccessError> {
        lookup(&*self.body, &self.path)
    }

    fn guard_identifier(&self) -> Result<(), StateError> {
        match self.path.segments().first() {
            Some(Segment::Key(k)) if k == self.schema.id_field() => {
                Err(StateError::IdentifierField {
                    field: k.clone(),
                })
            }
            _ => Ok(()),
        }
    }

    /// Runs `f` on the container addressed by `segments`.
    fn with_container<R, F>(&mut self, segments: &[Segment], f: F) -> Result<R, ModelError>
    where
        F: FnOnce(ContainerMut<'_>, &Shape) -> Result<R, ModelError>,
    {
        walk(
            ContainerMut::Object(&mut *self.body),
            self.schema.root_shape(),
            segments,
            f,
        )
    }

    /// Splits the path into the parent container's segments and the last one.
    fn split_last(&self) -> Result<(Vec<Segment>, Segment), ModelError> {
        let (last, parent) = self
            .path
            .segments()
            .split_last()
            .ok_or(AccessError::RootTarget)?;
        Ok((parent.to_vec(), last.clone()))
    }

    /// Assigns the value at the cursor. Returns `false` when the value equals
    /// the current one and nothing was recorded.
    pub fn set(&mut self, value: impl Into<Node>) -> Result<bool, ModelError> {
        self.guard_identifier()?;
        let (parent, last) = self.split_last()?;
        let value = value.into();
        self.with_container(&parent, |c, shape| set_in(c, shape, &last, value))
    }

    /// Removes the field or element at the cursor. Returns `false` when an
    /// object field was already absent.
    pub fn remove(&mut self) -> Result<bool, ModelError> {
        self.guard_identifier()?;
        let (parent, last) = self.split_last()?;
        self.with_container(&parent, |c, _| remove_in(c, &last))
    }

    /// Appends to the array at the cursor.
    pub fn push(&mut self, value: impl Into<Node>) -> Result<(), ModelError> {
        self.guard_identifier()?;
        let segments = self.path.segments().to_vec();
        let value = value.into();
        self.with_container(&segments, |c, shape| {
            let arr = expect_array(c)?;
            let seg = Segment::Index(arr.len());
            let value = prepare(shape.resolve(&seg).unwrap_or(&ANY), &seg, value)?;
            arr.push(value);
            Ok(())
        })
    }

    /// Inserts before `index` in the array at the cursor.
    pub fn insert(&mut self, index: usize, value: impl Into<Node>) -> Result<(), ModelError> {
        self.guard_identifier()?;
        let segments = self.path.segments().to_vec();
        let value = value.into();
        self.with_container(&segments, |c, shape| {
            let arr = expect_array(c)?;
            let seg = Segment::Index(index);
            let value = prepare(shape.resolve(&seg).unwrap_or(&ANY), &seg, value)?;
            Ok(arr.insert(index, value)?)
        })
    }

    /// Removes and returns the element at `index` of the array at the cursor.
    pub fn remove_at(&mut self, index: usize) -> Result<Node, ModelError> {
        self.guard_identifier()?;
        let segments = self.path.segments().to_vec();
        self.with_container(&segments, |c, _| Ok(expect_array(c)?.remove_at(index)?))
    }

    pub fn pop(&mut self) -> Result<Option<Node>, ModelError> {
        self.guard_identifier()?;
        let segments = self.path.segments().to_vec();
        self.with_container(&segments, |c, _| Ok(expect_array(c)?.pop()))
    }

    /// Empties the object or array at the cursor. The body itself cannot be
    /// cleared since it holds the identifier.
    pub fn clear(&mut self) -> Result<bool, ModelError> {
        if self.path.is_root() {
            return Err(StateError::IdentifierField {
                field: self.schema.id_field().to_owned(),
            }
            .into());
        }
        self.guard_identifier()?;
        let segments = self.path.segments().to_vec();
        self.with_container(&segments, |c, _| {
            Ok(match c {
                ContainerMut::Object(obj) => obj.clear(),
                ContainerMut::Array(arr) => arr.clear(),
            })
        })
    }
}

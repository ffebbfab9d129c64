//! Declared document shapes.
//!
//! A [`Shape`] describes what may appear at a position of the tree. Shapes
//! drive schema-directed decoding, type checks on writes through
//! [`NodeMut`](crate::NodeMut), and default values for new documents.
//! Generated model types hold one [`DocumentSchema`] each.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use bson_model_path::{is_valid_key, Path, Segment};

use crate::error::{AccessError, SchemaError};
use crate::node::{ArrayNode, Node, ObjectNode};
use crate::scalar::{Scalar, ScalarType};

pub(crate) static ANY: Shape = Shape::Any;

#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// Untyped; accepts any node. Used for retained unknown fields.
    Any,
    Scalar(ScalarType),
    /// The inner shape or null.
    Nullable(Box<Shape>),
    Object(Arc<ObjectShape>),
    Array(Box<Shape>),
    /// An object with dynamic keys and uniform values.
    Map(Box<MapShape>),
}

impl Shape {
    pub fn bool() -> Self {
        Shape::Scalar(ScalarType::Bool)
    }

    pub fn int32() -> Self {
        Shape::Scalar(ScalarType::Int32)
    }

    pub fn int64() -> Self {
        Shape::Scalar(ScalarType::Int64)
    }

    pub fn double() -> Self {
        Shape::Scalar(ScalarType::Double)
    }

    pub fn string() -> Self {
        Shape::Scalar(ScalarType::String)
    }

    pub fn binary() -> Self {
        Shape::Scalar(ScalarType::Binary)
    }

    pub fn datetime() -> Self {
        Shape::Scalar(ScalarType::DateTime)
    }

    pub fn object_id() -> Self {
        Shape::Scalar(ScalarType::ObjectId)
    }

    pub fn decimal128() -> Self {
        Shape::Scalar(ScalarType::Decimal128)
    }

    pub fn nullable(self) -> Self {
        match self {
            Shape::Nullable(_) | Shape::Any => self,
            other => Shape::Nullable(Box::new(other)),
        }
    }

    pub fn array(element: Shape) -> Self {
        Shape::Array(Box::new(element))
    }

    pub fn map(key: MapKey, value: Shape) -> Self {
        Shape::Map(Box::new(MapShape { key, value }))
    }

    pub fn object(shape: Arc<ObjectShape>) -> Self {
        Shape::Object(shape)
    }

    /// Short human-readable form used in error messages.
    pub fn describe(&self) -> String {
        match self {
            Shape::Any => "any".to_owned(),
            Shape::Scalar(t) => t.name().to_owned(),
            Shape::Nullable(inner) => format!("{}?", inner.describe()),
            Shape::Object(_) => "object".to_owned(),
            Shape::Array(e) => format!("array<{}>", e.describe()),
            Shape::Map(m) => format!("map<{}, {}>", m.key, m.value.describe()),
        }
    }

    pub fn default_node(&self) -> Node {
        match self {
            Shape::Any | Shape::Nullable(_) => Node::null(),
            Shape::Scalar(t) => Node::Scalar(t.default_value()),
            Shape::Object(o) => Node::Object(o.default_object()),
            Shape::Array(_) => Node::Array(ArrayNode::new()),
            Shape::Map(_) => Node::Object(ObjectNode::new()),
        }
    }

    /// Key type when this is a (possibly nullable) map.
    pub(crate) fn map_key(&self) -> Option<MapKey> {
        match self {
            Shape::Map(m) => Some(m.key),
            Shape::Nullable(inner) => inner.map_key(),
            _ => None,
        }
    }

    /// Shape of the child addressed by `segment`, `None` if the shape does
    /// not declare one.
    pub fn resolve(&self, segment: &Segment) -> Option<&Shape> {
        match (self, segment) {
            (Shape::Any, _) => Some(&ANY),
            (Shape::Nullable(inner), _) => inner.resolve(segment),
            (Shape::Object(o), Segment::Key(k)) => o.field(k).map(|f| &f.shape),
            (Shape::Map(m), Segment::Key(_)) => Some(&m.value),
            (Shape::Array(e), Segment::Index(_)) => Some(e),
            _ => None,
        }
    }

    /// Widens integers where the declared type is wider and fills declared
    /// object fields missing from `node` with their defaults.
    pub fn coerce(&self, node: Node) -> Node {
        match (self, node) {
            (Shape::Scalar(ScalarType::Int64), Node::Scalar(Scalar::Int32(i))) => {
                Node::Scalar(Scalar::Int64(i64::from(i)))
            }
            (Shape::Scalar(ScalarType::Double), Node::Scalar(Scalar::Int32(i))) => {
                Node::Scalar(Scalar::Double(f64::from(i)))
            }
            (Shape::Nullable(inner), node) if !is_null(&node) => inner.coerce(node),
            (Shape::Object(o), Node::Object(obj)) => Node::Object(o.coerce(obj)),
            (Shape::Array(e), Node::Array(arr)) => Node::Array(
                arr.into_items()
                    .into_iter()
                    .map(|item| e.coerce(item))
                    .collect(),
            ),
            (Shape::Map(m), Node::Object(obj)) => Node::Object(
                obj.into_fields()
                    .map(|(k, v)| (k, m.value.coerce(v)))
                    .collect(),
            ),
            (_, node) => node,
        }
    }

    /// Deep type check. Error paths are relative to `node`.
    pub fn check(&self, node: &Node) -> Result<(), AccessError> {
        match (self, node) {
            (Shape::Any, _) => Ok(()),
            (Shape::Nullable(_), n) if is_null(n) => Ok(()),
            (Shape::Nullable(inner), n) => inner.check(n),
            (Shape::Scalar(t), Node::Scalar(s)) if s.scalar_type() == Some(*t) => Ok(()),
            (Shape::Object(o), Node::Object(obj)) => o.check(obj),
            (Shape::Array(e), Node::Array(arr)) => {
                for (i, item) in arr.iter().enumerate() {
                    e.check(item)
                        .map_err(|err| err.with_prefix(&Path::root().index(i)))?;
                }
                Ok(())
            }
            (Shape::Map(m), Node::Object(obj)) => {
                for (key, value) in obj.iter() {
                    m.key.validate(key)?;
                    m.value
                        .check(value)
                        .map_err(|err| err.with_prefix(&Path::root().key(key)))?;
                }
                Ok(())
            }
            _ => Err(AccessError::TypeMismatch {
                path: Path::root(),
                expected: self.describe(),
                found: node.type_name(),
            }),
        }
    }
}

fn is_null(node: &Node) -> bool {
    matches!(node, Node::Scalar(Scalar::Null))
}

/// Rejects keys that would change meaning inside a dot-notation update path.
pub(crate) fn validate_key(key: &str) -> Result<(), AccessError> {
    if is_valid_key(key) {
        Ok(())
    } else {
        Err(AccessError::InvalidMapKey {
            path: Path::root(),
            key: key.to_owned(),
        })
    }
}

/// Key type of a map shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapKey {
    /// Any non-empty key without `.` that does not start with `$`.
    String,
    /// Keys are canonical decimal `i64` strings (`"7"`, `"-3"`, not `"07"`).
    Int,
}

impl MapKey {
    pub(crate) fn validate(self, key: &str) -> Result<(), AccessError> {
        validate_key(key)?;
        match self {
            MapKey::String => Ok(()),
            MapKey::Int if key.parse::<i64>().is_ok_and(|i| i.to_string() == key) => Ok(()),
            MapKey::Int => Err(AccessError::InvalidMapKey {
                path: Path::root(),
                key: key.to_owned(),
            }),
        }
    }
}

impl fmt::Display for MapKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapKey::String => f.write_str("string"),
            MapKey::Int => f.write_str("int"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapShape {
    pub key: MapKey,
    pub value: Shape,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldShape {
    pub shape: Shape,
    pub default: Option<Node>,
    /// Must be present on the wire whatever the missing-field policy says.
    pub required: bool,
}

impl FieldShape {
    /// A fresh copy of the field's default value.
    pub fn default_node(&self) -> Node {
        match &self.default {
            Some(template) => template.deep_copy(),
            None => self.shape.default_node(),
        }
    }
}

/// Declared fields of an object, in declaration order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObjectShape {
    fields: IndexMap<String, FieldShape>,
}

impl ObjectShape {
    pub fn builder() -> ObjectShapeBuilder {
        ObjectShapeBuilder::default()
    }

    pub fn field(&self, name: &str) -> Option<&FieldShape> {
        self.fields.get(name)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldShape)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Every declared field at its default, in declaration order.
    pub fn default_object(&self) -> ObjectNode {
        self.fields
            .iter()
            .map(|(name, field)| (name.clone(), field.default_node()))
            .collect()
    }

    fn coerce(&self, obj: ObjectNode) -> ObjectNode {
        let mut out: ObjectNode = obj
            .into_fields()
            .map(|(key, value)| match self.fields.get(&key) {
                Some(field) => {
                    let value = field.shape.coerce(value);
                    (key, value)
                }
                None => (key, value),
            })
            .collect();
        for (name, field) in &self.fields {
            if !out.contains_key(name) {
                out = out.with(name.clone(), field.default_node());
            }
        }
        out
    }

    fn check(&self, obj: &ObjectNode) -> Result<(), AccessError> {
        for (key, value) in obj.iter() {
            let Some(field) = self.fields.get(key) else {
                return Err(AccessError::UndeclaredField {
                    path: Path::root().key(key),
                });
            };
            field
                .shape
                .check(value)
                .map_err(|err| err.with_prefix(&Path::root().key(key)))?;
        }
        for name in self.fields.keys() {
            if !obj.contains_key(name) {
                return Err(AccessError::NotFound {
                    path: Path::root().key(name.as_str()),
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct ObjectShapeBuilder {
    fields: Vec<(String, FieldShape)>,
}

impl ObjectShapeBuilder {
    pub fn field(mut self, name: impl Into<String>, shape: Shape) -> Self {
        self.fields.push((
            name.into(),
            FieldShape {
                shape,
                default: None,
                required: false,
            },
        ));
        self
    }

    /// Declares a field with an explicit default. The default is a template:
    /// every document gets its own copy.
    pub fn field_with_default(
        mut self,
        name: impl Into<String>,
        shape: Shape,
        default: impl Into<Node>,
    ) -> Self {
        self.fields.push((
            name.into(),
            FieldShape {
                shape,
                default: Some(default.into()),
                required: false,
            },
        ));
        self
    }

    pub fn build(self) -> Result<Arc<ObjectShape>, SchemaError> {
        let mut fields = IndexMap::with_capacity(self.fields.len());
        for (name, mut field) in self.fields {
            if !is_valid_key(&name) {
                return Err(SchemaError::InvalidFieldName { field: name });
            }
            if fields.contains_key(&name) {
                return Err(SchemaError::DuplicateField { field: name });
            }
            if let Some(default) = field.default.take() {
                let mut default = field.shape.coerce(default);
                default.reset_changes();
                if let Err(err) = field.shape.check(&default) {
                    return Err(SchemaError::InvalidDefault {
                        field: name,
                        reason: err.to_string(),
                    });
                }
                field.default = Some(default);
            }
            fields.insert(name, field);
        }
        Ok(Arc::new(ObjectShape { fields }))
    }
}

/// Shape of a stored document plus its identifier field.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentSchema {
    id_field: String,
    id_type: ScalarType,
    object: Arc<ObjectShape>,
    root: Shape,
}

impl DocumentSchema {
    pub const DEFAULT_ID_FIELD: &'static str = "_id";

    /// Uses `_id` as the identifier field.
    pub fn new(object: Arc<ObjectShape>) -> Result<Self, SchemaError> {
        Self::with_id_field(Self::DEFAULT_ID_FIELD, object)
    }

    pub fn with_id_field(
        id_field: impl Into<String>,
        object: Arc<ObjectShape>,
    ) -> Result<Self, SchemaError> {
        let id_field = id_field.into();
        let Some(field) = object.field(&id_field) else {
            return Err(SchemaError::IdentifierMissing { field: id_field });
        };
        let &Shape::Scalar(id_type) = &field.shape else {
            return Err(SchemaError::IdentifierNotScalar {
                found: field.shape.describe(),
                field: id_field,
            });
        };
        let mut marked = ObjectShape::clone(&object);
        if let Some(field) = marked.fields.get_mut(&id_field) {
            field.required = true;
        }
        let object = Arc::new(marked);
        Ok(Self {
            id_field,
            id_type,
            root: Shape::Object(Arc::clone(&object)),
            object,
        })
    }

    pub fn id_field(&self) -> &str {
        &self.id_field
    }

    pub fn id_type(&self) -> ScalarType {
        self.id_type
    }

    pub fn id_shape(&self) -> Shape {
        Shape::Scalar(self.id_type)
    }

    pub fn object(&self) -> &ObjectShape {
        &self.object
    }

    pub fn root_shape(&self) -> &Shape {
        &self.root
    }

    /// Declared fields other than the identifier, at their defaults.
    pub fn default_body(&self) -> ObjectNode {
        self.object
            .fields()
            .filter(|(name, _)| *name != self.id_field)
            .map(|(name, field)| (name.to_owned(), field.default_node()))
            .collect()
    }
}

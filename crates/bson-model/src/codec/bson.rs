//! Node ↔ BSON mapping.

use std::collections::HashSet;

use bson_model_pack::{BsonDocument, BsonValue};
use bson_model_path::Path;

use crate::config::{CodecOptions, MissingFields, UnknownFields};
use crate::error::DecodeError;
use crate::node::{ArrayNode, Node, ObjectNode};
use crate::scalar::Scalar;
use crate::schema::{MapShape, ObjectShape, Shape, ANY};

pub fn node_to_bson(node: &Node) -> BsonValue {
    match node {
        Node::Scalar(s) => s.to_bson(),
        Node::Object(o) => BsonValue::Document(object_to_document(o)),
        Node::Array(a) => BsonValue::Array(a.iter().map(node_to_bson).collect()),
    }
}

pub fn object_to_document(obj: &ObjectNode) -> BsonDocument {
    obj.iter()
        .map(|(k, v)| (k.to_owned(), node_to_bson(v)))
        .collect()
}

/// `None` for documents and arrays.
pub(crate) fn scalar_from_bson(value: &BsonValue) -> Option<Scalar> {
    Some(match value {
        BsonValue::Null => Scalar::Null,
        BsonValue::Boolean(b) => Scalar::Bool(*b),
        BsonValue::Int32(i) => Scalar::Int32(*i),
        BsonValue::Int64(i) => Scalar::Int64(*i),
        BsonValue::Float(f) => Scalar::Double(*f),
        BsonValue::Str(s) => Scalar::String(s.clone()),
        BsonValue::Binary(b) => Scalar::Binary(b.clone()),
        BsonValue::DateTime(dt) => Scalar::DateTime(*dt),
        BsonValue::ObjectId(id) => Scalar::ObjectId(*id),
        BsonValue::Decimal128(d) => Scalar::Decimal128(*d),
        BsonValue::Document(_) | BsonValue::Array(_) => return None,
        other => Scalar::Opaque(other.clone()),
    })
}

/// Decodes `value` as `shape`; `path` locates `value` for error reporting.
pub fn node_from_bson(
    value: &BsonValue,
    shape: &Shape,
    path: &Path,
    opts: &CodecOptions,
) -> Result<Node, DecodeError> {
    let mismatch = || DecodeError::type_mismatch(path, shape.describe(), value.type_name());
    match (shape, value) {
        (Shape::Any, BsonValue::Document(fields)) => {
            let mut seen = HashSet::with_capacity(fields.len());
            let mut obj = ObjectNode::new();
            for (key, v) in fields {
                let child = path.key(key.as_str());
                if !seen.insert(key.as_str()) {
                    return Err(DecodeError::DuplicateField { path: child });
                }
                obj = obj.with(key.as_str(), node_from_bson(v, &ANY, &child, opts)?);
            }
            Ok(Node::Object(obj))
        }
        (Shape::Any, BsonValue::Array(items)) => decode_array(items, &ANY, path, opts),
        (Shape::Any, v) => scalar_from_bson(v).map(Node::Scalar).ok_or_else(mismatch),
        (Shape::Nullable(_), BsonValue::Null) => Ok(Node::null()),
        (Shape::Nullable(inner), v) => node_from_bson(v, inner, path, opts),
        (Shape::Scalar(t), v) => match scalar_from_bson(v) {
            Some(s) if s.scalar_type() == Some(*t) => Ok(Node::Scalar(s)),
            _ => Err(mismatch()),
        },
        (Shape::Object(o), BsonValue::Document(fields)) => {
            object_from_document(fields, o, path, opts).map(Node::Object)
        }
        (Shape::Array(e), BsonValue::Array(items)) => decode_array(items, e, path, opts),
        (Shape::Map(m), BsonValue::Document(fields)) => {
            map_from_document(fields, m, path, opts).map(Node::Object)
        }
        _ => Err(mismatch()),
    }
}

fn decode_array(
    items: &[BsonValue],
    element: &Shape,
    path: &Path,
    opts: &CodecOptions,
) -> Result<Node, DecodeError> {
    let items = items
        .iter()
        .enumerate()
        .map(|(i, v)| node_from_bson(v, element, &path.index(i), opts))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Node::Array(ArrayNode::from_items(items)))
}

/// Decodes a document against declared fields, keeping wire order.
pub fn object_from_document(
    fields: &[(String, BsonValue)],
    shape: &ObjectShape,
    path: &Path,
    opts: &CodecOptions,
) -> Result<ObjectNode, DecodeError> {
    let mut seen = HashSet::with_capacity(fields.len());
    let mut obj = ObjectNode::new();
    for (key, value) in fields {
        let child = path.key(key.as_str());
        if !seen.insert(key.as_str()) {
            return Err(DecodeError::DuplicateField { path: child });
        }
        let field_shape = match shape.field(key) {
            Some(field) => &field.shape,
            None => match opts.unknown_fields {
                UnknownFields::Retain => &ANY,
                UnknownFields::Ignore => continue,
                UnknownFields::Reject => return Err(DecodeError::UnknownField { path: child }),
            },
        };
        obj = obj.with(key.as_str(), node_from_bson(value, field_shape, &child, opts)?);
    }
    fill_missing(obj, shape, path, opts)
}

pub(crate) fn fill_missing(
    mut obj: ObjectNode,
    shape: &ObjectShape,
    path: &Path,
    opts: &CodecOptions,
) -> Result<ObjectNode, DecodeError> {
    for (name, field) in shape.fields() {
        if obj.contains_key(name) {
            continue;
        }
        if field.required || opts.missing_fields == MissingFields::Reject {
            return Err(DecodeError::MissingField {
                path: path.key(name),
            });
        }
        obj = obj.with(name, field.default_node());
    }
    Ok(obj)
}

fn map_from_document(
    fields: &[(String, BsonValue)],
    shape: &MapShape,
    path: &Path,
    opts: &CodecOptions,
) -> Result<ObjectNode, DecodeError> {
    let mut seen = HashSet::with_capacity(fields.len());
    let mut obj = ObjectNode::new();
    for (key, value) in fields {
        let child = path.key(key.as_str());
        if !seen.insert(key.as_str()) {
            return Err(DecodeError::DuplicateField { path: child });
        }
        if shape.key.validate(key).is_err() {
            return Err(DecodeError::InvalidMapKey {
                path: path.clone(),
                key: key.clone(),
            });
        }
        obj = obj.with(key.as_str(), node_from_bson(value, &shape.value, &child, opts)?);
    }
    Ok(obj)
}

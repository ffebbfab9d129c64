//! Node ↔ [`GenericValue`] mapping.
//!
//! Types without a JSON counterpart are written as: dates as integer
//! milliseconds, object ids as 24-digit hex strings, generic binary as a
//! base64 string (other subtypes as `{"$binary": {"base64", "subType"}}`),
//! decimals as their text form. Untyped server-internal values use their
//! canonical extended JSON wrappers (`$timestamp`, `$regularExpression`,
//! `$minKey`, ...) on the way out only; reading them back yields plain
//! objects.

use std::collections::HashSet;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use bson_model_pack::{Binary, BsonValue, DateTime, Decimal128, GenericValue, ObjectId};
use bson_model_path::Path;

use crate::config::{CodecOptions, UnknownFields};
use crate::error::DecodeError;
use crate::node::{ArrayNode, Node, ObjectNode};
use crate::scalar::{Scalar, ScalarType};
use crate::schema::{MapShape, ObjectShape, Shape, ANY};

use super::bson::{fill_missing, scalar_from_bson};

const BINARY_KEY: &str = "$binary";

pub fn node_to_generic(node: &Node) -> GenericValue {
    match node {
        Node::Scalar(s) => scalar_to_generic(s),
        Node::Object(o) => GenericValue::Object(
            o.iter()
                .map(|(k, v)| (k.to_owned(), node_to_generic(v)))
                .collect(),
        ),
        Node::Array(a) => GenericValue::Array(a.iter().map(node_to_generic).collect()),
    }
}

fn scalar_to_generic(s: &Scalar) -> GenericValue {
    match s {
        Scalar::Null => GenericValue::Null,
        Scalar::Bool(b) => GenericValue::Bool(*b),
        Scalar::Int32(i) => GenericValue::Int(i64::from(*i)),
        Scalar::Int64(i) => GenericValue::Int(*i),
        Scalar::Double(f) => GenericValue::Float(*f),
        Scalar::String(s) => GenericValue::Str(s.clone()),
        Scalar::Binary(b) if b.subtype == Binary::GENERIC => {
            GenericValue::Str(STANDARD.encode(&b.bytes))
        }
        Scalar::Binary(b) => GenericValue::Object(vec![(
            BINARY_KEY.to_owned(),
            GenericValue::Object(vec![
                ("base64".to_owned(), GenericValue::Str(STANDARD.encode(&b.bytes))),
                ("subType".to_owned(), GenericValue::Str(format!("{:02x}", b.subtype))),
            ]),
        )]),
        Scalar::DateTime(dt) => GenericValue::Int(dt.timestamp_millis()),
        Scalar::ObjectId(id) => GenericValue::Str(id.to_hex()),
        Scalar::Decimal128(d) => GenericValue::Str(d.to_string()),
        Scalar::Opaque(v) => opaque_to_generic(v),
    }
}

fn wrap(key: &str, value: GenericValue) -> GenericValue {
    GenericValue::Object(vec![(key.to_owned(), value)])
}

fn opaque_to_generic(value: &BsonValue) -> GenericValue {
    match value {
        BsonValue::Timestamp(ts) => wrap(
            "$timestamp",
            GenericValue::Object(vec![
                ("t".to_owned(), GenericValue::Int(i64::from(ts.time))),
                ("i".to_owned(), GenericValue::Int(i64::from(ts.increment))),
            ]),
        ),
        BsonValue::Regex(re) => wrap(
            "$regularExpression",
            GenericValue::Object(vec![
                ("pattern".to_owned(), GenericValue::Str(re.pattern.clone())),
                ("options".to_owned(), GenericValue::Str(re.options.clone())),
            ]),
        ),
        BsonValue::MinKey => wrap("$minKey", GenericValue::Int(1)),
        BsonValue::MaxKey => wrap("$maxKey", GenericValue::Int(1)),
        BsonValue::Undefined => wrap("$undefined", GenericValue::Bool(true)),
        BsonValue::JavaScriptCode(code) => wrap("$code", GenericValue::Str(code.clone())),
        BsonValue::Symbol(sym) => wrap("$symbol", GenericValue::Str(sym.clone())),
        BsonValue::JavaScriptCodeWithScope(cws) => GenericValue::Object(vec![
            ("$code".to_owned(), GenericValue::Str(cws.code.clone())),
            (
                "$scope".to_owned(),
                GenericValue::Object(
                    cws.scope
                        .iter()
                        .map(|(k, v)| (k.clone(), bson_to_generic(v)))
                        .collect(),
                ),
            ),
        ]),
        BsonValue::DbPointer(ptr) => wrap(
            "$dbPointer",
            GenericValue::Object(vec![
                ("$ref".to_owned(), GenericValue::Str(ptr.namespace.clone())),
                ("$id".to_owned(), wrap("$oid", GenericValue::Str(ptr.id.to_hex()))),
            ]),
        ),
        other => bson_to_generic(other),
    }
}

/// Untyped rendering of a raw BSON value, as found in code scopes.
fn bson_to_generic(value: &BsonValue) -> GenericValue {
    match value {
        BsonValue::Document(fields) => GenericValue::Object(
            fields
                .iter()
                .map(|(k, v)| (k.clone(), bson_to_generic(v)))
                .collect(),
        ),
        BsonValue::Array(items) => GenericValue::Array(items.iter().map(bson_to_generic).collect()),
        scalar => scalar_from_bson(scalar).map_or(GenericValue::Null, |s| scalar_to_generic(&s)),
    }
}

fn decode_base64(s: &str, path: &Path) -> Result<Vec<u8>, DecodeError> {
    STANDARD
        .decode(s)
        .map_err(|e| DecodeError::malformed(path, format!("invalid base64: {e}")))
}

fn binary_from_generic(value: &GenericValue, path: &Path) -> Option<Result<Binary, DecodeError>> {
    match value {
        GenericValue::Str(s) => Some(decode_base64(s, path).map(Binary::generic)),
        GenericValue::Object(_) => {
            let inner = value.get(BINARY_KEY)?;
            let bytes = inner.get("base64").and_then(GenericValue::as_str)?;
            let subtype = inner.get("subType").and_then(GenericValue::as_str)?;
            Some(
                u8::from_str_radix(subtype, 16)
                    .map_err(|_| DecodeError::malformed(path, format!("invalid subType {subtype:?}")))
                    .and_then(|subtype| {
                        Ok(Binary {
                            subtype,
                            bytes: decode_base64(bytes, path)?,
                        })
                    }),
            )
        }
        _ => None,
    }
}

fn scalar_from_generic(
    value: &GenericValue,
    ty: ScalarType,
    path: &Path,
) -> Result<Scalar, DecodeError> {
    let mismatch = || DecodeError::type_mismatch(path, ty.name(), value.type_name());
    let scalar = match (ty, value) {
        (ScalarType::Bool, GenericValue::Bool(b)) => Scalar::Bool(*b),
        (ScalarType::Int32, GenericValue::Int(i)) => {
            Scalar::Int32(i32::try_from(*i).map_err(|_| DecodeError::OutOfRange {
                path: path.clone(),
                value: i.to_string(),
                expected: ty.name(),
            })?)
        }
        (ScalarType::Int64, GenericValue::Int(i)) => Scalar::Int64(*i),
        (ScalarType::Double, GenericValue::Float(f)) => Scalar::Double(*f),
        (ScalarType::Double, GenericValue::Int(i)) => Scalar::Double(*i as f64),
        (ScalarType::String, GenericValue::Str(s)) => Scalar::String(s.clone()),
        (ScalarType::Binary, v) => match binary_from_generic(v, path) {
            Some(binary) => Scalar::Binary(binary?),
            None => return Err(mismatch()),
        },
        (ScalarType::DateTime, GenericValue::Int(ms)) => {
            Scalar::DateTime(DateTime::from_millis(*ms))
        }
        (ScalarType::ObjectId, GenericValue::Str(s)) => Scalar::ObjectId(
            ObjectId::parse_str(s).map_err(|e| DecodeError::malformed(path, e.to_string()))?,
        ),
        (ScalarType::Decimal128, GenericValue::Str(s)) => Scalar::Decimal128(
            s.parse::<Decimal128>()
                .map_err(|e| DecodeError::malformed(path, e.to_string()))?,
        ),
        _ => return Err(mismatch()),
    };
    Ok(scalar)
}

/// Untyped values: integers become int32 when they fit, int64 otherwise.
fn infer(value: &GenericValue, path: &Path) -> Result<Node, DecodeError> {
    Ok(match value {
        GenericValue::Null => Node::null(),
        GenericValue::Bool(b) => Node::from(*b),
        GenericValue::Int(i) => match i32::try_from(*i) {
            Ok(small) => Node::from(small),
            Err(_) => Node::from(*i),
        },
        GenericValue::Float(f) => Node::from(*f),
        GenericValue::Str(s) => Node::from(s.as_str()),
        GenericValue::Array(items) => Node::Array(
            items
                .iter()
                .enumerate()
                .map(|(i, v)| infer(v, &path.index(i)))
                .collect::<Result<ArrayNode, _>>()?,
        ),
        GenericValue::Object(fields) => {
            let mut seen = HashSet::with_capacity(fields.len());
            let mut obj = ObjectNode::new();
            for (key, v) in fields {
                let child = path.key(key.as_str());
                if !seen.insert(key.as_str()) {
                    return Err(DecodeError::DuplicateField { path: child });
                }
                obj = obj.with(key.as_str(), infer(v, &child)?);
            }
            Node::Object(obj)
        }
    })
}

/// Decodes `value` as `shape`; `path` locates `value` for error reporting.
pub fn node_from_generic(
    value: &GenericValue,
    shape: &Shape,
    path: &Path,
    opts: &CodecOptions,
) -> Result<Node, DecodeError> {
    match (shape, value) {
        (Shape::Any, v) => infer(v, path),
        (Shape::Nullable(_), GenericValue::Null) => Ok(Node::null()),
        (Shape::Nullable(inner), v) => node_from_generic(v, inner, path, opts),
        (Shape::Scalar(t), v) => scalar_from_generic(v, *t, path).map(Node::Scalar),
        (Shape::Object(o), GenericValue::Object(fields)) => {
            object_from_generic(fields, o, path, opts).map(Node::Object)
        }
        (Shape::Array(e), GenericValue::Array(items)) => {
            let items = items
                .iter()
                .enumerate()
                .map(|(i, v)| node_from_generic(v, e, &path.index(i), opts))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Node::Array(ArrayNode::from_items(items)))
        }
        (Shape::Map(m), GenericValue::Object(fields)) => {
            map_from_generic(fields, m, path, opts).map(Node::Object)
        }
        (shape, v) => Err(DecodeError::type_mismatch(path, shape.describe(), v.type_name())),
    }
}

pub fn object_from_generic(
    fields: &[(String, GenericValue)],
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
        obj = obj.with(key.as_str(), node_from_generic(value, field_shape, &child, opts)?);
    }
    fill_missing(obj, shape, path, opts)
}

fn map_from_generic(
    fields: &[(String, GenericValue)],
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
        obj = obj.with(key.as_str(), node_from_generic(value, &shape.value, &child, opts)?);
    }
    Ok(obj)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson_model_path::path;

    fn decode(value: &GenericValue, shape: &Shape) -> Result<Node, DecodeError> {
        node_from_generic(value, shape, &path!("f"), &CodecOptions::default())
    }

    #[test]
    fn special_scalars_map_to_json_forms() {
        let id = ObjectId::from_bytes([7; 12]);
        let cases: Vec<(Node, GenericValue, Shape)> = vec![
            (
                Node::from(DateTime::from_millis(1_700_000_000_123)),
                GenericValue::Int(1_700_000_000_123),
                Shape::datetime(),
            ),
            (
                Node::from(id),
                GenericValue::Str("070707070707070707070707".into()),
                Shape::object_id(),
            ),
            (
                Node::from(Binary::generic(vec![1, 2, 3])),
                GenericValue::Str("AQID".into()),
                Shape::binary(),
            ),
            (
                Node::from(Binary {
                    subtype: 4,
                    bytes: vec![0xff],
                }),
                GenericValue::Object(vec![(
                    "$binary".into(),
                    GenericValue::Object(vec![
                        ("base64".into(), GenericValue::Str("/w==".into())),
                        ("subType".into(), GenericValue::Str("04".into())),
                    ]),
                )]),
                Shape::binary(),
            ),
            (Node::from(2.5), GenericValue::Float(2.5), Shape::double()),
            (Node::from(9i64), GenericValue::Int(9), Shape::int64()),
        ];
        for (node, generic, shape) in cases {
            assert_eq!(node_to_generic(&node), generic);
            assert_eq!(decode(&generic, &shape).unwrap(), node);
        }
    }

    #[test]
    fn opaque_values_use_extended_json_wrappers() {
        let cases = vec![
            (
                BsonValue::Timestamp(bson_model_pack::Timestamp {
                    time: 5,
                    increment: 1,
                }),
                serde_json::json!({ "$timestamp": { "t": 5, "i": 1 } }),
            ),
            (
                BsonValue::Regex(bson_model_pack::Regex {
                    pattern: "^a".into(),
                    options: "i".into(),
                }),
                serde_json::json!({ "$regularExpression": { "pattern": "^a", "options": "i" } }),
            ),
            (BsonValue::MinKey, serde_json::json!({ "$minKey": 1 })),
            (
                BsonValue::JavaScriptCodeWithScope(bson_model_pack::CodeWithScope {
                    code: "x".into(),
                    scope: vec![("x".into(), BsonValue::Int64(2))],
                }),
                serde_json::json!({ "$code": "x", "$scope": { "x": 2 } }),
            ),
        ];
        for (value, expected) in cases {
            let node = Node::Scalar(Scalar::Opaque(value));
            assert_eq!(serde_json::Value::from(node_to_generic(&node)), expected);
        }
    }

    #[test]
    fn int32_must_fit() {
        assert_eq!(
            decode(&GenericValue::Int(i64::from(i32::MAX) + 1), &Shape::int32()),
            Err(DecodeError::OutOfRange {
                path: path!("f"),
                value: "2147483648".into(),
                expected: "int"
            })
        );
    }

    #[test]
    fn double_accepts_integers_only_for_double_fields() {
        assert_eq!(decode(&GenericValue::Int(3), &Shape::double()).unwrap(), Node::from(3.0));
        assert_eq!(
            decode(&GenericValue::Float(3.0), &Shape::int64()),
            Err(DecodeError::type_mismatch(&path!("f"), "long", "float"))
        );
    }

    #[test]
    fn untyped_integers_pick_the_narrowest_width() {
        let v = GenericValue::Array(vec![GenericValue::Int(1), GenericValue::Int(1 << 40)]);
        assert_eq!(
            decode(&v, &Shape::Any).unwrap(),
            Node::from(vec![Node::from(1), Node::from(1i64 << 40)])
        );
    }

    #[test]
    fn malformed_object_id_is_reported() {
        assert!(matches!(
            decode(&GenericValue::Str("xyz".into()), &Shape::object_id()),
            Err(DecodeError::Malformed { .. })
        ));
    }
}

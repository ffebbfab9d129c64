//! Update-operator documents.
//!
//! [`UpdateBuilder`] collects operator entries while a tree is walked;
//! [`UpdateDocument`] is the finished result. The wire shape is
//!
//! ```text
//! { "$set":   { "<field.path>": <value>, ... },
//!   "$unset": { "<field.path>": "", ... },
//!   "$push":  { "<field.path>": { "$each": [<value>, ...] }, ... } }
//! ```
//!
//! with empty operators omitted. Entries keep the order in which the walk
//! produced them, so building twice from the same change set yields the
//! same bytes.

use indexmap::{IndexMap, IndexSet};

use bson_model_pack::{encode_document, BsonDocument, BsonValue, GenericValue};
use bson_model_path::Path;

use crate::codec::bson::node_to_bson;
use crate::codec::generic::node_to_generic;
use crate::error::EncodeError;
use crate::node::Node;
use crate::scalar::Scalar;

pub const SET: &str = "$set";
pub const UNSET: &str = "$unset";
pub const PUSH: &str = "$push";
pub const EACH: &str = "$each";

#[derive(Debug, Clone, Default)]
pub struct UpdateBuilder {
    set: IndexMap<Path, Node>,
    unset: IndexSet<Path>,
    push: IndexMap<Path, Vec<Node>>,
}

impl UpdateBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, path: Path, value: Node) {
        self.set.insert(path, value);
    }

    pub fn unset(&mut self, path: Path) {
        self.unset.insert(path);
    }

    pub fn push(&mut self, path: Path, values: Vec<Node>) {
        self.push.entry(path).or_default().extend(values);
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty() && self.unset.is_empty() && self.push.is_empty()
    }

    /// `None` when nothing was collected.
    pub fn build(self) -> Option<UpdateDocument> {
        if self.is_empty() {
            return None;
        }
        Some(UpdateDocument {
            set: self.set,
            unset: self.unset,
            push: self.push,
        })
    }
}

/// A non-empty set of update operators.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateDocument {
    set: IndexMap<Path, Node>,
    unset: IndexSet<Path>,
    push: IndexMap<Path, Vec<Node>>,
}

impl UpdateDocument {
    pub fn set_entries(&self) -> impl Iterator<Item = (&Path, &Node)> {
        self.set.iter()
    }

    pub fn unset_entries(&self) -> impl Iterator<Item = &Path> {
        self.unset.iter()
    }

    pub fn push_entries(&self) -> impl Iterator<Item = (&Path, &[Node])> {
        self.push.iter().map(|(p, v)| (p, v.as_slice()))
    }

    /// Number of operator entries across all operators.
    pub fn len(&self) -> usize {
        self.set.len() + self.unset.len() + self.push.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn to_bson(&self) -> BsonDocument {
        let mut doc = BsonDocument::new();
        if !self.set.is_empty() {
            let set = self
                .set
                .iter()
                .map(|(p, v)| (p.to_field_path(), node_to_bson(v)))
                .collect();
            doc.push((SET.to_owned(), BsonValue::Document(set)));
        }
        if !self.unset.is_empty() {
            let unset = self
                .unset
                .iter()
                .map(|p| (p.to_field_path(), BsonValue::Str(String::new())))
                .collect();
            doc.push((UNSET.to_owned(), BsonValue::Document(unset)));
        }
        if !self.push.is_empty() {
            let push = self
                .push
                .iter()
                .map(|(p, values)| {
                    let each = BsonValue::Array(values.iter().map(node_to_bson).collect());
                    (
                        p.to_field_path(),
                        BsonValue::Document(vec![(EACH.to_owned(), each)]),
                    )
                })
                .collect();
            doc.push((PUSH.to_owned(), BsonValue::Document(push)));
        }
        doc
    }

    pub fn to_bson_bytes(&self) -> Result<Vec<u8>, EncodeError> {
        Ok(encode_document(&self.to_bson())?)
    }

    pub fn to_generic(&self) -> GenericValue {
        let mut doc = Vec::new();
        if !self.set.is_empty() {
            let set = self
                .set
                .iter()
                .map(|(p, v)| (p.to_field_path(), node_to_generic(v)))
                .collect();
            doc.push((SET.to_owned(), GenericValue::Object(set)));
        }
        if !self.unset.is_empty() {
            let unset = self
                .unset
                .iter()
                .map(|p| (p.to_field_path(), GenericValue::Str(String::new())))
                .collect();
            doc.push((UNSET.to_owned(), GenericValue::Object(unset)));
        }
        if !self.push.is_empty() {
            let push = self
                .push
                .iter()
                .map(|(p, values)| {
                    let each = GenericValue::Array(values.iter().map(node_to_generic).collect());
                    (
                        p.to_field_path(),
                        GenericValue::Object(vec![(EACH.to_owned(), each)]),
                    )
                })
                .collect();
            doc.push((PUSH.to_owned(), GenericValue::Object(push)));
        }
        GenericValue::Object(doc)
    }
}

/// Identifier-only filter document for deletes.
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteKey {
    pub field: String,
    pub id: Scalar,
}

impl DeleteKey {
    pub fn to_bson(&self) -> BsonDocument {
        vec![(self.field.clone(), self.id.to_bson())]
    }

    pub fn to_bson_bytes(&self) -> Result<Vec<u8>, EncodeError> {
        Ok(encode_document(&self.to_bson())?)
    }

    pub fn to_generic(&self) -> GenericValue {
        GenericValue::Object(vec![(
            self.field.clone(),
            node_to_generic(&Node::Scalar(self.id.clone())),
        )])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson_model_path::path;

    #[test]
    fn empty_builder_builds_nothing() {
        assert!(UpdateBuilder::new().build().is_none());
    }

    #[test]
    fn operators_render_in_fixed_order() {
        let mut b = UpdateBuilder::new();
        b.push(path!("tags"), vec![Node::from("x")]);
        b.unset(path!("old"));
        b.set(path!("wallet", "coins"), Node::from(5));
        let doc = b.build().unwrap();
        assert_eq!(doc.len(), 3);
        assert_eq!(
            doc.to_bson(),
            vec![
                (
                    "$set".to_owned(),
                    BsonValue::Document(vec![("wallet.coins".to_owned(), BsonValue::Int32(5))])
                ),
                (
                    "$unset".to_owned(),
                    BsonValue::Document(vec![("old".to_owned(), BsonValue::Str(String::new()))])
                ),
                (
                    "$push".to_owned(),
                    BsonValue::Document(vec![(
                        "tags".to_owned(),
                        BsonValue::Document(vec![(
                            "$each".to_owned(),
                            BsonValue::Array(vec![BsonValue::Str("x".into())])
                        )])
                    )])
                ),
            ]
        );
    }

    #[test]
    fn array_indices_render_as_dotted_digits() {
        let mut b = UpdateBuilder::new();
        b.set(path!("slots", 2usize, "name"), Node::from("axe"));
        let generic = b.build().unwrap().to_generic();
        assert_eq!(
            generic.get("$set").and_then(|s| s.get("slots.2.name")),
            Some(&GenericValue::Str("axe".into()))
        );
    }

    #[test]
    fn repeated_set_keeps_last_value() {
        let mut b = UpdateBuilder::new();
        b.set(path!("a"), Node::from(1));
        b.set(path!("a"), Node::from(2));
        let doc = b.build().unwrap();
        assert_eq!(
            doc.set_entries().collect::<Vec<_>>(),
            vec![(&path!("a"), &Node::from(2))]
        );
    }

    #[test]
    fn delete_key_is_identifier_only() {
        let key = DeleteKey {
            field: "_id".into(),
            id: Scalar::from("k1"),
        };
        assert_eq!(key.to_bson(), vec![("_id".to_owned(), BsonValue::Str("k1".into()))]);
        assert!(key.to_bson_bytes().is_ok());
    }
}

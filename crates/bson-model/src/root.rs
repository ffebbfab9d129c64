//! Document entry point.
//!
//! A [`RootModel`] binds a [`DocumentSchema`] to one document body and
//! exposes the persistence-facing operations. The identifier lives in the
//! body as its first field but is never tracked: it is assigned once,
//! through [`RootModel::set_id`], and is never part of an update document.

use std::sync::Arc;

use tracing::debug;

use bson_model_pack::{GenericValue, JsonBackend};
use bson_model_path::Path;

use crate::codec::Codec;
use crate::config::DiffOptions;
use crate::cursor::{lookup, NodeMut};
use crate::error::{AccessError, DecodeError, EncodeError, ModelError, StateError};
use crate::node::{Node, ObjectNode};
use crate::scalar::Scalar;
use crate::schema::DocumentSchema;
use crate::update::{DeleteKey, UpdateBuilder, UpdateDocument};

#[derive(Debug, Clone)]
pub struct RootModel {
    schema: Arc<DocumentSchema>,
    body: ObjectNode,
}

impl RootModel {
    /// A new document with every declared field at its default and no
    /// identifier.
    pub fn new(schema: Arc<DocumentSchema>) -> Self {
        let body = schema.default_body();
        Self { schema, body }
    }

    pub fn with_id(schema: Arc<DocumentSchema>, id: impl Into<Scalar>) -> Result<Self, ModelError> {
        let mut model = Self::new(schema);
        model.set_id(id)?;
        Ok(model)
    }

    /// Decodes a stored document. The identifier field must be present.
    pub fn decode_bson(
        schema: Arc<DocumentSchema>,
        bytes: &[u8],
        codec: &dyn Codec,
    ) -> Result<Self, ModelError> {
        debug!(len = bytes.len(), "decoding document");
        let body = codec.decode_binary(bytes, schema.object())?;
        Ok(Self { schema, body })
    }

    pub fn from_generic(
        schema: Arc<DocumentSchema>,
        value: &GenericValue,
        codec: &dyn Codec,
    ) -> Result<Self, ModelError> {
        debug!("decoding document from generic value");
        match codec.decode_generic(value, schema.root_shape())? {
            Node::Object(body) => Ok(Self { schema, body }),
            other => Err(DecodeError::type_mismatch(&Path::root(), "object", other.type_name()).into()),
        }
    }

    pub fn from_json(
        schema: Arc<DocumentSchema>,
        text: &str,
        backend: &dyn JsonBackend,
        codec: &dyn Codec,
    ) -> Result<Self, ModelError> {
        let value = backend.from_str(text).map_err(DecodeError::from)?;
        Self::from_generic(schema, &value, codec)
    }

    pub fn schema(&self) -> &Arc<DocumentSchema> {
        &self.schema
    }

    pub fn id(&self) -> Option<&Scalar> {
        self.body
            .get(self.schema.id_field())
            .and_then(Node::as_scalar)
    }

    /// Assigns the identifier. Fails once an identifier is set.
    pub fn set_id(&mut self, id: impl Into<Scalar>) -> Result<(), ModelError> {
        let field = self.schema.id_field();
        if let Some(current) = self.id() {
            return Err(StateError::IdentifierAlreadySet {
                field: field.to_owned(),
                current: current.to_string(),
            }
            .into());
        }
        let shape = self.schema.id_shape();
        let id = shape.coerce(Node::Scalar(id.into()));
        shape
            .check(&id)
            .map_err(|e| e.with_prefix(&Path::root().key(field)))?;
        debug!(field, "identifier assigned");
        self.body.insert_untracked_first(field, id);
        Ok(())
    }

    pub fn body(&self) -> &ObjectNode {
        &self.body
    }

    pub fn get(&self, path: &Path) -> Result<&Node, AccessError> {
        lookup(&self.body, path)
    }

    /// A cursor for tracked writes at `path`.
    pub fn at(&mut self, path: Path) -> NodeMut<'_> {
        NodeMut::new(&mut self.body, &self.schema, path)
    }

    pub fn field(&mut self, key: &str) -> NodeMut<'_> {
        self.at(Path::root().key(key))
    }

    pub fn has_changes(&self) -> bool {
        self.body.has_changes()
    }

    /// Marks the current state as persisted.
    pub fn reset_changes(&mut self) {
        debug!(had_changes = self.body.has_changes(), "resetting changes");
        self.body.reset_changes();
    }

    /// The full document for an insert. Requires the identifier.
    pub fn to_insert(&self, codec: &dyn Codec) -> Result<Vec<u8>, ModelError> {
        self.require_id()?;
        let bytes = codec.encode_binary(&self.body)?;
        debug!(len = bytes.len(), "encoded insert document");
        Ok(bytes)
    }

    /// Update operators for the changes since the last reset, `None` when
    /// there are none.
    pub fn to_update(&self) -> Option<UpdateDocument> {
        self.to_update_with(&DiffOptions::default())
    }

    pub fn to_update_with(&self, opts: &DiffOptions) -> Option<UpdateDocument> {
        let mut builder = UpdateBuilder::new();
        self.body.collect_changes(&Path::root(), opts, &mut builder);
        let doc = builder.build();
        match &doc {
            Some(doc) => debug!(
                operators = doc.len(),
                set = doc.set_entries().count(),
                unset = doc.unset_entries().count(),
                push = doc.push_entries().count(),
                "built update document"
            ),
            None => debug!("no changes to update"),
        }
        doc
    }

    pub fn to_delete(&self) -> Result<DeleteKey, ModelError> {
        let id = self.require_id()?;
        debug!(id = %id, "built delete key");
        Ok(DeleteKey {
            field: self.schema.id_field().to_owned(),
            id: id.clone(),
        })
    }

    pub fn to_generic(&self, codec: &dyn Codec) -> GenericValue {
        GenericValue::Object(
            self.body
                .iter()
                .map(|(k, v)| (k.to_owned(), codec.encode_generic(v)))
                .collect(),
        )
    }

    pub fn to_json(&self, codec: &dyn Codec, backend: &dyn JsonBackend) -> Result<String, ModelError> {
        Ok(backend
            .to_string(&self.to_generic(codec))
            .map_err(EncodeError::from)?)
    }

    /// An independent copy with no recorded changes.
    pub fn deep_copy(&self) -> Self {
        Self {
            schema: Arc::clone(&self.schema),
            body: self.body.deep_copy(),
        }
    }

    pub fn any_updated(&self) -> bool {
        self.body.any_updated()
    }

    pub fn any_deleted(&self) -> bool {
        self.body.any_deleted()
    }

    pub fn deleted_count(&self) -> usize {
        self.body.deleted_count()
    }

    pub fn updated_view(&self) -> Option<GenericValue> {
        self.body.updated_view()
    }

    pub fn deleted_view(&self) -> Option<GenericValue> {
        self.body.deleted_view()
    }

    fn require_id(&self) -> Result<&Scalar, StateError> {
        self.id().ok_or_else(|| StateError::IdentifierUnset {
            field: self.schema.id_field().to_owned(),
        })
    }
}

/// What generated model types implement.
///
/// A generated type wraps a [`RootModel`] and adds typed accessors; the
/// provided methods forward the persistence operations.
pub trait Model: Sized {
    fn schema() -> Arc<DocumentSchema>;

    fn from_root(root: RootModel) -> Self;

    fn root(&self) -> &RootModel;

    fn root_mut(&mut self) -> &mut RootModel;

    fn create() -> Self {
        Self::from_root(RootModel::new(Self::schema()))
    }

    fn decode_bson(bytes: &[u8], codec: &dyn Codec) -> Result<Self, ModelError> {
        RootModel::decode_bson(Self::schema(), bytes, codec).map(Self::from_root)
    }

    fn id(&self) -> Option<&Scalar> {
        self.root().id()
    }

    fn set_id(&mut self, id: impl Into<Scalar>) -> Result<(), ModelError> {
        self.root_mut().set_id(id)
    }

    fn to_insert(&self, codec: &dyn Codec) -> Result<Vec<u8>, ModelError> {
        self.root().to_insert(codec)
    }

    fn to_update(&self) -> Option<UpdateDocument> {
        self.root().to_update()
    }

    fn to_delete(&self) -> Result<DeleteKey, ModelError> {
        self.root().to_delete()
    }

    fn has_changes(&self) -> bool {
        self.root().has_changes()
    }

    fn reset_changes(&mut self) {
        self.root_mut().reset_changes()
    }
}

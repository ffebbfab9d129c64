//! Encoding capability.
//!
//! Models talk to wire formats only through [`Codec`]. [`StandardCodec`] is
//! the bundled implementation over the strict BSON codec in
//! `bson-model-pack`; JSON text goes through a
//! [`JsonBackend`](bson_model_pack::JsonBackend) on top of the generic form.

pub mod bson;
pub mod generic;

use bson_model_pack::{decode_document, encode_document, GenericValue};
use bson_model_path::Path;

use crate::config::CodecOptions;
use crate::error::{DecodeError, EncodeError};
use crate::node::{Node, ObjectNode};
use crate::schema::{ObjectShape, Shape};

pub trait Codec {
    /// Encodes a whole document, regardless of change state.
    fn encode_binary(&self, obj: &ObjectNode) -> Result<Vec<u8>, EncodeError>;

    /// Decodes a whole document; the result has no recorded changes.
    fn decode_binary(&self, bytes: &[u8], shape: &ObjectShape) -> Result<ObjectNode, DecodeError>;

    fn encode_generic(&self, node: &Node) -> GenericValue;

    fn decode_generic(&self, value: &GenericValue, shape: &Shape) -> Result<Node, DecodeError>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StandardCodec {
    pub options: CodecOptions,
}

impl StandardCodec {
    pub fn new(options: CodecOptions) -> Self {
        Self { options }
    }
}

impl Codec for StandardCodec {
    fn encode_binary(&self, obj: &ObjectNode) -> Result<Vec<u8>, EncodeError> {
        Ok(encode_document(&bson::object_to_document(obj))?)
    }

    fn decode_binary(&self, bytes: &[u8], shape: &ObjectShape) -> Result<ObjectNode, DecodeError> {
        let doc = decode_document(bytes)?;
        bson::object_from_document(&doc, shape, &Path::root(), &self.options)
    }

    fn encode_generic(&self, node: &Node) -> GenericValue {
        generic::node_to_generic(node)
    }

    fn decode_generic(&self, value: &GenericValue, shape: &Shape) -> Result<Node, DecodeError> {
        generic::node_from_generic(value, shape, &Path::root(), &self.options)
    }
}

//! Change-tracking document models over BSON.
//!
//! A document is a tree of [`Node`]s (scalars, [`ObjectNode`]s,
//! [`ArrayNode`]s) bound to a [`DocumentSchema`] by a [`RootModel`]. Writes go
//! through a [`NodeMut`] cursor, which type-checks them and records the
//! smallest description of each change in the containers along the path.
//! [`RootModel::to_update`] then turns the recorded changes into a MongoDB
//! update document (`$set` / `$unset` / `$push`), or `None` when there is
//! nothing to write.
//!
//! ```
//! use std::sync::Arc;
//! use bson_model::{path, DocumentSchema, ObjectShape, RootModel, Shape};
//!
//! let shape = ObjectShape::builder()
//!     .field("_id", Shape::string())
//!     .field("name", Shape::string())
//!     .field("age", Shape::int32())
//!     .build()
//!     .unwrap();
//! let schema = Arc::new(DocumentSchema::new(shape).unwrap());
//!
//! let mut player = RootModel::with_id(schema, "k1").unwrap();
//! player.at(path!("age")).set(2).unwrap();
//! let update = player.to_update().unwrap();
//! assert_eq!(update.set_entries().count(), 1);
//!
//! player.reset_changes();
//! assert!(player.to_update().is_none());
//! ```
//!
//! Models are single-threaded values: there is no internal locking, and a
//! tree must not be mutated from several threads at once.

pub mod codec;
pub mod config;
pub mod cursor;
pub mod error;
pub mod node;
pub mod root;
pub mod scalar;
pub mod schema;
mod tracker;
pub mod update;

pub use codec::{Codec, StandardCodec};
pub use config::{ArrayPolicy, CodecOptions, DiffOptions, MissingFields, ModelConfig, UnknownFields};
pub use cursor::NodeMut;
pub use error::{AccessError, DecodeError, EncodeError, ModelError, SchemaError, StateError};
pub use node::{ArrayNode, Node, ObjectNode};
pub use root::{Model, RootModel};
pub use scalar::{Scalar, ScalarType};
pub use schema::{DocumentSchema, FieldShape, MapKey, MapShape, ObjectShape, Shape};
pub use update::{DeleteKey, UpdateBuilder, UpdateDocument};

pub use bson_model_pack::{
    Binary, BsonValue, DateTime, Decimal128, GenericValue, JsonBackend, ObjectId, SerdeJsonBackend,
};
pub use bson_model_path::{path, Path, Segment};
